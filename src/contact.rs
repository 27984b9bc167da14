//! Contact form validation.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

const MAX_NAME_CHARS: usize = 100;
const MAX_EMAIL_LEN: usize = 254;
const MIN_MESSAGE_CHARS: usize = 10;
const MAX_MESSAGE_CHARS: usize = 5000;
const MAX_OPTIONAL_CHARS: usize = 150;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
        .expect("email pattern compiles")
});

static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9+() -]{7,20}$").expect("phone pattern compiles"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContactError {
    #[error("name is required")]
    MissingName,

    #[error("name must be at most 100 characters")]
    NameTooLong,

    #[error("email '{0}' is not a valid address")]
    InvalidEmail(String),

    #[error("phone number '{0}' is not valid")]
    InvalidPhone(String),

    #[error("message must be between 10 and 5000 characters")]
    MessageLength,

    #[error("{0} must be at most 150 characters")]
    FieldTooLong(&'static str),
}

impl ContactError {
    /// Request field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            ContactError::MissingName | ContactError::NameTooLong => "name",
            ContactError::InvalidEmail(_) => "email",
            ContactError::InvalidPhone(_) => "phone",
            ContactError::MessageLength => "message",
            ContactError::FieldTooLong(field) => *field,
        }
    }
}

/// Raw contact form body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    /// Product or service the visitor is asking about
    pub product: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// A validated, trimmed contact form submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactSubmission {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub product: Option<String>,
    pub message: String,
    pub received_at: DateTime<Utc>,
}

impl ContactRequest {
    pub fn validate(self) -> Result<ContactSubmission, ContactError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ContactError::MissingName);
        }
        if name.chars().count() > MAX_NAME_CHARS {
            return Err(ContactError::NameTooLong);
        }

        let email = self.email.trim().to_string();
        if email.len() > MAX_EMAIL_LEN || !EMAIL_PATTERN.is_match(&email) {
            return Err(ContactError::InvalidEmail(email));
        }

        let phone = non_blank(self.phone);
        if let Some(phone) = phone.as_deref()
            && !PHONE_PATTERN.is_match(phone)
        {
            return Err(ContactError::InvalidPhone(phone.to_string()));
        }

        let company = bounded("company", non_blank(self.company))?;
        let product = bounded("product", non_blank(self.product))?;

        let message = self.message.trim().to_string();
        let message_chars = message.chars().count();
        if !(MIN_MESSAGE_CHARS..=MAX_MESSAGE_CHARS).contains(&message_chars) {
            return Err(ContactError::MessageLength);
        }

        Ok(ContactSubmission {
            id: Uuid::new_v4(),
            name,
            email,
            phone,
            company,
            product,
            message,
            received_at: Utc::now(),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn bounded(field: &'static str, value: Option<String>) -> Result<Option<String>, ContactError> {
    match value {
        Some(v) if v.chars().count() > MAX_OPTIONAL_CHARS => Err(ContactError::FieldTooLong(field)),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ContactRequest {
        ContactRequest {
            name: "  Priya Raman ".to_string(),
            email: "priya@example.co.in".to_string(),
            phone: Some("+91 98765 43210".to_string()),
            company: Some("Raman Auto Components".to_string()),
            product: Some("thread-plug-gauges".to_string()),
            message: "Need a quote for M12 thread plug gauges.".to_string(),
        }
    }

    #[test]
    fn test_valid_submission_is_trimmed() {
        let submission = request().validate().unwrap();
        assert_eq!(submission.name, "Priya Raman");
        assert_eq!(submission.phone.as_deref(), Some("+91 98765 43210"));
    }

    #[test]
    fn test_blank_optionals_become_none() {
        let submission = ContactRequest {
            phone: Some("   ".to_string()),
            company: Some(String::new()),
            ..request()
        }
        .validate()
        .unwrap();
        assert!(submission.phone.is_none());
        assert!(submission.company.is_none());
    }

    #[test]
    fn test_rejects_invalid_fields() {
        let err = ContactRequest {
            name: " ".to_string(),
            ..request()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, ContactError::MissingName);
        assert_eq!(err.field(), "name");

        let err = ContactRequest {
            email: "not-an-email".to_string(),
            ..request()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.field(), "email");

        let err = ContactRequest {
            phone: Some("call me".to_string()),
            ..request()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.field(), "phone");

        let err = ContactRequest {
            message: "hi".to_string(),
            ..request()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, ContactError::MessageLength);

        let err = ContactRequest {
            company: Some("x".repeat(151)),
            ..request()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, ContactError::FieldTooLong("company"));
    }
}
