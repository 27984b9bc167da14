//! Contact notification emails.
//!
//! Notifications are rendered from an embedded Tera template and delivered
//! through a [`Mailer`]. Production uses the Brevo transactional API; without
//! an API key the [`LogMailer`] only logs what would have been sent.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tera::{Context, Tera};
use thiserror::Error;

use crate::contact::ContactSubmission;

pub const DEFAULT_BREVO_BASE_URL: &str = "https://api.brevo.com";
const NOTIFICATION_TEMPLATE_NAME: &str = "contact_notification.html";
const NOTIFICATION_TEMPLATE: &str = r#"<h2>New enquiry from {{ name }}</h2>
<table>
  <tr><td><strong>Name</strong></td><td>{{ name }}</td></tr>
  <tr><td><strong>Email</strong></td><td>{{ email }}</td></tr>
  {% if phone %}<tr><td><strong>Phone</strong></td><td>{{ phone }}</td></tr>{% endif %}
  {% if company %}<tr><td><strong>Company</strong></td><td>{{ company }}</td></tr>{% endif %}
  {% if product %}<tr><td><strong>Interested in</strong></td><td>{{ product }}</td></tr>{% endif %}
</table>
<p>{{ message | escape | linebreaksbr | safe }}</p>
<p><small>Submission {{ id }} received {{ received_at }}</small></p>
"#;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("failed to render notification: {0}")]
    Template(#[from] tera::Error),

    #[error("mail provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("mail provider rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Address {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: Address,
    pub reply_to: Option<Address>,
    pub subject: String,
    pub html_body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;

    /// Short name for logs and health output
    fn name(&self) -> &'static str;

    /// Whether messages actually leave the process
    fn delivers(&self) -> bool {
        true
    }
}

/// Who notifications come from and go to.
#[derive(Debug, Clone)]
pub struct MailSettings {
    pub sender: Address,
    pub recipient: Address,
}

pub struct NotificationRenderer {
    tera: Tera,
    settings: MailSettings,
}

impl NotificationRenderer {
    pub fn new(settings: MailSettings) -> Result<Self, MailError> {
        let mut tera = Tera::default();
        tera.add_raw_template(NOTIFICATION_TEMPLATE_NAME, NOTIFICATION_TEMPLATE)?;
        Ok(Self { tera, settings })
    }

    pub fn sender(&self) -> &Address {
        &self.settings.sender
    }

    pub fn contact_notification(
        &self,
        submission: &ContactSubmission,
    ) -> Result<OutgoingEmail, MailError> {
        let context = Context::from_serialize(submission)?;
        let html_body = self.tera.render(NOTIFICATION_TEMPLATE_NAME, &context)?;
        let subject = match submission.product.as_deref() {
            Some(product) => format!("Website enquiry: {} ({})", submission.name, product),
            None => format!("Website enquiry: {}", submission.name),
        };

        Ok(OutgoingEmail {
            to: self.settings.recipient.clone(),
            reply_to: Some(Address {
                email: submission.email.clone(),
                name: Some(submission.name.clone()),
            }),
            subject,
            html_body,
        })
    }
}

// =============================================================================
// BREVO
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoPayload<'a> {
    sender: &'a Address,
    to: [&'a Address; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a Address>,
    subject: &'a str,
    html_content: &'a str,
}

pub struct BrevoMailer {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    sender: Address,
}

impl BrevoMailer {
    pub fn new(api_key: String, sender: Address) -> Result<Self, MailError> {
        Self::with_base_url(DEFAULT_BREVO_BASE_URL, api_key, sender)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: String,
        sender: Address,
    ) -> Result<Self, MailError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            sender,
        })
    }
}

#[async_trait]
impl Mailer for BrevoMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let payload = BrevoPayload {
            sender: &self.sender,
            to: [&email.to],
            reply_to: email.reply_to.as_ref(),
            subject: &email.subject,
            html_content: &email.html_body,
        };

        let response = self
            .client
            .post(format!("{}/v3/smtp/email", self.base_url))
            .header("api-key", &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(to = %email.to.email, subject = %email.subject, "notification sent");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "brevo"
    }
}

/// Logs notifications instead of sending them.
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        tracing::info!(
            to = %email.to.email,
            subject = %email.subject,
            body_bytes = email.html_body.len(),
            "mail delivery disabled, notification logged only"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }

    fn delivers(&self) -> bool {
        false
    }
}
