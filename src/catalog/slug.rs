//! URL slug newtype.
//!
//! Slugs are used verbatim as URL path segments, so every slug that reaches a
//! route, a sitemap entry or a stored post goes through [`Slug::new`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

static SLUG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9-]+$").expect("slug pattern compiles"));

/// Errors raised when a string is not an acceptable slug.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlugError {
    #[error("slug cannot be empty")]
    Empty,

    #[error("slug is {actual} characters long, maximum is {max}")]
    TooLong { max: usize, actual: usize },

    #[error("slug '{0}' may only contain lower-case ascii letters, digits and '-'")]
    InvalidCharacters(String),
}

/// Lower-case, hyphenated, URL-safe identifier.
///
/// # Validation
/// - Must not be empty
/// - Maximum length: 200 characters
/// - Must match `^[a-z0-9-]+$`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    pub const MAX_LENGTH: usize = 200;

    pub fn new(value: impl Into<String>) -> Result<Self, SlugError> {
        let value = value.into();
        if value.is_empty() {
            return Err(SlugError::Empty);
        }
        if value.len() > Self::MAX_LENGTH {
            return Err(SlugError::TooLong {
                max: Self::MAX_LENGTH,
                actual: value.len(),
            });
        }
        if !SLUG_PATTERN.is_match(&value) {
            return Err(SlugError::InvalidCharacters(value));
        }
        Ok(Self(value))
    }

    /// Derives a slug from free text such as a post title.
    pub fn from_title(title: &str) -> Result<Self, SlugError> {
        let mut derived = ::slug::slugify(title);
        if derived.len() > Self::MAX_LENGTH {
            derived.truncate(Self::MAX_LENGTH);
            while derived.ends_with('-') {
                derived.pop();
            }
        }
        Self::new(derived)
    }

    /// Appends `-<n>` to disambiguate a colliding slug.
    pub fn with_suffix(&self, n: usize) -> Result<Self, SlugError> {
        Self::new(format!("{}-{}", self.0, n))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Slug {
    type Err = SlugError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Slug {
    type Error = SlugError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> String {
        slug.0
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Slug {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Slug {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_slug_validation() {
        assert!(Slug::new("plain-plug-gauges").is_ok());
        assert!(Slug::new("m12").is_ok());
        assert_eq!(Slug::new(""), Err(SlugError::Empty));
        assert!(matches!(
            Slug::new("Plain-Plug"),
            Err(SlugError::InvalidCharacters(_))
        ));
        assert!(Slug::new("plain plug").is_err());
        assert!(Slug::new("plain_plug").is_err());
        assert!(Slug::new("a".repeat(201)).is_err());
    }

    #[test]
    fn test_slug_from_title() {
        let slug = Slug::from_title("How to Calibrate Thread Ring Gauges (2024)").unwrap();
        assert_eq!(slug.as_str(), "how-to-calibrate-thread-ring-gauges-2024");

        assert!(Slug::from_title("!!!").is_err());
    }

    #[test]
    fn test_slug_with_suffix() {
        let slug = Slug::new("gauge-care").unwrap();
        assert_eq!(slug.with_suffix(2).unwrap().as_str(), "gauge-care-2");
    }

    #[test]
    fn test_slug_deserialize_rejects_invalid() {
        let ok: Slug = serde_json::from_str("\"coimbatore\"").unwrap();
        assert_eq!(ok, "coimbatore");
        assert!(serde_json::from_str::<Slug>("\"Coimbatore\"").is_err());
    }

    proptest! {
        #[test]
        fn prop_from_title_always_matches_pattern(title in "[A-Za-z0-9 ,.&()!?-]{1,80}") {
            if let Ok(slug) = Slug::from_title(&title) {
                prop_assert!(SLUG_PATTERN.is_match(slug.as_str()));
                prop_assert!(slug.as_str().len() <= Slug::MAX_LENGTH);
            }
        }
    }
}
