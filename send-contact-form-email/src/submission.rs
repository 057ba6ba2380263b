use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::sync::OnceLock;

pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_EMAIL_LENGTH: usize = 100;
pub const MAX_MESSAGE_LENGTH: usize = 5000;
pub const MAX_PHONE_LENGTH: usize = 20;

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();

/// A contact form submission as posted by the website.
///
/// Every field is optional at this stage so that a partially filled form still
/// deserialises and can be rejected with a meaningful message. Numbers and
/// booleans are accepted in place of strings.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct ContactSubmission {
    #[serde(deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub phone: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub animal: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub message: Option<String>,
    /// Honeypot. Hidden from humans by the form's CSS.
    #[serde(deserialize_with = "lenient_string")]
    pub company: Option<String>,
}

impl ContactSubmission {
    /// Any non-empty honeypot value, whitespace included, marks a bot.
    pub fn is_spam(&self) -> bool {
        self.company
            .as_deref()
            .is_some_and(|company| !company.is_empty())
    }

    pub fn validate(&self) -> Result<ValidatedSubmission, ValidationError> {
        let (Some(name), Some(email), Some(message)) = (
            non_blank(&self.name),
            non_blank(&self.email),
            non_blank(&self.message),
        ) else {
            return Err(ValidationError::MissingRequiredFields);
        };

        if !email_regex().is_match(email) {
            return Err(ValidationError::InvalidEmailFormat);
        }

        if exceeds(name, MAX_NAME_LENGTH)
            || exceeds(email, MAX_EMAIL_LENGTH)
            || exceeds(message, MAX_MESSAGE_LENGTH)
        {
            return Err(ValidationError::PayloadTooLarge);
        }

        let phone = non_blank(&self.phone);
        if phone.is_some_and(|phone| exceeds(phone, MAX_PHONE_LENGTH)) {
            return Err(ValidationError::InvalidPhone);
        }

        Ok(ValidatedSubmission {
            name,
            email,
            phone,
            animal: non_blank(&self.animal),
            message,
        })
    }
}

#[derive(Debug, PartialEq)]
pub struct ValidatedSubmission<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub animal: Option<&'a str>,
    pub message: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    MissingRequiredFields,
    InvalidEmailFormat,
    PayloadTooLarge,
    InvalidPhone,
}

impl ValidationError {
    /// The message shown to the visitor.
    pub fn client_message(&self) -> &'static str {
        match self {
            ValidationError::MissingRequiredFields => "Champs requis manquants",
            ValidationError::InvalidEmailFormat => "Format d'email invalide",
            ValidationError::PayloadTooLarge => "Les données envoyées sont trop volumineuses",
            ValidationError::InvalidPhone => "Numéro de téléphone invalide",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingRequiredFields => write!(f, "Missing required fields"),
            ValidationError::InvalidEmailFormat => write!(f, "Invalid email format"),
            ValidationError::PayloadTooLarge => write!(f, "Payload too large"),
            ValidationError::InvalidPhone => write!(f, "Invalid phone number"),
        }
    }
}

impl std::error::Error for ValidationError {}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null | Value::Bool(false) => None,
        Value::String(value) => Some(value),
        other => Some(other.to_string()),
    })
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn exceeds(value: &str, max_length: usize) -> bool {
    value.chars().count() > max_length
}

fn email_regex() -> &'static Regex {
    EMAIL_REGEX.get_or_init(|| Regex::new(EMAIL_PATTERN).unwrap())
}
