use crate::resend::RESEND_API_URL;
use anyhow::{bail, Context};
use lettre::message::Mailbox;
use std::borrow::Cow;

const FROM_ADDRESS: &str = "MR Massages Animaliers <onboarding@resend.dev>";
const RECIPIENT_ADDRESS: &str = "MR Massages Animaliers <mr_massages.animaliers@yahoo.com>";
const BUSINESS_NAME: &str = "MR Massages Animaliers";

pub const RESEND_API_URL_VAR: &str = "RESEND_API_URL";
pub const FROM_ADDRESS_VAR: &str = "CONTACT_FROM_ADDRESS";
pub const RECIPIENT_ADDRESS_VAR: &str = "CONTACT_RECIPIENT_ADDRESS";
pub const BUSINESS_NAME_VAR: &str = "CONTACT_BUSINESS_NAME";
pub const SEND_CONFIRMATION_VAR: &str = "SEND_CONFIRMATION_EMAIL";
pub const INCLUDE_PROVIDER_RESPONSE_VAR: &str = "INCLUDE_PROVIDER_RESPONSE";

/// Non-secret settings of the relay, read once when the function starts.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub resend_api_url: String,
    pub from_address: Mailbox,
    pub recipient_address: Mailbox,
    pub business_name: String,
    /// Also send an acknowledgement to the visitor.
    pub send_confirmation: bool,
    /// Echo the provider's acknowledgement in the success response.
    pub include_provider_response: bool,
}

impl RelayConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            resend_api_url: env_or(RESEND_API_URL_VAR, RESEND_API_URL).into_owned(),
            from_address: parse_mailbox(FROM_ADDRESS_VAR, FROM_ADDRESS)?,
            recipient_address: parse_mailbox(RECIPIENT_ADDRESS_VAR, RECIPIENT_ADDRESS)?,
            business_name: env_or(BUSINESS_NAME_VAR, BUSINESS_NAME).into_owned(),
            send_confirmation: parse_flag(SEND_CONFIRMATION_VAR)?,
            include_provider_response: parse_flag(INCLUDE_PROVIDER_RESPONSE_VAR)?,
        })
    }
}

fn env_or(key: &'static str, default: &'static str) -> Cow<'static, str> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(Cow::Owned)
        .unwrap_or(default.into())
}

fn parse_mailbox(key: &'static str, default: &'static str) -> anyhow::Result<Mailbox> {
    let value = env_or(key, default);
    value
        .parse()
        .with_context(|| format!("{key} is not a valid mailbox: {value}"))
}

fn parse_flag(key: &'static str) -> anyhow::Result<bool> {
    let Ok(value) = std::env::var(key) else {
        return Ok(false);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" => Ok(false),
        "1" | "true" | "yes" => Ok(true),
        _ => bail!("{key} must be a boolean, got {value:?}"),
    }
}
