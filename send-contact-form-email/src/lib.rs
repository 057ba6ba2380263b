pub mod config;
mod email_templates;
pub mod relay;
pub mod resend;
pub mod secrets;
pub mod submission;

pub use config::RelayConfig;
pub use relay::ContactFormRelay;
