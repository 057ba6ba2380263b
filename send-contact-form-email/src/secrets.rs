use std::fmt::Display;

/// Source of the credentials needed to talk to the email provider.
pub trait SecretRepository {
    fn open() -> Self;

    fn get_secret(&self, name: &'static str) -> Result<String, EnvironmentError>;
}

/// Reads secrets from the process environment, which is where the Lambda
/// configuration places them.
#[derive(Clone, Default)]
pub struct EnvironmentSecretRepository;

impl SecretRepository for EnvironmentSecretRepository {
    fn open() -> Self {
        Self
    }

    fn get_secret(&self, name: &'static str) -> Result<String, EnvironmentError> {
        match std::env::var(name) {
            Ok(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(EnvironmentError::MissingSecret(name)),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum EnvironmentError {
    MissingSecret(&'static str),
}

impl Display for EnvironmentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnvironmentError::MissingSecret(key) => write!(f, "Missing secret {key}"),
        }
    }
}

impl std::error::Error for EnvironmentError {}

#[cfg(test)]
pub mod test_support {
    use super::{EnvironmentError, SecretRepository};
    use crate::resend::RESEND_API_KEY_NAME;
    use std::collections::HashMap;

    pub const FAKE_RESEND_API_KEY: &str = "re_arbitrary_api_key";

    pub struct FakeSecretRepository(HashMap<&'static str, String>);

    impl FakeSecretRepository {
        pub fn remove_secret(&mut self, name: &'static str) {
            self.0.remove(name);
        }

        pub fn add_secret(&mut self, name: &'static str, value: impl Into<String>) {
            self.0.insert(name, value.into());
        }
    }

    impl SecretRepository for FakeSecretRepository {
        fn open() -> Self {
            Self(HashMap::from([(
                RESEND_API_KEY_NAME,
                FAKE_RESEND_API_KEY.into(),
            )]))
        }

        fn get_secret(&self, name: &'static str) -> Result<String, EnvironmentError> {
            self.0
                .get(name)
                .cloned()
                .ok_or(EnvironmentError::MissingSecret(name))
        }
    }
}
