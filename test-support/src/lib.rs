pub mod fake_resend;

use simplelog::{ColorChoice, CombinedLogger, Config, LevelFilter, TermLogger, TerminalMode};
use std::sync::Once;

static LOGGING: Once = Once::new();

pub fn setup_logging() {
    LOGGING.call_once(|| {
        CombinedLogger::init(vec![TermLogger::new(
            LevelFilter::Debug,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        )])
        .unwrap();
    });
}

/// Sets or clears an environment variable for the lifetime of the guard and
/// restores the previous value on drop.
pub struct TemporaryEnv(&'static str, Option<String>);

impl TemporaryEnv {
    pub fn new(key: &'static str, value: impl AsRef<str>) -> Self {
        let old_value = std::env::var(key).ok();
        std::env::set_var(key, value.as_ref());
        Self(key, old_value)
    }

    pub fn unset(key: &'static str) -> Self {
        let old_value = std::env::var(key).ok();
        std::env::remove_var(key);
        Self(key, old_value)
    }
}

impl Drop for TemporaryEnv {
    fn drop(&mut self) {
        if let Some(value) = self.1.as_ref() {
            std::env::set_var(self.0, value);
        } else {
            std::env::remove_var(self.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::setup_logging;

    #[test]
    fn setup_logging_can_be_called_repeatedly() {
        setup_logging();
        setup_logging();
    }
}
