// Application state module
// Shared, read-only state handed to every connection

use super::types::Config;
use super::ConfigError;
use crate::handler::{builtin, Application};

/// Application state
pub struct AppState {
    pub config: Config,
    pub application: Application,
    /// Whether each request is written to the access log
    pub access_log: bool,
}

impl AppState {
    /// Build the state, including the application with its built-in
    /// resources
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let application = builtin::application(config)?;
        Ok(Self::with_application(config, application))
    }

    /// Build the state around an already assembled application
    pub fn with_application(config: &Config, application: Application) -> Self {
        Self {
            config: config.clone(),
            application,
            access_log: config.logging.access_log,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_log_follows_config() {
        let mut config = Config::load_from("does-not-exist").unwrap();
        config.logging.access_log = false;
        assert!(!AppState::new(&config).unwrap().access_log);

        config.logging.access_log = true;
        let state = AppState::new(&config).unwrap();
        assert!(state.access_log);
        assert_eq!(state.config.logging.access_log_format, config.logging.access_log_format);
    }
}
