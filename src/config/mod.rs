// Configuration module entry point
// Loads layered configuration and holds shared application state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, HttpConfig, LoggingConfig, NegotiationConfig, PerformanceConfig, ServerConfig,
};

/// Configuration failure
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("invalid resource: {0}")]
    Route(#[from] crate::routing::RouteError),
}

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// The file is optional; `CONNEG_`-prefixed environment variables
    /// override it, e.g. `CONNEG_SERVER__PORT=9000`.
    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        let negotiation = NegotiationConfig::default();
        let settings = config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.backlog", 128)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("http.server_name", concat!("conneg/", env!("CARGO_PKG_VERSION")))?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .set_default("negotiation.charsets", negotiation.charsets)?
            .set_default("negotiation.methods", negotiation.methods)?
            .set_default("negotiation.default_charset", negotiation.default_charset)?
            .set_default("negotiation.default_mimetype", negotiation.default_mimetype)?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("CONNEG")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("negotiation.charsets")
                    .with_list_parse_key("negotiation.methods")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.verify()?;
        Ok(config)
    }

    /// Check settings that deserialization alone cannot
    pub fn verify(&self) -> Result<(), ConfigError> {
        self.negotiation.build_broker()?;
        if crate::logger::Level::parse(&self.logging.level).is_none() {
            return Err(ConfigError::Invalid(format!(
                "logging.level {:?} is not one of debug, info, warn, error",
                self.logging.level
            )));
        }
        if self.server.backlog <= 0 {
            return Err(ConfigError::Invalid("server.backlog must be positive".into()));
        }
        if self.performance.read_timeout == 0 {
            return Err(ConfigError::Invalid("performance.read_timeout must be positive".into()));
        }
        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("Invalid address: {e}")))
    }
}
