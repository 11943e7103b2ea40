// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

use super::ConfigError;
use crate::negotiation::{Broker, CharacterSet, MimeType};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub negotiation: NegotiationConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    /// Listen backlog
    #[serde(default = "default_backlog")]
    pub backlog: i32,
}

#[allow(clippy::missing_const_for_fn)]
fn default_backlog() -> i32 {
    128
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Minimum level written: debug, info, warn or error
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    /// Keep-alive is disabled when 0
    pub keep_alive_timeout: u64,
    /// Seconds allowed for reading a request head or body
    pub read_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub max_body_size: u64,
}

/// Negotiation settings, as written in the config file
#[derive(Debug, Deserialize, Clone)]
pub struct NegotiationConfig {
    /// Charsets the server can encode responses in
    pub charsets: Vec<String>,
    /// Methods the server implements
    pub methods: Vec<String>,
    /// Charset used when the client states no preference
    pub default_charset: String,
    /// Content type used when the client states no preference
    pub default_mimetype: String,
}

impl NegotiationConfig {
    /// Verify the settings and build a broker from them
    ///
    /// Method names are uppercased. The default charset must be one of the
    /// offered charsets, compared by codec.
    pub fn build_broker(&self) -> Result<Broker, ConfigError> {
        if self.charsets.is_empty() {
            return Err(ConfigError::Invalid("negotiation.charsets is empty".into()));
        }
        if self.methods.is_empty() {
            return Err(ConfigError::Invalid("negotiation.methods is empty".into()));
        }

        let charsets = self
            .charsets
            .iter()
            .map(|name| {
                CharacterSet::new(name)
                    .map_err(|e| ConfigError::Invalid(format!("negotiation.charsets: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let default_charset = CharacterSet::new(&self.default_charset)
            .map_err(|e| ConfigError::Invalid(format!("negotiation.default_charset: {e}")))?;
        if !charsets.iter().any(|c| c.codec() == default_charset.codec()) {
            return Err(ConfigError::Invalid(format!(
                "negotiation.default_charset {} is not among the offered charsets",
                default_charset.name()
            )));
        }

        let mut methods: Vec<String> = Vec::with_capacity(self.methods.len());
        for method in &self.methods {
            let method = method.trim().to_ascii_uppercase();
            if !crate::negotiation::grammar::is_token(&method) {
                return Err(ConfigError::Invalid(format!(
                    "negotiation.methods: {method:?} is not a method name"
                )));
            }
            if !methods.contains(&method) {
                methods.push(method);
            }
        }

        let default_mimetype = MimeType::parse(&self.default_mimetype)
            .map_err(|e| ConfigError::Invalid(format!("negotiation.default_mimetype: {e}")))?;
        if default_mimetype.is_range() {
            return Err(ConfigError::Invalid(format!(
                "negotiation.default_mimetype {default_mimetype} is a media range"
            )));
        }

        Ok(Broker::new(charsets, default_charset, methods, default_mimetype))
    }
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            charsets: vec!["utf-8".to_string(), "ascii".to_string()],
            methods: vec!["GET".to_string(), "POST".to_string(), "PUT".to_string()],
            default_charset: "utf-8".to_string(),
            default_mimetype: "text/html".to_string(),
        }
    }
}
