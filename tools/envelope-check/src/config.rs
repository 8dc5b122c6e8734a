//! envelope-check configuration (env-driven).

use anyhow::{bail, Result};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => bail!("SWITCHBOARD_LOG_FORMAT must be 'text' or 'json', got '{}'.", other),
        }
    }
}

/// Process-level configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let log_level = lookup("SWITCHBOARD_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let log_format = lookup("SWITCHBOARD_LOG_FORMAT")
            .map(|v| v.parse())
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            log_level,
            log_format,
        })
    }
}
