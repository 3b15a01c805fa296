use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the clarification monitor.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Logged in, but the session does not carry the owner privilege marker.
    #[error("Authorization failed: {0}")]
    Authorization(String),

    /// A request never produced a response (connect failure, timeout, …).
    #[error("Transport failure during {stage}: {source}")]
    Transport {
        stage: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The remote site answered with a non-OK status.
    #[error("Unexpected HTTP status during {stage}: {status}")]
    HttpStatus { stage: &'static str, status: u16 },

    /// The clarification board could not be read as a document.
    #[error("Failed to parse clarification board: {0}")]
    Parse(String),

    /// The webhook target rejected the notification or was unreachable.
    #[error("Notification delivery failed: {0}")]
    Delivery(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The configuration file is not valid TOML for the expected shape.
    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MonitorError {
    /// Wrap a lower-level error as a [`MonitorError::Transport`].
    pub fn transport<E>(stage: &'static str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transport {
            stage,
            source: Box::new(source),
        }
    }

    /// `true` for failures that suggest the session is no longer valid.
    pub fn is_session_failure(&self) -> bool {
        matches!(self, Self::HttpStatus { .. } | Self::Authorization(_))
    }
}

/// Convenience alias used throughout the monitor crates.
pub type Result<T> = std::result::Result<T, MonitorError>;
