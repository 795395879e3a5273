// src/error.rs

//! Unified error handling for the exposure watcher.

use std::fmt;

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// History store operation failed
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// A source could not be fetched or returned unusable data
    #[error("Fetch error for {src}: {message}")]
    Fetch { src: String, message: String },

    /// A source page no longer matches its expected column layout
    #[error("Schema mismatch for {src}: {detail}")]
    SchemaMismatch { src: String, detail: String },

    /// A notification channel rejected a chunk
    #[error("Delivery error for {channel}: {message}")]
    Delivery { channel: String, message: String },

    /// A record was missing a field its schema requires
    #[error("Render error for {src}: missing field '{field}'")]
    Render { src: String, field: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a fetch error with source context.
    pub fn fetch(source: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            src: source.into(),
            message: message.to_string(),
        }
    }

    /// Create a schema mismatch error.
    pub fn schema_mismatch(source: impl Into<String>, detail: impl fmt::Display) -> Self {
        Self::SchemaMismatch {
            src: source.into(),
            detail: detail.to_string(),
        }
    }

    /// Create a delivery error with channel context.
    pub fn delivery(channel: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Delivery {
            channel: channel.into(),
            message: message.to_string(),
        }
    }

    /// Create a render error.
    pub fn render(source: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Render {
            src: source.into(),
            field: field.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Process exit code for the invoking scheduler.
    ///
    /// Fetch failures and delivery failures map to distinct codes so the
    /// scheduler can tell a transient upstream outage from a channel outage.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Fetch { .. } | Self::SchemaMismatch { .. } | Self::Http(_) => 2,
            Self::Delivery { .. } => 3,
            _ => 1,
        }
    }
}
