//! NPN-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, NpnError>;

/// Top-level error type for the node points notifier.
#[derive(Debug, Error)]
pub enum NpnError {
    #[error("[NPN-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[NPN-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[NPN-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[NPN-2001] http failure in {context}: {details}")]
    Http {
        context: &'static str,
        details: String,
    },

    #[error("[NPN-2002] status endpoint returned HTTP {status}")]
    UpstreamStatus { status: u16 },

    #[error("[NPN-2003] status endpoint body is not valid JSON: {details}")]
    UpstreamBody { details: String },

    #[error("[NPN-2004] status payload failed schema validation: {details}")]
    MalformedUpstreamSchema { details: String },

    #[error("[NPN-2005] status fetch failed after {attempts} attempt(s): {last_error}")]
    FetchExhausted { attempts: u32, last_error: String },

    #[error("[NPN-2101] messaging endpoint rejected notification with HTTP {status}")]
    NotifyRejected { status: u16 },

    #[error("[NPN-2201] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[NPN-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[NPN-3900] runtime failure: {details}")]
    Runtime { details: String },

    #[error("[NPN-3901] shutdown requested after {attempts} fetch attempt(s)")]
    Cancelled { attempts: u32 },
}

impl NpnError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "NPN-1001",
            Self::MissingConfig { .. } => "NPN-1002",
            Self::ConfigParse { .. } => "NPN-1003",
            Self::Http { .. } => "NPN-2001",
            Self::UpstreamStatus { .. } => "NPN-2002",
            Self::UpstreamBody { .. } => "NPN-2003",
            Self::MalformedUpstreamSchema { .. } => "NPN-2004",
            Self::FetchExhausted { .. } => "NPN-2005",
            Self::NotifyRejected { .. } => "NPN-2101",
            Self::Serialization { .. } => "NPN-2201",
            Self::Io { .. } => "NPN-3002",
            Self::Runtime { .. } => "NPN-3900",
            Self::Cancelled { .. } => "NPN-3901",
        }
    }

    /// Whether another fetch attempt might resolve the failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Http { .. } | Self::UpstreamStatus { .. } | Self::UpstreamBody { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<reqwest::Error> for NpnError {
    fn from(value: reqwest::Error) -> Self {
        let context = if value.is_timeout() {
            "timeout"
        } else if value.is_connect() {
            "connect"
        } else if value.is_body() || value.is_decode() {
            "body"
        } else {
            "reqwest"
        };
        // without_url keeps bot tokens embedded in request paths out of messages
        Self::Http {
            context,
            details: value.without_url().to_string(),
        }
    }
}

impl From<toml::de::Error> for NpnError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

impl From<toml::ser::Error> for NpnError {
    fn from(value: toml::ser::Error) -> Self {
        Self::Serialization {
            context: "toml",
            details: value.to_string(),
        }
    }
}
