// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Error types for Mustekala
//!
//! Transport errors from the underlying client propagate unwrapped;
//! retry policy belongs to the caller.

use thiserror::Error;

/// Result type alias for Mustekala operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Mustekala
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Malformed proxy descriptor
    #[error("Invalid proxy format '{descriptor}': use 'host:port' or 'host:port:user:pass'")]
    InvalidProxyFormat { descriptor: String },

    /// Cookie handling error
    #[error("Cookie error: {0}")]
    Cookie(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a proxy format error
    pub fn invalid_proxy(descriptor: impl Into<String>) -> Self {
        Error::InvalidProxyFormat {
            descriptor: descriptor.into(),
        }
    }

    /// Create a new cookie error
    pub fn cookie<S: Into<String>>(msg: S) -> Self {
        Error::Cookie(msg.into())
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a transport-layer error
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Http(_))
    }

    /// Check if this is a timeout from the underlying client
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Http(e) if e.is_timeout())
    }

    /// Check if this is a user/config error (bad descriptor, bad input)
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_) | Error::InvalidProxyFormat { .. })
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_proxy_display() {
        let err = Error::invalid_proxy("proxy:8080:user");
        assert!(err.to_string().contains("proxy:8080:user"));
        assert!(err.is_config());
        assert!(!err.is_transport());
    }

    #[test]
    fn test_string_conversion() {
        let err: Error = "something broke".into();
        assert_eq!(err.to_string(), "something broke");
    }
}
