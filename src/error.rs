// src/error.rs
//! Error taxonomy for certinfo
//!
//! Per-job failures ([`FetchError`]) are absorbed by the worker pool and never
//! abort a round. Configuration failures ([`ConfigError`]) are fatal and are
//! raised before any worker starts.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to obtain a certificate record from a single target
#[derive(Debug, Error)]
pub enum FetchError {
    /// TCP connect or TLS handshake failed (refused, reset, timed out, ...)
    #[error("failed to connect to {host}: {source}")]
    Connect {
        host: String,
        #[source]
        source: io::Error,
    },

    /// Handshake completed but the peer presented an empty chain
    ///
    /// rustls already rejects an empty server chain during the handshake, so
    /// with [`TlsFetcher`](crate::fetcher::TlsFetcher) that case surfaces as
    /// [`FetchError::Connect`]; this variant covers other fetchers.
    #[error("no certificates found for {host}")]
    NoCertificate { host: String },

    /// The leaf certificate could not be decoded
    #[error("malformed certificate from {host}: {reason}")]
    MalformedCertificate { host: String, reason: String },
}

impl FetchError {
    pub fn connect(host: impl Into<String>, source: io::Error) -> Self {
        Self::Connect {
            host: host.into(),
            source,
        }
    }

    /// Host the failed job was aimed at
    pub fn host(&self) -> &str {
        match self {
            Self::Connect { host, .. }
            | Self::NoCertificate { host }
            | Self::MalformedCertificate { host, .. } => host,
        }
    }

    /// True when the failure was the per-connection timeout firing
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Connect { source, .. } if source.kind() == io::ErrorKind::TimedOut)
    }
}

/// Invalid run configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid timeout duration {value:?}: {reason}")]
    InvalidTimeout { value: String, reason: String },

    #[error("concurrency must be a positive integer, got {0}")]
    InvalidConcurrency(usize),

    #[error("{0}")]
    IncompatibleFlags(String),

    #[error("failed to load config file {path}: {reason}")]
    File { path: PathBuf, reason: String },

    #[error("failed to build TLS client configuration: {0}")]
    Tls(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_host() {
        let err = FetchError::connect(
            "example.com:443",
            io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
        );
        assert_eq!(err.host(), "example.com:443");
        assert!(!err.is_timeout());

        let err = FetchError::NoCertificate {
            host: "a.example:443".to_string(),
        };
        assert_eq!(err.host(), "a.example:443");
        assert_eq!(err.to_string(), "no certificates found for a.example:443");
    }

    #[test]
    fn test_timeout_detection() {
        let err = FetchError::connect(
            "slow.example:443",
            io::Error::new(io::ErrorKind::TimedOut, "handshake timed out"),
        );
        assert!(err.is_timeout());
        assert!(err.to_string().contains("slow.example:443"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidConcurrency(0);
        assert_eq!(
            err.to_string(),
            "concurrency must be a positive integer, got 0"
        );
    }
}
