//! Error types for mockd.

use thiserror::Error;

/// Errors surfaced while loading configuration or running the server.
///
/// Every variant except `Bind` is produced before the listener binds, so a
/// broken configuration never serves a single request.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("endpoint {index} ({path}): {source}")]
    Endpoint {
        index: usize,
        path: String,
        source: ValidationError,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        source: std::io::Error,
    },
}

/// A structural problem in an endpoint, response, or resolver definition.
///
/// Raised at construction time only; once an entity is built it cannot
/// become invalid.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("status code {0} is outside 100..=599")]
    StatusOutOfRange(u16),

    #[error("invalid header name {0:?}")]
    InvalidHeaderName(String),

    #[error("invalid value for header {0:?}")]
    InvalidHeaderValue(String),

    #[error("weighted response list is empty")]
    EmptyWeighted,

    #[error("weight must be at least 1 (entry {index})")]
    ZeroWeight { index: usize },

    #[error("response sequence is empty")]
    EmptySequence,

    #[error("count must be at least 1 (sequence entry {index})")]
    ZeroCount { index: usize },

    #[error("endpoint path must start with '/', got {0:?}")]
    InvalidPath(String),

    #[error("invalid HTTP method {0:?}")]
    InvalidMethod(String),

    #[error("endpoint must define exactly one of `response`, `weighted`, `sequence` ({found} found)")]
    StrategyCount { found: usize },

    #[error("duplicate endpoint registration for {method} {path}")]
    DuplicateEndpoint { method: String, path: String },

    #[error("cannot read body file {path:?}: {reason}")]
    BodyFile { path: String, reason: String },

    #[error("invalid base64 body: {0}")]
    InvalidBase64(String),
}

/// Result type alias for mockd.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_error_names_the_address() {
        let err = Error::Bind {
            addr: "127.0.0.1:8080".parse().unwrap(),
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use"),
        };
        let message = err.to_string();
        assert!(message.contains("127.0.0.1:8080"), "{message}");
        assert!(!message.contains("config file"), "{message}");
    }
}
