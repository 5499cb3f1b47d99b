//! Error types for Tidepool

use std::fmt;

/// Result type alias for Tidepool operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Tidepool
#[derive(Debug)]
pub enum Error {
    /// Transport payload could not be decoded (base64, UTF-8 or JSON)
    Decode(String),
    /// Event could not be turned into measurements
    Transform(String),
    /// Time-series sink rejected a write
    Write(String),
    /// Archive sink rejected an object
    Archive(String),
    /// Store rejected or failed a query
    Query(String),
    /// Batch input itself is malformed
    Structural(String),
    /// Invalid request parameters
    InvalidRequest(String),
    /// Configuration errors
    Config(String),
    /// Serialization errors
    Serialization(String),
    /// Object store errors
    ObjectStore(object_store::Error),
    /// HTTP client errors
    Http(reqwest::Error),
    /// IO errors
    Io(std::io::Error),
    /// Internal error
    Internal(String),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ObjectStore(e) => Some(e),
            Error::Http(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Decode(msg) => write!(f, "Decode error: {}", msg),
            Error::Transform(msg) => write!(f, "Transform error: {}", msg),
            Error::Write(msg) => write!(f, "Write error: {}", msg),
            Error::Archive(msg) => write!(f, "Archive error: {}", msg),
            Error::Query(msg) => write!(f, "Query error: {}", msg),
            Error::Structural(msg) => write!(f, "Malformed batch: {}", msg),
            Error::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            Error::ObjectStore(e) => write!(f, "Object store error: {}", e),
            Error::Http(e) => write!(f, "HTTP error: {}", e),
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl From<object_store::Error> for Error {
    fn from(e: object_store::Error) -> Self {
        Error::ObjectStore(e)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
