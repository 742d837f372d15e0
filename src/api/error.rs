//! API Error Types
//!
//! Errors raised while building and running the HTTP server. Request
//! handlers are infallible; these only surface at startup and shutdown.

use thiserror::Error;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Invalid server configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server loop failed
    #[error("Server error: {0}")]
    Server(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let err: ApiError = std::io::Error::new(std::io::ErrorKind::AddrInUse, "taken").into();
        assert!(matches!(err, ApiError::Io(_)));
        assert_eq!(err.to_string(), "IO error: taken");
    }

    #[test]
    fn test_config_error_message() {
        let err = ApiError::Config("bad origin".to_string());
        assert_eq!(err.to_string(), "Configuration error: bad origin");
    }
}
