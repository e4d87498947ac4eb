//! Error types for the autocomplete crate

use quill_document::DocumentError;
use thiserror::Error;

/// Result alias for controller construction and configuration
pub type AutocompleteResult<T> = Result<T, AutocompleteError>;

/// Errors produced while fetching a suggestion
///
/// The controller never surfaces these to callers; a failed fetch simply
/// means no suggestion is shown.
#[derive(Debug, Error, PartialEq, Clone)]
pub enum FetchError {
    /// Authentication failed (never includes key details)
    #[error("Authentication failed")]
    AuthError,

    /// Rate limited by the provider
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Network error occurred
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The request did not complete in time
    #[error("Request timed out")]
    Timeout,

    /// Non-success response from the provider
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// The provider answered without any completion text
    #[error("Empty response from provider")]
    EmptyResponse,

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Fetcher misconfigured
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::NetworkError(err.to_string())
        } else if err.is_decode() {
            FetchError::SerializationError(err.to_string())
        } else {
            FetchError::ProviderError(err.to_string())
        }
    }
}

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Layered source could not be read or deserialized
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    /// TOML serialization failed while saving
    #[error("Failed to serialize configuration: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// A value is out of range or malformed
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A key binding string could not be parsed
    #[error("Invalid key binding '{binding}': {reason}")]
    InvalidKeyBinding {
        /// The binding as written
        binding: String,
        /// What is wrong with it
        reason: String,
    },

    /// The tracing subscriber could not be installed
    #[error("Logging setup failed: {0}")]
    LoggingError(String),
}

impl ConfigError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        ConfigError::ValidationError(message.into())
    }

    /// Create an invalid key binding error
    pub fn invalid_binding(binding: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidKeyBinding {
            binding: binding.into(),
            reason: reason.into(),
        }
    }
}

/// Top-level error for building and wiring the autocomplete core
#[derive(Debug, Error)]
pub enum AutocompleteError {
    /// No tokio runtime is available to run timers and fetches on
    #[error("No async runtime available: {0}")]
    NoRuntime(String),

    /// Document transaction failure
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Suggestion fetch failure
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Configuration failure
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_hides_details() {
        assert_eq!(FetchError::AuthError.to_string(), "Authentication failed");
    }

    #[test]
    fn test_binding_error_message() {
        let err = ConfigError::invalid_binding("Ctrl+", "missing key");
        assert_eq!(err.to_string(), "Invalid key binding 'Ctrl+': missing key");
    }

    #[test]
    fn test_document_error_converts() {
        let err: AutocompleteError = DocumentError::NoSelection.into();
        assert!(matches!(err, AutocompleteError::Document(DocumentError::NoSelection)));
    }
}
