// Core error types shared across the G3MS SDK crates.

use crate::storage::StorageError;

/// Internal (non-HTTP) error. Configuration problems, storage failures,
/// and anything else that isn't a typed API response.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Unified result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_converts() {
        let err: CoreError = StorageError::Unavailable("quota exceeded".into()).into();
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[test]
    fn test_config_error_display() {
        let err = CoreError::Config("missing base URL".into());
        assert_eq!(err.to_string(), "Configuration error: missing base URL");
    }
}
