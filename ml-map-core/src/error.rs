//! Error types for mapping training, application and composition

use thiserror::Error;

/// Result type for mapping operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for mapping operations
///
/// Every variant is a contract violation surfaced to the caller. Nothing in
/// this crate retries.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A task selector outside describe/train/apply/construct
    #[error("Unsupported task: '{selector}'")]
    UnsupportedTask {
        /// The selector that could not be dispatched
        selector: String,
    },

    /// Apply was requested on a mapping that has not been trained
    #[error("Mapping '{name}' is not trained")]
    NotTrained {
        /// Name of the offending mapping
        name: String,
    },

    /// The definition cannot perform the requested operation
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Chaining past a terminal output, or stages disagreeing on shape
    #[error("Composition type error: {0}")]
    CompositionType(String),

    /// Matrix and label sequences do not agree in length
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_task_carries_selector() {
        let err = Error::UnsupportedTask {
            selector: "predict".to_string(),
        };
        assert!(err.to_string().contains("'predict'"));
    }

    #[test]
    fn test_not_trained_names_mapping() {
        let err = Error::NotTrained {
            name: "Scaling".to_string(),
        };
        assert_eq!(err.to_string(), "Mapping 'Scaling' is not trained");
    }

    #[test]
    fn test_error_is_std_error() {
        let err = Error::CompositionType("terminal stage".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
