// Error taxonomy for the transaction store and its persistence boundary

use std::path::PathBuf;

/// Errors surfaced by store operations, queries and the file adapters.
///
/// Every variant is returned to the immediate caller; nothing in the library
/// swallows an error. None of them is fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum FinanceError {
    /// Malformed or out-of-domain input (amount, type, date, category, query).
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// The category does not exist in the store.
    #[error("category not found: {0}")]
    CategoryNotFound(String),

    /// A 1-based position outside `[1, len]`.
    #[error("index {index} is out of range, must be between 1 and {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// A line of a bulk import file could not be parsed. `line` is 1-based.
    #[error("line {line}: {message}")]
    ImportParse { line: usize, message: String },

    #[error("file {} not found", .0.display())]
    ImportFileNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl FinanceError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        FinanceError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// True for input errors a prompt loop should re-ask for.
    pub fn is_validation(&self) -> bool {
        matches!(self, FinanceError::Validation { .. })
    }
}

pub type Result<T> = std::result::Result<T, FinanceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_names_field() {
        let err = FinanceError::validation("amount", "must be a positive number");
        assert_eq!(err.to_string(), "invalid amount: must be a positive number");
        assert!(err.is_validation());
    }

    #[test]
    fn test_index_out_of_range_message() {
        let err = FinanceError::IndexOutOfRange { index: 3, len: 2 };
        assert_eq!(
            err.to_string(),
            "index 3 is out of range, must be between 1 and 2"
        );
        assert!(!err.is_validation());
    }
}
