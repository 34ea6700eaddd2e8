//! # Errors
//!
//! Error types for the store collaborators, attribute extraction and the
//! pipeline as a whole.
//!
//! Only [`PipelineError`] ever leaves a run. [`FieldError`] is always
//! handled where it is raised: the offending record is skipped and logged.

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure talking to the metadata store or the blob store
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested object does not exist. Expected for bakes without a package list.
    #[error("object not found: {key}")]
    NotFound { key: String },

    /// The store could not be reached or refused the request
    #[error("{operation} failed: {source}")]
    Transport {
        operation: String,
        #[source]
        source: BoxError,
    },

    /// The store signalled more data but gave no cursor to continue from
    #[error("{operation} returned a partial result without a continuation cursor")]
    Truncated { operation: String },
}

impl StoreError {
    pub fn transport(
        operation: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Transport {
            operation: operation.into(),
            source: source.into(),
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// A single attribute could not be extracted from a metadata item
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("missing attribute `{field}`")]
    Missing { field: &'static str },

    #[error("attribute `{field}` is {found}, expected {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("attribute `{field}` is not a valid number: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
}

/// Terminal error of a pipeline run. No records are emitted when this is returned.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("run cancelled before completion")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_distinguished_from_transport() {
        let missing = StoreError::NotFound {
            key: "packagelists/r1--3.txt".to_string(),
        };
        let broken = StoreError::transport("s3.get_object", "connection reset");

        assert!(missing.is_not_found());
        assert!(!broken.is_not_found());
        assert_eq!(broken.to_string(), "s3.get_object failed: connection reset");
    }

    #[test]
    fn test_pipeline_error_wraps_store_error_transparently() {
        let err = PipelineError::from(StoreError::Truncated {
            operation: "dynamodb.scan".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "dynamodb.scan returned a partial result without a continuation cursor"
        );
    }

    #[test]
    fn test_field_error_messages() {
        let err = FieldError::WrongType {
            field: "buildNumber",
            expected: "number",
            found: "string",
        };
        assert_eq!(err.to_string(), "attribute `buildNumber` is string, expected number");
    }
}
