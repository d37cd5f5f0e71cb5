//! Error types for the tmload library

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("AnnData error: {0}")]
    AnnData(#[from] anyhow::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Sparse matrix error: {0}")]
    SparseMatrix(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Parse error in {source_name} at line {line}: {message}")]
    Parse {
        source_name: String,
        line: u64,
        message: String,
    },

    #[error("Duplicate {axis} identifier: {name}")]
    DuplicateIdentifier { axis: String, name: String },

    #[error("Metadata column not found: {0}")]
    MissingColumn(String),

    #[error("Metadata is missing {missing} cell(s) present in the count matrix (first: {example})")]
    MetadataMismatch { missing: usize, example: String },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    #[error("Data processing error: {0}")]
    DataProcessing(String),

    #[error("Empty data: {0}")]
    EmptyData(String),
}

pub type Result<T> = std::result::Result<T, LoaderError>;

impl From<nalgebra_sparse::SparseFormatError> for LoaderError {
    fn from(err: nalgebra_sparse::SparseFormatError) -> Self {
        LoaderError::SparseMatrix(format!("Sparse format error: {:?}", err))
    }
}

/// Returns `true` if the error originated from a broken pipe.
///
/// Console output is commonly piped into `head`; the binary treats that as a
/// clean exit rather than a failure.
#[inline]
pub fn is_broken_pipe(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<io::Error>()
            .map(|io_err| io_err.kind() == io::ErrorKind::BrokenPipe)
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broken_pipe_is_detected_through_loader_error() {
        let inner = LoaderError::Io(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
        let err = anyhow::Error::from(inner);
        assert!(is_broken_pipe(&err));
    }

    #[test]
    fn other_errors_are_not_broken_pipes() {
        let err = anyhow::Error::from(LoaderError::EmptyData("nothing".to_string()));
        assert!(!is_broken_pipe(&err));

        let not_found = anyhow::Error::from(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert!(!is_broken_pipe(&not_found));
    }

    #[test]
    fn mismatch_message_names_first_missing_cell() {
        let err = LoaderError::MetadataMismatch {
            missing: 2,
            example: "A1.B003290.3_38_F.1.1".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("2 cell(s)"));
        assert!(message.contains("A1.B003290.3_38_F.1.1"));
    }
}
