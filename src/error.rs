//! Failure taxonomy for validation and dispatch.
//!
//! Every failure carries both a machine-readable [`ErrorKind`] and a
//! descriptive message (via `Display`), so a hosting layer can map kinds to
//! its own user-facing text without parsing strings.

use crate::dataset::ColumnKind;
use crate::distributions::DistributionError;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors produced by the dataset view, the validator, or the dispatcher.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("unknown analysis method '{0}'")]
    UnknownMethod(String),

    #[error("column '{column}' does not exist in the dataset")]
    MissingColumn { column: String },

    #[error("{method} requires a {role} column; none was given")]
    MissingColumnRole {
        method: &'static str,
        role: &'static str,
    },

    #[error("column '{column}' is {actual} but {method} requires a {expected} column")]
    ColumnTypeMismatch {
        column: String,
        method: &'static str,
        expected: &'static str,
        actual: ColumnKind,
    },

    #[error("{method} needs at least {required} groups in '{column}', found {found}")]
    InsufficientGroups {
        column: String,
        method: &'static str,
        required: usize,
        found: usize,
    },

    #[error("{method} compares exactly two groups but '{column}' has {found}")]
    TooManyGroups {
        column: String,
        method: &'static str,
        found: usize,
    },

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    #[error("computation failed: {0}")]
    ComputationFailure(String),

    #[error("invalid dataset: {0}")]
    InvalidDataset(String),
}

/// Fieldless discriminant of [`AnalysisError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnknownMethod,
    MissingColumn,
    ColumnTypeMismatch,
    InsufficientGroups,
    TooManyGroups,
    InsufficientData,
    DegenerateInput,
    ComputationFailure,
    InvalidDataset,
}

impl AnalysisError {
    /// Returns the failure kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownMethod(_) => ErrorKind::UnknownMethod,
            Self::MissingColumn { .. } | Self::MissingColumnRole { .. } => {
                ErrorKind::MissingColumn
            }
            Self::ColumnTypeMismatch { .. } => ErrorKind::ColumnTypeMismatch,
            Self::InsufficientGroups { .. } => ErrorKind::InsufficientGroups,
            Self::TooManyGroups { .. } => ErrorKind::TooManyGroups,
            Self::InsufficientData(_) => ErrorKind::InsufficientData,
            Self::DegenerateInput(_) => ErrorKind::DegenerateInput,
            Self::ComputationFailure(_) => ErrorKind::ComputationFailure,
            Self::InvalidDataset(_) => ErrorKind::InvalidDataset,
        }
    }
}

impl From<DistributionError> for AnalysisError {
    fn from(err: DistributionError) -> Self {
        AnalysisError::ComputationFailure(err.to_string())
    }
}
