use std::fmt;

use arrow::error::ArrowError;

use crate::datatype::{ArrayElementType, Dimensions};

/// Which side of a UDF call a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Input,
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UdfIoError {
    #[error("The input object cannot be reshaped to {expected}. Error is {reason}")]
    ShapeMismatch {
        expected: Dimensions,
        actual: Vec<usize>,
        reason: String,
    },

    #[error("Unknown data type. Only nested sequences, host arrays and arrow tensors can be converted to {target}, got {found}")]
    UnsupportedRepresentation {
        target: &'static str,
        found: String,
    },

    #[error("Unknown array type: {0}")]
    UnknownElementType(ArrayElementType),

    #[error(
        "columns, column_types and column_shapes should be of same length if specified. \
         Got {columns} columns, {column_types} column types and {column_shapes} column shapes"
    )]
    LengthMismatch {
        columns: usize,
        column_types: usize,
        column_shapes: usize,
    },

    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Expected {expected} {direction} values, got {actual}")]
    ArityMismatch {
        direction: Direction,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid {direction} value at position {index}: {source}")]
    InvalidArgument {
        direction: Direction,
        index: usize,
        source: Box<UdfIoError>,
    },

    #[error("Invalid column {column}: {source}")]
    InvalidColumn {
        column: String,
        source: Box<UdfIoError>,
    },

    #[error("UDF is already registered: {0}")]
    DuplicateUdf(String),

    #[error("{0}")]
    Execution(String),

    #[error(transparent)]
    Arrow(#[from] ArrowError),
}

/// Cause of an error with any positional context removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UdfIoErrorKind {
    ShapeMismatch,
    UnsupportedRepresentation,
    UnknownElementType,
    LengthMismatch,
    DuplicateColumn,
    MissingColumn,
    ArityMismatch,
    DuplicateUdf,
    Execution,
    Arrow,
}

impl UdfIoError {
    /// Create an error raised from inside a UDF body.
    pub fn execution(msg: impl Into<String>) -> Self {
        UdfIoError::Execution(msg.into())
    }

    pub(crate) fn unsupported(target: &'static str, found: impl Into<String>) -> Self {
        UdfIoError::UnsupportedRepresentation {
            target,
            found: found.into(),
        }
    }

    /// Get the kind of the underlying cause, looking through positional
    /// wrapping.
    pub fn kind(&self) -> UdfIoErrorKind {
        match self {
            Self::ShapeMismatch { .. } => UdfIoErrorKind::ShapeMismatch,
            Self::UnsupportedRepresentation { .. } => UdfIoErrorKind::UnsupportedRepresentation,
            Self::UnknownElementType(_) => UdfIoErrorKind::UnknownElementType,
            Self::LengthMismatch { .. } => UdfIoErrorKind::LengthMismatch,
            Self::DuplicateColumn(_) => UdfIoErrorKind::DuplicateColumn,
            Self::MissingColumn(_) => UdfIoErrorKind::MissingColumn,
            Self::ArityMismatch { .. } => UdfIoErrorKind::ArityMismatch,
            Self::InvalidArgument { source, .. } | Self::InvalidColumn { source, .. } => {
                source.kind()
            }
            Self::DuplicateUdf(_) => UdfIoErrorKind::DuplicateUdf,
            Self::Execution(_) => UdfIoErrorKind::Execution,
            Self::Arrow(_) => UdfIoErrorKind::Arrow,
        }
    }
}

pub type Result<T, E = UdfIoError> = std::result::Result<T, E>;
