use thiserror::Error;

/// Convenience result type for row reading, filtering, and aggregation.
pub type QueryResult<T> = Result<T, QueryError>;

/// Error type returned across the crate.
///
/// The messages of [`QueryError::InvalidFile`] and [`QueryError::TypeMismatch`] are stable and
/// safe to match on.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The input path does not exist, has a disallowed extension, or has no header record.
    #[error("{0}")]
    InvalidFile(String),

    /// A summed column holds a value that is not an int or float.
    #[error(
        "Trying to sum column '{column}', which must be an int or float; \
         it is a {type_name} with value {value}"
    )]
    TypeMismatch {
        column: String,
        value: String,
        type_name: &'static str,
    },

    /// A row has no field with the requested name.
    #[error("key not found: '{key}'")]
    KeyNotFound { key: String },

    /// A data record has fewer fields than the header.
    #[error("record {record} has no value at index {index} for field '{field}'")]
    FieldOutOfRange {
        record: u64,
        index: usize,
        field: String,
    },

    /// Underlying I/O error (open, decompression, scratch file).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV input.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl QueryError {
    pub(crate) fn invalid_file(message: impl Into<String>) -> Self {
        Self::InvalidFile(message.into())
    }

    /// Short, stable name of the variant, used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidFile(_) => "invalid-file",
            Self::TypeMismatch { .. } => "type-mismatch",
            Self::KeyNotFound { .. } => "key-not-found",
            Self::FieldOutOfRange { .. } => "field-out-of-range",
            Self::Io(_) => "io",
            Self::Csv(_) => "csv",
        }
    }

    /// Returns `true` if this error originates from the operating system rather than the data.
    pub fn is_io(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::Csv(err) => matches!(err.kind(), csv::ErrorKind::Io(_)),
            _ => false,
        }
    }
}
