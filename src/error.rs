//! Error types and handling for voltcap

/// Result type alias for voltcap operations
pub type Result<T> = std::result::Result<T, VoltcapError>;

/// Error kinds raised by layout computation, stream access and generators
///
/// None of these are retried internally. End-of-data is not an error: it is
/// reported as an empty [`Block`](crate::blocks::Block).
#[derive(Debug, thiserror::Error)]
pub enum VoltcapError {
    /// I/O related errors (missing or empty files, reads, mmap)
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Header field missing, out of range or inconsistent across streams
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Operation invoked before the component was configured
    #[error("State error: {message}")]
    State { message: String },
}

impl VoltcapError {
    /// Create an I/O error from a standard I/O error
    pub fn from_io(source: std::io::Error, context: &str) -> Self {
        Self::Io {
            message: format!("{}: {}", context, source),
            source: Some(source),
        }
    }

    /// Create an I/O error that has no underlying OS error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            source: None,
        }
    }

    /// Create a validation error naming the offending field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a validation error for a field that differs between the
    /// data and weights headers
    pub fn inconsistent(field: &str) -> Self {
        Self::validation(field, format!("inconsistent {}", field))
    }

    /// Create a state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    pub fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }

    /// The field named by a validation error
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<std::io::Error> for VoltcapError {
    fn from(err: std::io::Error) -> Self {
        Self::from_io(err, "I/O operation failed")
    }
}
