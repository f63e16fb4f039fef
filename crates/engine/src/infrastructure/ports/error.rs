//! Error types for port operations.

/// Document store errors with context for debugging.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// Document not found - includes the full document path.
    #[error("Document not found: {path}")]
    NotFound { path: String },

    /// The backend could not be reached or timed out. Safe to retry.
    #[error("Store unavailable in {operation}: {message}")]
    Unavailable {
        operation: &'static str,
        message: String,
    },

    /// A conditional write batch was rejected because a precondition no
    /// longer holds. Nothing from the batch was applied.
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// A cursor was presented with a query of a different shape.
    #[error("Cursor does not belong to this query")]
    CursorMismatch,

    /// A cursor token could not be decoded.
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    /// Serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    pub fn not_found(path: impl ToString) -> Self {
        Self::NotFound {
            path: path.to_string(),
        }
    }

    pub fn unavailable(operation: &'static str, message: impl ToString) -> Self {
        Self::Unavailable {
            operation,
            message: message.to_string(),
        }
    }

    pub fn precondition(message: impl ToString) -> Self {
        Self::PreconditionFailed(message.to_string())
    }

    pub fn serialization(message: impl ToString) -> Self {
        Self::Serialization(message.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_precondition_failed(&self) -> bool {
        matches!(self, Self::PreconditionFailed(_))
    }

    /// Only backend unavailability is worth retrying; every other error
    /// would fail the same way again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}
