//! Domain error type.
//!
//! Returned by validated newtypes and draft validation so the engine never
//! has to pass raw strings across layers.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Input breaks an invariant (empty title, out-of-range page size).
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// A feed rule forbids the operation.
    #[error("Not allowed: {0}")]
    Constraint(String),

    /// Unrecognised enum text, e.g. an unknown feed or reaction name.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl DomainError {
    /// ```ignore
    /// if title.trim().is_empty() {
    ///     return Err(DomainError::validation("Title cannot be empty"));
    /// }
    /// ```
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    pub fn constraint(msg: impl Into<String>) -> Self {
        Self::Constraint(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
