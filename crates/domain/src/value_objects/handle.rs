//! Public member handles (`@name`)
//!
//! Handles are globally unique. They are claimed through a conditional
//! write on `usernames/{handle}`; this module only deals with their shape.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

const MIN_HANDLE_LENGTH: usize = 3;
const MAX_HANDLE_LENGTH: usize = 20;

/// A validated handle: lowercase ASCII letters, digits and `_`, 3-20 chars.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Handle(String);

impl Handle {
    /// Validate an already-normalized handle.
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.len() < MIN_HANDLE_LENGTH {
            return Err(DomainError::validation(format!(
                "Handle must be at least {} characters",
                MIN_HANDLE_LENGTH
            )));
        }
        if value.len() > MAX_HANDLE_LENGTH {
            return Err(DomainError::validation(format!(
                "Handle cannot exceed {} characters",
                MAX_HANDLE_LENGTH
            )));
        }
        if !value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(DomainError::validation(
                "Handle may only contain a-z, 0-9 and '_'",
            ));
        }
        Ok(Self(value))
    }

    /// Derive a handle from free-form input such as a display name.
    ///
    /// Lowercases, turns whitespace, `-` and `.` into `_`, drops anything
    /// else, collapses runs of `_` and trims them from both ends.
    pub fn normalize(input: &str) -> Result<Self, DomainError> {
        let mut out = String::with_capacity(input.len());
        for c in input.trim().chars() {
            let mapped = match c {
                c if c.is_ascii_alphanumeric() => Some(c.to_ascii_lowercase()),
                c if c.is_whitespace() || c == '-' || c == '.' || c == '_' => Some('_'),
                _ => None,
            };
            if let Some(m) = mapped {
                if m == '_' && out.ends_with('_') {
                    continue;
                }
                out.push(m);
            }
        }
        let trimmed = out.trim_matches('_');
        let truncated: String = trimmed.chars().take(MAX_HANDLE_LENGTH).collect();
        Self::new(truncated.trim_end_matches('_').to_string())
    }

    /// The `n`-th disambiguated variant, e.g. `dj_nova` -> `dj_nova2`.
    ///
    /// The base is shortened when needed so the result stays within the
    /// maximum length.
    pub fn with_suffix(&self, n: u32) -> Handle {
        let suffix = n.to_string();
        let keep = MAX_HANDLE_LENGTH.saturating_sub(suffix.len()).min(self.0.len());
        let mut value = self.0[..keep].to_string();
        value.push_str(&suffix);
        Handle(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Handle {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Handle> for String {
    fn from(handle: Handle) -> Self {
        handle.0
    }
}
