//! Feed page size (validated newtype)

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Number of items fetched per page, both for the live first page and for
/// every "load more" extension.
///
/// # Validation Rules
///
/// - Value must be >= 1
/// - Value must be <= 100
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PageSize(u32);

impl PageSize {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 100;

    pub fn new(size: u32) -> Result<Self, DomainError> {
        if size < Self::MIN {
            return Err(DomainError::validation(format!(
                "Page size must be >= {}, got {}",
                Self::MIN,
                size
            )));
        }
        if size > Self::MAX {
            return Err(DomainError::validation(format!(
                "Page size must be <= {}, got {}",
                Self::MAX,
                size
            )));
        }
        Ok(Self(size))
    }

    /// Clamp arbitrary input (query strings, env vars) into range.
    pub fn clamped(size: u32) -> Self {
        Self(size.clamp(Self::MIN, Self::MAX))
    }

    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<PageSize> for u32 {
    fn from(size: PageSize) -> Self {
        size.0
    }
}

impl TryFrom<u32> for PageSize {
    type Error = DomainError;

    fn try_from(size: u32) -> Result<Self, Self::Error> {
        Self::new(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_and_oversized() {
        assert!(PageSize::new(0).is_err());
        assert!(PageSize::new(101).is_err());
        assert_eq!(PageSize::new(12).unwrap().value(), 12);
    }

    #[test]
    fn clamped_stays_in_range() {
        assert_eq!(PageSize::clamped(0).value(), 1);
        assert_eq!(PageSize::clamped(500).value(), 100);
    }
}
