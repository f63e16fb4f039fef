//! Presence time-to-live in seconds
//!
//! A viewer counts as "on the page" while their last heartbeat is younger
//! than this TTL.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Presence TTL in seconds (validated newtype)
///
/// # Validation Rules
///
/// - Value must be >= 10 (heartbeats are sent every few seconds)
/// - Value must be <= 3600 (one hour)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PresenceTtl(u32);

impl PresenceTtl {
    pub const MIN: u32 = 10;
    pub const MAX: u32 = 3600;
    pub const DEFAULT: u32 = 90;

    pub fn new(seconds: u32) -> Result<Self, crate::DomainError> {
        if seconds < Self::MIN {
            return Err(crate::DomainError::validation(format!(
                "Presence TTL must be >= {} seconds, got {}",
                Self::MIN,
                seconds
            )));
        }
        if seconds > Self::MAX {
            return Err(crate::DomainError::validation(format!(
                "Presence TTL must be <= {} seconds, got {}",
                Self::MAX,
                seconds
            )));
        }
        Ok(Self(seconds))
    }

    pub fn clamped(seconds: u32) -> Self {
        Self(seconds.clamp(Self::MIN, Self::MAX))
    }

    #[inline]
    pub const fn seconds(self) -> u32 {
        self.0
    }

    /// Oldest heartbeat that still counts as present at `now`.
    pub fn cutoff(self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::seconds(i64::from(self.0))
    }
}

impl Default for PresenceTtl {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl fmt::Display for PresenceTtl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

impl From<PresenceTtl> for u32 {
    fn from(ttl: PresenceTtl) -> Self {
        ttl.0
    }
}

impl TryFrom<u32> for PresenceTtl {
    type Error = crate::DomainError;

    fn try_from(seconds: u32) -> Result<Self, Self::Error> {
        Self::new(seconds)
    }
}
