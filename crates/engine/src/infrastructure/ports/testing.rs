//! Testability ports for injecting time and randomness.

use chrono::{DateTime, Utc};

#[cfg_attr(test, mockall::automock)]
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub trait RandomPort: Send + Sync {
    fn gen_range(&self, min: u64, max: u64) -> u64;
    /// Fresh document id: 20 alphanumeric characters.
    fn gen_document_id(&self) -> String;
}
