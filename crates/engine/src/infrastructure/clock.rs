//! Clock and random implementations.

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::infrastructure::ports::{ClockPort, RandomPort};

const DOCUMENT_ID_LENGTH: usize = 20;

/// System clock - uses real time.
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockPort for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// System random - uses real randomness.
pub struct SystemRandom;

impl SystemRandom {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomPort for SystemRandom {
    fn gen_range(&self, min: u64, max: u64) -> u64 {
        if max <= min {
            return min;
        }
        rand::thread_rng().gen_range(min..=max)
    }

    fn gen_document_id(&self) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(DOCUMENT_ID_LENGTH)
            .map(char::from)
            .collect()
    }
}

/// Fixed clock for testing.
#[cfg(test)]
pub struct FixedClock(pub DateTime<Utc>);

#[cfg(test)]
impl ClockPort for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Deterministic random for testing: `gen_range` always returns the lower
/// bound and ids count up from `doc0001`.
#[cfg(test)]
#[derive(Default)]
pub struct SequentialRandom(std::sync::atomic::AtomicU64);

#[cfg(test)]
impl RandomPort for SequentialRandom {
    fn gen_range(&self, min: u64, _max: u64) -> u64 {
        min
    }

    fn gen_document_id(&self) -> String {
        let n = self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
        format!("doc{n:04}")
    }
}
