//! Background writes with exponential backoff retry
//!
//! Presence heartbeats and view counts are fire-and-forget from the caller's
//! point of view. Transient store failures are retried; when retries run out
//! the write is reported as [`WriteOutcome::Degraded`] and counted in
//! [`WriteHealth`] instead of being raised.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::infrastructure::ports::{DocumentStore, RandomPort, StoreError, WriteBatch};

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 = no retries, just the initial attempt)
    pub max_retries: u32,
    /// Base delay in milliseconds before first retry
    pub base_delay_ms: u64,
    /// Maximum delay in milliseconds (caps exponential growth)
    pub max_delay_ms: u64,
    /// Jitter factor (0.0-1.0) for randomizing delays
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 200,
            max_delay_ms: 5_000,
            jitter_factor: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    Applied { attempts: u32 },
    /// The target is gone or a guard no longer holds. Nothing to retry and
    /// the store is healthy, so health is left alone.
    Skipped { error: StoreError },
    /// Retries were exhausted or the error was not retryable. The write is
    /// lost; the caller carries on.
    Degraded { attempts: u32, error: StoreError },
}

impl WriteOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, WriteOutcome::Applied { .. })
    }
}

/// Process-wide count of degraded background writes.
#[derive(Debug, Default)]
pub struct WriteHealth {
    degraded: AtomicU64,
}

impl WriteHealth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_degraded(&self) {
        self.degraded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn degraded_writes(&self) -> u64 {
        self.degraded.load(Ordering::Relaxed)
    }
}

/// Retrying writer for background writes.
pub struct ResilientWriter {
    store: Arc<dyn DocumentStore>,
    random: Arc<dyn RandomPort>,
    config: RetryConfig,
    health: Arc<WriteHealth>,
}

impl ResilientWriter {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        random: Arc<dyn RandomPort>,
        config: RetryConfig,
        health: Arc<WriteHealth>,
    ) -> Self {
        Self {
            store,
            random,
            config,
            health,
        }
    }

    pub fn health(&self) -> &Arc<WriteHealth> {
        &self.health
    }

    /// Calculate delay for a given attempt number using exponential backoff with jitter
    fn calculate_delay(&self, attempt: u32) -> u64 {
        let base = self.config.base_delay_ms;
        // Exponential: base * 2^(attempt-1)
        let exponential = base.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
        let capped = exponential.min(self.config.max_delay_ms);

        let jitter_range = (capped as f64 * self.config.jitter_factor.clamp(0.0, 1.0)) as u64;
        if jitter_range > 0 {
            let low = capped.saturating_sub(jitter_range);
            let high = capped.saturating_add(jitter_range);
            self.random.gen_range(low, high)
        } else {
            capped
        }
    }

    /// Commit `batch`, retrying transient failures.
    pub async fn commit(&self, operation: &'static str, batch: WriteBatch) -> WriteOutcome {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.store.commit(batch.clone()).await {
                Ok(()) => {
                    if attempt > 1 {
                        tracing::info!(attempt, operation, "Background write succeeded after retry");
                    }
                    return WriteOutcome::Applied { attempts: attempt };
                }
                Err(error) if error.is_not_found() || error.is_precondition_failed() => {
                    tracing::debug!(error = %error, operation, "Background write skipped");
                    return WriteOutcome::Skipped { error };
                }
                Err(error) => {
                    let retryable = error.is_transient();
                    if retryable && attempt <= self.config.max_retries {
                        let delay = self.calculate_delay(attempt);
                        tracing::warn!(
                            attempt,
                            max_retries = self.config.max_retries,
                            delay_ms = delay,
                            error = %error,
                            operation,
                            "Background write failed, retrying..."
                        );
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                        continue;
                    }

                    if retryable {
                        tracing::error!(
                            attempts = attempt,
                            error = %error,
                            operation,
                            "Background write failed after all retry attempts"
                        );
                    } else {
                        tracing::error!(
                            error = %error,
                            operation,
                            "Background write failed with non-retryable error"
                        );
                    }
                    self.health.record_degraded();
                    return WriteOutcome::Degraded {
                        attempts: attempt,
                        error,
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::SequentialRandom;
    use crate::infrastructure::ports::MockDocumentStore;

    fn fast() -> RetryConfig {
        RetryConfig {
            max_retries: 2,
            base_delay_ms: 1,
            max_delay_ms: 10,
            jitter_factor: 0.0,
        }
    }

    fn writer(store: MockDocumentStore, config: RetryConfig) -> ResilientWriter {
        ResilientWriter::new(
            Arc::new(store),
            Arc::new(SequentialRandom::default()),
            config,
            Arc::new(WriteHealth::new()),
        )
    }

    #[tokio::test]
    async fn succeeds_without_retry() {
        let mut store = MockDocumentStore::new();
        store.expect_commit().times(1).returning(|_| Ok(()));
        let writer = writer(store, fast());

        let outcome = writer.commit("test", WriteBatch::new()).await;
        assert_eq!(outcome, WriteOutcome::Applied { attempts: 1 });
        assert_eq!(writer.health().degraded_writes(), 0);
    }

    #[tokio::test]
    async fn succeeds_after_retry() {
        let mut store = MockDocumentStore::new();
        let mut seq = mockall::Sequence::new();
        store
            .expect_commit()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_| Err(StoreError::unavailable("commit", "timeout")));
        store
            .expect_commit()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        let writer = writer(store, fast());

        let outcome = writer.commit("test", WriteBatch::new()).await;
        assert_eq!(outcome, WriteOutcome::Applied { attempts: 3 });
    }

    #[tokio::test]
    async fn degrades_after_max_retries() {
        let mut store = MockDocumentStore::new();
        store
            .expect_commit()
            .times(3)
            .returning(|_| Err(StoreError::unavailable("commit", "offline")));
        let writer = writer(store, fast());

        let outcome = writer.commit("test", WriteBatch::new()).await;
        assert!(matches!(outcome, WriteOutcome::Degraded { attempts: 3, .. }));
        assert_eq!(writer.health().degraded_writes(), 1);
    }

    #[tokio::test]
    async fn missing_target_is_skipped_without_degrading() {
        let mut store = MockDocumentStore::new();
        store
            .expect_commit()
            .times(1)
            .returning(|_| Err(StoreError::not_found("threads/gone")));
        let writer = writer(store, fast());

        let outcome = writer.commit("test", WriteBatch::new()).await;
        assert!(matches!(outcome, WriteOutcome::Skipped { .. }));
        assert_eq!(writer.health().degraded_writes(), 0);
    }

    #[tokio::test]
    async fn does_not_retry_serialization_errors() {
        let mut store = MockDocumentStore::new();
        store
            .expect_commit()
            .times(1)
            .returning(|_| Err(StoreError::serialization("bad field")));
        let writer = writer(store, fast());

        let outcome = writer.commit("test", WriteBatch::new()).await;
        assert!(matches!(outcome, WriteOutcome::Degraded { attempts: 1, .. }));
        assert_eq!(writer.health().degraded_writes(), 1);
    }

    #[test]
    fn delay_grows_exponentially_and_caps() {
        let config = RetryConfig {
            max_retries: 5,
            base_delay_ms: 100,
            max_delay_ms: 1_000,
            jitter_factor: 0.0,
        };
        let writer = writer(MockDocumentStore::new(), config);

        assert_eq!(writer.calculate_delay(1), 100);
        assert_eq!(writer.calculate_delay(2), 200);
        assert_eq!(writer.calculate_delay(3), 400);
        assert_eq!(writer.calculate_delay(5), 1_000);
    }

    #[test]
    fn jitter_stays_within_range() {
        let config = RetryConfig {
            jitter_factor: 0.5,
            ..fast()
        };
        let writer = writer(MockDocumentStore::new(), RetryConfig {
            base_delay_ms: 100,
            max_delay_ms: 100,
            ..config
        });
        // SequentialRandom always picks the low end.
        assert_eq!(writer.calculate_delay(1), 50);
    }
}
