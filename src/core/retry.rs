use crate::domain::model::{Batch, DecodedResult};
use crate::domain::ports::VinDecoder;
use std::time::Duration;

pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_RETRIES: u32 = 4;
pub const DEFAULT_TIMEOUT_FACTOR: u32 = 5;
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Exponential backoff for one batch.
///
/// Attempt `n` (0-based) waits up to `timeout_factor * base_delay * 2^n`. After a
/// failed attempt `n` the decoder sleeps `base_delay * 2^n` before trying again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub max_retries: u32,
    pub timeout_factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_BASE_DELAY,
            max_retries: DEFAULT_MAX_RETRIES,
            timeout_factor: DEFAULT_TIMEOUT_FACTOR,
        }
    }
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << attempt.min(31))
    }

    pub fn timeout_for(&self, attempt: u32) -> Duration {
        self.delay_for(attempt).saturating_mul(self.timeout_factor)
    }

    /// Sleeps taken between attempts, in order.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_retries).map(move |attempt| self.delay_for(attempt))
    }
}

#[derive(Debug)]
pub enum BatchOutcome {
    Decoded(Vec<DecodedResult>),
    /// The batch was abandoned; none of its VINs reach the aggregator.
    Dropped { attempts: u32, reason: String },
}

/// Wraps a single-attempt decoder with the batch retry policy.
///
/// Network failures never escape as errors: the worst case is `BatchOutcome::Dropped`.
pub struct RetryingDecoder<D: VinDecoder> {
    decoder: D,
    policy: RetryPolicy,
}

impl<D: VinDecoder> RetryingDecoder<D> {
    pub fn new(decoder: D, policy: RetryPolicy) -> Self {
        Self { decoder, policy }
    }

    #[cfg(test)]
    pub(crate) fn inner(&self) -> &D {
        &self.decoder
    }

    pub async fn decode_batch(&self, batch: &Batch) -> BatchOutcome {
        let vins = batch.vins();
        let mut attempt = 0;

        loop {
            let timeout = self.policy.timeout_for(attempt);
            match self.decoder.decode(&vins, timeout).await {
                Ok(results) => {
                    if attempt > 0 {
                        tracing::info!(
                            "✅ Batch {} decoded after {} attempts",
                            batch.index,
                            attempt + 1
                        );
                    }
                    return BatchOutcome::Decoded(results);
                }
                Err(e) if e.is_retryable() && attempt < self.policy.max_retries => {
                    let delay = self.policy.delay_for(attempt);
                    tracing::warn!(
                        "⚠️ Batch {} attempt {}/{} failed: {}. Retrying in {:?}",
                        batch.index,
                        attempt + 1,
                        self.policy.max_attempts(),
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(
                        "❌ Dropping batch {} ({} VINs) after {} attempt(s): {}",
                        batch.index,
                        vins.len(),
                        attempt + 1,
                        e
                    );
                    return BatchOutcome::Dropped {
                        attempts: attempt + 1,
                        reason: e.to_string(),
                    };
                }
            }
        }
    }
}
