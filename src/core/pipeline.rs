use crate::core::batcher::Batcher;
use crate::core::classifier::{Aggregator, RunReport};
use crate::core::output::DetailWriter;
use crate::core::retry::{BatchOutcome, RetryPolicy, RetryingDecoder};
use crate::domain::model::{Batch, DecodedResult, VinRecord};
use crate::domain::ports::{ConfigProvider, VinDecoder};
use crate::utils::error::Result;
use std::collections::HashSet;
use std::io::Write;
use std::time::Duration;

/// Sequential batch loop: batch, decode, classify, write details.
pub struct VinPipeline<D: VinDecoder> {
    decoder: RetryingDecoder<D>,
    chunk_size: usize,
    batch_pause: Duration,
}

impl<D: VinDecoder> VinPipeline<D> {
    pub fn new<C: ConfigProvider>(decoder: D, config: &C) -> Self {
        let policy = RetryPolicy {
            base_delay: config.base_delay(),
            max_retries: config.max_retries(),
            timeout_factor: config.timeout_factor(),
        };
        Self::with_policy(decoder, policy, config.chunk_size(), config.batch_pause())
    }

    pub fn with_policy(
        decoder: D,
        policy: RetryPolicy,
        chunk_size: usize,
        batch_pause: Duration,
    ) -> Self {
        Self {
            decoder: RetryingDecoder::new(decoder, policy),
            chunk_size,
            batch_pause,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Runs every batch to completion. Only input and output errors abort the run;
    /// a batch the service never answers is counted as dropped.
    pub async fn run<I, W>(&self, records: I, details: &mut DetailWriter<W>) -> Result<RunReport>
    where
        I: Iterator<Item = Result<VinRecord>>,
        W: Write,
    {
        let mut aggregator = Aggregator::new();

        for batch in Batcher::new(records, self.chunk_size) {
            let batch = batch?;

            // NHTSA 有速率限制，批次之間暫停
            if batch.index > 0 && !self.batch_pause.is_zero() {
                tokio::time::sleep(self.batch_pause).await;
            }

            aggregator.record_consumed(batch.len());
            aggregator.record_submitted();

            match self.decoder.decode_batch(&batch).await {
                BatchOutcome::Decoded(results) => {
                    let unmatched = check_results_match_batch(&batch, &results);
                    aggregator.record_unmatched(unmatched);
                    for result in &results {
                        if let Some(detail) = aggregator.absorb(result) {
                            details.write(&detail)?;
                        }
                    }
                    details.flush()?;
                }
                BatchOutcome::Dropped { attempts, reason } => {
                    tracing::warn!(
                        "🚫 Batch {} dropped after {} attempt(s), {} VINs not counted: {}",
                        batch.index,
                        attempts,
                        batch.len(),
                        reason
                    );
                    aggregator.record_dropped(&batch);
                }
            }

            tracing::info!(
                "Lines processed: [{}]",
                aggregator.totals().lines_processed
            );
        }

        let report = aggregator.into_report();
        tracing::info!(
            "Finished: {} lines, {} EVs, {} of {} batches dropped",
            report.totals.lines_processed,
            report.totals.evs_found,
            report.totals.batches_dropped,
            report.totals.batches_submitted
        );
        Ok(report)
    }
}

// Results are keyed by their own VIN field; the service may reorder or omit entries.
// Returns how many results name a VIN that was not submitted in `batch`.
fn check_results_match_batch(batch: &Batch, results: &[DecodedResult]) -> usize {
    let submitted: HashSet<String> = batch
        .records
        .iter()
        .map(|r| r.vin.to_ascii_uppercase())
        .collect();

    let mut unmatched = 0;
    for result in results {
        let vin = result.vin.as_deref().unwrap_or("").trim();
        if !submitted.contains(&vin.to_ascii_uppercase()) {
            tracing::warn!(
                "Batch {} returned a result for unsubmitted VIN '{}'",
                batch.index,
                vin
            );
            unmatched += 1;
        }
    }

    if results.len() < batch.len() {
        tracing::debug!(
            "Batch {} returned {} results for {} VINs",
            batch.index,
            results.len(),
            batch.len()
        );
    }

    unmatched
}
