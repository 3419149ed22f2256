//! Bounded-concurrency batch executor (spec §4.6).
//!
//! The async-native analogue of a retryable task queue outside of an IC
//! canister: `tokio::task::JoinSet` bounds and tracks concurrent work,
//! `tokio::time::timeout`/`tokio::time::sleep` provide per-item timeout and
//! exponential backoff.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;

use crate::error::LifecycleError;

/// Executor configuration (spec §4.6).
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub max_concurrent: usize,
    pub continue_on_error: bool,
    pub retry_count: u32,
    /// Base delay between retries; each subsequent retry doubles it.
    pub retry_delay: Duration,
    pub timeout: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            continue_on_error: true,
            retry_count: 0,
            retry_delay: Duration::from_millis(200),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Per-item result of a batch run.
#[derive(Debug)]
pub enum ItemOutcome<T> {
    Success(T),
    Failed(LifecycleError),
    /// Never started, or aborted in-flight after an earlier failure under
    /// `continue_on_error = false`.
    Cancelled,
}

/// Aggregate result of [`run_batch`].
#[derive(Debug)]
pub struct BatchReport<T> {
    /// One entry per input item, in input order.
    pub results: Vec<ItemOutcome<T>>,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub duration: Duration,
}

/// Runs `op` over `items` with bounded concurrency, retry/backoff on
/// transient failures, and a per-item timeout. When `config.continue_on_error`
/// is `false`, the first failure cancels all still-in-flight items; total
/// processed always equals `items.len()` (spec §4.6).
pub async fn run_batch<I, T, F, Fut>(items: Vec<I>, config: BatchConfig, op: F) -> BatchReport<T>
where
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(&I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, LifecycleError>> + Send + 'static,
{
    let started = Instant::now();
    let total = items.len();
    let op = Arc::new(op);
    let semaphore = Arc::new(Semaphore::new(config.max_concurrent.max(1)));

    let mut join_set: JoinSet<(usize, Result<T, LifecycleError>)> = JoinSet::new();
    for (index, item) in items.into_iter().enumerate() {
        let op = Arc::clone(&op);
        let semaphore = Arc::clone(&semaphore);
        let retry_count = config.retry_count;
        let retry_delay = config.retry_delay;
        let item_timeout = config.timeout;

        join_set.spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("semaphore is never closed");
            let mut attempt = 0u32;
            loop {
                let outcome = match timeout(item_timeout, op(&item)).await {
                    Ok(result) => result,
                    Err(_) => Err(LifecycleError::Network(format!(
                        "item {index} timed out after {item_timeout:?}"
                    ))),
                };

                match outcome {
                    Ok(value) => return (index, Ok(value)),
                    Err(e) if attempt < retry_count && e.is_transient() => {
                        attempt += 1;
                        log::warn!("batch item {index} failed (attempt {attempt}/{retry_count}): {e}");
                        tokio::time::sleep(retry_delay * 2u32.saturating_pow(attempt - 1)).await;
                    }
                    Err(e) => return (index, Err(e)),
                }
            }
        });
    }

    let mut results: Vec<Option<ItemOutcome<T>>> = (0..total).map(|_| None).collect();
    let mut aborted = false;

    while let Some(joined) = join_set.join_next().await {
        let (index, outcome) = match joined {
            Ok(pair) => pair,
            Err(join_err) => {
                log::error!("batch task panicked or was cancelled: {join_err}");
                continue;
            }
        };

        let failed = outcome.is_err();
        results[index] = Some(match outcome {
            Ok(value) => ItemOutcome::Success(value),
            Err(e) => ItemOutcome::Failed(e),
        });

        if failed && !config.continue_on_error && !aborted {
            aborted = true;
            join_set.abort_all();
        }
    }

    let mut succeeded = 0;
    let mut failed_count = 0;
    let mut cancelled = 0;
    let results: Vec<ItemOutcome<T>> = results
        .into_iter()
        .map(|slot| {
            let outcome = slot.unwrap_or(ItemOutcome::Cancelled);
            match &outcome {
                ItemOutcome::Success(_) => succeeded += 1,
                ItemOutcome::Failed(_) => failed_count += 1,
                ItemOutcome::Cancelled => cancelled += 1,
            }
            outcome
        })
        .collect();

    BatchReport {
        results,
        succeeded,
        failed: failed_count,
        cancelled,
        duration: started.elapsed(),
    }
}
