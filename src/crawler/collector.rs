//! Concurrent detail collection
//!
//! Fans out one fetch+extract task per identifier with a bounded number in
//! flight. Each task succeeds or fails on its own; a failure is recorded and
//! the batch carries on. `collect` returns only once every task has finished,
//! and results arrive in completion order, not input order.

use crate::crawler::fetcher::FetchFailure;
use crate::extract::{Extracted, Record};
use futures::stream::{self, StreamExt};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Everything gathered from one collection batch
#[derive(Debug, Default)]
pub struct Collection {
    /// Records in completion order, including identifier-only records from
    /// empty extractions
    pub records: Vec<Record>,

    /// Identifiers whose detail fetch failed permanently
    pub failures: Vec<(String, FetchFailure)>,

    /// Identifiers whose document had no recognizable detail structure
    pub empty_extractions: Vec<String>,

    /// Identifiers not completed because the run was cancelled
    pub unfinished: usize,

    pub cancelled: bool,
}

/// Runs `fetch_and_extract` for every identifier
///
/// # Arguments
///
/// * `identifiers` - Listings to collect
/// * `concurrency` - Maximum tasks in flight (at least 1)
/// * `cancel` - Stops dispatching new tasks; in-flight tasks observe it through
///   their own fetch and report `FetchFailure::Cancelled`
/// * `fetch_and_extract` - Fetches and extracts one identifier
///
/// # Example
///
/// ```
/// use listing_harvest::crawler::collect;
/// use listing_harvest::extract::{Extracted, Record};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() {
/// let ids = vec!["1".to_string(), "2".to_string()];
/// let collection = collect(ids, 4, &CancellationToken::new(), |id| async move {
///     Ok(Extracted::Empty(Record::new(id)))
/// })
/// .await;
/// assert_eq!(collection.records.len(), 2);
/// # }
/// ```
pub async fn collect<F, Fut>(
    identifiers: Vec<String>,
    concurrency: usize,
    cancel: &CancellationToken,
    fetch_and_extract: F,
) -> Collection
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<Extracted, FetchFailure>>,
{
    let total = identifiers.len();
    let fetch_and_extract = &fetch_and_extract;

    let outcomes = stream::iter(identifiers)
        .map(|id| {
            let task = (!cancel.is_cancelled()).then(|| fetch_and_extract(id.clone()));
            async move {
                let result = match task {
                    Some(task) => task.await,
                    None => Err(FetchFailure::Cancelled),
                };
                (id, result)
            }
        })
        .buffer_unordered(concurrency.max(1));
    let mut outcomes = std::pin::pin!(outcomes);

    let mut collection = Collection::default();
    let mut done = 0;

    while let Some((id, result)) = outcomes.next().await {
        done += 1;

        match result {
            Ok(Extracted::Complete(record)) => collection.records.push(record),
            Ok(Extracted::Empty(record)) => {
                collection.empty_extractions.push(id);
                collection.records.push(record);
            }
            Err(FetchFailure::Cancelled) => collection.unfinished += 1,
            Err(failure) => {
                tracing::warn!(identifier = %id, "Detail fetch failed: {}", failure);
                collection.failures.push((id, failure));
            }
        }

        if done % 25 == 0 || done == total {
            tracing::info!(
                "Progress: {}/{} details, {} records, {} failures",
                done,
                total,
                collection.records.len(),
                collection.failures.len()
            );
        }
    }

    collection.cancelled = cancel.is_cancelled();
    if collection.cancelled {
        tracing::warn!(
            "Collection cancelled with {} of {} identifiers unfinished",
            collection.unfinished,
            total
        );
    }

    collection
}
