//! Crawler module for listing discovery and detail retrieval
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching with retry on rate limiting
//! - Client identity rotation
//! - Sequential discovery over the paginated index
//! - Bounded-concurrency detail collection
//! - Overall pipeline coordination

mod collector;
mod coordinator;
mod discovery;
mod fetcher;
mod identity;

pub use collector::{collect, Collection};
pub use coordinator::{detail_url, run_harvest, Coordinator};
pub use discovery::{Discoverer, DiscoveryOutcome, DiscoverySettings, Page};
pub use fetcher::{build_http_client, parse_retry_after, FetchFailure, PageFetcher, RetryPolicy};
pub use identity::UserAgentPool;

use crate::config::Config;
use crate::output::HarvestReport;
use crate::HarvestError;
use tokio_util::sync::CancellationToken;

/// Runs a complete harvest operation
///
/// This is the main entry point for a run. It will:
/// 1. Build the HTTP client, extractor and identity pool
/// 2. Walk the index pages and collect listing identifiers
/// 3. Fetch and extract every listing's detail page concurrently
/// 4. Unify the records into one schema
/// 5. Write the table to the configured file
///
/// # Arguments
///
/// * `config` - The harvest configuration
/// * `cancel` - Cancels the run; partial results are still written
///
/// # Returns
///
/// * `Ok(HarvestReport)` - The run finished (possibly partially)
/// * `Err(HarvestError)` - Setup failed or the table could not be written
pub async fn harvest(
    config: Config,
    cancel: CancellationToken,
) -> Result<HarvestReport, HarvestError> {
    run_harvest(config, cancel).await
}
