//! Harvest coordinator - main pipeline orchestration
//!
//! This module runs one harvest end to end:
//! - Sequential, rate-limited discovery over the index pages
//! - Concurrent detail retrieval for every discovered identifier
//! - Schema unification of the collected records
//! - Writing the unified table to the configured file

use crate::config::Config;
use crate::crawler::collector::{collect, Collection};
use crate::crawler::discovery::{Discoverer, DiscoveryOutcome, DiscoverySettings};
use crate::crawler::fetcher::{build_http_client, PageFetcher, RetryPolicy};
use crate::crawler::identity::UserAgentPool;
use crate::extract::{Extractor, RecordExtractor, SelectorExtractor};
use crate::output::{unify, write_table, HarvestReport, WriteOptions};
use crate::{ConfigError, HarvestError};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Main harvest coordinator structure
pub struct Coordinator {
    config: Config,
    fetcher: PageFetcher,
    extractor: Arc<dyn Extractor>,
    records: RecordExtractor,
    identities: UserAgentPool,
}

impl Coordinator {
    /// Creates a coordinator using the selector-driven extractor
    ///
    /// # Arguments
    ///
    /// * `config` - A validated harvest configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(HarvestError)` - Selectors, identities or HTTP client could not be set up
    pub fn new(config: Config) -> Result<Self, HarvestError> {
        let extractor = SelectorExtractor::from_config(&config.selectors)?;
        Self::with_extractor(config, Arc::new(extractor))
    }

    /// Creates a coordinator around a site-specific extractor
    pub fn with_extractor(
        config: Config,
        extractor: Arc<dyn Extractor>,
    ) -> Result<Self, HarvestError> {
        let identities = UserAgentPool::new(config.identity.user_agents.clone()).ok_or_else(
            || ConfigError::Validation("user-agents cannot be empty".to_string()),
        )?;

        let client = build_http_client(&config.fetch)?;
        let fetcher = PageFetcher::new(client, RetryPolicy::from_config(&config.fetch));

        Ok(Self {
            records: RecordExtractor::new(extractor.clone()),
            extractor,
            fetcher,
            identities,
            config,
        })
    }

    /// Walks the index and returns the discovered identifiers
    pub async fn discover(
        &self,
        cancel: &CancellationToken,
    ) -> Result<DiscoveryOutcome, HarvestError> {
        let settings = DiscoverySettings::from_config(&self.config.source, &self.config.fetch)?;
        let discoverer = Discoverer::new(
            &self.fetcher,
            self.extractor.as_ref(),
            &self.identities,
            settings,
        );
        Ok(discoverer.discover(cancel).await)
    }

    /// Fetches and extracts the detail record of every identifier
    pub async fn collect(&self, identifiers: Vec<String>, cancel: &CancellationToken) -> Collection {
        let fetcher = &self.fetcher;
        let identities = &self.identities;
        let records = &self.records;
        let template = self.config.source.detail_url_template.as_str();

        collect(
            identifiers,
            self.config.collector.concurrency,
            cancel,
            |id| async move {
                let url = detail_url(template, &id);
                tracing::debug!("Fetching detail {}: {}", id, url);
                let body = fetcher.fetch(&url, identities, cancel).await?;
                Ok(records.extract(&id, &body))
            },
        )
        .await
    }

    /// Runs the full pipeline
    ///
    /// Discovery and collection failures never abort the run; only a failure
    /// to write the table is returned as an error. On cancellation the
    /// records gathered so far are still written. Nothing is written when
    /// discovery found no listings.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<HarvestReport, HarvestError> {
        let start_time = Instant::now();
        tracing::info!("Starting harvest of {}", self.config.source.index_url);

        let discovery = self.discover(cancel).await?;
        let identifiers = discovery.identifiers.len();

        let collection = if cancel.is_cancelled() {
            Collection {
                unfinished: identifiers,
                cancelled: true,
                ..Collection::default()
            }
        } else {
            tracing::info!(
                "Collecting {} details with concurrency {}",
                identifiers,
                self.config.collector.concurrency
            );
            self.collect(discovery.identifiers, cancel).await
        };

        let record_count = collection.records.len();
        let table = unify(collection.records);

        // A run that found listings always leaves a table behind, even if
        // only the header survived
        let output_path = if identifiers == 0 {
            tracing::warn!("No listings discovered, nothing written");
            None
        } else {
            if table.is_empty() {
                tracing::warn!("No records collected, writing header only");
            }
            let path = PathBuf::from(&self.config.output.csv_path);
            write_table(&table, &path, &WriteOptions::from_config(&self.config.output))
                .map_err(|e| {
                    tracing::error!("Failed to write {}: {}", path.display(), e);
                    e
                })?;
            tracing::info!(
                "Wrote {} rows x {} columns to {}",
                table.len(),
                table.schema().len(),
                path.display()
            );
            Some(path)
        };

        let report = HarvestReport {
            pages_fetched: discovery.pages_fetched,
            discovery_stop: discovery.stop,
            identifiers,
            records: record_count,
            failures: collection.failures,
            empty_extractions: collection.empty_extractions.len(),
            unfinished: collection.unfinished,
            schema: table.schema().to_vec(),
            output_path,
            cancelled: collection.cancelled || cancel.is_cancelled(),
            elapsed: start_time.elapsed(),
        };

        tracing::info!(
            "Harvest completed in {:?}: {} records, {} failures",
            report.elapsed,
            report.records,
            report.failures.len()
        );

        Ok(report)
    }
}

/// Substitutes a listing identifier into the detail URL template
///
/// The identifier is percent-encoded so opaque tokens cannot alter the path.
pub fn detail_url(template: &str, identifier: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(identifier.as_bytes()).collect();
    template.replace(crate::config::ID_PLACEHOLDER, &encoded)
}

/// Runs a complete harvest with the selector-driven extractor
///
/// # Example
///
/// ```no_run
/// use listing_harvest::config::load_config;
/// use listing_harvest::crawler::run_harvest;
/// use std::path::Path;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let report = run_harvest(config, CancellationToken::new()).await?;
/// println!("{} records", report.records);
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest(
    config: Config,
    cancel: CancellationToken,
) -> Result<HarvestReport, HarvestError> {
    let coordinator = Coordinator::new(config)?;
    coordinator.run(&cancel).await
}
