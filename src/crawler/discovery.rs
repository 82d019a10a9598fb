//! Identifier discovery over a paginated index
//!
//! Pages are fetched strictly in order, one at a time, with a randomized pause
//! between requests. After each page the discoverer decides whether to go on:
//!
//! | Condition | Transition |
//! |-----------|------------|
//! | Fetch failed with 404 | Stop (`NotFound`) |
//! | Fetch failed otherwise | Stop (`FetchFailed`), logged as degraded |
//! | No identifiers on the page | Stop (`EmptyPage`) |
//! | Same identifier set as previous page | Stop (`RepeatedPage`) |
//! | Page bound reached | Stop (`MaxPagesReached`) |
//! | Otherwise | Continue |
//!
//! Stopping always returns what was accumulated; it is never an error.

use crate::config::{FetchConfig, SourceConfig};
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::identity::UserAgentPool;
use crate::extract::Extractor;
use crate::state::{DiscoveryState, StopReason};
use crate::HarvestError;
use chrono::{Local, NaiveDate};
use rand::Rng;
use scraper::Html;
use std::collections::{BTreeSet, HashSet};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Parameters for one discovery walk
#[derive(Debug, Clone)]
pub struct DiscoverySettings {
    /// First index page; `page` (and `sort`) query terms are appended
    pub index_url: Url,

    pub sort_option: Option<String>,

    /// Absent means walk until a stop condition
    pub max_pages: Option<u32>,

    /// Inclusive range of the pause between page requests (milliseconds)
    pub page_delay_ms: (u64, u64),

    /// Keep only listings posted on or after this date
    pub posted_since: Option<NaiveDate>,
}

impl DiscoverySettings {
    /// Builds settings from configuration, resolving the recency window
    /// against today's local date
    pub fn from_config(source: &SourceConfig, fetch: &FetchConfig) -> Result<Self, HarvestError> {
        let posted_since = source
            .max_age_days
            .map(|days| Local::now().date_naive() - chrono::Duration::days(i64::from(days)));

        Ok(Self {
            index_url: Url::parse(&source.index_url)?,
            sort_option: source.sort_option.clone(),
            max_pages: source.max_pages,
            page_delay_ms: (fetch.page_delay_min_ms, fetch.page_delay_max_ms),
            posted_since,
        })
    }

    /// Builds the URL of a 1-based index page
    pub fn page_url(&self, page: u32) -> Url {
        let mut url = self.index_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("page", &page.to_string());
            if let Some(sort) = &self.sort_option {
                query.append_pair("sort", sort);
            }
        }
        url
    }

    fn page_delay(&self) -> Duration {
        let (min, max) = self.page_delay_ms;
        let ms = if max > min {
            rand::thread_rng().gen_range(min..=max)
        } else {
            min
        };
        Duration::from_millis(ms)
    }
}

/// One fetched index page
///
/// `identifiers` is the full sorted set on the page and drives the stop
/// decision; `kept` is the subset that passed the recency filter, in
/// document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub identifiers: BTreeSet<String>,
    pub kept: Vec<String>,
}

impl Page {
    /// Extracts the listings of a page body
    pub fn scan(
        number: u32,
        body: &str,
        extractor: &dyn Extractor,
        posted_since: Option<NaiveDate>,
    ) -> Self {
        let document = Html::parse_document(body);
        let listings = extractor.find_listings(&document);

        let identifiers = listings.iter().map(|l| l.identifier.clone()).collect();
        let mut seen = HashSet::new();
        let kept = listings
            .into_iter()
            .filter(|l| match posted_since {
                Some(since) => l.posted.is_some_and(|posted| posted >= since),
                None => true,
            })
            .filter(|l| seen.insert(l.identifier.clone()))
            .map(|l| l.identifier)
            .collect();

        Self {
            number,
            identifiers,
            kept,
        }
    }
}

/// Result of a discovery walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryOutcome {
    /// Unique identifiers in discovery order
    pub identifiers: Vec<String>,

    /// Index pages fetched successfully
    pub pages_fetched: u32,

    pub stop: StopReason,
}

/// Walks the index and accumulates listing identifiers
pub struct Discoverer<'a> {
    fetcher: &'a PageFetcher,
    extractor: &'a dyn Extractor,
    identities: &'a UserAgentPool,
    settings: DiscoverySettings,
}

impl<'a> Discoverer<'a> {
    pub fn new(
        fetcher: &'a PageFetcher,
        extractor: &'a dyn Extractor,
        identities: &'a UserAgentPool,
        settings: DiscoverySettings,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            identities,
            settings,
        }
    }

    /// Runs discovery until a stop condition
    pub async fn discover(&self, cancel: &CancellationToken) -> DiscoveryOutcome {
        let mut identifiers = Vec::new();
        let mut seen = HashSet::new();
        let mut prev_page_keys: BTreeSet<String> = BTreeSet::new();
        let mut pages_fetched = 0;
        let mut page_number: u32 = 1;

        let stop = loop {
            let url = self.settings.page_url(page_number);
            tracing::debug!("Fetching index page {}: {}", page_number, url);

            let body = match self
                .fetcher
                .fetch(url.as_str(), self.identities, cancel)
                .await
            {
                Ok(body) => body,
                Err(failure) => break DiscoveryState::from(failure),
            };
            pages_fetched += 1;

            let page = Page::scan(page_number, &body, self.extractor, self.settings.posted_since);
            let state = self.advance(&page, &prev_page_keys);

            if state.is_terminal() {
                break state;
            }

            let before = identifiers.len();
            for id in page.kept {
                if seen.insert(id.clone()) {
                    identifiers.push(id);
                }
            }
            tracing::info!(
                "Index page {}: {} listings, {} new, {} total",
                page.number,
                page.identifiers.len(),
                identifiers.len() - before,
                identifiers.len()
            );
            prev_page_keys = page.identifiers;

            if self
                .settings
                .max_pages
                .is_some_and(|max| page_number >= max)
            {
                break DiscoveryState::Stop(StopReason::MaxPagesReached);
            }

            let delay = self.settings.page_delay();
            tokio::select! {
                _ = cancel.cancelled() => break DiscoveryState::Stop(StopReason::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
            page_number += 1;
        };

        let stop = stop.stop_reason().unwrap_or(StopReason::Cancelled);
        if stop.is_degraded() {
            tracing::warn!(
                "Discovery stopped early at page {}: {}; keeping {} identifiers",
                page_number,
                stop,
                identifiers.len()
            );
        } else {
            tracing::info!(
                "Discovery finished at page {} ({}): {} identifiers",
                page_number,
                stop,
                identifiers.len()
            );
        }

        DiscoveryOutcome {
            identifiers,
            pages_fetched,
            stop,
        }
    }

    /// Decides the transition after a successfully fetched page
    fn advance(&self, page: &Page, prev_page_keys: &BTreeSet<String>) -> DiscoveryState {
        if page.identifiers.is_empty() {
            tracing::info!("Index page {} has no listings", page.number);
            return DiscoveryState::Stop(StopReason::EmptyPage);
        }

        if page.identifiers == *prev_page_keys {
            tracing::info!(
                "Index page {} repeats the previous page, stopping",
                page.number
            );
            return DiscoveryState::Stop(StopReason::RepeatedPage);
        }

        DiscoveryState::Continue
    }
}
