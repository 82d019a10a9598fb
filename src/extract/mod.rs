//! Extraction of identifiers and fields from HTML documents
//!
//! The pipeline never looks at markup directly. It talks to an `Extractor`,
//! which knows how one particular site lays out its index and detail pages.
//! `SelectorExtractor` is the default, driven by configured CSS selectors;
//! other sites plug in their own implementation without touching the
//! pipeline.

mod record;
mod selectors;

pub use record::{Record, IDENTIFIER_FIELD, TITLE_FIELD};
pub use selectors::SelectorExtractor;

use chrono::NaiveDate;
use scraper::Html;
use std::sync::Arc;

/// One listing found on an index page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub identifier: String,
    pub posted: Option<NaiveDate>,
}

/// Site-specific extraction capability
///
/// Both lookups are pure functions over a parsed document.
pub trait Extractor: Send + Sync {
    /// Returns listing identifiers on an index page, in document order
    fn find_identifiers(&self, document: &Html) -> Vec<String>;

    /// Returns `(name, value)` pairs describing a detail page, in document order
    fn find_fields(&self, document: &Html) -> Vec<(String, String)>;

    /// Returns listings with their posting dates, when the site exposes them
    fn find_listings(&self, document: &Html) -> Vec<Listing> {
        self.find_identifiers(document)
            .into_iter()
            .map(|identifier| Listing {
                identifier,
                posted: None,
            })
            .collect()
    }
}

/// Result of extracting one detail document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    /// At least one field besides the identifier was found
    Complete(Record),

    /// The document had no recognizable detail structure; the record holds
    /// only the identifier
    Empty(Record),
}

impl Extracted {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty(_))
    }

    pub fn record(&self) -> &Record {
        match self {
            Self::Complete(record) | Self::Empty(record) => record,
        }
    }

    pub fn into_record(self) -> Record {
        match self {
            Self::Complete(record) | Self::Empty(record) => record,
        }
    }
}

/// Turns detail documents into records
#[derive(Clone)]
pub struct RecordExtractor {
    extractor: Arc<dyn Extractor>,
}

impl RecordExtractor {
    pub fn new(extractor: Arc<dyn Extractor>) -> Self {
        Self { extractor }
    }

    /// Parses a detail page body and extracts its record
    pub fn extract(&self, identifier: &str, body: &str) -> Extracted {
        let document = Html::parse_document(body);
        self.extract_document(identifier, &document)
    }

    /// Extracts a record from an already parsed detail document
    ///
    /// The identifier always comes first. Duplicate field names keep the last
    /// value seen.
    pub fn extract_document(&self, identifier: &str, document: &Html) -> Extracted {
        let mut record = Record::new(identifier);

        for (name, value) in self.extractor.find_fields(document) {
            if !record.insert(name, value) {
                tracing::debug!(
                    identifier,
                    "Ignoring document field that shadows the identifier column"
                );
            }
        }

        if record.is_bare() {
            tracing::warn!(identifier, "No detail fields found in document");
            Extracted::Empty(record)
        } else {
            Extracted::Complete(record)
        }
    }
}
