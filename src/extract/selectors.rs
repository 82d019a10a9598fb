//! CSS-selector driven extractor
//!
//! This module handles the default extraction capability:
//! - Listing identifiers read from an attribute of each listing element
//! - Optional posting dates read from a child element of each listing
//! - The detail page title
//! - Name/value pairs from definition-list style field groups

use crate::config::SelectorConfig;
use crate::extract::{Extractor, Listing, TITLE_FIELD};
use crate::ConfigError;
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};

/// Extractor built from compiled CSS selectors
#[derive(Debug, Clone)]
pub struct SelectorExtractor {
    listing: Selector,
    identifier_attr: String,
    title: Selector,
    field_group: Selector,
    field_name: Selector,
    field_value: Selector,
    posted_date: Option<Selector>,
    posted_date_attr: String,
}

impl SelectorExtractor {
    /// Compiles the configured selectors
    ///
    /// # Returns
    ///
    /// * `Ok(SelectorExtractor)` - All selectors compiled
    /// * `Err(ConfigError::InvalidSelector)` - A selector failed to parse
    ///
    /// # Example
    ///
    /// ```
    /// use listing_harvest::config::SelectorConfig;
    /// use listing_harvest::extract::{Extractor, SelectorExtractor};
    /// use scraper::Html;
    ///
    /// let extractor = SelectorExtractor::from_config(&SelectorConfig::default()).unwrap();
    /// let html = r#"<ul><li class="has-pointer-d" data-job-id="7"></li></ul>"#;
    /// let ids = extractor.find_identifiers(&Html::parse_document(html));
    /// assert_eq!(ids, vec!["7".to_string()]);
    /// ```
    pub fn from_config(config: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            listing: compile(&config.listing)?,
            identifier_attr: config.identifier_attr.clone(),
            title: compile(&config.title)?,
            field_group: compile(&config.field_group)?,
            field_name: compile(&config.field_name)?,
            field_value: compile(&config.field_value)?,
            posted_date: config.posted_date.as_deref().map(compile).transpose()?,
            posted_date_attr: config.posted_date_attr.clone(),
        })
    }

    /// Reads the identifier of one listing element, skipping blank values
    fn identifier_of(&self, element: &ElementRef<'_>) -> Option<String> {
        element
            .value()
            .attr(&self.identifier_attr)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }

    /// Reads the posting date of one listing element
    fn posted_of(&self, element: &ElementRef<'_>) -> Option<NaiveDate> {
        let selector = self.posted_date.as_ref()?;
        let raw = element
            .select(selector)
            .next()?
            .value()
            .attr(&self.posted_date_attr)?;
        parse_posted_date(raw)
    }
}

impl Extractor for SelectorExtractor {
    fn find_identifiers(&self, document: &Html) -> Vec<String> {
        document
            .select(&self.listing)
            .filter_map(|element| self.identifier_of(&element))
            .collect()
    }

    /// Extracts the title, then pairs names and values positionally within
    /// each field group. Unpaired trailing names or values are ignored.
    fn find_fields(&self, document: &Html) -> Vec<(String, String)> {
        let mut fields = Vec::new();

        if let Some(title) = document.select(&self.title).next() {
            fields.push((TITLE_FIELD.to_string(), element_text(&title)));
        }

        for group in document.select(&self.field_group) {
            let names = group.select(&self.field_name);
            let values = group.select(&self.field_value);

            for (name, value) in names.zip(values) {
                let name = element_text(&name);
                if name.is_empty() {
                    continue;
                }
                fields.push((name, element_text(&value)));
            }
        }

        fields
    }

    fn find_listings(&self, document: &Html) -> Vec<Listing> {
        document
            .select(&self.listing)
            .filter_map(|element| {
                self.identifier_of(&element).map(|identifier| Listing {
                    identifier,
                    posted: self.posted_of(&element),
                })
            })
            .collect()
    }
}

/// Compiles a selector, mapping failures to a config error
fn compile(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector)
        .map_err(|e| ConfigError::InvalidSelector(format!("'{}': {:?}", selector, e)))
}

/// Collects an element's text with whitespace runs collapsed
fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses `YYYY-MM-DD`, tolerating a trailing time component
fn parse_posted_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}
