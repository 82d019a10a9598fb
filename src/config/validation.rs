use crate::config::types::{
    CollectorConfig, Config, FetchConfig, IdentityConfig, OutputConfig, SelectorConfig,
    SourceConfig,
};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Placeholder substituted with the listing identifier in detail URLs
pub const ID_PLACEHOLDER: &str = "{id}";

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_fetch_config(&config.fetch)?;
    validate_collector_config(&config.collector)?;
    validate_identity_config(&config.identity)?;
    validate_selector_config(&config.selectors, &config.source)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the listing source
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    validate_http_url("index-url", &config.index_url)?;

    if !config.detail_url_template.contains(ID_PLACEHOLDER) {
        return Err(ConfigError::Validation(format!(
            "detail-url-template must contain '{}', got '{}'",
            ID_PLACEHOLDER, config.detail_url_template
        )));
    }
    validate_http_url(
        "detail-url-template",
        &config.detail_url_template.replace(ID_PLACEHOLDER, "0"),
    )?;

    if config.max_pages == Some(0) {
        return Err(ConfigError::Validation(
            "max-pages must be >= 1 when set".to_string(),
        ));
    }

    if let Some(sort) = &config.sort_option {
        if sort.trim().is_empty() {
            return Err(ConfigError::Validation(
                "sort-option cannot be blank".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates timeout, retry and pacing settings
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 || config.timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be between 1 and 300, got {}",
            config.timeout_secs
        )));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    if config.backoff_factor < 1 {
        return Err(ConfigError::Validation(format!(
            "backoff-factor must be >= 1, got {}",
            config.backoff_factor
        )));
    }

    if config.default_retry_after_secs > config.max_retry_after_secs {
        return Err(ConfigError::Validation(format!(
            "default-retry-after-secs ({}) exceeds max-retry-after-secs ({})",
            config.default_retry_after_secs, config.max_retry_after_secs
        )));
    }

    if config.page_delay_min_ms > config.page_delay_max_ms {
        return Err(ConfigError::Validation(format!(
            "page-delay-min-ms ({}) exceeds page-delay-max-ms ({})",
            config.page_delay_min_ms, config.page_delay_max_ms
        )));
    }

    Ok(())
}

/// Validates collector fan-out
fn validate_collector_config(config: &CollectorConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 256 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 256, got {}",
            config.concurrency
        )));
    }

    Ok(())
}

/// Validates the user-agent pool
fn validate_identity_config(config: &IdentityConfig) -> Result<(), ConfigError> {
    if config.user_agents.is_empty() {
        return Err(ConfigError::Validation(
            "user-agents cannot be empty".to_string(),
        ));
    }

    if let Some(agent) = config
        .user_agents
        .iter()
        .find(|a| a.trim().is_empty() || a.chars().any(|c| c.is_control()))
    {
        return Err(ConfigError::Validation(format!(
            "user-agent entry is blank or contains control characters: {:?}",
            agent
        )));
    }

    Ok(())
}

/// Validates that every selector compiles
fn validate_selector_config(
    config: &SelectorConfig,
    source: &SourceConfig,
) -> Result<(), ConfigError> {
    for selector in [
        &config.listing,
        &config.title,
        &config.field_group,
        &config.field_name,
        &config.field_value,
    ] {
        validate_selector(selector)?;
    }

    if let Some(posted) = &config.posted_date {
        validate_selector(posted)?;
    }

    if config.identifier_attr.trim().is_empty() {
        return Err(ConfigError::Validation(
            "identifier-attr cannot be empty".to_string(),
        ));
    }

    if source.max_age_days.is_some() && config.posted_date.is_none() {
        return Err(ConfigError::Validation(
            "max-age-days requires a posted-date selector".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.csv_path.is_empty() {
        return Err(ConfigError::Validation(
            "csv-path cannot be empty".to_string(),
        ));
    }

    if !config.delimiter.is_ascii() || matches!(config.delimiter, '"' | '\n' | '\r') {
        return Err(ConfigError::Validation(format!(
            "delimiter must be a single ASCII character other than a quote or newline, got {:?}",
            config.delimiter
        )));
    }

    Ok(())
}

/// Parses a URL and requires an HTTP(S) scheme
fn validate_http_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            name, value
        )));
    }

    Ok(())
}

/// Checks that a CSS selector parses
fn validate_selector(selector: &str) -> Result<(), ConfigError> {
    Selector::parse(selector)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidSelector(format!("'{}': {:?}", selector, e)))
}
