use serde::Deserialize;

/// Main configuration structure for Listing-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub collector: CollectorConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    pub output: OutputConfig,
}

/// Where listings come from and how far to walk the index
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// URL of the first index page (the `page` query term is appended)
    #[serde(rename = "index-url")]
    pub index_url: String,

    /// Detail page URL with an `{id}` placeholder for the listing identifier
    #[serde(rename = "detail-url-template")]
    pub detail_url_template: String,

    /// Optional sort/filter value sent as the `sort` query term
    #[serde(rename = "sort-option", default)]
    pub sort_option: Option<String>,

    /// Maximum number of index pages to walk (absent means unbounded)
    #[serde(rename = "max-pages", default)]
    pub max_pages: Option<u32>,

    /// Only keep listings posted within this many days (requires a posted-date selector)
    #[serde(rename = "max-age-days", default)]
    pub max_age_days: Option<u32>,
}

/// Request timeout, retry budget and pacing
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Upper bound on a single request (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Number of retries after an HTTP 429 before giving up
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Wait used when a 429 response carries no Retry-After hint (seconds)
    #[serde(
        rename = "default-retry-after-secs",
        default = "default_retry_after_secs"
    )]
    pub default_retry_after_secs: u64,

    /// Cap applied to any Retry-After hint (seconds)
    #[serde(rename = "max-retry-after-secs", default = "default_max_retry_after_secs")]
    pub max_retry_after_secs: u64,

    /// Multiplier applied to the wait after every further 429
    #[serde(rename = "backoff-factor", default = "default_backoff_factor")]
    pub backoff_factor: u32,

    /// Lower bound of the randomized delay between index pages (milliseconds)
    #[serde(rename = "page-delay-min-ms", default = "default_page_delay_min_ms")]
    pub page_delay_min_ms: u64,

    /// Upper bound of the randomized delay between index pages (milliseconds)
    #[serde(rename = "page-delay-max-ms", default = "default_page_delay_max_ms")]
    pub page_delay_max_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            default_retry_after_secs: default_retry_after_secs(),
            max_retry_after_secs: default_max_retry_after_secs(),
            backoff_factor: default_backoff_factor(),
            page_delay_min_ms: default_page_delay_min_ms(),
            page_delay_max_ms: default_page_delay_max_ms(),
        }
    }
}

/// Detail retrieval fan-out
#[derive(Debug, Clone, Deserialize)]
pub struct CollectorConfig {
    /// Maximum number of detail fetches in flight at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

/// Client identities rotated across requests
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    #[serde(rename = "user-agents", default = "default_user_agents")]
    pub user_agents: Vec<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            user_agents: default_user_agents(),
        }
    }
}

/// CSS selectors used by the default extraction capability
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorConfig {
    /// One element per listing on an index page
    #[serde(default = "default_listing_selector")]
    pub listing: String,

    /// Attribute on the listing element that holds its identifier
    #[serde(rename = "identifier-attr", default = "default_identifier_attr")]
    pub identifier_attr: String,

    /// Title element on a detail page
    #[serde(default = "default_title_selector")]
    pub title: String,

    /// Container of name/value pairs on a detail page
    #[serde(rename = "field-group", default = "default_field_group_selector")]
    pub field_group: String,

    /// Field name elements inside a group
    #[serde(rename = "field-name", default = "default_field_name_selector")]
    pub field_name: String,

    /// Field value elements inside a group, paired positionally with names
    #[serde(rename = "field-value", default = "default_field_value_selector")]
    pub field_value: String,

    /// Element inside a listing carrying its posting date
    #[serde(rename = "posted-date", default)]
    pub posted_date: Option<String>,

    /// Attribute of the posted-date element holding an ISO date
    #[serde(rename = "posted-date-attr", default = "default_posted_date_attr")]
    pub posted_date_attr: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            listing: default_listing_selector(),
            identifier_attr: default_identifier_attr(),
            title: default_title_selector(),
            field_group: default_field_group_selector(),
            field_name: default_field_name_selector(),
            field_value: default_field_value_selector(),
            posted_date: None,
            posted_date_attr: default_posted_date_attr(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the delimited output file
    #[serde(rename = "csv-path")]
    pub csv_path: String,

    /// Prefix the file with a UTF-8 byte-order mark
    #[serde(rename = "write-bom", default = "default_write_bom")]
    pub write_bom: bool,

    /// Field separator
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_after_secs() -> u64 {
    5
}

fn default_max_retry_after_secs() -> u64 {
    60
}

fn default_backoff_factor() -> u32 {
    2
}

fn default_page_delay_min_ms() -> u64 {
    1000
}

fn default_page_delay_max_ms() -> u64 {
    2000
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn default_user_agents() -> Vec<String> {
    [
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
        "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_listing_selector() -> String {
    "li.has-pointer-d".to_string()
}

fn default_identifier_attr() -> String {
    "data-job-id".to_string()
}

fn default_title_selector() -> String {
    "h1.h3".to_string()
}

fn default_field_group_selector() -> String {
    "dl.dlist.is-spaced.is-fitted.t-small".to_string()
}

fn default_field_name_selector() -> String {
    "dt".to_string()
}

fn default_field_value_selector() -> String {
    "dd".to_string()
}

fn default_posted_date_attr() -> String {
    "datetime".to_string()
}

fn default_write_bom() -> bool {
    true
}

fn default_delimiter() -> char {
    ','
}
