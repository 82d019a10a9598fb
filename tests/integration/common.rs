//! Shared fixtures: configuration and HTML for a fake listing site

use listing_harvest::config::{
    CollectorConfig, Config, FetchConfig, IdentityConfig, OutputConfig, SelectorConfig,
    SourceConfig,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const INDEX_PATH: &str = "/en/jobs/";

/// Creates a test configuration pointed at the mock server
pub fn create_test_config(base_url: &str, csv_path: &str) -> Config {
    Config {
        source: SourceConfig {
            index_url: format!("{}{}", base_url, INDEX_PATH),
            detail_url_template: format!("{}/en/job/{{id}}/", base_url),
            sort_option: None,
            max_pages: None,
            max_age_days: None,
        },
        fetch: FetchConfig {
            timeout_secs: 5,
            max_retries: 3,
            default_retry_after_secs: 0,
            max_retry_after_secs: 1,
            backoff_factor: 2,
            page_delay_min_ms: 0,
            page_delay_max_ms: 0,
        },
        collector: CollectorConfig { concurrency: 4 },
        identity: IdentityConfig {
            user_agents: vec!["TestBot/1.0".to_string()],
        },
        selectors: SelectorConfig::default(),
        output: OutputConfig {
            csv_path: csv_path.to_string(),
            write_bom: false,
            delimiter: ',',
        },
    }
}

/// Renders an index page listing the given identifiers
pub fn index_page(ids: &[&str]) -> String {
    let items: String = ids
        .iter()
        .map(|id| format!(r#"<li class="has-pointer-d" data-job-id="{}"><h2>Job {}</h2></li>"#, id, id))
        .collect();
    format!(
        "<html><head><title>Jobs</title></head><body><ul>{}</ul></body></html>",
        items
    )
}

/// Renders a detail page with the given name/value pairs
pub fn detail_page(fields: &[(&str, &str)]) -> String {
    let pairs: String = fields
        .iter()
        .map(|(name, value)| format!("<dt>{}</dt><dd>{}</dd>", name, value))
        .collect();
    format!(
        r#"<html><body><dl class="dlist is-spaced is-fitted t-small">{}</dl></body></html>"#,
        pairs
    )
}

/// Mounts an index page response for a page number
pub async fn mount_index_page(server: &MockServer, page: u32, ids: &[&str]) {
    Mock::given(method("GET"))
        .and(path(INDEX_PATH))
        .and(query_param("page", page.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(index_page(ids))
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

/// Mounts an index page that must never be requested
pub async fn forbid_index_page(server: &MockServer, page: u32) {
    Mock::given(method("GET"))
        .and(path(INDEX_PATH))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(index_page(&["unexpected"])))
        .expect(0)
        .mount(server)
        .await;
}

/// Mounts a detail page response for an identifier
pub async fn mount_detail(server: &MockServer, id: &str, fields: &[(&str, &str)]) {
    Mock::given(method("GET"))
        .and(path(format!("/en/job/{}/", id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(detail_page(fields))
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}
