//! End-to-end harvests against a mock listing site

use crate::common::{create_test_config, mount_detail, mount_index_page};
use listing_harvest::{harvest, FetchFailure, StopReason};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn read_rows(path: &std::path::Path) -> (String, Vec<String>) {
    let text = std::fs::read_to_string(path).expect("Failed to read output");
    let mut lines = text.lines().map(str::to_string);
    let header = lines.next().expect("Missing header");
    let mut rows: Vec<String> = lines.collect();
    rows.sort();
    (header, rows)
}

#[tokio::test]
async fn test_full_harvest_with_one_failed_detail() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("listings.csv");

    mount_index_page(&server, 1, &["1", "2", "3"]).await;
    mount_index_page(&server, 2, &[]).await;

    mount_detail(&server, "1", &[("A", "a1"), ("B", "b1")]).await;
    mount_detail(&server, "3", &[("A", "a3"), ("C", "c3")]).await;
    Mock::given(method("GET"))
        .and(path("/en/job/2/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), csv_path.to_str().unwrap());
    let report = harvest(config, CancellationToken::new()).await.unwrap();

    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.discovery_stop, StopReason::EmptyPage);
    assert_eq!(report.identifiers, 3);
    assert_eq!(report.records, 2);
    assert_eq!(
        report.failures,
        vec![("2".to_string(), FetchFailure::ServerError(500))]
    );
    assert_eq!(report.schema, vec!["identifier", "A", "B", "C"]);
    assert_eq!(report.output_path.as_deref(), Some(csv_path.as_path()));
    assert!(!report.cancelled);

    let (header, rows) = read_rows(&csv_path);
    assert_eq!(header, "identifier,A,B,C");
    assert_eq!(rows, vec!["1,a1,b1,", "3,a3,,c3"]);
}

#[tokio::test]
async fn test_detail_without_structure_keeps_identifier_row() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("listings.csv");

    mount_index_page(&server, 1, &["10", "11"]).await;
    mount_index_page(&server, 2, &[]).await;
    mount_detail(&server, "10", &[("Location", "Riyadh")]).await;
    Mock::given(method("GET"))
        .and(path("/en/job/11/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body><p>Removed</p></body></html>"),
        )
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), csv_path.to_str().unwrap());
    let report = harvest(config, CancellationToken::new()).await.unwrap();

    assert_eq!(report.records, 2);
    assert_eq!(report.empty_extractions, 1);
    assert!(report.failures.is_empty());

    let (header, rows) = read_rows(&csv_path);
    assert_eq!(header, "identifier,Location");
    assert_eq!(rows, vec!["10,Riyadh", "11,"]);
}

#[tokio::test]
async fn test_no_identifiers_writes_nothing() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("listings.csv");

    mount_index_page(&server, 1, &[]).await;

    let config = create_test_config(&server.uri(), csv_path.to_str().unwrap());
    let report = harvest(config, CancellationToken::new()).await.unwrap();

    assert_eq!(report.identifiers, 0);
    assert_eq!(report.records, 0);
    assert_eq!(report.output_path, None);
    assert!(!csv_path.exists());
}

#[tokio::test]
async fn test_byte_order_mark_written_when_enabled() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("listings.csv");

    mount_index_page(&server, 1, &["5"]).await;
    mount_index_page(&server, 2, &[]).await;
    mount_detail(&server, "5", &[("Job Location", "جدة")]).await;

    let mut config = create_test_config(&server.uri(), csv_path.to_str().unwrap());
    config.output.write_bom = true;
    harvest(config, CancellationToken::new()).await.unwrap();

    let bytes = std::fs::read(&csv_path).unwrap();
    assert!(bytes.starts_with(b"\xEF\xBB\xBF"));
    let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
    assert_eq!(text, "identifier,Job Location\n5,جدة\n");
}

#[tokio::test]
async fn test_cancelled_before_start_reports_cancellation() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("listings.csv");

    let cancel = CancellationToken::new();
    cancel.cancel();

    let config = create_test_config(&server.uri(), csv_path.to_str().unwrap());
    let report = harvest(config, cancel).await.unwrap();

    assert!(report.cancelled);
    assert_eq!(report.discovery_stop, StopReason::Cancelled);
    assert_eq!(report.records, 0);
    assert_eq!(report.output_path, None);
}

#[tokio::test]
async fn test_rate_limited_detail_recovers_within_budget() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("listings.csv");

    mount_index_page(&server, 1, &["1", "2"]).await;
    mount_index_page(&server, 2, &[]).await;
    mount_detail(&server, "1", &[("A", "a1")]).await;
    Mock::given(method("GET"))
        .and(path("/en/job/2/"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_detail(&server, "2", &[("A", "a2"), ("B", "b2")]).await;

    let config = create_test_config(&server.uri(), csv_path.to_str().unwrap());
    let report = harvest(config, CancellationToken::new()).await.unwrap();

    assert_eq!(report.records, 2);
    assert!(report.failures.is_empty());

    let (header, rows) = read_rows(&csv_path);
    assert_eq!(header, "identifier,A,B");
    assert_eq!(rows, vec!["1,a1,", "2,a2,b2"]);
}

#[tokio::test]
async fn test_rate_limited_detail_exhausts_budget() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("listings.csv");

    mount_index_page(&server, 1, &["1", "2", "3"]).await;
    mount_index_page(&server, 2, &[]).await;
    mount_detail(&server, "1", &[("A", "a1"), ("B", "b1")]).await;
    mount_detail(&server, "3", &[("A", "a3"), ("C", "c3")]).await;
    Mock::given(method("GET"))
        .and(path("/en/job/2/"))
        .respond_with(ResponseTemplate::new(429))
        .expect(4)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), csv_path.to_str().unwrap());
    let report = harvest(config, CancellationToken::new()).await.unwrap();

    assert_eq!(report.records, 2);
    assert_eq!(
        report.failures,
        vec![("2".to_string(), FetchFailure::RateLimited)]
    );
    assert_eq!(report.failure_counts().get("rate_limited"), Some(&1));

    let (header, rows) = read_rows(&csv_path);
    assert_eq!(header, "identifier,A,B,C");
    assert_eq!(rows, vec!["1,a1,b1,", "3,a3,,c3"]);
}

#[tokio::test]
async fn test_all_details_failing_writes_header_only() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("listings.csv");

    mount_index_page(&server, 1, &["1", "2"]).await;
    mount_index_page(&server, 2, &[]).await;
    Mock::given(method("GET"))
        .and(path("/en/job/1/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/en/job/2/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), csv_path.to_str().unwrap());
    let report = harvest(config, CancellationToken::new()).await.unwrap();

    assert_eq!(report.identifiers, 2);
    assert_eq!(report.records, 0);
    assert_eq!(report.failures.len(), 2);
    assert_eq!(report.output_path.as_deref(), Some(csv_path.as_path()));
    assert_eq!(std::fs::read_to_string(&csv_path).unwrap(), "identifier\n");
}
