//! Index discovery against a mock listing site

use crate::common::{
    create_test_config, forbid_index_page, index_page, mount_index_page, INDEX_PATH,
};
use listing_harvest::crawler::{Coordinator, FetchFailure};
use listing_harvest::state::StopReason;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn coordinator(server: &MockServer) -> Coordinator {
    let config = create_test_config(&server.uri(), "unused.csv");
    Coordinator::new(config).expect("Failed to create coordinator")
}

#[tokio::test]
async fn test_repeated_page_stops_without_third_request() {
    let server = MockServer::start().await;
    mount_index_page(&server, 1, &["1", "2"]).await;
    mount_index_page(&server, 2, &["2", "3"]).await;
    mount_index_page(&server, 3, &["3", "2"]).await;
    forbid_index_page(&server, 4).await;

    let outcome = coordinator(&server)
        .discover(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.stop, StopReason::RepeatedPage);
    assert_eq!(outcome.pages_fetched, 3);
    assert_eq!(outcome.identifiers, vec!["1", "2", "3"]);
}

#[tokio::test]
async fn test_identical_consecutive_pages_stop_immediately() {
    let server = MockServer::start().await;
    mount_index_page(&server, 1, &["a", "b"]).await;
    mount_index_page(&server, 2, &["a", "b"]).await;
    forbid_index_page(&server, 3).await;

    let outcome = coordinator(&server)
        .discover(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.stop, StopReason::RepeatedPage);
    assert_eq!(outcome.identifiers, vec!["a", "b"]);
}

#[tokio::test]
async fn test_empty_page_stops_cleanly() {
    let server = MockServer::start().await;
    mount_index_page(&server, 1, &["10", "11"]).await;
    mount_index_page(&server, 2, &[]).await;
    forbid_index_page(&server, 3).await;

    let outcome = coordinator(&server)
        .discover(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.stop, StopReason::EmptyPage);
    assert!(outcome.stop.is_clean());
    assert_eq!(outcome.identifiers, vec!["10", "11"]);
}

#[tokio::test]
async fn test_empty_first_page_returns_nothing() {
    let server = MockServer::start().await;
    mount_index_page(&server, 1, &[]).await;

    let outcome = coordinator(&server)
        .discover(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.stop, StopReason::EmptyPage);
    assert!(outcome.identifiers.is_empty());
}

#[tokio::test]
async fn test_not_found_ends_pagination() {
    let server = MockServer::start().await;
    mount_index_page(&server, 1, &["x"]).await;
    // Page 2 is not mounted, so the mock server answers 404

    let outcome = coordinator(&server)
        .discover(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.stop, StopReason::NotFound);
    assert_eq!(outcome.identifiers, vec!["x"]);
}

#[tokio::test]
async fn test_server_error_keeps_accumulated_identifiers() {
    let server = MockServer::start().await;
    mount_index_page(&server, 1, &["1", "2"]).await;
    Mock::given(method("GET"))
        .and(path(INDEX_PATH))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = coordinator(&server)
        .discover(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        outcome.stop,
        StopReason::FetchFailed(FetchFailure::ServerError(503))
    );
    assert!(outcome.stop.is_degraded());
    assert_eq!(outcome.identifiers, vec!["1", "2"]);
}

#[tokio::test]
async fn test_max_pages_bound() {
    let server = MockServer::start().await;
    mount_index_page(&server, 1, &["1"]).await;
    mount_index_page(&server, 2, &["2"]).await;
    forbid_index_page(&server, 3).await;

    let mut config = create_test_config(&server.uri(), "unused.csv");
    config.source.max_pages = Some(2);
    let outcome = Coordinator::new(config)
        .unwrap()
        .discover(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.stop, StopReason::MaxPagesReached);
    assert_eq!(outcome.pages_fetched, 2);
    assert_eq!(outcome.identifiers, vec!["1", "2"]);
}

#[tokio::test]
async fn test_sort_option_sent_with_every_page() {
    let server = MockServer::start().await;
    for page in 1..=2 {
        let ids: &[&str] = if page == 1 { &["p1"] } else { &[] };
        Mock::given(method("GET"))
            .and(path(INDEX_PATH))
            .and(query_param("page", page.to_string()))
            .and(query_param("sort", "date"))
            .respond_with(ResponseTemplate::new(200).set_body_string(index_page(ids)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let mut config = create_test_config(&server.uri(), "unused.csv");
    config.source.sort_option = Some("date".to_string());
    let outcome = Coordinator::new(config)
        .unwrap()
        .discover(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.identifiers, vec!["p1"]);
    assert_eq!(outcome.stop, StopReason::EmptyPage);
}

#[tokio::test]
async fn test_rate_limited_page_recovers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(INDEX_PATH))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_index_page(&server, 1, &["r1"]).await;
    mount_index_page(&server, 2, &[]).await;

    let outcome = coordinator(&server)
        .discover(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.identifiers, vec!["r1"]);
    assert_eq!(outcome.stop, StopReason::EmptyPage);
}

#[tokio::test]
async fn test_persistent_rate_limit_stops_degraded() {
    let server = MockServer::start().await;
    mount_index_page(&server, 1, &["1", "2"]).await;
    Mock::given(method("GET"))
        .and(path(INDEX_PATH))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(429))
        .expect(4)
        .mount(&server)
        .await;
    forbid_index_page(&server, 3).await;

    let outcome = coordinator(&server)
        .discover(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        outcome.stop,
        StopReason::FetchFailed(FetchFailure::RateLimited)
    );
    assert!(outcome.stop.is_degraded());
    assert_eq!(outcome.pages_fetched, 1);
    assert_eq!(outcome.identifiers, vec!["1", "2"]);
}

#[tokio::test]
async fn test_cancelled_discovery_returns_empty() {
    let server = MockServer::start().await;
    mount_index_page(&server, 1, &["1"]).await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let outcome = coordinator(&server).discover(&cancel).await.unwrap();

    assert_eq!(outcome.stop, StopReason::Cancelled);
    assert!(outcome.identifiers.is_empty());
}
