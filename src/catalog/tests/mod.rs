use super::*;
use crate::config::CatalogConfig;
use crate::error::{Error, PipelineError};
use std::time::Duration;
use tempfile::tempdir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn catalog_for(server: &MockServer) -> SrrDbCatalog {
    SrrDbCatalog::new(CatalogConfig {
        base_url: server.uri(),
        adult_base_url: "http://127.0.0.1:9".to_string(),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

#[tokio::test]
async fn test_search_by_name_single_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/search/Movie.2024.1080p.BluRay.x264-GRP"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "resultsCount": "1",
            "results": [{ "release": "Movie.2024.1080p.BluRay.x264-GRP", "date": "2024-01-01" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let found = catalog_for(&server)
        .search(
            "Movie.2024.1080p.BluRay.x264-GRP",
            &SearchQuery::Name("Movie.2024.1080p.BluRay.x264-GRP".into()),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(found.release, "Movie.2024.1080p.BluRay.x264-GRP");
    assert_eq!(
        found.download_url,
        format!("{}/download/srr/Movie.2024.1080p.BluRay.x264-GRP", server.uri())
    );
}

#[tokio::test]
async fn test_search_by_crc_uses_archive_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/search/archive-crc:DEADBEEF"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "resultsCount": 1,
            "results": [{ "release": "Real.Name-GRP" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let found = catalog_for(&server)
        .search("abc123", &SearchQuery::ArchiveCrc(0xDEADBEEF))
        .await
        .unwrap();
    assert_eq!(found.unwrap().release, "Real.Name-GRP");
}

#[tokio::test]
async fn test_search_no_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "resultsCount": 0,
            "results": []
        })))
        .mount(&server)
        .await;

    let found = catalog_for(&server)
        .search("x", &SearchQuery::Name("x".into()))
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_search_ambiguous_regardless_of_results() {
    let server = MockServer::start().await;
    // The result list is deliberately empty: the count alone decides
    Mock::given(method("GET"))
        .and(path("/api/search/Movie-GRP"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "resultsCount": 2,
            "results": []
        })))
        .mount(&server)
        .await;

    let err = catalog_for(&server)
        .search("Movie-GRP", &SearchQuery::Name("Movie-GRP".into()))
        .await
        .unwrap_err();

    match err {
        Error::Pipeline(PipelineError::AmbiguousMatch { query, count }) => {
            assert_eq!(query, "Movie-GRP");
            assert_eq!(count, 2);
        }
        other => panic!("expected AmbiguousMatch, got {other:?}"),
    }
}

#[tokio::test]
async fn test_search_non_success_is_network_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = catalog_for(&server)
        .search("x", &SearchQuery::Name("x".into()))
        .await
        .unwrap_err();

    match err {
        Error::Pipeline(PipelineError::NetworkFailure { status, body, .. }) => {
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("expected NetworkFailure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_adult_releases_use_adult_base() {
    let regular = MockServer::start().await;
    let adult = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "resultsCount": 0, "results": []
        })))
        .expect(0)
        .mount(&regular)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/search/Studio.24.01.01.XXX.1080p-GRP"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "resultsCount": 1, "results": [{ "release": "Studio.24.01.01.XXX.1080p-GRP" }]
        })))
        .expect(1)
        .mount(&adult)
        .await;

    let catalog = SrrDbCatalog::new(CatalogConfig {
        base_url: regular.uri(),
        adult_base_url: adult.uri(),
        timeout: Duration::from_secs(5),
    })
    .unwrap();

    let found = catalog
        .search(
            "Studio.24.01.01.XXX.1080p-GRP",
            &SearchQuery::Name("Studio.24.01.01.XXX.1080p-GRP".into()),
        )
        .await
        .unwrap()
        .unwrap();
    assert!(found.download_url.starts_with(&adult.uri()));
}

#[tokio::test]
async fn test_requests_carry_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header(
            "user-agent",
            concat!("srrdb-verify/", env!("CARGO_PKG_VERSION")),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "resultsCount": 0, "results": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    catalog_for(&server)
        .search("x", &SearchQuery::Name("x".into()))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_download_writes_record_named_after_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download/srr/Movie-GRP"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"SRR BYTES".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let candidate = CatalogMatch {
        release: "Movie-GRP".into(),
        download_url: format!("{}/download/srr/Movie-GRP", server.uri()),
    };

    let written = catalog_for(&server)
        .download(&candidate, dir.path())
        .await
        .unwrap();

    assert_eq!(written, dir.path().join("Movie-GRP.srr"));
    assert_eq!(std::fs::read(&written).unwrap(), b"SRR BYTES");
}

#[tokio::test]
async fn test_download_non_success_writes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let candidate = CatalogMatch {
        release: "Movie-GRP".into(),
        download_url: format!("{}/download/srr/Movie-GRP", server.uri()),
    };

    let err = catalog_for(&server)
        .download(&candidate, dir.path())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Pipeline(PipelineError::NetworkFailure { status: 404, .. })
    ));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
