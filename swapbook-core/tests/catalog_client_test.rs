//! Catalog client tests against a local HTTP origin

mod common;

use axum::http::StatusCode;
use common::{closed_base_url, init_test_logging, MockOrigin, SAMPLE_DATABASE};
use std::time::Duration;
use swapbook_core::catalog::{
    CachedCatalogSource, CatalogError, CatalogErrorKind, CatalogSource, HttpCatalogClient,
};
use tempfile::TempDir;

fn client(base_url: &str) -> HttpCatalogClient {
    HttpCatalogClient::new(base_url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_fetch_decodes_database() {
    init_test_logging();
    let origin = MockOrigin::serving(SAMPLE_DATABASE).await;

    let catalog = client(&origin.base_url).fetch_catalog().await.unwrap();

    assert_eq!(catalog.brand_count(), 2);
    assert_eq!(catalog.car_count(), 3);
    let brands: Vec<&str> = catalog.cars_by_brand.keys().map(String::as_str).collect();
    assert_eq!(brands, vec!["Toyota", "Nissan"]);
    assert_eq!(origin.hits(), 1);
}

#[tokio::test]
async fn test_fetch_under_base_path() {
    init_test_logging();
    let origin = MockOrigin::start("/data", StatusCode::OK, SAMPLE_DATABASE).await;
    assert!(!origin.base_url.ends_with('/'));

    let client = client(&origin.base_url);
    assert!(client.url().ends_with("/data/engine_swap_database.json"));
    assert_eq!(client.fetch_catalog().await.unwrap().car_count(), 3);
}

#[tokio::test]
async fn test_http_error_status_is_network_failure() {
    init_test_logging();
    let origin = MockOrigin::start("/", StatusCode::NOT_FOUND, "missing").await;

    let err = client(&origin.base_url).fetch_catalog().await.unwrap_err();

    assert!(matches!(err, CatalogError::Status { status, .. } if status.as_u16() == 404));
    assert_eq!(err.kind(), CatalogErrorKind::Network);
    assert!(err.to_string().contains("404"));
}

#[tokio::test]
async fn test_malformed_body_is_decode_failure() {
    init_test_logging();
    let origin = MockOrigin::serving(r#"{"carsByBrand": {"Toyota": "Supra"}}"#).await;

    let err = client(&origin.base_url).fetch_catalog().await.unwrap_err();

    assert!(matches!(err, CatalogError::Decode { .. }));
    assert_eq!(err.kind(), CatalogErrorKind::Decode);
}

#[tokio::test]
async fn test_unreachable_origin_is_network_failure() {
    init_test_logging();
    let base_url = closed_base_url().await;

    let err = client(&base_url).fetch_catalog().await.unwrap_err();

    assert!(matches!(err, CatalogError::Network { .. }));
    assert_eq!(err.kind(), CatalogErrorKind::Network);
}

#[tokio::test]
async fn test_cached_source_fetches_once_within_ttl() {
    init_test_logging();
    let origin = MockOrigin::serving(SAMPLE_DATABASE).await;
    let cache_dir = TempDir::new().unwrap();

    let source = CachedCatalogSource::new(client(&origin.base_url), cache_dir.path());
    let first = source.fetch_catalog().await.unwrap();
    let second = source.fetch_catalog().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(origin.hits(), 1);

    let refreshing =
        CachedCatalogSource::new(client(&origin.base_url), cache_dir.path()).force_refresh(true);
    refreshing.fetch_catalog().await.unwrap();
    assert_eq!(origin.hits(), 2);
}

#[tokio::test]
async fn test_cache_is_keyed_by_origin() {
    init_test_logging();
    let first_origin = MockOrigin::serving(SAMPLE_DATABASE).await;
    let second_origin = MockOrigin::serving(r#"{"carsByBrand": {}}"#).await;
    let cache_dir = TempDir::new().unwrap();

    let first = CachedCatalogSource::new(client(&first_origin.base_url), cache_dir.path());
    let second = CachedCatalogSource::new(client(&second_origin.base_url), cache_dir.path());

    assert_eq!(first.fetch_catalog().await.unwrap().car_count(), 3);
    assert!(second.fetch_catalog().await.unwrap().is_empty());
    assert_ne!(first.cache_path(), second.cache_path());
}
