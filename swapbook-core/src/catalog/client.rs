//! Catalog sources
//!
//! `CatalogSource` is the seam between the view controller and wherever
//! the database comes from. The HTTP client performs a single GET per
//! call; retries and refresh scheduling belong to the caller.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::{Catalog, CATALOG_RESOURCE};
use crate::config::SwapbookConfig;

/// Failure to produce a catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Connection, timeout, or body transfer failure
    #[error("Failed to fetch catalog from {url}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The origin answered with a non-success status
    #[error("Failed to fetch catalog: HTTP {status} from {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// The body did not match `{"carsByBrand": {...}}`
    #[error("Failed to parse catalog from {url}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The HTTP client could not be constructed
    #[error("Failed to create HTTP client")]
    Client(#[source] reqwest::Error),

    /// A non-network source had nothing to serve
    #[error("Catalog unavailable from {origin}: {reason}")]
    Unavailable { origin: String, reason: String },
}

/// Coarse failure class, kept for logging and status reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogErrorKind {
    Network,
    Decode,
}

impl CatalogError {
    pub fn kind(&self) -> CatalogErrorKind {
        match self {
            CatalogError::Decode { .. } => CatalogErrorKind::Decode,
            CatalogError::Network { .. }
            | CatalogError::Status { .. }
            | CatalogError::Client(_)
            | CatalogError::Unavailable { .. } => CatalogErrorKind::Network,
        }
    }
}

impl std::fmt::Display for CatalogErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogErrorKind::Network => f.write_str("network"),
            CatalogErrorKind::Decode => f.write_str("decode"),
        }
    }
}

/// Trait for anything that can produce the engine swap catalog
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch the full catalog
    async fn fetch_catalog(&self) -> Result<Catalog, CatalogError>;

    /// Where the catalog comes from, for logging and cache keys
    fn origin(&self) -> &str;
}

/// Build the database URL from a base URL, with or without a trailing slash
pub fn catalog_url(base_url: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), CATALOG_RESOURCE)
}

/// Fetches `engine_swap_database.json` over HTTP
pub struct HttpCatalogClient {
    client: reqwest::Client,
    url: String,
}

impl HttpCatalogClient {
    /// Create a client for `<base_url>/engine_swap_database.json`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("swapbook/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(CatalogError::Client)?;

        Ok(Self {
            client,
            url: catalog_url(base_url),
        })
    }

    /// Create a client from the effective configuration
    pub fn from_config(config: &SwapbookConfig) -> Result<Self, CatalogError> {
        Self::new(
            &config.base_url,
            Duration::from_secs(config.timeout_seconds),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogClient {
    async fn fetch_catalog(&self) -> Result<Catalog, CatalogError> {
        debug!("Fetching catalog from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|source| CatalogError::Network {
                url: self.url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                url: self.url.clone(),
                status,
            });
        }

        let content = response
            .text()
            .await
            .map_err(|source| CatalogError::Network {
                url: self.url.clone(),
                source,
            })?;

        let catalog = Catalog::from_json(&content).map_err(|source| CatalogError::Decode {
            url: self.url.clone(),
            source,
        })?;

        debug!(
            "Fetched catalog from {}: {} brands, {} cars",
            self.url,
            catalog.brand_count(),
            catalog.car_count()
        );
        Ok(catalog)
    }

    fn origin(&self) -> &str {
        &self.url
    }
}

/// Serves a fixed catalog, or always fails when built with `unavailable`
///
/// Used for bundled data and for driving the controller in tests.
#[derive(Debug, Clone)]
pub struct StaticCatalogSource {
    catalog: Option<Catalog>,
    origin: String,
}

impl StaticCatalogSource {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: Some(catalog),
            origin: "static".to_string(),
        }
    }

    pub fn unavailable(origin: impl Into<String>) -> Self {
        Self {
            catalog: None,
            origin: origin.into(),
        }
    }
}

#[async_trait]
impl CatalogSource for StaticCatalogSource {
    async fn fetch_catalog(&self) -> Result<Catalog, CatalogError> {
        self.catalog
            .clone()
            .ok_or_else(|| CatalogError::Unavailable {
                origin: self.origin.clone(),
                reason: "no catalog configured".to_string(),
            })
    }

    fn origin(&self) -> &str {
        &self.origin
    }
}
