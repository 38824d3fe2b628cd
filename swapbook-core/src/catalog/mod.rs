//! Swapbook Catalog - engine swap database access
//!
//! This module provides the catalog data model and the sources that
//! produce it.
//!
//! # Overview
//!
//! The catalog system allows callers to:
//! - Fetch the engine swap database from a remote origin
//! - Cache the last good copy on disk with a TTL
//! - Flatten the brand → cars mapping into `(brand, car)` entries
//!
//! # Architecture
//!
//! ```text
//! Origin (static hosting)
//!     │
//!     └── engine_swap_database.json  ← {"carsByBrand": {...}}
//!            │
//!            ▼
//!     HttpCatalogClient
//!            │
//!            ▼
//!     CachedCatalogSource            ← <cache dir>/catalog_<hash>.json
//!            │
//!            ▼
//!     ViewStateController
//! ```

mod cache;
mod client;
mod model;

pub use cache::{clear_cache, CachedCatalog, CachedCatalogSource, DEFAULT_CACHE_TTL};
pub use client::{
    catalog_url, CatalogError, CatalogErrorKind, CatalogSource, HttpCatalogClient,
    StaticCatalogSource,
};
pub use model::{BrandCarEntry, Car, Catalog, CATALOG_RESOURCE};

#[cfg(test)]
mod tests;
