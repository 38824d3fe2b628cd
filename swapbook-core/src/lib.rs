//! Swapbook core library exports

pub mod catalog;
pub mod config;
pub mod favorites;
pub mod view;

pub use catalog::{BrandCarEntry, Car, Catalog, CatalogError, CatalogSource};
pub use config::SwapbookConfig;
pub use favorites::{FavoriteKey, FavoritesSnapshot, FavoritesStore, StorageError};
pub use view::{LoadStatus, ViewSnapshot, ViewStateController, ViewTab};
