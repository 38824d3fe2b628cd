//! Favorites - the persisted set of favorited cars
//!
//! Favorites are stored as `"<brand>|<car>"` strings. All mutations go
//! through a single writer task so concurrent toggles never lose an
//! update; readers observe committed snapshots through a watch channel.

mod key;
mod storage;
mod store;

pub use key::{FavoriteKey, KEY_SEPARATOR};
pub use storage::{
    FavoritesBackend, FavoritesDocument, FileBackend, MemoryBackend, StorageError,
    FAVORITES_FILE, FAVORITES_STORE_NAME,
};
pub use store::{FavoritesSnapshot, FavoritesStore};
