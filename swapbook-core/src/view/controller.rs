//! View state controller
//!
//! Owns the flattened catalog, the search query, and a mirror of the
//! favorites store. Every input carries a revision; each derived view is
//! cached against the `(catalog, query, favorites)` revision triple and
//! recomputed when any of them moves.

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, Weak};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::derive::{self, BrandGroup, EngineGroup};
use super::Query;
use crate::catalog::{BrandCarEntry, Car, Catalog, CatalogErrorKind, CatalogSource};
use crate::favorites::{FavoriteKey, FavoritesSnapshot, FavoritesStore, StorageError};

/// Progress of the one catalog load
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoadStatus {
    Loading,
    Loaded {
        brands: usize,
        cars: usize,
        /// RFC 3339 timestamp
        loaded_at: String,
    },
    /// The fetch failed; whatever catalog was held before is kept
    Failed {
        kind: CatalogErrorKind,
        message: String,
    },
}

impl LoadStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadStatus::Loading)
    }
}

/// The three tabs a presentation layer shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewTab {
    ByBrand,
    ByEngine,
    Favorites,
}

impl ViewTab {
    pub const ALL: [ViewTab; 3] = [ViewTab::ByBrand, ViewTab::ByEngine, ViewTab::Favorites];

    pub fn title(&self) -> &'static str {
        match self {
            ViewTab::ByBrand => "Cars",
            ViewTab::ByEngine => "Engines",
            ViewTab::Favorites => "Favorites",
        }
    }

    /// What to show when the view has no groups
    pub fn empty_message(&self) -> &'static str {
        match self {
            ViewTab::Favorites => "No favorites yet. Tap the star on any car to add it here.",
            ViewTab::ByBrand | ViewTab::ByEngine => "No cars match your search.",
        }
    }
}

/// One tab's derived content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabView {
    Brands(Arc<Vec<BrandGroup>>),
    Engines(Arc<Vec<EngineGroup>>),
}

impl TabView {
    pub fn is_empty(&self) -> bool {
        match self {
            TabView::Brands(groups) => groups.is_empty(),
            TabView::Engines(groups) => groups.is_empty(),
        }
    }

    /// Number of groups
    pub fn len(&self) -> usize {
        match self {
            TabView::Brands(groups) => groups.len(),
            TabView::Engines(groups) => groups.len(),
        }
    }
}

/// Everything a presentation layer needs for one frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewSnapshot {
    pub query: String,
    pub status: LoadStatus,
    pub favorite_count: usize,
    pub by_brand: Vec<BrandGroup>,
    pub by_engine: Vec<EngineGroup>,
    pub favorites: Vec<BrandGroup>,
}

/// `(catalog, query, favorites)` revisions
type Stamp = (u64, u64, u64);

type Slot<T> = Option<(Stamp, Arc<T>)>;

#[derive(Default)]
struct ViewMemo {
    by_brand: Slot<Vec<BrandGroup>>,
    by_engine: Slot<Vec<EngineGroup>>,
    favorites: Slot<Vec<BrandGroup>>,
}

#[derive(Default)]
struct ViewInputs {
    entries: Arc<Vec<BrandCarEntry>>,
    catalog_revision: u64,
    query: Query,
    query_revision: u64,
}

/// Inputs captured under one lock, so a derivation never mixes revisions
struct Captured {
    entries: Arc<Vec<BrandCarEntry>>,
    query: Query,
    status: LoadStatus,
    favorites: FavoritesSnapshot,
    stamp: Stamp,
}

/// Owns catalog, query, and favorites; derives the three views on demand
pub struct ViewStateController {
    inputs: RwLock<ViewInputs>,
    favorites: FavoritesStore,
    status: watch::Sender<LoadStatus>,
    memo: Mutex<ViewMemo>,
}

impl ViewStateController {
    /// Create a controller and start its catalog fetch
    ///
    /// The fetch runs exactly once, on the current tokio runtime. Until it
    /// completes every view is empty; on failure the views stay empty and
    /// [`load_status`](Self::load_status) reports the error.
    pub fn launch(source: Arc<dyn CatalogSource>, favorites: FavoritesStore) -> Arc<Self> {
        let controller = Arc::new(Self::new(favorites));
        let weak = Arc::downgrade(&controller);

        tokio::spawn(async move {
            let result = source.fetch_catalog().await;
            Self::finish_load(weak, source.origin(), result);
        });

        controller
    }

    fn new(favorites: FavoritesStore) -> Self {
        let (status, _) = watch::channel(LoadStatus::Loading);
        Self {
            inputs: RwLock::new(ViewInputs::default()),
            favorites,
            status,
            memo: Mutex::new(ViewMemo::default()),
        }
    }

    fn finish_load(
        controller: Weak<Self>,
        origin: &str,
        result: Result<Catalog, crate::catalog::CatalogError>,
    ) {
        let Some(controller) = controller.upgrade() else {
            debug!("Controller dropped before catalog from {} arrived", origin);
            return;
        };

        match result {
            Ok(catalog) => controller.replace_catalog(catalog),
            Err(e) => {
                let kind = e.kind();
                let message = format!("{:#}", anyhow::Error::new(e));
                warn!(origin, %kind, "Failed to load catalog: {}", message);
                controller
                    .status
                    .send_replace(LoadStatus::Failed { kind, message });
            }
        }
    }

    fn replace_catalog(&self, catalog: Catalog) {
        let entries = catalog.entries();

        for entry in entries
            .iter()
            .filter(|e| FavoriteKey::is_ambiguous(&e.brand, &e.car.name))
        {
            warn!(
                brand = %entry.brand,
                car = %entry.car.name,
                "Catalog name contains the favorite key separator; favorites may collide"
            );
        }

        // Status moves with the entries so a capture sees both or neither
        {
            let mut inputs = self.write_inputs();
            inputs.entries = Arc::new(entries);
            inputs.catalog_revision += 1;
            self.status.send_replace(LoadStatus::Loaded {
                brands: catalog.brand_count(),
                cars: catalog.car_count(),
                loaded_at: chrono::Utc::now().to_rfc3339(),
            });
        }

        info!(
            "Loaded catalog: {} brands, {} cars",
            catalog.brand_count(),
            catalog.car_count()
        );
    }

    /// Replace the search query
    pub fn set_search_query(&self, query: impl Into<String>) {
        let query = Query::new(query);
        let mut inputs = self.write_inputs();
        if inputs.query != query {
            inputs.query = query;
            inputs.query_revision += 1;
        }
    }

    pub fn search_query(&self) -> String {
        self.read_inputs().query.as_str().to_string()
    }

    /// Flattened `(brand, car)` entries of the current catalog
    pub fn entries(&self) -> Arc<Vec<BrandCarEntry>> {
        Arc::clone(&self.read_inputs().entries)
    }

    /// Current load status
    pub fn status(&self) -> LoadStatus {
        self.status.borrow().clone()
    }

    /// Watch the load status
    pub fn load_status(&self) -> watch::Receiver<LoadStatus> {
        self.status.subscribe()
    }

    /// Wait until the catalog fetch has finished, successfully or not
    pub async fn wait_until_loaded(&self) -> LoadStatus {
        let mut rx = self.status.subscribe();
        if let Ok(status) = rx.wait_for(|s| !s.is_loading()).await {
            return status.clone();
        }
        self.status()
    }

    /// Latest committed favorites
    pub fn favorites(&self) -> FavoritesSnapshot {
        self.favorites.current()
    }

    pub fn is_favorite(&self, brand: &str, car: &Car) -> bool {
        self.favorites.contains(&FavoriteKey::for_car(brand, car))
    }

    /// Toggle a favorite and wait for the store to commit it
    pub async fn toggle_favorite(&self, brand: &str, car: &Car) -> Result<bool, StorageError> {
        self.favorites.toggle(FavoriteKey::for_car(brand, car)).await
    }

    /// Queue a favorite toggle without waiting for it
    pub fn request_toggle_favorite(&self, brand: &str, car: &Car) -> Result<(), StorageError> {
        self.favorites
            .request_toggle(FavoriteKey::for_car(brand, car))
    }

    pub fn derive_by_brand(&self) -> Arc<Vec<BrandGroup>> {
        self.by_brand_for(&self.capture())
    }

    pub fn derive_by_engine(&self) -> Arc<Vec<EngineGroup>> {
        self.by_engine_for(&self.capture())
    }

    pub fn derive_favorites(&self) -> Arc<Vec<BrandGroup>> {
        self.favorites_for(&self.capture())
    }

    pub fn view(&self, tab: ViewTab) -> TabView {
        match tab {
            ViewTab::ByBrand => TabView::Brands(self.derive_by_brand()),
            ViewTab::ByEngine => TabView::Engines(self.derive_by_engine()),
            ViewTab::Favorites => TabView::Brands(self.derive_favorites()),
        }
    }

    /// All three views, the query, and the status from one capture
    pub fn snapshot(&self) -> ViewSnapshot {
        let captured = self.capture();
        ViewSnapshot {
            by_brand: self.by_brand_for(&captured).as_ref().clone(),
            by_engine: self.by_engine_for(&captured).as_ref().clone(),
            favorites: self.favorites_for(&captured).as_ref().clone(),
            query: captured.query.as_str().to_string(),
            status: captured.status,
            favorite_count: captured.favorites.len(),
        }
    }

    fn by_brand_for(&self, captured: &Captured) -> Arc<Vec<BrandGroup>> {
        let mut memo = self.lock_memo();
        memoized(&mut memo.by_brand, captured.stamp, || {
            derive::by_brand(&captured.entries, &captured.query)
        })
    }

    fn by_engine_for(&self, captured: &Captured) -> Arc<Vec<EngineGroup>> {
        let mut memo = self.lock_memo();
        memoized(&mut memo.by_engine, captured.stamp, || {
            derive::by_engine(&captured.entries, &captured.query)
        })
    }

    fn favorites_for(&self, captured: &Captured) -> Arc<Vec<BrandGroup>> {
        let mut memo = self.lock_memo();
        memoized(&mut memo.favorites, captured.stamp, || {
            derive::favorites(&captured.entries, &captured.query, &captured.favorites.keys)
        })
    }

    fn capture(&self) -> Captured {
        let favorites = self.favorites.current();
        let inputs = self.read_inputs();
        Captured {
            entries: Arc::clone(&inputs.entries),
            query: inputs.query.clone(),
            status: self.status.borrow().clone(),
            stamp: (
                inputs.catalog_revision,
                inputs.query_revision,
                favorites.revision,
            ),
            favorites,
        }
    }

    fn read_inputs(&self) -> std::sync::RwLockReadGuard<'_, ViewInputs> {
        self.inputs
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_inputs(&self) -> std::sync::RwLockWriteGuard<'_, ViewInputs> {
        self.inputs
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_memo(&self) -> MutexGuard<'_, ViewMemo> {
        self.memo
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Return the cached value for `stamp`, or compute and cache it
fn memoized<T>(slot: &mut Slot<T>, stamp: Stamp, compute: impl FnOnce() -> T) -> Arc<T> {
    if let Some((cached_stamp, value)) = slot {
        if *cached_stamp == stamp {
            return Arc::clone(value);
        }
    }

    let value = Arc::new(compute());
    *slot = Some((stamp, Arc::clone(&value)));
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalogSource;
    use crate::favorites::MemoryBackend;
    use crate::view::derive;
    use pretty_assertions::assert_eq;

    fn sample_catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.insert(
            "Toyota",
            vec![
                Car::new("Supra", ["2JZ", "B58"]),
                Car::new("AE86", ["4A-GE"]),
            ],
        );
        catalog.insert("Honda", vec![Car::new("Civic EK", ["K20", "B18C"])]);
        catalog
    }

    async fn loaded_controller() -> Arc<ViewStateController> {
        let store = FavoritesStore::open(MemoryBackend::new()).unwrap();
        let source = Arc::new(StaticCatalogSource::new(sample_catalog()));
        let controller = ViewStateController::launch(source, store);
        controller.wait_until_loaded().await;
        controller
    }

    #[tokio::test]
    async fn test_views_memoized_until_input_changes() {
        let controller = loaded_controller().await;

        let first = controller.derive_by_brand();
        let second = controller.derive_by_brand();
        assert!(Arc::ptr_eq(&first, &second));

        controller.set_search_query("honda");
        let third = controller.derive_by_brand();
        assert!(!Arc::ptr_eq(&second, &third));
        assert_eq!(third.len(), 1);
    }

    #[tokio::test]
    async fn test_same_query_keeps_cache() {
        let controller = loaded_controller().await;
        controller.set_search_query("2jz");
        let first = controller.derive_by_engine();
        controller.set_search_query("2jz");
        assert!(Arc::ptr_eq(&first, &controller.derive_by_engine()));
    }

    #[tokio::test]
    async fn test_favorite_toggle_invalidates_favorites_view() {
        let controller = loaded_controller().await;
        let supra = Car::new("Supra", ["2JZ", "B58"]);

        assert!(controller.derive_favorites().is_empty());
        assert!(controller.toggle_favorite("Toyota", &supra).await.unwrap());
        assert!(controller.is_favorite("Toyota", &supra));

        assert_eq!(
            *controller.derive_favorites(),
            vec![BrandGroup::new("Toyota", vec![supra.clone()])]
        );
    }

    #[tokio::test]
    async fn test_cached_views_match_uncached_derivations() {
        let controller = loaded_controller().await;
        let entries = controller.entries();

        for raw in ["", "b", "TOY", "k20", "zzz"] {
            controller.set_search_query(raw);
            let query = Query::new(raw);
            assert_eq!(*controller.derive_by_brand(), derive::by_brand(&entries, &query));
            assert_eq!(*controller.derive_by_engine(), derive::by_engine(&entries, &query));
            assert_eq!(
                *controller.derive_favorites(),
                derive::favorites(&entries, &query, &controller.favorites().keys)
            );
        }
    }

    #[tokio::test]
    async fn test_view_by_tab() {
        let controller = loaded_controller().await;
        assert_eq!(controller.view(ViewTab::ByBrand).len(), 2);
        assert_eq!(controller.view(ViewTab::ByEngine).len(), 5);
        assert!(controller.view(ViewTab::Favorites).is_empty());
        assert_eq!(ViewTab::ByEngine.title(), "Engines");
    }

    #[tokio::test]
    async fn test_snapshot_serializes() {
        let controller = loaded_controller().await;
        controller.set_search_query("supra");

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.query, "supra");
        assert_eq!(snapshot.by_brand.len(), 1);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["status"]["state"], "loaded");
        assert_eq!(json["by_brand"][0]["cars"][0]["car"], "Supra");
        assert_eq!(json["by_engine"][0]["entries"][0]["brand"], "Toyota");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_snapshot_is_consistent_while_query_changes() {
        let controller = loaded_controller().await;
        let stop = Arc::new(std::sync::atomic::AtomicBool::new(false));

        let writer = {
            let controller = Arc::clone(&controller);
            let stop = Arc::clone(&stop);
            std::thread::spawn(move || {
                let mut flip = false;
                while !stop.load(std::sync::atomic::Ordering::Relaxed) {
                    controller.set_search_query(if flip { "toyota" } else { "honda" });
                    flip = !flip;
                }
            })
        };

        for _ in 0..20_000 {
            let snapshot = controller.snapshot();
            if snapshot.query.is_empty() {
                continue;
            }
            assert_eq!(snapshot.by_brand.len(), 1);
            assert_eq!(snapshot.by_brand[0].brand.to_lowercase(), snapshot.query);
            for group in &snapshot.by_engine {
                for entry in &group.entries {
                    assert_eq!(entry.brand.to_lowercase(), snapshot.query);
                }
            }
        }

        stop.store(true, std::sync::atomic::Ordering::Relaxed);
        writer.join().unwrap();
    }

    #[tokio::test]
    async fn test_load_status_reports_loading_then_loaded() {
        let store = FavoritesStore::open(MemoryBackend::new()).unwrap();
        let source = Arc::new(StaticCatalogSource::new(sample_catalog()));
        let controller = ViewStateController::launch(source, store);

        // The fetch task has not run yet on this single-threaded runtime
        let mut status = controller.load_status();
        assert_eq!(*status.borrow_and_update(), LoadStatus::Loading);

        status.changed().await.unwrap();
        assert!(matches!(
            *status.borrow(),
            LoadStatus::Loaded { brands: 2, cars: 3, .. }
        ));
    }

    #[tokio::test]
    async fn test_load_status_reports_failure() {
        let store = FavoritesStore::open(MemoryBackend::new()).unwrap();
        let controller = ViewStateController::launch(
            Arc::new(StaticCatalogSource::unavailable("offline")),
            store,
        );

        let mut status = controller.load_status();
        assert!(status.borrow_and_update().is_loading());

        status.changed().await.unwrap();
        let current = status.borrow().clone();
        match current {
            LoadStatus::Failed { kind, message } => {
                assert_eq!(kind, CatalogErrorKind::Network);
                assert!(message.contains("offline"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(controller.snapshot().by_brand.is_empty());
    }

    #[test]
    fn test_memoized_recomputes_on_new_stamp() {
        let mut slot: Slot<u32> = None;
        let mut calls = 0;

        let a = memoized(&mut slot, (1, 0, 0), || {
            calls += 1;
            7
        });
        let b = memoized(&mut slot, (1, 0, 0), || {
            calls += 1;
            8
        });
        assert_eq!((*a, *b), (7, 7));

        let c = memoized(&mut slot, (1, 1, 0), || {
            calls += 1;
            9
        });
        assert_eq!(*c, 9);
        assert_eq!(calls, 2);
    }
}
