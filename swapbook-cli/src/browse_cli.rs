//! Brand, engine, and favorites views

use anyhow::{bail, Result};
use clap::Args;
use std::sync::Arc;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};
use tracing::debug;

use swapbook_core::catalog::{CachedCatalogSource, CatalogSource, HttpCatalogClient};
use swapbook_core::favorites::{FavoritesSnapshot, FileBackend};
use swapbook_core::view::{BrandGroup, EngineGroup, TabView};
use swapbook_core::{
    FavoriteKey, FavoritesStore, LoadStatus, SwapbookConfig, ViewStateController, ViewTab,
};

#[derive(Args, Debug)]
pub struct ViewArgs {
    /// Case-insensitive search over brand, car, and engine names
    pub query: Option<String>,

    /// Output results as JSON
    #[clap(long)]
    pub json: bool,

    /// Force refresh of the catalog (bypass cache)
    #[clap(long)]
    pub refresh: bool,
}

/// Build the catalog source described by the configuration
pub fn catalog_source(config: &SwapbookConfig, refresh: bool) -> Result<Arc<dyn CatalogSource>> {
    let client = HttpCatalogClient::from_config(config)?;

    if !config.cache.enabled {
        debug!("Catalog cache disabled");
        return Ok(Arc::new(client));
    }

    let source = CachedCatalogSource::new(client, config.cache_dir()?)
        .with_ttl(config.cache_ttl())
        .force_refresh(refresh);
    Ok(Arc::new(source))
}

/// Open the favorites store described by the configuration
pub fn open_favorites(config: &SwapbookConfig) -> Result<FavoritesStore> {
    let backend = FileBackend::new(config.favorites_path()?);
    Ok(FavoritesStore::open(backend)?)
}

pub async fn execute(tab: ViewTab, args: ViewArgs, config: &SwapbookConfig) -> Result<()> {
    let source = catalog_source(config, args.refresh)?;
    let favorites = open_favorites(config)?;

    let controller = ViewStateController::launch(source, favorites);
    if let LoadStatus::Failed { message, .. } = controller.wait_until_loaded().await {
        bail!("Could not load the engine swap catalog: {message}");
    }

    if let Some(query) = args.query {
        controller.set_search_query(query);
    }

    let view = controller.view(tab);

    if args.json {
        let json = match &view {
            TabView::Brands(groups) => serde_json::to_string_pretty(groups.as_ref())?,
            TabView::Engines(groups) => serde_json::to_string_pretty(groups.as_ref())?,
        };
        println!("{json}");
        return Ok(());
    }

    if view.is_empty() {
        println!("{}", tab.empty_message());
        return Ok(());
    }

    let table = match &view {
        TabView::Brands(groups) => {
            println!("{} ({} brand(s)):\n", tab.title(), groups.len());
            render(brand_rows(groups, &controller.favorites()))
        }
        TabView::Engines(groups) => {
            println!("{} ({} engine(s)):\n", tab.title(), groups.len());
            render(engine_rows(groups))
        }
    };
    println!("{table}");

    Ok(())
}

fn render<R: Tabled>(rows: Vec<R>) -> String {
    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string()
}

/// Table row for brand-grouped views
#[derive(Tabled, Debug, PartialEq, Eq)]
struct CarRow {
    #[tabled(rename = "Brand")]
    brand: String,
    #[tabled(rename = "Car")]
    car: String,
    #[tabled(rename = "Swappable Engines")]
    engines: String,
    #[tabled(rename = "Fav")]
    favorite: String,
}

/// Table row for the engine view
#[derive(Tabled, Debug, PartialEq, Eq)]
struct EngineRow {
    #[tabled(rename = "Engine")]
    engine: String,
    #[tabled(rename = "Brand")]
    brand: String,
    #[tabled(rename = "Car")]
    car: String,
}

/// Brand label only on a group's first row
fn brand_rows(groups: &[BrandGroup], favorites: &FavoritesSnapshot) -> Vec<CarRow> {
    groups
        .iter()
        .flat_map(|group| {
            group.cars.iter().enumerate().map(move |(i, car)| CarRow {
                brand: if i == 0 { group.brand.clone() } else { String::new() },
                car: car.name.clone(),
                engines: car.swappable_engines.join(", "),
                favorite: if favorites.contains(&FavoriteKey::for_car(&group.brand, car)) {
                    "*".to_string()
                } else {
                    String::new()
                },
            })
        })
        .collect()
}

/// Engine label only on a group's first row
fn engine_rows(groups: &[EngineGroup]) -> Vec<EngineRow> {
    groups
        .iter()
        .flat_map(|group| {
            group.entries.iter().enumerate().map(move |(i, entry)| EngineRow {
                engine: if i == 0 { group.engine.clone() } else { String::new() },
                brand: entry.brand.clone(),
                car: entry.car.name.clone(),
            })
        })
        .collect()
}
