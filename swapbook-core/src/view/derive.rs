//! View derivations
//!
//! Ordering differs per view:
//! - by brand: groups in first-seen order of the filtered entries
//! - by engine: rows stable-sorted by lower-cased engine name, then
//!   grouped by exact engine string in first-seen order
//! - favorites: groups sorted by brand, case-insensitively; brands that
//!   differ only in case share a group labelled with the first spelling

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::Query;
use crate::catalog::{BrandCarEntry, Car};
use crate::favorites::FavoriteKey;

/// Cars of one brand
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrandGroup {
    pub brand: String,
    pub cars: Vec<Car>,
}

/// Cars that take one engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineGroup {
    pub engine: String,
    pub entries: Vec<BrandCarEntry>,
}

impl BrandGroup {
    pub fn new(brand: impl Into<String>, cars: Vec<Car>) -> Self {
        Self {
            brand: brand.into(),
            cars,
        }
    }
}

impl EngineGroup {
    pub fn new(engine: impl Into<String>, entries: Vec<BrandCarEntry>) -> Self {
        Self {
            engine: engine.into(),
            entries,
        }
    }
}

/// Filter, then group by brand in first-seen order
pub fn by_brand(entries: &[BrandCarEntry], query: &Query) -> Vec<BrandGroup> {
    let mut groups: IndexMap<&str, Vec<Car>> = IndexMap::new();

    for entry in entries
        .iter()
        .filter(|e| query.matches_entry(&e.brand, &e.car))
    {
        groups
            .entry(entry.brand.as_str())
            .or_default()
            .push(entry.car.clone());
    }

    groups
        .into_iter()
        .map(|(brand, cars)| BrandGroup::new(brand, cars))
        .collect()
}

/// Expand to (engine, brand, car) rows, filter, sort by engine, then group
pub fn by_engine(entries: &[BrandCarEntry], query: &Query) -> Vec<EngineGroup> {
    let mut rows: Vec<(&str, &BrandCarEntry)> = entries
        .iter()
        .flat_map(|entry| {
            entry
                .car
                .swappable_engines
                .iter()
                .map(move |engine| (engine.as_str(), entry))
        })
        .filter(|(engine, entry)| query.matches_engine(engine, &entry.brand, &entry.car))
        .collect();

    // Stable: rows with equal keys keep catalog order
    rows.sort_by_cached_key(|(engine, _)| engine.to_lowercase());

    let mut groups: IndexMap<&str, Vec<BrandCarEntry>> = IndexMap::new();
    for (engine, entry) in rows {
        groups.entry(engine).or_default().push(entry.clone());
    }

    groups
        .into_iter()
        .map(|(engine, entries)| EngineGroup::new(engine, entries))
        .collect()
}

/// Keep favorited entries, filter, then group by brand sorted case-insensitively
pub fn favorites(
    entries: &[BrandCarEntry],
    query: &Query,
    favorites: &BTreeSet<FavoriteKey>,
) -> Vec<BrandGroup> {
    if favorites.is_empty() {
        return Vec::new();
    }

    let mut groups: BTreeMap<String, BrandGroup> = BTreeMap::new();

    for entry in entries.iter().filter(|e| {
        favorites.contains(&FavoriteKey::for_car(&e.brand, &e.car))
            && query.matches_entry(&e.brand, &e.car)
    }) {
        groups
            .entry(entry.brand.to_lowercase())
            .or_insert_with(|| BrandGroup::new(entry.brand.clone(), Vec::new()))
            .cars
            .push(entry.car.clone());
    }

    groups.into_values().collect()
}
