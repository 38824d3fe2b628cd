//! Catalog data model
//!
//! The remote database is a single JSON document keyed by brand. Brand
//! order is significant: it is the order views list brands in, so the
//! mapping preserves document order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Resource path of the engine swap database relative to the base URL
pub const CATALOG_RESOURCE: &str = "engine_swap_database.json";

/// A car and the engines known to swap into it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    /// Model name (`car` on the wire)
    #[serde(rename = "car")]
    pub name: String,

    /// Engines that can be swapped in, in catalog order
    #[serde(default)]
    pub swappable_engines: Vec<String>,
}

impl Car {
    pub fn new<I, S>(name: impl Into<String>, engines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            swappable_engines: engines.into_iter().map(Into::into).collect(),
        }
    }
}

/// The engine swap database (`engine_swap_database.json`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    /// Cars keyed by brand, in document order
    pub cars_by_brand: IndexMap<String, Vec<Car>>,
}

/// A `(brand, car)` pairing, the unit every view filters and groups
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrandCarEntry {
    pub brand: String,
    pub car: Car,
}

impl BrandCarEntry {
    pub fn new(brand: impl Into<String>, car: Car) -> Self {
        Self {
            brand: brand.into(),
            car,
        }
    }
}

impl Catalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the database document from a JSON string
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Append a brand's cars, extending the list if the brand already exists
    pub fn insert(&mut self, brand: impl Into<String>, cars: Vec<Car>) {
        self.cars_by_brand.entry(brand.into()).or_default().extend(cars);
    }

    /// Flatten into `(brand, car)` entries: brands in document order, cars in list order
    pub fn entries(&self) -> Vec<BrandCarEntry> {
        self.cars_by_brand
            .iter()
            .flat_map(|(brand, cars)| {
                cars.iter()
                    .map(move |car| BrandCarEntry::new(brand.clone(), car.clone()))
            })
            .collect()
    }

    /// Number of brands
    pub fn brand_count(&self) -> usize {
        self.cars_by_brand.len()
    }

    /// Number of cars across all brands
    pub fn car_count(&self) -> usize {
        self.cars_by_brand.values().map(|cars| cars.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.car_count() == 0
    }
}
