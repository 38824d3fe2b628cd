//! Search filtering
//!
//! A query matches when it is blank, or when it is a case-insensitive
//! substring of any searched field.

use crate::catalog::Car;

/// A prepared search query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    raw: String,
    /// Lower-cased query; `None` when blank
    needle: Option<String>,
}

impl Query {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let needle = if raw.trim().is_empty() {
            None
        } else {
            Some(raw.to_lowercase())
        };
        Self { raw, needle }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Empty or whitespace only
    pub fn is_blank(&self) -> bool {
        self.needle.is_none()
    }

    /// Case-insensitive substring test; a blank query matches everything
    pub fn matches_text(&self, text: &str) -> bool {
        match &self.needle {
            None => true,
            Some(needle) => text.to_lowercase().contains(needle.as_str()),
        }
    }

    /// Brand, car name, or any swappable engine
    pub fn matches_entry(&self, brand: &str, car: &Car) -> bool {
        self.is_blank()
            || self.matches_text(brand)
            || self.matches_text(&car.name)
            || car
                .swappable_engines
                .iter()
                .any(|engine| self.matches_text(engine))
    }

    /// Engine, brand, or car name; the car's other engines are not consulted
    pub fn matches_engine(&self, engine: &str, brand: &str, car: &Car) -> bool {
        self.is_blank()
            || self.matches_text(engine)
            || self.matches_text(brand)
            || self.matches_text(&car.name)
    }
}

impl Default for Query {
    fn default() -> Self {
        Self::new("")
    }
}

impl From<&str> for Query {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}
