//! Favorite keys

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::Car;

/// Separator between brand and car name in a stored key
pub const KEY_SEPARATOR: char = '|';

/// Identifies one car of one brand in the favorites set
///
/// The stored form is `brand|car`, kept as-is so existing favorites stay
/// readable. Names containing the separator make the key ambiguous; see
/// [`FavoriteKey::is_ambiguous`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FavoriteKey(String);

impl FavoriteKey {
    pub fn new(brand: &str, car_name: &str) -> Self {
        Self(format!("{brand}{KEY_SEPARATOR}{car_name}"))
    }

    pub fn for_car(brand: &str, car: &Car) -> Self {
        Self::new(brand, &car.name)
    }

    /// Wrap an already-encoded key, e.g. one read back from storage
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split at the first separator into `(brand, car)`
    ///
    /// Only exact when neither name contains the separator.
    pub fn split(&self) -> Option<(&str, &str)> {
        self.0.split_once(KEY_SEPARATOR)
    }

    /// Whether `(brand, car_name)` would produce a key another pair could collide with
    pub fn is_ambiguous(brand: &str, car_name: &str) -> bool {
        brand.contains(KEY_SEPARATOR) || car_name.contains(KEY_SEPARATOR)
    }
}

impl fmt::Display for FavoriteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FavoriteKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
