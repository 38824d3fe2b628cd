//! View state - the three derived projections of the catalog
//!
//! `filter` and `derive` are pure functions of (entries, query,
//! favorites). `controller` owns those inputs, tracks a revision per
//! input, and memoizes each view against the revision triple.

mod controller;
pub mod derive;
pub mod filter;

pub use controller::{LoadStatus, TabView, ViewSnapshot, ViewStateController, ViewTab};
pub use derive::{BrandGroup, EngineGroup};
pub use filter::Query;
