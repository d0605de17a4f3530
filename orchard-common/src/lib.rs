//! # Orchard Common Library
//!
//! Shared code for the Orchard services including:
//! - Observation store (SQLite models and queries)
//! - Disease analysis engine (payload parsing, aggregation, dominance,
//!   recommendations, report composition, tabular export, summary codes)
//! - Configuration loading and root folder resolution
//! - Common error types

pub mod analysis;
pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod time;

pub use analysis::{
    AnalysisError, Distribution, DominantEntry, NormalizedEntry, RecommendationCatalog,
    UnknownCategoryPolicy,
};
pub use error::{Error, Result};
