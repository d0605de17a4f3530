//! Disease analysis engine
//!
//! Turns stored observations into percentage distributions, dominant
//! categories and treatment recommendations, and serializes the result as
//! paginated report documents and CSV exports.
//!
//! Pipeline: [`payload`] → [`aggregate`] → [`dominance`] → [`catalog`] →
//! {[`report`], [`tabular`]}.
//!
//! # Pure Functions
//!
//! Everything in this module is synchronous and free of shared state.
//! Callers pass a fresh observation snapshot and an [`AnalysisConfig`]
//! built once at startup; results depend only on those inputs.

pub mod aggregate;
pub mod catalog;
pub mod dominance;
pub mod payload;
pub mod report;
pub mod summary_code;
pub mod tabular;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use aggregate::{aggregate, aggregate_one, CategoryShare, Distribution};
pub use catalog::{CatalogEntry, RecommendationCatalog, NO_RECOMMENDATION};
pub use dominance::{resolve, DominantEntry, NO_DATA_PERCENTAGE};
pub use payload::{parse, NormalizedEntry};
pub use report::{compose, layout, render_text, PageGeometry, ReportDocument, ReportMode, ReportSection};
pub use summary_code::SummaryPayload;
pub use tabular::{export, to_csv, Row};

/// Analysis error conditions
///
/// None of these are fatal to a batch: malformed payloads and unknown
/// categories degrade output locally, and an empty distribution surfaces as
/// the [`DominantEntry::no_data`] sentinel.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Observation payload does not deserialize into a category mapping
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Distribution has nothing to choose a dominant category from
    #[error("Distribution has no data")]
    EmptyDistribution,

    /// Category has no entry in the recommendation catalog
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    /// Recommendation catalog definition is invalid
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    /// Summary code cannot be decoded
    #[error("Invalid summary code: {0}")]
    InvalidSummaryCode(String),
}

/// One stored classification event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Store-assigned identifier
    pub id: i64,
    /// Optional tree label
    pub tree_id: Option<String>,
    /// When the observation was recorded (UTC)
    pub timestamp: DateTime<Utc>,
    /// Opaque serialized category → value mapping
    pub raw_payload: String,
}

impl Observation {
    pub fn new(
        id: i64,
        tree_id: Option<String>,
        timestamp: DateTime<Utc>,
        raw_payload: impl Into<String>,
    ) -> Self {
        Self {
            id,
            tree_id,
            timestamp,
            raw_payload: raw_payload.into(),
        }
    }

    /// Tree label, if present and not blank
    pub fn tree_label(&self) -> Option<&str> {
        self.tree_id
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
    }
}

/// How categories outside the recommendation catalog are aggregated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownCategoryPolicy {
    /// Only catalog categories accumulate; unknown entries are ignored
    #[default]
    Exclude,
    /// Unknown categories accumulate too and count towards the total
    Include,
}

/// Immutable analysis settings, constructed once and passed explicitly
#[derive(Debug, Clone, Default)]
pub struct AnalysisConfig {
    pub catalog: RecommendationCatalog,
    pub unknown_categories: UnknownCategoryPolicy,
}

impl AnalysisConfig {
    pub fn new(catalog: RecommendationCatalog, unknown_categories: UnknownCategoryPolicy) -> Self {
        Self {
            catalog,
            unknown_categories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_label_ignores_blank_ids() {
        let ts = Utc::now();
        assert_eq!(Observation::new(1, Some("  ".into()), ts, "{}").tree_label(), None);
        assert_eq!(Observation::new(1, None, ts, "{}").tree_label(), None);
        assert_eq!(Observation::new(1, Some(" T1 ".into()), ts, "{}").tree_label(), Some("T1"));
    }

    #[test]
    fn test_unknown_policy_serde_names() {
        let include: UnknownCategoryPolicy = serde_json::from_str("\"include\"").unwrap();
        assert_eq!(include, UnknownCategoryPolicy::Include);
        assert_eq!(UnknownCategoryPolicy::default(), UnknownCategoryPolicy::Exclude);
    }
}
