//! Aggregation of observations into percentage distributions

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::payload::{self, NormalizedEntry};
use super::{AnalysisError, Observation, UnknownCategoryPolicy};

/// One category's share of a distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub category: String,
    /// Share of the total, 0..=100
    pub percentage: f64,
    /// Raw accumulated value
    pub total: f64,
    /// Whether any parsed entry contributed to this category
    pub observed: bool,
}

/// Percentage breakdown by category
///
/// Entries are ordered by descending percentage; ties keep known-category
/// order, then unknown categories in first-seen order. Every known category
/// is present, with 0 when absent from the input.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Distribution {
    entries: Vec<CategoryShare>,
    total: f64,
}

impl Distribution {
    /// Build a distribution from (category, value) pairs taken in order
    ///
    /// Values are treated as raw totals and normalized; the given order is
    /// kept as-is (no sorting).
    pub fn from_shares<I, S>(shares: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let totals: Vec<(String, f64, bool)> = shares
            .into_iter()
            .map(|(category, value)| (category.into(), value, true))
            .collect();
        Self::normalize(totals)
    }

    fn normalize(totals: Vec<(String, f64, bool)>) -> Self {
        let totals: Vec<(String, f64, bool)> = totals
            .into_iter()
            .map(|(category, value, observed)| (category, value.min(f64::MAX), observed))
            .collect();
        let total: f64 = totals.iter().map(|(_, value, _)| value).sum();

        // Huge but finite inputs can overflow the sum; divide through by the
        // largest total first so the shares stay finite.
        let scale = if total.is_finite() {
            1.0
        } else {
            totals
                .iter()
                .map(|(_, value, _)| *value)
                .fold(0.0, f64::max)
        };
        let scaled_total: f64 = totals.iter().map(|(_, value, _)| value / scale).sum();

        let entries = totals
            .into_iter()
            .map(|(category, value, observed)| CategoryShare {
                category,
                percentage: if scaled_total > 0.0 {
                    value / scale / scaled_total * 100.0
                } else {
                    0.0
                },
                total: value,
                observed,
            })
            .collect();
        Self {
            entries,
            total: total.min(f64::MAX),
        }
    }

    pub fn entries(&self) -> &[CategoryShare] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryShare> {
        self.entries.iter()
    }

    /// Sum of all raw category totals
    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when there is something to rank: at least one entry and a
    /// positive total
    pub fn has_data(&self) -> bool {
        !self.entries.is_empty() && self.total > 0.0
    }

    pub fn get(&self, category: &str) -> Option<&CategoryShare> {
        self.entries.iter().find(|share| share.category == category)
    }

    pub fn percentage(&self, category: &str) -> Option<f64> {
        self.get(category).map(|share| share.percentage)
    }
}

/// Running per-category totals in declaration order
struct Totals<'a> {
    known: &'a [String],
    policy: UnknownCategoryPolicy,
    slots: Vec<(String, f64, bool)>,
    index: HashMap<String, usize>,
}

impl<'a> Totals<'a> {
    fn new(known: &'a [String], policy: UnknownCategoryPolicy) -> Self {
        let mut slots = Vec::with_capacity(known.len());
        let mut index = HashMap::with_capacity(known.len());
        for category in known {
            if !index.contains_key(category) {
                index.insert(category.clone(), slots.len());
                slots.push((category.clone(), 0.0, false));
            }
        }
        Self {
            known,
            policy,
            slots,
            index,
        }
    }

    fn add(&mut self, entry: &NormalizedEntry) {
        let slot = match self.index.get(&entry.category) {
            Some(&slot) => slot,
            None if self.policy == UnknownCategoryPolicy::Include => {
                self.index.insert(entry.category.clone(), self.slots.len());
                self.slots.push((entry.category.clone(), 0.0, false));
                self.slots.len() - 1
            }
            None => {
                debug!(
                    "Ignoring unknown category '{}' ({} known)",
                    entry.category,
                    self.known.len()
                );
                return;
            }
        };
        let (_, total, observed) = &mut self.slots[slot];
        *total = (*total + entry.value).min(f64::MAX);
        *observed = true;
    }

    fn into_distribution(self) -> Distribution {
        let mut distribution = Distribution::normalize(self.slots);
        // Stable: equal percentages keep declaration order
        distribution
            .entries
            .sort_by(|a, b| b.percentage.total_cmp(&a.percentage));
        distribution
    }
}

/// Aggregate many observations into one distribution
///
/// Malformed payloads contribute nothing; this never fails, and yields an
/// all-zero distribution when nothing parses.
pub fn aggregate(
    observations: &[Observation],
    known_categories: &[String],
    policy: UnknownCategoryPolicy,
) -> Distribution {
    let mut totals = Totals::new(known_categories, policy);
    let mut skipped = 0usize;

    for observation in observations {
        match payload::parse(&observation.raw_payload) {
            Ok(entries) => entries.iter().for_each(|entry| totals.add(entry)),
            Err(e) => {
                skipped += 1;
                debug!("Skipping observation {}: {}", observation.id, e);
            }
        }
    }

    if skipped > 0 {
        debug!(
            "Aggregated {} observations ({} skipped as malformed)",
            observations.len(),
            skipped
        );
    }

    totals.into_distribution()
}

/// Distribution of a single observation
///
/// Unlike [`aggregate`], a malformed payload is reported to the caller so it
/// can render a placeholder.
pub fn aggregate_one(
    observation: &Observation,
    known_categories: &[String],
    policy: UnknownCategoryPolicy,
) -> Result<Distribution, AnalysisError> {
    let entries = payload::parse(&observation.raw_payload)?;
    let mut totals = Totals::new(known_categories, policy);
    entries.iter().for_each(|entry| totals.add(entry));
    Ok(totals.into_distribution())
}
