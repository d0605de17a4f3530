//! Dominant category resolution

use serde::{Deserialize, Serialize};

use super::{AnalysisError, Distribution};

/// Percentage carried by the "no data" sentinel
///
/// Real percentages are never negative, so this cannot be confused with a
/// genuine 0% reading.
pub const NO_DATA_PERCENTAGE: f64 = -1.0;

/// The category chosen as dominant, with its percentage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DominantEntry {
    pub category: String,
    pub percentage: f64,
}

impl DominantEntry {
    /// Sentinel for a distribution with nothing to rank
    pub fn no_data() -> Self {
        Self {
            category: String::new(),
            percentage: NO_DATA_PERCENTAGE,
        }
    }

    /// Must be checked before using `category` as a catalog key
    pub fn is_no_data(&self) -> bool {
        self.category.is_empty() || self.percentage < 0.0
    }

    /// Turn the sentinel into [`AnalysisError::EmptyDistribution`]
    pub fn require(self) -> Result<Self, AnalysisError> {
        if self.is_no_data() {
            Err(AnalysisError::EmptyDistribution)
        } else {
            Ok(self)
        }
    }

    /// `None` for the sentinel
    pub fn into_option(self) -> Option<Self> {
        self.require().ok()
    }
}

/// Pick the dominant entry: first strictly-greater maximum in distribution order
///
/// A linear scan, not a sort, so ties always go to the earlier entry.
/// Distributions without data (no entries, or a zero total) resolve to
/// [`DominantEntry::no_data`].
pub fn resolve(distribution: &Distribution) -> DominantEntry {
    if !distribution.has_data() {
        return DominantEntry::no_data();
    }

    let mut best: Option<(&str, f64)> = None;
    let mut max = f64::NEG_INFINITY;
    for share in distribution.iter() {
        if share.percentage > max {
            max = share.percentage;
            best = Some((share.category.as_str(), share.percentage));
        }
    }

    match best {
        Some((category, percentage)) => DominantEntry {
            category: category.to_string(),
            percentage,
        },
        None => DominantEntry::no_data(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tie_goes_to_earlier_category() {
        let d = Distribution::from_shares([("A", 50.0), ("B", 50.0)]);
        let dominant = resolve(&d);
        assert_eq!(dominant.category, "A");
        assert_eq!(dominant.percentage, 50.0);
    }

    #[test]
    fn test_later_strictly_greater_wins() {
        let d = Distribution::from_shares([("A", 10.0), ("B", 30.0), ("C", 30.0)]);
        assert_eq!(resolve(&d).category, "B");
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let d = Distribution::from_shares([("Healthy", 80.0), ("Red scale", 20.0)]);
        assert_eq!(resolve(&d), resolve(&d));
    }

    #[test]
    fn test_empty_distribution_is_sentinel() {
        let dominant = resolve(&Distribution::default());
        assert!(dominant.is_no_data());
        assert_eq!(dominant.category, "");
        assert_eq!(dominant.percentage, NO_DATA_PERCENTAGE);
    }

    #[test]
    fn test_all_zero_distribution_is_sentinel() {
        let d = Distribution::from_shares([("A", 0.0), ("B", 0.0)]);
        assert!(resolve(&d).is_no_data());
    }

    #[test]
    fn test_require_surfaces_empty_distribution() {
        assert_eq!(
            DominantEntry::no_data().require(),
            Err(AnalysisError::EmptyDistribution)
        );
        let real = DominantEntry {
            category: "Healthy".into(),
            percentage: 0.0,
        };
        assert!(!real.is_no_data());
        assert_eq!(real.clone().into_option(), Some(real));
    }
}
