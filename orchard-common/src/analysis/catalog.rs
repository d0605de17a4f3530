//! Treatment recommendation catalog
//!
//! A fixed category → ordered action list table. Built once (defaults or
//! configuration) and passed by reference; never mutated afterwards. The
//! catalog's declaration order is also the known-category order used for
//! aggregation tie-breaks.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::AnalysisError;

/// Text rendered when a category has no catalog entry
pub const NO_RECOMMENDATION: &str = "No recommendation available";

/// One catalog row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub category: String,
    pub actions: Vec<String>,
}

impl CatalogEntry {
    pub fn new<S: Into<String>>(category: impl Into<String>, actions: impl IntoIterator<Item = S>) -> Self {
        Self {
            category: category.into(),
            actions: actions.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationCatalog {
    categories: Vec<String>,
    actions: HashMap<String, Vec<String>>,
}

impl RecommendationCatalog {
    /// Build a catalog, rejecting blank or duplicate category names
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self, AnalysisError> {
        if entries.is_empty() {
            return Err(AnalysisError::InvalidCatalog("catalog has no categories".into()));
        }

        let mut categories = Vec::with_capacity(entries.len());
        let mut actions = HashMap::with_capacity(entries.len());
        for entry in entries {
            let category = entry.category.trim().to_string();
            if category.is_empty() {
                return Err(AnalysisError::InvalidCatalog("blank category name".into()));
            }
            if actions.contains_key(&category) {
                return Err(AnalysisError::InvalidCatalog(format!(
                    "duplicate category '{}'",
                    category
                )));
            }
            categories.push(category.clone());
            actions.insert(category, entry.actions);
        }

        Ok(Self { categories, actions })
    }

    /// Built-in citrus disease catalog
    pub fn citrus_defaults() -> Self {
        let entries = vec![
            CatalogEntry::new(
                "Citrus leafminer",
                [
                    "Apply neem oil spray.",
                    "Remove and destroy infested leaves.",
                    "Use pheromone traps to monitor infestation.",
                ],
            ),
            CatalogEntry::new(
                "Healthy",
                [
                    "Maintain proper watering.",
                    "Ensure good soil health.",
                    "Regularly inspect for pests or diseases.",
                ],
            ),
            CatalogEntry::new(
                "Red scale",
                [
                    "Use horticultural oil spray.",
                    "Introduce natural predators like ladybugs.",
                    "Prune heavily infested branches.",
                ],
            ),
        ];
        let categories = entries.iter().map(|e| e.category.clone()).collect();
        let actions = entries.into_iter().map(|e| (e.category, e.actions)).collect();
        Self { categories, actions }
    }

    /// Known categories in declaration order
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn contains(&self, category: &str) -> bool {
        self.actions.contains_key(category)
    }

    /// Ordered actions for a category; empty for unknown categories
    pub fn recommend(&self, category: &str) -> &[String] {
        self.actions.get(category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Like [`recommend`](Self::recommend) but reports unknown categories
    pub fn lookup(&self, category: &str) -> Result<&[String], AnalysisError> {
        self.actions
            .get(category)
            .map(Vec::as_slice)
            .ok_or_else(|| AnalysisError::UnknownCategory(category.to_string()))
    }
}

impl Default for RecommendationCatalog {
    fn default() -> Self {
        Self::citrus_defaults()
    }
}

/// Actions as a numbered list (`1. ...`), one per line
pub fn numbered(actions: &[String]) -> Vec<String> {
    actions
        .iter()
        .enumerate()
        .map(|(i, action)| format!("{}. {}", i + 1, action))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_declaration_order() {
        let catalog = RecommendationCatalog::citrus_defaults();
        assert_eq!(catalog.categories(), ["Citrus leafminer", "Healthy", "Red scale"]);
    }

    #[test]
    fn test_healthy_has_three_maintenance_actions() {
        let catalog = RecommendationCatalog::default();
        let actions = catalog.recommend("Healthy");
        assert_eq!(actions.len(), 3);
        assert_eq!(actions[0], "Maintain proper watering.");
    }

    #[test]
    fn test_unknown_category_is_empty_not_missing() {
        let catalog = RecommendationCatalog::default();
        assert!(catalog.recommend("Greening").is_empty());
        assert!(catalog.recommend("healthy").is_empty());
        assert_eq!(
            catalog.lookup("Greening"),
            Err(AnalysisError::UnknownCategory("Greening".into()))
        );
    }

    #[test]
    fn test_custom_catalog_trims_names() {
        let catalog = RecommendationCatalog::new(vec![
            CatalogEntry::new(" Greening ", ["Remove tree."]),
            CatalogEntry::new("Healthy", Vec::<String>::new()),
        ])
        .unwrap();
        assert_eq!(catalog.categories(), ["Greening", "Healthy"]);
        assert_eq!(catalog.recommend("Greening"), ["Remove tree."]);
        assert!(catalog.contains("Healthy"));
    }

    #[test]
    fn test_custom_catalog_rejects_duplicates_and_blanks() {
        let dup = RecommendationCatalog::new(vec![
            CatalogEntry::new("Healthy", ["a"]),
            CatalogEntry::new("Healthy ", ["b"]),
        ]);
        assert!(matches!(dup, Err(AnalysisError::InvalidCatalog(_))));

        let blank = RecommendationCatalog::new(vec![CatalogEntry::new("  ", ["a"])]);
        assert!(matches!(blank, Err(AnalysisError::InvalidCatalog(_))));

        assert!(RecommendationCatalog::new(Vec::new()).is_err());
    }

    #[test]
    fn test_numbered() {
        let lines = numbered(&["Water.".to_string(), "Prune.".to_string()]);
        assert_eq!(lines, vec!["1. Water.", "2. Prune."]);
    }
}
