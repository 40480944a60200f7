//! In-memory sentence dataset
//!
//! Built once at startup by [`DatasetLoader`] and shared read-only between
//! request handlers.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tacit_common::labels::CategoryTarget;
use tacit_common::CategoryGroup;

mod loader;
pub use loader::DatasetLoader;

/// Placeholder reported when provenance is missing
pub const UNKNOWN_ESSAY: &str = "Unknown";

/// One labeled sentence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub sentence: String,
    /// Normalized labels, sentinel removed; empty for Class0 rows
    pub labels: Vec<String>,
    pub category_group: CategoryGroup,
    pub essay_id: Option<String>,
}

impl Row {
    /// Build a row, deriving the category group from `labels`
    pub fn new(sentence: impl Into<String>, labels: Vec<String>, essay_id: Option<String>) -> Self {
        let category_group = CategoryGroup::from_labels(&labels);
        Self {
            sentence: sentence.into(),
            labels,
            category_group,
            essay_id,
        }
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Stratum membership: the sentinel matches Class0 rows, any other
    /// category matches rows carrying that label
    pub fn matches(&self, target: &CategoryTarget) -> bool {
        if target.is_sentinel() {
            self.category_group == CategoryGroup::Class0
        } else {
            self.has_label(&target.name)
        }
    }

    pub fn essay_id_or_unknown(&self) -> &str {
        self.essay_id.as_deref().unwrap_or(UNKNOWN_ESSAY)
    }
}

/// Essay total reported by `/stats`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EssayTotal {
    Count(usize),
    Unknown(String),
}

/// Aggregate counts over the whole dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetStats {
    pub total_sentences: usize,
    pub total_essays: EssayTotal,
    pub category_counts: BTreeMap<String, usize>,
}

/// Immutable ordered collection of rows
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    rows: Vec<Row>,
}

impl Dataset {
    /// Wrap rows, dropping any with a blank sentence
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let rows = rows
            .into_iter()
            .filter(|row| !row.sentence.trim().is_empty())
            .collect();
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    /// Distinct labels in first-seen order
    pub fn observed_labels(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut labels = Vec::new();
        for label in self.rows.iter().flat_map(|row| row.labels.iter()) {
            if seen.insert(label.as_str()) {
                labels.push(label.as_str());
            }
        }
        labels
    }

    /// Scan the dataset once
    ///
    /// Every category in `categories` is reported, even with a zero count,
    /// alongside every observed label.
    pub fn stats<'a, I>(&self, categories: I) -> DatasetStats
    where
        I: IntoIterator<Item = &'a CategoryTarget>,
    {
        let mut category_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut listed: HashSet<&str> = HashSet::new();
        for target in categories {
            let count = self.rows.iter().filter(|row| row.matches(target)).count();
            category_counts.insert(target.name.clone(), count);
            listed.insert(target.name.as_str());
        }

        for label in self.rows.iter().flat_map(|row| row.labels.iter()) {
            if !listed.contains(label.as_str()) {
                *category_counts.entry(label.clone()).or_insert(0) += 1;
            }
        }

        let essays: HashSet<&str> = self
            .rows
            .iter()
            .filter_map(|row| row.essay_id.as_deref())
            .collect();
        let total_essays = if essays.is_empty() {
            EssayTotal::Unknown(UNKNOWN_ESSAY.to_string())
        } else {
            EssayTotal::Count(essays.len())
        };

        DatasetStats {
            total_sentences: self.rows.len(),
            total_essays,
            category_counts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tacit_common::CategoryDistribution;

    fn row(sentence: &str, labels: &[&str], essay: Option<&str>) -> Row {
        Row::new(
            sentence,
            labels.iter().map(|l| l.to_string()).collect(),
            essay.map(str::to_string),
        )
    }

    #[test]
    fn test_from_rows_drops_blank_sentences() {
        let dataset = Dataset::from_rows(vec![
            row("kept", &[], None),
            row("   ", &["Social"], None),
        ]);
        assert_eq!(dataset.len(), 1);
        assert!(dataset.iter().all(|r| !r.sentence.is_empty()));
    }

    #[test]
    fn test_row_matches_sentinel_and_labels() {
        let dist = CategoryDistribution::new([("Class0", 10.0), ("Social", 10.0)]).unwrap();
        let targets: Vec<_> = dist.iter().collect();

        let unlabeled = row("none", &[], None);
        let social = row("social", &["Social"], None);

        assert!(unlabeled.matches(targets[0]));
        assert!(!unlabeled.matches(targets[1]));
        assert!(!social.matches(targets[0]));
        assert!(social.matches(targets[1]));
    }

    #[test]
    fn test_stats_counts_categories_and_essays() {
        let dataset = Dataset::from_rows(vec![
            row("a", &["Familial", "Spiritual"], Some("e1")),
            row("b", &["Familial"], Some("e1")),
            row("c", &[], Some("e2")),
            row("d", &["Linguistic"], None),
        ]);
        let dist = CategoryDistribution::new([
            ("Class0", 20.0),
            ("Familial", 40.0),
            ("Resistance", 3.0),
        ])
        .unwrap();

        let stats = dataset.stats(dist.iter());

        assert_eq!(stats.total_sentences, 4);
        assert_eq!(stats.total_essays, EssayTotal::Count(2));
        assert_eq!(stats.category_counts["Class0"], 1);
        assert_eq!(stats.category_counts["Familial"], 2);
        assert_eq!(stats.category_counts["Resistance"], 0);
        assert_eq!(stats.category_counts["Spiritual"], 1);
        assert_eq!(stats.category_counts["Linguistic"], 1);
    }

    #[test]
    fn test_stats_without_essay_ids_reports_unknown() {
        let dataset = Dataset::from_rows(vec![row("a", &[], None)]);
        let stats = dataset.stats(CategoryDistribution::cct_default().iter());

        assert_eq!(stats.total_essays, EssayTotal::Unknown("Unknown".to_string()));
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["total_essays"], "Unknown");
    }

    #[test]
    fn test_observed_labels_first_seen_order() {
        let dataset = Dataset::from_rows(vec![
            row("a", &["Social", "Familial"], None),
            row("b", &["Familial", "Aspirational"], None),
        ]);
        assert_eq!(
            dataset.observed_labels(),
            vec!["Social", "Familial", "Aspirational"]
        );
    }
}
