//! CCT label parsing and category distributions
//!
//! Raw label cells look like `"Familial, Spiritual"`. They are split into
//! trimmed, de-duplicated tokens with the "no applicable label" sentinel
//! removed; a row left without labels belongs to the [`CategoryGroup::Class0`]
//! group.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Name of the "no applicable label" category
pub const SENTINEL_CATEGORY: &str = "Class0";

/// Coarse grouping derived from a row's labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoryGroup {
    /// No CCT label applies
    #[serde(rename = "Class0")]
    Class0,
    /// At least one CCT label applies
    #[serde(rename = "CCT")]
    Cct,
}

impl CategoryGroup {
    /// Derive the group from an already-normalized label list
    pub fn from_labels(labels: &[String]) -> Self {
        if labels.is_empty() {
            CategoryGroup::Class0
        } else {
            CategoryGroup::Cct
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryGroup::Class0 => "Class0",
            CategoryGroup::Cct => "CCT",
        }
    }
}

/// True when `token` spells the sentinel category
///
/// Accepts `Class0`, `Class 0`, `0` and `none` in any case.
pub fn is_sentinel(token: &str) -> bool {
    let compact: String = token
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    matches!(compact.as_str(), "class0" | "0" | "none")
}

/// Split a raw comma-separated label cell into normalized tokens
///
/// Empty tokens, NaN markers and sentinel tokens are dropped. Order of first
/// occurrence is preserved.
pub fn parse_labels(raw: &str) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for token in raw.split(',') {
        let token = token.trim();
        if token.is_empty() || token.eq_ignore_ascii_case("nan") || is_sentinel(token) {
            continue;
        }
        if !labels.iter().any(|existing| existing == token) {
            labels.push(token.to_string());
        }
    }
    labels
}

/// Join labels the way the front-end displays them (`"a, b, c"`)
pub fn join_labels(labels: &[String]) -> String {
    labels.join(", ")
}

/// Target percentage for a single category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTarget {
    pub name: String,
    pub percent: f64,
}

impl CategoryTarget {
    pub fn is_sentinel(&self) -> bool {
        self.name == SENTINEL_CATEGORY
    }

    /// Number of rows this category contributes to one stratified pool
    ///
    /// `percent` is a share of the whole dataset, floored, but never below one
    /// row so rare categories cannot vanish from small datasets.
    pub fn target_size(&self, total_rows: usize) -> usize {
        let share = (self.percent / 100.0) * total_rows as f64;
        (share.floor() as usize).max(1)
    }
}

/// Ordered mapping from category name to target percentage
///
/// Iteration follows insertion order, which keeps seeded sampling
/// reproducible. Percentages are independent and need not sum to 100.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CategoryDistribution {
    targets: Vec<CategoryTarget>,
}

impl CategoryDistribution {
    /// Build a distribution, validating names and percentages
    ///
    /// Sentinel spellings (`Class 0`, `none`, ...) are normalized to
    /// [`SENTINEL_CATEGORY`].
    pub fn new<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut targets: Vec<CategoryTarget> = Vec::new();
        for (name, percent) in entries {
            let name = name.into();
            let name = if is_sentinel(&name) {
                SENTINEL_CATEGORY.to_string()
            } else {
                name.trim().to_string()
            };

            if name.is_empty() {
                return Err(Error::Config("Category name must not be empty".to_string()));
            }
            if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
                return Err(Error::Config(format!(
                    "Category '{}' has invalid percentage {} (expected 0-100)",
                    name, percent
                )));
            }
            if targets.iter().any(|t| t.name == name) {
                return Err(Error::Config(format!("Duplicate category '{}'", name)));
            }

            targets.push(CategoryTarget { name, percent });
        }
        Ok(Self { targets })
    }

    /// Default twelve-category CCT distribution used by the annotation tool
    pub fn cct_default() -> Self {
        let targets = [
            (SENTINEL_CATEGORY, 20.0),
            ("Aspirational", 12.0),
            ("Attainment", 10.0),
            ("Navigational", 10.0),
            ("Familial", 10.0),
            ("Perseverant", 8.0),
            ("Social", 8.0),
            ("Community", 6.0),
            ("Filial Piety", 5.0),
            ("First Gen", 5.0),
            ("Resistance", 3.0),
            ("Spiritual", 3.0),
        ]
        .into_iter()
        .map(|(name, percent)| CategoryTarget {
            name: name.to_string(),
            percent,
        })
        .collect();
        Self { targets }
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryTarget> {
        self.targets.iter()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&CategoryTarget> {
        self.targets.iter().find(|t| t.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.targets.iter().map(|t| t.name.as_str())
    }
}
