//! Record filter configuration.

use serde::Deserialize;

/// Inclusion and exclusion rules applied by the router.
///
/// Empty allow-lists mean "no restriction".
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    /// Category allow-list, matched against the category id or name.
    #[serde(default)]
    pub categories: Vec<String>,
    /// Keyword allow-list; at least one must appear in title or body.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Keyword deny-list; any hit rejects the record.
    #[serde(default)]
    pub exclude_keywords: Vec<String>,
    /// Records with a shorter title are rejected as invalid.
    #[serde(default = "default_min_title_length")]
    pub min_title_length: usize,
}

const fn default_min_title_length() -> usize {
    5
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            keywords: Vec::new(),
            exclude_keywords: Vec::new(),
            min_title_length: default_min_title_length(),
        }
    }
}
