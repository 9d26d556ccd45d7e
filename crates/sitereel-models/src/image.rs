//! Image candidate and acquisition types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// An unvalidated image reference found on a page.
///
/// Identity is the resolved absolute URL; candidates with the same URL are
/// deduplicated with first-seen metadata winning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageCandidate {
    pub url: String,
    #[serde(default)]
    pub alt_text: String,
    #[serde(default)]
    pub title: String,
}

impl ImageCandidate {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            alt_text: String::new(),
            title: String::new(),
        }
    }
}

/// Quality thresholds applied before an image candidate is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Minimum width in pixels
    pub min_width: u32,
    /// Minimum height in pixels
    pub min_height: u32,
    /// Minimum file size in bytes
    pub min_filesize: u64,
    /// Maximum file size in bytes
    pub max_filesize: u64,
    /// Minimum pixel-value standard deviation (rejects near-blank images)
    pub variance_threshold: f64,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            min_width: 200,
            min_height: 200,
            min_filesize: 5_000,
            max_filesize: 10_000_000,
            variance_threshold: 20.0,
        }
    }
}

/// An image that passed every filter stage and was written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquiredImage {
    pub source_url: String,
    pub saved_path: PathBuf,
    pub alt_text: String,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_criteria_defaults() {
        let criteria = FilterCriteria::default();
        assert_eq!(criteria.min_width, 200);
        assert_eq!(criteria.min_height, 200);
        assert_eq!(criteria.min_filesize, 5_000);
        assert_eq!(criteria.max_filesize, 10_000_000);
        assert!((criteria.variance_threshold - 20.0).abs() < f64::EPSILON);
    }
}
