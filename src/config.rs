//! Matching configuration and JSON loading.

use crate::error::{OverlapError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Default floor applied to centroid distances.
pub const DEFAULT_MIN_DISTANCE: f64 = 0.5;

/// Default factor applied to the largest distance when shifting scores.
pub const DEFAULT_SCORE_MARGIN: f64 = 1.1;

/// Parameters of one matching run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Lower bound on a pair's centroid distance, keeps every raw cost
    /// strictly positive.
    pub min_distance: f64,
    /// Every score is shifted by `max_distance * score_margin`.
    pub score_margin: f64,
    /// Thread-count hint handed to the solver as is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_threads: Option<usize>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            min_distance: DEFAULT_MIN_DISTANCE,
            score_margin: DEFAULT_SCORE_MARGIN,
            num_threads: None,
        }
    }
}

impl MatchingConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the thread-count hint.
    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    /// Check that the scoring constants keep every score strictly negative.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `min_distance` is not a finite positive
    /// number or `score_margin` is not a finite number above 1.
    pub fn validate(&self) -> Result<()> {
        if !self.min_distance.is_finite() || self.min_distance <= 0.0 {
            return Err(OverlapError::InvalidConfig(format!(
                "min_distance must be positive, got {}",
                self.min_distance
            )));
        }
        if !self.score_margin.is_finite() || self.score_margin <= 1.0 {
            return Err(OverlapError::InvalidConfig(format!(
                "score_margin must be greater than 1, got {}",
                self.score_margin
            )));
        }
        Ok(())
    }
}

/// Load a matching configuration from a JSON file.
///
/// Missing fields take their default values.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed or validated.
///
/// # Example
///
/// ```no_run
/// use detection_overlap::config::load_config_from_file;
///
/// let config = load_config_from_file("matching.json").unwrap();
/// println!("min distance: {}", config.min_distance);
/// ```
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> Result<MatchingConfig> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let config: MatchingConfig = serde_json::from_reader(reader)?;

    config.validate()?;

    Ok(config)
}

/// Load a matching configuration from a JSON string.
///
/// # Example
///
/// ```
/// use detection_overlap::config::load_config_from_str;
///
/// let config = load_config_from_str(r#"{ "num_threads": 4 }"#).unwrap();
/// assert_eq!(config.num_threads, Some(4));
/// assert_eq!(config.min_distance, 0.5);
/// ```
pub fn load_config_from_str(json_str: &str) -> Result<MatchingConfig> {
    let config: MatchingConfig = serde_json::from_str(json_str)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MatchingConfig::default();
        assert_eq!(config.min_distance, 0.5);
        assert_eq!(config.score_margin, 1.1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial() {
        let config = load_config_from_str(r#"{ "score_margin": 1.5 }"#).unwrap();
        assert_eq!(config.score_margin, 1.5);
        assert_eq!(config.min_distance, DEFAULT_MIN_DISTANCE);
        assert_eq!(config.num_threads, None);
    }

    #[test]
    fn test_rejects_margin_at_one() {
        let result = load_config_from_str(r#"{ "score_margin": 1.0 }"#);
        assert!(matches!(result, Err(OverlapError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_zero_floor() {
        let config = MatchingConfig {
            min_distance: 0.0,
            ..MatchingConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_json() {
        let result = load_config_from_str("{ not json");
        assert!(matches!(result, Err(OverlapError::JsonError(_))));
    }
}
