//! # detection-overlap
//!
//! A Rust library for grading segmentation and detection results against a
//! hand-labeled ground truth by matching regions of two label maps.
//!
//! Labels are arbitrary per-map identifiers, so regions cannot be paired by
//! label value. Instead, every pair of regions sharing at least one pixel is a
//! candidate, and the best one-to-one subset of candidates is selected by
//! solving a binary assignment problem:
//!
//! - **Region summary**: pixel count and centroid of every labeled region
//! - **Overlaps**: co-occurring label pairs and their shared area
//! - **Scoring**: centroid distance per pair, shifted to strictly negative scores
//! - **Assignment**: "each region matches at most one other" as linear constraints
//! - **Solving**: any [`LinearSolver`], with a bundled Kuhn-Munkres backend
//! - **Report**: matches with M1, M2 and Dice, plus false negatives and false positives
//!
//! ## Quick Start
//!
//! ```rust
//! use detection_overlap::evaluator::evaluate_default;
//! use detection_overlap::types::LabelMap;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let ground_truth = LabelMap::from_rows(vec![
//!     vec![1, 1, 0, 2],
//!     vec![1, 1, 0, 2],
//! ])?;
//! let reconstruction = LabelMap::from_rows(vec![
//!     vec![9, 9, 0, 0],
//!     vec![9, 9, 0, 0],
//! ])?;
//!
//! let report = evaluate_default(&ground_truth, &reconstruction)?;
//! assert_eq!(report.num_matches(), 1);
//! assert!(report.false_negatives.contains(&2));
//! # Ok(())
//! # }
//! ```
//!
//! ## Label maps
//!
//! Any container implementing [`LabelGrid`] can be matched. Label `0` is
//! background and never forms a region.

pub mod config;
pub mod error;
pub mod evaluator;
pub mod matching;
pub mod metrics;
pub mod overlap;
pub mod problem;
pub mod regions;
pub mod scoring;
pub mod solver;
pub mod stats;
pub mod types;

// Re-export commonly used types and functions
pub use config::{load_config_from_file, load_config_from_str, MatchingConfig};
pub use error::{OverlapError, Result};
pub use evaluator::{evaluate, evaluate_default, evaluate_stacks};
pub use solver::{KuhnMunkresSolver, LinearSolver, Solution, SolverError};
pub use stats::ReportSummary;
pub use types::{
    Label, LabelGrid, LabelMap, LabelPair, LabelStack, MatchRecord, MatchReport, Point, BACKGROUND,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_compiles() {
        // Basic smoke test to ensure the library compiles
        let map = LabelMap::filled(2, 2, BACKGROUND);
        assert!(evaluate_default(&map, &map).unwrap().matches.is_empty());
    }
}
