//! Aggregate statistics over a match report
//!
//! This module condenses a `MatchReport` into the handful of numbers a
//! report aggregator prints next to its other metrics.

use crate::types::{MatchRecord, MatchReport};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Summary of one matching run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Number of accepted matches
    pub num_matches: usize,

    /// Number of unmatched ground truth regions
    pub num_false_negatives: usize,

    /// Number of unmatched reconstruction regions
    pub num_false_positives: usize,

    /// Mean M1 over all matches, 0 without matches
    pub mean_m1: f64,

    /// Mean M2 over all matches, 0 without matches
    pub mean_m2: f64,

    /// Mean Dice over all matches, 0 without matches
    pub mean_dice: f64,
}

impl ReportSummary {
    /// Summarize a report
    pub fn from_report(report: &MatchReport) -> Self {
        let n = report.num_matches();
        let mean = |f: fn(&MatchRecord) -> f64| {
            if n == 0 {
                0.0
            } else {
                report.matches.iter().map(f).sum::<f64>() / n as f64
            }
        };

        Self {
            num_matches: n,
            num_false_negatives: report.num_false_negatives(),
            num_false_positives: report.num_false_positives(),
            mean_m1: mean(|m| m.m1),
            mean_m2: mean(|m| m.m2),
            mean_dice: mean(|m| m.dice),
        }
    }

    /// Number of ground truth regions seen
    pub fn num_ground_truth(&self) -> usize {
        self.num_matches + self.num_false_negatives
    }

    /// Number of reconstruction regions seen
    pub fn num_reconstruction(&self) -> usize {
        self.num_matches + self.num_false_positives
    }

    /// Get a formatted string summary of the statistics
    pub fn summary_string(&self) -> String {
        format!(
            "ReportSummary {{ matches: {}, fn: {}, fp: {}, m1: {:.2}, m2: {:.2}, dice: {:.4} }}",
            self.num_matches,
            self.num_false_negatives,
            self.num_false_positives,
            self.mean_m1,
            self.mean_m2,
            self.mean_dice
        )
    }
}

impl fmt::Display for ReportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Detection Overlap ===")?;
        writeln!(f, "Matches: {}", self.num_matches)?;
        writeln!(f, "False negatives: {}", self.num_false_negatives)?;
        writeln!(f, "False positives: {}", self.num_false_positives)?;
        writeln!(f, "Mean M1: {:.2}", self.mean_m1)?;
        writeln!(f, "Mean M2: {:.2}", self.mean_m2)?;
        write!(f, "Mean Dice: {:.4}", self.mean_dice)
    }
}
