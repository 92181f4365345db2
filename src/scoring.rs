//! Matching scores for candidate pairs.

use crate::config::MatchingConfig;
use crate::error::{OverlapError, Result};
use crate::overlap::Overlaps;
use crate::regions::RegionSummary;
use crate::types::LabelPair;
use std::collections::BTreeMap;

/// Score of every candidate pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateScores {
    /// Shifted score per pair. Always strictly negative.
    pub scores: BTreeMap<LabelPair, f64>,
    /// Largest floored centroid distance among all pairs (0 without pairs).
    pub max_distance: f64,
}

impl CandidateScores {
    pub fn score(&self, pair: LabelPair) -> Option<f64> {
        self.scores.get(&pair).copied()
    }
}

/// Floored centroid distance between the two regions of a pair.
pub fn raw_cost(
    pair: LabelPair,
    gt_regions: &RegionSummary,
    rec_regions: &RegionSummary,
    min_distance: f64,
) -> Result<f64> {
    let gt_center = gt_regions.center(pair.0).ok_or_else(|| {
        OverlapError::MissingRegion(format!("ground truth label {} has no centroid", pair.0))
    })?;
    let rec_center = rec_regions.center(pair.1).ok_or_else(|| {
        OverlapError::MissingRegion(format!("reconstruction label {} has no centroid", pair.1))
    })?;

    Ok(gt_center.distance(&rec_center).max(min_distance))
}

/// Score each candidate pair by centroid distance.
///
/// The raw cost of a pair is its centroid distance, floored at
/// `config.min_distance`. Every cost is then shifted by
/// `max_distance * config.score_margin`, so all scores end up strictly
/// negative: minimizing their sum prefers more matches first and closer
/// centroids second.
///
/// # Errors
///
/// Returns `MissingRegion` if a pair refers to a label absent from the
/// region summaries.
pub fn score_candidates(
    overlaps: &Overlaps,
    gt_regions: &RegionSummary,
    rec_regions: &RegionSummary,
    config: &MatchingConfig,
) -> Result<CandidateScores> {
    let mut scores = BTreeMap::new();
    let mut max_distance: f64 = 0.0;

    for pair in overlaps.pairs() {
        let cost = raw_cost(pair, gt_regions, rec_regions, config.min_distance)?;
        scores.insert(pair, cost);
        max_distance = max_distance.max(cost);
    }

    let shift = max_distance * config.score_margin;
    for score in scores.values_mut() {
        *score -= shift;
    }

    Ok(CandidateScores {
        scores,
        max_distance,
    })
}
