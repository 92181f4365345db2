//! Co-occurrence of ground truth and reconstruction labels.

use crate::error::{OverlapError, Result};
use crate::types::{Label, LabelGrid, LabelPair, BACKGROUND};
use std::collections::{BTreeMap, BTreeSet};

/// Label pairs that share at least one pixel, with their overlap areas.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlaps {
    /// Number of coincident pixels per `(gt, rec)` pair. The keys are the
    /// candidate pairs.
    pub areas: BTreeMap<LabelPair, u64>,
    /// Reconstruction labels overlapping each ground truth label.
    pub gt_to_rec: BTreeMap<Label, BTreeSet<Label>>,
    /// Ground truth labels overlapping each reconstruction label.
    pub rec_to_gt: BTreeMap<Label, BTreeSet<Label>>,
}

impl Overlaps {
    /// Candidate pairs in ascending `(gt, rec)` order.
    pub fn pairs(&self) -> impl Iterator<Item = LabelPair> + '_ {
        self.areas.keys().copied()
    }

    pub fn num_pairs(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// Overlap area of a pair, zero if the pair never co-occurs.
    pub fn area(&self, pair: LabelPair) -> u64 {
        self.areas.get(&pair).copied().unwrap_or(0)
    }
}

/// Scan two aligned label maps in lock-step and collect overlapping pairs.
///
/// Pixels where either map is background are ignored.
///
/// # Errors
///
/// Returns `DimensionMismatch` if the maps differ in width or height.
pub fn extract_overlaps<G, R>(ground_truth: &G, reconstruction: &R) -> Result<Overlaps>
where
    G: LabelGrid + ?Sized,
    R: LabelGrid + ?Sized,
{
    check_dimensions(ground_truth, reconstruction)?;

    let mut overlaps = Overlaps::default();

    for y in 0..ground_truth.height() {
        for x in 0..ground_truth.width() {
            let gt_label = ground_truth.label(x, y);
            let rec_label = reconstruction.label(x, y);

            if gt_label == BACKGROUND || rec_label == BACKGROUND {
                continue;
            }

            *overlaps.areas.entry((gt_label, rec_label)).or_insert(0) += 1;
            overlaps.gt_to_rec.entry(gt_label).or_default().insert(rec_label);
            overlaps.rec_to_gt.entry(rec_label).or_default().insert(gt_label);
        }
    }

    Ok(overlaps)
}

/// Verify that two grids have identical dimensions.
pub fn check_dimensions<G, R>(ground_truth: &G, reconstruction: &R) -> Result<()>
where
    G: LabelGrid + ?Sized,
    R: LabelGrid + ?Sized,
{
    if ground_truth.width() != reconstruction.width()
        || ground_truth.height() != reconstruction.height()
    {
        return Err(OverlapError::DimensionMismatch {
            gt_width: ground_truth.width(),
            gt_height: ground_truth.height(),
            rec_width: reconstruction.width(),
            rec_height: reconstruction.height(),
        });
    }
    Ok(())
}
