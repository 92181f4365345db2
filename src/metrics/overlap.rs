//! Area overlap measures between a matched ground truth and reconstruction
//! region.

use serde::{Deserialize, Serialize};

/// Overlap quality of one accepted match.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OverlapScores {
    /// Intersection over union, in percent.
    pub m1: f64,
    /// Intersection over ground truth size, in percent.
    pub m2: f64,
    /// Dice coefficient in [0, 1].
    pub dice: f64,
}

/// Calculate M1, the intersection over union of two regions in percent.
///
/// # Arguments
///
/// * `intersection` - Number of coincident pixels
/// * `gt_size` - Pixel count of the ground truth region
/// * `rec_size` - Pixel count of the reconstruction region
///
/// # Example
///
/// ```
/// use detection_overlap::metrics::overlap::calculate_m1;
///
/// // 25 shared pixels, union 100 + 100 - 25 = 175
/// let m1 = calculate_m1(25, 100, 100);
/// assert!((m1 - 14.285714).abs() < 1e-5);
/// ```
pub fn calculate_m1(intersection: u64, gt_size: u64, rec_size: u64) -> f64 {
    let union = (gt_size + rec_size).saturating_sub(intersection);
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64 * 100.0
}

/// Calculate M2, the share of the ground truth region covered, in percent.
///
/// Only under-segmentation relative to the ground truth lowers M2; a
/// reconstruction spilling over the ground truth still scores 100.
pub fn calculate_m2(intersection: u64, gt_size: u64) -> f64 {
    if gt_size == 0 {
        return 0.0;
    }
    intersection as f64 / gt_size as f64 * 100.0
}

/// Calculate the Dice coefficient `2 * intersection / (gt_size + rec_size)`.
pub fn calculate_dice(intersection: u64, gt_size: u64, rec_size: u64) -> f64 {
    let total = gt_size + rec_size;
    if total == 0 {
        return 0.0;
    }
    2.0 * intersection as f64 / total as f64
}

/// Calculate all three overlap measures for one match.
pub fn calculate_overlap_scores(intersection: u64, gt_size: u64, rec_size: u64) -> OverlapScores {
    OverlapScores {
        m1: calculate_m1(intersection, gt_size, rec_size),
        m2: calculate_m2(intersection, gt_size),
        dice: calculate_dice(intersection, gt_size, rec_size),
    }
}
