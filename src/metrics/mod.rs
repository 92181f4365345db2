//! Overlap quality measures for accepted matches.

pub mod overlap;

pub use overlap::{
    calculate_dice, calculate_m1, calculate_m2, calculate_overlap_scores, OverlapScores,
};
