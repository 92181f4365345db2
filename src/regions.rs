//! Per-region pixel counts and centroids.

use crate::types::{Label, LabelGrid, Point, BACKGROUND};
use std::collections::{BTreeMap, BTreeSet};

/// Size and center of mass of every labeled region in one map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionSummary {
    /// Pixel count per label.
    pub sizes: BTreeMap<Label, u64>,
    /// Mean pixel coordinate per label.
    pub centers: BTreeMap<Label, Point>,
    /// All non-background labels.
    pub labels: BTreeSet<Label>,
}

impl RegionSummary {
    /// Number of regions.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn size(&self, label: Label) -> Option<u64> {
        self.sizes.get(&label).copied()
    }

    pub fn center(&self, label: Label) -> Option<Point> {
        self.centers.get(&label).copied()
    }
}

/// Scan a label map once and summarize its regions.
///
/// Background pixels are skipped. A map without labeled pixels yields an
/// empty summary.
///
/// # Example
///
/// ```
/// use detection_overlap::regions::summarize_regions;
/// use detection_overlap::types::LabelMap;
///
/// let map = LabelMap::from_rows(vec![vec![1, 1], vec![0, 2]]).unwrap();
/// let summary = summarize_regions(&map);
/// assert_eq!(summary.size(1), Some(2));
/// assert_eq!(summary.center(1).unwrap().x, 0.5);
/// ```
pub fn summarize_regions<G: LabelGrid + ?Sized>(grid: &G) -> RegionSummary {
    let mut sizes: BTreeMap<Label, u64> = BTreeMap::new();
    let mut sums: BTreeMap<Label, (f64, f64)> = BTreeMap::new();

    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let label = grid.label(x, y);
            if label == BACKGROUND {
                continue;
            }

            *sizes.entry(label).or_insert(0) += 1;
            let sum = sums.entry(label).or_insert((0.0, 0.0));
            sum.0 += x as f64;
            sum.1 += y as f64;
        }
    }

    let centers = sums
        .into_iter()
        .map(|(label, (sx, sy))| {
            let n = sizes[&label] as f64;
            (label, Point::new(sx / n, sy / n))
        })
        .collect();
    let labels = sizes.keys().copied().collect();

    RegionSummary {
        sizes,
        centers,
        labels,
    }
}
