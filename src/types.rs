//! Core data types: label maps, region geometry and the match report.

use crate::error::{OverlapError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Region identifier within one label map. `0` is background.
pub type Label = u64;

/// The background label, excluded from every region-level computation.
pub const BACKGROUND: Label = 0;

/// A `(ground truth label, reconstruction label)` pair.
pub type LabelPair = (Label, Label);

/// Read access to a 2D grid of labels.
///
/// This is all the matching pipeline needs from an image container, so any
/// external array type can take part by implementing it.
pub trait LabelGrid {
    /// Number of columns.
    fn width(&self) -> usize;

    /// Number of rows.
    fn height(&self) -> usize;

    /// Label at column `x`, row `y`. Callers stay within bounds.
    fn label(&self, x: usize, y: usize) -> Label;
}

/// An owned, row-major 2D label map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    width: usize,
    height: usize,
    data: Vec<Label>,
}

impl LabelMap {
    /// Create a label map from row-major data.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLabelMap` if `data.len() != width * height`.
    pub fn new(width: usize, height: usize, data: Vec<Label>) -> Result<Self> {
        let expected = width.checked_mul(height).ok_or_else(|| {
            OverlapError::InvalidLabelMap(format!("{}x{} overflows", width, height))
        })?;
        if data.len() != expected {
            return Err(OverlapError::InvalidLabelMap(format!(
                "Expected {} values for a {}x{} map, got {}",
                expected,
                width,
                height,
                data.len()
            )));
        }
        Ok(Self { width, height, data })
    }

    /// Create a map where every pixel carries `label`.
    pub fn filled(width: usize, height: usize, label: Label) -> Self {
        Self {
            width,
            height,
            data: vec![label; width * height],
        }
    }

    /// Create a map from a list of rows.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLabelMap` if the rows differ in length.
    ///
    /// # Example
    ///
    /// ```
    /// use detection_overlap::types::{LabelGrid, LabelMap};
    ///
    /// let map = LabelMap::from_rows(vec![vec![0, 1], vec![2, 2]]).unwrap();
    /// assert_eq!(map.width(), 2);
    /// assert_eq!(map.label(0, 1), 2);
    /// ```
    pub fn from_rows(rows: Vec<Vec<Label>>) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);

        let mut data = Vec::with_capacity(width * height);
        for (y, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(OverlapError::InvalidLabelMap(format!(
                    "Row {} has {} values, expected {}",
                    y,
                    row.len(),
                    width
                )));
            }
            data.extend(row);
        }

        Ok(Self { width, height, data })
    }

    /// Set the label at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is out of bounds.
    pub fn set(&mut self, x: usize, y: usize, label: Label) {
        assert!(x < self.width && y < self.height, "({}, {}) out of bounds", x, y);
        self.data[y * self.width + x] = label;
    }

    /// Row-major label values.
    pub fn as_slice(&self) -> &[Label] {
        &self.data
    }
}

impl LabelGrid for LabelMap {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn label(&self, x: usize, y: usize) -> Label {
        self.data[y * self.width + x]
    }
}

/// An ordered stack of equally-sized label maps (z-slices).
///
/// Host bindings deliver either a 2D array or a 3D volume; both become a
/// stack, and matching only proceeds on single-slice stacks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabelStack {
    slices: Vec<LabelMap>,
}

impl LabelStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a stack from a row-major `depth x height x width` volume.
    pub fn from_volume(depth: usize, height: usize, width: usize, data: Vec<Label>) -> Result<Self> {
        let slice_len = width * height;
        if data.len() != depth * slice_len {
            return Err(OverlapError::InvalidLabelMap(format!(
                "Expected {} values for a {}x{}x{} volume, got {}",
                depth * slice_len,
                depth,
                height,
                width,
                data.len()
            )));
        }

        let mut stack = Self::new();
        for z in 0..depth {
            let slice = data[z * slice_len..(z + 1) * slice_len].to_vec();
            stack.push(LabelMap::new(width, height, slice)?)?;
        }
        Ok(stack)
    }

    /// Append a slice. All slices must share the first slice's dimensions.
    pub fn push(&mut self, slice: LabelMap) -> Result<()> {
        if let Some(first) = self.slices.first() {
            if first.width() != slice.width() || first.height() != slice.height() {
                return Err(OverlapError::InvalidLabelMap(format!(
                    "Slice is {}x{}, stack is {}x{}",
                    slice.width(),
                    slice.height(),
                    first.width(),
                    first.height()
                )));
            }
        }
        self.slices.push(slice);
        Ok(())
    }

    /// Number of slices.
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    /// Whether the stack holds no slices.
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// The slices in z order.
    pub fn slices(&self) -> &[LabelMap] {
        &self.slices
    }

    /// The only slice of this stack.
    ///
    /// # Errors
    ///
    /// Returns `UsageError` unless the stack holds exactly one slice.
    pub fn single_slice(&self) -> Result<&LabelMap> {
        match self.slices.as_slice() {
            [slice] => Ok(slice),
            _ => Err(OverlapError::UsageError(format!(
                "Detection overlap only accepts single 2D images, got {} slices",
                self.slices.len()
            ))),
        }
    }
}

impl From<LabelMap> for LabelStack {
    fn from(map: LabelMap) -> Self {
        Self { slices: vec![map] }
    }
}

/// A 2D point in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// One accepted match with its overlap quality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub gt_label: Label,
    pub rec_label: Label,
    /// 100 * intersection / union
    pub m1: f64,
    /// 100 * intersection / ground truth size
    pub m2: f64,
    pub dice: f64,
}

/// Result of matching one ground truth map against one reconstruction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    /// Ground truth labels without an accepted match.
    pub false_negatives: BTreeSet<Label>,
    /// Reconstruction labels without an accepted match.
    pub false_positives: BTreeSet<Label>,
    /// Accepted matches, ordered by `(gt_label, rec_label)`.
    pub matches: Vec<MatchRecord>,
}

impl MatchReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_false_negative(&mut self, gt_label: Label) {
        self.false_negatives.insert(gt_label);
    }

    pub fn add_false_positive(&mut self, rec_label: Label) {
        self.false_positives.insert(rec_label);
    }

    pub fn add_match(&mut self, pair: LabelPair, m1: f64, m2: f64, dice: f64) {
        self.matches.push(MatchRecord {
            gt_label: pair.0,
            rec_label: pair.1,
            m1,
            m2,
            dice,
        });
    }

    pub fn num_matches(&self) -> usize {
        self.matches.len()
    }

    pub fn num_false_negatives(&self) -> usize {
        self.false_negatives.len()
    }

    pub fn num_false_positives(&self) -> usize {
        self.false_positives.len()
    }

    /// The match accepted for `gt_label`, if any.
    pub fn match_for_ground_truth(&self, gt_label: Label) -> Option<&MatchRecord> {
        self.matches.iter().find(|m| m.gt_label == gt_label)
    }

    /// Column names of the per-match table, in record field order.
    pub fn column_names() -> &'static [&'static str] {
        &["gt_label", "rec_label", "m1", "m2", "dice"]
    }

    /// Serialize the report to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
