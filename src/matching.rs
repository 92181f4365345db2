//! Interpretation of a solved assignment as region matches.

use crate::problem::AssignmentProblem;
use crate::solver::{Solution, SolverError};
use crate::types::{Label, LabelPair};
use log::trace;
use std::collections::BTreeSet;

const BINARY_TOLERANCE: f64 = 1e-6;

/// Accepted matches and unmatched labels of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Matching {
    /// Accepted `(gt, rec)` pairs.
    pub matches: BTreeSet<LabelPair>,
    /// Ground truth labels left unmatched.
    pub false_negatives: BTreeSet<Label>,
    /// Reconstruction labels left unmatched.
    pub false_positives: BTreeSet<Label>,
}

/// Read back the solver's assignment.
///
/// Every variable with value 1 is an accepted match. Ground truth labels not
/// covered by a match become false negatives, reconstruction labels not
/// covered become false positives.
///
/// # Errors
///
/// Returns `SolverError::InvalidSolution` if the solution does not have one
/// 0/1 value per variable, or if it uses a label in more than one match.
pub fn interpret_solution(
    problem: &AssignmentProblem,
    solution: &Solution,
    gt_labels: &BTreeSet<Label>,
    rec_labels: &BTreeSet<Label>,
) -> Result<Matching, SolverError> {
    if solution.len() != problem.num_variables() {
        return Err(SolverError::InvalidSolution(format!(
            "expected {} values, got {}",
            problem.num_variables(),
            solution.len()
        )));
    }

    let mut matched_gt: BTreeSet<Label> = BTreeSet::new();
    let mut matched_rec: BTreeSet<Label> = BTreeSet::new();
    let mut matches: BTreeSet<LabelPair> = BTreeSet::new();

    for (var, &pair) in problem.variables.iter().enumerate() {
        let value = solution[var];
        trace!("solution for pair {}, {} = {}", pair.0, pair.1, value);

        if (value - 1.0).abs() <= BINARY_TOLERANCE {
            if !matched_gt.insert(pair.0) || !matched_rec.insert(pair.1) {
                return Err(SolverError::InvalidSolution(format!(
                    "pair {:?} reuses an already matched label",
                    pair
                )));
            }
            matches.insert(pair);
        } else if value.abs() > BINARY_TOLERANCE {
            return Err(SolverError::InvalidSolution(format!(
                "variable {} has non-binary value {}",
                var, value
            )));
        }
    }

    let false_negatives = gt_labels.difference(&matched_gt).copied().collect();
    let false_positives = rec_labels.difference(&matched_rec).copied().collect();

    Ok(Matching {
        matches,
        false_negatives,
        false_positives,
    })
}
