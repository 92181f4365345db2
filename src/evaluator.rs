//! Main matching pipeline from two label maps to a match report.

use crate::config::MatchingConfig;
use crate::error::Result;
use crate::matching::interpret_solution;
use crate::metrics::overlap::calculate_overlap_scores;
use crate::overlap::{check_dimensions, extract_overlaps};
use crate::problem::build_assignment_problem;
use crate::regions::summarize_regions;
use crate::scoring::score_candidates;
use crate::solver::{KuhnMunkresSolver, LinearSolver};
use crate::types::{LabelGrid, LabelStack, MatchReport};
use log::{debug, trace};

/// Match the regions of a reconstruction against a ground truth.
///
/// Candidate pairs are all label pairs sharing at least one pixel. They are
/// scored by centroid distance and the best one-to-one subset is selected by
/// `solver`, maximizing the number of matches first and minimizing the total
/// centroid distance second. Each accepted match is then scored with M1, M2
/// and Dice.
///
/// # Arguments
///
/// * `ground_truth` - Hand-labeled reference map
/// * `reconstruction` - Predicted map of the same size
/// * `solver` - Backend solving the binary assignment problem
/// * `config` - Scoring constants (default when `None`)
///
/// # Errors
///
/// Returns a usage error for mismatched dimensions, `InvalidConfig` for a
/// rejected configuration, and propagates any solver failure unchanged. No
/// partial report is returned.
pub fn evaluate<G, R, S>(
    ground_truth: &G,
    reconstruction: &R,
    solver: &S,
    config: Option<&MatchingConfig>,
) -> Result<MatchReport>
where
    G: LabelGrid + ?Sized,
    R: LabelGrid + ?Sized,
    S: LinearSolver + ?Sized,
{
    let default_config = MatchingConfig::default();
    let config = config.unwrap_or(&default_config);
    config.validate()?;
    check_dimensions(ground_truth, reconstruction)?;

    let gt_regions = summarize_regions(ground_truth);
    let rec_regions = summarize_regions(reconstruction);

    debug!("there are {} ground truth regions", gt_regions.len());
    debug!("there are {} reconstruction regions", rec_regions.len());

    let overlaps = extract_overlaps(ground_truth, reconstruction)?;

    debug!(
        "ground truth contains {} regions with overlapping reconstruction regions",
        overlaps.gt_to_rec.len()
    );
    debug!(
        "reconstruction contains {} regions with overlapping ground truth regions",
        overlaps.rec_to_gt.len()
    );
    debug!("found {} possible matches by overlap", overlaps.num_pairs());

    let scores = score_candidates(&overlaps, &gt_regions, &rec_regions, config)?;
    let problem = build_assignment_problem(
        &overlaps,
        &scores,
        &gt_regions.labels,
        &rec_regions.labels,
        config,
    )?;

    let solution = solver.solve(&problem.objective, &problem.constraints, &problem.parameters)?;
    let matching = interpret_solution(&problem, &solution, &gt_regions.labels, &rec_regions.labels)?;

    debug!(
        "found {} matches between ground truth and reconstruction",
        matching.matches.len()
    );

    let mut report = MatchReport::new();
    for &label in &matching.false_negatives {
        report.add_false_negative(label);
    }
    for &label in &matching.false_positives {
        report.add_false_positive(label);
    }

    for &pair in &matching.matches {
        let gt_size = gt_regions.size(pair.0).unwrap_or(0);
        let rec_size = rec_regions.size(pair.1).unwrap_or(0);
        let scores = calculate_overlap_scores(overlaps.area(pair), gt_size, rec_size);

        trace!(
            "adding match {:?} with M1 = {}, M2 = {}",
            pair,
            scores.m1,
            scores.m2
        );

        report.add_match(pair, scores.m1, scores.m2, scores.dice);
    }

    Ok(report)
}

/// Match two maps with the default configuration and the bundled
/// Kuhn-Munkres solver.
///
/// # Example
///
/// ```
/// use detection_overlap::evaluator::evaluate_default;
/// use detection_overlap::types::LabelMap;
///
/// let gt = LabelMap::from_rows(vec![vec![1, 1, 0], vec![1, 1, 0]]).unwrap();
/// let rec = LabelMap::from_rows(vec![vec![4, 4, 0], vec![4, 4, 0]]).unwrap();
///
/// let report = evaluate_default(&gt, &rec).unwrap();
/// assert_eq!(report.num_matches(), 1);
/// assert_eq!(report.matches[0].m1, 100.0);
/// ```
pub fn evaluate_default<G, R>(ground_truth: &G, reconstruction: &R) -> Result<MatchReport>
where
    G: LabelGrid + ?Sized,
    R: LabelGrid + ?Sized,
{
    evaluate(ground_truth, reconstruction, &KuhnMunkresSolver::new(), None)
}

/// Match two single-slice stacks.
///
/// # Errors
///
/// Returns `UsageError` unless both stacks hold exactly one slice, before
/// any matching work is done.
pub fn evaluate_stacks<S>(
    ground_truth: &LabelStack,
    reconstruction: &LabelStack,
    solver: &S,
    config: Option<&MatchingConfig>,
) -> Result<MatchReport>
where
    S: LinearSolver + ?Sized,
{
    let gt = ground_truth.single_slice()?;
    let rec = reconstruction.single_slice()?;
    evaluate(gt, rec, solver, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LabelMap;

    #[test]
    fn test_evaluate_basic() {
        let map = LabelMap::from_rows(vec![vec![1, 1], vec![2, 2]]).unwrap();
        let report = evaluate_default(&map, &map).unwrap();
        assert_eq!(report.num_matches(), 2);
        assert!(report.false_negatives.is_empty());
        assert!(report.false_positives.is_empty());
    }

    #[test]
    fn test_invalid_config_rejected_first() {
        let map = LabelMap::filled(2, 2, 1);
        let config = MatchingConfig {
            score_margin: 0.5,
            ..MatchingConfig::default()
        };
        let result = evaluate(&map, &map, &KuhnMunkresSolver::new(), Some(&config));
        assert!(result.is_err());
    }

    #[test]
    fn test_stacks_require_single_slice() {
        let single = LabelStack::from(LabelMap::filled(2, 2, 1));
        let volume = LabelStack::from_volume(2, 2, 2, vec![1; 8]).unwrap();

        let result = evaluate_stacks(&single, &volume, &KuhnMunkresSolver::new(), None);
        assert!(result.unwrap_err().is_usage_error());

        let report = evaluate_stacks(&single, &single, &KuhnMunkresSolver::new(), None).unwrap();
        assert_eq!(report.num_matches(), 1);
    }
}
