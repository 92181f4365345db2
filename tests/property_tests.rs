//! Property-based tests using proptest
//!
//! These tests verify invariants of the matching pipeline that should hold
//! for any pair of label maps.

use detection_overlap::config::MatchingConfig;
use detection_overlap::evaluator::evaluate_default;
use detection_overlap::metrics::calculate_overlap_scores;
use detection_overlap::overlap::extract_overlaps;
use detection_overlap::problem::build_assignment_problem;
use detection_overlap::regions::summarize_regions;
use detection_overlap::scoring::{raw_cost, score_candidates};
use detection_overlap::solver::{KuhnMunkresSolver, LinearSolver};
use detection_overlap::types::{Label, LabelMap};
use proptest::prelude::*;
use std::collections::BTreeSet;

const SIDE: usize = 6;

fn label_map() -> impl Strategy<Value = LabelMap> {
    prop::collection::vec(0u64..5, SIDE * SIDE)
        .prop_map(|data| LabelMap::new(SIDE, SIDE, data).unwrap())
}

/// Best objective over all one-to-one subsets of candidate pairs.
fn brute_force_best(
    gt_labels: &[Label],
    candidates: &dyn Fn(Label, Label) -> Option<f64>,
    rec_labels: &[Label],
    used: &mut BTreeSet<Label>,
) -> f64 {
    let Some((&gt, rest)) = gt_labels.split_first() else {
        return 0.0;
    };

    // leave this ground truth label unmatched
    let mut best = brute_force_best(rest, candidates, rec_labels, used);

    for &rec in rec_labels {
        if used.contains(&rec) {
            continue;
        }
        if let Some(score) = candidates(gt, rec) {
            used.insert(rec);
            let total = score + brute_force_best(rest, candidates, rec_labels, used);
            used.remove(&rec);
            best = best.min(total);
        }
    }

    best
}

// Property: every label is used by at most one match and classified exactly once
proptest! {
    #[test]
    fn prop_degree_and_completeness(gt in label_map(), rec in label_map()) {
        let report = evaluate_default(&gt, &rec).unwrap();
        let gt_labels = summarize_regions(&gt).labels;
        let rec_labels = summarize_regions(&rec).labels;

        let matched_gt: Vec<Label> = report.matches.iter().map(|m| m.gt_label).collect();
        let matched_rec: Vec<Label> = report.matches.iter().map(|m| m.rec_label).collect();
        let matched_gt_set: BTreeSet<Label> = matched_gt.iter().copied().collect();
        let matched_rec_set: BTreeSet<Label> = matched_rec.iter().copied().collect();

        prop_assert_eq!(matched_gt.len(), matched_gt_set.len());
        prop_assert_eq!(matched_rec.len(), matched_rec_set.len());

        prop_assert!(matched_gt_set.is_disjoint(&report.false_negatives));
        prop_assert!(matched_rec_set.is_disjoint(&report.false_positives));

        let all_gt: BTreeSet<Label> = matched_gt_set.union(&report.false_negatives).copied().collect();
        let all_rec: BTreeSet<Label> = matched_rec_set.union(&report.false_positives).copied().collect();
        prop_assert_eq!(all_gt, gt_labels);
        prop_assert_eq!(all_rec, rec_labels);
    }
}

// Property: overlap area never exceeds either region's size
proptest! {
    #[test]
    fn prop_area_bound(gt in label_map(), rec in label_map()) {
        let overlaps = extract_overlaps(&gt, &rec).unwrap();
        let gt_regions = summarize_regions(&gt);
        let rec_regions = summarize_regions(&rec);

        for (&(a, b), &area) in &overlaps.areas {
            prop_assert!(area >= 1);
            prop_assert!(area <= gt_regions.size(a).unwrap().min(rec_regions.size(b).unwrap()));
        }
    }
}

// Property: scores are strictly negative and preserve distance differences
proptest! {
    #[test]
    fn prop_scores_negative_and_ordered(gt in label_map(), rec in label_map()) {
        let config = MatchingConfig::default();
        let overlaps = extract_overlaps(&gt, &rec).unwrap();
        let gt_regions = summarize_regions(&gt);
        let rec_regions = summarize_regions(&rec);
        let scores = score_candidates(&overlaps, &gt_regions, &rec_regions, &config).unwrap();

        let shift = scores.max_distance * config.score_margin;
        for (&pair, &score) in &scores.scores {
            prop_assert!(score < 0.0, "score of {:?} is {}", pair, score);
            let raw = raw_cost(pair, &gt_regions, &rec_regions, config.min_distance).unwrap();
            prop_assert!(raw >= config.min_distance);
            prop_assert!((score - (raw - shift)).abs() < 1e-9);
        }
    }
}

// Property: the bundled solver finds the optimum of the assignment problem
proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_solver_is_optimal(gt in label_map(), rec in label_map()) {
        let config = MatchingConfig::default();
        let overlaps = extract_overlaps(&gt, &rec).unwrap();
        let gt_regions = summarize_regions(&gt);
        let rec_regions = summarize_regions(&rec);
        let scores = score_candidates(&overlaps, &gt_regions, &rec_regions, &config).unwrap();
        let problem = build_assignment_problem(
            &overlaps,
            &scores,
            &gt_regions.labels,
            &rec_regions.labels,
            &config,
        ).unwrap();

        let solution = KuhnMunkresSolver::new()
            .solve(&problem.objective, &problem.constraints, &problem.parameters)
            .unwrap();
        prop_assert!(problem.constraints.are_satisfied(solution.values()));

        let gt_labels: Vec<Label> = gt_regions.labels.iter().copied().collect();
        let rec_labels: Vec<Label> = rec_regions.labels.iter().copied().collect();
        let lookup = |a: Label, b: Label| scores.score((a, b));
        let best = brute_force_best(&gt_labels, &lookup, &rec_labels, &mut BTreeSet::new());

        prop_assert!(
            (solution.objective_value() - best).abs() < 1e-4,
            "solver found {}, optimum is {}", solution.objective_value(), best
        );
    }
}

// Property: matching is deterministic
proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_idempotent(gt in label_map(), rec in label_map()) {
        let first = evaluate_default(&gt, &rec).unwrap();
        let second = evaluate_default(&gt, &rec).unwrap();
        prop_assert_eq!(first, second);
    }
}

// Property: a map matched against itself matches every region perfectly
proptest! {
    #[test]
    fn prop_self_match_is_perfect(gt in label_map()) {
        let report = evaluate_default(&gt, &gt).unwrap();
        prop_assert_eq!(report.num_matches(), summarize_regions(&gt).len());
        prop_assert!(report.false_negatives.is_empty());
        prop_assert!(report.false_positives.is_empty());
        for m in &report.matches {
            prop_assert_eq!(m.gt_label, m.rec_label);
            prop_assert!((m.m1 - 100.0).abs() < 1e-10);
            prop_assert!((m.dice - 1.0).abs() < 1e-10);
        }
    }
}

// Property: overlap measures stay in range
proptest! {
    #[test]
    fn prop_overlap_scores_range(
        intersection in 0u64..1000,
        extra_gt in 0u64..1000,
        extra_rec in 0u64..1000,
    ) {
        let gt_size = intersection + extra_gt;
        let rec_size = intersection + extra_rec;
        let scores = calculate_overlap_scores(intersection, gt_size, rec_size);

        prop_assert!(scores.m1 >= 0.0 && scores.m1 <= 100.0);
        prop_assert!(scores.m2 >= 0.0 && scores.m2 <= 100.0);
        prop_assert!(scores.dice >= 0.0 && scores.dice <= 1.0);
        prop_assert!(scores.m1 <= scores.m2 + 1e-10);
    }
}
