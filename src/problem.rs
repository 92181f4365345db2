//! Linear program types and construction of the one-to-one assignment problem.

use crate::config::MatchingConfig;
use crate::error::{OverlapError, Result};
use crate::overlap::Overlaps;
use crate::scoring::CandidateScores;
use crate::types::{Label, LabelPair};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Comparison between a constraint's left-hand side and its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relation {
    LessEqual,
    Equal,
    GreaterEqual,
}

impl Relation {
    /// Whether `lhs <relation> rhs` holds.
    pub fn holds(&self, lhs: f64, rhs: f64) -> bool {
        match self {
            Relation::LessEqual => lhs <= rhs,
            Relation::Equal => lhs == rhs,
            Relation::GreaterEqual => lhs >= rhs,
        }
    }
}

/// A sparse linear constraint `sum(coefficient * x) <relation> value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearConstraint {
    coefficients: BTreeMap<usize, f64>,
    relation: Relation,
    value: f64,
}

impl Default for LinearConstraint {
    fn default() -> Self {
        Self {
            coefficients: BTreeMap::new(),
            relation: Relation::LessEqual,
            value: 0.0,
        }
    }
}

impl LinearConstraint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_coefficient(&mut self, variable: usize, coefficient: f64) {
        self.coefficients.insert(variable, coefficient);
    }

    pub fn set_relation(&mut self, relation: Relation) {
        self.relation = relation;
    }

    pub fn set_value(&mut self, value: f64) {
        self.value = value;
    }

    pub fn coefficients(&self) -> &BTreeMap<usize, f64> {
        &self.coefficients
    }

    pub fn relation(&self) -> Relation {
        self.relation
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Whether the constraint involves no variable.
    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// Whether an assignment satisfies this constraint.
    pub fn is_satisfied(&self, values: &[f64]) -> bool {
        let lhs: f64 = self
            .coefficients
            .iter()
            .map(|(&var, &coef)| coef * values.get(var).copied().unwrap_or(0.0))
            .sum();
        self.relation.holds(lhs, self.value)
    }
}

/// An ordered set of linear constraints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearConstraints {
    constraints: Vec<LinearConstraint>,
}

impl LinearConstraints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, constraint: LinearConstraint) {
        self.constraints.push(constraint);
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LinearConstraint> {
        self.constraints.iter()
    }

    /// Whether an assignment satisfies every constraint.
    pub fn are_satisfied(&self, values: &[f64]) -> bool {
        self.constraints.iter().all(|c| c.is_satisfied(values))
    }
}

impl<'a> IntoIterator for &'a LinearConstraints {
    type Item = &'a LinearConstraint;
    type IntoIter = std::slice::Iter<'a, LinearConstraint>;

    fn into_iter(self) -> Self::IntoIter {
        self.constraints.iter()
    }
}

/// Optimization direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sense {
    Minimize,
    Maximize,
}

/// A dense linear objective over `len()` variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearObjective {
    coefficients: Vec<f64>,
    sense: Sense,
}

impl LinearObjective {
    /// Create an objective with `size` zero coefficients, minimized.
    pub fn new(size: usize) -> Self {
        Self {
            coefficients: vec![0.0; size],
            sense: Sense::Minimize,
        }
    }

    /// Set a coefficient, growing the objective if needed.
    pub fn set_coefficient(&mut self, variable: usize, coefficient: f64) {
        if variable >= self.coefficients.len() {
            self.coefficients.resize(variable + 1, 0.0);
        }
        self.coefficients[variable] = coefficient;
    }

    pub fn set_sense(&mut self, sense: Sense) {
        self.sense = sense;
    }

    pub fn sense(&self) -> Sense {
        self.sense
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// Objective value of an assignment.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(values)
            .map(|(coef, value)| coef * value)
            .sum()
    }
}

/// Domain of the decision variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableType {
    Continuous,
    Integer,
    Binary,
}

/// Directives handed to the solver alongside the problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverParameters {
    pub variable_type: VariableType,
    /// Passed through untouched; solvers may ignore it.
    pub num_threads: Option<usize>,
}

impl Default for SolverParameters {
    fn default() -> Self {
        Self {
            variable_type: VariableType::Binary,
            num_threads: None,
        }
    }
}

/// The 0/1 program selecting a one-to-one subset of candidate pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentProblem {
    pub objective: LinearObjective,
    pub constraints: LinearConstraints,
    pub parameters: SolverParameters,
    /// Candidate pair of each decision variable, by variable index.
    pub variables: Vec<LabelPair>,
    pair_to_variable: BTreeMap<LabelPair, usize>,
}

impl AssignmentProblem {
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Decision variable index of a candidate pair.
    pub fn variable(&self, pair: LabelPair) -> Option<usize> {
        self.pair_to_variable.get(&pair).copied()
    }

    /// Candidate pair of a decision variable.
    pub fn pair(&self, variable: usize) -> Option<LabelPair> {
        self.variables.get(variable).copied()
    }
}

/// Encode the candidate pairs as a binary one-to-one assignment problem.
///
/// Every candidate pair becomes one binary variable, numbered in ascending
/// `(gt, rec)` order. One "at most one" constraint is emitted per
/// reconstruction label, then one per ground truth label; labels without
/// candidates produce empty constraints. The objective holds the pair
/// scores and is minimized.
///
/// # Errors
///
/// Returns `MissingRegion` if a candidate pair has no score.
pub fn build_assignment_problem(
    overlaps: &Overlaps,
    scores: &CandidateScores,
    gt_labels: &BTreeSet<Label>,
    rec_labels: &BTreeSet<Label>,
    config: &MatchingConfig,
) -> Result<AssignmentProblem> {
    let variables: Vec<LabelPair> = overlaps.pairs().collect();
    let pair_to_variable: BTreeMap<LabelPair, usize> = variables
        .iter()
        .enumerate()
        .map(|(var, &pair)| (pair, var))
        .collect();

    let mut constraints = LinearConstraints::new();

    // every region can map to at most one other
    for &rec_label in rec_labels {
        let partners = overlaps.rec_to_gt.get(&rec_label);
        let vars = partners
            .into_iter()
            .flatten()
            .map(|&gt_label| pair_to_variable[&(gt_label, rec_label)]);
        constraints.add(at_most_one(vars));
    }
    for &gt_label in gt_labels {
        let partners = overlaps.gt_to_rec.get(&gt_label);
        let vars = partners
            .into_iter()
            .flatten()
            .map(|&rec_label| pair_to_variable[&(gt_label, rec_label)]);
        constraints.add(at_most_one(vars));
    }

    let mut objective = LinearObjective::new(variables.len());
    objective.set_sense(Sense::Minimize);
    for (var, &pair) in variables.iter().enumerate() {
        let score = scores.score(pair).ok_or_else(|| {
            OverlapError::MissingRegion(format!("candidate pair {:?} has no score", pair))
        })?;
        objective.set_coefficient(var, score);
    }

    let parameters = SolverParameters {
        variable_type: VariableType::Binary,
        num_threads: config.num_threads,
    };

    Ok(AssignmentProblem {
        objective,
        constraints,
        parameters,
        variables,
        pair_to_variable,
    })
}

fn at_most_one(variables: impl Iterator<Item = usize>) -> LinearConstraint {
    let mut constraint = LinearConstraint::new();
    for var in variables {
        constraint.set_coefficient(var, 1.0);
    }
    constraint.set_relation(Relation::LessEqual);
    constraint.set_value(1.0);
    constraint
}
