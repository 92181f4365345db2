//! Linear solver interface and the bundled Kuhn-Munkres backend.
//!
//! The matching pipeline only depends on [`LinearSolver`]; any backend able
//! to solve a binary program can be plugged in. [`KuhnMunkresSolver`] covers
//! the bipartite "at most one" programs built by
//! [`build_assignment_problem`](crate::problem::build_assignment_problem).

use crate::problem::{
    LinearConstraints, LinearObjective, Relation, Sense, SolverParameters, VariableType,
};
use pathfinding::kuhn_munkres::kuhn_munkres_min;
use pathfinding::matrix::Matrix;
use std::collections::{BTreeMap, VecDeque};
use thiserror::Error;

/// Failures reported by a linear solver.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// No assignment satisfies the constraints.
    #[error("Infeasible problem: {0}")]
    Infeasible(String),

    /// The backend cannot handle this kind of problem.
    #[error("Unsupported problem: {0}")]
    Unsupported(String),

    /// The solver returned something that is not a valid 0/1 assignment.
    #[error("Invalid solution: {0}")]
    InvalidSolution(String),

    /// Internal backend failure.
    #[error("Backend failure: {0}")]
    Backend(String),
}

/// Values of all variables in an optimal assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    values: Vec<f64>,
    value: f64,
}

impl Solution {
    pub fn new(values: Vec<f64>, value: f64) -> Self {
        Self { values, value }
    }

    /// Value per variable index.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Objective value of the assignment.
    pub fn objective_value(&self) -> f64 {
        self.value
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl std::ops::Index<usize> for Solution {
    type Output = f64;

    fn index(&self, variable: usize) -> &f64 {
        &self.values[variable]
    }
}

/// An optimizer for linear programs over a declared variable domain.
///
/// Implementations return, for every variable of `objective`, the value of an
/// optimal assignment satisfying all `constraints`, or an error. They must be
/// deterministic: equal inputs give equal solutions.
pub trait LinearSolver {
    fn solve(
        &self,
        objective: &LinearObjective,
        constraints: &LinearConstraints,
        parameters: &SolverParameters,
    ) -> Result<Solution, SolverError>;
}

impl<S: LinearSolver + ?Sized> LinearSolver for &S {
    fn solve(
        &self,
        objective: &LinearObjective,
        constraints: &LinearConstraints,
        parameters: &SolverParameters,
    ) -> Result<Solution, SolverError> {
        (**self).solve(objective, constraints, parameters)
    }
}

/// Default factor turning objective coefficients into integer costs.
pub const DEFAULT_COST_SCALE: f64 = 1e6;

const UNIT_TOLERANCE: f64 = 1e-9;

/// Exact solver for binary bipartite "at most one" programs.
///
/// Each non-empty constraint must read `sum(x) <= 1` with unit coefficients
/// and each variable may appear in at most two of them. Constraints are then
/// the nodes of a graph whose edges are the variables; when that graph is
/// bipartite the program is a maximum-weight bipartite matching, solved with
/// the Kuhn-Munkres algorithm on a square integer cost matrix.
///
/// Coefficients are scaled by `cost_scale` and rounded, so coefficients
/// closer than `1 / cost_scale` may tie.
#[derive(Debug, Clone, PartialEq)]
pub struct KuhnMunkresSolver {
    cost_scale: f64,
}

impl Default for KuhnMunkresSolver {
    fn default() -> Self {
        Self {
            cost_scale: DEFAULT_COST_SCALE,
        }
    }
}

impl KuhnMunkresSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different coefficient scale. Non-positive or non-finite scales
    /// fall back to the default.
    pub fn with_cost_scale(cost_scale: f64) -> Self {
        if cost_scale.is_finite() && cost_scale > 0.0 {
            Self { cost_scale }
        } else {
            Self::default()
        }
    }

    pub fn cost_scale(&self) -> f64 {
        self.cost_scale
    }

    fn to_cost(&self, coefficient: f64) -> Result<i64, SolverError> {
        let scaled = (coefficient * self.cost_scale).round();
        if !scaled.is_finite() || scaled.abs() >= (i64::MAX / 1024) as f64 {
            return Err(SolverError::Unsupported(format!(
                "coefficient {} out of range",
                coefficient
            )));
        }
        Ok(scaled as i64)
    }
}

/// One side of the bipartition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

impl Side {
    fn other(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

impl LinearSolver for KuhnMunkresSolver {
    fn solve(
        &self,
        objective: &LinearObjective,
        constraints: &LinearConstraints,
        parameters: &SolverParameters,
    ) -> Result<Solution, SolverError> {
        if parameters.variable_type != VariableType::Binary {
            return Err(SolverError::Unsupported(format!(
                "{:?} variables",
                parameters.variable_type
            )));
        }

        let num_vars = objective.len();

        // constraints each variable takes part in
        let mut membership: Vec<Vec<usize>> = vec![Vec::new(); num_vars];
        for (index, constraint) in constraints.iter().enumerate() {
            if constraint.is_empty() {
                if !constraint.relation().holds(0.0, constraint.value()) {
                    return Err(SolverError::Infeasible(format!(
                        "empty constraint {} requires 0 {:?} {}",
                        index,
                        constraint.relation(),
                        constraint.value()
                    )));
                }
                continue;
            }

            if constraint.relation() != Relation::LessEqual
                || (constraint.value() - 1.0).abs() > UNIT_TOLERANCE
            {
                return Err(SolverError::Unsupported(format!(
                    "constraint {} is not of the form sum(x) <= 1",
                    index
                )));
            }

            for (&var, &coef) in constraint.coefficients() {
                if var >= num_vars {
                    return Err(SolverError::Unsupported(format!(
                        "constraint {} refers to unknown variable {}",
                        index, var
                    )));
                }
                if (coef - 1.0).abs() > UNIT_TOLERANCE {
                    return Err(SolverError::Unsupported(format!(
                        "constraint {} has coefficient {} for variable {}",
                        index, coef, var
                    )));
                }
                membership[var].push(index);
            }
        }

        // costs of a minimization
        let costs: Vec<f64> = match objective.sense() {
            Sense::Minimize => objective.coefficients().to_vec(),
            Sense::Maximize => objective.coefficients().iter().map(|c| -c).collect(),
        };

        // adjacency of the constraint graph: node -> (variable, neighbour)
        let mut adjacency: BTreeMap<usize, Vec<(usize, usize)>> = BTreeMap::new();
        for (var, nodes) in membership.iter().enumerate() {
            match nodes.as_slice() {
                [] | [_] => {}
                [a, b] => {
                    adjacency.entry(*a).or_default().push((var, *b));
                    adjacency.entry(*b).or_default().push((var, *a));
                }
                _ => {
                    return Err(SolverError::Unsupported(format!(
                        "variable {} appears in {} constraints",
                        var,
                        nodes.len()
                    )))
                }
            }
        }

        let mut nodes = two_color(&adjacency)?;
        let mut num_components = nodes.values().map(|n| n.component + 1).max().unwrap_or(0);
        for constrained in &membership {
            for &node in constrained {
                nodes.entry(node).or_insert_with(|| {
                    num_components += 1;
                    Node {
                        side: Side::Left,
                        component: num_components - 1,
                    }
                });
            }
        }

        // each connected component is an independent matching problem
        let mut components = vec![Component::default(); num_components];
        for (&node, info) in &nodes {
            components[info.component].add_node(node, info.side);
        }

        let mut values = vec![0.0; num_vars];
        for (var, constrained) in membership.iter().enumerate() {
            let cost = self.to_cost(costs[var])?;
            if cost >= 0 {
                continue;
            }

            match constrained.as_slice() {
                [] => {
                    // unconstrained, take it whenever it pays
                    values[var] = 1.0;
                }
                [node] => {
                    let info = nodes[node];
                    components[info.component].add_private_edge(*node, info.side, var, cost);
                }
                [a, b] => {
                    let info = nodes[a];
                    let (l, r) = match info.side {
                        Side::Left => (*a, *b),
                        Side::Right => (*b, *a),
                    };
                    components[info.component].add_edge(l, r, var, cost);
                }
                _ => unreachable!("membership checked above"),
            }
        }

        for component in &components {
            for var in component.solve()? {
                values[var] = 1.0;
            }
        }

        let value = objective.evaluate(&values);
        Ok(Solution::new(values, value))
    }
}

#[derive(Debug, Clone, Copy)]
struct Node {
    side: Side,
    component: usize,
}

/// Cost matrix of one connected component of the constraint graph.
///
/// Rows are left nodes, columns right nodes. A variable bound by a single
/// constraint gets a private node on the opposite side.
#[derive(Debug, Clone, Default)]
struct Component {
    left: BTreeMap<usize, usize>,
    right: BTreeMap<usize, usize>,
    rows: usize,
    cols: usize,
    // (row, column) -> (cost, variable)
    cells: BTreeMap<(usize, usize), (i64, usize)>,
}

impl Component {
    fn add_node(&mut self, node: usize, side: Side) {
        match side {
            Side::Left => {
                self.left.insert(node, self.rows);
                self.rows += 1;
            }
            Side::Right => {
                self.right.insert(node, self.cols);
                self.cols += 1;
            }
        }
    }

    fn add_private_edge(&mut self, node: usize, side: Side, var: usize, cost: i64) {
        let cell = match side {
            Side::Left => {
                self.cols += 1;
                (self.left[&node], self.cols - 1)
            }
            Side::Right => {
                self.rows += 1;
                (self.rows - 1, self.right[&node])
            }
        };
        self.insert(cell, var, cost);
    }

    fn add_edge(&mut self, left: usize, right: usize, var: usize, cost: i64) {
        let cell = (self.left[&left], self.right[&right]);
        self.insert(cell, var, cost);
    }

    // parallel variables keep the cheapest, lowest index first
    fn insert(&mut self, cell: (usize, usize), var: usize, cost: i64) {
        let entry = self.cells.entry(cell).or_insert((cost, var));
        if (cost, var) < *entry {
            *entry = (cost, var);
        }
    }

    /// Variables selected by a minimum-cost assignment over this component.
    fn solve(&self) -> Result<Vec<usize>, SolverError> {
        if self.cells.is_empty() {
            return Ok(Vec::new());
        }

        let size = self.rows.max(self.cols);
        let mut weights = vec![0i64; size * size];
        for (&(row, col), &(cost, _)) in &self.cells {
            weights[row * size + col] = cost;
        }

        let matrix = Matrix::from_vec(size, size, weights)
            .map_err(|e| SolverError::Backend(format!("{:?}", e)))?;
        let (_, assignment) = kuhn_munkres_min(&matrix);

        Ok(assignment
            .iter()
            .enumerate()
            .filter_map(|(row, &col)| self.cells.get(&(row, col)).map(|&(_, var)| var))
            .collect())
    }
}

/// Assign every node of the constraint graph to a side so that each edge
/// joins opposite sides, numbering connected components along the way.
fn two_color(
    adjacency: &BTreeMap<usize, Vec<(usize, usize)>>,
) -> Result<BTreeMap<usize, Node>, SolverError> {
    let mut nodes: BTreeMap<usize, Node> = BTreeMap::new();
    let mut component = 0;

    for &start in adjacency.keys() {
        if nodes.contains_key(&start) {
            continue;
        }
        nodes.insert(
            start,
            Node {
                side: Side::Left,
                component,
            },
        );

        let mut queue = VecDeque::from([start]);
        while let Some(node) = queue.pop_front() {
            let side = nodes[&node].side;
            for &(var, neighbour) in &adjacency[&node] {
                match nodes.get(&neighbour) {
                    None => {
                        nodes.insert(
                            neighbour,
                            Node {
                                side: side.other(),
                                component,
                            },
                        );
                        queue.push_back(neighbour);
                    }
                    Some(other) if other.side == side => {
                        return Err(SolverError::Unsupported(format!(
                            "constraint graph is not bipartite at variable {}",
                            var
                        )));
                    }
                    Some(_) => {}
                }
            }
        }

        component += 1;
    }

    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::LinearConstraint;

    fn at_most_one(vars: &[usize]) -> LinearConstraint {
        let mut constraint = LinearConstraint::new();
        for &var in vars {
            constraint.set_coefficient(var, 1.0);
        }
        constraint.set_relation(Relation::LessEqual);
        constraint.set_value(1.0);
        constraint
    }

    fn objective(coefficients: &[f64]) -> LinearObjective {
        let mut objective = LinearObjective::new(coefficients.len());
        for (var, &coef) in coefficients.iter().enumerate() {
            objective.set_coefficient(var, coef);
        }
        objective
    }

    #[test]
    fn test_prefers_more_matches() {
        // gt 1 overlaps rec 10 and rec 11, gt 2 overlaps rec 11
        // vars: 0 = (1,10), 1 = (1,11), 2 = (2,11)
        let mut constraints = LinearConstraints::new();
        constraints.add(at_most_one(&[0]));
        constraints.add(at_most_one(&[1, 2]));
        constraints.add(at_most_one(&[0, 1]));
        constraints.add(at_most_one(&[2]));

        let solution = KuhnMunkresSolver::new()
            .solve(
                &objective(&[-1.0, -1.5, -1.0]),
                &constraints,
                &SolverParameters::default(),
            )
            .unwrap();

        assert_eq!(solution.values(), &[1.0, 0.0, 1.0]);
        assert!((solution.objective_value() + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_conflict_picks_lowest_cost() {
        let mut constraints = LinearConstraints::new();
        constraints.add(at_most_one(&[0]));
        constraints.add(at_most_one(&[1]));
        constraints.add(at_most_one(&[0, 1]));

        let solution = KuhnMunkresSolver::new()
            .solve(&objective(&[-0.2, -0.7]), &constraints, &SolverParameters::default())
            .unwrap();
        assert_eq!(solution.values(), &[0.0, 1.0]);
    }

    #[test]
    fn test_positive_costs_are_never_selected() {
        let mut constraints = LinearConstraints::new();
        constraints.add(at_most_one(&[0]));
        constraints.add(at_most_one(&[0]));

        let solution = KuhnMunkresSolver::new()
            .solve(&objective(&[3.0]), &constraints, &SolverParameters::default())
            .unwrap();
        assert_eq!(solution.values(), &[0.0]);
    }

    #[test]
    fn test_maximize_sense() {
        let mut constraints = LinearConstraints::new();
        constraints.add(at_most_one(&[0, 1]));
        constraints.add(at_most_one(&[0]));
        constraints.add(at_most_one(&[1]));

        let mut obj = objective(&[2.0, 3.0]);
        obj.set_sense(Sense::Maximize);
        let solution = KuhnMunkresSolver::new()
            .solve(&obj, &constraints, &SolverParameters::default())
            .unwrap();
        assert_eq!(solution.values(), &[0.0, 1.0]);
    }

    #[test]
    fn test_empty_problem() {
        let solution = KuhnMunkresSolver::new()
            .solve(
                &LinearObjective::new(0),
                &LinearConstraints::new(),
                &SolverParameters::default(),
            )
            .unwrap();
        assert!(solution.is_empty());
        assert_eq!(solution.objective_value(), 0.0);
    }

    #[test]
    fn test_rejects_non_binary_domain() {
        let parameters = SolverParameters {
            variable_type: VariableType::Continuous,
            num_threads: None,
        };
        let result =
            KuhnMunkresSolver::new().solve(&objective(&[-1.0]), &LinearConstraints::new(), &parameters);
        assert!(matches!(result, Err(SolverError::Unsupported(_))));
    }

    #[test]
    fn test_rejects_odd_cycle() {
        // three constraints pairwise sharing a variable form a triangle
        let mut constraints = LinearConstraints::new();
        constraints.add(at_most_one(&[0, 2]));
        constraints.add(at_most_one(&[0, 1]));
        constraints.add(at_most_one(&[1, 2]));

        let result = KuhnMunkresSolver::new().solve(
            &objective(&[-1.0, -1.0, -1.0]),
            &constraints,
            &SolverParameters::default(),
        );
        assert!(matches!(result, Err(SolverError::Unsupported(_))));
    }

    #[test]
    fn test_infeasible_empty_constraint() {
        let mut constraint = LinearConstraint::new();
        constraint.set_relation(Relation::GreaterEqual);
        constraint.set_value(1.0);
        let mut constraints = LinearConstraints::new();
        constraints.add(constraint);

        let result = KuhnMunkresSolver::new().solve(
            &LinearObjective::new(0),
            &constraints,
            &SolverParameters::default(),
        );
        assert!(matches!(result, Err(SolverError::Infeasible(_))));
    }

    #[test]
    fn test_invalid_scale_falls_back() {
        assert_eq!(KuhnMunkresSolver::with_cost_scale(-1.0).cost_scale(), DEFAULT_COST_SCALE);
        assert_eq!(KuhnMunkresSolver::with_cost_scale(10.0).cost_scale(), 10.0);
    }
}
