//! # External Collaborator Contracts
//!
//! The engine drives two black boxes: a scalarization builder that turns a
//! preference into a single-objective sub-problem, and a sub-problem solver
//! that optimizes one. Real deployments plug in symbolic/numeric
//! optimization backends here; tests and the bundled CLI use the discrete
//! collaborator from [`crate::discrete`].
//!
//! Every value crossing these seams is minimization-corrected (see
//! [`crate::types::ObjectiveSpace::correct`]); the engine flips values back
//! to true units before exposing them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::ObjectivePoint;

/// The value of one decision variable in a solver result
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    /// A scalar variable
    Scalar(f64),
    /// A vector-valued variable
    Vector(Vec<f64>),
}

/// The outcome of solving one scalarized sub-problem
#[derive(Clone, Debug, PartialEq)]
pub struct SolverResults {
    /// Whether the solver found an optimum
    pub success: bool,
    /// The solver's status message
    pub message: String,
    /// Optimal objective values, minimization-corrected, keyed by symbol
    pub optimal_objectives: ObjectivePoint,
    /// Optimal decision variable values, keyed by symbol
    pub optimal_variables: BTreeMap<String, VariableValue>,
}

/// Scalarization builder seam
///
/// Builders own (or wrap) the underlying multi-objective problem; the
/// engine never inspects the [`BuildScalarization::Problem`] values beyond
/// handing them to a matching [`SolveSubproblem`] implementation together
/// with the returned target symbol.
pub trait BuildScalarization {
    /// The augmented single-objective problem handed to the solver
    type Problem;

    /// Builds an epsilon-constraint sub-problem minimizing `target` subject
    /// to every other objective staying at or below its (corrected) bound
    fn build_epsilon_constraint(
        &self,
        target: &str,
        bounds: &ObjectivePoint,
    ) -> anyhow::Result<(Self::Problem, String)>;

    /// Builds an achievement scalarization anchored at the (corrected)
    /// anchor point, constrained to solutions no worse than the (corrected)
    /// lower-bound point in any objective
    fn build_achievement(
        &self,
        anchor: &ObjectivePoint,
        lower_bounds: &ObjectivePoint,
    ) -> anyhow::Result<(Self::Problem, String)>;

    /// Builds a weighted-sum scalarization, constrained to solutions no
    /// worse than the (corrected) lower-bound point in any objective
    ///
    /// The lower-bound point is part of the builder contract because the
    /// problems are opaque to the engine: only the builder can attach the
    /// per-objective constraints.
    fn build_weighted(
        &self,
        weights: &ObjectivePoint,
        lower_bounds: &ObjectivePoint,
    ) -> anyhow::Result<(Self::Problem, String)>;
}

/// Sub-problem solver seam
///
/// Solving is treated as a potentially slow, blocking call. A timeout in
/// the backend must be reported as `success = false`; the engine treats it
/// like any other solver failure.
pub trait SolveSubproblem {
    /// The problem representation accepted by this solver
    type Problem;

    /// Optimizes the function named `target` in the given sub-problem
    ///
    /// An unsolvable sub-problem is a _result_ (`success = false` plus a
    /// message), not an `Err`; `Err` is reserved for collaborator
    /// malfunctions such as lost backend connections.
    fn solve_subproblem(
        &mut self,
        problem: Self::Problem,
        target: &str,
    ) -> anyhow::Result<SolverResults>;
}
