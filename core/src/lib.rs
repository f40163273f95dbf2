//! # Nautica
//!
//! An interactive navigation engine for multi-criteria decision making,
//! implementing the NAUTILUS family of methods.
//!
//! Navigation starts at the nadir point and walks towards the Pareto front
//! in steps; at every step the decision maker sees the objective values
//! still reachable and trades off between them without ever being shown a
//! solution that would require sacrificing anything already gained.

pub mod error;
pub use error::Error;

pub mod types;
pub use types::{
    GroupPreference, ObjectivePoint, ObjectiveSpace, ObjectiveSpec, Preference, ReachableBounds,
    StepResponse,
};

pub mod oracle;
pub use oracle::{BuildScalarization, SolveSubproblem, SolverResults};

pub mod history;

pub mod prepro;

pub mod algs;
pub use algs::{
    distance_to_front, next_navigation_point, Kernel, NavFunctions, Navigate, StepRequest,
};

// Reexport method drivers
pub use algs::nautili::Nautili;
pub use algs::nautilus::{Nautilus, NautilusOptions};
pub use algs::nautilus1::Nautilus1;
pub use algs::navigator::NautilusNavigator;

pub mod discrete;

/// Statistics of the navigation engine
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct Stats {
    /// The number of completed navigation steps
    pub n_steps: usize,
    /// The number of calls to the sub-problem solver
    pub n_subproblem_calls: usize,
    /// The number of reachable-bounds computations
    pub n_bounds_computations: usize,
    /// The number of preference projections
    pub n_projections: usize,
    /// The number of objectives in the problem
    pub n_objs: usize,
}

/// A logger to attach to the engine
pub trait WriteNavLog {
    /// Adds a solved sub-problem to the log
    fn log_subproblem(&mut self, target: &str, results: &SolverResults) -> anyhow::Result<()>;
    /// Adds a computed reachable region to the log
    fn log_bounds(&mut self, bounds: &ReachableBounds) -> anyhow::Result<()>;
    /// Adds a finished step to the log
    fn log_step(&mut self, response: &StepResponse) -> anyhow::Result<()>;
    /// Adds a new routine starting to the log
    fn log_routine_start(&mut self, desc: &'static str) -> anyhow::Result<()>;
    /// Adds a new routine ending to the log
    fn log_routine_end(&mut self) -> anyhow::Result<()>;
    /// Logs any string
    fn log_message(&mut self, msg: &str) -> anyhow::Result<()>;
}
