//! # Classic NAUTILUS
//!
//! The fixed-budget variant: the total number of iterations is set up
//! front and each step consumes one of them. The driver derives the
//! remaining step count from the step number it continues from, so the
//! request's `steps_remaining` field is ignored. Stepping past the budget
//! is an error; stepping back restores the budget of the target step.

use crate::{
    error::Error,
    oracle::{BuildScalarization, SolveSubproblem},
    types::{ObjectiveSpace, StepResponse},
};

use super::{
    nav_functions, navigator::resolve_reachable, resolve_previous, Kernel, Navigate, StepRequest,
};

/// Configuration options for classic NAUTILUS
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct NautilusOptions {
    /// The total number of navigation steps to take
    #[cfg_attr(feature = "clap", arg(long, default_value_t = 5))]
    pub total_steps: usize,
}

impl Default for NautilusOptions {
    fn default() -> Self {
        NautilusOptions { total_steps: 5 }
    }
}

/// The classic NAUTILUS driver
pub struct Nautilus<B, S> {
    kernel: Kernel<B, S>,
    opts: NautilusOptions,
}

impl<B, S> Nautilus<B, S> {
    /// Initializes classic NAUTILUS over an objective space and its
    /// collaborators
    pub fn new(space: ObjectiveSpace, builder: B, solver: S, opts: NautilusOptions) -> Self {
        Nautilus {
            kernel: Kernel::new(space, builder, solver),
            opts,
        }
    }

    /// Gets the configured options
    pub fn options(&self) -> &NautilusOptions {
        &self.opts
    }
}

nav_functions!(Nautilus);

impl<B, S> Navigate for Nautilus<B, S>
where
    B: BuildScalarization,
    S: SolveSubproblem<Problem = B::Problem>,
{
    fn initialize(&mut self) -> Result<StepResponse, Error> {
        self.kernel.initialize_response()
    }

    fn step(
        &mut self,
        history: &[StepResponse],
        request: &StepRequest,
    ) -> Result<StepResponse, Error> {
        let previous = resolve_previous(history, request)?.clone();
        let remaining = self
            .opts
            .total_steps
            .checked_sub(previous.step_number)
            .filter(|&rem| rem > 0)
            .ok_or(Error::InvalidStepCount(0))?;
        let reachable = resolve_reachable(&mut self.kernel, &previous, request)?;
        self.kernel
            .step_response(&previous, reachable, request.preference.clone(), remaining)
    }
}
