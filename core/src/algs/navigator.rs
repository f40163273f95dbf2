//! # NAUTILUS Navigator
//!
//! The interactive variant: the decision maker supplies a reference point
//! and the number of remaining steps anew on every call, may step back to
//! any earlier step, and the projection only runs when the preference is
//! fresh.

use crate::{
    error::Error,
    oracle::{BuildScalarization, SolveSubproblem},
    types::{ObjectivePoint, ObjectiveSpace, Preference, StepResponse},
};

use super::{nav_functions, resolve_previous, Kernel, Navigate, StepRequest};

/// The NAUTILUS Navigator driver
pub struct NautilusNavigator<B, S> {
    kernel: Kernel<B, S>,
}

impl<B, S> NautilusNavigator<B, S> {
    /// Initializes the navigator over an objective space and its
    /// collaborators
    pub fn new(space: ObjectiveSpace, builder: B, solver: S) -> Self {
        NautilusNavigator {
            kernel: Kernel::new(space, builder, solver),
        }
    }
}

nav_functions!(NautilusNavigator);

impl<B, S> Navigate for NautilusNavigator<B, S>
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
        let reachable = resolve_reachable(&mut self.kernel, &previous, request)?;
        self.kernel.step_response(
            &previous,
            reachable,
            request.preference.clone(),
            request.steps_remaining,
        )
    }
}

/// Resolves the reachable solution a reference-point step walks towards,
/// either by projecting a fresh reference point or by reusing the carried
/// solution
pub(super) fn resolve_reachable<B, S>(
    kernel: &mut Kernel<B, S>,
    previous: &StepResponse,
    request: &StepRequest,
) -> Result<ObjectivePoint, Error>
where
    B: BuildScalarization,
    S: SolveSubproblem<Problem = B::Problem>,
{
    match (&request.preference, &request.reuse_solution) {
        (Some(Preference::ReferencePoint { point }), None) => {
            kernel.project_achievement(point, &previous.navigation_point)
        }
        (Some(pref), None) => Err(Error::UnsupportedPreference(format!(
            "this method navigates on reference points, got `{}`",
            pref.kind()
        ))),
        (None, Some(solution)) => Ok(solution.clone()),
        _ => Err(Error::AmbiguousStepInput),
    }
}
