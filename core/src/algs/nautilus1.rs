//! # NAUTILUS 1
//!
//! The variant for decision makers who state importance rather than target
//! values: preferences arrive as per-objective ranks or as percentage
//! shares of the desired improvement and are turned into a weight vector
//! for a weighted scalarization. Weights are normalized by each
//! objective's range so that differently scaled objectives compare.

use std::collections::BTreeMap;

use crate::{
    error::Error,
    oracle::{BuildScalarization, SolveSubproblem},
    types::{ObjectivePoint, ObjectiveSpace, Preference, StepResponse},
};

use super::{nav_functions, resolve_previous, Kernel, Navigate, StepRequest};

/// Tolerance on the sum of percentage shares
const PERCENTAGE_TOLERANCE: f64 = 1e-6;

/// The NAUTILUS 1 driver
pub struct Nautilus1<B, S> {
    kernel: Kernel<B, S>,
}

impl<B, S> Nautilus1<B, S> {
    /// Initializes NAUTILUS 1 over an objective space and its
    /// collaborators
    pub fn new(space: ObjectiveSpace, builder: B, solver: S) -> Self {
        Nautilus1 {
            kernel: Kernel::new(space, builder, solver),
        }
    }
}

nav_functions!(Nautilus1);

impl<B, S> Navigate for Nautilus1<B, S>
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
        let reachable = match (&request.preference, &request.reuse_solution) {
            (Some(pref), None) => {
                let weights = preference_weights(self.kernel.space(), pref)?;
                self.kernel
                    .project_weighted(&weights, &previous.navigation_point)?
            }
            (None, Some(solution)) => solution.clone(),
            _ => return Err(Error::AmbiguousStepInput),
        };
        self.kernel.step_response(
            &previous,
            reachable,
            request.preference.clone(),
            request.steps_remaining,
        )
    }
}

/// Turns an importance preference into a range-normalized weight vector
///
/// Ranks map to `(1 / rank) / range`, percentages to
/// `(share / 100) / range`. Every objective must be covered; percentage
/// shares must sum to 100.
pub fn preference_weights(
    space: &ObjectiveSpace,
    preference: &Preference,
) -> Result<ObjectivePoint, Error> {
    match preference {
        Preference::Ranks { ranks } => weights_from(space, ranks, |&rank| {
            if rank == 0 {
                return Err(Error::UnsupportedPreference(String::from(
                    "ranks start at 1",
                )));
            }
            Ok(1. / f64::from(rank))
        }),
        Preference::Percentages { percentages } => {
            let total: f64 = percentages.values().sum();
            if (total - 100.).abs() > PERCENTAGE_TOLERANCE {
                return Err(Error::UnsupportedPreference(format!(
                    "percentage shares must sum to 100, got {total}"
                )));
            }
            weights_from(space, percentages, |&share| {
                if share <= 0. {
                    return Err(Error::UnsupportedPreference(format!(
                        "percentage shares must be positive, got {share}"
                    )));
                }
                Ok(share / 100.)
            })
        }
        pref => Err(Error::UnsupportedPreference(format!(
            "this method navigates on ranks or percentages, got `{}`",
            pref.kind()
        ))),
    }
}

fn weights_from<V, Imp>(
    space: &ObjectiveSpace,
    values: &BTreeMap<String, V>,
    importance: Imp,
) -> Result<ObjectivePoint, Error>
where
    Imp: Fn(&V) -> Result<f64, Error>,
{
    space
        .iter()
        .map(|obj| {
            let value = values.get(obj.symbol()).ok_or_else(|| {
                Error::UnsupportedPreference(format!(
                    "no importance stated for objective `{}`",
                    obj.symbol()
                ))
            })?;
            Ok((String::from(obj.symbol()), importance(value)? / obj.range()))
        })
        .collect()
}
