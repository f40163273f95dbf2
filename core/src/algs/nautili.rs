//! # NAUTILI
//!
//! The group variant: a fixed roster of decision makers each supply a
//! reference point, every point is validated to strictly improve on the
//! current navigation point, and the per-maker improvement directions are
//! averaged into a consensus direction. The consensus anchor is then
//! projected like a reference point. Decision makers may stay silent on a
//! step, in which case their latest stated direction is carried forward.

use std::collections::BTreeMap;

use crate::{
    error::Error,
    history,
    oracle::{BuildScalarization, SolveSubproblem},
    types::{GroupPreference, ObjectivePoint, ObjectiveSpace, Preference, StepResponse},
};

use super::{nav_functions, Kernel, Navigate, StepRequest};

/// The NAUTILI driver
pub struct Nautili<B, S> {
    kernel: Kernel<B, S>,
    decision_makers: Vec<String>,
}

impl<B, S> Nautili<B, S> {
    /// Initializes NAUTILI over an objective space, its collaborators, and
    /// the roster of decision makers taking part in the session
    pub fn new<DMs>(space: ObjectiveSpace, builder: B, solver: S, decision_makers: DMs) -> Self
    where
        DMs: IntoIterator,
        DMs::Item: Into<String>,
    {
        Nautili {
            kernel: Kernel::new(space, builder, solver),
            decision_makers: decision_makers.into_iter().map(Into::into).collect(),
        }
    }

    /// Gets the roster of decision makers
    pub fn decision_makers(&self) -> &[String] {
        &self.decision_makers
    }
}

nav_functions!(Nautili);

impl<B, S> Navigate for Nautili<B, S>
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
        let prev_idx = match request.go_back_to {
            Some(step_number) => history::step_back_index(history, step_number)?,
            None => history
                .len()
                .checked_sub(1)
                .ok_or(Error::HistoryIntegrity { step_number: 0 })?,
        };
        let previous = history[prev_idx].clone();
        let (reachable, recorded) = match (&request.preference, &request.reuse_solution) {
            (Some(Preference::Group(provided)), None) => {
                // directions from abandoned branches do not apply; walk
                // the path ending at the entry we continue from
                let path = history::current_path(&history[..=prev_idx])?;
                let carried = path.iter().rev().find_map(|&idx| {
                    match &history[idx].preference {
                        Some(Preference::Group(group)) => Some(group),
                        _ => None,
                    }
                });
                let completed = aggregate(
                    self.kernel.space(),
                    &previous.navigation_point,
                    &self.decision_makers,
                    provided,
                    carried,
                )?;
                let anchor_corrected: ObjectivePoint = self
                    .kernel
                    .space()
                    .correct(&previous.navigation_point)?
                    .into_iter()
                    .map(|(symbol, nav_val)| {
                        let dir = completed.group_direction[&symbol];
                        (symbol, nav_val - dir)
                    })
                    .collect();
                let anchor = self.kernel.space().correct(&anchor_corrected)?;
                let reachable = self
                    .kernel
                    .project_achievement(&anchor, &previous.navigation_point)?;
                (reachable, Some(Preference::Group(completed)))
            }
            (Some(pref), None) => {
                return Err(Error::UnsupportedPreference(format!(
                    "this method navigates on group preferences, got `{}`",
                    pref.kind()
                )))
            }
            (None, Some(solution)) => (solution.clone(), None),
            _ => return Err(Error::AmbiguousStepInput),
        };
        self.kernel
            .step_response(&previous, reachable, recorded, request.steps_remaining)
    }
}

/// Validates the decision makers' fresh reference points and aggregates
/// them with carried-forward directions into a consensus direction
///
/// Every fresh point must be strictly better than the navigation point in
/// every objective; a point that merely matches it somewhere is rejected,
/// listing the objectives at fault. A decision maker absent from `provided`
/// falls back to their direction in `carried`; on the first group step
/// there is nothing to fall back to and silence is an error. The consensus
/// direction is the componentwise mean over the roster. All directions are
/// minimization-corrected.
pub fn aggregate(
    space: &ObjectiveSpace,
    navigation_point: &ObjectivePoint,
    decision_makers: &[String],
    provided: &GroupPreference,
    carried: Option<&GroupPreference>,
) -> Result<GroupPreference, Error> {
    if decision_makers.is_empty() {
        return Err(Error::UnsupportedPreference(String::from(
            "the decision maker roster is empty",
        )));
    }
    if let Some(unknown) = provided
        .reference_points
        .keys()
        .find(|dm| !decision_makers.contains(dm))
    {
        return Err(Error::UnsupportedPreference(format!(
            "decision maker `{unknown}` is not part of the session"
        )));
    }
    let nav = space.correct(navigation_point)?;
    let mut directions: BTreeMap<String, ObjectivePoint> = BTreeMap::new();
    for dm in decision_makers {
        if let Some(point) = provided.reference_points.get(dm) {
            let reference = space.correct(point)?;
            let worse: Vec<_> = space
                .iter()
                .filter(|obj| reference[obj.symbol()] >= nav[obj.symbol()])
                .map(|obj| String::from(obj.symbol()))
                .collect();
            if !worse.is_empty() {
                return Err(Error::InferiorReferencePoint {
                    dm: dm.clone(),
                    objectives: worse,
                });
            }
            let direction = reference
                .into_iter()
                .map(|(symbol, ref_val)| {
                    let nav_val = nav[&symbol];
                    (symbol, nav_val - ref_val)
                })
                .collect();
            directions.insert(dm.clone(), direction);
        } else {
            let direction = carried
                .and_then(|group| group.improvement_directions.get(dm))
                .ok_or_else(|| Error::MissingInitialPreference { dm: dm.clone() })?;
            directions.insert(dm.clone(), direction.clone());
        }
    }
    let n_dms = decision_makers.len() as f64;
    let group_direction = space
        .iter()
        .map(|obj| {
            let mean = directions
                .values()
                .map(|dir| dir[obj.symbol()])
                .sum::<f64>()
                / n_dms;
            (String::from(obj.symbol()), mean)
        })
        .collect();
    Ok(GroupPreference {
        reference_points: provided.reference_points.clone(),
        improvement_directions: directions,
        group_direction,
    })
}
