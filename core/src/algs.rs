//! # Core Navigation Functionality Shared Between the NAUTILUS Variants
//!
//! The [`Kernel`] composes the four numeric building blocks of a navigation
//! step: updating the navigation point, computing the reachable region,
//! projecting a preference onto a reachable solution, and measuring the
//! distance to the front. Each method variant in [`navigator`],
//! [`nautilus`], [`nautilus1`] and [`nautili`] wraps a kernel and decides
//! how preferences turn into scalarizations.

use crate::{
    error::Error,
    history,
    oracle::{BuildScalarization, SolveSubproblem, SolverResults},
    types::{ObjectivePoint, ObjectiveSpace, Preference, ReachableBounds, StepResponse},
    Stats, WriteNavLog,
};

pub mod nautili;
pub mod nautilus;
pub mod nautilus1;
pub mod navigator;

/// Numerical slack when checking solver optima against the navigation point
const BOUND_TOLERANCE: f64 = 1e-9;

/// The inputs to one navigation step
///
/// Exactly one of `preference` and `reuse_solution` must be set; supplying
/// both or neither is rejected with [`Error::AmbiguousStepInput`].
#[derive(Clone, Debug, Default)]
pub struct StepRequest {
    /// A fresh preference to project onto the reachable region
    pub preference: Option<Preference>,
    /// A previously computed reachable solution to carry forward instead of
    /// solving a new projection
    pub reuse_solution: Option<ObjectivePoint>,
    /// The number of steps remaining in the navigation
    ///
    /// Drivers with a fixed iteration budget (classic NAUTILUS) derive this
    /// from their options and the step number instead.
    pub steps_remaining: usize,
    /// Step back to this step number and continue from there, abandoning
    /// the steps after it (they stay in the history as a branch)
    pub go_back_to: Option<usize>,
}

impl StepRequest {
    /// A request carrying a fresh preference
    pub fn fresh(preference: Preference, steps_remaining: usize) -> Self {
        StepRequest {
            preference: Some(preference),
            steps_remaining,
            ..Default::default()
        }
    }

    /// A request reusing an already computed reachable solution
    pub fn reuse(solution: ObjectivePoint, steps_remaining: usize) -> Self {
        StepRequest {
            reuse_solution: Some(solution),
            steps_remaining,
            ..Default::default()
        }
    }
}

/// Stepping interface implemented by each navigation method
///
/// The caller owns the history; `step` only reads it and returns the
/// response to append, while `all_steps` appends as it goes so that a
/// failing sub-problem mid-batch leaves the already finished steps in
/// place.
pub trait Navigate {
    /// Performs the initialization step: the navigation point is placed on
    /// the nadir and the initial reachable region is computed
    ///
    /// The returned response carries step number 0 and distance 0 and must
    /// become entry 0 of the session history.
    fn initialize(&mut self) -> Result<StepResponse, Error>;

    /// Performs one navigation step from the latest entry of `history` (or
    /// from an earlier entry when the request steps back)
    fn step(&mut self, history: &[StepResponse], request: &StepRequest)
        -> Result<StepResponse, Error>;

    /// Performs all remaining steps in one batch, appending each response
    /// to `history`
    ///
    /// Only the first step projects the preference; every later step in
    /// the batch reuses the reachable solution computed by the first one,
    /// under the assumption that the preference does not change mid-batch.
    /// Exactly `steps_remaining` responses are appended on success; on
    /// failure everything appended before the failing step stays valid.
    fn all_steps(
        &mut self,
        history: &mut Vec<StepResponse>,
        preference: &Preference,
        steps_remaining: usize,
    ) -> Result<(), Error> {
        if steps_remaining == 0 {
            return Err(Error::InvalidStepCount(steps_remaining));
        }
        let mut request = StepRequest::fresh(preference.clone(), steps_remaining);
        let mut recorded = None;
        for remaining in (1..=steps_remaining).rev() {
            request.steps_remaining = remaining;
            let mut resp = self.step(history, &request)?;
            match &recorded {
                None => recorded = resp.preference.clone(),
                Some(pref) => {
                    if resp.preference.is_none() {
                        resp.preference = Some(pref.clone());
                    }
                }
            }
            let reachable = resp.reachable_solution.clone().ok_or_else(|| {
                Error::subproblem(None, "step produced no reachable solution to carry forward")
            })?;
            request = StepRequest::reuse(reachable, 0);
            history.push(resp);
        }
        Ok(())
    }
}

/// Shared functionality provided by the [`Kernel`]
pub trait NavFunctions {
    /// Gets tracked statistics from the engine
    fn stats(&self) -> Stats;
    /// Attaches a logger to the engine
    fn attach_logger<L: WriteNavLog + 'static>(&mut self, logger: L);
    /// Detaches a logger from the engine
    fn detach_logger(&mut self) -> Option<Box<dyn WriteNavLog>>;
}

/// Implements [`NavFunctions`] for a driver wrapping a `kernel` field
macro_rules! nav_functions {
    ($alg:ident) => {
        impl<B, S> $crate::NavFunctions for $alg<B, S> {
            fn stats(&self) -> $crate::Stats {
                self.kernel.stats
            }

            fn attach_logger<L: $crate::WriteNavLog + 'static>(&mut self, logger: L) {
                self.kernel.attach_logger(logger);
            }

            fn detach_logger(&mut self) -> Option<Box<dyn $crate::WriteNavLog>> {
                self.kernel.detach_logger()
            }
        }
    };
}
pub(crate) use nav_functions;

/// Resolves the entry a step continues from
///
/// Without a step-back this is the latest entry; with one it is the latest
/// entry carrying the requested step number.
pub fn resolve_previous<'h>(
    history: &'h [StepResponse],
    request: &StepRequest,
) -> Result<&'h StepResponse, Error> {
    match request.go_back_to {
        Some(step_number) => Ok(&history[history::step_back_index(history, step_number)?]),
        None => history.last().ok_or(Error::HistoryIntegrity { step_number: 0 }),
    }
}

/// Computes the next navigation point by moving `1/steps_remaining` of the
/// way from the previous point towards the reachable solution
///
/// All arithmetic happens in minimization-corrected coordinates; the
/// result is in true units. With a reachable, Pareto-optimal target the
/// produced sequence of navigation points is non-worsening per objective.
pub fn next_navigation_point(
    space: &ObjectiveSpace,
    previous_point: &ObjectivePoint,
    reachable_solution: &ObjectivePoint,
    steps_remaining: usize,
) -> Result<ObjectivePoint, Error> {
    if steps_remaining == 0 {
        return Err(Error::InvalidStepCount(steps_remaining));
    }
    let prev = space.correct(previous_point)?;
    let reach = space.correct(reachable_solution)?;
    let r = steps_remaining as f64;
    let next = prev
        .into_iter()
        .map(|(symbol, prev_val)| {
            let reach_val = reach[&symbol];
            (symbol, (r - 1.) / r * prev_val + reach_val / r)
        })
        .collect();
    space.correct(&next)
}

/// Computes the distance of the navigation point to the Pareto front as a
/// percentage of the way from the nadir to the reachable solution
///
/// Euclidean norm over minimization-corrected coordinates. This is a
/// reporting signal; the stepping algorithm never depends on it.
pub fn distance_to_front(
    space: &ObjectiveSpace,
    navigation_point: &ObjectivePoint,
    reachable_solution: &ObjectivePoint,
) -> Result<f64, Error> {
    let nav = space.correct(navigation_point)?;
    let reach = space.correct(reachable_solution)?;
    let nadir = space.corrected_nadir();
    let norm_from_nadir = |point: &ObjectivePoint| {
        point
            .iter()
            .map(|(symbol, &val)| (val - nadir[symbol]).powi(2))
            .sum::<f64>()
            .sqrt()
    };
    let denominator = norm_from_nadir(&reach);
    if denominator <= f64::EPSILON {
        return Err(Error::subproblem(
            None,
            "reachable solution coincides with the nadir point",
        ));
    }
    Ok(100. * norm_from_nadir(&nav) / denominator)
}

/// Kernel struct shared between all navigation methods
///
/// # Generics
///
/// - `B`: the scalarization builder collaborator
/// - `S`: the sub-problem solver collaborator
pub struct Kernel<B, S> {
    /// The validated objective space of the problem
    space: ObjectiveSpace,
    /// The scalarization builder
    builder: B,
    /// The sub-problem solver backend
    solver: S,
    /// Running statistics
    stats: Stats,
    /// Logger to log with
    logger: Option<Box<dyn WriteNavLog>>,
}

impl<B, S> Kernel<B, S> {
    /// Initializes a kernel over an objective space and its collaborators
    pub fn new(space: ObjectiveSpace, builder: B, solver: S) -> Self {
        let stats = Stats {
            n_objs: space.n_objs(),
            ..Default::default()
        };
        Kernel {
            space,
            builder,
            solver,
            stats,
            logger: None,
        }
    }

    /// Gets the objective space the kernel navigates
    pub fn space(&self) -> &ObjectiveSpace {
        &self.space
    }

    pub(crate) fn attach_logger<L: WriteNavLog + 'static>(&mut self, logger: L) {
        self.logger = Some(Box::new(logger));
    }

    pub(crate) fn detach_logger(&mut self) -> Option<Box<dyn WriteNavLog>> {
        self.logger.take()
    }

    fn log_routine_start(&mut self, desc: &'static str) -> Result<(), Error> {
        if let Some(logger) = &mut self.logger {
            logger.log_routine_start(desc).map_err(logger_failed)?;
        }
        Ok(())
    }

    fn log_routine_end(&mut self) -> Result<(), Error> {
        if let Some(logger) = &mut self.logger {
            logger.log_routine_end().map_err(logger_failed)?;
        }
        Ok(())
    }

    fn log_step(&mut self, response: &StepResponse) -> Result<(), Error> {
        if let Some(logger) = &mut self.logger {
            logger.log_step(response).map_err(logger_failed)?;
        }
        Ok(())
    }
}

impl<B, S> Kernel<B, S>
where
    B: BuildScalarization,
    S: SolveSubproblem<Problem = B::Problem>,
{
    /// Wrapper around the solver collaborator with call logging and failure
    /// promotion
    fn solve_subproblem(
        &mut self,
        problem: B::Problem,
        target: &str,
        objective: Option<&str>,
    ) -> Result<SolverResults, Error> {
        self.stats.n_subproblem_calls += 1;
        let results = self
            .solver
            .solve_subproblem(problem, target)
            .map_err(|err| Error::subproblem(objective, format!("{err:#}")))?;
        if let Some(logger) = &mut self.logger {
            logger
                .log_subproblem(target, &results)
                .map_err(logger_failed)?;
        }
        if !results.success {
            return Err(Error::subproblem(objective, results.message));
        }
        Ok(results)
    }

    /// Computes the reachable region from a navigation point
    ///
    /// One epsilon-constraint sub-problem per objective: minimize the
    /// objective subject to every other objective staying at or below its
    /// corrected navigation-point value. The optimum becomes the bound on
    /// the objective's preferred side; the navigation point value itself
    /// becomes the complementary bound, reflecting that the reachable
    /// region only shrinks as navigation proceeds.
    pub fn reachable_bounds(
        &mut self,
        navigation_point: &ObjectivePoint,
    ) -> Result<ReachableBounds, Error> {
        self.log_routine_start("reachable bounds")?;
        self.stats.n_bounds_computations += 1;
        let corrected_nav = self.space.correct(navigation_point)?;
        let objs: Vec<_> = self
            .space
            .iter()
            .map(|obj| (String::from(obj.symbol()), obj.maximize()))
            .collect();
        let mut bounds = ReachableBounds::default();
        for (symbol, maximize) in objs {
            let mut eps_bounds = corrected_nav.clone();
            eps_bounds.remove(&symbol);
            let (problem, target) = self
                .builder
                .build_epsilon_constraint(&symbol, &eps_bounds)
                .map_err(|err| Error::subproblem(Some(&symbol), format!("{err:#}")))?;
            let results = self.solve_subproblem(problem, &target, Some(&symbol))?;
            let optimum = ObjectiveSpace::value(&results.optimal_objectives, &symbol)?;
            let nav_val = corrected_nav[&symbol];
            if optimum > nav_val + BOUND_TOLERANCE {
                return Err(Error::subproblem(
                    Some(&symbol),
                    format!("optimum {optimum} lies outside the reachable region ({nav_val})"),
                ));
            }
            // corrected space: the optimum is the best value, the
            // navigation point the worst; uncorrecting swaps the roles for
            // maximized objectives
            let (lower, upper) = if maximize {
                (-nav_val, -optimum)
            } else {
                (optimum, nav_val)
            };
            bounds.lower_bounds.insert(symbol.clone(), lower);
            bounds.upper_bounds.insert(symbol, upper);
        }
        if let Some(logger) = &mut self.logger {
            logger.log_bounds(&bounds).map_err(logger_failed)?;
        }
        self.log_routine_end()?;
        Ok(bounds)
    }

    /// Projects a reference point onto the reachable region via an
    /// achievement scalarization
    ///
    /// The previous navigation point enters as a lower-bound constraint so
    /// the projected solution is never worse than it. Anchor and previous
    /// point are in true units; so is the returned solution.
    pub fn project_achievement(
        &mut self,
        anchor: &ObjectivePoint,
        previous_point: &ObjectivePoint,
    ) -> Result<ObjectivePoint, Error> {
        self.log_routine_start("project reachable solution")?;
        self.stats.n_projections += 1;
        let anchor = self.space.correct(anchor)?;
        let lower_bounds = self.space.correct(previous_point)?;
        let (problem, target) = self
            .builder
            .build_achievement(&anchor, &lower_bounds)
            .map_err(|err| Error::subproblem(None, format!("{err:#}")))?;
        let results = self.solve_subproblem(problem, &target, None)?;
        let solution = self.space.correct(&results.optimal_objectives)?;
        self.log_routine_end()?;
        Ok(solution)
    }

    /// Projects a weight vector onto the reachable region via a weighted
    /// scalarization
    ///
    /// Weights apply to corrected values and need no correction themselves.
    pub fn project_weighted(
        &mut self,
        weights: &ObjectivePoint,
        previous_point: &ObjectivePoint,
    ) -> Result<ObjectivePoint, Error> {
        self.log_routine_start("project reachable solution")?;
        self.stats.n_projections += 1;
        let lower_bounds = self.space.correct(previous_point)?;
        let (problem, target) = self
            .builder
            .build_weighted(weights, &lower_bounds)
            .map_err(|err| Error::subproblem(None, format!("{err:#}")))?;
        let results = self.solve_subproblem(problem, &target, None)?;
        let solution = self.space.correct(&results.optimal_objectives)?;
        self.log_routine_end()?;
        Ok(solution)
    }

    /// Builds the initialization response: navigation point on the nadir,
    /// initial reachable region, distance 0
    pub fn initialize_response(&mut self) -> Result<StepResponse, Error> {
        self.log_routine_start("initialize")?;
        let navigation_point = self.space.nadir_point();
        let reachable_bounds = self.reachable_bounds(&navigation_point)?;
        let response = StepResponse {
            step_number: 0,
            navigation_point,
            reachable_solution: None,
            reachable_bounds,
            distance_to_front: 0.,
            preference: None,
        };
        self.log_step(&response)?;
        self.log_routine_end()?;
        Ok(response)
    }

    /// Composes one navigation step from an already resolved reachable
    /// solution: updates the navigation point, recomputes bounds and
    /// distance, and stamps the next step number
    pub fn step_response(
        &mut self,
        previous: &StepResponse,
        reachable_solution: ObjectivePoint,
        preference: Option<Preference>,
        steps_remaining: usize,
    ) -> Result<StepResponse, Error> {
        if steps_remaining == 0 {
            return Err(Error::InvalidStepCount(steps_remaining));
        }
        let navigation_point = next_navigation_point(
            &self.space,
            &previous.navigation_point,
            &reachable_solution,
            steps_remaining,
        )?;
        let reachable_bounds = self.reachable_bounds(&navigation_point)?;
        let distance_to_front =
            distance_to_front(&self.space, &navigation_point, &reachable_solution)?;
        self.stats.n_steps += 1;
        let response = StepResponse {
            step_number: previous.step_number + 1,
            navigation_point,
            reachable_solution: Some(reachable_solution),
            reachable_bounds,
            distance_to_front,
            preference,
        };
        self.log_step(&response)?;
        Ok(response)
    }
}

fn logger_failed(err: anyhow::Error) -> Error {
    Error::Logger(format!("{err:#}"))
}

#[cfg(test)]
mod tests {
    use super::{distance_to_front, next_navigation_point};
    use crate::{
        error::Error,
        types::{ObjectivePoint, ObjectiveSpace, ObjectiveSpec},
    };

    fn two_obj_space() -> ObjectiveSpace {
        ObjectiveSpace::new([
            ObjectiveSpec {
                symbol: String::from("f1"),
                maximize: false,
                ideal: Some(0.),
                nadir: Some(10.),
            },
            ObjectiveSpec {
                symbol: String::from("f2"),
                maximize: false,
                ideal: Some(0.),
                nadir: Some(10.),
            },
        ])
        .unwrap()
    }

    fn point(f1: f64, f2: f64) -> ObjectivePoint {
        [(String::from("f1"), f1), (String::from("f2"), f2)]
            .into_iter()
            .collect()
    }

    #[test]
    fn one_fifth_of_the_way() {
        let space = two_obj_space();
        let next =
            next_navigation_point(&space, &point(10., 10.), &point(2., 2.), 5).unwrap();
        assert_eq!(next, point(8.4, 8.4));
    }

    #[test]
    fn last_step_reaches_the_solution() {
        let space = two_obj_space();
        let next = next_navigation_point(&space, &point(4., 6.), &point(2., 2.), 1).unwrap();
        assert_eq!(next, point(2., 2.));
    }

    #[test]
    fn zero_steps_is_a_caller_error() {
        let space = two_obj_space();
        assert_eq!(
            next_navigation_point(&space, &point(10., 10.), &point(2., 2.), 0),
            Err(Error::InvalidStepCount(0))
        );
    }

    #[test]
    fn distance_is_zero_at_the_nadir() {
        let space = two_obj_space();
        let dist = distance_to_front(&space, &point(10., 10.), &point(2., 2.)).unwrap();
        assert_eq!(dist, 0.);
    }

    #[test]
    fn distance_is_full_at_the_solution() {
        let space = two_obj_space();
        let dist = distance_to_front(&space, &point(2., 2.), &point(2., 2.)).unwrap();
        assert!((dist - 100.).abs() < 1e-9);
    }

    #[test]
    fn distance_stays_in_range_along_the_walk() {
        let space = two_obj_space();
        let mut nav = point(10., 10.);
        let reach = point(1., 3.);
        for remaining in (1..=7).rev() {
            nav = next_navigation_point(&space, &nav, &reach, remaining).unwrap();
            let dist = distance_to_front(&space, &nav, &reach).unwrap();
            assert!((0. ..=100. + 1e-9).contains(&dist));
        }
    }

    #[test]
    fn nadir_solution_is_rejected() {
        let space = two_obj_space();
        assert!(distance_to_front(&space, &point(10., 10.), &point(10., 10.)).is_err());
    }
}
