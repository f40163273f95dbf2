//! # Discrete-Front Collaborators
//!
//! A reference implementation of the two collaborator seams over an
//! explicitly listed Pareto front sample. Scalarizations reduce to scoring
//! each row and picking the admissible minimizer, which makes this
//! collaborator exact, deterministic, and fast; it backs the bundled CLI
//! and the test suite. Continuous problems plug real optimization backends
//! into the same seams instead.

use anyhow::Context;
use itertools::izip;

use crate::{
    error::Error,
    oracle::{BuildScalarization, SolveSubproblem, SolverResults, VariableValue},
    types::{ObjectivePoint, ObjectiveSpace},
};

/// Numerical slack on admissibility checks against corrected bounds
const ADMISSIBLE_TOLERANCE: f64 = 1e-9;
/// Augmentation coefficient of the achievement scalarization
const RHO: f64 = 1e-6;

/// A scalarized sub-problem over a discrete front
///
/// All values are minimization-corrected and laid out in the front's
/// column order.
#[derive(Clone, Debug, PartialEq)]
pub enum DiscreteSubproblem {
    /// Minimize one column subject to bounds on the others
    EpsilonConstraint {
        /// The column to minimize
        target_idx: usize,
        /// Upper bound per column, `None` on the target
        bounds: Vec<Option<f64>>,
    },
    /// Minimize the augmented achievement function anchored at a point
    Achievement {
        /// The anchor per column
        anchor: Vec<f64>,
        /// Admissibility bound per column
        lower_bounds: Vec<f64>,
    },
    /// Minimize a weighted sum of the columns
    Weighted {
        /// The weight per column
        weights: Vec<f64>,
        /// Admissibility bound per column
        lower_bounds: Vec<f64>,
    },
}

/// A Pareto front given as an explicit list of points
#[derive(Clone, Debug, PartialEq)]
pub struct DiscreteFront {
    symbols: Vec<String>,
    ranges: Vec<f64>,
    /// Row-major corrected objective values, one row per front point
    rows: Vec<Vec<f64>>,
}

impl DiscreteFront {
    /// Builds the collaborator from the points of a front
    ///
    /// # Errors
    ///
    /// [`Error::IncompletePoint`] if a front point is missing an objective.
    pub fn new<'p, Points>(space: &ObjectiveSpace, front: Points) -> Result<Self, Error>
    where
        Points: IntoIterator<Item = &'p ObjectivePoint>,
    {
        let symbols: Vec<_> = space.iter().map(|obj| String::from(obj.symbol())).collect();
        let ranges = space.iter().map(|obj| obj.range()).collect();
        let rows = front
            .into_iter()
            .map(|point| {
                let corrected = space.correct(point)?;
                Ok(symbols.iter().map(|sym| corrected[sym]).collect())
            })
            .collect::<Result<_, _>>()?;
        Ok(DiscreteFront {
            symbols,
            ranges,
            rows,
        })
    }

    /// Gets the number of points in the front
    pub fn n_points(&self) -> usize {
        self.rows.len()
    }

    fn column(&self, symbol: &str) -> anyhow::Result<usize> {
        self.symbols
            .iter()
            .position(|sym| sym == symbol)
            .with_context(|| format!("unknown objective `{symbol}`"))
    }

    fn columns(&self, point: &ObjectivePoint) -> anyhow::Result<Vec<f64>> {
        self.symbols
            .iter()
            .map(|sym| {
                point
                    .get(sym)
                    .copied()
                    .with_context(|| format!("no value for objective `{sym}`"))
            })
            .collect()
    }

    fn admissible(&self, row: &[f64], problem: &DiscreteSubproblem) -> bool {
        let within = |row: &[f64], bounds: &[f64]| {
            row.iter()
                .zip(bounds)
                .all(|(&val, &bound)| val <= bound + ADMISSIBLE_TOLERANCE)
        };
        match problem {
            DiscreteSubproblem::EpsilonConstraint { bounds, .. } => row
                .iter()
                .zip(bounds)
                .all(|(&val, bound)| match bound {
                    Some(bound) => val <= bound + ADMISSIBLE_TOLERANCE,
                    None => true,
                }),
            DiscreteSubproblem::Achievement { lower_bounds, .. }
            | DiscreteSubproblem::Weighted { lower_bounds, .. } => within(row, lower_bounds),
        }
    }

    fn score(&self, row: &[f64], problem: &DiscreteSubproblem) -> f64 {
        match problem {
            DiscreteSubproblem::EpsilonConstraint { target_idx, .. } => row[*target_idx],
            DiscreteSubproblem::Achievement { anchor, .. } => {
                let scaled = || {
                    izip!(row, anchor, &self.ranges)
                        .map(|(&val, &anc, &range)| (val - anc) / range)
                };
                let max = scaled().fold(f64::NEG_INFINITY, f64::max);
                max + RHO * scaled().sum::<f64>()
            }
            DiscreteSubproblem::Weighted { weights, .. } => row
                .iter()
                .zip(weights)
                .map(|(&val, &weight)| weight * val)
                .sum(),
        }
    }

    fn results(&self, row_idx: usize) -> SolverResults {
        let row = &self.rows[row_idx];
        SolverResults {
            success: true,
            message: String::from("optimal"),
            optimal_objectives: self
                .symbols
                .iter()
                .zip(row)
                .map(|(sym, &val)| (sym.clone(), val))
                .collect(),
            optimal_variables: [(String::from("row"), VariableValue::Scalar(row_idx as f64))]
                .into_iter()
                .collect(),
        }
    }
}

impl BuildScalarization for DiscreteFront {
    type Problem = DiscreteSubproblem;

    fn build_epsilon_constraint(
        &self,
        target: &str,
        bounds: &ObjectivePoint,
    ) -> anyhow::Result<(DiscreteSubproblem, String)> {
        let target_idx = self.column(target)?;
        let bounds = self
            .symbols
            .iter()
            .map(|sym| bounds.get(sym).copied())
            .collect();
        Ok((
            DiscreteSubproblem::EpsilonConstraint { target_idx, bounds },
            String::from(target),
        ))
    }

    fn build_achievement(
        &self,
        anchor: &ObjectivePoint,
        lower_bounds: &ObjectivePoint,
    ) -> anyhow::Result<(DiscreteSubproblem, String)> {
        Ok((
            DiscreteSubproblem::Achievement {
                anchor: self.columns(anchor)?,
                lower_bounds: self.columns(lower_bounds)?,
            },
            String::from("asf"),
        ))
    }

    fn build_weighted(
        &self,
        weights: &ObjectivePoint,
        lower_bounds: &ObjectivePoint,
    ) -> anyhow::Result<(DiscreteSubproblem, String)> {
        Ok((
            DiscreteSubproblem::Weighted {
                weights: self.columns(weights)?,
                lower_bounds: self.columns(lower_bounds)?,
            },
            String::from("ws"),
        ))
    }
}

impl SolveSubproblem for DiscreteFront {
    type Problem = DiscreteSubproblem;

    fn solve_subproblem(
        &mut self,
        problem: DiscreteSubproblem,
        _target: &str,
    ) -> anyhow::Result<SolverResults> {
        let best = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| self.admissible(row.as_slice(), &problem))
            .min_by(|(_, row_a), (_, row_b)| {
                self.score(row_a.as_slice(), &problem)
                    .total_cmp(&self.score(row_b.as_slice(), &problem))
            })
            .map(|(idx, _)| idx);
        Ok(match best {
            Some(idx) => self.results(idx),
            None => SolverResults {
                success: false,
                message: String::from("no admissible point in the front"),
                optimal_objectives: Default::default(),
                optimal_variables: Default::default(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::DiscreteFront;
    use crate::{
        oracle::{BuildScalarization, SolveSubproblem, VariableValue},
        types::{ObjectivePoint, ObjectiveSpace, ObjectiveSpec},
    };

    fn space() -> ObjectiveSpace {
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

    fn front() -> Vec<ObjectivePoint> {
        vec![point(1., 9.), point(3., 5.), point(5., 3.), point(9., 1.)]
    }

    #[test]
    fn epsilon_constraint_minimizes_under_bounds() {
        let front = DiscreteFront::new(&space(), &front()).unwrap();
        let mut solver = front.clone();
        // f2 must stay at or below 5
        let (problem, target) = front
            .build_epsilon_constraint("f1", &[(String::from("f2"), 5.)].into_iter().collect())
            .unwrap();
        let results = solver.solve_subproblem(problem, &target).unwrap();
        assert!(results.success);
        assert_eq!(results.optimal_objectives, point(3., 5.));
        assert_eq!(
            results.optimal_variables["row"],
            VariableValue::Scalar(1.)
        );
    }

    #[test]
    fn achievement_picks_the_closest_admissible_point() {
        let front = DiscreteFront::new(&space(), &front()).unwrap();
        let mut solver = front.clone();
        let (problem, target) = front
            .build_achievement(&point(4.5, 3.5), &point(10., 10.))
            .unwrap();
        let results = solver.solve_subproblem(problem, &target).unwrap();
        assert!(results.success);
        assert_eq!(results.optimal_objectives, point(5., 3.));
    }

    #[test]
    fn weighted_sum_minimizes() {
        let front = DiscreteFront::new(&space(), &front()).unwrap();
        let mut solver = front.clone();
        let (problem, target) = front
            .build_weighted(&point(1., 0.1), &point(10., 10.))
            .unwrap();
        let results = solver.solve_subproblem(problem, &target).unwrap();
        assert_eq!(results.optimal_objectives, point(1., 9.));
    }

    #[test]
    fn empty_reachable_region_is_a_result_not_an_error() {
        let front = DiscreteFront::new(&space(), &front()).unwrap();
        let mut solver = front.clone();
        let (problem, target) = front
            .build_achievement(&point(0., 0.), &point(0.5, 0.5))
            .unwrap();
        let results = solver.solve_subproblem(problem, &target).unwrap();
        assert!(!results.success);
    }

    #[test]
    fn unknown_objective_is_a_builder_error() {
        let front = DiscreteFront::new(&space(), &front()).unwrap();
        assert!(front
            .build_epsilon_constraint("f9", &Default::default())
            .is_err());
    }

    #[test]
    fn front_points_must_be_complete() {
        let incomplete = vec![[(String::from("f1"), 1.)].into_iter().collect()];
        assert!(DiscreteFront::new(&space(), &incomplete).is_err());
    }

    #[test]
    fn maximized_objectives_are_corrected_in_rows() {
        let space = ObjectiveSpace::new([
            ObjectiveSpec {
                symbol: String::from("f1"),
                maximize: false,
                ideal: Some(0.),
                nadir: Some(10.),
            },
            ObjectiveSpec {
                symbol: String::from("f2"),
                maximize: true,
                ideal: Some(10.),
                nadir: Some(0.),
            },
        ])
        .unwrap();
        let front = DiscreteFront::new(&space, &[point(2., 8.)]).unwrap();
        let mut solver = front.clone();
        let (problem, target) = front
            .build_epsilon_constraint("f1", &[(String::from("f2"), -1.)].into_iter().collect())
            .unwrap();
        let results = solver.solve_subproblem(problem, &target).unwrap();
        // the row stores f2 as -8 in corrected form
        assert_eq!(results.optimal_objectives, point(2., -8.));
    }
}
