//! # Types
//!
//! Shared types for the navigation engine: the objective space model and the
//! data carried through a navigation session.
//!
//! All navigation mathematics runs on a _minimization-corrected_
//! representation where the value of a maximized objective is negated.
//! [`ObjectiveSpace::correct`] is the only place this flip happens; it is
//! applied at every solver boundary and undone at every public boundary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A full assignment of values to objectives, keyed by objective symbol
pub type ObjectivePoint = BTreeMap<String, f64>;

/// The caller-facing description of one objective
///
/// `ideal` and `nadir` may be left out in serialized problem descriptions,
/// but [`ObjectiveSpace::new`] rejects objectives where either is missing,
/// non-finite, or where the ideal is not strictly better than the nadir:
/// every bounds and distance computation depends on them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveSpec {
    /// The objective's symbol, unique within a problem
    pub symbol: String,
    /// Whether the objective is maximized
    #[serde(default)]
    pub maximize: bool,
    /// The best value attainable over the Pareto front
    pub ideal: Option<f64>,
    /// The worst value over the Pareto front
    pub nadir: Option<f64>,
}

/// A validated objective
#[derive(Clone, Debug, PartialEq)]
pub struct Objective {
    symbol: String,
    maximize: bool,
    ideal: f64,
    nadir: f64,
}

impl Objective {
    /// Gets the objective's symbol
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Checks whether the objective is maximized
    pub fn maximize(&self) -> bool {
        self.maximize
    }

    /// Gets the ideal value in true units
    pub fn ideal(&self) -> f64 {
        self.ideal
    }

    /// Gets the nadir value in true units
    pub fn nadir(&self) -> f64 {
        self.nadir
    }

    /// Flips a value into minimization-corrected form, or back
    ///
    /// The correction is an involution: applying it twice is the identity.
    pub fn correct_value(&self, value: f64) -> f64 {
        if self.maximize {
            -value
        } else {
            value
        }
    }

    /// Gets the corrected range `nadir - ideal` (always positive)
    pub fn range(&self) -> f64 {
        self.correct_value(self.nadir) - self.correct_value(self.ideal)
    }
}

/// The immutable objective space of a problem
///
/// Construction validates that every objective carries finite ideal and
/// nadir values; all later computation relies on that.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectiveSpace {
    objs: Vec<Objective>,
}

impl ObjectiveSpace {
    /// Validates a set of objective specs into an objective space
    ///
    /// # Errors
    ///
    /// [`Error::UndefinedIdealOrNadir`] if an objective is missing either
    /// bound, has a non-finite bound, or its ideal is not strictly better
    /// than its nadir.
    pub fn new<Specs>(specs: Specs) -> Result<Self, Error>
    where
        Specs: IntoIterator<Item = ObjectiveSpec>,
    {
        let objs: Vec<_> = specs
            .into_iter()
            .map(|spec| {
                let undefined = || Error::UndefinedIdealOrNadir {
                    symbol: spec.symbol.clone(),
                };
                let (Some(ideal), Some(nadir)) = (spec.ideal, spec.nadir) else {
                    return Err(undefined());
                };
                if !ideal.is_finite() || !nadir.is_finite() {
                    return Err(undefined());
                }
                let obj = Objective {
                    symbol: spec.symbol,
                    maximize: spec.maximize,
                    ideal,
                    nadir,
                };
                if obj.range() <= 0. {
                    return Err(Error::UndefinedIdealOrNadir { symbol: obj.symbol });
                }
                Ok(obj)
            })
            .collect::<Result<_, _>>()?;
        Ok(ObjectiveSpace { objs })
    }

    /// Gets the number of objectives
    pub fn n_objs(&self) -> usize {
        self.objs.len()
    }

    /// Gets an iterator over the objectives
    pub fn iter(&self) -> std::slice::Iter<'_, Objective> {
        self.objs.iter()
    }

    /// Looks an objective up by symbol
    pub fn objective(&self, symbol: &str) -> Option<&Objective> {
        self.objs.iter().find(|obj| obj.symbol == symbol)
    }

    /// Gets the ideal point in true units
    pub fn ideal_point(&self) -> ObjectivePoint {
        self.objs
            .iter()
            .map(|obj| (obj.symbol.clone(), obj.ideal))
            .collect()
    }

    /// Gets the nadir point in true units
    pub fn nadir_point(&self) -> ObjectivePoint {
        self.objs
            .iter()
            .map(|obj| (obj.symbol.clone(), obj.nadir))
            .collect()
    }

    /// Gets the value a point assigns to an objective
    ///
    /// # Errors
    ///
    /// [`Error::IncompletePoint`] if the point has no entry for the symbol.
    pub fn value(point: &ObjectivePoint, symbol: &str) -> Result<f64, Error> {
        point.get(symbol).copied().ok_or(Error::IncompletePoint {
            symbol: String::from(symbol),
        })
    }

    /// Flips a point into minimization-corrected form, or back
    ///
    /// The result only contains entries for the space's objectives; extra
    /// entries in the input are dropped. Since the correction is an
    /// involution, the same function maps corrected points back to true
    /// units.
    ///
    /// # Errors
    ///
    /// [`Error::IncompletePoint`] if the point is missing an objective.
    pub fn correct(&self, point: &ObjectivePoint) -> Result<ObjectivePoint, Error> {
        self.objs
            .iter()
            .map(|obj| {
                let val = Self::value(point, &obj.symbol)?;
                Ok((obj.symbol.clone(), obj.correct_value(val)))
            })
            .collect()
    }

    /// Gets the minimization-corrected nadir point
    pub fn corrected_nadir(&self) -> ObjectivePoint {
        self.objs
            .iter()
            .map(|obj| (obj.symbol.clone(), obj.correct_value(obj.nadir)))
            .collect()
    }

    /// Gets the minimization-corrected ideal point
    pub fn corrected_ideal(&self) -> ObjectivePoint {
        self.objs
            .iter()
            .map(|obj| (obj.symbol.clone(), obj.correct_value(obj.ideal)))
            .collect()
    }
}

/// The box of objective values attainable from the current navigation point
///
/// Both maps are in true units and hold one entry per objective. The lower
/// bound is always numerically below the upper bound; which of the two is
/// the _better_ one depends on the objective's optimization direction.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReachableBounds {
    /// Numerically smallest attainable value per objective
    pub lower_bounds: ObjectivePoint,
    /// Numerically largest attainable value per objective
    pub upper_bounds: ObjectivePoint,
}

/// A decision maker's stated preference, the input to one navigation step
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Preference {
    /// A desirable objective vector the navigation should approach
    ReferencePoint {
        /// The reference point in true units
        point: ObjectivePoint,
    },
    /// Importance ranks per objective, `1` being the most important to
    /// improve
    Ranks {
        /// The rank per objective symbol
        ranks: BTreeMap<String, u32>,
    },
    /// Improvement shares per objective, expected to sum to 100
    Percentages {
        /// The share per objective symbol
        percentages: BTreeMap<String, f64>,
    },
    /// Per-decision-maker reference points with the improvement directions
    /// derived from them
    Group(GroupPreference),
}

impl Preference {
    /// Gets the preference kind as it appears in serialized form
    pub fn kind(&self) -> &'static str {
        match self {
            Preference::ReferencePoint { .. } => "reference-point",
            Preference::Ranks { .. } => "ranks",
            Preference::Percentages { .. } => "percentages",
            Preference::Group(..) => "group",
        }
    }
}

/// The aggregated preference state of a NAUTILI group step
///
/// `reference_points` holds the points the decision makers supplied for
/// this step; `improvement_directions` and `group_direction` are derived by
/// the aggregator and carried forward for decision makers that stay silent
/// in a later step. Directions are minimization-corrected.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupPreference {
    /// Reference point per decision maker, in true units
    pub reference_points: BTreeMap<String, ObjectivePoint>,
    /// Derived improvement direction per decision maker
    pub improvement_directions: BTreeMap<String, ObjectivePoint>,
    /// The consensus improvement direction
    pub group_direction: ObjectivePoint,
}

/// The outcome of one navigation step, the unit of history
///
/// Created exactly once per step or initialization and immutable
/// afterwards; histories only ever append. Step numbers are not unique
/// across a history: stepping back and re-navigating appends a second entry
/// with an already used number, forming a branch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepResponse {
    /// The 1-based step number; 0 for the initialization response
    pub step_number: usize,
    /// The navigation point after this step, in true units
    pub navigation_point: ObjectivePoint,
    /// The reachable solution that drove this step; `None` only on the
    /// initialization response
    pub reachable_solution: Option<ObjectivePoint>,
    /// The reachable region computed from the navigation point
    pub reachable_bounds: ReachableBounds,
    /// Progress towards the Pareto front in percent
    pub distance_to_front: f64,
    /// The preference that produced this step; `None` only on the
    /// initialization response
    pub preference: Option<Preference>,
}

#[cfg(test)]
mod tests {
    use super::{ObjectiveSpace, ObjectiveSpec};
    use crate::error::Error;

    fn spec(symbol: &str, maximize: bool, ideal: f64, nadir: f64) -> ObjectiveSpec {
        ObjectiveSpec {
            symbol: String::from(symbol),
            maximize,
            ideal: Some(ideal),
            nadir: Some(nadir),
        }
    }

    #[test]
    fn correction_flips_maximized_only() {
        let space =
            ObjectiveSpace::new([spec("f1", false, 0., 10.), spec("f2", true, 10., 0.)]).unwrap();
        let point = [(String::from("f1"), 3.), (String::from("f2"), 7.)]
            .into_iter()
            .collect();
        let corrected = space.correct(&point).unwrap();
        assert_eq!(corrected["f1"], 3.);
        assert_eq!(corrected["f2"], -7.);
        // involution
        assert_eq!(space.correct(&corrected).unwrap(), point);
    }

    #[test]
    fn undefined_nadir_is_fatal() {
        let mut broken = spec("f1", false, 0., 10.);
        broken.nadir = None;
        assert_eq!(
            ObjectiveSpace::new([broken]),
            Err(Error::UndefinedIdealOrNadir {
                symbol: String::from("f1")
            })
        );
    }

    #[test]
    fn non_finite_bound_is_fatal() {
        assert!(ObjectiveSpace::new([spec("f1", false, 0., f64::INFINITY)]).is_err());
    }

    #[test]
    fn degenerate_range_is_fatal() {
        assert!(ObjectiveSpace::new([spec("f1", false, 5., 5.)]).is_err());
        // a maximized objective must have its ideal above its nadir
        assert!(ObjectiveSpace::new([spec("f1", true, 0., 10.)]).is_err());
    }

    #[test]
    fn incomplete_point_is_reported() {
        let space = ObjectiveSpace::new([spec("f1", false, 0., 10.)]).unwrap();
        let empty = Default::default();
        assert_eq!(
            space.correct(&empty),
            Err(Error::IncompletePoint {
                symbol: String::from("f1")
            })
        );
    }
}
