//! # Error Taxonomy of the Navigation Engine
//!
//! Every fallible engine operation returns [`Error`]. Collaborator
//! malfunctions surface as [`Error::SubproblemFailure`] with the original
//! message attached; everything else is a semantic error in the caller's
//! input or a corrupted history.

/// Errors the navigation engine reports to its caller
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A step was requested with a step count of zero, or a fixed-budget
    /// navigation was asked to step past its last iteration
    #[error("invalid number of remaining steps: {0}")]
    InvalidStepCount(usize),
    /// A step request carried both a fresh preference and a solution to
    /// reuse, or neither
    #[error("step input must be exactly one of a preference or a reused solution")]
    AmbiguousStepInput,
    /// A scalarized sub-problem could not be solved
    #[error(
        "sub-problem for `{}` failed: {message}",
        .objective.as_deref().unwrap_or("scalarization")
    )]
    SubproblemFailure {
        /// The objective being bounded, if the failing sub-problem was an
        /// epsilon-constraint one
        objective: Option<String>,
        /// The solver's failure message
        message: String,
    },
    /// A decision maker's reference point does not strictly improve on the
    /// navigation point
    #[error(
        "reference point of `{dm}` does not improve on the navigation point in: {}",
        .objectives.join(", ")
    )]
    InferiorReferencePoint {
        /// The decision maker whose point was rejected
        dm: String,
        /// The objectives in which the point fails to improve
        objectives: Vec<String>,
    },
    /// A decision maker stayed silent on the first group step, so no
    /// earlier direction can be carried forward for them
    #[error("no initial preference for decision maker `{dm}`")]
    MissingInitialPreference {
        /// The silent decision maker
        dm: String,
    },
    /// An objective is missing its ideal or nadir value, carries a
    /// non-finite one, or its ideal is not strictly better than its nadir
    #[error("objective `{symbol}` has no usable ideal and nadir values")]
    UndefinedIdealOrNadir {
        /// The offending objective
        symbol: String,
    },
    /// A history is empty, skips a step number, or a step-back targets a
    /// step number no entry carries
    #[error("history has no valid entry for step number {step_number}")]
    HistoryIntegrity {
        /// The step number that could not be resolved
        step_number: usize,
    },
    /// A point is missing the value of an objective
    #[error("point is missing a value for objective `{symbol}`")]
    IncompletePoint {
        /// The missing objective
        symbol: String,
    },
    /// A preference of a kind the navigation method does not support, or
    /// with malformed content
    #[error("preference not usable: {0}")]
    UnsupportedPreference(String),
    /// A logger attached to the engine failed
    #[error("logger failed: {0}")]
    Logger(String),
}

impl Error {
    pub(crate) fn subproblem(objective: Option<&str>, message: impl Into<String>) -> Self {
        Error::SubproblemFailure {
            objective: objective.map(String::from),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn subproblem_display_names_the_objective() {
        let err = Error::subproblem(Some("f2"), "infeasible");
        assert_eq!(format!("{err}"), "sub-problem for `f2` failed: infeasible");
        let err = Error::subproblem(None, "no admissible solution");
        assert_eq!(
            format!("{err}"),
            "sub-problem for `scalarization` failed: no admissible solution"
        );
    }

    #[test]
    fn inferior_point_lists_objectives() {
        let err = Error::InferiorReferencePoint {
            dm: String::from("dm1"),
            objectives: vec![String::from("f1"), String::from("f3")],
        };
        assert_eq!(
            format!("{err}"),
            "reference point of `dm1` does not improve on the navigation point in: f1, f3"
        );
    }
}
