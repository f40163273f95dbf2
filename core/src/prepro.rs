//! # Problem File Loading
//!
//! Problems for the discrete collaborator are stored as JSON: the list of
//! objective specs plus the sampled Pareto front. Loading validates the
//! objective space and corrects the front rows in one go.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::{
    discrete::DiscreteFront,
    types::{ObjectivePoint, ObjectiveSpace, ObjectiveSpec},
};

/// A serialized problem description for the discrete collaborator
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProblemFile {
    /// The objectives of the problem
    pub objectives: Vec<ObjectiveSpec>,
    /// The sampled Pareto front, one complete point per entry
    pub front: Vec<ObjectivePoint>,
}

impl ProblemFile {
    /// Loads a problem description from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("failed to open problem file {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to parse problem file {}", path.display()))
    }

    /// Validates the description into an objective space and the matching
    /// discrete collaborator
    pub fn build(&self) -> anyhow::Result<(ObjectiveSpace, DiscreteFront)> {
        let space = ObjectiveSpace::new(self.objectives.iter().cloned())?;
        let front = DiscreteFront::new(&space, &self.front)?;
        anyhow::ensure!(front.n_points() > 0, "problem file lists an empty front");
        Ok((space, front))
    }
}
