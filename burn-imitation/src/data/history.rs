use std::path::Path;

use super::array_file::{ArrayFile, ArrayFileError};

pub const LOSSES: &str = "losses";
pub const RETURNS: &str = "returns";

/// Outcome of a training run: the periodic evaluation losses and the returns of
/// the final rollouts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    pub losses: Vec<f64>,
    pub returns: Vec<f64>,
}

impl History {
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ArrayFileError> {
        let mut file = ArrayFile::new();
        file.insert_vector_f64(LOSSES, &self.losses);
        file.insert_vector_f64(RETURNS, &self.returns);
        file.save(path)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ArrayFileError> {
        let file = ArrayFile::load(path)?;
        Ok(History {
            losses: file.vector_f64(LOSSES)?.to_vec(),
            returns: file.vector_f64(RETURNS)?.to_vec(),
        })
    }
}
