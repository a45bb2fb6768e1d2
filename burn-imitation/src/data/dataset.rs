use std::path::Path;

use ndarray::{concatenate, s, Array1, Array2, Axis};
use thiserror::Error;
use tracing::debug;

use super::array_file::{ArrayFile, ArrayFileError};

pub const OBSERVATIONS: &str = "observations";
pub const ACTIONS: &str = "actions";
pub const RETURNS: &str = "returns";

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error(transparent)]
    File(#[from] ArrayFileError),
    #[error("{observations} observation rows but {actions} action rows")]
    RowMismatch { observations: usize, actions: usize },
    #[error("{name} width {found} does not match dataset width {expected}")]
    WidthMismatch {
        name: &'static str,
        found: usize,
        expected: usize,
    },
}

/// Paired observation / action rows for supervised training.
#[derive(Debug, Clone)]
pub struct Batch {
    pub observations: Array2<f32>,
    pub actions: Array2<f32>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.observations.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Expert demonstrations: one row per visited state, plus the return of every
/// recorded episode.
#[derive(Debug, Clone)]
pub struct ExpertDataset {
    observations: Array2<f32>,
    actions: Array2<f32>,
    returns: Array1<f64>,
}

impl ExpertDataset {
    pub fn new(
        observations: Array2<f32>,
        actions: Array2<f32>,
        returns: Array1<f64>,
    ) -> Result<Self, DatasetError> {
        if observations.nrows() != actions.nrows() {
            return Err(DatasetError::RowMismatch {
                observations: observations.nrows(),
                actions: actions.nrows(),
            });
        }
        Ok(ExpertDataset {
            observations,
            actions,
            returns,
        })
    }

    /// Reads `observations`, `actions` and `returns`. Training data must carry the
    /// expert returns, they are reported next to the learner's.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let file = Self::read(&path)?;
        Self::new(
            file.matrix(OBSERVATIONS)?,
            file.matrix(ACTIONS)?,
            file.vector_f64(RETURNS)?,
        )
    }

    /// Like [`ExpertDataset::load`], but `returns` may be absent.
    pub fn load_validation<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let file = Self::read(&path)?;
        let returns = match file.contains(RETURNS) {
            true => file.vector_f64(RETURNS)?,
            false => Array1::zeros(0),
        };
        Self::new(file.matrix(OBSERVATIONS)?, file.matrix(ACTIONS)?, returns)
    }

    fn read<P: AsRef<Path>>(path: P) -> Result<ArrayFile, DatasetError> {
        let file = ArrayFile::load(&path)?;
        debug!(path = %path.as_ref().display(), arrays = ?file.names().collect::<Vec<_>>(), "loading expert data");
        Ok(file)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DatasetError> {
        let mut file = ArrayFile::new();
        file.insert_matrix(OBSERVATIONS, &self.observations);
        file.insert_matrix(ACTIONS, &self.actions);
        file.insert_vector_f64(RETURNS, &self.returns.to_vec());
        file.save(path)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.observations.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn observation_size(&self) -> usize {
        self.observations.ncols()
    }

    pub fn action_size(&self) -> usize {
        self.actions.ncols()
    }

    pub fn observations(&self) -> &Array2<f32> {
        &self.observations
    }

    pub fn actions(&self) -> &Array2<f32> {
        &self.actions
    }

    pub fn returns(&self) -> &Array1<f64> {
        &self.returns
    }

    /// The `index`-th contiguous batch of `batch_size` rows.
    pub fn batch(&self, index: usize, batch_size: usize) -> Batch {
        let start = (index * batch_size).min(self.len());
        let end = (start + batch_size).min(self.len());
        Batch {
            observations: self.observations.slice(s![start..end, ..]).to_owned(),
            actions: self.actions.slice(s![start..end, ..]).to_owned(),
        }
    }

    /// Gathers the given rows; indices may repeat.
    pub fn select(&self, indices: &[usize]) -> Batch {
        Batch {
            observations: self.observations.select(Axis(0), indices),
            actions: self.actions.select(Axis(0), indices),
        }
    }

    pub fn full(&self) -> Batch {
        Batch {
            observations: self.observations.clone(),
            actions: self.actions.clone(),
        }
    }

    /// Appends rows at the end. Duplicates of existing rows are kept.
    pub fn append(&mut self, batch: Batch) -> Result<(), DatasetError> {
        let Batch {
            observations,
            actions,
        } = batch;
        if observations.nrows() != actions.nrows() {
            return Err(DatasetError::RowMismatch {
                observations: observations.nrows(),
                actions: actions.nrows(),
            });
        }
        if observations.ncols() != self.observation_size() {
            return Err(DatasetError::WidthMismatch {
                name: OBSERVATIONS,
                found: observations.ncols(),
                expected: self.observation_size(),
            });
        }
        if actions.ncols() != self.action_size() {
            return Err(DatasetError::WidthMismatch {
                name: ACTIONS,
                found: actions.ncols(),
                expected: self.action_size(),
            });
        }
        self.observations = concatenate![Axis(0), self.observations, observations];
        self.actions = concatenate![Axis(0), self.actions, actions];
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use expect_test::expect;
    use ndarray::array;

    use super::*;

    fn dataset() -> ExpertDataset {
        ExpertDataset::new(
            array![[0.0, 0.0], [1.0, 1.0], [2.0, 2.0], [3.0, 3.0], [4.0, 4.0]],
            array![[0.0], [10.0], [20.0], [30.0], [40.0]],
            array![1.0, 2.0],
        )
        .unwrap()
    }

    #[test]
    fn test_row_mismatch() {
        let err = ExpertDataset::new(array![[0.0], [1.0]], array![[0.0]], array![]).unwrap_err();
        expect!["2 observation rows but 1 action rows"].assert_eq(&err.to_string());
    }

    #[test]
    fn test_batches() {
        let data = dataset();
        assert_eq!(data.batch(1, 2).actions, array![[20.0], [30.0]]);
        assert_eq!(data.batch(2, 2).len(), 1);
        assert!(data.batch(3, 2).is_empty());
        let batch = data.select(&[4, 0, 4]);
        assert_eq!(batch.observations, array![[4.0, 4.0], [0.0, 0.0], [4.0, 4.0]]);
        assert_eq!(batch.actions, array![[40.0], [0.0], [40.0]]);
    }

    #[test]
    fn test_append_keeps_duplicates() {
        let mut data = dataset();
        let repeated = data.select(&[0, 1]);
        data.append(repeated).unwrap();
        assert_eq!(data.len(), 7);
        assert_eq!(data.actions().row(5).to_vec(), vec![0.0]);
        assert_eq!(data.returns().len(), 2);

        let err = data
            .append(Batch {
                observations: array![[1.0, 2.0, 3.0]],
                actions: array![[1.0]],
            })
            .unwrap_err();
        expect!["observations width 3 does not match dataset width 2"].assert_eq(&err.to_string());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("expert.safetensors");
        dataset().save(&path).unwrap();

        let loaded = ExpertDataset::load(&path).unwrap();
        assert_eq!(loaded.len(), 5);
        assert_eq!(loaded.observation_size(), 2);
        assert_eq!(loaded.action_size(), 1);
        assert_eq!(loaded.returns(), &array![1.0, 2.0]);
    }

    #[test]
    fn test_training_data_requires_returns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("validation.safetensors");
        let mut file = ArrayFile::new();
        file.insert_matrix(OBSERVATIONS, &array![[0.5, 0.5]]);
        file.insert_matrix(ACTIONS, &array![[1.0]]);
        file.save(&path).unwrap();

        let err = ExpertDataset::load(&path).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::File(ArrayFileError::Missing(ref name)) if name == RETURNS
        ));

        let loaded = ExpertDataset::load_validation(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.returns().is_empty());
    }
}
