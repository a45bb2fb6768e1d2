use ndarray::{Array1, Array2, Axis};

/// A policy mapping observations to actions.
pub trait Actor {
    /// One action row per observation row.
    fn a_batch(&self, observations: &Array2<f32>) -> Array2<f32>;

    fn a(&self, observation: &[f32]) -> Vec<f32> {
        let observations = Array1::from(observation.to_vec()).insert_axis(Axis(0));
        self.a_batch(&observations).row(0).to_vec()
    }
}

