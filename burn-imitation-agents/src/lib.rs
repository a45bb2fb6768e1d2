//! Behavioral cloning and DAgger trainers, and the command-line surface of the
//! `behavioral_cloning`, `dagger` and `run_expert` programs.

use burn::prelude::Backend;
use burn_imitation::module::nn::multi_layer_perceptron::MultiLayerPerceptron;

pub mod behavioral_cloning;
pub mod cli;
pub mod dagger;
pub mod evaluation;
pub mod learner;

/// What a finished training run hands back to its caller.
#[derive(Debug)]
pub struct TrainingOutcome<B: Backend> {
    /// The trained network, dropout disabled.
    pub policy: MultiLayerPerceptron<B>,
    /// Evaluation loss at every evaluation point.
    pub losses: Vec<f64>,
    pub validation_loss: f64,
    /// Rows in the training set at the end, including aggregated ones.
    pub training_rows: usize,
}
