use burn::prelude::*;

/// Learning rate as a function of the number of optimizer steps taken so far.
#[derive(Config, Debug, PartialEq)]
pub enum LearningRateSchedule {
    Constant {
        learning_rate: f64,
    },
    /// `initial_learning_rate * decay_rate ^ (step / decay_steps)`, without staircase.
    ExponentialDecay {
        initial_learning_rate: f64,
        decay_steps: usize,
        decay_rate: f64,
    },
}

impl LearningRateSchedule {
    pub fn learning_rate(&self, step: usize) -> f64 {
        match *self {
            LearningRateSchedule::Constant { learning_rate } => learning_rate,
            LearningRateSchedule::ExponentialDecay {
                initial_learning_rate,
                decay_steps,
                decay_rate,
            } => initial_learning_rate * decay_rate.powf(step as f64 / decay_steps as f64),
        }
    }
}
