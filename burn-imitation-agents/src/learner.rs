use std::path::Path;

use burn::{
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use burn_imitation::{
    data::{
        dataset::{Batch, DatasetError, ExpertDataset},
        rollout::RolloutError,
        util::{to_scalar, to_tensor},
    },
    environment::Environment,
    logging::{plot_losses, PlotError},
    module::nn::multi_layer_perceptron::{MultiLayerPerceptron, MultiLayerPerceptronConfig},
    objective::imitation::{ImitationLoss, ImitationLossConfig},
    schedule::LearningRateSchedule,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Rollout(#[from] RolloutError),
    #[error(transparent)]
    Plot(#[from] PlotError),
    #[error("training dataset is empty")]
    EmptyDataset,
    #[error(
        "{source_name} is {observations} -> {actions} wide but the policy maps {input} -> {output}"
    )]
    WidthMismatch {
        source_name: &'static str,
        observations: usize,
        actions: usize,
        input: usize,
        output: usize,
    },
}

/// Redraws the loss plot at `path`, if there is one, once there are at least `min_points` losses.
pub fn redraw_losses(
    path: Option<&Path>,
    losses: &[f64],
    min_points: usize,
) -> Result<(), TrainingError> {
    match path {
        Some(path) if losses.len() >= min_points => Ok(plot_losses(path, losses)?),
        _ => Ok(()),
    }
}

/// Fails unless the environment produces and consumes rows as wide as `dataset`.
pub fn check_environment<E: Environment>(
    env: &E,
    dataset: &ExpertDataset,
) -> Result<(), TrainingError> {
    if env.observation_size() != dataset.observation_size()
        || env.action_size() != dataset.action_size()
    {
        return Err(TrainingError::WidthMismatch {
            source_name: "environment",
            observations: env.observation_size(),
            actions: env.action_size(),
            input: dataset.observation_size(),
            output: dataset.action_size(),
        });
    }
    Ok(())
}

/// Losses of one optimizer step. `eval_loss` is measured with dropout disabled,
/// before the parameters change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateStats {
    pub loss: f64,
    pub eval_loss: f64,
}

/// Regresses the policy network onto expert actions.
pub struct Learner<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<MultiLayerPerceptron<B>, B>,
{
    model: MultiLayerPerceptron<B>,
    optim: O,
    loss: ImitationLoss,
    schedule: LearningRateSchedule,
    global_step: usize,
    device: B::Device,
}

/// A one-hidden-layer policy sized for `dataset`, trained with Adam.
pub fn init_learner<B: AutodiffBackend>(
    dataset: &ExpertDataset,
    hidden_size: usize,
    dropout: f64,
    optimizer: &AdamConfig,
    loss: &ImitationLossConfig,
    schedule: &LearningRateSchedule,
    device: &B::Device,
) -> Learner<B, impl Optimizer<MultiLayerPerceptron<B>, B>> {
    let model = MultiLayerPerceptronConfig::new(vec![
        dataset.observation_size(),
        hidden_size,
        dataset.action_size(),
    ])
    .with_dropout(dropout)
    .init(device);
    Learner::new(model, optimizer.init(), loss.init(), schedule.clone(), device)
}

impl<B, O> Learner<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<MultiLayerPerceptron<B>, B>,
{
    pub fn new(
        model: MultiLayerPerceptron<B>,
        optim: O,
        loss: ImitationLoss,
        schedule: LearningRateSchedule,
        device: &B::Device,
    ) -> Self {
        Self {
            model,
            optim,
            loss,
            schedule,
            global_step: 0,
            device: device.clone(),
        }
    }

    pub fn global_step(&self) -> usize {
        self.global_step
    }

    pub fn input_size(&self) -> usize {
        self.model.input_size()
    }

    pub fn output_size(&self) -> usize {
        self.model.output_size()
    }

    /// Fails unless `dataset` rows fit the network input and output widths.
    pub fn check_widths(
        &self,
        source_name: &'static str,
        dataset: &ExpertDataset,
    ) -> Result<(), TrainingError> {
        if dataset.observation_size() != self.input_size()
            || dataset.action_size() != self.output_size()
        {
            return Err(TrainingError::WidthMismatch {
                source_name,
                observations: dataset.observation_size(),
                actions: dataset.action_size(),
                input: self.input_size(),
                output: self.output_size(),
            });
        }
        Ok(())
    }

    pub fn update(&mut self, batch: &Batch) -> UpdateStats {
        let eval_loss = self.evaluate(batch);

        let observations = to_tensor::<B>(&batch.observations, &self.device);
        let actions = to_tensor::<B>(&batch.actions, &self.device);
        let loss = self.loss.forward(self.model.forward(observations), actions);
        let grads = GradientsParams::from_grads(loss.backward(), &self.model);

        let learning_rate = self.schedule.learning_rate(self.global_step);
        self.model = self.optim.step(learning_rate, self.model.clone(), grads);
        self.global_step += 1;

        UpdateStats {
            loss: to_scalar(loss),
            eval_loss,
        }
    }

    /// Loss on `batch` without dropout.
    pub fn evaluate(&self, batch: &Batch) -> f64 {
        let model = self.model.valid();
        let observations = to_tensor::<B::InnerBackend>(&batch.observations, &self.device);
        let actions = to_tensor::<B::InnerBackend>(&batch.actions, &self.device);
        to_scalar(self.loss.forward(model.forward(observations), actions))
    }

    /// The current network for inference.
    pub fn policy(&self) -> MultiLayerPerceptron<B::InnerBackend> {
        self.model.valid()
    }
}

#[cfg(test)]
mod tests {
    use burn::backend::{Autodiff, NdArray};
    use burn_imitation::module::component::Actor;
    use ndarray::{array, Array1, Array2};

    use super::*;

    type B = Autodiff<NdArray>;

    fn linear_dataset() -> ExpertDataset {
        let observations = Array2::from_shape_fn((64, 2), |(i, j)| ((i * 7 + j * 3) % 11) as f32 / 11.0);
        let actions = observations.map_axis(ndarray::Axis(1), |row| row[0] - 0.5 * row[1]);
        ExpertDataset::new(
            observations,
            actions.insert_axis(ndarray::Axis(1)),
            Array1::zeros(0),
        )
        .unwrap()
    }

    fn learner(
        dataset: &ExpertDataset,
        dropout: f64,
    ) -> Learner<B, impl Optimizer<MultiLayerPerceptron<B>, B>> {
        B::seed(42);
        init_learner::<B>(
            dataset,
            16,
            dropout,
            &AdamConfig::new(),
            &ImitationLossConfig::new(),
            &LearningRateSchedule::Constant {
                learning_rate: 0.01,
            },
            &Default::default(),
        )
    }

    #[test]
    fn test_widths_follow_dataset() {
        let dataset = linear_dataset();
        let learner = learner(&dataset, 0.0);
        assert_eq!(learner.input_size(), 2);
        assert_eq!(learner.output_size(), 1);
        learner.check_widths("training", &dataset).unwrap();

        let wide = ExpertDataset::new(array![[0.0, 0.0, 0.0]], array![[0.0]], array![]).unwrap();
        let err = learner.check_widths("validation", &wide).unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation is 3 -> 1 wide but the policy maps 2 -> 1"
        );
    }

    #[test]
    fn test_updates_reduce_loss() {
        let dataset = linear_dataset();
        let mut learner = learner(&dataset, 0.0);
        let batch = dataset.full();
        let before = learner.evaluate(&batch);
        let first = learner.update(&batch);
        assert_eq!(first.eval_loss, before);
        for _ in 0..200 {
            learner.update(&batch);
        }
        assert_eq!(learner.global_step(), 201);
        assert!(learner.evaluate(&batch) < before);

        let policy = learner.policy();
        assert_eq!(policy.a_batch(&batch.observations).dim(), (64, 1));
    }

    #[test]
    fn test_dropout_reaches_training_loss() {
        let dataset = linear_dataset();
        let batch = dataset.full();

        let mut plain = learner(&dataset, 0.0);
        let stats = plain.update(&batch);
        assert!((stats.loss - stats.eval_loss).abs() <= 1e-6 * stats.eval_loss.max(1.0));

        let mut dropped = learner(&dataset, 0.5);
        let stats = dropped.update(&batch);
        assert_ne!(stats.loss, stats.eval_loss);
    }
}
