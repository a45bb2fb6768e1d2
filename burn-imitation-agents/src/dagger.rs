use std::marker::PhantomData;
use std::path::PathBuf;

use burn::config::Config;
use burn::optim::AdamConfig;
use burn::tensor::backend::AutodiffBackend;
use burn_imitation::data::dataset::{Batch, ExpertDataset};
use burn_imitation::data::rollout::simulate;
use burn_imitation::environment::Environment;
use burn_imitation::logging::ReturnStatistics;
use burn_imitation::module::component::Actor;
use burn_imitation::objective::imitation::ImitationLossConfig;
use burn_imitation::schedule::LearningRateSchedule;
use ndarray::Array2;
use rand::Rng;
use tqdm::tqdm;
use tracing::{debug, info};

use crate::learner::{check_environment, init_learner, redraw_losses, TrainingError};
use crate::TrainingOutcome;

#[derive(Config)]
pub struct DaggerConfig {
    #[config(default = 5_000)]
    epochs: usize,
    #[config(default = 1_000)]
    batch_size: usize,
    #[config(default = 1_000)]
    hidden_size: usize,
    #[config(default = 0.2)]
    dropout: f64,
    /// Each epoch applies `steps_per_epoch_factor * ceil(rows / batch_size)` updates
    /// to a single sampled batch.
    #[config(default = 5)]
    steps_per_epoch_factor: usize,
    #[config(default = 100)]
    evaluation_interval: usize,
    /// Aggregation only happens in epochs strictly after this one.
    #[config(default = 1_000)]
    aggregation_start: usize,
    #[config(default = 100)]
    aggregation_interval: usize,
    #[config(default = 1)]
    aggregation_rollouts: usize,
    #[config(default = "LearningRateSchedule::Constant { learning_rate: 0.001 }")]
    learning_rate: LearningRateSchedule,
    #[config(default = "ImitationLossConfig::new()")]
    loss: ImitationLossConfig,
    #[config(default = "AdamConfig::new()")]
    optimizer: AdamConfig,
}

/// Behavioral cloning that keeps rolling out the learner and asking the expert
/// what it should have done.
pub struct Dagger<B, E, X, R>
where
    B: AutodiffBackend,
    E: Environment,
    X: Actor,
    R: Rng,
{
    cfg: DaggerConfig,
    train: ExpertDataset,
    validation: ExpertDataset,
    env: E,
    expert: X,
    max_steps: usize,
    rng: R,
    device: B::Device,
    loss_plot: Option<PathBuf>,
    _phantom: PhantomData<B>,
}

impl DaggerConfig {
    #[allow(clippy::too_many_arguments)]
    pub fn init<B, E, X, R>(
        &self,
        train: ExpertDataset,
        validation: ExpertDataset,
        env: E,
        expert: X,
        max_steps: usize,
        rng: R,
        device: &B::Device,
    ) -> Result<Dagger<B, E, X, R>, TrainingError>
    where
        B: AutodiffBackend,
        E: Environment,
        X: Actor,
        R: Rng,
    {
        self.assertions();
        if train.is_empty() {
            return Err(TrainingError::EmptyDataset);
        }
        check_environment(&env, &train)?;
        Ok(Dagger {
            cfg: self.clone(),
            train,
            validation,
            env,
            expert,
            max_steps,
            rng,
            device: device.clone(),
            loss_plot: None,
            _phantom: Default::default(),
        })
    }

    fn assertions(&self) {
        assert!(self.batch_size > 0, "The batch size should be positive");
        assert!(
            self.evaluation_interval > 0 && self.aggregation_interval > 0,
            "The evaluation and aggregation intervals should be positive"
        );
    }
}

/// Labels every observation row with the expert's action.
pub fn relabel<X: Actor>(expert: &X, observations: Array2<f32>) -> Batch {
    let actions = expert.a_batch(&observations);
    Batch {
        observations,
        actions,
    }
}

/// Rows added to the dataset by one aggregation round.
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub rows: usize,
    pub returns: Vec<f64>,
}

/// Rolls out `policy`, relabels the visited states with `expert` and appends them
/// to `dataset` as they are.
pub fn aggregate<E: Environment, P: Actor, X: Actor>(
    env: &mut E,
    policy: &P,
    expert: &X,
    max_steps: usize,
    num_rollouts: usize,
    seed: Option<u64>,
    dataset: &mut ExpertDataset,
) -> Result<Aggregation, TrainingError> {
    let mut policy = |o: &[f32]| policy.a(o);
    let simulation = simulate(env, &mut policy, max_steps, num_rollouts, seed)?;
    let rows = simulation.observations.nrows();
    if rows > 0 {
        dataset.append(relabel(expert, simulation.observations))?;
    }
    Ok(Aggregation {
        rows,
        returns: simulation.returns,
    })
}

impl<B, E, X, R> Dagger<B, E, X, R>
where
    B: AutodiffBackend,
    E: Environment,
    X: Actor,
    R: Rng,
{
    /// Draws the evaluation losses to an SVG at `path` as they are recorded.
    pub fn with_loss_plot(mut self, path: PathBuf) -> Self {
        self.loss_plot = Some(path);
        self
    }

    pub fn train(mut self) -> Result<TrainingOutcome<B::InnerBackend>, TrainingError> {
        let cfg = self.cfg.clone();
        let mut learner = init_learner::<B>(
            &self.train,
            cfg.hidden_size,
            cfg.dropout,
            &cfg.optimizer,
            &cfg.loss,
            &cfg.learning_rate,
            &self.device,
        );
        learner.check_widths("validation data", &self.validation)?;
        info!(rows = self.train.len(), "Training by DAgger");

        let mut losses = Vec::new();
        for epoch in tqdm(0..cfg.epochs) {
            let rows = self.train.len();
            let indices: Vec<usize> = (0..cfg.batch_size)
                .map(|_| self.rng.gen_range(0..rows))
                .collect();
            let batch = self.train.select(&indices);
            let num_steps = cfg.steps_per_epoch_factor * rows.div_ceil(cfg.batch_size);
            let last = (0..num_steps).map(|_| learner.update(&batch)).last();

            if epoch % cfg.evaluation_interval == cfg.evaluation_interval - 1 {
                if let Some(stats) = last {
                    losses.push(stats.eval_loss);
                }
                if losses.len() > 1 {
                    info!("train loss: {}", losses[losses.len() - 1]);
                    let validation_loss = learner.evaluate(&self.validation.full());
                    info!("validation loss: {validation_loss}");
                }
                redraw_losses(self.loss_plot.as_deref(), &losses, 2)?;
            }

            if epoch > cfg.aggregation_start
                && epoch % cfg.aggregation_interval == cfg.aggregation_interval - 1
            {
                let aggregation = aggregate(
                    &mut self.env,
                    &learner.policy(),
                    &self.expert,
                    self.max_steps,
                    cfg.aggregation_rollouts,
                    Some(self.rng.gen()),
                    &mut self.train,
                )?;
                let stats = ReturnStatistics::from_returns(&aggregation.returns);
                debug!(
                    epoch,
                    added = aggregation.rows,
                    total = self.train.len(),
                    mean_return = stats.mean,
                    "aggregated learner states"
                );
            }
        }

        redraw_losses(self.loss_plot.as_deref(), &losses, 1)?;
        let validation_loss = learner.evaluate(&self.validation.full());
        Ok(TrainingOutcome {
            policy: learner.policy(),
            losses,
            validation_loss,
            training_rows: self.train.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use burn::backend::{Autodiff, NdArray};
    use burn_imitation::environment::pendulum::Pendulum;
    use burn_imitation::module::expert::BuiltinExpert;
    use ndarray::{array, Array1};
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    type B = Autodiff<NdArray>;

    fn expert_dataset(num_rollouts: usize, seed: u64) -> ExpertDataset {
        let mut env = Pendulum::new();
        let simulation = simulate(
            &mut env,
            &mut |o: &[f32]| BuiltinExpert::Pendulum.a(o),
            20,
            num_rollouts,
            Some(seed),
        )
        .unwrap();
        ExpertDataset::new(
            simulation.observations,
            simulation.actions,
            Array1::from(simulation.returns),
        )
        .unwrap()
    }

    #[test]
    fn test_relabel_keeps_row_count() {
        let observations = array![[1.0, 0.0, 0.0], [-1.0, 0.0, 0.5], [0.0, 1.0, -0.5]];
        let batch = relabel(&BuiltinExpert::Pendulum, observations.clone());
        assert_eq!(batch.actions.nrows(), observations.nrows());
        assert_eq!(batch.observations, observations);
    }

    #[test]
    fn test_aggregate_appends_without_deduplication() {
        let mut dataset = expert_dataset(1, 0);
        let before = dataset.len();
        let mut env = Pendulum::new();
        let policy = BuiltinExpert::Pendulum;
        for round in 1..=2 {
            let aggregation = aggregate(
                &mut env,
                &policy,
                &BuiltinExpert::Pendulum,
                15,
                1,
                Some(0),
                &mut dataset,
            )
            .unwrap();
            assert_eq!(aggregation.rows, 15);
            assert_eq!(dataset.len(), before + round * 15);
        }
        // Both rounds replayed the same seed, so their rows are identical.
        assert_eq!(
            dataset.observations().row(before),
            dataset.observations().row(before + 15)
        );
    }

    struct TwoWide;

    impl Actor for TwoWide {
        fn a_batch(&self, observations: &Array2<f32>) -> Array2<f32> {
            Array2::zeros((observations.nrows(), 2))
        }
    }

    #[test]
    fn test_aggregate_rejects_wrong_action_width() {
        let mut dataset = expert_dataset(1, 0);
        let before = dataset.len();
        let err = aggregate(
            &mut Pendulum::new(),
            &TwoWide,
            &BuiltinExpert::Pendulum,
            15,
            1,
            Some(0),
            &mut dataset,
        )
        .unwrap_err();
        assert!(matches!(err, TrainingError::Rollout(_)));
        assert_eq!(dataset.len(), before);
    }

    #[test]
    fn test_training_grows_dataset() {
        let train = expert_dataset(2, 1);
        let rows = train.len();
        let outcome = DaggerConfig::new()
            .with_epochs(8)
            .with_batch_size(16)
            .with_hidden_size(8)
            .with_evaluation_interval(2)
            .with_aggregation_start(3)
            .with_aggregation_interval(2)
            .init::<B, _, _, _>(
                train,
                expert_dataset(1, 9),
                Pendulum::new(),
                BuiltinExpert::Pendulum,
                10,
                StdRng::seed_from_u64(0),
                &Default::default(),
            )
            .unwrap()
            .train()
            .unwrap();
        // Evaluations after epochs 1, 3, 5, 7; aggregations after epochs 5 and 7.
        assert_eq!(outcome.losses.len(), 4);
        assert_eq!(outcome.training_rows, rows + 2 * 10);
        assert_eq!(outcome.policy.input_size(), 3);
    }

    #[test]
    fn test_loss_plot_is_drawn() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dagger.losses.svg");
        let outcome = DaggerConfig::new()
            .with_epochs(4)
            .with_batch_size(16)
            .with_hidden_size(8)
            .with_evaluation_interval(2)
            .init::<B, _, _, _>(
                expert_dataset(1, 1),
                expert_dataset(1, 9),
                Pendulum::new(),
                BuiltinExpert::Pendulum,
                10,
                StdRng::seed_from_u64(0),
                &Default::default(),
            )
            .unwrap()
            .with_loss_plot(path.clone())
            .train()
            .unwrap();
        assert_eq!(outcome.losses.len(), 2);
        assert!(std::fs::read_to_string(&path).unwrap().contains("<svg"));
    }
}
