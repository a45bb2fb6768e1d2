use std::marker::PhantomData;
use std::path::PathBuf;

use burn::config::Config;
use burn::optim::AdamConfig;
use burn::tensor::backend::AutodiffBackend;
use burn_imitation::data::dataset::ExpertDataset;
use burn_imitation::objective::imitation::ImitationLossConfig;
use burn_imitation::schedule::LearningRateSchedule;
use tqdm::tqdm;
use tracing::{debug, info};

use crate::learner::{init_learner, redraw_losses, TrainingError};
use crate::TrainingOutcome;

#[derive(Config)]
pub struct BehavioralCloningConfig {
    #[config(default = 5_000)]
    epochs: usize,
    #[config(default = 1_000)]
    batch_size: usize,
    #[config(default = 100)]
    hidden_size: usize,
    #[config(default = 0.2)]
    dropout: f64,
    /// Record the evaluation loss every this many epochs.
    #[config(default = 100)]
    evaluation_interval: usize,
    #[config(
        default = "LearningRateSchedule::ExponentialDecay { initial_learning_rate: 0.5, decay_steps: 20, decay_rate: 0.995 }"
    )]
    learning_rate: LearningRateSchedule,
    #[config(default = "ImitationLossConfig::new()")]
    loss: ImitationLossConfig,
    #[config(default = "AdamConfig::new()")]
    optimizer: AdamConfig,
}

/// Supervised regression of a policy onto a fixed expert dataset.
pub struct BehavioralCloning<B: AutodiffBackend> {
    cfg: BehavioralCloningConfig,
    train: ExpertDataset,
    validation: ExpertDataset,
    device: B::Device,
    loss_plot: Option<PathBuf>,
    _phantom: PhantomData<B>,
}

impl BehavioralCloningConfig {
    pub fn init<B: AutodiffBackend>(
        &self,
        train: ExpertDataset,
        validation: ExpertDataset,
        device: &B::Device,
    ) -> Result<BehavioralCloning<B>, TrainingError> {
        self.assertions();
        if train.is_empty() {
            return Err(TrainingError::EmptyDataset);
        }
        Ok(BehavioralCloning {
            cfg: self.clone(),
            train,
            validation,
            device: device.clone(),
            loss_plot: None,
            _phantom: Default::default(),
        })
    }

    fn assertions(&self) {
        assert!(self.batch_size > 0, "The batch size should be positive");
        assert!(
            self.evaluation_interval > 0,
            "The evaluation interval should be positive"
        );
    }
}

impl<B: AutodiffBackend> BehavioralCloning<B> {
    /// Draws the evaluation losses to an SVG at `path` as they are recorded.
    pub fn with_loss_plot(mut self, path: PathBuf) -> Self {
        self.loss_plot = Some(path);
        self
    }

    pub fn train(self) -> Result<TrainingOutcome<B::InnerBackend>, TrainingError> {
        let cfg = &self.cfg;
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

        // Trailing rows that do not fill a batch are skipped, unless there is no full batch.
        let num_batches = (self.train.len() / cfg.batch_size).max(1);
        info!(
            rows = self.train.len(),
            num_batches, "Training by behavioral cloning"
        );

        let mut losses = Vec::new();
        for epoch in tqdm(0..cfg.epochs) {
            let last = (0..num_batches)
                .map(|i| learner.update(&self.train.batch(i, cfg.batch_size)))
                .last();
            if epoch % cfg.evaluation_interval == cfg.evaluation_interval - 1 {
                if let Some(stats) = last {
                    debug!(epoch, loss = stats.loss, eval_loss = stats.eval_loss, "evaluation");
                    losses.push(stats.eval_loss);
                    redraw_losses(self.loss_plot.as_deref(), &losses, 2)?;
                }
            }
        }
        redraw_losses(self.loss_plot.as_deref(), &losses, 1)?;

        if let Some(loss) = losses.last() {
            info!("train loss: {loss}");
        }
        let validation_loss = learner.evaluate(&self.validation.full());
        info!("validation loss: {validation_loss}");

        Ok(TrainingOutcome {
            policy: learner.policy(),
            losses,
            validation_loss,
            training_rows: self.train.len(),
        })
    }
}
