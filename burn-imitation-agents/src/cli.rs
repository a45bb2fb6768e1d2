use std::path::PathBuf;

use anyhow::anyhow;
use burn::config::Config;
use clap::{Args, Parser};

/// Options shared by every program that rolls out a policy.
#[derive(Args, Debug, Clone)]
pub struct RolloutArgs {
    /// Steps per episode; defaults to the environment's own limit
    #[arg(long = "max-timesteps", alias = "max_timesteps", value_name = "N")]
    pub max_timesteps: Option<usize>,

    /// Number of evaluation episodes
    #[arg(long = "num-rollouts", alias = "num_rollouts", default_value_t = 20)]
    pub num_rollouts: usize,

    /// Seed for the backend, batch sampling and episode resets
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Enable debug-level logging
    #[arg(long, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Args, Debug, Clone)]
pub struct TrainingArgs {
    /// Expert dataset to train on
    #[arg(long = "train-file", alias = "train_file", value_name = "PATH")]
    pub train_file: PathBuf,

    /// Expert dataset used for the validation loss
    #[arg(long = "validation-file", alias = "validation_file", value_name = "PATH")]
    pub validation_file: PathBuf,

    /// Where the loss history and final returns are written
    #[arg(long = "output-file", alias = "output_file", value_name = "PATH")]
    pub output_file: PathBuf,

    /// JSON training configuration; built-in defaults otherwise
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "behavioral_cloning")]
#[command(about = "Train a policy on expert demonstrations by supervised regression", long_about = None)]
pub struct BehavioralCloningCli {
    /// Registered environment name, e.g. Pendulum-v1
    #[arg(value_name = "ENVNAME")]
    pub envname: String,

    #[command(flatten)]
    pub training: TrainingArgs,

    #[command(flatten)]
    pub rollout: RolloutArgs,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "dagger")]
#[command(about = "Train a policy with dataset aggregation, querying the expert on learner states", long_about = None)]
pub struct DaggerCli {
    /// Registered environment name, e.g. Pendulum-v1
    #[arg(value_name = "ENVNAME")]
    pub envname: String,

    /// Serialized expert network; the environment's built-in expert otherwise
    #[arg(long = "expert-policy-file", alias = "expert_policy_file", value_name = "PATH")]
    pub expert_policy_file: Option<PathBuf>,

    #[command(flatten)]
    pub training: TrainingArgs,

    #[command(flatten)]
    pub rollout: RolloutArgs,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "run_expert")]
#[command(about = "Roll out an expert and record its demonstrations", long_about = None)]
pub struct RunExpertCli {
    /// Registered environment name, e.g. Pendulum-v1
    #[arg(value_name = "ENVNAME")]
    pub envname: String,

    /// Serialized expert network; the environment's built-in expert otherwise
    #[arg(long = "expert-policy-file", alias = "expert_policy_file", value_name = "PATH")]
    pub expert_policy_file: Option<PathBuf>,

    /// Where the expert dataset is written
    #[arg(long = "output-file", alias = "output_file", value_name = "PATH")]
    pub output_file: PathBuf,

    #[command(flatten)]
    pub rollout: RolloutArgs,
}

impl TrainingArgs {
    /// The configuration named by `--config`, or `default` without one.
    pub fn load_config<C: Config>(&self, default: impl FnOnce() -> C) -> anyhow::Result<C> {
        match &self.config {
            Some(path) => C::load(path)
                .map_err(|err| anyhow!("failed to load config {}: {err:?}", path.display())),
            None => Ok(default()),
        }
    }

    /// Where the effective configuration of a run is written.
    pub fn config_output(&self) -> PathBuf {
        self.output_file.with_extension("config.json")
    }

    /// Where the loss plot of a run is drawn.
    pub fn loss_plot_output(&self) -> PathBuf {
        self.output_file.with_extension("losses.svg")
    }
}
