use anyhow::Context;
use burn::{
    backend::{Autodiff, NdArray},
    config::Config,
    prelude::*,
};
use burn_imitation::{
    data::{dataset::ExpertDataset, rollout::step_cap},
    environment::make,
    logging::init_tracing,
};
use burn_imitation_agents::{
    behavioral_cloning::BehavioralCloningConfig,
    cli::BehavioralCloningCli,
    evaluation::{evaluate_policy, finish_run},
    learner::check_environment,
};
use clap::Parser;
use tracing::info;

fn main() -> anyhow::Result<()> {
    let cli = BehavioralCloningCli::parse();
    init_tracing(cli.rollout.verbose);
    info!("Running behavioral cloning on {}", cli.envname);

    type B = Autodiff<NdArray>;
    let device: &Device<B> = &Default::default();
    B::seed(cli.rollout.seed);

    let config = cli.training.load_config(BehavioralCloningConfig::new)?;
    let train = ExpertDataset::load(&cli.training.train_file)
        .with_context(|| format!("loading {}", cli.training.train_file.display()))?;
    let validation = ExpertDataset::load_validation(&cli.training.validation_file)
        .with_context(|| format!("loading {}", cli.training.validation_file.display()))?;
    let expert_returns = train.returns().to_vec();

    let mut env = make(&cli.envname)?;
    check_environment(&env, &train)?;
    let max_steps = step_cap(&env, cli.rollout.max_timesteps);

    let outcome = config
        .init::<B>(train, validation, device)?
        .with_loss_plot(cli.training.loss_plot_output())
        .train()?;
    let returns = evaluate_policy(
        &mut env,
        &outcome.policy,
        max_steps,
        cli.rollout.num_rollouts,
        Some(cli.rollout.seed),
    )?;

    finish_run(&cli.training.output_file, &expert_returns, outcome.losses, returns)?;
    config
        .save(cli.training.config_output())
        .context("saving the training config")?;
    Ok(())
}
