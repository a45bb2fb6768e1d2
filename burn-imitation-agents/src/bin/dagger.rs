use anyhow::{ensure, Context};
use burn::{
    backend::{Autodiff, NdArray},
    config::Config,
    prelude::*,
};
use burn_imitation::{
    data::{dataset::ExpertDataset, rollout::step_cap},
    environment::{make, Environment},
    logging::init_tracing,
    module::expert::Expert,
};
use burn_imitation_agents::{
    cli::DaggerCli,
    dagger::DaggerConfig,
    evaluation::{evaluate_policy, finish_run},
};
use clap::Parser;
use rand::{rngs::StdRng, SeedableRng};
use tracing::info;

fn main() -> anyhow::Result<()> {
    let cli = DaggerCli::parse();
    init_tracing(cli.rollout.verbose);
    info!("Running DAgger on {}", cli.envname);

    type B = Autodiff<NdArray>;
    let device: &Device<B> = &Default::default();
    B::seed(cli.rollout.seed);
    let rng = StdRng::seed_from_u64(cli.rollout.seed);

    let config = cli.training.load_config(DaggerConfig::new)?;
    let train = ExpertDataset::load(&cli.training.train_file)
        .with_context(|| format!("loading {}", cli.training.train_file.display()))?;
    let validation = ExpertDataset::load_validation(&cli.training.validation_file)
        .with_context(|| format!("loading {}", cli.training.validation_file.display()))?;
    let expert_returns = train.returns().to_vec();

    // One environment is driven by aggregation, the other by the final evaluation.
    let env = make(&cli.envname)?;
    let mut eval_env = make(&cli.envname)?;
    let max_steps = step_cap(&env, cli.rollout.max_timesteps);

    let expert = Expert::<NdArray>::load(
        cli.expert_policy_file.as_deref(),
        &cli.envname,
        &Default::default(),
    )?;
    ensure!(
        expert.observation_size() == env.observation_size()
            && expert.action_size() == env.action_size(),
        "expert maps {} -> {} but {} is {} -> {} wide",
        expert.observation_size(),
        expert.action_size(),
        cli.envname,
        env.observation_size(),
        env.action_size()
    );

    let outcome = config
        .init::<B, _, _, _>(train, validation, env, expert, max_steps, rng, device)?
        .with_loss_plot(cli.training.loss_plot_output())
        .train()?;
    info!(rows = outcome.training_rows, "final training set");
    let returns = evaluate_policy(
        &mut eval_env,
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
