use anyhow::{ensure, Context};
use burn::backend::NdArray;
use burn_imitation::{
    data::{
        dataset::ExpertDataset,
        rollout::{simulate, step_cap},
    },
    environment::{make, Environment},
    logging::{init_tracing, ReturnStatistics},
    module::{component::Actor, expert::Expert},
};
use burn_imitation_agents::cli::RunExpertCli;
use clap::Parser;
use ndarray::Array1;
use tracing::info;

fn main() -> anyhow::Result<()> {
    let cli = RunExpertCli::parse();
    init_tracing(cli.rollout.verbose);

    let mut env = make(&cli.envname)?;
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

    let max_steps = step_cap(&env, cli.rollout.max_timesteps);
    info!(
        episodes = cli.rollout.num_rollouts,
        max_steps, "Rolling out the expert on {}", cli.envname
    );
    let simulation = simulate(
        &mut env,
        &mut |observation: &[f32]| expert.a(observation),
        max_steps,
        cli.rollout.num_rollouts,
        Some(cli.rollout.seed),
    )?;

    let stats = ReturnStatistics::from_returns(&simulation.returns);
    info!("mean return: {}", stats.mean);
    info!("std of return: {}", stats.std);

    let dataset = ExpertDataset::new(
        simulation.observations,
        simulation.actions,
        Array1::from(simulation.returns),
    )?;
    dataset
        .save(&cli.output_file)
        .with_context(|| format!("writing {}", cli.output_file.display()))?;
    info!(rows = dataset.len(), path = %cli.output_file.display(), "wrote expert data");
    Ok(())
}
