use std::path::Path;

use burn::backend::{Autodiff, NdArray};
use burn::prelude::*;
use burn_imitation::{
    data::{
        array_file::ArrayFile,
        dataset::ExpertDataset,
        history::{LOSSES, RETURNS},
        rollout::{simulate, step_cap},
    },
    environment::{make, Environment, PENDULUM},
    module::{component::Actor, expert::Expert},
};
use burn_imitation_agents::{
    behavioral_cloning::BehavioralCloningConfig,
    dagger::DaggerConfig,
    evaluation::{evaluate_policy, finish_run},
};
use rand::{rngs::StdRng, SeedableRng};

type B = Autodiff<NdArray>;

const MAX_STEPS: usize = 25;

fn write_expert_data(path: &Path, num_rollouts: usize, seed: u64) -> ExpertDataset {
    let mut env = make(PENDULUM).unwrap();
    let expert = Expert::<NdArray>::load(None, PENDULUM, &Default::default()).unwrap();
    let simulation = simulate(
        &mut env,
        &mut |observation: &[f32]| expert.a(observation),
        MAX_STEPS,
        num_rollouts,
        Some(seed),
    )
    .unwrap();
    let dataset = ExpertDataset::new(
        simulation.observations,
        simulation.actions,
        simulation.returns.into(),
    )
    .unwrap();
    dataset.save(path).unwrap();
    dataset
}

#[test]
fn behavioral_cloning_writes_losses_and_returns() {
    let dir = tempfile::tempdir().unwrap();
    let train_file = dir.path().join("train.safetensors");
    let validation_file = dir.path().join("validation.safetensors");
    let output_file = dir.path().join("bc.safetensors");
    let loss_plot = dir.path().join("bc.losses.svg");
    write_expert_data(&train_file, 4, 0);
    write_expert_data(&validation_file, 1, 100);

    B::seed(0);
    let train = ExpertDataset::load(&train_file).unwrap();
    let expert_returns = train.returns().to_vec();
    assert_eq!(expert_returns.len(), 4);

    let mut env = make(PENDULUM).unwrap();
    let max_steps = step_cap(&env, Some(MAX_STEPS));
    let outcome = BehavioralCloningConfig::new()
        .with_epochs(20)
        .with_batch_size(32)
        .with_hidden_size(16)
        .with_evaluation_interval(5)
        .init::<B>(
            train,
            ExpertDataset::load_validation(&validation_file).unwrap(),
            &Default::default(),
        )
        .unwrap()
        .with_loss_plot(loss_plot.clone())
        .train()
        .unwrap();
    assert!(loss_plot.exists());
    assert_eq!(outcome.policy.input_size(), env.observation_size());
    assert_eq!(outcome.policy.output_size(), env.action_size());

    let returns = evaluate_policy(&mut env, &outcome.policy, max_steps, 3, Some(0)).unwrap();
    finish_run(&output_file, &expert_returns, outcome.losses, returns).unwrap();

    let file = ArrayFile::load(&output_file).unwrap();
    assert_eq!(file.shape(LOSSES).unwrap(), &[4]);
    assert_eq!(file.shape(RETURNS).unwrap(), &[3]);
}

#[test]
fn dagger_aggregates_learner_states() {
    let dir = tempfile::tempdir().unwrap();
    let output_file = dir.path().join("dagger.safetensors");
    let train = write_expert_data(&dir.path().join("train.safetensors"), 2, 0);
    let validation = write_expert_data(&dir.path().join("validation.safetensors"), 1, 100);
    let rows = train.len();
    let expert_returns = train.returns().to_vec();

    B::seed(0);
    let env = make(PENDULUM).unwrap();
    let mut eval_env = make(PENDULUM).unwrap();
    let expert = Expert::<NdArray>::load(None, PENDULUM, &Default::default()).unwrap();
    let outcome = DaggerConfig::new()
        .with_epochs(6)
        .with_batch_size(16)
        .with_hidden_size(16)
        .with_evaluation_interval(2)
        .with_aggregation_start(0)
        .with_aggregation_interval(3)
        .init::<B, _, _, _>(
            train,
            validation,
            env,
            expert,
            MAX_STEPS,
            StdRng::seed_from_u64(0),
            &Default::default(),
        )
        .unwrap()
        .train()
        .unwrap();
    // Aggregation after epochs 2 and 5, one rollout of MAX_STEPS each.
    assert_eq!(outcome.training_rows, rows + 2 * MAX_STEPS);
    assert_eq!(outcome.losses.len(), 3);

    let returns = evaluate_policy(&mut eval_env, &outcome.policy, MAX_STEPS, 2, Some(0)).unwrap();
    let history = finish_run(&output_file, &expert_returns, outcome.losses, returns).unwrap();
    assert_eq!(history.returns.len(), 2);
    assert!(ArrayFile::load(&output_file).unwrap().contains(LOSSES));
}
