use std::path::Path;

use burn_imitation::data::array_file::ArrayFileError;
use burn_imitation::data::history::History;
use burn_imitation::data::rollout::{collect_episode, episode_seed, RolloutError};
use burn_imitation::environment::Environment;
use burn_imitation::logging::ReturnStatistics;
use burn_imitation::module::component::Actor;
use tqdm::tqdm;
use tracing::{debug, info};

/// Returns of `num_rollouts` episodes of `policy`. Episode `i` is reset with `seed + i`.
pub fn evaluate_policy<E: Environment, P: Actor>(
    env: &mut E,
    policy: &P,
    max_steps: usize,
    num_rollouts: usize,
    seed: Option<u64>,
) -> Result<Vec<f64>, RolloutError> {
    let mut policy = |observation: &[f32]| policy.a(observation);
    tqdm(0..num_rollouts)
        .map(|i| {
            let episode = collect_episode(env, &mut policy, max_steps, episode_seed(seed, i))?;
            debug!(rollout = i, steps = episode.len(), "rollout finished");
            Ok(episode.total_reward())
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Report {
    pub expert: ReturnStatistics,
    pub learner: ReturnStatistics,
}

/// Logs expert and learner return statistics side by side.
pub fn report(expert_returns: &[f64], returns: &[f64]) -> Report {
    let expert = ReturnStatistics::from_returns(expert_returns);
    let learner = ReturnStatistics::from_returns(returns);
    info!("expert mean return: {}", expert.mean);
    info!("expert std of return: {}", expert.std);
    info!("mean return: {}", learner.mean);
    info!("std of return: {}", learner.std);
    Report { expert, learner }
}

/// Reports the final rollouts and writes `losses` and `returns` to `output`.
pub fn finish_run(
    output: &Path,
    expert_returns: &[f64],
    losses: Vec<f64>,
    returns: Vec<f64>,
) -> Result<History, ArrayFileError> {
    report(expert_returns, &returns);
    let history = History { losses, returns };
    history.save(output)?;
    info!(path = %output.display(), "wrote training history");
    Ok(history)
}
