use ndarray::{Array1, Array2, ShapeError};
use thiserror::Error;

use crate::environment::{Action, Environment, Observation, Reward};

#[derive(Debug, Error)]
pub enum RolloutError {
    #[error("{name} has width {found} but the environment expects {expected}")]
    WidthMismatch {
        name: &'static str,
        found: usize,
        expected: usize,
    },
    #[error(transparent)]
    Shape(#[from] ShapeError),
}

/// One episode. `observations[i]` is the state `actions[i]` was chosen in.
#[derive(Debug, Clone, Default)]
pub struct Episode {
    pub observations: Vec<Observation>,
    pub actions: Vec<Action>,
    pub rewards: Vec<Reward>,
}

impl Episode {
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    pub fn total_reward(&self) -> f64 {
        self.rewards.iter().sum()
    }
}

/// Stacked rows of several episodes.
#[derive(Debug, Clone)]
pub struct Simulation {
    pub observations: Array2<f32>,
    pub actions: Array2<f32>,
    pub returns: Vec<f64>,
}

/// Uses `max_timesteps` when given and positive, the environment limit otherwise.
pub fn step_cap<E: Environment>(env: &E, max_timesteps: Option<usize>) -> usize {
    max_timesteps
        .filter(|&steps| steps > 0)
        .unwrap_or_else(|| env.timestep_limit())
}

/// Reset seed of episode `i`; wraps around at `u64::MAX`.
pub fn episode_seed(seed: Option<u64>, i: usize) -> Option<u64> {
    seed.map(|s| s.wrapping_add(i as u64))
}

fn check_width(name: &'static str, row: &[f32], expected: usize) -> Result<(), RolloutError> {
    if row.len() != expected {
        return Err(RolloutError::WidthMismatch {
            name,
            found: row.len(),
            expected,
        });
    }
    Ok(())
}

/// Fails as soon as an observation or action row has the wrong width.
pub fn collect_episode<E: Environment, P: FnMut(&[f32]) -> Action>(
    env: &mut E,
    policy: &mut P,
    max_steps: usize,
    seed: Option<u64>,
) -> Result<Episode, RolloutError> {
    let mut episode = Episode::default();
    let mut before = env.reset(seed);
    while episode.len() < max_steps {
        check_width("observation", &before, env.observation_size())?;
        let action = policy(&before);
        check_width("action", &action, env.action_size())?;
        let (after, reward, done) = env.step(&action);
        episode.observations.push(before);
        episode.actions.push(action);
        episode.rewards.push(reward);
        if done {
            break;
        }
        before = after;
    }
    Ok(episode)
}

/// Runs `num_rollouts` episodes. Episode `i` is reset with `seed + i` when seeded.
pub fn simulate<E: Environment, P: FnMut(&[f32]) -> Action>(
    env: &mut E,
    policy: &mut P,
    max_steps: usize,
    num_rollouts: usize,
    seed: Option<u64>,
) -> Result<Simulation, RolloutError> {
    let mut observations = Vec::new();
    let mut actions = Vec::new();
    let mut returns = Vec::with_capacity(num_rollouts);
    for i in 0..num_rollouts {
        let episode = collect_episode(env, policy, max_steps, episode_seed(seed, i))?;
        returns.push(episode.total_reward());
        observations.extend(episode.observations);
        actions.extend(episode.actions);
    }
    Ok(Simulation {
        observations: stack_rows(observations, env.observation_size())?,
        actions: stack_rows(actions, env.action_size())?,
        returns,
    })
}

fn stack_rows(rows: Vec<Vec<f32>>, width: usize) -> Result<Array2<f32>, RolloutError> {
    let n_rows = rows.len();
    let flat: Array1<f32> = rows.into_iter().flatten().collect();
    Ok(flat.into_shape_with_order((n_rows, width))?)
}
