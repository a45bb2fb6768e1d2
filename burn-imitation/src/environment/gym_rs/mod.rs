use gym_rs::{
    core::Env,
    envs::classical_control::cartpole::CartPoleEnv,
    utils::renderer::RenderMode,
};

use super::{Done, Environment, Observation, Reward};

pub type CartPole = GymEnvironment<CartPoleEnv>;

/// Exposes a discrete two-action gym-rs environment as a continuous-control task.
///
/// The single action component selects the second discrete action when positive.
pub struct GymEnvironment<T: Env> {
    env: T,
    observation_size: usize,
    timestep_limit: usize,
}

impl<T: Env> GymEnvironment<T> {
    pub fn from(env: T, observation_size: usize, timestep_limit: usize) -> Self {
        GymEnvironment {
            env,
            observation_size,
            timestep_limit,
        }
    }
}

impl GymEnvironment<CartPoleEnv> {
    pub fn cart_pole() -> Self {
        Self::from(CartPoleEnv::new(RenderMode::None), 4, 500)
    }
}

impl<T> Environment for GymEnvironment<T>
where
    T: Env<Action = usize>,
    Vec<f64>: From<T::Observation>,
{
    fn observation_size(&self) -> usize {
        self.observation_size
    }

    fn action_size(&self) -> usize {
        1
    }

    fn timestep_limit(&self) -> usize {
        self.timestep_limit
    }

    fn reset(&mut self, seed: Option<u64>) -> Observation {
        let (obs, _) = self.env.reset(seed, false, None);
        to_observation(obs)
    }

    fn step(&mut self, action: &[f32]) -> (Observation, Reward, Done) {
        let discrete = usize::from(action.first().is_some_and(|a| *a > 0.0));
        let action_reward = self.env.step(discrete);
        (
            to_observation(action_reward.observation),
            *action_reward.reward.as_ref(),
            action_reward.done,
        )
    }
}

fn to_observation<O>(obs: O) -> Observation
where
    Vec<f64>: From<O>,
{
    Vec::<f64>::from(obs).into_iter().map(|x| x as f32).collect()
}
