use thiserror::Error;

pub type Observation = Vec<f32>;
pub type Action = Vec<f32>;
pub type Reward = f64;
pub type Done = bool;

/// A continuous-control task with vector observations and vector actions.
pub trait Environment {
    fn observation_size(&self) -> usize;

    fn action_size(&self) -> usize;

    /// Episode length used when the caller does not cap it.
    fn timestep_limit(&self) -> usize;

    fn reset(&mut self, seed: Option<u64>) -> Observation;

    fn step(&mut self, action: &[f32]) -> (Observation, Reward, Done);
}

#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("unknown environment `{0}` (expected one of: {names})", names = REGISTERED.join(", "))]
    Unknown(String),
}

pub const PENDULUM: &str = "Pendulum-v1";
pub const CART_POLE: &str = "CartPole-v1";

const REGISTERED: [&str; 2] = [PENDULUM, CART_POLE];

/// Environments that can be created by name from the command line.
pub enum RegisteredEnvironment {
    Pendulum(pendulum::Pendulum),
    CartPole(gym_rs::CartPole),
}

pub fn make(name: &str) -> Result<RegisteredEnvironment, EnvironmentError> {
    match name {
        PENDULUM => Ok(RegisteredEnvironment::Pendulum(pendulum::Pendulum::new())),
        CART_POLE => Ok(RegisteredEnvironment::CartPole(
            gym_rs::GymEnvironment::cart_pole(),
        )),
        other => Err(EnvironmentError::Unknown(other.to_string())),
    }
}

impl RegisteredEnvironment {
    pub fn name(&self) -> &'static str {
        match self {
            RegisteredEnvironment::Pendulum(_) => PENDULUM,
            RegisteredEnvironment::CartPole(_) => CART_POLE,
        }
    }

    fn inner(&self) -> &dyn Environment {
        match self {
            RegisteredEnvironment::Pendulum(env) => env,
            RegisteredEnvironment::CartPole(env) => env,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Environment {
        match self {
            RegisteredEnvironment::Pendulum(env) => env,
            RegisteredEnvironment::CartPole(env) => env,
        }
    }
}

impl Environment for RegisteredEnvironment {
    fn observation_size(&self) -> usize {
        self.inner().observation_size()
    }

    fn action_size(&self) -> usize {
        self.inner().action_size()
    }

    fn timestep_limit(&self) -> usize {
        self.inner().timestep_limit()
    }

    fn reset(&mut self, seed: Option<u64>) -> Observation {
        self.inner_mut().reset(seed)
    }

    fn step(&mut self, action: &[f32]) -> (Observation, Reward, Done) {
        self.inner_mut().step(action)
    }
}

pub mod gym_rs;
pub mod pendulum;
