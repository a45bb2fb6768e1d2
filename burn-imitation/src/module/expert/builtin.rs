use ndarray::{Array2, ArrayView1, Axis};

use super::ExpertError;
use crate::environment::{pendulum, CART_POLE, PENDULUM};
use crate::module::component::Actor;

/// Hand-written controllers for the registered environments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinExpert {
    /// Pumps energy into the swing, then balances with a PD law near the top.
    Pendulum,
    /// PD law on pole angle and cart position; positive means push right.
    CartPole,
}

impl BuiltinExpert {
    pub fn for_environment(name: &str) -> Result<Self, ExpertError> {
        match name {
            PENDULUM => Ok(BuiltinExpert::Pendulum),
            CART_POLE => Ok(BuiltinExpert::CartPole),
            other => Err(ExpertError::NoBuiltin(other.to_string())),
        }
    }

    pub fn observation_size(&self) -> usize {
        match self {
            BuiltinExpert::Pendulum => 3,
            BuiltinExpert::CartPole => 4,
        }
    }

    fn act(&self, observation: ArrayView1<f32>) -> f32 {
        match self {
            BuiltinExpert::Pendulum => {
                let (cos, sin, theta_dot) = (observation[0], observation[1], observation[2]);
                let theta = sin.atan2(cos);
                let torque = if cos > 0.8 {
                    -(10.0 * theta + 2.0 * theta_dot)
                } else {
                    // Zero when upright and at rest, -30 when hanging still.
                    let energy = 0.5 * theta_dot * theta_dot + 15.0 * (cos - 1.0);
                    let direction = if theta_dot >= 0.0 { 1.0 } else { -1.0 };
                    match energy < 0.0 {
                        true => pendulum::MAX_TORQUE as f32 * direction,
                        false => -0.5 * direction,
                    }
                };
                torque.clamp(-pendulum::MAX_TORQUE as f32, pendulum::MAX_TORQUE as f32)
            }
            BuiltinExpert::CartPole => {
                let (x, x_dot, theta, theta_dot) =
                    (observation[0], observation[1], observation[2], observation[3]);
                0.1 * x + 0.5 * x_dot + 10.0 * theta + 2.0 * theta_dot
            }
        }
    }
}

impl Actor for BuiltinExpert {
    fn a_batch(&self, observations: &Array2<f32>) -> Array2<f32> {
        observations
            .map_axis(Axis(1), |observation| self.act(observation))
            .insert_axis(Axis(1))
    }
}
