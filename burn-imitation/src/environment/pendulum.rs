//! Inverted pendulum swing-up with a bounded torque.
//!
//! The angle is measured from the upright position. Each step costs
//! `θ² + 0.1 θ̇² + 0.001 u²` and the episode never ends on its own.

use std::f64::consts::PI;

use rand::{rngs::StdRng, Rng, SeedableRng};

use super::{Done, Environment, Observation, Reward};

pub const MAX_SPEED: f64 = 8.0;
pub const MAX_TORQUE: f64 = 2.0;
const DT: f64 = 0.05;
const GRAVITY: f64 = 10.0;
const MASS: f64 = 1.0;
const LENGTH: f64 = 1.0;

pub struct Pendulum {
    theta: f64,
    theta_dot: f64,
    rng: StdRng,
}

impl Pendulum {
    pub fn new() -> Self {
        Pendulum {
            theta: PI,
            theta_dot: 0.0,
            rng: StdRng::from_entropy(),
        }
    }

    /// Places the pendulum in a given state, bypassing the random reset.
    pub fn set_state(&mut self, theta: f64, theta_dot: f64) -> Observation {
        self.theta = theta;
        self.theta_dot = theta_dot;
        self.observation()
    }

    fn observation(&self) -> Observation {
        vec![
            self.theta.cos() as f32,
            self.theta.sin() as f32,
            self.theta_dot as f32,
        ]
    }
}

impl Default for Pendulum {
    fn default() -> Self {
        Self::new()
    }
}

fn angle_normalize(x: f64) -> f64 {
    (x + PI).rem_euclid(2.0 * PI) - PI
}

impl Environment for Pendulum {
    fn observation_size(&self) -> usize {
        3
    }

    fn action_size(&self) -> usize {
        1
    }

    fn timestep_limit(&self) -> usize {
        200
    }

    fn reset(&mut self, seed: Option<u64>) -> Observation {
        if let Some(seed) = seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
        self.theta = self.rng.gen_range(-PI..PI);
        self.theta_dot = self.rng.gen_range(-1.0..1.0);
        self.observation()
    }

    fn step(&mut self, action: &[f32]) -> (Observation, Reward, Done) {
        let u = action
            .first()
            .map_or(0.0, |u| f64::from(*u))
            .clamp(-MAX_TORQUE, MAX_TORQUE);
        let cost = angle_normalize(self.theta).powi(2)
            + 0.1 * self.theta_dot.powi(2)
            + 0.001 * u.powi(2);

        let theta_dot = self.theta_dot
            + (3.0 * GRAVITY / (2.0 * LENGTH) * self.theta.sin()
                + 3.0 / (MASS * LENGTH.powi(2)) * u)
                * DT;
        self.theta_dot = theta_dot.clamp(-MAX_SPEED, MAX_SPEED);
        self.theta += self.theta_dot * DT;

        (self.observation(), -cost, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_is_seeded() {
        let mut a = Pendulum::new();
        let mut b = Pendulum::new();
        assert_eq!(a.reset(Some(7)), b.reset(Some(7)));
        let obs = a.reset(None);
        assert_eq!(obs.len(), 3);
        assert!(obs[2].abs() <= 1.0);
    }

    #[test]
    fn test_upright_at_rest_is_free() {
        let mut env = Pendulum::new();
        env.set_state(0.0, 0.0);
        let (obs, reward, done) = env.step(&[0.0]);
        assert_eq!(obs, vec![1.0, 0.0, 0.0]);
        assert_eq!(reward, 0.0);
        assert!(!done);
    }

    #[test]
    fn test_cost_uses_clamped_torque() {
        let mut env = Pendulum::new();
        env.set_state(PI / 2.0, 1.0);
        let (_, reward, _) = env.step(&[10.0]);
        let expected = -((PI / 2.0).powi(2) + 0.1 + 0.001 * 4.0);
        assert!((reward - expected).abs() < 1e-12);
    }

    #[test]
    fn test_speed_is_bounded() {
        let mut env = Pendulum::new();
        env.set_state(PI / 2.0, MAX_SPEED);
        let (obs, _, _) = env.step(&[MAX_TORQUE as f32]);
        assert_eq!(obs[2], MAX_SPEED as f32);
    }

    #[test]
    fn test_angle_normalize() {
        assert!((angle_normalize(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-12);
        assert!((angle_normalize(-PI / 4.0) + PI / 4.0).abs() < 1e-12);
    }
}
