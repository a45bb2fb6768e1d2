//! Imitation learning building blocks on top of burn: continuous-control
//! environments, rollouts, expert datasets and policies, and the policy network.

pub mod data;
pub mod environment;
pub mod logging;
pub mod module;
pub mod objective;
pub mod schedule;
