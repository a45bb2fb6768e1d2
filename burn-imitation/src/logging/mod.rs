use tracing_subscriber::EnvFilter;

mod plot;

pub use plot::{plot_losses, PlotError};

/// Installs a formatted subscriber. `RUST_LOG` takes precedence over `verbose`.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Mean and population standard deviation of episode returns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnStatistics {
    pub mean: f64,
    pub std: f64,
}

impl ReturnStatistics {
    /// Both fields are NaN when there are no returns.
    pub fn from_returns(returns: &[f64]) -> Self {
        let n = returns.len() as f64;
        let mean = returns.iter().sum::<f64>() / n;
        let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
        ReturnStatistics {
            mean,
            std: variance.sqrt(),
        }
    }
}
