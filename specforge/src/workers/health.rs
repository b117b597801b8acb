//! Health scheduler worker

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::health::{CheckOutcome, HealthChecker};

/// Health worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Time between two rounds of checks
    pub interval: Duration,

    /// Initial delay before the first round
    pub initial_delay: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            initial_delay: Duration::from_secs(5),
        }
    }
}

/// Run the health worker
pub async fn run<S, F>(
    options: &Options,
    checker: &HealthChecker,
    sleep_fn: S,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Health worker starting...");

    tokio::select! {
        _ = &mut shutdown_signal => {
            info!("Health worker shutting down...");
            return;
        }
        _ = sleep_fn(options.initial_delay) => {}
    }

    // first round right after the initial delay, then one per interval
    loop {
        match checker.check_all_active().await {
            Ok(outcomes) => {
                let passed = outcomes
                    .iter()
                    .filter(|o| matches!(o, CheckOutcome::Passed { .. }))
                    .count();
                let degraded = outcomes
                    .iter()
                    .filter(|o| matches!(o, CheckOutcome::Degraded { .. }))
                    .count();
                debug!(checked = outcomes.len(), passed, degraded, "Health round complete");
            }
            Err(e) => {
                error!("Health round failed: {}", e);
            }
        }

        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Health worker shutting down...");
                return;
            }
            _ = sleep_fn(options.interval) => {}
        }
    }
}
