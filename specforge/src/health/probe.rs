//! Health probes

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use platform_models::ServerRecord;
use rand::Rng;

pub const DEFAULT_PASS_RATE: f64 = 0.95;
pub const DEGRADED_RESPONSE_TIME: &str = "2.5s";

/// Result of probing one server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Server answered normally and served this many requests since the last probe
    Healthy { requests_served: u64 },

    /// Server answered slowly
    Degraded { response_time: String },
}

/// Evaluates the operational state of an active server
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self, server: &ServerRecord) -> ProbeOutcome;
}

/// Probe simulating a server that mostly passes
#[derive(Debug, Clone)]
pub struct RandomProbe {
    pass_rate: f64,
}

impl RandomProbe {
    pub fn new(pass_rate: f64) -> Self {
        Self {
            pass_rate: pass_rate.clamp(0.0, 1.0),
        }
    }

    pub fn pass_rate(&self) -> f64 {
        self.pass_rate
    }

    fn draw(&self) -> ProbeOutcome {
        let mut rng = rand::rng();
        if rng.random_bool(self.pass_rate) {
            ProbeOutcome::Healthy {
                requests_served: rng.random_range(0..10),
            }
        } else {
            ProbeOutcome::Degraded {
                response_time: DEGRADED_RESPONSE_TIME.to_string(),
            }
        }
    }
}

impl Default for RandomProbe {
    fn default() -> Self {
        Self::new(DEFAULT_PASS_RATE)
    }
}

#[async_trait]
impl HealthProbe for RandomProbe {
    async fn probe(&self, _server: &ServerRecord) -> ProbeOutcome {
        self.draw()
    }
}

/// Probe replaying a fixed sequence of outcomes
///
/// Once the script runs out every probe is healthy with no traffic.
#[derive(Debug, Default)]
pub struct ScriptedProbe {
    outcomes: Mutex<VecDeque<ProbeOutcome>>,
}

impl ScriptedProbe {
    pub fn new(outcomes: impl IntoIterator<Item = ProbeOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
        }
    }

    pub fn healthy(requests_served: u64) -> ProbeOutcome {
        ProbeOutcome::Healthy { requests_served }
    }

    pub fn degraded() -> ProbeOutcome {
        ProbeOutcome::Degraded {
            response_time: DEGRADED_RESPONSE_TIME.to_string(),
        }
    }

    /// Outcomes not yet consumed
    pub fn remaining(&self) -> usize {
        self.outcomes.lock().map(|queue| queue.len()).unwrap_or(0)
    }
}

#[async_trait]
impl HealthProbe for ScriptedProbe {
    async fn probe(&self, _server: &ServerRecord) -> ProbeOutcome {
        let next = match self.outcomes.lock() {
            Ok(mut queue) => queue.pop_front(),
            Err(poisoned) => poisoned.into_inner().pop_front(),
        };
        next.unwrap_or(ProbeOutcome::Healthy { requests_served: 0 })
    }
}
