//! Health checking of deployed servers

pub mod checker;
pub mod probe;

pub use checker::{CheckOutcome, HealthChecker, HEALTHY_UPTIME};
pub use probe::{HealthProbe, ProbeOutcome, RandomProbe, ScriptedProbe};
