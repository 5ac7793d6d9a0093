//! Configuration types for the simulator.

use std::path::PathBuf;
use std::time::Duration;

/// Time simulated past the last scenario step when no end time is given.
pub const DEFAULT_SETTLE_TIME: Duration = Duration::from_secs(10);

/// Configuration for a simulation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimulatorConfig {
    /// Plan file (tunnels, candidates, failover tunables).
    pub plan_path: PathBuf,

    /// Scenario file (steps, monitors, runner tunables).
    pub scenario_path: PathBuf,

    /// Simulated end time. Defaults to the last step plus the restoration
    /// delay plus [`DEFAULT_SETTLE_TIME`].
    pub until: Option<Duration>,

    /// Overrides the scenario's seed.
    pub seed: Option<u64>,
}

impl SimulatorConfig {
    /// Create a simulator configuration.
    pub fn new(plan_path: impl Into<PathBuf>, scenario_path: impl Into<PathBuf>) -> Self {
        Self {
            plan_path: plan_path.into(),
            scenario_path: scenario_path.into(),
            until: None,
            seed: None,
        }
    }

    /// Set the simulated end time.
    pub fn with_until(mut self, until: Duration) -> Self {
        self.until = Some(until);
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
