//! Scenario files.
//!
//! A scenario lists timed world changes (path failures and recoveries,
//! congestion levels, operator commands, monitor samples) plus the
//! monitors the samples feed:
//!
//! ```toml
//! [simulation]
//! setup_latency_ms = 2000
//!
//! [[monitors]]
//! name = "queue0"
//! tunnel = 7
//! kind = "queue_depth"
//! high_watermark = 40.0
//! low_watermark = 10.0
//!
//! [[steps]]
//! at_ms = 10000
//! action = "path_down"
//! tunnel = 7
//! lsp = 70
//!
//! [[steps]]
//! at_ms = 30000
//! action = "command"
//! command = "reroute tunnelId=7 action=restore"
//! ```

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tunnelctl_core::OperatorCommand;
use tunnelctl_monitors::MonitorConfig;
use tunnelctl_types::{ConfigError, LspId, PathStatus, TunnelId};

/// Runner tunables that may be set from a scenario file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationSettings {
    /// Base time a path setup takes.
    pub setup_latency_ms: u64,
    /// Upper bound of the random extra setup time.
    pub setup_jitter_ms: u64,
    /// Seed for the jitter generator.
    pub seed: Option<u64>,
    /// Classification entries created per tunnel.
    pub fec_entries_per_tunnel: usize,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            setup_latency_ms: 50,
            setup_jitter_ms: 0,
            seed: None,
            fec_entries_per_tunnel: 1,
        }
    }
}

/// One change to the simulated world.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScenarioStep {
    /// Take a path down and report it.
    PathDown {
        /// Tunnel.
        tunnel: TunnelId,
        /// Path.
        lsp: LspId,
        /// Reported status, `failed` unless given.
        #[serde(default = "default_down_status")]
        status: PathStatus,
    },
    /// Bring a path back up and report it created.
    PathUp {
        /// Tunnel.
        tunnel: TunnelId,
        /// Path.
        lsp: LspId,
    },
    /// Make future setups of a path fail (or succeed again).
    SetupFailure {
        /// Tunnel.
        tunnel: TunnelId,
        /// Path.
        lsp: LspId,
        /// Fail future setups.
        #[serde(default = "default_true")]
        fails: bool,
    },
    /// Deliver a congestion level directly.
    Congestion {
        /// Tunnel.
        tunnel: TunnelId,
        /// Level.
        congested: bool,
        /// Notification source.
        #[serde(default = "default_source")]
        source: String,
    },
    /// Deliver an operator command line.
    Command {
        /// Command text, e.g. `reroute tunnelId=7`.
        command: String,
    },
    /// Feed a sample to a configured monitor.
    Sample {
        /// Monitor name.
        monitor: String,
        /// Sample value.
        value: f64,
    },
}

fn default_down_status() -> PathStatus {
    PathStatus::Failed
}

fn default_true() -> bool {
    true
}

fn default_source() -> String {
    "scenario".to_string()
}

/// A step with its firing time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScheduledStep {
    /// Simulated time in milliseconds.
    pub at_ms: u64,
    /// What happens.
    #[serde(flatten)]
    pub step: ScenarioStep,
}

impl ScheduledStep {
    /// Firing time.
    pub fn at(&self) -> Duration {
        Duration::from_millis(self.at_ms)
    }
}

/// A parsed scenario file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Runner tunables.
    #[serde(default)]
    pub simulation: SimulationSettings,
    /// Monitors fed by `sample` steps.
    #[serde(default)]
    pub monitors: Vec<MonitorConfig>,
    /// Timed steps, in any order.
    #[serde(default)]
    pub steps: Vec<ScheduledStep>,
}

impl Scenario {
    /// Parse and validate a scenario from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let scenario: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Load and validate a scenario file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Check monitors, sample references and command syntax.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for monitor in &self.monitors {
            monitor.validate()?;
            if !names.insert(monitor.name.as_str()) {
                return Err(ConfigError::DuplicateMonitor(monitor.name.clone()));
            }
        }

        for scheduled in &self.steps {
            match &scheduled.step {
                ScenarioStep::Command { command } => {
                    OperatorCommand::parse(command)?;
                }
                ScenarioStep::Sample { monitor, .. } if !names.contains(monitor.as_str()) => {
                    return Err(ConfigError::UnknownMonitor(monitor.clone()));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Time of the last step, if any.
    pub fn last_step_at(&self) -> Option<Duration> {
        self.steps.iter().map(ScheduledStep::at).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SCENARIO: &str = r#"
        [simulation]
        setup_latency_ms = 2000
        seed = 7

        [[monitors]]
        name = "queue0"
        tunnel = 7
        kind = "queue_depth"
        high_watermark = 40.0
        low_watermark = 10.0

        [[steps]]
        at_ms = 10000
        action = "path_down"
        tunnel = 7
        lsp = 70

        [[steps]]
        at_ms = 11000
        action = "path_down"
        tunnel = 7
        lsp = 71
        status = "preempted"

        [[steps]]
        at_ms = 20000
        action = "sample"
        monitor = "queue0"
        value = 55.0

        [[steps]]
        at_ms = 30000
        action = "command"
        command = "reroute tunnelId=7 action=restore"
    "#;

    #[test]
    fn test_parse_scenario() {
        let scenario = Scenario::from_toml_str(SCENARIO).unwrap();

        assert_eq!(scenario.simulation.setup_latency_ms, 2000);
        assert_eq!(scenario.simulation.setup_jitter_ms, 0);
        assert_eq!(scenario.simulation.seed, Some(7));
        assert_eq!(scenario.monitors.len(), 1);
        assert_eq!(scenario.steps.len(), 4);
        assert_eq!(
            scenario.steps[0].step,
            ScenarioStep::PathDown {
                tunnel: TunnelId(7),
                lsp: LspId(70),
                status: PathStatus::Failed,
            }
        );
        assert!(matches!(
            scenario.steps[1].step,
            ScenarioStep::PathDown {
                status: PathStatus::Preempted,
                ..
            }
        ));
        assert_eq!(scenario.last_step_at(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_unknown_monitor_rejected() {
        let text = r#"
            [[steps]]
            at_ms = 1
            action = "sample"
            monitor = "missing"
            value = 1.0
        "#;
        assert_eq!(
            Scenario::from_toml_str(text),
            Err(ConfigError::UnknownMonitor("missing".to_string()))
        );
    }

    #[test]
    fn test_bad_command_rejected() {
        let text = r#"
            [[steps]]
            at_ms = 1
            action = "command"
            command = "reroute action=restore"
        "#;
        assert!(matches!(
            Scenario::from_toml_str(text),
            Err(ConfigError::MissingArgument { .. })
        ));
    }

    #[test]
    fn test_duplicate_monitor_rejected() {
        let text = r#"
            [[monitors]]
            name = "eth0"
            tunnel = 7
            kind = "link_state"

            [[monitors]]
            name = "eth0"
            tunnel = 8
            kind = "link_state"
        "#;
        assert_eq!(
            Scenario::from_toml_str(text),
            Err(ConfigError::DuplicateMonitor("eth0".to_string()))
        );
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SCENARIO.as_bytes()).unwrap();

        let scenario = Scenario::load(file.path()).unwrap();
        assert_eq!(scenario.steps.len(), 4);

        assert!(matches!(
            Scenario::load("/nonexistent/scenario.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
