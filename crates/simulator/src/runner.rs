//! Simulator runner.

use crate::config::{SimulatorConfig, DEFAULT_SETTLE_TIME};
use crate::report::{SimulationReport, TunnelSummary};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tunnelctl_failover::FailoverConfig;
use tunnelctl_plan::PlanConfig;
use tunnelctl_simulation::{Scenario, SimulationConfig, SimulationRunner};
use tunnelctl_types::ConfigError;

/// A loaded plan and scenario, ready to run.
pub struct Simulator {
    runner: SimulationRunner,
    end: Duration,
}

impl Simulator {
    /// Load the plan and scenario files named by `config`.
    pub fn from_config(config: &SimulatorConfig) -> Result<Self, ConfigError> {
        let plan = PlanConfig::load(&config.plan_path)?;
        let scenario = Scenario::load(&config.scenario_path)?;
        Self::new(&plan, &scenario, config.until, config.seed)
    }

    /// Build a simulator from parsed configuration.
    pub fn new(
        plan_config: &PlanConfig,
        scenario: &Scenario,
        until: Option<Duration>,
        seed: Option<u64>,
    ) -> Result<Self, ConfigError> {
        let plan = Arc::new(plan_config.build_plan()?);
        let failover = FailoverConfig::from(plan_config);

        let mut sim_config = SimulationConfig::from(&scenario.simulation);
        if let Some(seed) = seed {
            sim_config = sim_config.with_seed(seed);
        }

        let end = until.unwrap_or_else(|| {
            scenario.last_step_at().unwrap_or(Duration::ZERO)
                + failover.restoration_delay
                + DEFAULT_SETTLE_TIME
        });

        let mut runner = SimulationRunner::new(plan, failover, sim_config);
        runner.load_scenario(scenario)?;

        Ok(Self { runner, end })
    }

    /// Simulated end time.
    pub fn end(&self) -> Duration {
        self.end
    }

    /// Run to the end time, shut the controller down and summarise.
    pub fn run(mut self) -> SimulationReport {
        info!(end = ?self.end, seed = self.runner.config().seed, "Starting simulation");
        self.runner.run_until(self.end);
        self.runner.shutdown();

        let tunnels = self
            .runner
            .plan()
            .tunnel_ids()
            .filter_map(|tunnel| {
                let state = self.runner.state(tunnel)?;
                Some(TunnelSummary {
                    tunnel,
                    active_index: state.active_index,
                    active_lsp: self.runner.active_lsp(tunnel),
                    pending_index: state.pending_index,
                    primary_unavailable: state.primary_unavailable,
                    congestion_forced: state.congestion_forced,
                })
            })
            .collect();

        SimulationReport {
            end: self.end,
            stats: self.runner.stats(),
            tunnels,
            switches: self.runner.switches().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tracing_test::traced_test;
    use tunnelctl_types::{LspId, TunnelId};

    const PLAN: &str = r#"
        restoration_delay_ms = 5000

        [[tunnels]]
        id = 7

        [[tunnels.paths]]
        lsp = 70
        source = "10.0.0.1"
        destination = "10.0.0.9"

        [[tunnels.paths]]
        lsp = 71
        source = "10.0.0.1"
        destination = "10.0.0.9"

        [[tunnels]]
        id = 8

        [[tunnels.paths]]
        lsp = 80
        source = "10.0.0.2"
        destination = "10.0.0.9"
    "#;

    const SCENARIO: &str = r#"
        [simulation]
        setup_latency_ms = 1000

        [[steps]]
        at_ms = 10000
        action = "path_down"
        tunnel = 7
        lsp = 70

        [[steps]]
        at_ms = 20000
        action = "path_up"
        tunnel = 7
        lsp = 70
    "#;

    fn write_temp(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[traced_test]
    #[test]
    fn test_run_from_files() {
        let plan = write_temp(PLAN);
        let scenario = write_temp(SCENARIO);
        let config = SimulatorConfig::new(plan.path(), scenario.path());

        let simulator = Simulator::from_config(&config).unwrap();
        // Last step + restoration delay + settle time.
        assert_eq!(simulator.end(), Duration::from_secs(35));

        let report = simulator.run();
        let tunnel = report.tunnel(TunnelId(7)).unwrap();
        assert_eq!(tunnel.active_lsp, Some(LspId(70)));
        assert!(!tunnel.primary_unavailable);
        assert_eq!(report.switches.len(), 2);
        assert_eq!(report.switches[1].at, Duration::from_secs(25));
        assert_eq!(report.tunnels.len(), 2);

        let text = report.to_string();
        assert!(text.contains("Tunnel(7): active=0 (Lsp(70))"));
        assert!(text.contains("switches committed:  2"));
    }

    #[traced_test]
    #[test]
    fn test_until_cuts_run_short() {
        let plan = PlanConfig::from_toml_str(PLAN).unwrap();
        let scenario = Scenario::from_toml_str(SCENARIO).unwrap();

        let report = Simulator::new(&plan, &scenario, Some(Duration::from_secs(18)), Some(3))
            .unwrap()
            .run();

        assert_eq!(report.end, Duration::from_secs(18));
        let tunnel = report.tunnel(TunnelId(7)).unwrap();
        assert_eq!(tunnel.active_lsp, Some(LspId(71)));
        assert!(tunnel.primary_unavailable);
    }

    #[test]
    fn test_invalid_plan_is_reported() {
        let plan = PlanConfig::from_toml_str(
            r#"
            [[tunnels]]
            id = 7
            paths = []
            "#,
        )
        .unwrap();
        let result = Simulator::new(&plan, &Scenario::default(), None, None);
        assert!(matches!(result, Err(ConfigError::EmptyCandidates(_))));
    }
}
