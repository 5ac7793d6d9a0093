//! Run summary.

use std::fmt;
use std::time::Duration;
use tunnelctl_simulation::{SimulationStats, SwitchRecord};
use tunnelctl_types::{LspId, TunnelId};

/// Final state of one tunnel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelSummary {
    /// Tunnel.
    pub tunnel: TunnelId,
    /// Active candidate position.
    pub active_index: usize,
    /// Active path.
    pub active_lsp: Option<LspId>,
    /// Switch target still awaiting provisioning.
    pub pending_index: Option<usize>,
    /// Primary marked unavailable.
    pub primary_unavailable: bool,
    /// Held off the primary by congestion.
    pub congestion_forced: bool,
}

/// Outcome of a simulation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationReport {
    /// Simulated time the run stopped at.
    pub end: Duration,
    /// Runner statistics.
    pub stats: SimulationStats,
    /// Per-tunnel final state, in tunnel id order.
    pub tunnels: Vec<TunnelSummary>,
    /// Every committed switch.
    pub switches: Vec<SwitchRecord>,
}

impl SimulationReport {
    /// Final state of one tunnel.
    pub fn tunnel(&self, tunnel: TunnelId) -> Option<&TunnelSummary> {
        self.tunnels.iter().find(|t| t.tunnel == tunnel)
    }
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Simulation ended at {:?}", self.end)?;
        writeln!(f)?;

        writeln!(f, "Switches:")?;
        if self.switches.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for record in &self.switches {
            writeln!(f, "  {:>10?}  {}", record.at, record.switch)?;
        }
        writeln!(f)?;

        writeln!(f, "Tunnels:")?;
        for t in &self.tunnels {
            let lsp = t
                .active_lsp
                .map(|lsp| lsp.to_string())
                .unwrap_or_else(|| "-".to_string());
            write!(f, "  {}: active={} ({})", t.tunnel, t.active_index, lsp)?;
            if let Some(pending) = t.pending_index {
                write!(f, " pending={pending}")?;
            }
            if t.primary_unavailable {
                write!(f, " primary-unavailable")?;
            }
            if t.congestion_forced {
                write!(f, " congestion-forced")?;
            }
            writeln!(f)?;
        }
        writeln!(f)?;

        writeln!(f, "Statistics:")?;
        writeln!(f, "  events processed:    {}", self.stats.events_processed)?;
        writeln!(f, "  switches committed:  {}", self.stats.switches_committed)?;
        writeln!(f, "  setup requests:      {}", self.stats.setup_requests)?;
        writeln!(f, "  timers fired:        {}", self.stats.timers_fired)?;
        write!(f, "  monitor transitions: {}", self.stats.monitor_transitions)
    }
}
