//! Event queue ordering.

use std::time::Duration;
use tunnelctl_core::Event;
use tunnelctl_types::{LspId, PathStatus, TunnelId};

/// Key for the simulation event queue.
///
/// Events fire in time order; events scheduled for the same instant fire in
/// the order they were scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventKey {
    /// Simulated time at which the event fires.
    pub time: Duration,
    /// Insertion counter, unique per runner.
    pub sequence: u64,
}

/// Something that happens in the simulated world.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    /// Deliver an event straight to the controller.
    Controller(Event),

    /// A requested path setup finishes (successfully or not).
    SetupComplete {
        /// Tunnel being set up.
        tunnel: TunnelId,
        /// Path being set up.
        lsp: LspId,
    },

    /// An established path goes down.
    PathDown {
        /// Tunnel.
        tunnel: TunnelId,
        /// Path.
        lsp: LspId,
        /// Status reported to the controller.
        status: PathStatus,
    },

    /// A path comes back up with a fresh label.
    PathUp {
        /// Tunnel.
        tunnel: TunnelId,
        /// Path.
        lsp: LspId,
    },

    /// Configure whether future setups of a path fail.
    SetupFailure {
        /// Tunnel.
        tunnel: TunnelId,
        /// Path.
        lsp: LspId,
        /// Fail future setups.
        fails: bool,
    },

    /// A raw sample for a named monitor.
    MonitorSample {
        /// Monitor name.
        monitor: String,
        /// Sample value.
        value: f64,
    },
}

impl SimEvent {
    /// Get the event type name for logging.
    pub fn type_name(&self) -> &'static str {
        match self {
            SimEvent::Controller(event) => event.type_name(),
            SimEvent::SetupComplete { .. } => "SetupComplete",
            SimEvent::PathDown { .. } => "PathDown",
            SimEvent::PathUp { .. } => "PathUp",
            SimEvent::SetupFailure { .. } => "SetupFailure",
            SimEvent::MonitorSample { .. } => "MonitorSample",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_same_instant_keeps_schedule_order() {
        let mut queue = BTreeMap::new();
        let at = Duration::from_secs(3);
        queue.insert(EventKey { time: at, sequence: 2 }, "second");
        queue.insert(EventKey { time: at, sequence: 1 }, "first");
        queue.insert(
            EventKey {
                time: Duration::from_secs(1),
                sequence: 9,
            },
            "earliest",
        );

        let order: Vec<_> = queue.into_values().collect();
        assert_eq!(order, vec!["earliest", "first", "second"]);
    }
}
