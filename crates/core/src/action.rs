//! Actions returned by the controller for the runner to execute.

use std::fmt;
use std::time::Duration;
use tunnelctl_types::{Label, LspId, TunnelId};

/// Timers owned by the controller.
///
/// Each timer id has at most one outstanding schedule; setting it again
/// replaces the previous schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerId {
    /// Re-check tunnels whose restoration is waiting out the restoration delay.
    RestorationCheck,
}

/// A committed switch of a tunnel's active path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSwitch {
    /// Tunnel that switched.
    pub tunnel: TunnelId,
    /// Previous active position in the candidate list.
    pub from_index: usize,
    /// New active position in the candidate list.
    pub to_index: usize,
    /// Path now carrying the tunnel.
    pub lsp: LspId,
    /// Label the forwarding entries were rebound to.
    pub label: Label,
    /// Number of forwarding entries rebound.
    pub rebound: usize,
    /// What triggered the switch.
    pub reason: String,
}

impl fmt::Display for PathSwitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} switched index {} -> {} ({}, {}) due to {}",
            self.tunnel, self.from_index, self.to_index, self.lsp, self.label, self.reason
        )
    }
}

/// Actions the runner performs on behalf of the controller.
///
/// Gateway calls are synchronous and happen inside `handle()`; only work
/// that must happen later, or be observed from outside, is expressed here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // ═══════════════════════════════════════════════════════════════════════
    // Timers
    // ═══════════════════════════════════════════════════════════════════════
    /// Deliver the timer's event after `duration`.
    SetTimer {
        /// Which timer to arm.
        id: TimerId,
        /// Delay from the current time.
        duration: Duration,
    },

    /// Cancel an outstanding timer. No-op if it is not armed.
    CancelTimer {
        /// Which timer to cancel.
        id: TimerId,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Notifications
    // ═══════════════════════════════════════════════════════════════════════
    /// A tunnel's active path changed.
    EmitPathSwitched(PathSwitch),
}

impl Action {
    /// Get a human-readable name for this action type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Action::SetTimer { .. } => "SetTimer",
            Action::CancelTimer { .. } => "CancelTimer",
            Action::EmitPathSwitched(_) => "EmitPathSwitched",
        }
    }
}
