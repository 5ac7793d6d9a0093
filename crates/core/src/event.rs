//! Events delivered to the controller.

use crate::OperatorCommand;
use tunnelctl_types::{LspId, PathStatus, TunnelId};

/// Inputs to the tunnel controller.
///
/// Events are processed strictly in arrival order; each one runs to
/// completion before the next is considered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A link-health monitor changed its threshold state.
    ///
    /// Level-triggered: the monitor reports `congested = false` when its
    /// condition clears.
    CongestionNotification {
        /// Tunnel the monitor watches.
        tunnel: TunnelId,
        /// New level.
        congested: bool,
        /// Monitor name, for logging.
        source: String,
    },

    /// The signaling layer reported a provisioning change for a path.
    PathStatus {
        /// Tunnel owning the path.
        tunnel: TunnelId,
        /// Path identifier.
        lsp: LspId,
        /// New status.
        status: PathStatus,
    },

    /// An operator or scenario script issued a command.
    OperatorCommand(OperatorCommand),

    /// The restoration-check timer fired.
    RestorationTimer,

    /// The controller is shutting down; outstanding timers must be cancelled.
    Shutdown,
}

impl Event {
    /// Get a human-readable name for this event type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Event::CongestionNotification { .. } => "CongestionNotification",
            Event::PathStatus { .. } => "PathStatus",
            Event::OperatorCommand(_) => "OperatorCommand",
            Event::RestorationTimer => "RestorationTimer",
            Event::Shutdown => "Shutdown",
        }
    }

    /// The tunnel this event concerns, if any.
    pub fn tunnel(&self) -> Option<TunnelId> {
        match self {
            Event::CongestionNotification { tunnel, .. } | Event::PathStatus { tunnel, .. } => {
                Some(*tunnel)
            }
            Event::OperatorCommand(command) => Some(command.tunnel()),
            Event::RestorationTimer | Event::Shutdown => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tunnel_of_event() {
        let status = Event::PathStatus {
            tunnel: TunnelId(7),
            lsp: LspId(70),
            status: PathStatus::Failed,
        };
        assert_eq!(status.tunnel(), Some(TunnelId(7)));

        let command = OperatorCommand::parse("reroute tunnelId=4 action=restore").unwrap();
        assert_eq!(Event::OperatorCommand(command).tunnel(), Some(TunnelId(4)));

        assert_eq!(Event::RestorationTimer.tunnel(), None);
        assert_eq!(Event::Shutdown.tunnel(), None);
    }
}
