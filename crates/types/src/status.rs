//! Path provisioning status and readiness.

use crate::{FecId, Label, LspId, TunnelId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Provisioning status reported by the signaling layer for one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathStatus {
    /// Path was set up successfully.
    Created,
    /// Path setup failed or an established path went down.
    Failed,
    /// No feasible route for the path.
    Unfeasible,
    /// Path was preempted by a higher-priority reservation.
    Preempted,
}

impl PathStatus {
    /// Whether this status takes the path out of service.
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            PathStatus::Failed | PathStatus::Unfeasible | PathStatus::Preempted
        )
    }
}

impl fmt::Display for PathStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PathStatus::Created => "CREATED",
            PathStatus::Failed => "FAILED",
            PathStatus::Unfeasible => "UNFEASIBLE",
            PathStatus::Preempted => "PREEMPTED",
        };
        f.write_str(name)
    }
}

/// Provisioning state of a path as reported by the provisioning gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PathState {
    /// The path has an established provisioning state.
    pub established: bool,
    /// Forwarding label, once assigned.
    pub label: Option<Label>,
}

impl PathState {
    /// A path with no provisioning state.
    pub const ABSENT: Self = PathState {
        established: false,
        label: None,
    };

    /// An established path with its label assigned.
    pub fn ready(label: Label) -> Self {
        Self {
            established: true,
            label: Some(label),
        }
    }

    /// An established path still waiting for its label.
    pub fn awaiting_label() -> Self {
        Self {
            established: true,
            label: None,
        }
    }

    /// Ready iff established and labeled. Gates every switch commit.
    pub fn is_ready(&self) -> bool {
        self.established && self.label.is_some()
    }

    /// The label, only when the path is ready.
    pub fn ready_label(&self) -> Option<Label> {
        if self.established {
            self.label
        } else {
            None
        }
    }
}

/// A forwarding-classification entry and the path it is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FecBinding {
    /// Entry identifier.
    pub fec: FecId,
    /// Tunnel the entry classifies traffic into.
    pub tunnel: TunnelId,
    /// Path currently carrying the entry's traffic, if bound.
    pub lsp: Option<LspId>,
    /// Label currently bound, if any.
    pub label: Option<Label>,
}
