//! Candidate path descriptors.

use crate::{LspId, TunnelId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// Session addressing for a tunnel, as understood by the provisioning gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionDescriptor {
    /// Tunnel this session belongs to.
    pub tunnel: TunnelId,
    /// Tunnel egress address.
    pub destination: Ipv4Addr,
}

/// Sender addressing for one path of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SenderDescriptor {
    /// Path identifier within the session.
    pub lsp: LspId,
    /// Tunnel ingress address.
    pub source: Ipv4Addr,
}

/// One concrete path option for a tunnel.
///
/// Candidate paths are supplied externally, already ordered by preference.
/// Position 0 in a tunnel's list is the primary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidatePath {
    /// Session the path belongs to.
    pub session: SessionDescriptor,
    /// Sender template identifying the path.
    pub sender: SenderDescriptor,
    /// Established eagerly at startup rather than on demand.
    pub permanent: bool,
}

impl CandidatePath {
    /// Create a new on-demand candidate path.
    pub fn new(
        tunnel: TunnelId,
        lsp: LspId,
        source: Ipv4Addr,
        destination: Ipv4Addr,
    ) -> Self {
        Self {
            session: SessionDescriptor {
                tunnel,
                destination,
            },
            sender: SenderDescriptor { lsp, source },
            permanent: false,
        }
    }

    /// Mark the path as permanent (pre-established at startup).
    pub fn permanent(mut self) -> Self {
        self.permanent = true;
        self
    }

    /// Get the tunnel this path belongs to.
    pub fn tunnel(&self) -> TunnelId {
        self.session.tunnel
    }

    /// Get the path identifier.
    pub fn lsp(&self) -> LspId {
        self.sender.lsp
    }
}

impl fmt::Display for CandidatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} ({} -> {})",
            self.session.tunnel, self.sender.lsp, self.sender.source, self.session.destination
        )
    }
}
