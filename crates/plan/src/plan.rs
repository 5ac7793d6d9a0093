//! Static per-tunnel candidate path table.

use crate::TunnelLspIndex;
use indexmap::IndexMap;
use tracing::debug;
use tunnelctl_types::{CandidatePath, ConfigError, LspId, TunnelId};

/// Position of the primary path in every tunnel's candidate list.
pub const PRIMARY_INDEX: usize = 0;

/// Ordered candidate paths for every tunnel.
///
/// Built once from configuration and immutable thereafter. Tunnels keep the
/// order in which they were configured; candidate lists keep preference
/// order, primary first.
#[derive(Debug, Clone)]
pub struct TunnelPlan {
    /// tunnel -> candidate paths, most preferred first
    tunnels: IndexMap<TunnelId, Vec<CandidatePath>>,
    /// Reverse lookup derived from `tunnels`.
    index: TunnelLspIndex,
}

impl TunnelPlan {
    /// Build a plan from ordered candidate lists.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::EmptyCandidates`] if a tunnel has no paths
    /// - [`ConfigError::DuplicateTunnel`] if a tunnel is listed twice
    /// - [`ConfigError::DuplicateLsp`] if an LSP repeats within a tunnel
    /// - [`ConfigError::SessionMismatch`] if a path addresses another tunnel
    pub fn new(
        tunnels: impl IntoIterator<Item = (TunnelId, Vec<CandidatePath>)>,
    ) -> Result<Self, ConfigError> {
        let mut plan = IndexMap::new();
        let mut index = TunnelLspIndex::new();

        for (tunnel, paths) in tunnels {
            if paths.is_empty() {
                return Err(ConfigError::EmptyCandidates(tunnel));
            }
            if plan.contains_key(&tunnel) {
                return Err(ConfigError::DuplicateTunnel(tunnel));
            }
            if let Some(stray) = paths.iter().find(|p| p.tunnel() != tunnel) {
                return Err(ConfigError::SessionMismatch {
                    tunnel,
                    lsp: stray.lsp(),
                    session: stray.tunnel(),
                });
            }

            index.insert_tunnel(tunnel, &paths)?;
            debug!(tunnel = %tunnel, candidates = paths.len(), "Planned tunnel");
            plan.insert(tunnel, paths);
        }

        Ok(Self {
            tunnels: plan,
            index,
        })
    }

    /// Candidate paths of a tunnel, most preferred first.
    pub fn paths(&self, tunnel: TunnelId) -> Option<&[CandidatePath]> {
        self.tunnels.get(&tunnel).map(Vec::as_slice)
    }

    /// Candidate path at a position.
    pub fn path(&self, tunnel: TunnelId, index: usize) -> Option<&CandidatePath> {
        self.tunnels.get(&tunnel)?.get(index)
    }

    /// Number of candidates for a tunnel (zero if unknown).
    pub fn candidate_count(&self, tunnel: TunnelId) -> usize {
        self.tunnels.get(&tunnel).map_or(0, Vec::len)
    }

    /// Position of an LSP within its tunnel.
    pub fn index_of(&self, tunnel: TunnelId, lsp: LspId) -> Option<usize> {
        self.index.position(tunnel, lsp)
    }

    /// Check if a tunnel is planned.
    pub fn contains(&self, tunnel: TunnelId) -> bool {
        self.tunnels.contains_key(&tunnel)
    }

    /// Planned tunnels in configuration order.
    pub fn tunnel_ids(&self) -> impl Iterator<Item = TunnelId> + '_ {
        self.tunnels.keys().copied()
    }

    /// Every path flagged for eager setup.
    pub fn permanent_paths(&self) -> impl Iterator<Item = &CandidatePath> + '_ {
        self.tunnels
            .values()
            .flat_map(|paths| paths.iter())
            .filter(|path| path.permanent)
    }

    /// Get the number of tunnels.
    pub fn len(&self) -> usize {
        self.tunnels.len()
    }

    /// Check if the plan is empty.
    pub fn is_empty(&self) -> bool {
        self.tunnels.is_empty()
    }
}
