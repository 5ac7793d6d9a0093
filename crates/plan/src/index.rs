//! Reverse lookup from path identifier to candidate position.

use std::collections::HashMap;
use tunnelctl_types::{CandidatePath, ConfigError, LspId, TunnelId};

/// Tunnel → (lspId → position) reverse index.
///
/// Built once from the plan before any event is processed. Within a tunnel
/// the mapping is bijective: every position has exactly one LSP and no LSP
/// appears twice.
#[derive(Debug, Default, Clone)]
pub struct TunnelLspIndex {
    /// tunnel -> lsp -> position in the tunnel's candidate list
    positions: HashMap<TunnelId, HashMap<LspId, usize>>,
}

impl TunnelLspIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index one tunnel's ordered candidate list.
    ///
    /// Fails if an LSP appears twice, which would break bijectivity.
    pub fn insert_tunnel(
        &mut self,
        tunnel: TunnelId,
        paths: &[CandidatePath],
    ) -> Result<(), ConfigError> {
        let mut by_lsp = HashMap::with_capacity(paths.len());
        for (position, path) in paths.iter().enumerate() {
            if by_lsp.insert(path.lsp(), position).is_some() {
                return Err(ConfigError::DuplicateLsp {
                    tunnel,
                    lsp: path.lsp(),
                });
            }
        }
        self.positions.insert(tunnel, by_lsp);
        Ok(())
    }

    /// Position of an LSP within its tunnel's candidate list.
    pub fn position(&self, tunnel: TunnelId, lsp: LspId) -> Option<usize> {
        self.positions.get(&tunnel)?.get(&lsp).copied()
    }

    /// Check if a tunnel is indexed.
    pub fn contains_tunnel(&self, tunnel: TunnelId) -> bool {
        self.positions.contains_key(&tunnel)
    }

    /// Number of LSPs indexed for a tunnel.
    pub fn lsp_count(&self, tunnel: TunnelId) -> usize {
        self.positions.get(&tunnel).map_or(0, HashMap::len)
    }

    /// Get the number of tunnels indexed.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn path(tunnel: u32, lsp: u32) -> CandidatePath {
        CandidatePath::new(
            TunnelId(tunnel),
            LspId(lsp),
            Ipv4Addr::new(10, 0, 0, 1),
            Ipv4Addr::new(10, 0, 0, 2),
        )
    }

    #[test]
    fn test_positions() {
        let mut index = TunnelLspIndex::new();
        index
            .insert_tunnel(TunnelId(1), &[path(1, 10), path(1, 12), path(1, 11)])
            .unwrap();

        assert_eq!(index.position(TunnelId(1), LspId(10)), Some(0));
        assert_eq!(index.position(TunnelId(1), LspId(12)), Some(1));
        assert_eq!(index.position(TunnelId(1), LspId(11)), Some(2));
        assert_eq!(index.position(TunnelId(1), LspId(99)), None);
        assert_eq!(index.position(TunnelId(2), LspId(10)), None);
        assert_eq!(index.lsp_count(TunnelId(1)), 3);
    }

    #[test]
    fn test_duplicate_lsp_rejected() {
        let mut index = TunnelLspIndex::new();
        let err = index
            .insert_tunnel(TunnelId(1), &[path(1, 10), path(1, 10)])
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::DuplicateLsp {
                tunnel: TunnelId(1),
                lsp: LspId(10),
            }
        );
        assert!(!index.contains_tunnel(TunnelId(1)));
    }
}
