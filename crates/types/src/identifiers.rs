//! Domain-specific identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tunnel identifier.
///
/// Stable across the lifetime of the controller; one tunnel is realized by
/// exactly one candidate path at a time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TunnelId(pub u32);

impl fmt::Display for TunnelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tunnel({})", self.0)
    }
}

/// Label-switched path identifier, unique within a tunnel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct LspId(pub u32);

impl fmt::Display for LspId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lsp({})", self.0)
    }
}

/// Forwarding label assigned to an established path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(pub u32);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Label({})", self.0)
    }
}

/// Forwarding-classification entry identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FecId(pub u32);

impl fmt::Display for FecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fec({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(TunnelId(7).to_string(), "Tunnel(7)");
        assert_eq!(LspId(71).to_string(), "Lsp(71)");
        assert_eq!(Label(1000).to_string(), "Label(1000)");
        assert_eq!(FecId(3).to_string(), "Fec(3)");
    }

    #[test]
    fn test_ordering_follows_raw_value() {
        assert!(LspId(1) < LspId(2));
        assert!(TunnelId(10) > TunnelId(9));
    }
}
