//! TOML configuration surface.
//!
//! ```toml
//! restoration_delay_ms = 5000
//! auto_restore_primary = true
//!
//! [[tunnels]]
//! id = 7
//!
//! [[tunnels.paths]]
//! lsp = 70
//! source = "10.0.0.1"
//! destination = "10.0.0.9"
//! permanent = true
//!
//! [[tunnels.paths]]
//! lsp = 71
//! source = "10.0.0.1"
//! destination = "10.0.0.9"
//! ```

use crate::TunnelPlan;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::Path;
use std::time::Duration;
use tunnelctl_types::{CandidatePath, ConfigError, LspId, TunnelId};

/// Controller configuration as loaded from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanConfig {
    /// How long a restored path must stay ready before traffic moves back to it.
    ///
    /// Zero restores immediately.
    #[serde(default)]
    pub restoration_delay_ms: u64,

    /// Move traffic back to the primary as soon as it is restored.
    #[serde(default = "default_auto_restore")]
    pub auto_restore_primary: bool,

    /// Tunnels and their candidate paths.
    #[serde(default)]
    pub tunnels: Vec<TunnelConfig>,
}

/// One tunnel's configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TunnelConfig {
    /// Tunnel identifier.
    pub id: TunnelId,
    /// Candidate paths, primary first.
    pub paths: Vec<PathConfig>,
}

/// One candidate path's configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathConfig {
    /// Path identifier.
    pub lsp: LspId,
    /// Tunnel ingress address.
    pub source: Ipv4Addr,
    /// Tunnel egress address.
    pub destination: Ipv4Addr,
    /// Establish eagerly at startup.
    #[serde(default)]
    pub permanent: bool,
    /// Optional explicit preference; when given it must increase down the list.
    #[serde(default)]
    pub preference: Option<u32>,
}

fn default_auto_restore() -> bool {
    true
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            restoration_delay_ms: 0,
            auto_restore_primary: default_auto_restore(),
            tunnels: Vec::new(),
        }
    }
}

impl PlanConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Restoration delay as a duration.
    pub fn restoration_delay(&self) -> Duration {
        Duration::from_millis(self.restoration_delay_ms)
    }

    /// Build the immutable tunnel plan.
    ///
    /// # Errors
    ///
    /// Everything [`TunnelPlan::new`] rejects, plus
    /// [`ConfigError::UnorderedCandidates`] when explicit preferences are not
    /// strictly increasing.
    pub fn build_plan(&self) -> Result<TunnelPlan, ConfigError> {
        let mut tunnels = Vec::with_capacity(self.tunnels.len());
        for tunnel in &self.tunnels {
            tunnel.check_order()?;
            tunnels.push((tunnel.id, tunnel.candidate_paths()));
        }
        TunnelPlan::new(tunnels)
    }
}

impl TunnelConfig {
    fn check_order(&self) -> Result<(), ConfigError> {
        let preferences: Vec<u32> = self.paths.iter().filter_map(|p| p.preference).collect();
        if preferences.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConfigError::UnorderedCandidates(self.id));
        }
        Ok(())
    }

    fn candidate_paths(&self) -> Vec<CandidatePath> {
        self.paths
            .iter()
            .map(|p| {
                let path = CandidatePath::new(self.id, p.lsp, p.source, p.destination);
                if p.permanent {
                    path.permanent()
                } else {
                    path
                }
            })
            .collect()
    }
}
