//! Failover engine configuration.

use std::time::Duration;
use tunnelctl_plan::PlanConfig;

/// Tunables for the failover engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailoverConfig {
    /// How long a restored primary must stay ready before traffic returns.
    ///
    /// Zero restores as soon as the primary is ready.
    pub restoration_delay: Duration,

    /// Return to the primary automatically once it is restored.
    ///
    /// When disabled, the tunnel stays on its backup until an operator
    /// `reroute ... action=restore` or a congestion clear moves it back.
    pub auto_restore_primary: bool,
}

impl Default for FailoverConfig {
    fn default() -> Self {
        Self {
            restoration_delay: Duration::ZERO,
            auto_restore_primary: true,
        }
    }
}

impl FailoverConfig {
    /// Set the restoration delay.
    pub fn with_restoration_delay(mut self, delay: Duration) -> Self {
        self.restoration_delay = delay;
        self
    }

    /// Enable or disable automatic restoration to the primary.
    pub fn with_auto_restore_primary(mut self, enabled: bool) -> Self {
        self.auto_restore_primary = enabled;
        self
    }
}

impl From<&PlanConfig> for FailoverConfig {
    fn from(config: &PlanConfig) -> Self {
        Self {
            restoration_delay: config.restoration_delay(),
            auto_restore_primary: config.auto_restore_primary,
        }
    }
}
