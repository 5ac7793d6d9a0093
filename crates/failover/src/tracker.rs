//! Per-tunnel active path state.

use std::collections::BTreeMap;
use tunnelctl_plan::{TunnelPlan, PRIMARY_INDEX};
use tunnelctl_types::TunnelId;

/// Mutable selection state of one tunnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveState {
    /// Position of the path currently bound to forwarding.
    pub active_index: usize,
    /// Switch target still awaiting provisioning, if any.
    pub pending_index: Option<usize>,
    /// The primary has failed and has not been confirmed restored.
    pub primary_unavailable: bool,
    /// The tunnel is held off the primary by a congestion condition.
    pub congestion_forced: bool,
}

impl ActiveState {
    /// Fresh state: on the primary, nothing pending, no flags.
    pub fn on_primary() -> Self {
        Self {
            active_index: PRIMARY_INDEX,
            pending_index: None,
            primary_unavailable: false,
            congestion_forced: false,
        }
    }

    /// The position selection decisions are made relative to: the pending
    /// target if a switch is in flight, otherwise the active path.
    pub fn effective_index(&self) -> usize {
        self.pending_index.unwrap_or(self.active_index)
    }

    /// Check if the primary is the active path.
    pub fn is_on_primary(&self) -> bool {
        self.active_index == PRIMARY_INDEX
    }
}

/// Tracks [`ActiveState`] for every planned tunnel.
///
/// Owned exclusively by the failover engine; all mutation goes through the
/// engine's operations.
#[derive(Debug, Default)]
pub struct ActivePathTracker {
    states: BTreeMap<TunnelId, ActiveState>,
}

impl ActivePathTracker {
    /// Create a tracker with every planned tunnel on its primary.
    pub fn new(plan: &TunnelPlan) -> Self {
        Self {
            states: plan
                .tunnel_ids()
                .map(|tunnel| (tunnel, ActiveState::on_primary()))
                .collect(),
        }
    }

    /// State of a tunnel, if planned.
    pub fn state(&self, tunnel: TunnelId) -> Option<&ActiveState> {
        self.states.get(&tunnel)
    }

    /// All tracked tunnels in id order.
    pub fn iter(&self) -> impl Iterator<Item = (TunnelId, &ActiveState)> + '_ {
        self.states.iter().map(|(tunnel, state)| (*tunnel, state))
    }

    /// Get the number of tunnels tracked.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Check if the tracker is empty.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Mutation (engine only)
    // ═══════════════════════════════════════════════════════════════════════

    pub(crate) fn state_mut(&mut self, tunnel: TunnelId) -> Option<&mut ActiveState> {
        self.states.get_mut(&tunnel)
    }

    /// Overwrite the active index without touching other fields.
    pub(crate) fn set_active(&mut self, tunnel: TunnelId, index: usize) {
        if let Some(state) = self.states.get_mut(&tunnel) {
            state.active_index = index;
        }
    }

    pub(crate) fn set_pending(&mut self, tunnel: TunnelId, index: usize) {
        if let Some(state) = self.states.get_mut(&tunnel) {
            state.pending_index = Some(index);
        }
    }

    /// Abandon the pending target. Returns it, if there was one.
    pub(crate) fn clear_pending(&mut self, tunnel: TunnelId) -> Option<usize> {
        self.states.get_mut(&tunnel)?.pending_index.take()
    }

    /// Commit a switch. Returns the previous active index.
    pub(crate) fn commit(&mut self, tunnel: TunnelId, index: usize) -> Option<usize> {
        let state = self.states.get_mut(&tunnel)?;
        let previous = state.active_index;
        state.active_index = index;
        state.pending_index = None;
        Some(previous)
    }

    /// Set the congestion-forced flag. Returns true if it changed.
    pub(crate) fn set_congestion_forced(&mut self, tunnel: TunnelId, forced: bool) -> bool {
        match self.states.get_mut(&tunnel) {
            Some(state) if state.congestion_forced != forced => {
                state.congestion_forced = forced;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tunnelctl_test_helpers::{plan_with_lsps, single_tunnel_plan};

    #[test]
    fn test_starts_on_primary() {
        let plan = plan_with_lsps(vec![(7, vec![70, 71, 72]), (8, vec![80])]);
        let tracker = ActivePathTracker::new(&plan);

        assert_eq!(tracker.len(), 2);
        let state = tracker.state(TunnelId(7)).unwrap();
        assert!(state.is_on_primary());
        assert_eq!(state.pending_index, None);
        assert!(!state.primary_unavailable);
        assert!(!state.congestion_forced);
        assert!(tracker.state(TunnelId(9)).is_none());
    }

    #[test]
    fn test_effective_index_prefers_pending() {
        let plan = single_tunnel_plan(7, &[70, 71, 72]);
        let mut tracker = ActivePathTracker::new(&plan);

        tracker.set_active(TunnelId(7), 1);
        assert_eq!(tracker.state(TunnelId(7)).unwrap().effective_index(), 1);

        tracker.set_pending(TunnelId(7), 2);
        assert_eq!(tracker.state(TunnelId(7)).unwrap().effective_index(), 2);

        assert_eq!(tracker.commit(TunnelId(7), 2), Some(1));
        let state = tracker.state(TunnelId(7)).unwrap();
        assert_eq!(state.active_index, 2);
        assert_eq!(state.pending_index, None);
    }

    #[test]
    fn test_congestion_flag_reports_changes_only() {
        let plan = single_tunnel_plan(7, &[70, 71]);
        let mut tracker = ActivePathTracker::new(&plan);

        assert!(tracker.set_congestion_forced(TunnelId(7), true));
        assert!(!tracker.set_congestion_forced(TunnelId(7), true));
        assert!(tracker.set_congestion_forced(TunnelId(7), false));
        assert!(!tracker.set_congestion_forced(TunnelId(7), false));
        assert!(!tracker.set_congestion_forced(TunnelId(9), true));
    }
}
