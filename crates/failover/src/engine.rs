//! Failover decision core.
//!
//! Reconciles path failures, path restorations, congestion levels and
//! operator requests into a single active path per tunnel.
//!
//! # Switching
//!
//! A switch is only committed once the target path is *ready*: the
//! provisioning gateway reports it established and labeled. Until then the
//! target is remembered as the tunnel's pending index and the switch is
//! completed by a later readiness notification. Setup is requested at most
//! once per distinct pending target.
//!
//! # Failover selection
//!
//! Relative to the pending target (or the active path if nothing is pending):
//!
//! 1. First ready candidate further down the list, else the first one not yet
//!    established (triggers setup)
//! 2. Otherwise back to the primary, unless it is marked unavailable; if the
//!    primary is already active the pending target is abandoned
//! 3. Otherwise any other ready candidate anywhere in the list
//! 4. Otherwise warn and stay put

use crate::{ActivePathTracker, ActiveState, FailoverConfig, RestorationScheduler};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tunnelctl_core::{Action, FecRebindGateway, PathProvisioningGateway, PathSwitch};
use tunnelctl_plan::{TunnelPlan, PRIMARY_INDEX};
use tunnelctl_types::{LspId, PathState, TunnelId};

/// Result of a single switch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The target is already active.
    AlreadyActive,
    /// Tunnel or position not in the plan.
    InvalidTarget,
    /// Setup was requested; the target is now pending.
    SetupRequested,
    /// Setup was already requested for this pending target.
    AwaitingSetup,
    /// The target is established but has no label yet.
    AwaitingLabel,
    /// The rebind gateway had nothing to rebind; state unchanged.
    NoFecEntries,
    /// The switch was committed.
    Committed {
        /// Entries rebound.
        rebound: usize,
    },
}

/// Counters for diagnostics.
///
/// Events that the engine drops silently (unknown tunnels or paths) are
/// counted here so upstream mistakes remain visible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailoverStats {
    /// Setup requests issued to the provisioning gateway.
    pub setup_requests: u64,
    /// Switches committed.
    pub switches_committed: u64,
    /// Switches abandoned because no forwarding entry could be rebound.
    pub rebind_failures: u64,
    /// Failover requests that found no alternate path.
    pub no_alternate_path: u64,
    /// Events referencing a tunnel or LSP absent from the plan.
    pub unknown_references: u64,
}

/// The failover engine.
///
/// Owns the per-tunnel [`ActiveState`], the [`RestorationScheduler`] and both
/// gateways. Single-threaded: every operation runs to completion, including
/// its gateway calls, before returning.
pub struct FailoverEngine<P, F> {
    /// Immutable candidate path table.
    plan: Arc<TunnelPlan>,

    /// Engine tunables.
    config: FailoverConfig,

    /// Per-tunnel active/pending state.
    tracker: ActivePathTracker,

    /// Delayed restoration records and timer state.
    scheduler: RestorationScheduler,

    /// Path setup and state queries.
    provisioning: P,

    /// Forwarding rebinds.
    fec: F,

    /// Diagnostic counters.
    stats: FailoverStats,

    /// Current logical time.
    now: Duration,
}

impl<P, F> FailoverEngine<P, F>
where
    P: PathProvisioningGateway,
    F: FecRebindGateway,
{
    /// Create a new engine with every tunnel on its primary.
    pub fn new(plan: Arc<TunnelPlan>, config: FailoverConfig, provisioning: P, fec: F) -> Self {
        let tracker = ActivePathTracker::new(&plan);
        let scheduler = RestorationScheduler::new(config.restoration_delay);
        Self {
            plan,
            config,
            tracker,
            scheduler,
            provisioning,
            fec,
            stats: FailoverStats::default(),
            now: Duration::ZERO,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Accessors
    // ═══════════════════════════════════════════════════════════════════════════

    /// Set the current time.
    pub fn set_time(&mut self, now: Duration) {
        self.now = now;
    }

    /// Get the current time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// The tunnel plan.
    pub fn plan(&self) -> &Arc<TunnelPlan> {
        &self.plan
    }

    /// Engine configuration.
    pub fn config(&self) -> &FailoverConfig {
        &self.config
    }

    /// Selection state of a tunnel.
    pub fn state(&self, tunnel: TunnelId) -> Option<&ActiveState> {
        self.tracker.state(tunnel)
    }

    /// All per-tunnel state.
    pub fn tracker(&self) -> &ActivePathTracker {
        &self.tracker
    }

    /// Delayed restoration bookkeeping.
    pub fn scheduler(&self) -> &RestorationScheduler {
        &self.scheduler
    }

    /// Diagnostic counters.
    pub fn stats(&self) -> FailoverStats {
        self.stats
    }

    /// The provisioning gateway.
    pub fn provisioning(&self) -> &P {
        &self.provisioning
    }

    /// The provisioning gateway, mutably (runners deliver setup completions).
    pub fn provisioning_mut(&mut self) -> &mut P {
        &mut self.provisioning
    }

    /// The rebind gateway.
    pub fn fec(&self) -> &F {
        &self.fec
    }

    /// The rebind gateway, mutably.
    pub fn fec_mut(&mut self) -> &mut F {
        &mut self.fec
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Startup
    // ═══════════════════════════════════════════════════════════════════════════

    /// Adopt forwarding bindings that already exist.
    ///
    /// Every tunnel starts on its primary; a classification entry already
    /// bound to a known LSP moves the tunnel's active index to that LSP.
    pub fn sync_active_indices(&mut self) {
        for binding in self.fec.fec_bindings() {
            let Some(lsp) = binding.lsp else {
                continue;
            };
            match self.plan.index_of(binding.tunnel, lsp) {
                Some(index) => {
                    debug!(
                        tunnel = %binding.tunnel,
                        lsp = %lsp,
                        index,
                        fec = %binding.fec,
                        "Adopted existing forwarding binding"
                    );
                    self.tracker.set_active(binding.tunnel, index);
                }
                None => {
                    debug!(
                        tunnel = %binding.tunnel,
                        lsp = %lsp,
                        "Forwarding binding references unplanned path"
                    );
                }
            }
        }
    }

    /// Request setup of every path flagged permanent.
    pub fn establish_permanent_paths(&mut self) {
        let plan = Arc::clone(&self.plan);
        for path in plan.permanent_paths() {
            if self.provisioning.query_path_state(path.tunnel(), path).established {
                continue;
            }
            info!(tunnel = %path.tunnel(), lsp = %path.lsp(), "Pre-establishing permanent path");
            self.provisioning.ensure_path_setup(path.tunnel(), path);
            self.stats.setup_requests += 1;
        }
    }

    /// Stop automatic binding by the signaling layer.
    pub fn take_binding_control(&mut self) {
        self.fec.set_allow_automatic_binding(false);
    }

    /// Cancel outstanding timers.
    pub fn shutdown(&mut self) -> Vec<Action> {
        self.scheduler.cancel().into_iter().collect()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Operations
    // ═══════════════════════════════════════════════════════════════════════════

    /// Switch a tunnel to the candidate at `target`.
    ///
    /// No-op if the target is already active. The switch commits only if the
    /// target is ready; otherwise it becomes the pending target.
    pub fn switch_to_index(&mut self, tunnel: TunnelId, target: usize, reason: &str) -> Vec<Action> {
        let mut actions = vec![];
        self.try_switch(tunnel, target, reason, &mut actions);
        actions
    }

    /// Move a tunnel off its current path.
    pub fn request_failover(
        &mut self,
        tunnel: TunnelId,
        reason: &str,
        due_to_congestion: bool,
    ) -> Vec<Action> {
        let mut actions = vec![];
        self.failover(tunnel, reason, due_to_congestion, None, &mut actions);
        actions
    }

    /// Move a tunnel back to its primary if allowed and the primary is ready.
    pub fn request_restore(
        &mut self,
        tunnel: TunnelId,
        reason: &str,
        due_to_congestion: bool,
    ) -> Vec<Action> {
        let mut actions = vec![];
        self.restore(tunnel, reason, due_to_congestion, &mut actions);
        actions
    }

    /// A path went down (failed, unfeasible or preempted).
    pub fn handle_path_failure(&mut self, tunnel: TunnelId, lsp: LspId, reason: &str) -> Vec<Action> {
        let mut actions = vec![];
        let Some(index) = self.resolve(tunnel, lsp) else {
            return actions;
        };

        if self.scheduler.forget(tunnel, lsp) {
            debug!(tunnel = %tunnel, lsp = %lsp, "Pending restoration superseded by failure");
        }

        let Some(state) = self.tracker.state_mut(tunnel) else {
            return actions;
        };
        if index == PRIMARY_INDEX && !state.primary_unavailable {
            state.primary_unavailable = true;
            info!(tunnel = %tunnel, lsp = %lsp, "Primary path unavailable");
        }

        let effective = state.effective_index();
        if index != effective {
            info!(
                tunnel = %tunnel,
                lsp = %lsp,
                index,
                effective,
                reason,
                "Failure on non-active path"
            );
            return actions;
        }

        if state.pending_index == Some(index) {
            state.pending_index = None;
        }

        warn!(tunnel = %tunnel, lsp = %lsp, index, reason, "Active path failed");
        self.failover(tunnel, reason, false, Some(index), &mut actions);
        actions
    }

    /// A path reported as created.
    ///
    /// With a restoration delay, the primary or the pending target is only
    /// recorded here and confirmed by [`Self::check_pending_restorations`].
    /// Confirmation completes a pending switch to this path, or clears the
    /// primary's unavailable flag and, with auto-restore, moves traffic back.
    pub fn handle_path_restored(&mut self, tunnel: TunnelId, lsp: LspId, reason: &str) -> Vec<Action> {
        let mut actions = vec![];
        let Some(index) = self.resolve(tunnel, lsp) else {
            return actions;
        };

        if !self.is_ready(tunnel, index) {
            debug!(tunnel = %tunnel, lsp = %lsp, "Path reported but not yet ready");
            return actions;
        }

        let is_pending = self
            .tracker
            .state(tunnel)
            .is_some_and(|s| s.pending_index == Some(index));

        if self.scheduler.is_enabled() {
            // Only the primary and the pending target have anything to
            // confirm once the delay elapses.
            if is_pending || index == PRIMARY_INDEX {
                actions.extend(self.scheduler.observe(tunnel, lsp, self.now));
            } else {
                debug!(tunnel = %tunnel, lsp = %lsp, "Backup path ready");
            }
            return actions;
        }

        self.confirm_restored(tunnel, index, reason, &mut actions);
        actions
    }

    /// A link-health monitor changed level for a tunnel.
    ///
    /// Level-triggered: only a change of the congestion-forced flag acts.
    pub fn handle_congestion_notification(
        &mut self,
        tunnel: TunnelId,
        congested: bool,
        source: &str,
    ) -> Vec<Action> {
        let mut actions = vec![];
        if !self.plan.contains(tunnel) {
            self.note_unknown(tunnel, None);
            return actions;
        }

        if !self.tracker.set_congestion_forced(tunnel, congested) {
            debug!(tunnel = %tunnel, congested, source, "Congestion level unchanged");
            return actions;
        }

        if congested {
            info!(tunnel = %tunnel, source, "Congestion detected");
            self.failover(tunnel, source, true, None, &mut actions);
        } else {
            info!(tunnel = %tunnel, source, "Congestion cleared");
            self.restore(tunnel, source, true, &mut actions);
        }
        actions
    }

    /// Restoration timer callback.
    ///
    /// Confirms every restoration whose delay has elapsed and whose path is
    /// still ready; silently drops the ones that regressed.
    pub fn check_pending_restorations(&mut self) -> Vec<Action> {
        let mut actions = vec![];
        self.scheduler.on_timer_fired();

        for (tunnel, lsp) in self.scheduler.take_due(self.now) {
            let Some(index) = self.plan.index_of(tunnel, lsp) else {
                continue;
            };
            if !self.is_ready(tunnel, index) {
                debug!(tunnel = %tunnel, lsp = %lsp, "Readiness regressed during restoration delay");
                continue;
            }
            self.confirm_restored(tunnel, index, "restoration delay elapsed", &mut actions);
        }

        actions.extend(self.scheduler.rearm(self.now));
        actions
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Internals
    // ═══════════════════════════════════════════════════════════════════════════

    fn resolve(&mut self, tunnel: TunnelId, lsp: LspId) -> Option<usize> {
        let index = self.plan.index_of(tunnel, lsp);
        if index.is_none() {
            self.note_unknown(tunnel, Some(lsp));
        }
        index
    }

    fn note_unknown(&mut self, tunnel: TunnelId, lsp: Option<LspId>) {
        self.stats.unknown_references += 1;
        debug!(tunnel = %tunnel, lsp = ?lsp, "Ignoring event for unplanned tunnel or path");
    }

    fn path_state(&self, tunnel: TunnelId, index: usize) -> PathState {
        match self.plan.path(tunnel, index) {
            Some(path) => self.provisioning.query_path_state(tunnel, path),
            None => PathState::ABSENT,
        }
    }

    fn is_ready(&self, tunnel: TunnelId, index: usize) -> bool {
        self.path_state(tunnel, index).is_ready()
    }

    pub(crate) fn try_switch(
        &mut self,
        tunnel: TunnelId,
        target: usize,
        reason: &str,
        actions: &mut Vec<Action>,
    ) -> SwitchOutcome {
        let plan = Arc::clone(&self.plan);
        let (Some(path), Some(state)) = (plan.path(tunnel, target), self.tracker.state(tunnel))
        else {
            warn!(tunnel = %tunnel, target, "Switch target not in plan");
            return SwitchOutcome::InvalidTarget;
        };

        if state.active_index == target {
            return SwitchOutcome::AlreadyActive;
        }
        let already_pending = state.pending_index == Some(target);

        let path_state = self.provisioning.query_path_state(tunnel, path);
        if !path_state.established {
            if already_pending {
                debug!(tunnel = %tunnel, lsp = %path.lsp(), "Setup already requested");
                return SwitchOutcome::AwaitingSetup;
            }
            info!(
                tunnel = %tunnel,
                lsp = %path.lsp(),
                index = target,
                reason,
                "Triggering path setup"
            );
            self.provisioning.ensure_path_setup(tunnel, path);
            self.stats.setup_requests += 1;
            self.tracker.set_pending(tunnel, target);
            return SwitchOutcome::SetupRequested;
        }

        let Some(label) = path_state.label else {
            debug!(tunnel = %tunnel, lsp = %path.lsp(), "Path established, waiting for label");
            self.tracker.set_pending(tunnel, target);
            return SwitchOutcome::AwaitingLabel;
        };

        let rebound = self.fec.rebind_all_fecs_for_tunnel(tunnel, path, label);
        if rebound == 0 {
            warn!(
                tunnel = %tunnel,
                lsp = %path.lsp(),
                "No FEC entries found while attempting to switch paths"
            );
            self.stats.rebind_failures += 1;
            return SwitchOutcome::NoFecEntries;
        }

        let from_index = self.tracker.commit(tunnel, target).unwrap_or(target);
        self.stats.switches_committed += 1;
        info!(
            tunnel = %tunnel,
            lsp = %path.lsp(),
            from = from_index,
            to = target,
            rebound,
            reason,
            "Switched tunnel"
        );
        actions.push(Action::EmitPathSwitched(PathSwitch {
            tunnel,
            from_index,
            to_index: target,
            lsp: path.lsp(),
            label,
            rebound,
            reason: reason.to_string(),
        }));
        SwitchOutcome::Committed { rebound }
    }

    /// Failover selection. `exclude` keeps a just-failed path from being
    /// picked again by the same failure.
    fn failover(
        &mut self,
        tunnel: TunnelId,
        reason: &str,
        due_to_congestion: bool,
        exclude: Option<usize>,
        actions: &mut Vec<Action>,
    ) {
        let Some(state) = self.tracker.state(tunnel).copied() else {
            self.note_unknown(tunnel, None);
            return;
        };
        let count = self.plan.candidate_count(tunnel);
        let reference = state.effective_index();
        let eligible = |index: &usize| Some(*index) != exclude;

        // Forward: first ready, else first not yet established, else first.
        let forward: Vec<(usize, PathState)> = (reference + 1..count)
            .filter(eligible)
            .map(|index| (index, self.path_state(tunnel, index)))
            .collect();
        let forward_target = forward
            .iter()
            .find(|(_, s)| s.is_ready())
            .or_else(|| forward.iter().find(|(_, s)| !s.established))
            .or_else(|| forward.first())
            .map(|(index, _)| *index);

        if let Some(target) = forward_target {
            debug!(tunnel = %tunnel, reference, target, due_to_congestion, "Failing over forward");
            self.try_switch(tunnel, target, reason, actions);
            return;
        }

        if reference != PRIMARY_INDEX && !state.primary_unavailable && eligible(&PRIMARY_INDEX) {
            if state.is_on_primary() {
                // Already carrying traffic: the pending backup is abandoned.
                let abandoned = self.tracker.clear_pending(tunnel);
                info!(tunnel = %tunnel, abandoned = ?abandoned, reason, "Staying on primary");
                return;
            }
            debug!(tunnel = %tunnel, reference, due_to_congestion, "Failing back to primary");
            self.try_switch(tunnel, PRIMARY_INDEX, reason, actions);
            return;
        }

        // Last resort: any other ready path anywhere in the list.
        let fallback = (0..count).find(|&index| {
            index != reference
                && index != state.active_index
                && eligible(&index)
                && !(index == PRIMARY_INDEX && state.primary_unavailable)
                && self.is_ready(tunnel, index)
        });
        if let Some(target) = fallback {
            debug!(tunnel = %tunnel, reference, target, "Failing over to ready fallback");
            self.try_switch(tunnel, target, reason, actions);
            return;
        }

        self.stats.no_alternate_path += 1;
        warn!(
            tunnel = %tunnel,
            active = state.active_index,
            reason,
            "No alternate path available"
        );
    }

    fn restore(
        &mut self,
        tunnel: TunnelId,
        reason: &str,
        due_to_congestion: bool,
        actions: &mut Vec<Action>,
    ) {
        let Some(state) = self.tracker.state(tunnel).copied() else {
            self.note_unknown(tunnel, None);
            return;
        };

        if state.is_on_primary() {
            return;
        }
        if !due_to_congestion && state.congestion_forced {
            debug!(tunnel = %tunnel, reason, "Restore suppressed while congestion-forced");
            return;
        }
        if state.primary_unavailable {
            debug!(tunnel = %tunnel, reason, "Restore skipped, primary unavailable");
            return;
        }
        if !self.is_ready(tunnel, PRIMARY_INDEX) {
            debug!(tunnel = %tunnel, reason, "Restore deferred, primary not ready");
            return;
        }

        self.try_switch(tunnel, PRIMARY_INDEX, reason, actions);
    }

    /// Act on a path that is ready and confirmed.
    fn confirm_restored(
        &mut self,
        tunnel: TunnelId,
        index: usize,
        reason: &str,
        actions: &mut Vec<Action>,
    ) {
        let Some(state) = self.tracker.state_mut(tunnel) else {
            return;
        };
        if index == PRIMARY_INDEX && state.primary_unavailable {
            state.primary_unavailable = false;
            info!(tunnel = %tunnel, reason, "Primary path restored");
        }
        let is_pending = state.pending_index == Some(index);

        if is_pending {
            self.try_switch(tunnel, index, reason, actions);
        } else if index == PRIMARY_INDEX && self.config.auto_restore_primary {
            self.restore(tunnel, reason, false, actions);
        }
    }
}
