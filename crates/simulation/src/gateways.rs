//! In-memory gateways for simulation.
//!
//! [`SimProvisioning`] models the signaling layer: setup requests are queued
//! for the runner, which completes them after a simulated latency.
//! [`SimFecTable`] models the classifier's forwarding entries.

use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, trace};
use tunnelctl_core::{FecRebindGateway, PathProvisioningGateway};
use tunnelctl_types::{CandidatePath, FecBinding, FecId, Label, LspId, PathState, PathStatus, TunnelId};

/// First label handed out by the simulated signaling layer.
const FIRST_LABEL: u32 = 100;

/// Simulated signaling layer.
#[derive(Debug)]
pub struct SimProvisioning {
    states: HashMap<(TunnelId, LspId), PathState>,
    /// Requests not yet picked up by the runner.
    requested: Vec<(TunnelId, LspId)>,
    /// Requests picked up but not completed.
    in_flight: HashSet<(TunnelId, LspId)>,
    /// Paths whose setup is configured to fail.
    failing: BTreeSet<(TunnelId, LspId)>,
    next_label: u32,
    total_requests: u64,
}

impl Default for SimProvisioning {
    fn default() -> Self {
        Self {
            states: HashMap::new(),
            requested: Vec::new(),
            in_flight: HashSet::new(),
            failing: BTreeSet::new(),
            next_label: FIRST_LABEL,
            total_requests: 0,
        }
    }
}

impl SimProvisioning {
    /// Create a signaling layer with no paths established.
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        label
    }

    /// Bring a path up immediately with a fresh label.
    pub fn establish(&mut self, tunnel: TunnelId, lsp: LspId) -> Label {
        let label = self.allocate_label();
        self.states.insert((tunnel, lsp), PathState::ready(label));
        debug!(tunnel = %tunnel, lsp = %lsp, label = %label, "Path established");
        label
    }

    /// Tear a path down.
    pub fn tear_down(&mut self, tunnel: TunnelId, lsp: LspId) {
        self.states.remove(&(tunnel, lsp));
        debug!(tunnel = %tunnel, lsp = %lsp, "Path torn down");
    }

    /// Configure whether setups of a path fail.
    pub fn set_setup_failure(&mut self, tunnel: TunnelId, lsp: LspId, fails: bool) {
        if fails {
            self.failing.insert((tunnel, lsp));
        } else {
            self.failing.remove(&(tunnel, lsp));
        }
    }

    /// Hand queued setup requests to the runner.
    pub fn take_setup_requests(&mut self) -> Vec<(TunnelId, LspId)> {
        let requests = std::mem::take(&mut self.requested);
        self.in_flight.extend(requests.iter().copied());
        requests
    }

    /// Finish an in-flight setup. Returns the status to report.
    pub fn complete_setup(&mut self, tunnel: TunnelId, lsp: LspId) -> PathStatus {
        self.in_flight.remove(&(tunnel, lsp));
        if self.failing.contains(&(tunnel, lsp)) {
            self.states.remove(&(tunnel, lsp));
            debug!(tunnel = %tunnel, lsp = %lsp, "Path setup failed");
            return PathStatus::Failed;
        }
        self.establish(tunnel, lsp);
        PathStatus::Created
    }

    /// Check if a setup is queued or in flight.
    pub fn is_setting_up(&self, tunnel: TunnelId, lsp: LspId) -> bool {
        self.in_flight.contains(&(tunnel, lsp)) || self.requested.contains(&(tunnel, lsp))
    }

    /// Current state of a path.
    pub fn state(&self, tunnel: TunnelId, lsp: LspId) -> PathState {
        self.states
            .get(&(tunnel, lsp))
            .copied()
            .unwrap_or(PathState::ABSENT)
    }

    /// Setup requests accepted since creation.
    pub fn total_requests(&self) -> u64 {
        self.total_requests
    }
}

impl PathProvisioningGateway for SimProvisioning {
    fn ensure_path_setup(&mut self, tunnel: TunnelId, path: &CandidatePath) {
        let key = (tunnel, path.lsp());
        if self.state(tunnel, path.lsp()).established || self.is_setting_up(tunnel, path.lsp()) {
            trace!(tunnel = %tunnel, lsp = %path.lsp(), "Setup already satisfied");
            return;
        }
        self.requested.push(key);
        self.total_requests += 1;
    }

    fn query_path_state(&self, tunnel: TunnelId, path: &CandidatePath) -> PathState {
        self.state(tunnel, path.lsp())
    }
}

/// Simulated classifier table.
#[derive(Debug)]
pub struct SimFecTable {
    entries: Vec<FecBinding>,
    allow_automatic_binding: bool,
    next_id: u32,
}

impl Default for SimFecTable {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            allow_automatic_binding: true,
            next_id: 1,
        }
    }
}

impl SimFecTable {
    /// Create an empty table that still allows automatic binding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an unbound classification entry for a tunnel.
    pub fn add_fec(&mut self, tunnel: TunnelId) -> FecId {
        let fec = FecId(self.next_id);
        self.next_id += 1;
        self.entries.push(FecBinding {
            fec,
            tunnel,
            lsp: None,
            label: None,
        });
        fec
    }

    /// Signaling-driven binding of unbound entries to a new path.
    ///
    /// Ignored once the controller has taken binding control. Returns the
    /// number of entries bound.
    pub fn automatic_bind(&mut self, tunnel: TunnelId, lsp: LspId, label: Label) -> usize {
        if !self.allow_automatic_binding {
            return 0;
        }
        let mut bound = 0;
        for entry in self
            .entries
            .iter_mut()
            .filter(|e| e.tunnel == tunnel && e.lsp.is_none())
        {
            entry.lsp = Some(lsp);
            entry.label = Some(label);
            bound += 1;
        }
        bound
    }

    /// Entries belonging to a tunnel.
    pub fn bindings_for(&self, tunnel: TunnelId) -> impl Iterator<Item = &FecBinding> + '_ {
        self.entries.iter().filter(move |e| e.tunnel == tunnel)
    }

    /// Whether automatic binding is still allowed.
    pub fn allows_automatic_binding(&self) -> bool {
        self.allow_automatic_binding
    }
}

impl FecRebindGateway for SimFecTable {
    fn rebind_all_fecs_for_tunnel(
        &mut self,
        tunnel: TunnelId,
        path: &CandidatePath,
        label: Label,
    ) -> usize {
        let mut rebound = 0;
        for entry in self.entries.iter_mut().filter(|e| e.tunnel == tunnel) {
            entry.lsp = Some(path.lsp());
            entry.label = Some(label);
            rebound += 1;
        }
        rebound
    }

    fn fec_bindings(&self) -> Vec<FecBinding> {
        self.entries.clone()
    }

    fn set_allow_automatic_binding(&mut self, allow: bool) {
        self.allow_automatic_binding = allow;
    }
}
