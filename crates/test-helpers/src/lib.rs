//! Test helpers for the tunnel controller.
//!
//! Provides plan fixtures and scripted gateways whose state tests set
//! directly. Unlike the simulation gateways, nothing here progresses on its
//! own: a setup request is only recorded until the test marks the path ready.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use tunnelctl_core::{FecRebindGateway, PathProvisioningGateway};
use tunnelctl_plan::TunnelPlan;
use tunnelctl_types::{CandidatePath, FecBinding, FecId, Label, LspId, PathState, TunnelId};

/// Ingress address used by fixture paths.
pub const FIXTURE_SOURCE: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);

/// Egress address used by fixture paths.
pub const FIXTURE_DESTINATION: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 9);

/// A fixture candidate path.
pub fn candidate(tunnel: u32, lsp: u32) -> CandidatePath {
    CandidatePath::new(
        TunnelId(tunnel),
        LspId(lsp),
        FIXTURE_SOURCE,
        FIXTURE_DESTINATION,
    )
}

/// A plan with one tunnel whose candidates are `lsps`, primary first.
pub fn single_tunnel_plan(tunnel: u32, lsps: &[u32]) -> TunnelPlan {
    plan_with_lsps(vec![(tunnel, lsps.to_vec())])
}

/// A plan with several tunnels.
///
/// # Panics
///
/// Panics if the fixture is not a valid plan.
pub fn plan_with_lsps(tunnels: Vec<(u32, Vec<u32>)>) -> TunnelPlan {
    TunnelPlan::new(tunnels.into_iter().map(|(tunnel, lsps)| {
        let paths = lsps.into_iter().map(|lsp| candidate(tunnel, lsp)).collect();
        (TunnelId(tunnel), paths)
    }))
    .expect("fixture plan must be valid")
}

/// Label a fixture assigns to an LSP.
pub fn label_for(lsp: u32) -> Label {
    Label(1000 + lsp)
}

/// Provisioning gateway whose path states are set by the test.
#[derive(Debug, Default)]
pub struct ScriptedProvisioning {
    states: HashMap<(TunnelId, LspId), PathState>,
    setup_requests: Vec<(TunnelId, LspId)>,
}

impl ScriptedProvisioning {
    /// Create a gateway where every path is absent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a path's state.
    pub fn set_state(&mut self, tunnel: u32, lsp: u32, state: PathState) {
        self.states.insert((TunnelId(tunnel), LspId(lsp)), state);
    }

    /// Mark a path established and labeled with [`label_for`].
    pub fn set_ready(&mut self, tunnel: u32, lsp: u32) {
        self.set_state(tunnel, lsp, PathState::ready(label_for(lsp)));
    }

    /// Mark a path established without a label.
    pub fn set_awaiting_label(&mut self, tunnel: u32, lsp: u32) {
        self.set_state(tunnel, lsp, PathState::awaiting_label());
    }

    /// Remove a path's provisioning state.
    pub fn set_absent(&mut self, tunnel: u32, lsp: u32) {
        self.states.remove(&(TunnelId(tunnel), LspId(lsp)));
    }

    /// Builder form of [`set_ready`](Self::set_ready).
    pub fn with_ready(mut self, tunnel: u32, lsp: u32) -> Self {
        self.set_ready(tunnel, lsp);
        self
    }

    /// Every setup request received, in order.
    pub fn setup_requests(&self) -> &[(TunnelId, LspId)] {
        &self.setup_requests
    }

    /// Number of setup requests received for one path.
    pub fn setup_count(&self, tunnel: u32, lsp: u32) -> usize {
        let key = (TunnelId(tunnel), LspId(lsp));
        self.setup_requests.iter().filter(|r| **r == key).count()
    }
}

impl PathProvisioningGateway for ScriptedProvisioning {
    fn ensure_path_setup(&mut self, tunnel: TunnelId, path: &CandidatePath) {
        self.setup_requests.push((tunnel, path.lsp()));
    }

    fn query_path_state(&self, tunnel: TunnelId, path: &CandidatePath) -> PathState {
        self.states
            .get(&(tunnel, path.lsp()))
            .copied()
            .unwrap_or(PathState::ABSENT)
    }
}

/// Rebind gateway backed by a plain list of entries.
#[derive(Debug)]
pub struct ScriptedFecTable {
    entries: Vec<FecBinding>,
    allow_automatic_binding: bool,
    next_id: u32,
}

impl Default for ScriptedFecTable {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            allow_automatic_binding: true,
            next_id: 1,
        }
    }
}

impl ScriptedFecTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// A table with one unbound entry per tunnel.
    pub fn with_tunnels(tunnels: &[u32]) -> Self {
        let mut table = Self::new();
        for tunnel in tunnels {
            table.add_entry(*tunnel, None);
        }
        table
    }

    /// Add an entry, optionally already bound to an LSP.
    pub fn add_entry(&mut self, tunnel: u32, lsp: Option<u32>) -> FecId {
        let fec = FecId(self.next_id);
        self.next_id += 1;
        self.entries.push(FecBinding {
            fec,
            tunnel: TunnelId(tunnel),
            lsp: lsp.map(LspId),
            label: lsp.map(label_for),
        });
        fec
    }

    /// Entries belonging to a tunnel.
    pub fn entries_for(&self, tunnel: u32) -> Vec<FecBinding> {
        self.entries
            .iter()
            .filter(|e| e.tunnel == TunnelId(tunnel))
            .copied()
            .collect()
    }

    /// Whether automatic binding is still allowed.
    pub fn allows_automatic_binding(&self) -> bool {
        self.allow_automatic_binding
    }
}

impl FecRebindGateway for ScriptedFecTable {
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
