//! Core traits for state machines.

use crate::{Action, Event};
use std::time::Duration;
use tunnelctl_types::{CandidatePath, FecBinding, Label, PathState, TunnelId};

/// A state machine that processes events.
///
/// The tunnel controller is implemented as a state machine that is:
///
/// - **Synchronous**: No async, no `.await`
/// - **Deterministic**: Same state + event + gateway answers = same actions
/// - **Run-to-completion**: Every gateway call and state commit derived from
///   one event finishes before the next event is handled
///
/// # Example
///
/// ```ignore
/// impl StateMachine for TunnelController<P, F> {
///     fn handle(&mut self, event: Event) -> Vec<Action> {
///         match event {
///             Event::PathStatus { tunnel, lsp, status } => {
///                 self.on_path_status(tunnel, lsp, status)
///             }
///             Event::RestorationTimer => self.engine.check_pending_restorations(),
///             // ... etc
///         }
///     }
///
///     fn set_time(&mut self, now: Duration) {
///         self.engine.set_time(now);
///     }
/// }
/// ```
pub trait StateMachine {
    /// Process an event, returning actions to perform.
    ///
    /// # Guarantees
    ///
    /// - **Synchronous**: This method never blocks or awaits
    /// - **Infallible**: Anomalies are logged, never returned
    /// - **Deferred effects only via actions**: Timers are armed and cancelled
    ///   by the runner executing the returned actions
    fn handle(&mut self, event: Event) -> Vec<Action>;

    /// Set the current time.
    ///
    /// Called by the runner before each `handle()` call to provide the
    /// current simulation or monotonic time.
    fn set_time(&mut self, now: Duration);

    /// Get the current time.
    ///
    /// Returns the time that was last set via `set_time()`.
    fn now(&self) -> Duration;
}

/// Provisioning gateway: sets up candidate paths and reports their state.
///
/// Owned by the signaling layer. The controller only queries and commands
/// it, never inspects its session bookkeeping directly.
pub trait PathProvisioningGateway {
    /// Ensure the path is set up. Idempotent trigger; completion is reported
    /// later through a `PathStatus` event.
    fn ensure_path_setup(&mut self, tunnel: TunnelId, path: &CandidatePath);

    /// Current provisioning state of the path.
    fn query_path_state(&self, tunnel: TunnelId, path: &CandidatePath) -> PathState;
}

/// Forwarding rebind gateway: binds traffic classification to a path.
pub trait FecRebindGateway {
    /// Rebind every classification entry of the tunnel to the path and label.
    ///
    /// Returns the number of entries rebound; zero means nothing to rebind.
    fn rebind_all_fecs_for_tunnel(
        &mut self,
        tunnel: TunnelId,
        path: &CandidatePath,
        label: Label,
    ) -> usize;

    /// Current classification entries and their bindings.
    fn fec_bindings(&self) -> Vec<FecBinding>;

    /// Enable or disable binding initiated by the signaling layer itself.
    ///
    /// Once the controller owns path selection it disables automatic binding
    /// so that path setup never silently moves traffic.
    fn set_allow_automatic_binding(&mut self, allow: bool);
}
