//! Event ingress for the tunnel controller.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};
use tunnelctl_core::{
    Action, Event, FecRebindGateway, OperatorCommand, PathProvisioningGateway, RerouteAction,
    StateMachine,
};
use tunnelctl_failover::{FailoverConfig, FailoverEngine};
use tunnelctl_plan::TunnelPlan;
use tunnelctl_types::{LspId, PathStatus, TunnelId};

/// Reason attached to switches triggered by signaling notifications.
pub const PATH_NOTIFY_REASON: &str = "PATH_NOTIFY";

/// Reason attached to switches triggered by operator commands.
pub const OPERATOR_REASON: &str = "operator command";

/// The tunnel controller.
///
/// Routes every [`Event`] to the matching [`FailoverEngine`] operation.
/// Call [`start`](Self::start) once before feeding events.
pub struct TunnelController<P, F> {
    engine: FailoverEngine<P, F>,
    started: bool,
    stopped: bool,
}

impl<P, F> TunnelController<P, F>
where
    P: PathProvisioningGateway,
    F: FecRebindGateway,
{
    /// Create a controller over a validated plan.
    pub fn new(plan: Arc<TunnelPlan>, config: FailoverConfig, provisioning: P, fec: F) -> Self {
        Self {
            engine: FailoverEngine::new(plan, config, provisioning, fec),
            started: false,
            stopped: false,
        }
    }

    /// Take over forwarding control.
    ///
    /// Adopts existing forwarding bindings, pre-establishes permanent paths,
    /// then disables automatic binding so only the controller rebinds.
    /// Idempotent.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.engine.sync_active_indices();
        self.engine.establish_permanent_paths();
        self.engine.take_binding_control();
        self.started = true;
        info!(tunnels = self.engine.plan().len(), "Tunnel controller started");
    }

    /// Check if `start` has run.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Check if a `Shutdown` event has been handled.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// The failover engine.
    pub fn engine(&self) -> &FailoverEngine<P, F> {
        &self.engine
    }

    /// The failover engine, mutably.
    pub fn engine_mut(&mut self) -> &mut FailoverEngine<P, F> {
        &mut self.engine
    }

    fn on_path_status(&mut self, tunnel: TunnelId, lsp: LspId, status: PathStatus) -> Vec<Action> {
        match status {
            PathStatus::Failed | PathStatus::Unfeasible | PathStatus::Preempted => {
                debug!(tunnel = %tunnel, lsp = %lsp, status = %status, "Path down");
                self.engine
                    .handle_path_failure(tunnel, lsp, PATH_NOTIFY_REASON)
            }
            PathStatus::Created => self
                .engine
                .handle_path_restored(tunnel, lsp, PATH_NOTIFY_REASON),
        }
    }

    fn on_operator_command(&mut self, command: OperatorCommand) -> Vec<Action> {
        info!(command = %command, "Operator command");
        match command {
            OperatorCommand::Reroute {
                tunnel,
                action: RerouteAction::Failover,
            } => self.engine.request_failover(tunnel, OPERATOR_REASON, false),
            OperatorCommand::Reroute {
                tunnel,
                action: RerouteAction::Restore,
            } => self.engine.request_restore(tunnel, OPERATOR_REASON, false),
        }
    }
}

impl<P, F> StateMachine for TunnelController<P, F>
where
    P: PathProvisioningGateway,
    F: FecRebindGateway,
{
    #[instrument(
        skip(self, event),
        fields(event_type = event.type_name(), tunnel = ?event.tunnel())
    )]
    fn handle(&mut self, event: Event) -> Vec<Action> {
        if self.stopped {
            debug!("Controller stopped, dropping event");
            return vec![];
        }

        match event {
            Event::CongestionNotification {
                tunnel,
                congested,
                source,
            } => self
                .engine
                .handle_congestion_notification(tunnel, congested, &source),

            Event::PathStatus {
                tunnel,
                lsp,
                status,
            } => self.on_path_status(tunnel, lsp, status),

            Event::OperatorCommand(command) => self.on_operator_command(command),

            Event::RestorationTimer => self.engine.check_pending_restorations(),

            Event::Shutdown => {
                self.stopped = true;
                info!("Tunnel controller shutting down");
                self.engine.shutdown()
            }
        }
    }

    fn set_time(&mut self, now: Duration) {
        self.engine.set_time(now);
    }

    fn now(&self) -> Duration {
        self.engine.now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;
    use tunnelctl_core::TimerId;
    use tunnelctl_test_helpers::{
        candidate, single_tunnel_plan, ScriptedFecTable, ScriptedProvisioning,
    };

    const T: TunnelId = TunnelId(7);

    type TestController = TunnelController<ScriptedProvisioning, ScriptedFecTable>;

    fn controller(config: FailoverConfig) -> TestController {
        let plan = Arc::new(single_tunnel_plan(7, &[70, 71, 72]));
        let provisioning = ScriptedProvisioning::new().with_ready(7, 70);
        let mut controller = TunnelController::new(
            plan,
            config,
            provisioning,
            ScriptedFecTable::with_tunnels(&[7]),
        );
        controller.start();
        controller
    }

    fn status(lsp: u32, status: PathStatus) -> Event {
        Event::PathStatus {
            tunnel: T,
            lsp: LspId(lsp),
            status,
        }
    }

    fn active_index(controller: &TestController) -> usize {
        controller.engine().state(T).unwrap().active_index
    }

    #[traced_test]
    #[test]
    fn test_start_takes_binding_control() {
        let c = controller(FailoverConfig::default());
        assert!(c.is_started());
        assert!(!c.engine().fec().allows_automatic_binding());
        assert!(logs_contain("Tunnel controller started"));
    }

    #[traced_test]
    #[test]
    fn test_start_is_idempotent() {
        let plan = Arc::new(
            TunnelPlan::new([(T, vec![candidate(7, 70), candidate(7, 71).permanent()])]).unwrap(),
        );
        let mut c = TunnelController::new(
            plan,
            FailoverConfig::default(),
            ScriptedProvisioning::new(),
            ScriptedFecTable::new(),
        );
        c.start();
        c.start();
        assert_eq!(c.engine().provisioning().setup_count(7, 71), 1);
    }

    #[traced_test]
    #[test]
    fn test_failure_statuses_share_one_handler() {
        for failure in [
            PathStatus::Failed,
            PathStatus::Unfeasible,
            PathStatus::Preempted,
        ] {
            let mut c = controller(FailoverConfig::default());
            c.engine_mut().provisioning_mut().set_ready(7, 71);
            c.engine_mut().provisioning_mut().set_absent(7, 70);

            let actions = c.handle(status(70, failure));

            assert_eq!(actions.len(), 1, "{failure} should fail over");
            assert_eq!(active_index(&c), 1);
            assert!(c.engine().state(T).unwrap().primary_unavailable);
        }
    }

    #[traced_test]
    #[test]
    fn test_created_completes_pending_switch() {
        let mut c = controller(FailoverConfig::default());
        c.engine_mut().provisioning_mut().set_absent(7, 70);
        c.handle(status(70, PathStatus::Failed));
        assert_eq!(c.engine().state(T).unwrap().pending_index, Some(1));

        c.engine_mut().provisioning_mut().set_ready(7, 71);
        let actions = c.handle(status(71, PathStatus::Created));

        match actions.as_slice() {
            [Action::EmitPathSwitched(switch)] => {
                assert_eq!(switch.to_index, 1);
                assert_eq!(switch.reason, PATH_NOTIFY_REASON);
            }
            other => panic!("unexpected actions: {other:?}"),
        }
    }

    #[traced_test]
    #[test]
    fn test_operator_reroute_commands() {
        let mut c = controller(FailoverConfig::default());
        c.engine_mut().provisioning_mut().set_ready(7, 71);

        let failover = OperatorCommand::parse("reroute tunnelId=7").unwrap();
        let actions = c.handle(Event::OperatorCommand(failover));
        assert_eq!(active_index(&c), 1);
        match actions.as_slice() {
            [Action::EmitPathSwitched(switch)] => assert_eq!(switch.reason, OPERATOR_REASON),
            other => panic!("unexpected actions: {other:?}"),
        }

        let restore = OperatorCommand::parse("reroute tunnelId=7 action=restore").unwrap();
        c.handle(Event::OperatorCommand(restore));
        assert_eq!(active_index(&c), 0);
    }

    #[traced_test]
    #[test]
    fn test_operator_restore_respects_congestion() {
        let mut c = controller(FailoverConfig::default());
        c.engine_mut().provisioning_mut().set_ready(7, 71);

        c.handle(Event::CongestionNotification {
            tunnel: T,
            congested: true,
            source: "queue0".to_string(),
        });
        assert_eq!(active_index(&c), 1);

        let restore = OperatorCommand::parse("reroute tunnelId=7 restore=true").unwrap();
        c.handle(Event::OperatorCommand(restore));
        assert_eq!(active_index(&c), 1);
    }

    #[traced_test]
    #[test]
    fn test_timer_and_shutdown() {
        let mut c = controller(FailoverConfig::default().with_restoration_delay(Duration::from_secs(5)));
        c.engine_mut().provisioning_mut().set_ready(7, 71);
        c.engine_mut().provisioning_mut().set_absent(7, 70);
        c.handle(status(70, PathStatus::Failed));

        c.set_time(Duration::from_secs(10));
        c.engine_mut().provisioning_mut().set_ready(7, 70);
        let actions = c.handle(status(70, PathStatus::Created));
        assert_eq!(
            actions,
            vec![Action::SetTimer {
                id: TimerId::RestorationCheck,
                duration: Duration::from_secs(5),
            }]
        );

        c.set_time(Duration::from_secs(15));
        assert_eq!(c.now(), Duration::from_secs(15));
        c.handle(Event::RestorationTimer);
        assert_eq!(active_index(&c), 0);

        assert!(c.handle(Event::Shutdown).is_empty());
        assert!(c.is_stopped());
        assert!(c.handle(status(70, PathStatus::Failed)).is_empty());
        assert_eq!(active_index(&c), 0);
    }
}
