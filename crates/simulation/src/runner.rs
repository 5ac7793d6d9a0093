//! Simulation runner.

use crate::event_queue::{EventKey, SimEvent};
use crate::gateways::{SimFecTable, SimProvisioning};
use crate::scenario::{Scenario, ScenarioStep, SimulationSettings};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};
use tunnelctl_core::{Action, Event, OperatorCommand, PathSwitch, StateMachine, TimerId};
use tunnelctl_failover::{ActiveState, FailoverConfig};
use tunnelctl_monitors::HysteresisMonitor;
use tunnelctl_node::TunnelController;
use tunnelctl_plan::{TunnelPlan, PRIMARY_INDEX};
use tunnelctl_types::{ConfigError, LspId, PathStatus, TunnelId};

/// Default seed when none is configured.
const DEFAULT_SEED: u64 = 12345;

/// Runner configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Base time a path setup takes.
    pub setup_latency: Duration,
    /// Upper bound of the random extra setup time.
    pub setup_jitter: Duration,
    /// Seed for the jitter generator.
    pub seed: u64,
    /// Classification entries created per tunnel.
    pub fec_entries_per_tunnel: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            setup_latency: Duration::from_millis(50),
            setup_jitter: Duration::ZERO,
            seed: DEFAULT_SEED,
            fec_entries_per_tunnel: 1,
        }
    }
}

impl SimulationConfig {
    /// Set the base setup latency.
    pub fn with_setup_latency(mut self, latency: Duration) -> Self {
        self.setup_latency = latency;
        self
    }

    /// Set the setup jitter bound.
    pub fn with_setup_jitter(mut self, jitter: Duration) -> Self {
        self.setup_jitter = jitter;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the number of classification entries per tunnel.
    pub fn with_fec_entries_per_tunnel(mut self, entries: usize) -> Self {
        self.fec_entries_per_tunnel = entries;
        self
    }
}

impl From<&SimulationSettings> for SimulationConfig {
    fn from(settings: &SimulationSettings) -> Self {
        Self {
            setup_latency: Duration::from_millis(settings.setup_latency_ms),
            setup_jitter: Duration::from_millis(settings.setup_jitter_ms),
            seed: settings.seed.unwrap_or(DEFAULT_SEED),
            fec_entries_per_tunnel: settings.fec_entries_per_tunnel,
        }
    }
}

/// Statistics collected during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationStats {
    /// Events delivered to the controller.
    pub events_processed: u64,
    /// Switches the controller committed.
    pub switches_committed: u64,
    /// Path setups the simulated signaling layer started.
    pub setup_requests: u64,
    /// Restoration timer firings.
    pub timers_fired: u64,
    /// Monitor level transitions.
    pub monitor_transitions: u64,
}

/// A committed switch with the time it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchRecord {
    /// Simulated time of the commit.
    pub at: Duration,
    /// The switch.
    pub switch: PathSwitch,
}

/// Deterministic runner for one controller.
pub struct SimulationRunner {
    controller: TunnelController<SimProvisioning, SimFecTable>,
    plan: Arc<TunnelPlan>,
    queue: BTreeMap<EventKey, SimEvent>,
    /// Scheduled timers, for cancel-and-reschedule.
    timers: HashMap<TimerId, EventKey>,
    monitors: HashMap<String, HysteresisMonitor>,
    sequence: u64,
    now: Duration,
    rng: ChaCha8Rng,
    config: SimulationConfig,
    stats: SimulationStats,
    switches: Vec<SwitchRecord>,
}

impl SimulationRunner {
    /// Build the simulated world and start the controller.
    ///
    /// Every tunnel gets its classification entries and an established
    /// primary, bound automatically before the controller takes over.
    pub fn new(plan: Arc<TunnelPlan>, failover: FailoverConfig, config: SimulationConfig) -> Self {
        let mut provisioning = SimProvisioning::new();
        let mut fec = SimFecTable::new();

        for tunnel in plan.tunnel_ids() {
            for _ in 0..config.fec_entries_per_tunnel {
                fec.add_fec(tunnel);
            }
            if let Some(primary) = plan.path(tunnel, PRIMARY_INDEX) {
                let label = provisioning.establish(tunnel, primary.lsp());
                fec.automatic_bind(tunnel, primary.lsp(), label);
            }
        }

        let mut controller =
            TunnelController::new(Arc::clone(&plan), failover, provisioning, fec);
        controller.start();

        let mut runner = Self {
            controller,
            plan,
            queue: BTreeMap::new(),
            timers: HashMap::new(),
            monitors: HashMap::new(),
            sequence: 0,
            now: Duration::ZERO,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            stats: SimulationStats::default(),
            switches: Vec::new(),
        };
        // Permanent paths requested during start.
        runner.drain_setup_requests();
        runner
    }

    /// Schedule every step of a scenario and install its monitors.
    pub fn load_scenario(&mut self, scenario: &Scenario) -> Result<(), ConfigError> {
        scenario.validate()?;

        for config in &scenario.monitors {
            let monitor = HysteresisMonitor::new(config.clone())?;
            self.monitors.insert(config.name.clone(), monitor);
        }

        for scheduled in &scenario.steps {
            let event = match &scheduled.step {
                ScenarioStep::PathDown {
                    tunnel,
                    lsp,
                    status,
                } => SimEvent::PathDown {
                    tunnel: *tunnel,
                    lsp: *lsp,
                    status: *status,
                },
                ScenarioStep::PathUp { tunnel, lsp } => SimEvent::PathUp {
                    tunnel: *tunnel,
                    lsp: *lsp,
                },
                ScenarioStep::SetupFailure { tunnel, lsp, fails } => SimEvent::SetupFailure {
                    tunnel: *tunnel,
                    lsp: *lsp,
                    fails: *fails,
                },
                ScenarioStep::Congestion {
                    tunnel,
                    congested,
                    source,
                } => SimEvent::Controller(Event::CongestionNotification {
                    tunnel: *tunnel,
                    congested: *congested,
                    source: source.clone(),
                }),
                ScenarioStep::Command { command } => {
                    SimEvent::Controller(Event::OperatorCommand(OperatorCommand::parse(command)?))
                }
                ScenarioStep::Sample { monitor, value } => SimEvent::MonitorSample {
                    monitor: monitor.clone(),
                    value: *value,
                },
            };
            self.schedule(scheduled.at(), event);
        }

        info!(
            steps = scenario.steps.len(),
            monitors = scenario.monitors.len(),
            "Scenario loaded"
        );
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Accessors
    // ═══════════════════════════════════════════════════════════════════════════

    /// Current simulated time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Run statistics.
    pub fn stats(&self) -> SimulationStats {
        self.stats
    }

    /// Runner configuration.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// The tunnel plan.
    pub fn plan(&self) -> &Arc<TunnelPlan> {
        &self.plan
    }

    /// The controller under test.
    pub fn controller(&self) -> &TunnelController<SimProvisioning, SimFecTable> {
        &self.controller
    }

    /// Selection state of a tunnel.
    pub fn state(&self, tunnel: TunnelId) -> Option<&ActiveState> {
        self.controller.engine().state(tunnel)
    }

    /// LSP of the tunnel's active path.
    pub fn active_lsp(&self, tunnel: TunnelId) -> Option<LspId> {
        let index = self.state(tunnel)?.active_index;
        self.plan.path(tunnel, index).map(|path| path.lsp())
    }

    /// Every committed switch in order.
    pub fn switches(&self) -> &[SwitchRecord] {
        &self.switches
    }

    /// The simulated signaling layer.
    pub fn provisioning(&self) -> &SimProvisioning {
        self.controller.engine().provisioning()
    }

    /// The simulated classifier table.
    pub fn fec(&self) -> &SimFecTable {
        self.controller.engine().fec()
    }

    /// A configured monitor.
    pub fn monitor(&self, name: &str) -> Option<&HysteresisMonitor> {
        self.monitors.get(name)
    }

    /// Number of events still queued.
    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    /// Check if a timer is scheduled.
    pub fn is_timer_scheduled(&self, id: TimerId) -> bool {
        self.timers.contains_key(&id)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Scheduling
    // ═══════════════════════════════════════════════════════════════════════════

    /// Schedule an event at an absolute time.
    ///
    /// Times in the past fire at the current time.
    pub fn schedule(&mut self, at: Duration, event: SimEvent) -> EventKey {
        let key = EventKey {
            time: at.max(self.now),
            sequence: self.sequence,
        };
        self.sequence += 1;
        trace!(time = ?key.time, event_type = event.type_name(), "Scheduled event");
        self.queue.insert(key, event);
        key
    }

    /// Schedule a controller event at an absolute time.
    pub fn schedule_event(&mut self, at: Duration, event: Event) -> EventKey {
        self.schedule(at, SimEvent::Controller(event))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Execution
    // ═══════════════════════════════════════════════════════════════════════════

    /// Process the next event. Returns false if the queue is empty.
    pub fn step(&mut self) -> bool {
        let Some((key, event)) = self.queue.pop_first() else {
            return false;
        };
        self.now = key.time;

        if let SimEvent::Controller(Event::RestorationTimer) = event {
            if self.timers.get(&TimerId::RestorationCheck) == Some(&key) {
                self.timers.remove(&TimerId::RestorationCheck);
            }
            self.stats.timers_fired += 1;
        }

        self.process(event);
        true
    }

    /// Process every event scheduled at or before `end`, then advance the
    /// clock to `end`.
    pub fn run_until(&mut self, end: Duration) {
        while let Some((key, _)) = self.queue.first_key_value() {
            if key.time > end {
                break;
            }
            self.step();
        }
        self.now = self.now.max(end);
        debug!(now = ?self.now, remaining = self.queue.len(), "Run paused");
    }

    /// Deliver `Shutdown` to the controller.
    pub fn shutdown(&mut self) {
        self.dispatch(Event::Shutdown);
    }

    fn process(&mut self, event: SimEvent) {
        match event {
            SimEvent::Controller(event) => self.dispatch(event),

            SimEvent::SetupComplete { tunnel, lsp } => {
                let status = self
                    .controller
                    .engine_mut()
                    .provisioning_mut()
                    .complete_setup(tunnel, lsp);
                self.dispatch(Event::PathStatus {
                    tunnel,
                    lsp,
                    status,
                });
            }

            SimEvent::PathDown {
                tunnel,
                lsp,
                status,
            } => {
                self.controller
                    .engine_mut()
                    .provisioning_mut()
                    .tear_down(tunnel, lsp);
                self.dispatch(Event::PathStatus {
                    tunnel,
                    lsp,
                    status,
                });
            }

            SimEvent::PathUp { tunnel, lsp } => {
                self.controller
                    .engine_mut()
                    .provisioning_mut()
                    .establish(tunnel, lsp);
                self.dispatch(Event::PathStatus {
                    tunnel,
                    lsp,
                    status: PathStatus::Created,
                });
            }

            SimEvent::SetupFailure { tunnel, lsp, fails } => {
                self.controller
                    .engine_mut()
                    .provisioning_mut()
                    .set_setup_failure(tunnel, lsp, fails);
            }

            SimEvent::MonitorSample { monitor, value } => {
                let Some(m) = self.monitors.get_mut(&monitor) else {
                    warn!(monitor = %monitor, "Sample for unknown monitor");
                    return;
                };
                if let Some(event) = m.observe_event(value) {
                    self.stats.monitor_transitions += 1;
                    self.dispatch(event);
                }
            }
        }
    }

    fn dispatch(&mut self, event: Event) {
        self.controller.set_time(self.now);
        let actions = self.controller.handle(event);
        self.stats.events_processed += 1;

        for action in actions {
            self.execute(action);
        }
        self.drain_setup_requests();
    }

    fn execute(&mut self, action: Action) {
        match action {
            Action::SetTimer { id, duration } => {
                if let Some(previous) = self.timers.remove(&id) {
                    self.queue.remove(&previous);
                }
                let key = self.schedule(self.now + duration, timer_event(id));
                self.timers.insert(id, key);
            }
            Action::CancelTimer { id } => {
                if let Some(previous) = self.timers.remove(&id) {
                    self.queue.remove(&previous);
                }
            }
            Action::EmitPathSwitched(switch) => {
                info!(at = ?self.now, switch = %switch, "Path switched");
                self.stats.switches_committed += 1;
                self.switches.push(SwitchRecord {
                    at: self.now,
                    switch,
                });
            }
        }
    }

    fn drain_setup_requests(&mut self) {
        let requests = self
            .controller
            .engine_mut()
            .provisioning_mut()
            .take_setup_requests();

        for (tunnel, lsp) in requests {
            let latency = self.config.setup_latency + self.jitter();
            debug!(tunnel = %tunnel, lsp = %lsp, ?latency, "Path setup started");
            self.stats.setup_requests += 1;
            self.schedule(self.now + latency, SimEvent::SetupComplete { tunnel, lsp });
        }
    }

    fn jitter(&mut self) -> Duration {
        let bound = self.config.setup_jitter.as_millis() as u64;
        if bound == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(self.rng.gen_range(0..=bound))
    }
}

fn timer_event(id: TimerId) -> SimEvent {
    match id {
        TimerId::RestorationCheck => SimEvent::Controller(Event::RestorationTimer),
    }
}
