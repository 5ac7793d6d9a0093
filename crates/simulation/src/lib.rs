//! Deterministic simulation runner.
//!
//! This crate drives a [`tunnelctl_node::TunnelController`] over in-memory
//! gateways. Given the same plan, scenario and seed, it produces identical
//! results every run.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  SimulationRunner                       │
//! │                                                         │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     Event Queue (BTreeMap<EventKey, SimEvent>)     │ │
//! │  │     Ordered by: time, sequence                     │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │                             │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │  SimProvisioning / SimFecTable / monitors          │ │
//! │  │  World changes become controller events            │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │                             │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │  TunnelController::handle → Actions                │ │
//! │  │  Timers and setup completions → new events         │ │
//! │  └────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────┘
//! ```

mod event_queue;
mod gateways;
mod runner;
mod scenario;

pub use event_queue::{EventKey, SimEvent};
pub use gateways::{SimFecTable, SimProvisioning};
pub use runner::{SimulationConfig, SimulationRunner, SimulationStats, SwitchRecord};
pub use scenario::{Scenario, ScenarioStep, ScheduledStep, SimulationSettings};
