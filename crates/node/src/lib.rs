//! Tunnel controller state machine.
//!
//! This crate wires event ingress (signaling notifications, monitor levels,
//! operator commands, timers) to the failover engine.

mod controller;

pub use controller::{TunnelController, OPERATOR_REASON, PATH_NOTIFY_REASON};
