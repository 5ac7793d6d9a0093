//! Tunnel failover and restoration.
//!
//! This crate decides which candidate path carries each tunnel's traffic:
//!
//! - [`FailoverEngine`]: reacts to path failures, restorations, congestion
//!   levels and operator requests
//! - [`ActivePathTracker`]: per-tunnel active/pending state
//! - [`RestorationScheduler`]: delayed return to a restored primary
//!
//! The engine is synchronous and owns its gateways. Timer scheduling is
//! expressed as [`tunnelctl_core::Action`]s for the caller to execute.

mod config;
mod engine;
mod restoration;
mod tracker;

pub use config::FailoverConfig;
pub use engine::{FailoverEngine, FailoverStats, SwitchOutcome};
pub use restoration::RestorationScheduler;
pub use tracker::{ActivePathTracker, ActiveState};
