//! Tunnel controller scenario simulator.
//!
//! Loads a plan file and a scenario file, runs them through
//! `tunnelctl-simulation`, and summarises the outcome.
//!
//! # Example
//!
//! ```ignore
//! use tunnelctl_simulator::{Simulator, SimulatorConfig};
//! use std::time::Duration;
//!
//! let config = SimulatorConfig::new("plan.toml", "scenario.toml")
//!     .with_until(Duration::from_secs(60))
//!     .with_seed(7);
//!
//! let report = Simulator::from_config(&config)?.run();
//! println!("{report}");
//! ```

pub mod config;
pub mod report;
pub mod runner;

pub use config::SimulatorConfig;
pub use report::{SimulationReport, TunnelSummary};
pub use runner::Simulator;
