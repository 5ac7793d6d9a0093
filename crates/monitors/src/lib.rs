//! Link-health monitors.
//!
//! Each monitor watches one metric for one tunnel and turns raw samples into
//! level transitions with hysteresis: it raises once the metric crosses its
//! threshold and clears only once the metric falls well below it. Every
//! transition becomes a [`tunnelctl_core::Event::CongestionNotification`]
//! carrying the monitor's name as its source.

mod config;
mod monitor;

pub use config::{MonitorConfig, MonitorKind};
pub use monitor::HysteresisMonitor;

/// Loss rate clears below this fraction of its threshold.
pub const LOSS_CLEAR_RATIO: f64 = 0.5;

/// Latency and utilization clear below this fraction of their threshold.
pub const LOAD_CLEAR_RATIO: f64 = 0.7;
