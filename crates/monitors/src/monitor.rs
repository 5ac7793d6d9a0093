//! Threshold monitor with hysteresis.

use crate::{MonitorConfig, MonitorKind, LOAD_CLEAR_RATIO, LOSS_CLEAR_RATIO};
use std::collections::VecDeque;
use tracing::{debug, info};
use tunnelctl_core::Event;
use tunnelctl_types::{ConfigError, TunnelId};

/// Converts raw samples into raise/clear transitions.
#[derive(Debug, Clone)]
pub struct HysteresisMonitor {
    config: MonitorConfig,
    raised: bool,
    /// Recent samples, only kept for queue depth averaging.
    history: VecDeque<f64>,
}

impl HysteresisMonitor {
    /// Create a monitor in the cleared state.
    pub fn new(config: MonitorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            raised: false,
            history: VecDeque::new(),
        })
    }

    /// Monitor name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Tunnel the monitor reports on.
    pub fn tunnel(&self) -> TunnelId {
        self.config.tunnel
    }

    /// Monitor configuration.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Check if the condition is currently raised.
    pub fn is_raised(&self) -> bool {
        self.raised
    }

    /// Feed one sample.
    ///
    /// Returns `Some(level)` when the level changes, `None` otherwise.
    pub fn observe(&mut self, sample: f64) -> Option<bool> {
        let value = self.smooth(sample);

        let next = if self.raised {
            !self.should_clear(value)
        } else {
            self.should_raise(value)
        };

        if next == self.raised {
            return None;
        }
        self.raised = next;
        info!(
            monitor = %self.config.name,
            kind = self.config.kind.type_name(),
            tunnel = %self.config.tunnel,
            value,
            raised = next,
            "Monitor level changed"
        );
        Some(next)
    }

    /// Feed one sample and wrap any transition as a congestion notification.
    pub fn observe_event(&mut self, sample: f64) -> Option<Event> {
        let congested = self.observe(sample)?;
        Some(Event::CongestionNotification {
            tunnel: self.config.tunnel,
            congested,
            source: self.config.name.clone(),
        })
    }

    fn smooth(&mut self, sample: f64) -> f64 {
        let MonitorKind::QueueDepth { history_size, .. } = self.config.kind else {
            return sample;
        };
        self.history.push_back(sample);
        while self.history.len() > history_size {
            self.history.pop_front();
        }
        let average = self.history.iter().sum::<f64>() / self.history.len() as f64;
        debug!(monitor = %self.config.name, sample, average, "Queue depth sample");
        average
    }

    fn should_raise(&self, value: f64) -> bool {
        match self.config.kind {
            MonitorKind::QueueDepth { high_watermark, .. } => value >= high_watermark,
            MonitorKind::Utilization { threshold, .. } | MonitorKind::LossRate { threshold } => {
                value >= threshold
            }
            MonitorKind::Latency { threshold_ms } => value >= threshold_ms,
            MonitorKind::LinkState => value == 0.0,
        }
    }

    fn should_clear(&self, value: f64) -> bool {
        match self.config.kind {
            MonitorKind::QueueDepth { low_watermark, .. } => value <= low_watermark,
            MonitorKind::Utilization {
                low_threshold: Some(low),
                ..
            } => value <= low,
            MonitorKind::Utilization { threshold, .. } => value < threshold * LOAD_CLEAR_RATIO,
            MonitorKind::LossRate { threshold } => value < threshold * LOSS_CLEAR_RATIO,
            MonitorKind::Latency { threshold_ms } => value < threshold_ms * LOAD_CLEAR_RATIO,
            MonitorKind::LinkState => value != 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn monitor(kind: MonitorKind) -> HysteresisMonitor {
        HysteresisMonitor::new(MonitorConfig::new("m0", TunnelId(7), kind)).unwrap()
    }

    #[traced_test]
    #[test]
    fn test_queue_depth_hysteresis() {
        let mut m = monitor(MonitorKind::QueueDepth {
            high_watermark: 40.0,
            low_watermark: 10.0,
            history_size: 1,
        });

        assert_eq!(m.observe(39.0), None);
        assert_eq!(m.observe(40.0), Some(true));
        assert_eq!(m.observe(50.0), None);
        // Between the watermarks nothing changes.
        assert_eq!(m.observe(20.0), None);
        assert!(m.is_raised());
        assert_eq!(m.observe(10.0), Some(false));
        assert_eq!(m.observe(5.0), None);
    }

    #[traced_test]
    #[test]
    fn test_queue_depth_uses_moving_average() {
        let mut m = monitor(MonitorKind::QueueDepth {
            high_watermark: 40.0,
            low_watermark: 10.0,
            history_size: 3,
        });

        assert_eq!(m.observe(60.0), Some(true));
        // Average of 60, 0, 0 = 20: still above the low watermark.
        assert_eq!(m.observe(0.0), None);
        assert_eq!(m.observe(0.0), None);
        // Window is now 0, 0, 0.
        assert_eq!(m.observe(0.0), Some(false));
    }

    #[traced_test]
    #[test]
    fn test_loss_rate_clears_at_half_threshold() {
        let mut m = monitor(MonitorKind::LossRate { threshold: 0.1 });

        assert_eq!(m.observe(0.1), Some(true));
        assert_eq!(m.observe(0.05), None);
        assert_eq!(m.observe(0.049), Some(false));
    }

    #[traced_test]
    #[test]
    fn test_latency_and_utilization_clear_below_seventy_percent() {
        let mut latency = monitor(MonitorKind::Latency { threshold_ms: 100.0 });
        assert_eq!(latency.observe(120.0), Some(true));
        assert_eq!(latency.observe(70.0), None);
        assert_eq!(latency.observe(69.0), Some(false));

        let mut util = monitor(MonitorKind::Utilization {
            threshold: 0.8,
            low_threshold: None,
        });
        assert_eq!(util.observe(0.9), Some(true));
        assert_eq!(util.observe(0.6), None);
        assert_eq!(util.observe(0.5), Some(false));

        let mut explicit = monitor(MonitorKind::Utilization {
            threshold: 0.8,
            low_threshold: Some(0.3),
        });
        assert_eq!(explicit.observe(0.8), Some(true));
        assert_eq!(explicit.observe(0.4), None);
        assert_eq!(explicit.observe(0.3), Some(false));
    }

    #[traced_test]
    #[test]
    fn test_link_state_events() {
        let mut m = monitor(MonitorKind::LinkState);

        assert_eq!(m.observe_event(1.0), None);
        assert_eq!(
            m.observe_event(0.0),
            Some(Event::CongestionNotification {
                tunnel: TunnelId(7),
                congested: true,
                source: "m0".to_string(),
            })
        );
        assert_eq!(m.observe_event(0.0), None);
        assert!(matches!(
            m.observe_event(1.0),
            Some(Event::CongestionNotification {
                congested: false,
                ..
            })
        ));
        assert!(logs_contain("Monitor level changed"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = HysteresisMonitor::new(MonitorConfig::new(
            "bad",
            TunnelId(7),
            MonitorKind::QueueDepth {
                high_watermark: 5.0,
                low_watermark: 10.0,
                history_size: 1,
            },
        ));
        assert!(result.is_err());
    }
}
