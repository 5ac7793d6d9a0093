//! Monitor configuration.

use serde::Deserialize;
use tunnelctl_types::{ConfigError, TunnelId};

/// What a monitor measures and where its thresholds lie.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MonitorKind {
    /// Queue occupancy in packets, averaged over the last `history_size`
    /// samples. Raises at `>= high_watermark`, clears at `<= low_watermark`.
    QueueDepth {
        /// Raise level.
        high_watermark: f64,
        /// Clear level.
        low_watermark: f64,
        /// Samples in the moving average.
        #[serde(default = "default_history_size")]
        history_size: usize,
    },

    /// Link utilization as a fraction in `0.0..=1.0`.
    ///
    /// Clears at `<= low_threshold` when given, otherwise below
    /// [`LOAD_CLEAR_RATIO`](crate::LOAD_CLEAR_RATIO) of the threshold.
    Utilization {
        /// Raise level.
        threshold: f64,
        /// Explicit clear level.
        #[serde(default)]
        low_threshold: Option<f64>,
    },

    /// Packet loss as a fraction in `0.0..=1.0`.
    LossRate {
        /// Raise level.
        threshold: f64,
    },

    /// One-way latency in milliseconds.
    Latency {
        /// Raise level.
        threshold_ms: f64,
    },

    /// Interface state: a sample of `0.0` means down, anything else up.
    LinkState,
}

fn default_history_size() -> usize {
    1
}

impl MonitorKind {
    /// Short name for logs.
    pub fn type_name(&self) -> &'static str {
        match self {
            MonitorKind::QueueDepth { .. } => "QueueDepth",
            MonitorKind::Utilization { .. } => "Utilization",
            MonitorKind::LossRate { .. } => "LossRate",
            MonitorKind::Latency { .. } => "Latency",
            MonitorKind::LinkState => "LinkState",
        }
    }
}

/// One monitor attached to a tunnel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MonitorConfig {
    /// Name reported as the notification source.
    pub name: String,

    /// Tunnel the notifications are about.
    pub tunnel: TunnelId,

    /// Metric and thresholds.
    #[serde(flatten)]
    pub kind: MonitorKind,
}

impl MonitorConfig {
    /// Create a monitor configuration.
    pub fn new(name: impl Into<String>, tunnel: TunnelId, kind: MonitorKind) -> Self {
        Self {
            name: name.into(),
            tunnel,
            kind,
        }
    }

    /// Reject inverted or out-of-range thresholds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |detail: String| ConfigError::InvalidThresholds {
            monitor: self.name.clone(),
            detail,
        };

        match self.kind {
            MonitorKind::QueueDepth {
                high_watermark,
                low_watermark,
                history_size,
            } => {
                if high_watermark <= low_watermark {
                    return Err(invalid(format!(
                        "high_watermark {high_watermark} must exceed low_watermark {low_watermark}"
                    )));
                }
                if history_size == 0 {
                    return Err(invalid("history_size must be at least 1".to_string()));
                }
            }
            MonitorKind::Utilization {
                threshold,
                low_threshold,
            } => {
                check_fraction(threshold).map_err(|d| invalid(format!("threshold {d}")))?;
                if let Some(low) = low_threshold {
                    if !(0.0..=1.0).contains(&low) {
                        return Err(invalid(format!("low_threshold {low} outside 0..=1")));
                    }
                    if threshold <= low {
                        return Err(invalid(format!(
                            "threshold {threshold} must exceed low_threshold {low}"
                        )));
                    }
                }
            }
            MonitorKind::LossRate { threshold } => {
                check_fraction(threshold).map_err(|d| invalid(format!("threshold {d}")))?;
            }
            MonitorKind::Latency { threshold_ms } => {
                if threshold_ms.is_nan() || threshold_ms <= 0.0 {
                    return Err(invalid(format!("threshold_ms {threshold_ms} must be positive")));
                }
            }
            MonitorKind::LinkState => {}
        }
        Ok(())
    }
}

/// Ratio thresholds must lie in `(0, 1]`.
fn check_fraction(value: f64) -> Result<(), String> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(format!("{value} outside (0, 1]"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Wrapper {
        monitors: Vec<MonitorConfig>,
    }

    #[test]
    fn test_parse_all_kinds() {
        let toml = r#"
            [[monitors]]
            name = "q0"
            tunnel = 7
            kind = "queue_depth"
            high_watermark = 40.0
            low_watermark = 10.0
            history_size = 4

            [[monitors]]
            name = "util"
            tunnel = 7
            kind = "utilization"
            threshold = 0.8

            [[monitors]]
            name = "loss"
            tunnel = 8
            kind = "loss_rate"
            threshold = 0.05

            [[monitors]]
            name = "rtt"
            tunnel = 8
            kind = "latency"
            threshold_ms = 50.0

            [[monitors]]
            name = "eth0"
            tunnel = 8
            kind = "link_state"
        "#;

        let parsed: Wrapper = toml::from_str(toml).unwrap();
        assert_eq!(parsed.monitors.len(), 5);
        assert_eq!(
            parsed.monitors[0].kind,
            MonitorKind::QueueDepth {
                high_watermark: 40.0,
                low_watermark: 10.0,
                history_size: 4,
            }
        );
        assert_eq!(
            parsed.monitors[1].kind,
            MonitorKind::Utilization {
                threshold: 0.8,
                low_threshold: None,
            }
        );
        assert_eq!(parsed.monitors[4].kind, MonitorKind::LinkState);
        assert_eq!(parsed.monitors[3].tunnel, TunnelId(8));
        for monitor in &parsed.monitors {
            monitor.validate().unwrap();
        }
    }

    #[test]
    fn test_inverted_watermarks_rejected() {
        let config = MonitorConfig::new(
            "q0",
            TunnelId(7),
            MonitorKind::QueueDepth {
                high_watermark: 10.0,
                low_watermark: 10.0,
                history_size: 1,
            },
        );
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidThresholds { monitor, .. }) if monitor == "q0"
        ));
    }

    #[test]
    fn test_out_of_range_ratios_rejected() {
        let cases = [
            MonitorKind::Utilization {
                threshold: 1.5,
                low_threshold: None,
            },
            MonitorKind::Utilization {
                threshold: 0.5,
                low_threshold: Some(0.6),
            },
            MonitorKind::LossRate { threshold: 0.0 },
            MonitorKind::Latency { threshold_ms: -1.0 },
        ];
        for kind in cases {
            let config = MonitorConfig::new("m", TunnelId(1), kind.clone());
            assert!(config.validate().is_err(), "{kind:?} should be rejected");
        }
    }
}
