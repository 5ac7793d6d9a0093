//! Delayed restoration bookkeeping.
//!
//! A restored primary, or a pending switch target, must stay ready for the
//! restoration delay before traffic moves to it. The scheduler remembers
//! when each path was first seen ready and drives a single reusable timer:
//! armed when the first record appears, re-armed after firing while records
//! remain, idle otherwise.
//! All comparisons use the controller's logical time.

use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;
use tunnelctl_core::{Action, TimerId};
use tunnelctl_types::{LspId, TunnelId};

/// Tracks restorations waiting out the restoration delay.
#[derive(Debug)]
pub struct RestorationScheduler {
    /// Minimum time a path must remain ready before restoration.
    delay: Duration,
    /// (tunnel, lsp) -> time the path was first observed ready.
    records: BTreeMap<(TunnelId, LspId), Duration>,
    /// Whether `TimerId::RestorationCheck` is currently scheduled.
    timer_armed: bool,
}

impl RestorationScheduler {
    /// Create a scheduler with the given restoration delay.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            records: BTreeMap::new(),
            timer_armed: false,
        }
    }

    /// The configured restoration delay.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Whether restorations are delayed at all.
    pub fn is_enabled(&self) -> bool {
        !self.delay.is_zero()
    }

    /// Record that a path was observed ready.
    ///
    /// Only the first observation is recorded; later ones keep the original
    /// timestamp. Returns a `SetTimer` action if the timer was idle.
    pub fn observe(&mut self, tunnel: TunnelId, lsp: LspId, now: Duration) -> Option<Action> {
        if self.records.contains_key(&(tunnel, lsp)) {
            debug!(tunnel = %tunnel, lsp = %lsp, "Restoration already pending");
            return None;
        }

        self.records.insert((tunnel, lsp), now);
        debug!(
            tunnel = %tunnel,
            lsp = %lsp,
            delay = ?self.delay,
            "Restoration pending confirmation"
        );

        if self.timer_armed {
            return None;
        }
        self.timer_armed = true;
        Some(Action::SetTimer {
            id: TimerId::RestorationCheck,
            duration: self.delay,
        })
    }

    /// Drop a pending restoration (the path failed again, or it was acted on).
    ///
    /// Returns true if a record existed.
    pub fn forget(&mut self, tunnel: TunnelId, lsp: LspId) -> bool {
        self.records.remove(&(tunnel, lsp)).is_some()
    }

    /// Check if a restoration is pending for the path.
    pub fn is_pending(&self, tunnel: TunnelId, lsp: LspId) -> bool {
        self.records.contains_key(&(tunnel, lsp))
    }

    /// Time the path was first observed ready, if pending.
    pub fn observed_at(&self, tunnel: TunnelId, lsp: LspId) -> Option<Duration> {
        self.records.get(&(tunnel, lsp)).copied()
    }

    /// Mark the timer as fired. Must be called before `take_due`/`rearm`.
    pub fn on_timer_fired(&mut self) {
        self.timer_armed = false;
    }

    /// Remove and return every record at least `delay` old.
    pub fn take_due(&mut self, now: Duration) -> Vec<(TunnelId, LspId)> {
        let delay = self.delay;
        let due: Vec<(TunnelId, LspId)> = self
            .records
            .iter()
            .filter(|(_, observed)| now.saturating_sub(**observed) >= delay)
            .map(|(key, _)| *key)
            .collect();

        for key in &due {
            self.records.remove(key);
        }
        due
    }

    /// Re-arm the timer if records remain and it is idle.
    ///
    /// The new schedule fires when the oldest remaining record becomes due.
    pub fn rearm(&mut self, now: Duration) -> Option<Action> {
        if self.timer_armed {
            return None;
        }
        let oldest = self.records.values().min()?;
        let duration = (*oldest + self.delay).saturating_sub(now);
        self.timer_armed = true;
        Some(Action::SetTimer {
            id: TimerId::RestorationCheck,
            duration,
        })
    }

    /// Cancel the timer on shutdown.
    pub fn cancel(&mut self) -> Option<Action> {
        if !self.timer_armed {
            return None;
        }
        self.timer_armed = false;
        Some(Action::CancelTimer {
            id: TimerId::RestorationCheck,
        })
    }

    /// Check if the timer is scheduled.
    pub fn is_armed(&self) -> bool {
        self.timer_armed
    }

    /// Get the number of pending restorations.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: TunnelId = TunnelId(7);

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_first_observation_arms_timer_once() {
        let mut scheduler = RestorationScheduler::new(secs(5));

        let action = scheduler.observe(T, LspId(70), secs(10));
        assert_eq!(
            action,
            Some(Action::SetTimer {
                id: TimerId::RestorationCheck,
                duration: secs(5),
            })
        );
        assert!(scheduler.is_armed());

        // Repeat observation keeps the original timestamp and arms nothing.
        assert_eq!(scheduler.observe(T, LspId(70), secs(12)), None);
        assert_eq!(scheduler.observed_at(T, LspId(70)), Some(secs(10)));

        // Another path while armed does not arm a second timer.
        assert_eq!(scheduler.observe(TunnelId(8), LspId(80), secs(12)), None);
        assert_eq!(scheduler.len(), 2);
    }

    #[test]
    fn test_take_due_respects_delay() {
        let mut scheduler = RestorationScheduler::new(secs(5));
        scheduler.observe(T, LspId(70), secs(10));
        scheduler.observe(TunnelId(8), LspId(80), secs(12));

        scheduler.on_timer_fired();
        assert!(scheduler.take_due(secs(14)).is_empty());
        assert_eq!(scheduler.take_due(secs(15)), vec![(T, LspId(70))]);
        assert!(!scheduler.is_pending(T, LspId(70)));

        // Remaining record re-arms for exactly its remaining time.
        assert_eq!(
            scheduler.rearm(secs(15)),
            Some(Action::SetTimer {
                id: TimerId::RestorationCheck,
                duration: secs(2),
            })
        );
    }

    #[test]
    fn test_rearm_idle_when_empty() {
        let mut scheduler = RestorationScheduler::new(secs(5));
        scheduler.observe(T, LspId(70), secs(0));
        scheduler.on_timer_fired();
        assert_eq!(scheduler.take_due(secs(5)).len(), 1);
        assert_eq!(scheduler.rearm(secs(5)), None);
        assert!(!scheduler.is_armed());
    }

    #[test]
    fn test_forget_and_cancel() {
        let mut scheduler = RestorationScheduler::new(secs(5));
        assert_eq!(scheduler.cancel(), None);

        scheduler.observe(T, LspId(70), secs(1));
        assert!(scheduler.forget(T, LspId(70)));
        assert!(!scheduler.forget(T, LspId(70)));
        assert_eq!(
            scheduler.cancel(),
            Some(Action::CancelTimer {
                id: TimerId::RestorationCheck,
            })
        );
        assert!(!scheduler.is_armed());
    }

    #[test]
    fn test_disabled_with_zero_delay() {
        assert!(!RestorationScheduler::new(Duration::ZERO).is_enabled());
        assert!(RestorationScheduler::new(secs(1)).is_enabled());
    }
}
