use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerStatus {
    Stopped,
    Running,
}

impl Default for TimerStatus {
    fn default() -> Self {
        TimerStatus::Stopped
    }
}

/// Stopwatch that only accumulates while running.
///
/// Every transition has an `*_at` form taking the current instant so callers
/// that already sampled the clock (the gates, tests) stay consistent.
#[derive(Debug, Clone, Default)]
pub struct IntervalTimer {
    status: TimerStatus,
    /// Time accumulated from earlier running windows; combines with `running_anchor`
    /// to compute the true elapsed duration.
    baseline: Duration,
    running_anchor: Option<Instant>,
}

impl IntervalTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    pub fn start(&mut self) -> bool {
        self.start_at(Instant::now())
    }

    pub fn pause(&mut self) -> bool {
        self.pause_at(Instant::now())
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed_at(Instant::now())
    }

    /// Returns true when the timer actually transitioned.
    pub fn start_at(&mut self, now: Instant) -> bool {
        if self.is_running() {
            return false;
        }
        self.status = TimerStatus::Running;
        self.running_anchor = Some(now);
        true
    }

    /// Returns true when the timer actually transitioned.
    pub fn pause_at(&mut self, now: Instant) -> bool {
        if !self.is_running() {
            return false;
        }
        self.baseline = self.elapsed_at(now);
        self.status = TimerStatus::Stopped;
        self.running_anchor = None;
        true
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn elapsed_at(&self, now: Instant) -> Duration {
        match (self.status, self.running_anchor) {
            (TimerStatus::Running, Some(anchor)) => self
                .baseline
                .saturating_add(now.saturating_duration_since(anchor)),
            _ => self.baseline,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn starts_stopped_at_zero() {
        let timer = IntervalTimer::new();
        assert_eq!(timer.status(), TimerStatus::Stopped);
        assert_eq!(timer.elapsed(), Duration::ZERO);
    }

    #[test]
    fn accumulates_while_running() {
        let t0 = Instant::now();
        let mut timer = IntervalTimer::new();
        assert!(timer.start_at(t0));
        assert_eq!(timer.elapsed_at(t0 + secs(3)), secs(3));
    }

    #[test]
    fn second_start_keeps_anchor() {
        let t0 = Instant::now();
        let mut timer = IntervalTimer::new();
        timer.start_at(t0);
        assert!(!timer.start_at(t0 + secs(2)));
        assert_eq!(timer.elapsed_at(t0 + secs(5)), secs(5));
    }

    #[test]
    fn pause_freezes_elapsed() {
        let t0 = Instant::now();
        let mut timer = IntervalTimer::new();
        timer.start_at(t0);
        assert!(timer.pause_at(t0 + secs(4)));
        assert!(!timer.pause_at(t0 + secs(6)));
        assert_eq!(timer.elapsed_at(t0 + secs(100)), secs(4));
        assert_eq!(timer.status(), TimerStatus::Stopped);
    }

    #[test]
    fn elapsed_sums_running_windows_only() {
        let t0 = Instant::now();
        let mut timer = IntervalTimer::new();
        timer.start_at(t0);
        timer.pause_at(t0 + secs(2));
        timer.start_at(t0 + secs(10));
        timer.start_at(t0 + secs(11));
        timer.pause_at(t0 + secs(13));
        timer.start_at(t0 + secs(20));
        assert_eq!(timer.elapsed_at(t0 + secs(21)), secs(6));
    }

    #[test]
    fn reset_is_total_and_idempotent() {
        let t0 = Instant::now();
        let mut running = IntervalTimer::new();
        running.start_at(t0);
        running.reset();
        assert_eq!(running.elapsed_at(t0 + secs(9)), Duration::ZERO);
        assert!(!running.is_running());

        let mut paused = IntervalTimer::new();
        paused.start_at(t0);
        paused.pause_at(t0 + secs(1));
        paused.reset();
        paused.reset();
        assert_eq!(paused.elapsed_at(t0 + secs(9)), Duration::ZERO);
        assert_eq!(paused.status(), TimerStatus::Stopped);
    }

    #[test]
    fn reusable_after_reset() {
        let t0 = Instant::now();
        let mut timer = IntervalTimer::new();
        timer.start_at(t0);
        timer.reset();
        timer.start_at(t0 + secs(5));
        assert_eq!(timer.elapsed_at(t0 + secs(7)), secs(2));
    }
}
