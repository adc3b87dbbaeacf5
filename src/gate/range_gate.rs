use std::time::{Duration, Instant};

use log::debug;
use serde::Serialize;

use crate::timer::{IntervalTimer, TimerStatus};

use super::SpeedRange;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum GateTransition {
    Started,
    Paused,
    Unchanged,
}

/// Drives one timer from one range.
///
/// There is no debouncing: a single sample across a boundary pauses or
/// resumes the timer immediately, so noise right at a bound makes it flap.
#[derive(Debug, Clone)]
pub struct RangeGate {
    name: &'static str,
    range: SpeedRange,
    timer: IntervalTimer,
}

impl RangeGate {
    pub fn new(name: &'static str, range: SpeedRange) -> Self {
        Self {
            name,
            range,
            timer: IntervalTimer::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn range(&self) -> SpeedRange {
        self.range
    }

    /// Swaps the bounds without touching accumulated time.
    pub fn set_range(&mut self, range: SpeedRange) {
        self.range = range;
    }

    pub fn timer(&self) -> &IntervalTimer {
        &self.timer
    }

    pub fn status(&self) -> TimerStatus {
        self.timer.status()
    }

    pub fn elapsed_at(&self, now: Instant) -> Duration {
        self.timer.elapsed_at(now)
    }

    /// `speed` must already be in the unit the range was configured in.
    pub fn evaluate(&mut self, speed: f64, now: Instant) -> GateTransition {
        if self.range.contains(speed) {
            if self.timer.start_at(now) {
                debug!(
                    "{} gate started at {:.1} in [{}, {}]",
                    self.name,
                    speed,
                    self.range.start(),
                    self.range.finish()
                );
                return GateTransition::Started;
            }
        } else if self.timer.pause_at(now) {
            debug!(
                "{} gate paused at {:.1} outside [{}, {}] after {:?}",
                self.name,
                speed,
                self.range.start(),
                self.range.finish(),
                self.timer.elapsed_at(now)
            );
            return GateTransition::Paused;
        }
        GateTransition::Unchanged
    }

    pub fn reset(&mut self) {
        self.timer.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(start: f64, finish: f64) -> RangeGate {
        RangeGate::new("test", SpeedRange::new(start, finish).unwrap())
    }

    #[test]
    fn runs_inside_and_pauses_outside() {
        let t0 = Instant::now();
        let mut gate = gate(60.0, 120.0);

        for speed in [0.0, 59.9, 120.1, 300.0] {
            gate.evaluate(speed, t0);
            assert_eq!(gate.status(), TimerStatus::Stopped, "speed {speed}");
        }
        for speed in [60.0, 61.0, 119.0, 120.0] {
            gate.evaluate(speed, t0);
            assert_eq!(gate.status(), TimerStatus::Running, "speed {speed}");
        }
    }

    #[test]
    fn reports_transitions() {
        let t0 = Instant::now();
        let mut gate = gate(10.0, 20.0);
        assert_eq!(gate.evaluate(15.0, t0), GateTransition::Started);
        assert_eq!(gate.evaluate(16.0, t0), GateTransition::Unchanged);
        assert_eq!(gate.evaluate(25.0, t0), GateTransition::Paused);
        assert_eq!(gate.evaluate(26.0, t0), GateTransition::Unchanged);
    }

    #[test]
    fn flaps_on_boundary_noise() {
        let t0 = Instant::now();
        let mut gate = gate(60.0, 120.0);
        let samples = [60.0, 59.9, 60.0, 59.9];
        let transitions: Vec<_> = samples
            .iter()
            .enumerate()
            .map(|(i, speed)| gate.evaluate(*speed, t0 + Duration::from_secs(i as u64)))
            .collect();
        assert_eq!(
            transitions,
            vec![
                GateTransition::Started,
                GateTransition::Paused,
                GateTransition::Started,
                GateTransition::Paused,
            ]
        );
        assert_eq!(gate.elapsed_at(t0 + Duration::from_secs(10)), Duration::from_secs(2));
    }

    #[test]
    fn changing_range_keeps_elapsed() {
        let t0 = Instant::now();
        let mut gate = gate(0.0, 50.0);
        gate.evaluate(10.0, t0);
        gate.evaluate(60.0, t0 + Duration::from_secs(3));
        gate.set_range(SpeedRange::new(50.0, 100.0).unwrap());
        assert_eq!(gate.elapsed_at(t0 + Duration::from_secs(5)), Duration::from_secs(3));
        gate.evaluate(60.0, t0 + Duration::from_secs(5));
        assert_eq!(gate.status(), TimerStatus::Running);
    }
}
