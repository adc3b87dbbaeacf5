use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Inclusive `[start, finish]` speed window, in whatever unit it was configured in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpeedRange {
    start: f64,
    finish: f64,
}

impl SpeedRange {
    pub fn new(start: f64, finish: f64) -> Result<Self> {
        if !start.is_finite() || !finish.is_finite() {
            bail!("speed range bounds must be finite (got {start} - {finish})");
        }
        if start < 0.0 {
            bail!("speed range start must not be negative (got {start})");
        }
        if start > finish {
            bail!("speed range start {start} is above finish {finish}");
        }
        Ok(Self { start, finish })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn finish(&self) -> f64 {
        self.finish
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.start..=self.finish).contains(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_is_inclusive() {
        let range = SpeedRange::new(60.0, 120.0).unwrap();
        assert!(range.contains(60.0));
        assert!(range.contains(120.0));
        assert!(range.contains(90.0));
        assert!(!range.contains(59.999));
        assert!(!range.contains(120.001));
    }

    #[test]
    fn degenerate_range_holds_single_value() {
        let range = SpeedRange::new(50.0, 50.0).unwrap();
        assert!(range.contains(50.0));
        assert!(!range.contains(50.1));
    }

    #[test]
    fn rejects_malformed_bounds() {
        assert!(SpeedRange::new(100.0, 60.0).is_err());
        assert!(SpeedRange::new(-5.0, 60.0).is_err());
        assert!(SpeedRange::new(0.0, f64::NAN).is_err());
        assert!(SpeedRange::new(f64::NEG_INFINITY, 10.0).is_err());
    }
}
