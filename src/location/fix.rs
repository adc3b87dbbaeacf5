use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Readings at or below this speed (m/s) are GPS jitter from a device at rest.
pub const NOISE_FLOOR_MPS: f64 = 2.0;

/// One raw update from the platform location service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocationFix {
    /// Ground speed in metres per second. Platforms report a negative value
    /// when the speed is unknown.
    pub speed: f64,
    /// Radius of uncertainty in metres; non-positive when unavailable.
    pub horizontal_accuracy: f64,
    pub timestamp: DateTime<Utc>,
}

impl LocationFix {
    pub fn new(speed: f64, horizontal_accuracy: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            speed,
            horizontal_accuracy,
            timestamp,
        }
    }

    pub fn sample(&self) -> SpeedSample {
        SpeedSample::from_raw(self.speed)
    }
}

/// Speed magnitude in metres per second, already clamped to the noise floor.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, PartialOrd)]
#[serde(transparent)]
pub struct SpeedSample(f64);

impl SpeedSample {
    pub const ZERO: SpeedSample = SpeedSample(0.0);

    pub fn from_raw(mps: f64) -> Self {
        if !mps.is_finite() || mps <= NOISE_FLOOR_MPS {
            Self::ZERO
        } else {
            Self(mps)
        }
    }

    pub fn mps(&self) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readings_under_floor_become_zero() {
        assert_eq!(SpeedSample::from_raw(1.5).mps(), 0.0);
        assert_eq!(SpeedSample::from_raw(NOISE_FLOOR_MPS).mps(), 0.0);
        assert_eq!(SpeedSample::from_raw(2.01).mps(), 2.01);
    }

    #[test]
    fn invalid_readings_become_zero() {
        assert_eq!(SpeedSample::from_raw(-1.0).mps(), 0.0);
        assert_eq!(SpeedSample::from_raw(f64::NAN).mps(), 0.0);
        assert_eq!(SpeedSample::from_raw(f64::INFINITY).mps(), 0.0);
    }

    #[test]
    fn fix_parses_from_camel_case_json() {
        let fix: LocationFix = serde_json::from_str(
            r#"{"speed": 12.5, "horizontalAccuracy": 4.0, "timestamp": "2024-05-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(fix.sample().mps(), 12.5);
        assert_eq!(fix.horizontal_accuracy, 4.0);
    }
}
