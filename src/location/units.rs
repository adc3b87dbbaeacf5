use serde::{Deserialize, Serialize};

const KPH_PER_MPS: f64 = 3.6;
const MPH_PER_MPS: f64 = 2.2369;

/// Unit the rider sees speeds and range bounds in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SpeedUnit {
    Kph,
    Mph,
}

impl Default for SpeedUnit {
    fn default() -> Self {
        SpeedUnit::Kph
    }
}

impl SpeedUnit {
    pub fn multiplier(&self) -> f64 {
        match self {
            SpeedUnit::Kph => KPH_PER_MPS,
            SpeedUnit::Mph => MPH_PER_MPS,
        }
    }

    /// Converts metres per second into this unit.
    pub fn convert(&self, mps: f64) -> f64 {
        mps * self.multiplier()
    }

    pub fn label(&self) -> &'static str {
        match self {
            SpeedUnit::Kph => "km/h",
            SpeedUnit::Mph => "mph",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SpeedUnit::Kph => "kph",
            SpeedUnit::Mph => "mph",
        }
    }
}
