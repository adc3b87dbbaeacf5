//! Saved run records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{gate::SpeedRange, location::SpeedUnit};

/// A timed run the rider chose to keep. Built once from the live timers and
/// never modified afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompletedRun {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub primary_range: SpeedRange,
    pub secondary_range: Option<SpeedRange>,
    pub elapsed_primary_ms: u64,
    pub elapsed_secondary_ms: Option<u64>,
    pub unit: SpeedUnit,
}

impl CompletedRun {
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_primary_ms as f64 / 1000.0
    }

    pub fn secondary_elapsed_seconds(&self) -> Option<f64> {
        self.elapsed_secondary_ms.map(|ms| ms as f64 / 1000.0)
    }
}
