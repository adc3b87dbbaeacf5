pub mod range;
pub mod range_gate;

pub use range::SpeedRange;
pub use range_gate::{GateTransition, RangeGate};

use std::time::Instant;

use anyhow::Result;
use serde::Serialize;

use crate::{
    location::{SpeedSample, SpeedUnit},
    settings::RunSettings,
};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GateOutcome {
    pub primary: GateTransition,
    /// `None` when the optional run is disabled and its gate was not consulted.
    pub secondary: Option<GateTransition>,
}

/// The primary gate plus the optional one, fed from the same samples.
///
/// The two gates never look at each other; the set only fans a sample out and
/// keeps the secondary frozen while it is disabled.
#[derive(Debug, Clone)]
pub struct GateSet {
    primary: RangeGate,
    secondary: RangeGate,
    secondary_active: bool,
    unit: SpeedUnit,
}

impl GateSet {
    pub fn from_settings(settings: &RunSettings) -> Result<Self> {
        let primary = settings.primary_range()?;
        let secondary = match settings.secondary_range()? {
            Some(range) => range,
            None => parked_secondary_range(settings, primary),
        };
        Ok(Self {
            primary: RangeGate::new("primary", primary),
            secondary: RangeGate::new("secondary", secondary),
            secondary_active: settings.optional_run_is_active,
            unit: settings.display_unit,
        })
    }

    /// Re-reads ranges, unit and the optional toggle. Timers keep their state.
    pub fn apply_settings(&mut self, settings: &RunSettings) -> Result<()> {
        let primary = settings.primary_range()?;
        let secondary = settings.secondary_range()?;

        self.primary.set_range(primary);
        let secondary = match secondary {
            Some(range) => range,
            None => parked_secondary_range(settings, self.secondary.range()),
        };
        self.secondary.set_range(secondary);
        self.secondary_active = settings.optional_run_is_active;
        self.unit = settings.display_unit;
        Ok(())
    }

    pub fn unit(&self) -> SpeedUnit {
        self.unit
    }

    pub fn primary(&self) -> &RangeGate {
        &self.primary
    }

    pub fn secondary(&self) -> &RangeGate {
        &self.secondary
    }

    pub fn secondary_active(&self) -> bool {
        self.secondary_active
    }

    /// Compares the raw sample against each range. The display unit plays no
    /// part here; it only converts speeds for presentation.
    pub fn evaluate(&mut self, sample: SpeedSample, now: Instant) -> GateOutcome {
        let speed = sample.mps();
        let primary = self.primary.evaluate(speed, now);
        let secondary = self
            .secondary_active
            .then(|| self.secondary.evaluate(speed, now));
        GateOutcome { primary, secondary }
    }

    pub fn reset(&mut self) {
        self.primary.reset();
        self.secondary.reset();
    }
}

/// Range the disabled secondary gate holds so a snapshot taken right after
/// enabling shows the configured bounds. Invalid parked bounds are not an
/// error while the optional run is off; `fallback` is kept instead.
fn parked_secondary_range(settings: &RunSettings, fallback: SpeedRange) -> SpeedRange {
    SpeedRange::new(settings.optional_start_range, settings.optional_finish_range)
        .unwrap_or(fallback)
}
