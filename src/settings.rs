use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::{gate::SpeedRange, location::SpeedUnit};

/// Rider-facing configuration. Range bounds are compared with the raw speed
/// reported by the location feed; `display_unit` only changes presentation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RunSettings {
    pub start_range: f64,
    pub finish_range: f64,
    pub optional_run_is_active: bool,
    pub optional_start_range: f64,
    pub optional_finish_range: f64,
    pub display_unit: SpeedUnit,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            start_range: 0.0,
            finish_range: 100.0,
            optional_run_is_active: false,
            optional_start_range: 100.0,
            optional_finish_range: 200.0,
            display_unit: SpeedUnit::Kph,
        }
    }
}

impl RunSettings {
    pub fn primary_range(&self) -> Result<SpeedRange> {
        SpeedRange::new(self.start_range, self.finish_range).context("invalid primary range")
    }

    /// `None` while the optional run is switched off.
    pub fn secondary_range(&self) -> Result<Option<SpeedRange>> {
        if !self.optional_run_is_active {
            return Ok(None);
        }
        SpeedRange::new(self.optional_start_range, self.optional_finish_range)
            .map(Some)
            .context("invalid optional range")
    }

    pub fn validate(&self) -> Result<()> {
        self.primary_range()?;
        self.secondary_range()?;
        Ok(())
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<RunSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            match serde_json::from_str::<RunSettings>(&contents) {
                Ok(settings) if settings.validate().is_ok() => settings,
                Ok(_) | Err(_) => {
                    warn!(
                        "Ignoring unusable settings at {}, using defaults",
                        path.display()
                    );
                    RunSettings::default()
                }
            }
        } else {
            RunSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn run_settings(&self) -> RunSettings {
        self.read().clone()
    }

    pub fn update_run_settings(&self, settings: RunSettings) -> Result<()> {
        settings.validate()?;
        let mut guard = self.write();
        self.persist(&settings)?;
        *guard = settings;
        Ok(())
    }

    fn persist(&self, data: &RunSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, RunSettings> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, RunSettings> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
