pub mod db;
pub mod error;
pub mod gate;
pub mod location;
pub mod settings;
pub mod timer;
mod utils;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::info;
use tokio::io::{AsyncBufReadExt, BufReader};

pub use db::{CompletedRun, Database};
pub use error::SaveRunError;
pub use gate::{GateSet, RangeGate, SpeedRange};
pub use location::{
    AuthorizationStatus, LocationFeed, LocationFix, SignalQuality, SpeedSample, SpeedUnit,
};
pub use settings::{RunSettings, SettingsStore};
pub use timer::{IntervalTimer, RunController, RunSnapshot, TimerStatus};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

const DEFAULT_DATA_DIR: &str = "speedgate-data";

pub struct AppState {
    pub db: Database,
    pub feed: LocationFeed,
    pub timer: RunController,
    pub settings: SettingsStore,
}

impl AppState {
    pub fn setup(data_dir: &Path, authorization: AuthorizationStatus) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let settings = SettingsStore::new(data_dir.join("settings.json"))?;
        let db = Database::new(data_dir.join("speedgate.sqlite3"))?;
        let feed = LocationFeed::new(authorization);
        let timer = RunController::new(feed.clone(), db.clone(), &settings.run_settings())?;

        Ok(Self {
            db,
            feed,
            timer,
            settings,
        })
    }
}

fn data_dir() -> PathBuf {
    std::env::var_os("SPEEDGATE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Feeds JSON-lines fixes from stdin through the controller, pacing them by
/// their timestamps so the timers see real durations.
async fn replay_stdin(app: &AppState) -> Result<usize> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut previous: Option<DateTime<Utc>> = None;
    let mut replayed = 0;

    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fix: LocationFix = match serde_json::from_str(line) {
            Ok(fix) => fix,
            Err(err) => {
                log_warn!("Skipping malformed fix {line:?}: {err}");
                continue;
            }
        };

        if let Some(previous) = previous {
            let gap = (fix.timestamp - previous).to_std().unwrap_or_default();
            tokio::time::sleep(gap).await;
        }
        previous = Some(fix.timestamp);

        app.timer.ingest(fix).await;
        replayed += 1;
    }

    Ok(replayed)
}

pub fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("speedgate starting up...");

    let command = std::env::args().nth(1);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(async move {
        let app = AppState::setup(&data_dir(), AuthorizationStatus::Granted)?;

        if command.as_deref() == Some("--list") {
            let runs = app.db.list_runs().await?;
            println!("{}", serde_json::to_string_pretty(&runs)?);
            return Ok(());
        }

        let replayed = replay_stdin(&app).await?;
        info!("Replayed {replayed} location fixes");

        match command {
            Some(title) => match app.timer.save_run(&title).await {
                Ok(run) => println!("{}", serde_json::to_string_pretty(&run)?),
                Err(err) => {
                    log_error!("Run was not saved: {err}");
                    return Err(err.into());
                }
            },
            None => {
                let snapshot = app.timer.snapshot().await;
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            }
        }

        Ok::<(), anyhow::Error>(())
    })
}
