use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use log::{debug, error, info};
use serde::Serialize;
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    db::{CompletedRun, Database},
    error::SaveRunError,
    gate::{GateOutcome, GateSet, GateTransition, RangeGate, SpeedRange},
    location::{
        AuthorizationStatus, LocationFeed, LocationFix, SignalQuality, SpeedSample, SpeedUnit,
        Subscription,
    },
    settings::RunSettings,
};

use super::TimerStatus;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimerReading {
    pub range: SpeedRange,
    pub status: TimerStatus,
    pub elapsed_ms: u64,
}

impl TimerReading {
    fn of(gate: &RangeGate, now: std::time::Instant) -> Self {
        Self {
            range: gate.range(),
            status: gate.status(),
            elapsed_ms: whole_millis(gate.elapsed_at(now)),
        }
    }
}

/// Everything the speedometer screen needs for one frame.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunSnapshot {
    /// Latest speed, already converted to `unit`.
    pub speed: f64,
    pub unit: SpeedUnit,
    pub unit_label: &'static str,
    pub signal: SignalQuality,
    pub primary: TimerReading,
    /// Present only while the optional run is enabled.
    pub secondary: Option<TimerReading>,
}

struct LiveState {
    gates: GateSet,
    last_sample: SpeedSample,
    signal: SignalQuality,
}

impl LiveState {
    fn snapshot(&self, now: std::time::Instant) -> RunSnapshot {
        let unit = self.gates.unit();
        RunSnapshot {
            speed: unit.convert(self.last_sample.mps()),
            unit,
            unit_label: unit.label(),
            signal: self.signal,
            primary: TimerReading::of(self.gates.primary(), now),
            secondary: self
                .gates
                .secondary_active()
                .then(|| TimerReading::of(self.gates.secondary(), now)),
        }
    }
}

struct Listener {
    cancel_token: CancellationToken,
    gate_loop: JoinHandle<()>,
    ticker: JoinHandle<()>,
}

/// Owns the live gates for one speedometer screen and turns fixes from the
/// feed into timer transitions.
#[derive(Clone)]
pub struct RunController {
    state: Arc<Mutex<LiveState>>,
    snapshots: Arc<watch::Sender<RunSnapshot>>,
    db: Database,
    feed: LocationFeed,
    listener: Arc<Mutex<Option<Listener>>>,
    tick_interval: Duration,
    heartbeat_every_ticks: u32,
}

impl RunController {
    pub fn new(feed: LocationFeed, db: Database, settings: &RunSettings) -> Result<Self> {
        let debug_mode = std::env::var("SPEEDGATE_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let state = LiveState {
            gates: GateSet::from_settings(settings)?,
            last_sample: SpeedSample::ZERO,
            signal: SignalQuality::None,
        };
        let (snapshots, _) = watch::channel(state.snapshot(clock_now()));

        Ok(Self {
            state: Arc::new(Mutex::new(state)),
            snapshots: Arc::new(snapshots),
            db,
            feed,
            listener: Arc::new(Mutex::new(None)),
            tick_interval: Duration::from_millis(100),
            heartbeat_every_ticks: if debug_mode { 10 } else { 600 },
        })
    }

    pub fn feed(&self) -> &LocationFeed {
        &self.feed
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub async fn snapshot(&self) -> RunSnapshot {
        self.state.lock().await.snapshot(clock_now())
    }

    /// Lock-free view for presentation; refreshed on every fix and every tick
    /// while listening.
    pub fn subscribe_snapshots(&self) -> watch::Receiver<RunSnapshot> {
        self.snapshots.subscribe()
    }

    /// Runs one fix through the gates. Without location permission the fix is
    /// ignored, the same as the feed would drop it.
    pub async fn ingest(&self, fix: LocationFix) -> RunSnapshot {
        let authorization = self.feed.authorization();
        if authorization != AuthorizationStatus::Granted {
            log_warn!("ignoring fix while location access is {:?}", authorization);
            return self.snapshot().await;
        }
        apply_fix(&self.state, &self.snapshots, &fix).await
    }

    pub async fn is_listening(&self) -> bool {
        self.listener.lock().await.is_some()
    }

    /// Subscribes to the feed and starts the gate loop and refresh ticker.
    pub async fn start_listening(&self) -> Result<()> {
        let mut listener = self.listener.lock().await;
        if listener.is_some() {
            bail!("already listening to location updates");
        }

        if self.feed.request_permission() {
            info!("Location permission not determined yet; prompt requested");
        }

        let cancel_token = CancellationToken::new();
        let gate_loop = tokio::spawn(gate_loop(
            self.feed.subscribe(),
            self.state.clone(),
            self.snapshots.clone(),
            cancel_token.clone(),
        ));
        let ticker = tokio::spawn(refresh_loop(
            self.state.clone(),
            self.snapshots.clone(),
            cancel_token.clone(),
            self.tick_interval,
            self.heartbeat_every_ticks,
        ));

        *listener = Some(Listener {
            cancel_token,
            gate_loop,
            ticker,
        });
        info!("Listening for location updates");
        Ok(())
    }

    /// Stops consuming fixes. Timers stay exactly where the last fix left them.
    pub async fn stop_listening(&self) -> Result<()> {
        let Some(listener) = self.listener.lock().await.take() else {
            return Ok(());
        };

        listener.cancel_token.cancel();
        listener
            .gate_loop
            .await
            .context("gate loop task failed to join")?;
        listener
            .ticker
            .await
            .context("refresh ticker task failed to join")?;
        info!("Stopped listening for location updates");
        Ok(())
    }

    pub async fn reset_timers(&self) -> RunSnapshot {
        let snapshot = {
            let mut state = self.state.lock().await;
            state.gates.reset();
            state.snapshot(clock_now())
        };
        info!("Timers reset");
        self.snapshots.send_replace(snapshot.clone());
        snapshot
    }

    /// Takes effect from the next fix; accumulated time is kept.
    pub async fn apply_settings(&self, settings: &RunSettings) -> Result<()> {
        let snapshot = {
            let mut state = self.state.lock().await;
            state.gates.apply_settings(settings)?;
            state.snapshot(clock_now())
        };
        info!(
            "Applied settings: primary {}-{}, optional {} ({}-{}), display {}",
            settings.start_range,
            settings.finish_range,
            if settings.optional_run_is_active { "on" } else { "off" },
            settings.optional_start_range,
            settings.optional_finish_range,
            settings.display_unit.label()
        );
        self.snapshots.send_replace(snapshot);
        Ok(())
    }

    /// Persists the current timer values as a new run. A failed write leaves
    /// the timers untouched and is not retried.
    pub async fn save_run(&self, title: &str) -> Result<CompletedRun, SaveRunError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(SaveRunError::EmptyTitle);
        }

        let run = {
            let state = self.state.lock().await;
            let now = clock_now();
            let gates = &state.gates;
            let secondary = gates.secondary_active().then(|| gates.secondary());
            CompletedRun {
                id: Uuid::new_v4().to_string(),
                title: title.to_string(),
                created_at: Utc::now(),
                primary_range: gates.primary().range(),
                secondary_range: secondary.map(RangeGate::range),
                elapsed_primary_ms: whole_millis(gates.primary().elapsed_at(now)),
                elapsed_secondary_ms: secondary.map(|gate| whole_millis(gate.elapsed_at(now))),
                unit: gates.unit(),
            }
        };

        if let Err(err) = self.db.insert_run(&run).await {
            error!("Failed to save run '{}': {err:#}", run.title);
            return Err(SaveRunError::Persistence(err));
        }

        info!(
            "Saved run '{}' ({}) at {:.1}s",
            run.title,
            run.id,
            run.elapsed_seconds()
        );
        Ok(run)
    }
}

fn whole_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

fn clock_now() -> std::time::Instant {
    // tokio's clock so paused-time tests drive the timers too
    time::Instant::now().into_std()
}

async fn apply_fix(
    state: &Mutex<LiveState>,
    snapshots: &watch::Sender<RunSnapshot>,
    fix: &LocationFix,
) -> RunSnapshot {
    let sample = fix.sample();
    let (outcome, snapshot) = {
        let mut guard = state.lock().await;
        let now = clock_now();
        guard.last_sample = sample;
        guard.signal = SignalQuality::from_accuracy(fix.horizontal_accuracy);
        let outcome = guard.gates.evaluate(sample, now);
        (outcome, guard.snapshot(now))
    };

    log_transitions(outcome, &snapshot);
    snapshots.send_replace(snapshot.clone());
    snapshot
}

fn log_transitions(outcome: GateOutcome, snapshot: &RunSnapshot) {
    if outcome.primary != GateTransition::Unchanged {
        log_info!(
            "Primary timer {:?} at {:.0} {} ({} ms)",
            outcome.primary,
            snapshot.speed,
            snapshot.unit_label,
            snapshot.primary.elapsed_ms
        );
    }
    if let (Some(transition), Some(reading)) = (outcome.secondary, snapshot.secondary) {
        if transition != GateTransition::Unchanged {
            log_info!(
                "Optional timer {:?} at {:.0} {} ({} ms)",
                transition,
                snapshot.speed,
                snapshot.unit_label,
                reading.elapsed_ms
            );
        }
    }
}

async fn gate_loop(
    mut subscription: Subscription,
    state: Arc<Mutex<LiveState>>,
    snapshots: Arc<watch::Sender<RunSnapshot>>,
    cancel_token: CancellationToken,
) {
    loop {
        tokio::select! {
            next = subscription.recv() => {
                match next {
                    Some(fix) => {
                        apply_fix(&state, &snapshots, &fix).await;
                    }
                    None => {
                        log_warn!("location feed closed; gate loop exiting");
                        break;
                    }
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("gate loop shutting down");
                break;
            }
        }
    }
}

async fn refresh_loop(
    state: Arc<Mutex<LiveState>>,
    snapshots: Arc<watch::Sender<RunSnapshot>>,
    cancel_token: CancellationToken,
    tick_interval: Duration,
    heartbeat_every: u32,
) {
    let mut interval = time::interval(tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut ticks: u32 = 0;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let snapshot = state.lock().await.snapshot(clock_now());
                ticks = ticks.wrapping_add(1);
                if ticks % heartbeat_every == 0 {
                    debug!(
                        "heartbeat: {:.0} {} signal {:?}, primary {:?} {} ms",
                        snapshot.speed,
                        snapshot.unit_label,
                        snapshot.signal,
                        snapshot.primary.status,
                        snapshot.primary.elapsed_ms
                    );
                }
                snapshots.send_replace(snapshot);
            }
            _ = cancel_token.cancelled() => break,
        }
    }
}
