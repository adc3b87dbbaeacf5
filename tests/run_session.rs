use std::time::Duration;

use chrono::Utc;
use speedgate_lib::{
    AppState, AuthorizationStatus, Database, LocationFeed, LocationFix, RunController,
    RunSettings, SpeedUnit, TimerStatus,
};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

fn fix_at(speed: f64) -> LocationFix {
    LocationFix::new(speed, 8.0, Utc::now())
}

fn acceleration_settings() -> RunSettings {
    RunSettings {
        start_range: 60.0,
        finish_range: 120.0,
        optional_run_is_active: false,
        optional_start_range: 100.0,
        optional_finish_range: 200.0,
        display_unit: SpeedUnit::Kph,
    }
}

#[tokio::test]
async fn feed_drives_gate_while_listening() {
    let feed = LocationFeed::new(AuthorizationStatus::NotDetermined);
    let controller = RunController::new(
        feed.clone(),
        Database::in_memory().unwrap(),
        &acceleration_settings(),
    )
    .unwrap();
    let mut snapshots = controller.subscribe_snapshots();

    controller.start_listening().await.unwrap();
    assert!(controller.is_listening().await);
    assert!(controller.start_listening().await.is_err());

    // the controller asked for a prompt; nothing gets through until it is answered
    timeout(WAIT, feed.permission_requested()).await.unwrap();
    assert_eq!(feed.publish(fix_at(80.0)), 0);

    feed.set_authorization(AuthorizationStatus::Granted);
    assert_eq!(feed.publish(fix_at(80.0)), 1);
    timeout(WAIT, snapshots.wait_for(|s| s.primary.status == TimerStatus::Running))
        .await
        .unwrap()
        .unwrap();

    feed.publish(fix_at(140.0));
    timeout(WAIT, snapshots.wait_for(|s| s.primary.status == TimerStatus::Stopped))
        .await
        .unwrap()
        .unwrap();

    controller.stop_listening().await.unwrap();
    assert!(!controller.is_listening().await);
    assert_eq!(feed.subscriber_count(), 0);

    // no longer listening: the timer keeps its last state
    let frozen = controller.snapshot().await;
    feed.publish(fix_at(80.0));
    assert_eq!(controller.snapshot().await.primary, frozen.primary);
}

#[tokio::test]
async fn denied_permission_never_starts_timer() {
    let feed = LocationFeed::new(AuthorizationStatus::Denied);
    let controller = RunController::new(
        feed.clone(),
        Database::in_memory().unwrap(),
        &acceleration_settings(),
    )
    .unwrap();
    controller.start_listening().await.unwrap();

    for speed in [70.0, 90.0, 110.0] {
        assert_eq!(feed.publish(fix_at(speed)), 0);
        controller.ingest(fix_at(speed)).await;
    }
    tokio::time::sleep(Duration::from_millis(50)).await;

    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.primary.status, TimerStatus::Stopped);
    assert_eq!(snapshot.primary.elapsed_ms, 0);
    controller.stop_listening().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn two_saves_make_two_independent_records() {
    let dir = std::env::temp_dir().join(format!("speedgate-it-{}", uuid::Uuid::new_v4()));
    let app = AppState::setup(&dir, AuthorizationStatus::Granted).unwrap();
    app.settings
        .update_run_settings(acceleration_settings())
        .unwrap();
    app.timer
        .apply_settings(&app.settings.run_settings())
        .await
        .unwrap();

    app.timer.ingest(fix_at(65.0)).await;
    tokio::time::advance(Duration::from_millis(2_500)).await;
    app.timer.ingest(fix_at(125.0)).await;

    let first = app.timer.save_run("first pull").await.unwrap();
    assert_eq!(first.elapsed_primary_ms, 2_500);
    assert!(first.secondary_range.is_none());

    app.timer.ingest(fix_at(100.0)).await;
    tokio::time::advance(Duration::from_secs(1)).await;
    app.timer.ingest(fix_at(0.0)).await;

    let second = app.timer.save_run("second pull").await.unwrap();
    assert_ne!(first.id, second.id);
    assert_eq!(second.elapsed_primary_ms, 3_500);

    let reloaded = app.db.get_run(&first.id).await.unwrap().unwrap();
    assert_eq!(reloaded, first);
    assert_eq!(app.db.list_runs().await.unwrap().len(), 2);
}
