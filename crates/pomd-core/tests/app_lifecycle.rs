//! End-to-end lifecycle tests driven through the public API only.

use std::time::Duration;

use pomd_core::{App, OutcomeCounts, OutcomeStore, PomEvent, PomState, StatusView};
use tokio::sync::mpsc;
use tokio::time::advance;

const LEN: Duration = Duration::from_secs(1500);

fn open_app(dir: &tempfile::TempDir) -> (App, mpsc::UnboundedReceiver<PomEvent>) {
    let store = OutcomeStore::open(dir.path().join("outcomes.db")).unwrap();
    App::new(store, LEN)
}

async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

fn counts_of(app: &App) -> OutcomeCounts {
    match app.status().unwrap() {
        StatusView::Counts(counts) => counts,
        StatusView::Active(_) => panic!("expected an idle daemon"),
    }
}

#[tokio::test(start_paused = true)]
async fn a_full_working_session() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _events) = open_app(&dir);

    // morning pom runs to completion
    assert!(app.start(Some("draft chapter".into())).is_applied());
    advance(LEN).await;
    settle().await;
    assert_eq!(app.state(), PomState::Idle);

    // second pom is interrupted, resumed, then finished
    assert!(app.start(None).is_applied());
    advance(Duration::from_secs(600)).await;
    assert!(app.pause().is_applied());
    advance(Duration::from_secs(120)).await;
    assert!(app.resume().is_applied());
    advance(LEN - Duration::from_secs(600)).await;
    settle().await;
    assert_eq!(app.state(), PomState::Idle);

    // third pom is abandoned
    assert!(app.start(Some("email".into())).is_applied());
    assert!(app.cancel().is_applied());
    settle().await;

    let counts = counts_of(&app);
    assert_eq!(counts.completed, 2);
    assert_eq!(counts.cancelled, 1);
    assert_eq!(counts.paused, 1);

    app.clear().unwrap();
    assert_eq!(counts_of(&app), OutcomeCounts::default());
}

#[tokio::test(start_paused = true)]
async fn counts_survive_a_daemon_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let (app, _events) = open_app(&dir);
        app.start(None);
        advance(LEN).await;
        settle().await;
        assert_eq!(counts_of(&app).completed, 1);
    }

    let (app, _events) = open_app(&dir);
    assert_eq!(app.state(), PomState::Idle);
    assert_eq!(counts_of(&app).completed, 1);
}
