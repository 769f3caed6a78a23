//! Integration tests for the scout-ratings service
//!
//! These tests validate the system working together, including:
//! - Snapshot files flowing through the scheduler onto the board
//! - Out-of-order refreshes settling on the newest fetch
//! - Failed refreshes keeping the previous rankings
//! - The HTTP surface on a running service

mod fixtures;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use scout_ratings::config::AppConfig;
use scout_ratings::metrics::MetricsCollector;
use scout_ratings::rating::{OprRatingCalculator, RatingBoard};
use scout_ratings::refresh::{
    EventDataProvider, FileEventDataProvider, RefreshOutcome, RefreshScheduler,
    StaticEventDataProvider,
};
use scout_ratings::service::{create_router, AppState, HealthCheck, HealthStatus};
use scout_ratings::types::ScheduleLuck;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_test::{assert_err, assert_ok};
use tower::ServiceExt;

use fixtures::{additive_event, solo_event, ScriptedProvider};

fn scheduler(provider: Arc<dyn EventDataProvider>) -> RefreshScheduler {
    RefreshScheduler::new(
        provider,
        Arc::new(OprRatingCalculator::default()),
        Arc::new(RatingBoard::new()),
        Arc::new(MetricsCollector::new().unwrap()),
    )
}

const SNAPSHOT_JSON: &str = r#"{
    "eventCode": "USCAFFFAQ1",
    "teams": [1, 2, 3, 4],
    "matches": [
        { "description": "Qualification 1", "completed": true,
          "red":  { "teams": [1, 2], "total": 30 },
          "blue": { "teams": [3, 4], "total": 70 } },
        { "description": "Qualification 2", "completed": true,
          "red":  { "teams": [1, 3], "total": 40 },
          "blue": { "teams": [2, 4], "total": 60 } },
        { "description": "Qualification 3", "completed": true,
          "red":  { "teams": [1, 4], "total": 50 },
          "blue": { "teams": [2, 3], "total": 50 } },
        { "description": "Qualification 4", "completed": false,
          "red":  { "teams": [1, 2], "total": null },
          "blue": { "teams": [3, 4], "total": null } }
    ]
}"#;

#[tokio::test]
async fn test_file_snapshot_to_rankings() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("USCAFFFAQ1.json"), SNAPSHOT_JSON).unwrap();

    let scheduler = scheduler(Arc::new(FileEventDataProvider::new(dir.path())));
    let outcome = assert_ok!(scheduler.refresh_event("USCAFFFAQ1").await);
    assert_eq!(outcome, RefreshOutcome::Applied { generation: 1 });

    let latest = scheduler.board().latest("USCAFFFAQ1").unwrap().unwrap();
    assert_eq!(latest.solver.completed_matches, 3);
    assert!(latest.solver.converged);

    let order: Vec<u32> = latest.ratings.iter().map(|r| r.team_number).collect();
    assert_eq!(order, vec![4, 3, 2, 1]);
    for (rating, expected) in latest.ratings.iter().zip([40.0, 30.0, 20.0, 10.0]) {
        assert!(
            (rating.opr - expected).abs() < 0.5,
            "team {} opr {}",
            rating.team_number,
            rating.opr
        );
    }

    let sos_one = latest.schedule_strength_for(1).unwrap();
    assert_eq!(sos_one.match_count, 3);
    assert!((sos_one.sos - (sos_one.avg_partner_opr - sos_one.avg_opponent_opr)).abs() < 1e-9);
    assert_eq!(latest.schedule_strength.len(), 4);
    assert_eq!(latest.records.len(), 4);
}

#[tokio::test]
async fn test_out_of_order_refresh_keeps_newest_fetch() {
    let provider = Arc::new(ScriptedProvider::new());
    // The first fetch is slow and returns older data
    provider.push(Duration::from_millis(200), Some(solo_event("EVT")));
    provider.push(Duration::from_millis(10), Some(additive_event("EVT")));

    let scheduler = scheduler(provider);
    let (slow, fast) = futures::join!(
        scheduler.refresh_event("EVT"),
        scheduler.refresh_event("EVT")
    );

    assert_eq!(slow.unwrap(), RefreshOutcome::Superseded { generation: 1 });
    assert_eq!(fast.unwrap(), RefreshOutcome::Applied { generation: 2 });

    let latest = scheduler.board().latest("EVT").unwrap().unwrap();
    assert_eq!(latest.generation, 2);
    assert_eq!(latest.ratings.len(), 4);
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_rankings() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push(Duration::ZERO, Some(solo_event("EVT")));
    provider.push(Duration::ZERO, None);

    let scheduler = scheduler(provider);
    assert_ok!(scheduler.refresh_event("EVT").await);
    assert_err!(scheduler.refresh_event("EVT").await);

    let latest = scheduler.board().latest("EVT").unwrap().unwrap();
    assert_eq!(latest.generation, 1);
    for (rating, expected) in latest.ratings.iter().zip([25.0, 20.0, 7.5]) {
        assert!((rating.opr - expected).abs() < 1e-9);
    }

    let status = scheduler.board().status("EVT").unwrap().unwrap();
    assert_eq!(status.last_failure.unwrap().generation, 2);
}

#[tokio::test]
async fn test_new_matches_change_rankings() {
    let provider = Arc::new(StaticEventDataProvider::with_snapshots(vec![solo_event(
        "EVT",
    )]));
    let scheduler = scheduler(provider.clone());
    assert_ok!(scheduler.refresh_event("EVT").await);

    let before = scheduler.board().latest("EVT").unwrap().unwrap();
    assert_eq!(before.ratings[0].team_number, 1);
    let luck: Vec<ScheduleLuck> = before.schedule_strength.iter().map(|s| s.luck).collect();
    assert_eq!(luck.len(), 3);

    let mut updated = solo_event("EVT");
    updated
        .matches
        .push(fixtures::played(&[3], 90.0, &[1], 0.0));
    provider.set_snapshot(updated).unwrap();
    assert_ok!(scheduler.refresh_event("EVT").await);

    let after = scheduler.board().latest("EVT").unwrap().unwrap();
    assert_eq!(after.generation, 2);
    assert_eq!(after.ratings[0].team_number, 3);
    assert!((after.ratings[0].opr - 35.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_running_service_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("USCAFFFAQ1.json"), SNAPSHOT_JSON).unwrap();

    let mut config = AppConfig::default();
    config.service.host = "127.0.0.1".to_string();
    config.service.http_port = 0;
    config.data.data_dir = dir.path().to_path_buf();
    config.data.events = vec!["USCAFFFAQ1".to_string()];
    config.refresh.interval_seconds = 0;

    let app = Arc::new(AppState::new(config).unwrap());
    let addr = app.start().await.unwrap();

    assert_eq!(
        HealthCheck::readiness_check(app.clone()).await.unwrap(),
        HealthStatus::Healthy
    );

    // Over a real socket
    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /alive HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.unwrap();
    assert!(raw.starts_with("HTTP/1.1 200"), "{}", raw);

    // And through the router
    let response = create_router(app.clone())
        .oneshot(
            Request::builder()
                .uri("/events/USCAFFFAQ1/schedule-strength")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body.as_array().unwrap().len(), 4);
    assert_eq!(body[0]["rank"], 1);

    app.stop().await;
    assert!(!app.is_running().await);
}
