#![cfg(feature = "http_api")]

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use chrono::NaiveDate;
use risk_schedule::{
    Activity, Finding, PredecessorLink, Project, ProjectMetadata, ScheduleSummary, WorkCalendar,
    http_api,
};
use serde_json::json;
use tower::util::ServiceExt;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn seeded_router() -> axum::Router {
    let start = d(2025, 1, 6);
    let metadata = ProjectMetadata {
        project_start_date: start,
        status_date: start,
        ..ProjectMetadata::default()
    };
    let mut project = Project::with_metadata(metadata);
    project.upsert_calendar(WorkCalendar::continuous(1, "Continuous").as_default());
    project.upsert_activity(Activity::new(1, "A", 5));
    project.upsert_activity(
        Activity::new(2, "B", 3).with_predecessor(PredecessorLink::finish_to_start(1)),
    );
    http_api::router(http_api::AppState::new(project))
}

#[tokio::test]
async fn health_endpoint_responds() {
    let app = seeded_router();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn activity_lifecycle_via_http_api() {
    let app = seeded_router();
    let activity = Activity::new(3, "HTTP Demo", 4);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/activities")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&activity).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/activities/3")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let fetched: Activity = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(fetched.name, "HTTP Demo");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/activities/3")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/activities/3")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn schedule_endpoint_returns_a_summary() {
    let app = seeded_router();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/schedule")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let summary: ScheduleSummary = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(summary.activity_count, 2);
    assert_eq!(summary.critical_count, 2);
    assert_eq!(summary.project_finish, Some(d(2025, 1, 14)));
}

#[tokio::test]
async fn check_endpoint_returns_findings() {
    let app = seeded_router();

    // Schedule first so temporal checks have dates to look at
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/schedule")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let config = json!({
        "long_lag_days": 10,
        "large_margin_days": 5,
        "long_duration_days": 20
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/check")
                .header("content-type", "application/json")
                .body(Body::from(config.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let findings: Vec<Finding> = serde_json::from_slice(&bytes).unwrap();
    // A has no predecessor, B is an open end
    assert!(findings.iter().any(|f| f.activity_id == 1));
    assert!(findings.iter().any(|f| f.activity_id == 2));
}

#[tokio::test]
async fn simulate_endpoint_runs_a_deterministic_simulation() {
    let app = seeded_router();
    let payload = json!({
        "iterations": 100,
        "seed": 42,
        "distributions": [
            {
                "activity_id": 1,
                "distribution": { "type": "triangular", "min": 2.0, "most_likely": 5.0, "max": 10.0 }
            }
        ]
    });

    let body_json = payload.to_string();
    let build_request = |body: String| {
        Request::builder()
            .method("POST")
            .uri("/simulate")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    };

    let response = app
        .clone()
        .oneshot(build_request(body_json.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let result: risk_schedule::SimulationResult = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(result.iterations_completed, 100);
    assert_eq!(result.criticality_index[&1], 100.0);

    let response = app.oneshot(build_request(body_json)).await.unwrap();
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let again: risk_schedule::SimulationResult = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(result, again);
}
