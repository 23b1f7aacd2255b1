//! Integration tests for `POST /api/v1/jobs/{job}`.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, NaiveDate, Utc};
use common::{body_json, post};
use crewline_core::recipient::Recipient;
use crewline_core::roles::ROLE_ADMIN;
use crewline_core::types::DbId;
use crewline_db::models::timesheet::{TimesheetSubmission, TIMESHEET_STATUS_SUBMITTED};
use crewline_events::MemoryBackend;

#[tokio::test]
async fn admin_digest_creates_one_request_per_admin() {
    let backend = MemoryBackend::new();
    let mut admin = Recipient::empty(DbId::new_v4());
    admin.display_name = "Dana".into();
    admin.role = ROLE_ADMIN.into();
    backend.insert_user(admin.clone()).unwrap();
    backend
        .insert_submission(TimesheetSubmission {
            id: DbId::new_v4(),
            foreman_id: DbId::new_v4(),
            job_name: Some("Dock 4".into()),
            week_start: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            status: TIMESHEET_STATUS_SUBMITTED.into(),
            created_at: Utc::now() - Duration::days(4),
            submitted_at: Some(Utc::now() - Duration::days(3)),
        })
        .unwrap();

    let response = post(common::build_test_app(&backend), "/api/v1/jobs/admin-digest").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["job"], "admin-digest");
    assert_eq!(json["data"]["candidates"], 1);
    assert_eq!(json["data"]["created"], 1);

    let stored = backend.notifications().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].user_id, admin.id);
    assert_eq!(stored[0].payload["count"], 1);
}

#[tokio::test]
async fn job_with_nothing_to_do_reports_zero() {
    let backend = MemoryBackend::new();
    let response =
        post(common::build_test_app(&backend), "/api/v1/jobs/certificate-expiry").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["candidates"], 0);
    assert_eq!(json["data"]["created"], 0);
    assert_eq!(backend.audit_events().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_job_returns_400() {
    let backend = MemoryBackend::new();
    let response = post(common::build_test_app(&backend), "/api/v1/jobs/weekly-report").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}
