use actix_web::http::StatusCode;
use actix_web::test;
use playtogether::config::db::{DbKind, DbProfile};
use playtogether::infra::state::build_state;
use serde_json::{json, Value};

use crate::support::app_builder::create_test_app;
use crate::support::factory::memory_state;

#[actix_web::test]
async fn health_without_database_reports_memory() {
    let (state, _store) = memory_state();
    let app = create_test_app(state).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;

    assert_eq!(body["status"], json!("ok"));
    assert_eq!(body["db"], json!("memory"));
    assert_eq!(body["migrations"], json!("n/a"));
    assert!(body.get("db_error").is_none());
    assert!(body["app_version"].is_string());
}

#[actix_web::test]
async fn health_with_sqlite_reports_the_latest_migration() {
    let state = build_state()
        .with_db(DbProfile::Test, DbKind::SqliteMemory)
        .build()
        .await
        .expect("sqlite state");
    let app = create_test_app(state).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["db"], json!("ok"));
    let migration = body["migrations"].as_str().unwrap();
    assert!(
        migration.starts_with("m2026"),
        "unexpected migration name {migration}"
    );
}
