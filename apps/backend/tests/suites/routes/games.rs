// /api/games: create, fetch with ETag, confirm, activate, list.

use actix_web::http::header::{ETAG, IF_NONE_MATCH};
use actix_web::http::StatusCode;
use actix_web::test;
use playtogether::http::etag::game_etag;
use playtogether::state::app_state::AppState;
use serde_json::{json, Value};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::common::assert_problem_details_structure;
use crate::support::app_builder::create_test_app;
use crate::support::factory::{cluster, draft_at, memory_state};

async fn seed_requests(state: &AppState, n: usize) -> Vec<(Uuid, Uuid)> {
    let now = OffsetDateTime::now_utc();
    let mut out = Vec::new();
    for point in cluster(n) {
        let stored = state
            .play_requests()
            .create(draft_at("tennis", point, 5.0, now), now)
            .await
            .unwrap();
        out.push((stored.id, stored.requester_id));
    }
    out
}

#[actix_web::test]
async fn create_then_confirm_moves_the_etag() {
    let (state, _store) = memory_state();
    let seeded = seed_requests(&state, 2).await;
    let app = create_test_app(state).await;

    let req = test::TestRequest::post()
        .uri("/api/games")
        .set_json(json!({ "participants": [seeded[0].0, seeded[1].0] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created_etag = resp.headers().get(ETAG).unwrap().to_str().unwrap().to_string();
    let game: Value = test::read_body_json(resp).await;
    let game_id = Uuid::parse_str(game["id"].as_str().unwrap()).unwrap();
    assert_eq!(created_etag, game_etag(game_id, 1));

    for (i, (request_id, _)) in seeded.iter().enumerate() {
        let req = test::TestRequest::post()
            .uri(&format!("/api/games/{game_id}/confirm"))
            .set_json(json!({ "participant_id": request_id }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let expected = game_etag(game_id, i as i32 + 2);
        assert_eq!(resp.headers().get(ETAG).unwrap().to_str().unwrap(), expected);
    }

    let req = test::TestRequest::get()
        .uri(&format!("/api/games/{game_id}"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], json!("PENDING"));
    assert_eq!(body["version"], json!(3));

    let req = test::TestRequest::post()
        .uri(&format!("/api/games/{game_id}/activate"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], json!("ACTIVE"));
}

#[actix_web::test]
async fn get_honours_if_none_match() {
    let (state, _store) = memory_state();
    let seeded = seed_requests(&state, 2).await;
    let game = state
        .games()
        .create(&[seeded[0].0, seeded[1].0], OffsetDateTime::now_utc())
        .await
        .unwrap();
    let app = create_test_app(state).await;
    let etag = game_etag(game.value.id, game.version);

    let req = test::TestRequest::get()
        .uri(&format!("/api/games/{}", game.value.id))
        .insert_header((IF_NONE_MATCH, etag.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(resp.headers().get(ETAG).unwrap().to_str().unwrap(), etag);

    let req = test::TestRequest::get()
        .uri(&format!("/api/games/{}", game.value.id))
        .insert_header((IF_NONE_MATCH, game_etag(game.value.id, 0)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn confirm_by_a_stranger_is_rejected() {
    let (state, _store) = memory_state();
    let seeded = seed_requests(&state, 2).await;
    let game = state
        .games()
        .create(&[seeded[0].0, seeded[1].0], OffsetDateTime::now_utc())
        .await
        .unwrap();
    let app = create_test_app(state).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/games/{}/confirm", game.value.id))
        .set_json(json!({ "participant_id": Uuid::new_v4() }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_structure(resp, 400, "NOT_A_PARTICIPANT", None).await;
}

#[actix_web::test]
async fn activate_before_everyone_confirms_is_a_phase_mismatch() {
    let (state, _store) = memory_state();
    let seeded = seed_requests(&state, 2).await;
    let game = state
        .games()
        .create(&[seeded[0].0, seeded[1].0], OffsetDateTime::now_utc())
        .await
        .unwrap();
    let app = create_test_app(state).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/games/{}/activate", game.value.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_structure(resp, 400, "PHASE_MISMATCH", None).await;
}

#[actix_web::test]
async fn create_with_no_participants_is_rejected() {
    let (state, _store) = memory_state();
    let app = create_test_app(state).await;

    let req = test::TestRequest::post()
        .uri("/api/games")
        .set_json(json!({ "participants": [] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_structure(resp, 400, "EMPTY_PARTICIPANTS", None).await;
}

#[actix_web::test]
async fn list_returns_games_for_the_requester() {
    let (state, _store) = memory_state();
    let seeded = seed_requests(&state, 2).await;
    let game = state
        .games()
        .create(&[seeded[0].0, seeded[1].0], OffsetDateTime::now_utc())
        .await
        .unwrap();
    let app = create_test_app(state).await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/games?requester_id={}", seeded[0].1))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let games = body.as_array().unwrap();
    assert_eq!(games.len(), 1);
    assert_eq!(games[0]["id"], json!(game.value.id));
}
