use std::collections::BTreeSet;

use playtogether::domain::{GameStatus, PlayRequest};
use playtogether::errors::domain::{DomainError, NotFoundKind, ValidationKind};
use playtogether::state::app_state::AppState;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::support::factory::{cluster, draft_at, memory_state, ORIGIN};

async fn requests(state: &AppState, activity: &str, n: usize) -> Vec<PlayRequest> {
    let now = OffsetDateTime::now_utc();
    let service = state.play_requests();
    let mut out = Vec::new();
    for point in cluster(n) {
        out.push(
            service
                .create(draft_at(activity, point, 5.0, now), now)
                .await
                .unwrap(),
        );
    }
    out
}

#[tokio::test]
async fn create_uses_the_first_request_for_location_and_activity() {
    let (state, _store) = memory_state();
    let reqs = requests(&state, "tennis", 3).await;
    let ids: Vec<Uuid> = reqs.iter().map(|r| r.id).collect();

    let game = state
        .games()
        .create(&ids, OffsetDateTime::now_utc())
        .await
        .unwrap();

    assert_eq!(game.version, 1);
    assert_eq!(game.value.status, GameStatus::Created);
    assert_eq!(game.value.activity, "tennis");
    assert_eq!(game.value.lat, reqs[0].lat);
    assert_eq!(game.value.lon, reqs[0].lon);
    assert_eq!(game.value.participants, ids.into_iter().collect::<BTreeSet<_>>());
}

#[tokio::test]
async fn create_collapses_duplicate_ids() {
    let (state, _store) = memory_state();
    let reqs = requests(&state, "tennis", 2).await;

    let game = state
        .games()
        .create(
            &[reqs[0].id, reqs[1].id, reqs[0].id],
            OffsetDateTime::now_utc(),
        )
        .await
        .unwrap();
    assert_eq!(game.value.participants.len(), 2);
}

#[tokio::test]
async fn create_rejects_bad_participant_lists() {
    let (state, _store) = memory_state();
    let games = state.games();
    let now = OffsetDateTime::now_utc();

    let err = games.create(&[], now).await.unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::EmptyParticipants, _)
    ));

    let err = games.create(&[Uuid::new_v4()], now).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound(NotFoundKind::PlayRequest, _)));

    let tennis = requests(&state, "tennis", 1).await;
    let chess = requests(&state, "chess", 1).await;
    let err = games
        .create(&[tennis[0].id, chess[0].id], now)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::ActivityMismatch, _)
    ));
}

#[tokio::test]
async fn confirm_is_idempotent_and_completes_to_pending() {
    let (state, _store) = memory_state();
    let reqs = requests(&state, "tennis", 2).await;
    let games = state.games();
    let game = games
        .create(&[reqs[0].id, reqs[1].id], OffsetDateTime::now_utc())
        .await
        .unwrap();
    let game_id = game.value.id;

    let once = games.confirm(game_id, reqs[0].id).await.unwrap();
    assert_eq!(once.version, 2);
    assert_eq!(once.value.status, GameStatus::Created);
    assert!(once.value.confirmed.contains(&reqs[0].id));

    let twice = games.confirm(game_id, reqs[0].id).await.unwrap();
    assert_eq!(twice.version, 2, "repeat confirmation must not bump the version");
    assert_eq!(twice.value.confirmed, once.value.confirmed);

    let done = games.confirm(game_id, reqs[1].id).await.unwrap();
    assert_eq!(done.version, 3);
    assert_eq!(done.value.status, GameStatus::Pending);
    assert_eq!(done.value.confirmed, done.value.participants);
}

#[tokio::test]
async fn confirm_rejects_strangers_and_unknown_games() {
    let (state, _store) = memory_state();
    let reqs = requests(&state, "tennis", 2).await;
    let games = state.games();
    let game = games
        .create(&[reqs[0].id, reqs[1].id], OffsetDateTime::now_utc())
        .await
        .unwrap();

    let err = games
        .confirm(game.value.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::NotAParticipant, _)
    ));

    let err = games.confirm(Uuid::new_v4(), reqs[0].id).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound(NotFoundKind::Game, _)));

    // failed confirmations leave the game alone
    let stored = games.get(game.value.id).await.unwrap();
    assert_eq!(stored.version, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_confirms_all_land() {
    let (state, _store) = memory_state();
    let reqs = requests(&state, "volleyball", 4).await;
    let ids: Vec<Uuid> = reqs.iter().map(|r| r.id).collect();
    let game = state
        .games()
        .create(&ids, OffsetDateTime::now_utc())
        .await
        .unwrap();
    let game_id = game.value.id;

    let handles: Vec<_> = ids
        .iter()
        .map(|id| {
            let games = state.games();
            let id = *id;
            tokio::spawn(async move { games.confirm(game_id, id).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = state.games().get(game_id).await.unwrap();
    assert_eq!(stored.value.confirmed.len(), 4);
    assert_eq!(stored.value.status, GameStatus::Pending);
    assert_eq!(stored.version, 5, "one version bump per confirmation");
}

#[tokio::test]
async fn activate_requires_pending() {
    let (state, _store) = memory_state();
    let reqs = requests(&state, "tennis", 2).await;
    let games = state.games();
    let game = games
        .create(&[reqs[0].id, reqs[1].id], OffsetDateTime::now_utc())
        .await
        .unwrap();
    let game_id = game.value.id;

    let err = games.activate(game_id).await.unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::PhaseMismatch, _)
    ));

    games.confirm(game_id, reqs[0].id).await.unwrap();
    games.confirm(game_id, reqs[1].id).await.unwrap();
    let active = games.activate(game_id).await.unwrap();
    assert_eq!(active.value.status, GameStatus::Active);

    let again = games.activate(game_id).await.unwrap();
    assert_eq!(again.version, active.version);
}

#[tokio::test]
async fn pending_games_are_closed_to_new_pings() {
    let (state, _store) = memory_state();
    let reqs = requests(&state, "tennis", 2).await;
    let games = state.games();
    let game = games
        .create(&[reqs[0].id, reqs[1].id], OffsetDateTime::now_utc())
        .await
        .unwrap();
    games.confirm(game.value.id, reqs[0].id).await.unwrap();
    games.confirm(game.value.id, reqs[1].id).await.unwrap();

    let now = OffsetDateTime::now_utc();
    let outcome = state
        .matching()
        .ingest_ping(draft_at("tennis", ORIGIN.offset(0.002, 0.0), 5.0, now), now)
        .await
        .unwrap();

    // enough players nearby for a fresh game, but not the confirmed one
    assert!(outcome.found);
    assert_ne!(outcome.games[0].value.id, game.value.id);
    let pending = games.get(game.value.id).await.unwrap();
    assert_eq!(pending.value.participants.len(), 2);
}

#[tokio::test]
async fn list_for_requester_returns_their_games() {
    let (state, _store) = memory_state();
    let reqs = requests(&state, "tennis", 2).await;
    let games = state.games();
    let game = games
        .create(&[reqs[0].id, reqs[1].id], OffsetDateTime::now_utc())
        .await
        .unwrap();

    let listed = games.list_for_requester(reqs[1].requester_id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].value.id, game.value.id);

    assert!(games
        .list_for_requester(Uuid::new_v4())
        .await
        .unwrap()
        .is_empty());
}
