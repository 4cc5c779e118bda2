use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use playtogether::config::db::{DbKind, DbOwner, DbProfile};
use playtogether::domain::{area, GameDraft, GameStatus, Mutation};
use playtogether::errors::domain::{DomainError, NotFoundKind};
use playtogether::infra::db::bootstrap_db;
use playtogether::repos::{
    update_with_retry, ConditionalStore, ExpiryReport, MatchStore, SeaStore, WriteOutcome,
};
use playtogether::services::ExpirySweeper;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::support::factory::{cluster, draft_at, draft_for, fast_retry, seed_request, ORIGIN};

async fn store() -> SeaStore {
    let conn = bootstrap_db(DbKind::SqliteMemory, DbProfile::Test, DbOwner::App)
        .await
        .expect("sqlite memory bootstrap");
    SeaStore::new(conn)
}

fn draft(participants: &[Uuid]) -> GameDraft {
    GameDraft {
        activity: "tennis".into(),
        location: ORIGIN,
        participants: participants.iter().copied().collect::<BTreeSet<_>>(),
    }
}

#[tokio::test]
async fn upsert_is_keyed_by_requester_and_activity() {
    let store = store().await;
    let now = OffsetDateTime::now_utc();
    let requester = Uuid::new_v4();

    let first = store
        .upsert_play_request(&draft_for(requester, "tennis", ORIGIN, 5.0, now), now)
        .await
        .unwrap();
    let moved = ORIGIN.offset(0.01, 0.0);
    let second = store
        .upsert_play_request(&draft_for(requester, "tennis", moved, 7.0, now), now)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    let stored = store
        .find_play_request_for(requester, "tennis")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.lat, moved.lat);
    assert_eq!(stored.range_km, 7.0);
}

#[tokio::test]
async fn requests_in_area_come_from_the_rectangle_query() {
    let store = store().await;
    let now = OffsetDateTime::now_utc();
    let near = store
        .upsert_play_request(&draft_at("tennis", ORIGIN.offset(0.01, 0.0), 5.0, now), now)
        .await
        .unwrap();
    store
        .upsert_play_request(&draft_at("tennis", ORIGIN.offset(1.0, 0.0), 5.0, now), now)
        .await
        .unwrap();

    let area = area::calculate(ORIGIN, 5.0).unwrap();
    let found = store.play_requests_in_area("tennis", &area).await.unwrap();
    assert_eq!(found.iter().map(|r| r.id).collect::<Vec<_>>(), vec![near.id]);
}

#[tokio::test]
async fn created_game_reads_back_with_participants() {
    let store = store().await;
    let (a, b) = seed_pair(&store).await;

    let created = store
        .create_game(&draft(&[a, b]), OffsetDateTime::now_utc())
        .await
        .unwrap();
    assert_eq!(created.version, 1);

    let read = store.read(&created.value.id).await.unwrap().unwrap();
    assert_eq!(read.version, 1);
    assert_eq!(read.value.status, GameStatus::Created);
    assert_eq!(read.value.participants, BTreeSet::from([a, b]));
    assert!(read.value.confirmed.is_empty());
}

#[tokio::test]
async fn write_if_checks_the_version() {
    let store = store().await;
    let (a, b) = seed_pair(&store).await;
    let game = store
        .create_game(&draft(&[a, b]), OffsetDateTime::now_utc())
        .await
        .unwrap();
    let id = game.value.id;

    let mut edited = game.value.clone();
    assert_eq!(edited.confirm(a).unwrap(), Mutation::Changed);

    match store.write_if(&id, &edited, 1).await.unwrap() {
        WriteOutcome::Written(stored) => {
            assert_eq!(stored.version, 2);
            assert_eq!(stored.value.confirmed, BTreeSet::from([a]));
        }
        WriteOutcome::Stale => panic!("first write should land"),
    }

    // same expected version again: someone else already moved it on
    let outcome = store.write_if(&id, &edited, 1).await.unwrap();
    assert_eq!(outcome, WriteOutcome::Stale);

    let err = store.write_if(&Uuid::new_v4(), &edited, 2).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound(NotFoundKind::Game, _)));
}

#[tokio::test]
async fn write_if_targets_the_key_not_the_value_id() {
    let store = store().await;
    let (a, b) = seed_pair(&store).await;
    let game = store
        .create_game(&draft(&[a, b]), OffsetDateTime::now_utc())
        .await
        .unwrap();

    let mut edited = game.value.clone();
    edited.confirm(a).unwrap();
    let ghost = Uuid::new_v4();

    for version in [1, 2] {
        let err = store.write_if(&ghost, &edited, version).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(NotFoundKind::Game, _)));
    }
    assert!(store.read(&ghost).await.unwrap().is_none());

    let untouched = store.read(&game.value.id).await.unwrap().unwrap();
    assert_eq!(untouched.version, 1);
    assert!(untouched.value.confirmed.is_empty());
}

#[tokio::test]
async fn retry_loop_completes_the_game_on_the_database() {
    let store = store().await;
    let (a, b) = seed_pair(&store).await;
    let game = store
        .create_game(&draft(&[a, b]), OffsetDateTime::now_utc())
        .await
        .unwrap();
    let id = game.value.id;

    for participant in [a, b] {
        update_with_retry(&store, &id, &fast_retry(3), |g| g.confirm(participant))
            .await
            .unwrap();
    }

    let done = store.read(&id).await.unwrap().unwrap();
    assert_eq!(done.value.status, GameStatus::Pending);
    assert_eq!(done.version, 3);
}

#[tokio::test]
async fn open_games_exclude_pending_ones() {
    let store = store().await;
    let now = OffsetDateTime::now_utc();
    let (a, b) = seed_pair(&store).await;
    let open = store.create_game(&draft(&[a]), now).await.unwrap();
    let closing = store.create_game(&draft(&[b]), now).await.unwrap();
    update_with_retry(&store, &closing.value.id, &fast_retry(3), |g| g.confirm(b))
        .await
        .unwrap();

    let area = area::calculate(ORIGIN, 5.0).unwrap();
    let found = store.open_games_in_area("tennis", &area).await.unwrap();
    assert_eq!(
        found.iter().map(|g| g.value.id).collect::<Vec<_>>(),
        vec![open.value.id]
    );
}

#[tokio::test]
async fn games_for_requester_follow_their_requests() {
    let store = store().await;
    let now = OffsetDateTime::now_utc();
    let requester = Uuid::new_v4();
    let mine = store
        .upsert_play_request(&draft_for(requester, "tennis", ORIGIN, 5.0, now), now)
        .await
        .unwrap();
    let (other, _) = seed_pair(&store).await;
    let game = store.create_game(&draft(&[mine.id, other]), now).await.unwrap();

    let listed = store.games_for_requester(requester).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].value.id, game.value.id);
    assert!(store
        .games_for_requester(Uuid::new_v4())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn expiry_cascades_through_games_in_one_pass() {
    let store = store().await;
    let now = OffsetDateTime::now_utc();
    let points = cluster(3);
    let soon = now + Duration::minutes(10);
    let later = now + Duration::hours(3);

    let a = seed_request(&store, "tennis", points[0], soon, now).await;
    let b = seed_request(&store, "tennis", points[1], soon, now).await;
    let c = seed_request(&store, "tennis", points[2], later, now).await;
    let survivor = store.create_game(&draft(&[a.id, c.id]), now).await.unwrap();
    let doomed = store.create_game(&draft(&[a.id, b.id]), now).await.unwrap();

    let sweeper = ExpirySweeper::new(Arc::new(store.clone()), StdDuration::from_secs(60));
    let report = sweeper.tick(now + Duration::hours(1)).await.unwrap();

    assert_eq!(
        report,
        ExpiryReport {
            expired_requests: 2,
            games_updated: 1,
            games_deleted: 1,
        }
    );
    let kept = store.read(&survivor.value.id).await.unwrap().unwrap();
    assert_eq!(kept.value.participants, BTreeSet::from([c.id]));
    assert_eq!(kept.version, 2);
    assert!(store.read(&doomed.value.id).await.unwrap().is_none());
    assert!(store.find_play_request(a.id).await.unwrap().is_none());

    // nothing left to do
    let again = sweeper.tick(now + Duration::hours(1)).await.unwrap();
    assert_eq!(again, ExpiryReport::default());
}

async fn seed_pair(store: &SeaStore) -> (Uuid, Uuid) {
    let now = OffsetDateTime::now_utc();
    let points = cluster(2);
    let a = seed_request(store, "tennis", points[0], now + Duration::hours(1), now).await;
    let b = seed_request(store, "tennis", points[1], now + Duration::hours(1), now).await;
    (a.id, b.id)
}
