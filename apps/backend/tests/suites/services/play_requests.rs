use playtogether::errors::domain::{DomainError, NotFoundKind, ValidationKind};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::support::factory::{draft_at, draft_for, memory_state, ORIGIN};

#[tokio::test]
async fn list_puts_the_caller_first_then_compatible_neighbours() {
    let (state, _store) = memory_state();
    let service = state.play_requests();
    let now = OffsetDateTime::now_utc();

    let me = draft_at("Tennis", ORIGIN, 5.0, now);
    let my_requester = me.requester_id;
    let mine = service.create(me, now).await.unwrap();
    let near = service
        .create(draft_at("tennis", ORIGIN.offset(0.01, 0.0), 5.0, now), now)
        .await
        .unwrap();
    // about 55 km away
    service
        .create(draft_at("tennis", ORIGIN.offset(0.5, 0.0), 5.0, now), now)
        .await
        .unwrap();
    service
        .create(draft_at("chess", ORIGIN, 5.0, now), now)
        .await
        .unwrap();

    let listed = service.list(my_requester, " TENNIS", now).await.unwrap();
    let ids: Vec<Uuid> = listed.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![mine.id, near.id]);
}

#[tokio::test]
async fn candidate_range_decides_reachability() {
    let (state, _store) = memory_state();
    let service = state.play_requests();
    let now = OffsetDateTime::now_utc();

    let me = draft_at("tennis", ORIGIN, 20.0, now);
    let my_requester = me.requester_id;
    service.create(me, now).await.unwrap();
    // roughly 11 km north with only a 2 km radius of its own
    service
        .create(draft_at("tennis", ORIGIN.offset(0.1, 0.0), 2.0, now), now)
        .await
        .unwrap();

    let listed = service.list(my_requester, "tennis", now).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn list_without_an_own_request_is_not_found() {
    let (state, _store) = memory_state();
    let err = state
        .play_requests()
        .list(Uuid::new_v4(), "tennis", OffsetDateTime::now_utc())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(NotFoundKind::PlayRequest, _)));
}

#[tokio::test]
async fn create_replaces_the_request_for_the_same_activity() {
    let (state, _store) = memory_state();
    let service = state.play_requests();
    let now = OffsetDateTime::now_utc();
    let requester = Uuid::new_v4();

    let first = service
        .create(draft_for(requester, "tennis", ORIGIN, 5.0, now), now)
        .await
        .unwrap();
    let mut moved = draft_for(requester, "tennis", ORIGIN.offset(0.01, 0.01), 8.0, now);
    moved.expires_at = now + Duration::hours(4);
    let second = service.create(moved, now).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.range_km, 8.0);
    assert_eq!(second.expires_at, now + Duration::hours(4));

    let other = service
        .create(draft_for(requester, "chess", ORIGIN, 5.0, now), now)
        .await
        .unwrap();
    assert_ne!(other.id, first.id);
}

#[tokio::test]
async fn create_rejects_an_inverted_window() {
    let (state, _store) = memory_state();
    let now = OffsetDateTime::now_utc();
    let mut draft = draft_at("tennis", ORIGIN, 5.0, now);
    draft.starts_at = Some(draft.expires_at + Duration::minutes(1));

    let err = state.play_requests().create(draft, now).await.unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::InvalidWindow, _)
    ));
}
