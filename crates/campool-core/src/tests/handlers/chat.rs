//! Chat access and store interaction tests.

use chrono::{Duration, Utc};

use campool_storage::{ChatStore, StoreError};

use crate::handlers::{chat, rides};
use crate::tests::common::*;
use crate::ServiceError;

#[tokio::test]
async fn non_participants_are_denied_everywhere() {
    let svc = create_test_service();
    let institution = test_institution();
    let creator = test_user(institution);
    let stranger = test_user(institution);
    let ride = create_test_ride(&svc, &creator, 2).await;

    let err = chat::send_message(&svc.service, &stranger, &ride.id, b"ct", b"n")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    let err = chat::list_messages(&svc.service, &stranger, &ride.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
}

#[tokio::test]
async fn requester_and_creator_can_chat() {
    let svc = create_test_service();
    let institution = test_institution();
    let creator = test_user(institution);
    let rider = test_user(institution);
    let ride = create_test_ride(&svc, &creator, 2).await;

    rides::request_ride(&svc.service, &rider, &ride.id)
        .await
        .unwrap();

    chat::send_message(&svc.service, &rider, &ride.id, b"hi", b"n1")
        .await
        .unwrap();
    chat::send_message(&svc.service, &creator, &ride.id, b"hello", b"n2")
        .await
        .unwrap();

    let messages = chat::list_messages(&svc.service, &rider, &ride.id)
        .await
        .unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].sender_id, rider.user_id);
    assert_eq!(messages[0].ciphertext, b"hi");
    assert_eq!(messages[1].sender_id, creator.user_id);
}

#[tokio::test]
async fn chat_on_missing_ride_is_not_found() {
    let svc = create_test_service();
    let user = test_user(test_institution());

    let err = chat::send_message(&svc.service, &user, &campool_storage::RideId::new(), b"c", b"n")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound));
}

#[tokio::test]
async fn disabled_chat_blocks_send_but_not_read() {
    // Scenario B: send denied, history still visible to participants.
    let svc = create_test_service();
    let institution = test_institution();
    let creator = test_user(institution);
    let rider = test_user(institution);

    let mut req = create_ride_request(2);
    req.allow_chat = false;
    let ride = rides::create_ride(&svc.service, &creator, req).await.unwrap();
    rides::request_ride(&svc.service, &rider, &ride.id)
        .await
        .unwrap();

    // Seed pre-existing history directly in the store.
    svc.store
        .create_thread(
            &ride.id,
            &[creator.user_id, rider.user_id],
            Utc::now() + Duration::days(30),
        )
        .await
        .unwrap();
    svc.store
        .append_message(&ride.id, &creator.user_id, b"old", b"n")
        .await
        .unwrap();

    let err = chat::send_message(&svc.service, &rider, &ride.id, b"new", b"n")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Forbidden("chat disabled by creator")
    ));

    let messages = chat::list_messages(&svc.service, &rider, &ride.id)
        .await
        .unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].ciphertext, b"old");
}

#[tokio::test]
async fn reading_never_creates_a_thread() {
    let svc = create_test_service();
    let creator = test_user(test_institution());
    let ride = create_test_ride(&svc, &creator, 2).await;

    let messages = chat::list_messages(&svc.service, &creator, &ride.id)
        .await
        .unwrap();
    assert!(messages.is_empty());

    let err = svc.store.get_thread(&ride.id).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound));
}

#[tokio::test]
async fn ensure_thread_is_idempotent() {
    let svc = create_test_service();
    let creator = test_user(test_institution());
    let ride = create_test_ride(&svc, &creator, 2).await;
    let ride = svc.store_ride(&ride.id).await;

    svc.service.ensure_thread(&ride).await.unwrap();
    svc.service.ensure_thread(&ride).await.unwrap();

    let thread = svc.store.get_thread(&ride.id).await.unwrap();
    assert!(thread.messages.is_empty());
    assert_eq!(thread.participants, vec![creator.user_id]);
}

#[tokio::test]
async fn sending_refreshes_thread_deadline() {
    let svc = create_test_service();
    let creator = test_user(test_institution());
    let ride = create_test_ride(&svc, &creator, 2).await;

    chat::send_message(&svc.service, &creator, &ride.id, b"first", b"n")
        .await
        .unwrap();
    let first_deadline = svc.store.get_thread(&ride.id).await.unwrap().expires_at;

    chat::send_message(&svc.service, &creator, &ride.id, b"second", b"n")
        .await
        .unwrap();
    let second_deadline = svc.store.get_thread(&ride.id).await.unwrap().expires_at;

    assert!(second_deadline >= first_deadline);
    assert!(second_deadline >= Utc::now() + Duration::days(29));
}

#[tokio::test]
async fn authorization_rederives_from_live_ride_not_snapshot() {
    // A user in the thread's participants snapshot loses access the moment
    // they leave the ride; the snapshot is a cache, never the authority.
    let svc = create_test_service();
    let institution = test_institution();
    let creator = test_user(institution);
    let rider = test_user(institution);
    let ride = create_test_ride(&svc, &creator, 2).await;

    rides::request_ride(&svc.service, &rider, &ride.id)
        .await
        .unwrap();
    chat::send_message(&svc.service, &rider, &ride.id, b"hi", b"n")
        .await
        .unwrap();

    // Snapshot now contains the rider.
    let thread = svc.store.get_thread(&ride.id).await.unwrap();
    assert!(thread.participants.contains(&rider.user_id));

    rides::cancel_request(&svc.service, &rider, &ride.id)
        .await
        .unwrap();

    let err = chat::send_message(&svc.service, &rider, &ride.id, b"again", b"n")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
    let err = chat::list_messages(&svc.service, &rider, &ride.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
}

#[tokio::test]
async fn snapshot_tracks_membership_at_activity_time() {
    let svc = create_test_service();
    let institution = test_institution();
    let creator = test_user(institution);
    let first = test_user(institution);
    let second = test_user(institution);
    let ride = create_test_ride(&svc, &creator, 2).await;

    rides::request_ride(&svc.service, &first, &ride.id)
        .await
        .unwrap();
    chat::send_message(&svc.service, &first, &ride.id, b"one", b"n")
        .await
        .unwrap();

    rides::request_ride(&svc.service, &second, &ride.id)
        .await
        .unwrap();
    chat::send_message(&svc.service, &second, &ride.id, b"two", b"n")
        .await
        .unwrap();

    let thread = svc.store.get_thread(&ride.id).await.unwrap();
    assert!(thread.participants.contains(&second.user_id));
    assert_eq!(thread.participants.len(), 3);
}
