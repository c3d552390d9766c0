use beacon_core::{ConnectionState, Role, SdpType, SignalMessage};

use crate::integration::{create_test_room, init_tracing};
use crate::utils::{FakeCall, STATE_TIMEOUT_MS, highest_id, settle, wait_for_state, wait_until};

#[tokio::test]
async fn test_join_from_higher_remote_sends_offer() {
    init_tracing();

    let t = create_test_room().await;
    let remote = highest_id(0);

    t.room.deliver(SignalMessage::join(remote)).await.unwrap();

    let listed = wait_for_state(
        &t.room,
        |s| {
            s.peer(remote).is_some_and(|p| {
                p.role == Role::Initiator && p.connection_state == ConnectionState::Negotiating
            })
        },
        STATE_TIMEOUT_MS,
    )
    .await;
    assert!(listed, "Initiator should be listed once the offer is out");

    let offer = t.signaling.sdp_for(&remote, SdpType::Offer).await;
    assert!(offer.is_some_and(|sdp| sdp.starts_with("fake-offer")));
    assert_eq!(t.signaling.join_replies_to(&remote).await, 0);

    let connection = &t.connections.for_remote(&remote)[0];
    assert_eq!(
        connection.calls(),
        vec![FakeCall::CreateOffer, FakeCall::SetLocal(SdpType::Offer)]
    );
}

#[tokio::test]
async fn test_repeated_join_during_negotiation_keeps_session() {
    init_tracing();

    let t = create_test_room().await;
    let remote = highest_id(0);

    t.room.deliver(SignalMessage::join(remote)).await.unwrap();
    t.room.deliver(SignalMessage::join(remote)).await.unwrap();
    t.room
        .deliver(SignalMessage::join_reply(remote, t.room.local_id()))
        .await
        .unwrap();
    settle(&t.room).await;

    assert_eq!(t.connections.created_count(), 1);
    assert_eq!(t.connections.total_closes(), 0);
}

#[tokio::test]
async fn test_join_reply_after_reannounce_restarts_negotiation() {
    init_tracing();

    let t = create_test_room().await;
    let local = t.room.local_id();
    let remote = highest_id(0);

    t.room.deliver(SignalMessage::join(remote)).await.unwrap();
    assert!(wait_for_state(&t.room, |s| s.peer(remote).is_some(), STATE_TIMEOUT_MS).await);

    // The remote answers our new announce with a fresh responder.
    t.room.join().await.unwrap();
    t.room
        .deliver(SignalMessage::join_reply(remote, local))
        .await
        .unwrap();

    assert!(wait_until(|| t.connections.created_count() == 2, STATE_TIMEOUT_MS).await);
    let offers = t
        .signaling
        .wait_for_published(
            |m| m.to == Some(remote) && matches!(&m.body, beacon_core::SignalBody::Negotiation(_)),
            STATE_TIMEOUT_MS,
        )
        .await;
    assert!(offers);

    let old = t.connections.for_remote(&remote)[0].clone();
    assert!(wait_until(|| old.close_count() == 1, STATE_TIMEOUT_MS).await);
    assert!(
        wait_for_state(
            &t.room,
            |s| s.peers.len() == 1 && s.peer(remote).is_some(),
            STATE_TIMEOUT_MS
        )
        .await
    );
}

#[tokio::test]
async fn test_join_with_newer_epoch_replaces_fresh_session() {
    init_tracing();

    let t = create_test_room().await;
    let remote = highest_id(0);

    t.room.deliver(SignalMessage::join(remote)).await.unwrap();
    assert!(wait_for_state(&t.room, |s| s.peer(remote).is_some(), STATE_TIMEOUT_MS).await);

    // The remote closed its room and announced itself again.
    t.room
        .deliver(SignalMessage::join(remote).with_epoch(1))
        .await
        .unwrap();

    assert!(wait_until(|| t.connections.created_count() == 2, STATE_TIMEOUT_MS).await);
    let old = t.connections.for_remote(&remote)[0].clone();
    assert!(wait_until(|| old.close_count() == 1, STATE_TIMEOUT_MS).await);

    let fresh = t.connections.for_remote(&remote)[1].clone();
    assert!(wait_until(|| fresh.calls().contains(&FakeCall::CreateOffer), STATE_TIMEOUT_MS).await);

    // A repeat of the same announce does not restart it again.
    t.room
        .deliver(SignalMessage::join(remote).with_epoch(1))
        .await
        .unwrap();
    settle(&t.room).await;
    assert_eq!(t.connections.created_count(), 2);
}
