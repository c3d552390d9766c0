use beacon_core::{PeerId, SessionDescription, SignalMessage, SignalPayload};

use crate::integration::{create_test_room, init_tracing};
use crate::utils::{lowest_id, settle};

#[tokio::test]
async fn test_negotiation_for_someone_else_is_dropped() {
    init_tracing();

    let t = create_test_room().await;
    let remote = lowest_id(1);
    let someone_else = PeerId::new();

    t.room
        .deliver(SignalMessage::negotiation(
            remote,
            someone_else,
            SignalPayload::Sdp(SessionDescription::offer("not-for-us")),
        ))
        .await
        .unwrap();
    t.room
        .deliver(SignalMessage::join_reply(remote, someone_else))
        .await
        .unwrap();
    settle(&t.room).await;

    assert_eq!(t.connections.created_count(), 0);
    assert!(t.room.state().peers.is_empty());
    assert!(t.signaling.published().await.is_empty());
}
