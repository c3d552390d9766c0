use beacon_core::SignalMessage;

use crate::integration::{create_test_room, init_tracing};
use crate::utils::{STATE_TIMEOUT_MS, lowest_id, settle, wait_for_state, wait_until};

#[tokio::test]
async fn test_close_closes_every_session_once() {
    init_tracing();

    let t = create_test_room().await;
    let remotes = [lowest_id(1), lowest_id(2), lowest_id(3)];

    for remote in remotes {
        t.room.deliver(SignalMessage::join(remote)).await.unwrap();
    }
    assert!(wait_for_state(&t.room, |s| s.peers.len() == 3, STATE_TIMEOUT_MS).await);

    t.room.close().await.expect("close failed");

    let state = t.room.state();
    assert!(state.closed);
    assert!(state.peers.is_empty());
    assert!(state.streams.is_empty());

    assert!(wait_until(|| t.connections.total_closes() == 3, STATE_TIMEOUT_MS).await);
    for connection in t.connections.created() {
        assert_eq!(connection.close_count(), 1);
    }
    for remote in remotes {
        assert!(t.observer.has_leave(&remote).await);
    }
}

#[tokio::test]
async fn test_closed_room_ignores_signaling_until_join() {
    init_tracing();

    let t = create_test_room().await;
    t.room.close().await.unwrap();

    t.room.deliver(SignalMessage::join(lowest_id(1))).await.unwrap();
    settle(&t.room).await;
    assert_eq!(t.connections.created_count(), 0);

    t.room.join().await.expect("join failed");
    assert!(!t.room.state().closed);

    t.room.deliver(SignalMessage::join(lowest_id(1))).await.unwrap();
    assert!(wait_for_state(&t.room, |s| s.peers.len() == 1, STATE_TIMEOUT_MS).await);
}

#[tokio::test]
async fn test_close_peer_evicts_one_session() {
    init_tracing();

    let t = create_test_room().await;
    let (keep, gone) = (lowest_id(1), lowest_id(2));

    t.room.deliver(SignalMessage::join(keep)).await.unwrap();
    t.room.deliver(SignalMessage::join(gone)).await.unwrap();
    assert!(wait_for_state(&t.room, |s| s.peers.len() == 2, STATE_TIMEOUT_MS).await);

    assert!(t.room.close_peer(gone).await.unwrap());
    assert!(!t.room.close_peer(gone).await.unwrap());

    assert_eq!(t.room.state().peer_ids(), vec![keep]);
    let dropped = t.connections.for_remote(&gone)[0].clone();
    assert!(wait_until(|| dropped.close_count() == 1, STATE_TIMEOUT_MS).await);
    assert_eq!(t.connections.for_remote(&keep)[0].close_count(), 0);
}
