use std::sync::Arc;

use beacon_core::{ConnectionState, PeerId};
use beacon_room::room::NoopObserver;
use beacon_room::{LocalBus, RoomConfig, RoomCoordinator, RoomState};

use crate::integration::init_tracing;
use crate::utils::{FakeConnectionFactory, STATE_TIMEOUT_MS, TestObserver, wait_for_state};

fn connected_to(state: &RoomState, other: PeerId) -> bool {
    state.peers.len() == 1
        && state.peers[0].remote_id == other
        && state
            .peers
            .iter()
            .all(|p| p.connection_state == ConnectionState::Connected)
        && state.streams.len() == 1
}

#[tokio::test]
async fn test_two_rooms_on_local_bus_connect() {
    init_tracing();

    let bus = LocalBus::new();
    let connections = FakeConnectionFactory::new();
    let observer = TestObserver::new();

    let a = RoomCoordinator::connect(
        RoomConfig::new("lab").with_nickname("alice"),
        Arc::new(bus.clone()),
        Arc::new(connections.clone()),
        None,
        Arc::new(observer.clone()),
    )
    .await
    .expect("Failed to connect room a");
    let b = RoomCoordinator::connect(
        RoomConfig::new("lab").with_nickname("bob"),
        Arc::new(bus.clone()),
        Arc::new(connections.clone()),
        None,
        Arc::new(NoopObserver),
    )
    .await
    .expect("Failed to connect room b");

    a.join().await.expect("a failed to join");
    b.join().await.expect("b failed to join");

    let (a_id, b_id) = (a.local_id(), b.local_id());
    assert!(wait_for_state(&a, |s| connected_to(s, b_id), STATE_TIMEOUT_MS).await);
    assert!(wait_for_state(&b, |s| connected_to(s, a_id), STATE_TIMEOUT_MS).await);
    assert!(observer.wait_for_connected(&b_id, STATE_TIMEOUT_MS).await);
}

#[tokio::test]
async fn test_rooms_with_other_names_stay_apart() {
    init_tracing();

    let bus = LocalBus::new();
    let connections = FakeConnectionFactory::new();

    let a = RoomCoordinator::connect(
        RoomConfig::new("lab"),
        Arc::new(bus.clone()),
        Arc::new(connections.clone()),
        None,
        Arc::new(NoopObserver),
    )
    .await
    .unwrap();
    let b = RoomCoordinator::connect(
        RoomConfig::new("kitchen"),
        Arc::new(bus.clone()),
        Arc::new(connections.clone()),
        None,
        Arc::new(NoopObserver),
    )
    .await
    .unwrap();

    a.join().await.unwrap();
    b.join().await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    assert_eq!(connections.created_count(), 0);
    assert!(a.state().peers.is_empty());
    assert!(b.state().peers.is_empty());
}
