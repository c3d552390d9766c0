use std::sync::Arc;

use beacon_core::ConnectionState;
use beacon_room::room::NoopObserver;
use beacon_room::{LocalBus, RoomConfig, RoomCoordinator};

use crate::integration::init_tracing;
use crate::utils::{FakeConnectionFactory, STATE_TIMEOUT_MS, wait_for_state};

#[tokio::test]
async fn test_three_rooms_form_a_mesh() {
    init_tracing();

    let bus = LocalBus::new();
    let connections = FakeConnectionFactory::new();

    let mut rooms = Vec::new();
    for _ in 0..3 {
        let room = RoomCoordinator::connect(
            RoomConfig::new("lab"),
            Arc::new(bus.clone()),
            Arc::new(connections.clone()),
            None,
            Arc::new(NoopObserver),
        )
        .await
        .expect("Failed to connect room");
        rooms.push(room);
    }

    for room in &rooms {
        room.join().await.expect("join failed");
    }

    for room in &rooms {
        let mut expected: Vec<_> = rooms
            .iter()
            .map(|r| r.local_id())
            .filter(|id| *id != room.local_id())
            .collect();
        expected.sort();

        let meshed = wait_for_state(
            room,
            |s| {
                let mut seen = s.peer_ids();
                seen.sort();
                seen == expected
                    && s.peers
                        .iter()
                        .all(|p| p.connection_state == ConnectionState::Connected)
            },
            STATE_TIMEOUT_MS,
        )
        .await;
        assert!(meshed, "Room {} should see both others", room.local_id());
    }
}
