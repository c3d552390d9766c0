use beacon_core::{
    ConnectionState, IceCandidate, Role, SdpType, SessionDescription, SignalBody,
    SignalMessage, SignalPayload,
};

use crate::integration::{create_test_room, init_tracing};
use crate::utils::{FakeCall, STATE_TIMEOUT_MS, lowest_id, wait_for_state, wait_until};

#[tokio::test]
async fn test_candidate_before_offer_is_not_lost() {
    init_tracing();

    let t = create_test_room().await;
    let local = t.room.local_id();
    let remote = lowest_id(7);

    let mut candidate =
        IceCandidate::new("candidate:1 1 udp 2130706431 192.168.1.20 50000 typ host");
    candidate.sdp_mid = Some("0".into());
    candidate.sdp_m_line_index = Some(0);

    t.room
        .deliver(SignalMessage::negotiation(
            remote,
            local,
            SignalPayload::Candidate(candidate.clone()),
        ))
        .await
        .unwrap();

    assert!(
        wait_until(|| t.connections.created_count() == 1, STATE_TIMEOUT_MS).await,
        "Unknown sender should get a responder session"
    );
    let connection = t.connections.for_remote(&remote)[0].clone();
    let early = candidate.clone();
    assert!(
        wait_until(
            || connection.calls() == vec![FakeCall::AddCandidate(early.clone())],
            STATE_TIMEOUT_MS
        )
        .await,
        "Candidate should reach the connection immediately"
    );
    assert_eq!(t.room.state().peer(remote).map(|p| p.role), Some(Role::Responder));

    t.room
        .deliver(SignalMessage::negotiation(
            remote,
            local,
            SignalPayload::Sdp(SessionDescription::offer("remote-offer")),
        ))
        .await
        .unwrap();

    let connected = wait_for_state(
        &t.room,
        |s| s.peer(remote).is_some_and(|p| p.connection_state == ConnectionState::Connected),
        STATE_TIMEOUT_MS,
    )
    .await;
    assert!(connected);

    assert_eq!(
        connection.calls(),
        vec![
            FakeCall::AddCandidate(candidate),
            FakeCall::SetRemote(SdpType::Offer),
            FakeCall::CreateAnswer,
            FakeCall::SetLocal(SdpType::Answer),
        ]
    );
    let answered = t
        .signaling
        .wait_for_published(
            |m| match &m.body {
                SignalBody::Negotiation(SignalPayload::Sdp(d)) => {
                    m.to == Some(remote) && d.sdp_type == SdpType::Answer
                }
                _ => false,
            },
            STATE_TIMEOUT_MS,
        )
        .await;
    assert!(answered, "Answer should be sent back");
}
