use async_trait::async_trait;
use beacon_core::{
    IceCandidate, MediaStream, MediaTrack, PeerId, SdpType, SessionDescription, TrackKind,
};
use beacon_room::peer::{IceConnectionState, SessionTag};
use beacon_room::{ConnectionEvents, ConnectionFactory, PeerConnection, Result};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Calls recorded by a FakeConnection, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum FakeCall {
    CreateOffer,
    CreateAnswer,
    SetLocal(SdpType),
    SetRemote(SdpType),
    AddCandidate(IceCandidate),
    AddTrack(String),
}

/// Connection primitive without a network.
///
/// Reports Checking, a remote video stream and Connected as soon as both
/// descriptions are set.
pub struct FakeConnection {
    events: ConnectionEvents,
    calls: Mutex<Vec<FakeCall>>,
    closes: AtomicUsize,
    local_set: AtomicBool,
    remote_set: AtomicBool,
    connected: AtomicBool,
}

impl FakeConnection {
    fn new(events: ConnectionEvents) -> Self {
        Self {
            events,
            calls: Mutex::new(Vec::new()),
            closes: AtomicUsize::new(0),
            local_set: AtomicBool::new(false),
            remote_set: AtomicBool::new(false),
            connected: AtomicBool::new(false),
        }
    }

    pub fn tag(&self) -> SessionTag {
        self.events.tag()
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Simulate an ICE state change reported by the network stack.
    pub async fn emit_ice(&self, state: IceConnectionState) {
        self.events.ice_state(state).await;
    }

    fn record(&self, call: FakeCall) {
        self.calls.lock().unwrap().push(call);
    }

    async fn maybe_connect(&self) {
        if !self.local_set.load(Ordering::SeqCst) || !self.remote_set.load(Ordering::SeqCst) {
            return;
        }
        if self.connected.swap(true, Ordering::SeqCst) {
            return;
        }

        let tag = self.tag();
        let stream = MediaStream::new(format!("stream-{}", tag.remote)).with_track(MediaTrack {
            id: format!("video-{}", tag.generation),
            kind: TrackKind::Video,
            codec: "video/VP8".into(),
        });

        self.events.ice_state(IceConnectionState::Checking).await;
        self.events.remote_stream(stream).await;
        self.events.ice_state(IceConnectionState::Connected).await;
    }
}

#[async_trait]
impl PeerConnection for FakeConnection {
    async fn create_offer(&self) -> Result<SessionDescription> {
        self.record(FakeCall::CreateOffer);
        Ok(SessionDescription::offer(format!("fake-offer-{}", self.tag())))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        self.record(FakeCall::CreateAnswer);
        Ok(SessionDescription::answer(format!("fake-answer-{}", self.tag())))
    }

    async fn set_local_description(&self, description: SessionDescription) -> Result<()> {
        self.record(FakeCall::SetLocal(description.sdp_type));
        self.local_set.store(true, Ordering::SeqCst);
        self.maybe_connect().await;
        Ok(())
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        self.record(FakeCall::SetRemote(description.sdp_type));
        self.remote_set.store(true, Ordering::SeqCst);
        self.maybe_connect().await;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        self.record(FakeCall::AddCandidate(candidate));
        Ok(())
    }

    async fn add_track(&self, track: &MediaTrack, _stream_id: &str) -> Result<()> {
        self.record(FakeCall::AddTrack(track.id.clone()));
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out FakeConnections and keeps them for inspection.
#[derive(Clone, Default)]
pub struct FakeConnectionFactory {
    created: Arc<Mutex<Vec<Arc<FakeConnection>>>>,
}

impl FakeConnectionFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> Vec<Arc<FakeConnection>> {
        self.created.lock().unwrap().clone()
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    /// Connections created for a remote, oldest first.
    pub fn for_remote(&self, remote: &PeerId) -> Vec<Arc<FakeConnection>> {
        self.created()
            .into_iter()
            .filter(|c| c.tag().remote == *remote)
            .collect()
    }

    pub fn total_closes(&self) -> usize {
        self.created().iter().map(|c| c.close_count()).sum()
    }
}

#[async_trait]
impl ConnectionFactory for FakeConnectionFactory {
    async fn create(&self, events: ConnectionEvents) -> Result<Arc<dyn PeerConnection>> {
        let connection = Arc::new(FakeConnection::new(events));
        self.created.lock().unwrap().push(connection.clone());
        Ok(connection)
    }
}
