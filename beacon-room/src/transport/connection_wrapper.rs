use crate::peer::{
    ConnectionEvents, ConnectionFactory, IceConnectionState, PeerConnection, SessionTag,
};
use crate::transport::transport_config::TransportConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use beacon_core::{IceCandidate, MediaStream, MediaTrack, SdpType, SessionDescription, TrackKind};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::{API, APIBuilder};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::{RTCRtpTransceiver, RTCRtpTransceiverInit};
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

/// Builds webrtc-rs connections sharing one media engine and ICE setup.
pub struct WebRtcFactory {
    api: API,
    config: TransportConfig,
}

impl WebRtcFactory {
    pub fn new(config: TransportConfig) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        Ok(Self { api, config })
    }

    fn rtc_config(&self) -> RTCConfiguration {
        RTCConfiguration {
            ice_servers: self
                .config
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl ConnectionFactory for WebRtcFactory {
    async fn create(&self, events: ConnectionEvents) -> Result<Arc<dyn PeerConnection>> {
        let peer_connection = Arc::new(self.api.new_peer_connection(self.rtc_config()).await?);
        let wrapper = ConnectionWrapper::new(peer_connection, events, self.config.offer_to_receive);
        Ok(Arc::new(wrapper))
    }
}

/// [`PeerConnection`] backed by an `RTCPeerConnection`.
pub struct ConnectionWrapper {
    tag: SessionTag,
    peer_connection: Arc<RTCPeerConnection>,
    offer_to_receive: bool,
    /// Remote candidates that arrived before the remote description.
    pending: Mutex<Vec<RTCIceCandidateInit>>,
    local_tracks: DashMap<String, Arc<TrackLocalStaticSample>>,
}

impl ConnectionWrapper {
    pub fn new(
        peer_connection: Arc<RTCPeerConnection>,
        events: ConnectionEvents,
        offer_to_receive: bool,
    ) -> Self {
        let tag = events.tag();

        let state_events = events.clone();
        peer_connection.on_ice_connection_state_change(Box::new(
            move |s: RTCIceConnectionState| {
                let events = state_events.clone();
                Box::pin(async move {
                    info!("ICE state changed for {}: {}", events.tag(), s);
                    let Some(state) = map_ice_state(s) else {
                        return;
                    };
                    events.ice_state(state).await;
                })
            },
        ));

        let ice_events = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let events = ice_events.clone();
            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                events
                    .local_candidate(IceCandidate {
                        candidate: init.candidate,
                        sdp_mid: init.sdp_mid,
                        sdp_m_line_index: init.sdp_mline_index,
                        username_fragment: init.username_fragment,
                    })
                    .await;
            })
        }));

        let remote_streams: Arc<DashMap<String, MediaStream>> = Arc::new(DashMap::new());
        let track_events = events;
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let events = track_events.clone();
                let streams = remote_streams.clone();
                Box::pin(async move {
                    let kind = match track.kind() {
                        RTPCodecType::Audio => TrackKind::Audio,
                        RTPCodecType::Video => TrackKind::Video,
                        _ => return,
                    };
                    let descriptor = MediaTrack {
                        id: track.id(),
                        kind,
                        codec: track.codec().capability.mime_type,
                    };
                    debug!("Remote {:?} track {} from {}", kind, descriptor.id, events.tag());

                    let stream_id = track.stream_id();
                    let stream = {
                        let mut entry = streams
                            .entry(stream_id.clone())
                            .or_insert_with(|| MediaStream::new(stream_id));
                        entry.upsert_track(descriptor);
                        entry.value().clone()
                    };
                    events.remote_stream(stream).await;
                })
            },
        ));

        Self {
            tag,
            peer_connection,
            offer_to_receive,
            pending: Mutex::new(Vec::new()),
            local_tracks: DashMap::new(),
        }
    }

    /// Sample writer for a track previously handed to `add_track`.
    pub fn local_track(&self, track_id: &str) -> Option<Arc<TrackLocalStaticSample>> {
        self.local_tracks.get(track_id).map(|t| t.clone())
    }

    pub async fn pending_candidates(&self) -> usize {
        self.pending.lock().await.len()
    }

    async fn ensure_receivers(&self) -> Result<()> {
        let transceivers = self.peer_connection.get_transceivers().await;
        for kind in [RTPCodecType::Audio, RTPCodecType::Video] {
            if transceivers.iter().any(|t| t.kind() == kind) {
                continue;
            }
            self.peer_connection
                .add_transceiver_from_kind(
                    kind,
                    Some(RTCRtpTransceiverInit {
                        direction: RTCRtpTransceiverDirection::Recvonly,
                        send_encodings: vec![],
                    }),
                )
                .await?;
        }
        Ok(())
    }

    async fn flush_pending(&self) {
        let queued = std::mem::take(&mut *self.pending.lock().await);
        if queued.is_empty() {
            return;
        }

        debug!("Applying {} queued candidates for {}", queued.len(), self.tag);
        for candidate in queued {
            if let Err(e) = self.peer_connection.add_ice_candidate(candidate).await {
                warn!("Dropping queued candidate for {}: {}", self.tag, e);
            }
        }
    }
}

#[async_trait]
impl PeerConnection for ConnectionWrapper {
    async fn create_offer(&self) -> Result<SessionDescription> {
        if self.offer_to_receive {
            self.ensure_receivers().await?;
        }
        let offer = self.peer_connection.create_offer(None).await?;
        from_rtc(offer)
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self.peer_connection.create_answer(None).await?;
        from_rtc(answer)
    }

    async fn set_local_description(&self, description: SessionDescription) -> Result<()> {
        self.peer_connection
            .set_local_description(to_rtc(description)?)
            .await?;
        Ok(())
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        self.peer_connection
            .set_remote_description(to_rtc(description)?)
            .await?;
        self.flush_pending().await;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: candidate.username_fragment,
        };

        // Checked under the lock so a concurrent flush cannot miss it.
        let mut pending = self.pending.lock().await;
        if self.peer_connection.remote_description().await.is_none() {
            pending.push(init);
            return Ok(());
        }
        drop(pending);

        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn add_track(&self, track: &MediaTrack, stream_id: &str) -> Result<()> {
        let local = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: track.codec.clone(),
                ..Default::default()
            },
            track.id.clone(),
            stream_id.to_owned(),
        ));

        self.peer_connection
            .add_track(Arc::clone(&local) as Arc<dyn TrackLocal + Send + Sync>)
            .await?;
        self.local_tracks.insert(track.id.clone(), local);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

fn map_ice_state(state: RTCIceConnectionState) -> Option<IceConnectionState> {
    let mapped = match state {
        RTCIceConnectionState::New => IceConnectionState::New,
        RTCIceConnectionState::Checking => IceConnectionState::Checking,
        RTCIceConnectionState::Connected => IceConnectionState::Connected,
        RTCIceConnectionState::Completed => IceConnectionState::Completed,
        RTCIceConnectionState::Disconnected => IceConnectionState::Disconnected,
        RTCIceConnectionState::Failed => IceConnectionState::Failed,
        RTCIceConnectionState::Closed => IceConnectionState::Closed,
        _ => return None,
    };
    Some(mapped)
}

fn to_rtc(description: SessionDescription) -> Result<RTCSessionDescription> {
    let desc = match description.sdp_type {
        SdpType::Offer => RTCSessionDescription::offer(description.sdp)?,
        SdpType::Answer => RTCSessionDescription::answer(description.sdp)?,
        SdpType::Pranswer => RTCSessionDescription::pranswer(description.sdp)?,
        SdpType::Rollback => return Err(Error::UnsupportedDescription(SdpType::Rollback)),
    };
    Ok(desc)
}

fn from_rtc(description: RTCSessionDescription) -> Result<SessionDescription> {
    let sdp_type = match description.sdp_type {
        RTCSdpType::Offer => SdpType::Offer,
        RTCSdpType::Answer => SdpType::Answer,
        RTCSdpType::Pranswer => SdpType::Pranswer,
        RTCSdpType::Rollback => SdpType::Rollback,
        other => {
            return Err(Error::Negotiation(format!(
                "connection produced a {} description",
                other
            )));
        }
    };
    Ok(SessionDescription {
        sdp_type,
        sdp: description.sdp,
    })
}
