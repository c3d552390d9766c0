use crate::media::LocalStream;
use crate::peer::{ConnectionEvents, ConnectionFactory, PeerSession, SessionTag};
use crate::room::context::RoomContext;
use crate::room::room_command::RoomCommand;
use crate::room::{RoomConfig, RoomObserver, RoomState};
use crate::signaling::SignalingTransport;
use crate::transport::TransportEvent;
use crate::{Error, Result};
use beacon_core::{
    ConnectionState, PeerId, Role, SdpType, SignalBody, SignalMessage, SignalPayload,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{Instrument, Span, debug, error, info, trace, warn};

struct Member {
    session: Arc<PeerSession>,
    /// In the peer list. Initiators are listed once their offer is out.
    listed: bool,
    /// The remote's epoch from the Join that opened this session.
    remote_epoch: u64,
}

/// Room event loop. Sole owner of the session table.
pub struct Room {
    config: RoomConfig,
    local_id: PeerId,
    local_stream: Option<LocalStream>,
    observer: Arc<dyn RoomObserver>,
    signaling: Arc<dyn SignalingTransport>,
    connections: Arc<dyn ConnectionFactory>,
    members: HashMap<PeerId, Member>,
    /// Listed peers in insertion order.
    order: Vec<PeerId>,
    generation: u64,
    /// Generation counter value at our latest Join broadcast.
    announced_at: u64,
    /// Bumped on every close; sent with each Join.
    epoch: u64,
    closed: bool,
    command_rx: mpsc::Receiver<RoomCommand>,
    inbox: mpsc::UnboundedReceiver<SignalMessage>,
    inbox_open: bool,
    event_rx: mpsc::Receiver<TransportEvent>,
    event_tx: mpsc::Sender<TransportEvent>,
    state_tx: watch::Sender<RoomState>,
}

impl Room {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        config: RoomConfig,
        local_id: PeerId,
        local_stream: Option<LocalStream>,
        observer: Arc<dyn RoomObserver>,
        signaling: Arc<dyn SignalingTransport>,
        connections: Arc<dyn ConnectionFactory>,
        command_rx: mpsc::Receiver<RoomCommand>,
        inbox: mpsc::UnboundedReceiver<SignalMessage>,
        state_tx: watch::Sender<RoomState>,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::channel(config.event_buffer);

        Self {
            config,
            local_id,
            local_stream,
            observer,
            signaling,
            connections,
            members: HashMap::new(),
            order: Vec::new(),
            generation: 0,
            announced_at: 0,
            epoch: 0,
            closed: false,
            command_rx,
            inbox,
            inbox_open: true,
            event_rx,
            event_tx,
            state_tx,
        }
    }

    pub async fn run(mut self) {
        info!("Room event loop started");

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("All room handles dropped. Shutting down room.");
                            break;
                        }
                    }
                }

                msg = self.inbox.recv(), if self.inbox_open => {
                    match msg {
                        Some(m) => self.handle_message(m).await,
                        None => {
                            warn!("Signaling subscription closed");
                            self.inbox_open = false;
                        }
                    }
                }

                evt = self.event_rx.recv() => {
                    // The room holds a sender, so the channel never closes.
                    if let Some(e) = evt {
                        self.handle_transport_event(e).await;
                    }
                }
            }
        }

        self.close_all().await;
        info!("Room event loop finished");
    }

    async fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join { reply } => {
                let res = self.announce().await;
                let _ = reply.send(res);
            }

            RoomCommand::Deliver(msg) => self.handle_message(msg).await,

            RoomCommand::ClosePeer { remote, reply } => {
                let existed = self.evict(remote).await;
                if existed {
                    self.publish_state();
                }
                let _ = reply.send(existed);
            }

            RoomCommand::Close { reply } => {
                info!("Closing room with {} sessions", self.members.len());
                self.close_all().await;
                let _ = reply.send(());
            }
        }
    }

    async fn announce(&mut self) -> Result<()> {
        if self.closed {
            info!("Re-opening room");
            self.closed = false;
        }
        self.publish_state();
        self.announced_at = self.generation;

        info!(
            "Announcing {} as {} (epoch {})",
            self.local_id, self.config.nickname, self.epoch
        );
        let msg = SignalMessage::join(self.local_id).with_epoch(self.epoch);
        self.signaling.publish(&self.config.room, &msg).await
    }

    async fn handle_message(&mut self, msg: SignalMessage) {
        if self.closed {
            trace!("Room closed, ignoring message from {}", msg.from);
            return;
        }
        if msg.from == self.local_id {
            return;
        }
        if msg.to.is_some_and(|to| to != self.local_id) {
            trace!("Message from {} addressed to someone else", msg.from);
            return;
        }

        match msg.body {
            SignalBody::Join { epoch } => self.on_join(msg.from, msg.to.is_some(), epoch).await,
            SignalBody::Negotiation(payload) => {
                if msg.to.is_none() {
                    warn!("Negotiation message from {} without recipient", msg.from);
                    return;
                }
                self.on_negotiation(msg.from, payload).await;
            }
        }
    }

    async fn on_join(&mut self, remote: PeerId, directed: bool, epoch: u64) {
        let initiate = self.local_id < remote;

        if let Some(member) = self.members.get(&remote) {
            // Sessions opened after our last announce already answer it,
            // unless the remote has closed and come back since.
            let fresh = member.session.tag().generation > self.announced_at;
            let restarted = epoch > member.remote_epoch;
            if directed && !initiate {
                debug!("Stray join reply from {} ignored", remote);
                return;
            }
            if initiate && fresh && !restarted {
                debug!("Join from {} ignored, negotiation under way", remote);
                return;
            }
            info!("{} joined again, replacing its session", remote);
            self.evict(remote).await;
        }

        if initiate {
            let Some(session) = self.create_session(remote, Role::Initiator).await else {
                self.publish_state();
                return;
            };
            self.insert(session.clone(), false, epoch).await;
            spawn_session_op(session.tag(), async move { session.join().await });
        } else {
            let Some(session) = self.create_session(remote, Role::Responder).await else {
                self.publish_state();
                return;
            };
            self.insert(session, true, epoch).await;

            if !directed {
                let reply = SignalMessage::join_reply(self.local_id, remote).with_epoch(self.epoch);
                self.send(reply).await;
            }
        }
    }

    async fn on_negotiation(&mut self, remote: PeerId, payload: SignalPayload) {
        let is_offer = matches!(&payload, SignalPayload::Sdp(d) if d.sdp_type == SdpType::Offer);

        let existing = self.members.get(&remote).map(|m| m.session.clone());
        let session = match existing {
            // Only the lower id initiates, so our own offer always wins.
            Some(session) if is_offer && session.role() == Role::Initiator => {
                debug!("Dropping glare offer from {}", remote);
                return;
            }
            Some(session) => Some(session),
            None => self.responder_for(remote).await,
        };

        let Some(session) = session else {
            self.publish_state();
            return;
        };
        spawn_session_op(session.tag(), async move {
            session.on_peer_message(payload).await
        });
    }

    async fn responder_for(&mut self, remote: PeerId) -> Option<Arc<PeerSession>> {
        let session = self.create_session(remote, Role::Responder).await?;
        self.insert(session.clone(), true, 0).await;
        Some(session)
    }

    async fn create_session(&mut self, remote: PeerId, role: Role) -> Option<Arc<PeerSession>> {
        self.generation += 1;
        let tag = SessionTag {
            remote,
            generation: self.generation,
        };
        let events = ConnectionEvents::new(tag, self.event_tx.clone());

        let connection = match self.connections.create(events.clone()).await {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to create connection for {}: {}", tag, e);
                return None;
            }
        };

        debug!("New {:?} session {}", role, tag);
        Some(Arc::new(PeerSession::new(
            self.local_id,
            role,
            connection,
            events,
            self.local_stream.clone(),
        )))
    }

    async fn insert(&mut self, session: Arc<PeerSession>, listed: bool, remote_epoch: u64) {
        let remote = session.remote_id();
        self.members.insert(
            remote,
            Member {
                session,
                listed,
                remote_epoch,
            },
        );
        if listed {
            self.order.push(remote);
            self.publish_state();
            self.observer.on_peer_joined(&self.context(), remote).await;
        }
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        let tag = event.tag();
        let Some(member) = self.members.get(&tag.remote) else {
            debug!("Event for unknown session {}", tag);
            return;
        };
        if member.session.tag() != tag {
            debug!("Stale event from replaced session {}", tag);
            return;
        }
        let session = member.session.clone();

        match event {
            TransportEvent::LocalDescription(_, description) => {
                let msg = SignalMessage::negotiation(
                    self.local_id,
                    tag.remote,
                    SignalPayload::Sdp(description),
                );
                self.send(msg).await;
            }

            TransportEvent::CandidateGenerated(_, candidate) => {
                let msg = SignalMessage::negotiation(
                    self.local_id,
                    tag.remote,
                    SignalPayload::Candidate(candidate),
                );
                self.send(msg).await;
            }

            TransportEvent::Joined(_) => {
                let Some(member) = self.members.get_mut(&tag.remote) else {
                    return;
                };
                if member.listed {
                    return;
                }
                member.listed = true;
                self.order.push(tag.remote);
                self.publish_state();
                self.observer.on_peer_joined(&self.context(), tag.remote).await;
            }

            TransportEvent::RemoteStream(_, stream) => {
                debug!("Remote stream {} from {}", stream.id, tag);
                session.set_remote_stream(stream);
                self.publish_state();
            }

            TransportEvent::IceStateChanged(_, ice) => match session.on_ice_state(ice) {
                Some(ConnectionState::Connected) => {
                    self.publish_state();
                    self.observer
                        .on_peer_connected(&self.context(), tag.remote, session.remote_stream())
                        .await;
                }
                Some(state) if state.is_terminal() => {
                    info!("Session {} ended as {:?}", tag, state);
                    self.evict(tag.remote).await;
                    self.publish_state();
                }
                Some(_) => self.publish_state(),
                None => {}
            },
        }
    }

    /// Removes and closes one session. Returns whether it existed.
    async fn evict(&mut self, remote: PeerId) -> bool {
        let Some(member) = self.members.remove(&remote) else {
            return false;
        };
        member.session.close();
        self.order.retain(|id| *id != remote);

        if member.listed {
            self.publish_state();
            self.observer.on_peer_left(&self.context(), remote).await;
        }
        true
    }

    async fn close_all(&mut self) {
        let members: Vec<(PeerId, Member)> = self.members.drain().collect();
        let order = std::mem::take(&mut self.order);
        self.closed = true;
        self.epoch += 1;

        for (_, member) in &members {
            member.session.close();
        }
        self.publish_state();

        let ctx = self.context();
        for remote in order {
            self.observer.on_peer_left(&ctx, remote).await;
        }
    }

    async fn send(&self, msg: SignalMessage) {
        if let Err(e) = self.signaling.publish(&self.config.room, &msg).await {
            warn!("Failed to publish to {:?}: {}", msg.to, e);
        }
    }

    fn context(&self) -> RoomContext {
        RoomContext::new(self.state_tx.subscribe())
    }

    fn publish_state(&self) {
        let peers: Vec<_> = self
            .order
            .iter()
            .filter_map(|id| self.members.get(id))
            .map(|m| m.session.snapshot())
            .collect();

        let streams = peers
            .iter()
            .filter(|p| p.connection_state == ConnectionState::Connected)
            .filter_map(|p| p.remote_stream.clone())
            .collect();

        let local_stream = self.local_stream.as_ref().and_then(|l| l.peek());
        self.state_tx.send_modify(|state| {
            state.peers = peers;
            state.streams = streams;
            state.local_stream = local_stream;
            state.closed = self.closed;
        });
    }
}

/// Runs a session operation off the room task; failures are logged only.
fn spawn_session_op<F>(tag: SessionTag, op: F)
where
    F: Future<Output = Result<()>> + Send + 'static,
{
    tokio::spawn(
        async move {
            match op.await {
                Ok(()) => {}
                Err(Error::Capture(e)) => warn!("Local media unavailable for {}: {}", tag, e),
                Err(e) => warn!("Negotiation with {} failed: {}", tag, e),
            }
        }
        .instrument(Span::current()),
    );
}
