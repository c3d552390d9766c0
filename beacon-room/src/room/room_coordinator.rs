use crate::media::{LocalStream, MediaSource};
use crate::peer::ConnectionFactory;
use crate::room::{Room, RoomCommand, RoomConfig, RoomObserver, RoomState};
use crate::signaling::SignalingTransport;
use crate::{Error, Result};
use beacon_core::{PeerId, RoomName, SignalMessage};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{Instrument, info, info_span};

/// Cloneable handle to a running room.
///
/// Dropping every handle stops the room loop and closes its sessions.
#[derive(Clone)]
pub struct RoomCoordinator {
    local_id: PeerId,
    room: RoomName,
    local_stream: Option<LocalStream>,
    commands: mpsc::Sender<RoomCommand>,
    state: watch::Receiver<RoomState>,
}

impl RoomCoordinator {
    /// Subscribes to the room on `signaling` and starts its event loop.
    pub async fn connect(
        config: RoomConfig,
        signaling: Arc<dyn SignalingTransport>,
        connections: Arc<dyn ConnectionFactory>,
        local_source: Option<MediaSource>,
        observer: Arc<dyn RoomObserver>,
    ) -> Result<Self> {
        let local_id = PeerId::new();
        let room = config.room.clone();
        let local_stream = local_source.map(LocalStream::new);

        let inbox = signaling.subscribe(&room).await?;
        let (state_tx, state) = watch::channel(RoomState::new(
            room.clone(),
            local_id,
            config.nickname.clone(),
        ));
        let (commands, command_rx) = mpsc::channel(config.command_buffer);

        let span = info_span!("room", room = %room, local_id = %local_id);
        let actor = Room::new(
            config,
            local_id,
            local_stream.clone(),
            observer,
            signaling,
            connections,
            command_rx,
            inbox,
            state_tx,
        );
        tokio::spawn(actor.run().instrument(span));
        info!("Connected to room {} as {}", room, local_id);

        Ok(Self {
            local_id,
            room,
            local_stream,
            commands,
            state,
        })
    }

    pub fn local_id(&self) -> PeerId {
        self.local_id
    }

    pub fn room(&self) -> &RoomName {
        &self.room
    }

    /// Announces this participant to the room.
    ///
    /// Local media is captured first, so a failed capture fails the join and
    /// nothing is broadcast.
    pub async fn join(&self) -> Result<()> {
        if let Some(local) = &self.local_stream {
            local.ready().await?;
        }

        let (reply, rx) = oneshot::channel();
        self.request(RoomCommand::Join { reply }).await?;
        rx.await.map_err(|_| Error::RoomStopped)?
    }

    /// Routes a signaling message as if it came from the transport.
    pub async fn deliver(&self, msg: SignalMessage) -> Result<()> {
        self.request(RoomCommand::Deliver(msg)).await
    }

    pub async fn close_peer(&self, remote: PeerId) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.request(RoomCommand::ClosePeer { remote, reply }).await?;
        rx.await.map_err(|_| Error::RoomStopped)
    }

    /// Closes every session. The room ignores signaling until the next `join()`.
    pub async fn close(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.request(RoomCommand::Close { reply }).await?;
        rx.await.map_err(|_| Error::RoomStopped)
    }

    pub fn state(&self) -> RoomState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RoomState> {
        self.state.clone()
    }

    async fn request(&self, cmd: RoomCommand) -> Result<()> {
        self.commands.send(cmd).await.map_err(|_| Error::RoomStopped)
    }
}
