use anyhow::{Context, Result};
use async_trait::async_trait;
use beacon_core::utils::{
    DEFAULT_BROKER_HOST, DEFAULT_BROKER_PORT, DEFAULT_NICKNAME, DEFAULT_ROOM,
    DEFAULT_TOPIC_NAMESPACE,
};
use beacon_core::{MediaStream, PeerId};
use beacon_room::media::SyntheticBackend;
use beacon_room::{
    MediaConstraints, MediaSource, MqttConfig, MqttTransport, RoomConfig, RoomContext,
    RoomCoordinator, RoomObserver, TransportConfig, WebRtcFactory,
};
use clap::{Parser, Subcommand};
use colored::*;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "beacon")]
#[command(about = "Join WebRTC rooms signaled over MQTT")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Join a room and report who comes and goes until Ctrl-C.
    Join {
        #[arg(long, env = "BEACON_ROOM", default_value = DEFAULT_ROOM)]
        room: String,

        #[arg(long, env = "BEACON_NICKNAME", default_value = DEFAULT_NICKNAME)]
        nickname: String,

        #[arg(long, env = "BEACON_BROKER_HOST", default_value = DEFAULT_BROKER_HOST)]
        broker_host: String,

        #[arg(long, env = "BEACON_BROKER_PORT", default_value_t = DEFAULT_BROKER_PORT)]
        broker_port: u16,

        #[arg(long, env = "BEACON_NAMESPACE", default_value = DEFAULT_TOPIC_NAMESPACE)]
        namespace: String,

        /// Offer synthetic VP8/Opus tracks instead of joining receive-only.
        #[arg(long)]
        synthetic_media: bool,

        /// Print the final room state as JSON on exit.
        #[arg(long)]
        json: bool,
    },
}

struct ConsoleObserver;

#[async_trait]
impl RoomObserver for ConsoleObserver {
    async fn on_peer_joined(&self, ctx: &RoomContext, peer_id: PeerId) {
        println!(
            "{} {} ({} in room)",
            "+".green().bold(),
            peer_id,
            ctx.list_peers().len()
        );
    }

    async fn on_peer_connected(
        &self,
        ctx: &RoomContext,
        peer_id: PeerId,
        stream: Option<MediaStream>,
    ) {
        let tracks = stream.map(|s| s.tracks.len()).unwrap_or(0);
        println!(
            "{} {} connected, {} remote tracks ({} streams in room)",
            "=".cyan().bold(),
            peer_id,
            tracks,
            ctx.streams().len()
        );
    }

    async fn on_peer_left(&self, ctx: &RoomContext, peer_id: PeerId) {
        println!(
            "{} {} ({} in room)",
            "-".red().bold(),
            peer_id,
            ctx.list_peers().len()
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Join {
            room,
            nickname,
            broker_host,
            broker_port,
            namespace,
            synthetic_media,
            json,
        } => {
            let signaling = MqttTransport::connect(MqttConfig {
                host: broker_host.clone(),
                port: broker_port,
                namespace,
                ..MqttConfig::default()
            });
            let connections = WebRtcFactory::new(TransportConfig::default())
                .context("Failed to set up WebRTC")?;
            let local_source = synthetic_media.then(|| {
                MediaSource::camera(Arc::new(SyntheticBackend::new()), MediaConstraints::default())
            });

            let coordinator = RoomCoordinator::connect(
                RoomConfig::new(room.as_str()).with_nickname(nickname.as_str()),
                Arc::new(signaling),
                Arc::new(connections),
                local_source,
                Arc::new(ConsoleObserver),
            )
            .await
            .context("Failed to subscribe to room")?;

            coordinator.join().await.context("Failed to join room")?;
            println!(
                "{} joined {} as {} ({}) via {}:{}",
                "✔".green().bold(),
                room.bold(),
                nickname,
                coordinator.local_id(),
                broker_host,
                broker_port
            );

            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for Ctrl-C")?;
            info!("Leaving room");

            let state = coordinator.state();
            coordinator.close().await.context("Failed to close room")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&state)?);
            }
            println!("{}", "Left the room.".yellow());
        }
    }

    Ok(())
}
