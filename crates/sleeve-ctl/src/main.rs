mod connection;

use clap::{Parser, Subcommand};
use connection::DaemonConnection;
use sleeve_proto::config::Config;
use sleeve_proto::player::{PlaybackStatus, PlayerRecord};
use sleeve_proto::protocol::{Broadcast, Command, Message, OverlayState};

#[derive(Parser)]
#[command(name = "sleevectl", about = "Control the sleeved overlay daemon")]
struct Cli {
    /// Daemon port. Defaults to `[daemon] port` from the config file.
    #[arg(long, global = true)]
    port: Option<u16>,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Minimize or restore the overlay
    Toggle,
    /// Advance to the next size preset
    Cycle,
    /// Move the overlay by a pixel offset
    Nudge {
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        dx: i32,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        dy: i32,
    },
    /// Print the current overlay state
    State,
    /// Report the active player's track
    Track {
        #[arg(long)]
        artist: String,
        #[arg(long)]
        album: String,
        #[arg(long, default_value = "")]
        title: String,
        /// Low-resolution art the player exposes (URI or absolute path)
        #[arg(long)]
        cover_art: Option<String>,
        #[arg(long)]
        paused: bool,
    },
    /// Report that no player is active
    Clear,
    /// Print every broadcast until the daemon goes away
    Watch,
}

impl Action {
    fn command(self) -> Option<Command> {
        match self {
            Action::Toggle => Some(Command::ToggleMinimize),
            Action::Cycle => Some(Command::CycleSize),
            Action::Nudge { dx, dy } => Some(Command::Nudge { dx, dy }),
            Action::State => Some(Command::GetState),
            Action::Track {
                artist,
                album,
                title,
                cover_art,
                paused,
            } => Some(Command::Track {
                player: PlayerRecord {
                    title,
                    artist,
                    album,
                    cover_art,
                    status: if paused {
                        PlaybackStatus::Paused
                    } else {
                        PlaybackStatus::Playing
                    },
                },
            }),
            Action::Clear => Some(Command::NoPlayer),
            Action::Watch => None,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let port = match cli.port {
        Some(port) => port,
        None => Config::load()?.daemon.port,
    };

    let mut conn = DaemonConnection::connect(&sleeve_proto::platform::daemon_address(port)).await?;

    // The daemon greets every connection with a snapshot.
    let hello = match conn.receive_message().await? {
        Some(Message::Broadcast(Broadcast::Hello {
            protocol_version,
            state,
        })) => {
            if protocol_version != sleeve_proto::protocol::PROTOCOL_VERSION {
                eprintln!(
                    "warning: daemon speaks protocol {}, sleevectl speaks {}",
                    protocol_version,
                    sleeve_proto::protocol::PROTOCOL_VERSION
                );
            }
            state
        }
        Some(other) => anyhow::bail!("Unexpected greeting from daemon: {:?}", other),
        None => anyhow::bail!("Daemon closed the connection"),
    };

    match cli.action.command() {
        Some(cmd) => {
            conn.send_command(cmd).await?;
            let state = wait_for_state(&mut conn).await?.unwrap_or(hello);
            print_state(&state)?;
        }
        None => {
            print_state(&hello)?;
            while let Some(msg) = conn.receive_message().await? {
                println!("{}", serde_json::to_string(&msg)?);
            }
        }
    }

    Ok(())
}

async fn wait_for_state(conn: &mut DaemonConnection) -> anyhow::Result<Option<OverlayState>> {
    while let Some(msg) = conn.receive_message().await? {
        if let Message::Broadcast(Broadcast::State { data }) = msg {
            return Ok(Some(data));
        }
    }
    Ok(None)
}

fn print_state(state: &OverlayState) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(state)?);
    Ok(())
}
