use crate::core::{CoreEvent, SharedState};
use crate::BroadcastMessage;
use sleeve_proto::protocol::{Broadcast, Frame, Message, PROTOCOL_VERSION};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};

pub fn start_server(
    address: String,
    state: SharedState,
    event_tx: mpsc::Sender<CoreEvent>,
    broadcast_tx: broadcast::Sender<BroadcastMessage>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let listener = match TcpListener::bind(&address).await {
            Ok(l) => l,
            Err(e) => {
                error!("Failed to bind control socket {}: {}", address, e);
                return;
            }
        };

        info!("Control socket listening at {}", address);
        serve(listener, state, event_tx, broadcast_tx).await;
    })
}

async fn serve(
    listener: TcpListener,
    state: SharedState,
    event_tx: mpsc::Sender<CoreEvent>,
    broadcast_tx: broadcast::Sender<BroadcastMessage>,
) {
    let mut client_id = 0usize;

    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                client_id += 1;
                let id = client_id;
                info!("Client {} connected from {}", id, peer);

                let state = state.clone();
                let evt_tx = event_tx.clone();
                let bcast_rx = broadcast_tx.subscribe();

                tokio::spawn(async move {
                    handle_client(stream, state, id, evt_tx, bcast_rx).await;
                    info!("Client {} disconnected", id);
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}

async fn handle_client(
    stream: TcpStream,
    state: SharedState,
    client_id: usize,
    event_tx: mpsc::Sender<CoreEvent>,
    mut broadcast_rx: broadcast::Receiver<BroadcastMessage>,
) {
    let (mut read_half, mut write_half) = stream.into_split();
    let mut read_buf: Vec<u8> = Vec::with_capacity(4096);
    let mut tmp = vec![0u8; 4096];

    if let Ok(encoded) = encode_hello(&state).await {
        if write_half.write_all(&encoded).await.is_err() {
            return;
        }
    }

    loop {
        tokio::select! {
            result = read_half.read(&mut tmp) => {
                match result {
                    Ok(0) => break,
                    Ok(n) => {
                        read_buf.extend_from_slice(&tmp[..n]);

                        loop {
                            match Message::next_frame(&read_buf) {
                                Frame::Partial => break,
                                Frame::Oversized(len) => {
                                    warn!("Client {} sent a {} byte frame, disconnecting", client_id, len);
                                    return;
                                }
                                Frame::Complete { message, consumed } => {
                                    read_buf.drain(..consumed);
                                    match message {
                                        Ok(Message::Command(cmd)) => {
                                            info!("Client {} sent command: {:?}", client_id, cmd);
                                            if event_tx.send(CoreEvent::ClientCommand(cmd)).await.is_err() {
                                                warn!("CoreEvent channel closed");
                                                return;
                                            }
                                        }
                                        Ok(_) => {}
                                        Err(e) => {
                                            warn!("Client {} sent a malformed frame: {}", client_id, e);
                                        }
                                    }
                                }
                            }
                        }
                    }
                    Err(e) => {
                        error!("Read error from client {}: {}", client_id, e);
                        break;
                    }
                }
            }

            msg = broadcast_rx.recv() => {
                let broadcast = match msg {
                    Ok(BroadcastMessage::StateUpdated) => None,
                    Ok(BroadcastMessage::Artwork { uri, source }) => {
                        Some(Broadcast::Artwork { uri, source })
                    }
                    Ok(BroadcastMessage::Log(message)) => Some(Broadcast::Log { message }),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Client {} missed {} broadcast messages", client_id, n);
                        None
                    }
                    Err(_) => break,
                };

                let encoded = match broadcast {
                    Some(b) => Message::Broadcast(b).encode(),
                    None => encode_state(&state).await,
                };
                if let Ok(encoded) = encoded {
                    if write_half.write_all(&encoded).await.is_err() {
                        break;
                    }
                }
            }
        }
    }
}

async fn encode_hello(state: &SharedState) -> anyhow::Result<Vec<u8>> {
    let snapshot = state.read().await.clone();
    Message::Broadcast(Broadcast::Hello {
        protocol_version: PROTOCOL_VERSION,
        state: snapshot,
    })
    .encode()
}

async fn encode_state(state: &SharedState) -> anyhow::Result<Vec<u8>> {
    let snapshot = state.read().await.clone();
    Message::Broadcast(Broadcast::State { data: snapshot }).encode()
}
