use serde::{Deserialize, Serialize};

use crate::layout::{Footprint, SizeState};
use crate::player::PlayerRecord;

/// Current protocol version. Bump this when the wire format changes in a
/// breaking way.
pub const PROTOCOL_VERSION: u32 = 1;

/// Messages sent from clients (widget, sleevectl) to the daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd")]
pub enum Command {
    /// The active player changed or its metadata was updated.
    Track { player: PlayerRecord },
    /// No player is active any more.
    NoPlayer,
    ToggleMinimize,
    CycleSize,
    /// Move the overlay by a pixel offset.
    Nudge { dx: i32, dy: i32 },
    GetState,
}

/// Messages sent from the daemon to clients (broadcasts)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "broadcast")]
pub enum Broadcast {
    /// Sent immediately on connect: protocol version + full state snapshot.
    Hello {
        protocol_version: u32,
        state: OverlayState,
    },
    State {
        data: OverlayState,
    },
    /// Better artwork is available for the current track.
    Artwork {
        uri: Option<String>,
        source: ArtworkSource,
    },
    Log {
        message: String,
    },
}

/// Where the currently displayed artwork came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ArtworkSource {
    /// Whatever the player itself exposed (usually low resolution).
    #[default]
    Fallback,
    /// High-resolution image already in the local cache.
    Cache,
    /// High-resolution image that was just downloaded.
    Remote,
}

/// Everything the widget layer needs to render the overlay. `rev` is bumped
/// on every change.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct OverlayState {
    #[serde(default)]
    pub rev: u64,
    pub player: Option<PlayerRecord>,
    pub artwork: Option<String>,
    #[serde(default)]
    pub artwork_source: ArtworkSource,
    pub size: SizeState,
    pub footprint: Footprint,
}

/// Wrapper for socket communication
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
    Command(Command),
    Broadcast(Broadcast),
}

/// Largest frame payload either side accepts.
pub const MAX_FRAME_LEN: usize = 1 << 20;

/// Result of looking for one frame at the front of a read buffer.
#[derive(Debug)]
pub enum Frame {
    /// Header or payload not fully received yet.
    Partial,
    /// A whole frame of `consumed` bytes. The payload may still fail to
    /// parse; the frame is drained either way.
    Complete {
        message: anyhow::Result<Message>,
        consumed: usize,
    },
    /// The header announces more than `MAX_FRAME_LEN` bytes.
    Oversized(usize),
}

impl Message {
    pub fn encode(&self) -> anyhow::Result<Vec<u8>> {
        let json = serde_json::to_vec(self)?;
        if json.len() > MAX_FRAME_LEN {
            anyhow::bail!("Message of {} bytes exceeds frame limit", json.len());
        }
        let len = json.len() as u32;
        let mut result = Vec::with_capacity(4 + json.len());
        result.extend_from_slice(&len.to_be_bytes());
        result.extend_from_slice(&json);
        Ok(result)
    }

    pub fn next_frame(data: &[u8]) -> Frame {
        if data.len() < 4 {
            return Frame::Partial;
        }
        let len = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
        if len > MAX_FRAME_LEN {
            return Frame::Oversized(len);
        }
        if data.len() < 4 + len {
            return Frame::Partial;
        }
        Frame::Complete {
            message: serde_json::from_slice(&data[4..4 + len]).map_err(anyhow::Error::from),
            consumed: 4 + len,
        }
    }

    pub fn decode(data: &[u8]) -> anyhow::Result<(Self, usize)> {
        match Self::next_frame(data) {
            Frame::Partial => anyhow::bail!("Insufficient data for message"),
            Frame::Oversized(len) => anyhow::bail!("Frame of {} bytes exceeds limit", len),
            Frame::Complete { message, consumed } => Ok((message?, consumed)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_command_wire_shape() {
        let msg = Message::Command(Command::Track {
            player: PlayerRecord {
                artist: "Daft Punk".into(),
                album: "Discovery".into(),
                ..Default::default()
            },
        });
        let encoded = msg.encode().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&encoded[4..]).unwrap();
        assert_eq!(json["cmd"], "Track");
        assert_eq!(json["player"]["album"], "Discovery");

        let (decoded, len) = Message::decode(&encoded).unwrap();
        assert_eq!(len, encoded.len());
        match decoded {
            Message::Command(Command::Track { player }) => assert_eq!(player.artist, "Daft Punk"),
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_decode_waits_for_full_frame() {
        let encoded = Message::Command(Command::CycleSize).encode().unwrap();
        assert!(Message::decode(&encoded[..2]).is_err());
        assert!(Message::decode(&encoded[..encoded.len() - 1]).is_err());
    }

    #[test]
    fn test_hello_decodes_as_broadcast() {
        let msg = Message::Broadcast(Broadcast::Hello {
            protocol_version: PROTOCOL_VERSION,
            state: OverlayState {
                rev: 7,
                ..Default::default()
            },
        });
        let encoded = msg.encode().unwrap();
        let (decoded, _) = Message::decode(&encoded).unwrap();
        match decoded {
            Message::Broadcast(Broadcast::Hello {
                protocol_version,
                state,
            }) => {
                assert_eq!(protocol_version, PROTOCOL_VERSION);
                assert_eq!(state.rev, 7);
            }
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_malformed_frame_is_complete_but_invalid() {
        let payload = br#"{"cmd":"Bogus"}"#;
        let mut data = (payload.len() as u32).to_be_bytes().to_vec();
        data.extend_from_slice(payload);
        let valid = Message::Command(Command::CycleSize).encode().unwrap();
        data.extend_from_slice(&valid);

        match Message::next_frame(&data) {
            Frame::Complete { message, consumed } => {
                assert!(message.is_err());
                assert_eq!(consumed, 4 + payload.len());
                let (next, _) = Message::decode(&data[consumed..]).unwrap();
                assert!(matches!(next, Message::Command(Command::CycleSize)));
            }
            other => panic!("expected a complete frame, got {:?}", other),
        }
    }

    #[test]
    fn test_oversized_header_is_rejected_early() {
        let data = u32::MAX.to_be_bytes();
        assert!(matches!(
            Message::next_frame(&data),
            Frame::Oversized(len) if len == u32::MAX as usize
        ));
        assert!(matches!(Message::next_frame(&data[..3]), Frame::Partial));
    }

    #[test]
    fn test_nudge_wire_shape() {
        let encoded = Message::Command(Command::Nudge { dx: -5, dy: 12 })
            .encode()
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&encoded[4..]).unwrap();
        assert_eq!(json, serde_json::json!({"cmd": "Nudge", "dx": -5, "dy": 12}));
    }
}
