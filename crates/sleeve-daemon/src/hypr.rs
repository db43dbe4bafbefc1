//! Hyprland request-socket client.
//!
//! Every request opens a fresh connection to `.socket.sock`, writes one
//! command, and reads the reply until Hyprland closes the stream:
//!
//! ```text
//!   j/clients                                   → JSON array of windows
//!   j/monitors                                  → JSON array of outputs
//!   dispatch movewindowpixel exact X Y,class:^(C)$  → "ok"
//!   dispatch movewindowpixel DX DY,class:^(C)$      → "ok"
//!   dispatch resizewindowpixel exact W H,class:^(C)$ → "ok"
//! ```
//!
//! Each request is bounded by the configured IPC timeout.
use serde::Deserialize;
use sleeve_proto::config::WindowConfig;
use sleeve_proto::geometry::Rect;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tracing::debug;

use crate::resizer::WindowControl;

#[derive(Debug, Error)]
pub enum HyprError {
    #[error("not running under Hyprland (HYPRLAND_INSTANCE_SIGNATURE unset)")]
    NoInstance,
    #[error("IPC socket error: {0}")]
    Io(#[from] std::io::Error),
    #[error("IPC request timed out after {0:?}")]
    Timeout(Duration),
    #[error("unexpected IPC JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("dispatcher rejected command: {0}")]
    Rejected(String),
}

/// Subset of a `j/clients` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientInfo {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub class: String,
    #[serde(default = "default_true")]
    pub mapped: bool,
    #[serde(default)]
    pub hidden: bool,
    pub at: [i32; 2],
    pub size: [i32; 2],
    #[serde(default)]
    pub monitor: i64,
}

impl ClientInfo {
    pub fn rect(&self) -> Rect {
        Rect::new(self.at[0], self.at[1], self.size[0], self.size[1])
    }
}

/// Subset of a `j/monitors` entry. `width`/`height` are physical pixels.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorInfo {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub transform: u8,
}

impl MonitorInfo {
    /// Monitor area in the same logical coordinates client positions use.
    pub fn logical_rect(&self) -> Rect {
        let scale = if self.scale > 0.0 { self.scale } else { 1.0 };
        let w = (self.width as f64 / scale).round() as i32;
        let h = (self.height as f64 / scale).round() as i32;
        // Odd transforms are rotated by 90 or 270 degrees.
        let (w, h) = if self.transform % 2 == 1 { (h, w) } else { (w, h) };
        Rect::new(self.x, self.y, w, h)
    }
}

fn default_true() -> bool {
    true
}

fn default_scale() -> f64 {
    1.0
}

/// Window and hosting monitor at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSnapshot {
    pub window: Rect,
    pub monitor: Rect,
}

pub struct HyprClient {
    socket: Option<PathBuf>,
    class: String,
    timeout: Duration,
}

impl HyprClient {
    pub fn new(socket: Option<PathBuf>, class: impl Into<String>, timeout: Duration) -> Self {
        Self {
            socket,
            class: class.into(),
            timeout,
        }
    }

    pub fn from_config(config: &WindowConfig) -> Self {
        Self::new(
            sleeve_proto::platform::hyprland_socket_path(),
            config.class.clone(),
            config.ipc_timeout(),
        )
    }

    pub fn has_instance(&self) -> bool {
        self.socket.is_some()
    }

    async fn request(&self, command: &str) -> Result<Vec<u8>, HyprError> {
        let socket = self.socket.as_ref().ok_or(HyprError::NoInstance)?;
        let exchange = async {
            let mut stream = UnixStream::connect(socket).await?;
            stream.write_all(command.as_bytes()).await?;
            let mut reply = Vec::new();
            stream.read_to_end(&mut reply).await?;
            Ok::<_, std::io::Error>(reply)
        };
        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| HyprError::Timeout(self.timeout))?
            .map_err(HyprError::from)
    }

    pub async fn clients(&self) -> Result<Vec<ClientInfo>, HyprError> {
        let reply = self.request("j/clients").await?;
        Ok(serde_json::from_slice(&reply)?)
    }

    pub async fn monitors(&self) -> Result<Vec<MonitorInfo>, HyprError> {
        let reply = self.request("j/monitors").await?;
        Ok(serde_json::from_slice(&reply)?)
    }

    async fn dispatch(&self, args: &str) -> Result<(), HyprError> {
        let command = format!("dispatch {}", args);
        debug!("hypr: {}", command);
        let reply = self.request(&command).await?;
        let reply = String::from_utf8_lossy(&reply);
        if reply.trim() == "ok" {
            Ok(())
        } else {
            Err(HyprError::Rejected(reply.trim().to_string()))
        }
    }

    fn selector(&self) -> String {
        format!("class:^({})$", escape_regex(&self.class))
    }

    pub async fn move_to(&self, x: i32, y: i32) -> Result<(), HyprError> {
        self.dispatch(&format!("movewindowpixel exact {} {},{}", x, y, self.selector()))
            .await
    }

    pub async fn move_by(&self, dx: i32, dy: i32) -> Result<(), HyprError> {
        self.dispatch(&format!("movewindowpixel {} {},{}", dx, dy, self.selector()))
            .await
    }

    pub async fn resize_to(&self, width: u32, height: u32) -> Result<(), HyprError> {
        self.dispatch(&format!(
            "resizewindowpixel exact {} {},{}",
            width,
            height,
            self.selector()
        ))
        .await
    }

    /// Current geometry of our window and the monitor it sits on, or `None`
    /// when no mapped client carries our class.
    pub async fn snapshot(&self) -> Result<Option<WindowSnapshot>, HyprError> {
        let clients = self.clients().await?;
        let Some(client) = clients
            .into_iter()
            .find(|c| c.class == self.class && c.mapped && !c.hidden)
        else {
            return Ok(None);
        };

        let monitors = self.monitors().await?;
        let Some(monitor) = monitors.iter().find(|m| m.id == client.monitor) else {
            debug!("hypr: client {} on unknown monitor {}", client.address, client.monitor);
            return Ok(None);
        };
        debug!("hypr: {} at {:?} on {}", client.address, client.at, monitor.name);

        Ok(Some(WindowSnapshot {
            window: client.rect(),
            monitor: monitor.logical_rect(),
        }))
    }
}

impl WindowControl for HyprClient {
    async fn snapshot(&self) -> Result<Option<WindowSnapshot>, HyprError> {
        HyprClient::snapshot(self).await
    }

    async fn resize_to(&self, width: u32, height: u32) -> Result<(), HyprError> {
        HyprClient::resize_to(self, width, height).await
    }

    async fn move_to(&self, x: i32, y: i32) -> Result<(), HyprError> {
        HyprClient::move_to(self, x, y).await
    }

    async fn move_by(&self, dx: i32, dy: i32) -> Result<(), HyprError> {
        HyprClient::move_by(self, dx, dy).await
    }
}

fn escape_regex(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if "\\.^$|?*+()[]{}".contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
