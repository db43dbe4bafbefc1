//! SleeveCore: single-owner event loop for all mutable overlay state.
//!
//! Socket clients, artwork fetch tasks, and resize timers never touch state
//! directly; they send `CoreEvent`s into this loop. The loop owns the artwork
//! pipeline (and with it the cache and the in-flight slot), the resizer, and
//! the published `OverlayState`, so none of them needs a lock beyond the
//! read-side `RwLock` the socket server uses for snapshots.
//!
//! After each change the core broadcasts a `BroadcastMessage` to connected
//! clients.
use std::path::Path;
use std::sync::Arc;

use sleeve_proto::config::Config;
use sleeve_proto::player::PlayerRecord;
use sleeve_proto::protocol::{ArtworkSource, Command, OverlayState};
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{debug, info, warn};

use crate::artwork::{
    ArtworkError, ArtworkPipeline, ArtworkStore, FetchCompletion, RemoteArtworkFetcher,
    Resolution,
};
use crate::resizer::{AnchoredResizer, ConfirmOutcome, ResizeAction, WindowControl};
use crate::BroadcastMessage;

pub type SharedState = Arc<RwLock<OverlayState>>;

// ── CoreEvent ─────────────────────────────────────────────────────────────────

/// All inputs into the SleeveCore loop.
#[derive(Debug)]
pub enum CoreEvent {
    /// A command from a socket client.
    ClientCommand(Command),
    /// A remote artwork lookup finished (successfully or not).
    ArtworkFetched(FetchCompletion),
    /// The settle delay of resize `generation` elapsed.
    ResizeSettled(u64),
    Shutdown,
}

// ── SleeveCore ────────────────────────────────────────────────────────────────

pub struct SleeveCore<W> {
    state: SharedState,
    pipeline: ArtworkPipeline,
    resizer: AnchoredResizer<W>,
    /// Loop-back sender handed to fetch tasks and timers.
    event_tx: mpsc::Sender<CoreEvent>,
    broadcast_tx: broadcast::Sender<BroadcastMessage>,
    /// Pending settle timer; aborted when a newer resize re-arms it.
    settle_timer: Option<tokio::task::AbortHandle>,
}

impl<W: WindowControl> SleeveCore<W> {
    pub fn new(
        config: &Config,
        wm: W,
        broadcast_tx: broadcast::Sender<BroadcastMessage>,
        event_tx: mpsc::Sender<CoreEvent>,
    ) -> Result<Self, ArtworkError> {
        let store = ArtworkStore::new(config.artwork.cache_dir.clone());
        if let Err(e) = store.ensure_dir() {
            // Downloads will fail quietly; cached lookups still work.
            warn!("artwork cache dir {:?} unavailable: {}", store.dir(), e);
        }
        let fetcher = RemoteArtworkFetcher::new(&config.artwork)?;
        let resizer = AnchoredResizer::new(wm, config.sizes.clone(), config.window.settle_delay());

        let state = OverlayState {
            rev: 1,
            size: resizer.state(),
            footprint: resizer.footprint(),
            ..Default::default()
        };

        Ok(Self {
            state: Arc::new(RwLock::new(state)),
            pipeline: ArtworkPipeline::new(store, fetcher),
            resizer,
            event_tx,
            broadcast_tx,
            settle_timer: None,
        })
    }

    /// Shared read handle for the socket server.
    pub fn state(&self) -> SharedState {
        Arc::clone(&self.state)
    }

    /// Run the core event loop. Returns on `Shutdown` or when every sender
    /// has been dropped.
    pub async fn run(mut self, mut event_rx: mpsc::Receiver<CoreEvent>) -> anyhow::Result<()> {
        info!("SleeveCore: starting event loop");

        loop {
            match event_rx.recv().await {
                None => {
                    info!("SleeveCore: event channel closed, shutting down");
                    break;
                }
                Some(CoreEvent::Shutdown) => {
                    info!("SleeveCore: shutdown requested");
                    break;
                }
                Some(evt) => self.handle(evt).await,
            }
        }

        if let Some(timer) = self.settle_timer.take() {
            timer.abort();
        }
        Ok(())
    }

    async fn handle(&mut self, evt: CoreEvent) {
        match evt {
            CoreEvent::ClientCommand(cmd) => self.handle_command(cmd).await,
            CoreEvent::ArtworkFetched(done) => {
                if let Some(path) = self.pipeline.complete(done) {
                    self.publish_artwork(Some(file_uri(&path)), ArtworkSource::Remote)
                        .await;
                }
            }
            CoreEvent::ResizeSettled(generation) => {
                match self.resizer.confirm(generation).await {
                    ConfirmOutcome::Stale => {}
                    outcome => debug!("resize {}: {:?}", generation, outcome),
                }
            }
            CoreEvent::Shutdown => {}
        }
    }

    async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Track { player } => self.on_track(player).await,
            Command::NoPlayer => {
                self.pipeline.clear();
                self.update(|s| {
                    s.player = None;
                    s.artwork = None;
                    s.artwork_source = ArtworkSource::Fallback;
                })
                .await;
            }
            Command::ToggleMinimize => self.resize(ResizeAction::ToggleMinimize).await,
            Command::CycleSize => self.resize(ResizeAction::CycleSize).await,
            Command::Nudge { dx, dy } => {
                if let Err(e) = self.resizer.nudge(dx, dy).await {
                    warn!("nudge ({}, {}) failed: {}", dx, dy, e);
                }
                let _ = self.broadcast_tx.send(BroadcastMessage::StateUpdated);
            }
            Command::GetState => {
                let _ = self.broadcast_tx.send(BroadcastMessage::StateUpdated);
            }
        }
    }

    async fn on_track(&mut self, player: PlayerRecord) {
        let resolution = self.pipeline.resolve(&player.artist, &player.album);

        if let Resolution::Unchanged = resolution {
            // Same album; keep whatever artwork is showing.
            self.update(|s| s.player = Some(player)).await;
            return;
        }

        let (artwork, source) = match &resolution {
            Resolution::Cached(path) => (Some(file_uri(path)), ArtworkSource::Cache),
            Resolution::OnDisk(path) => (Some(file_uri(path)), ArtworkSource::Cache),
            _ => (player.cover_art_uri(), ArtworkSource::Fallback),
        };
        self.update(|s| s.player = Some(player)).await;
        self.publish_artwork(artwork, source).await;

        match resolution {
            Resolution::Fetch(task) => {
                let tx = self.event_tx.clone();
                tokio::spawn(async move {
                    let done = task.run().await;
                    let _ = tx.send(CoreEvent::ArtworkFetched(done)).await;
                });
            }
            Resolution::Dropped => debug!("artwork lookup dropped, slot busy"),
            _ => {}
        }
    }

    async fn resize(&mut self, action: ResizeAction) {
        let ticket = self.resizer.request(action).await;
        self.update(|s| {
            s.size = ticket.state;
            s.footprint = ticket.footprint;
        })
        .await;

        if let Some(timer) = self.settle_timer.take() {
            timer.abort();
        }
        if let Some(confirm) = ticket.confirm {
            let tx = self.event_tx.clone();
            let handle = tokio::spawn(async move {
                tokio::time::sleep(confirm.delay).await;
                let _ = tx.send(CoreEvent::ResizeSettled(confirm.generation)).await;
            });
            self.settle_timer = Some(handle.abort_handle());
        }
    }

    async fn publish_artwork(&mut self, uri: Option<String>, source: ArtworkSource) {
        let changed = {
            let mut state = self.state.write().await;
            if state.artwork == uri && state.artwork_source == source {
                false
            } else {
                state.artwork = uri.clone();
                state.artwork_source = source;
                state.rev += 1;
                true
            }
        };
        if changed {
            let _ = self
                .broadcast_tx
                .send(BroadcastMessage::Artwork { uri, source });
            let _ = self.broadcast_tx.send(BroadcastMessage::StateUpdated);
        }
    }

    async fn update(&mut self, apply: impl FnOnce(&mut OverlayState)) {
        {
            let mut state = self.state.write().await;
            apply(&mut state);
            state.rev += 1;
        }
        let _ = self.broadcast_tx.send(BroadcastMessage::StateUpdated);
    }
}

fn file_uri(path: &Path) -> String {
    format!("file://{}", path.display())
}
