//! Corner-anchored resizing.
//!
//! ```text
//!   Idle ──request()──► ResizeRequested ──► AwaitingConfirmation
//!    ▲                                            │ confirm(gen) after settle delay
//!    └──────────── Repositioning ◄────────────────┘
//! ```
//!
//! The compositor may clamp a requested size and reports the real one only
//! later, so the compensating move is computed from a second snapshot taken
//! once the resize has settled.

use sleeve_proto::config::SizesConfig;
use sleeve_proto::geometry::{anchor_target, AnchorCorner, Rect};
use sleeve_proto::layout::{Footprint, SizeState};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::hypr::{HyprError, WindowSnapshot};

/// The slice of the window-manager control channel the resizer needs.
pub trait WindowControl {
    fn snapshot(
        &self,
    ) -> impl Future<Output = Result<Option<WindowSnapshot>, HyprError>> + Send;
    fn resize_to(
        &self,
        width: u32,
        height: u32,
    ) -> impl Future<Output = Result<(), HyprError>> + Send;
    fn move_to(&self, x: i32, y: i32) -> impl Future<Output = Result<(), HyprError>> + Send;
    fn move_by(&self, dx: i32, dy: i32) -> impl Future<Output = Result<(), HyprError>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAction {
    ToggleMinimize,
    CycleSize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizePhase {
    Idle,
    ResizeRequested,
    AwaitingConfirmation { generation: u64 },
    Repositioning,
}

/// Arm a timer for `delay`, then call `confirm(generation)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingConfirm {
    pub generation: u64,
    pub delay: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeTicket {
    pub state: SizeState,
    pub footprint: Footprint,
    /// `None` when the window could not be located; nothing to re-anchor.
    pub confirm: Option<PendingConfirm>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// A newer resize superseded this one.
    Stale,
    WindowNotFound,
    /// Anchor already satisfied, no move issued.
    InPlace,
    Moved { x: i32, y: i32 },
    MoveFailed,
}

#[derive(Debug, Clone, Copy)]
struct Anchor {
    before: Rect,
    corner: AnchorCorner,
}

pub struct AnchoredResizer<W> {
    wm: W,
    sizes: SizesConfig,
    settle_delay: Duration,
    state: SizeState,
    phase: ResizePhase,
    generation: u64,
    anchor: Option<Anchor>,
}

impl<W: WindowControl> AnchoredResizer<W> {
    pub fn new(wm: W, sizes: SizesConfig, settle_delay: Duration) -> Self {
        let state = SizeState::new(sizes.initial);
        Self {
            wm,
            sizes,
            settle_delay,
            state,
            phase: ResizePhase::Idle,
            generation: 0,
            anchor: None,
        }
    }

    pub fn state(&self) -> SizeState {
        self.state
    }

    pub fn footprint(&self) -> Footprint {
        self.state.footprint(&self.sizes)
    }

    #[cfg(test)]
    pub fn phase(&self) -> ResizePhase {
        self.phase
    }

    /// Apply a size change and capture the anchor it must preserve.
    ///
    /// If an earlier resize is still awaiting confirmation its anchor is
    /// kept: the window has not been moved back onto it yet, so a fresh
    /// snapshot would drift.
    pub async fn request(&mut self, action: ResizeAction) -> ResizeTicket {
        let carried = match self.phase {
            ResizePhase::AwaitingConfirmation { .. } => self.anchor,
            _ => None,
        };
        self.phase = ResizePhase::ResizeRequested;

        let anchor = match carried {
            Some(anchor) => Some(anchor),
            None => match self.wm.snapshot().await {
                Ok(Some(snap)) => Some(Anchor {
                    before: snap.window,
                    corner: AnchorCorner::classify(&snap.window, &snap.monitor),
                }),
                Ok(None) => {
                    debug!("resize: window not mapped, resizing without anchor");
                    None
                }
                Err(e) => {
                    warn!("resize: geometry query failed: {}", e);
                    None
                }
            },
        };

        match action {
            ResizeAction::ToggleMinimize => self.state.toggle_minimized(),
            ResizeAction::CycleSize => self.state.cycle(),
        }
        let footprint = self.footprint();
        self.generation += 1;
        info!(
            "resize: {:?} -> {:?} ({}x{})",
            action, self.state.preset, footprint.width, footprint.height
        );

        let Some(anchor) = anchor else {
            self.anchor = None;
            self.phase = ResizePhase::Idle;
            return ResizeTicket {
                state: self.state,
                footprint,
                confirm: None,
            };
        };

        if let Err(e) = self.wm.resize_to(footprint.width, footprint.height).await {
            // The widget applies its own size request too; the settle pass
            // still re-anchors whatever size results.
            debug!("resize: compositor resize not applied: {}", e);
        }

        self.anchor = Some(anchor);
        self.phase = ResizePhase::AwaitingConfirmation {
            generation: self.generation,
        };
        ResizeTicket {
            state: self.state,
            footprint,
            confirm: Some(PendingConfirm {
                generation: self.generation,
                delay: self.settle_delay,
            }),
        }
    }

    /// Shift the window by a pixel offset. A pending anchor shifts with it so
    /// the settle pass does not drag the window back.
    pub async fn nudge(&mut self, dx: i32, dy: i32) -> Result<(), HyprError> {
        self.wm.move_by(dx, dy).await?;
        if let Some(anchor) = self.anchor.as_mut() {
            anchor.before.x += dx;
            anchor.before.y += dy;
        }
        Ok(())
    }

    /// Read back the settled size and move the window so the anchor corner
    /// returns to where it was.
    pub async fn confirm(&mut self, generation: u64) -> ConfirmOutcome {
        if self.phase != (ResizePhase::AwaitingConfirmation { generation }) {
            debug!("resize: confirmation {} superseded", generation);
            return ConfirmOutcome::Stale;
        }

        let Some(anchor) = self.anchor.take() else {
            self.phase = ResizePhase::Idle;
            return ConfirmOutcome::WindowNotFound;
        };

        let after = match self.wm.snapshot().await {
            Ok(Some(snap)) => snap.window,
            Ok(None) => {
                debug!("resize: window gone before repositioning");
                self.phase = ResizePhase::Idle;
                return ConfirmOutcome::WindowNotFound;
            }
            Err(e) => {
                warn!("resize: geometry query failed: {}", e);
                self.phase = ResizePhase::Idle;
                return ConfirmOutcome::WindowNotFound;
            }
        };

        self.phase = ResizePhase::Repositioning;
        let (x, y) = anchor_target(&anchor.before, after.width, after.height, anchor.corner);
        let outcome = if (x, y) == (after.x, after.y) {
            ConfirmOutcome::InPlace
        } else {
            match self.wm.move_to(x, y).await {
                Ok(()) => {
                    debug!("resize: anchored {:?} at ({}, {})", anchor.corner, x, y);
                    ConfirmOutcome::Moved { x, y }
                }
                Err(e) => {
                    warn!("resize: move failed: {}", e);
                    ConfirmOutcome::MoveFailed
                }
            }
        };
        self.phase = ResizePhase::Idle;
        outcome
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    pub(crate) struct FakeState {
        pub window: Option<Rect>,
        pub monitor: Rect,
        /// Smallest edge the fake compositor allows.
        pub min_edge: i32,
        pub moves: Vec<(i32, i32)>,
        pub nudges: Vec<(i32, i32)>,
        pub resizes: Vec<(u32, u32)>,
    }

    /// In-memory compositor. Clones share state so tests can inspect it after
    /// handing one to the resizer.
    #[derive(Debug, Clone, Default)]
    pub(crate) struct FakeWindow(pub Arc<Mutex<FakeState>>);

    impl FakeWindow {
        pub(crate) fn at(window: Rect) -> Self {
            Self(Arc::new(Mutex::new(FakeState {
                window: Some(window),
                monitor: Rect::new(0, 0, 1920, 1080),
                ..Default::default()
            })))
        }

        pub(crate) fn missing() -> Self {
            Self(Arc::new(Mutex::new(FakeState {
                monitor: Rect::new(0, 0, 1920, 1080),
                ..Default::default()
            })))
        }
    }

    impl WindowControl for FakeWindow {
        async fn snapshot(&self) -> Result<Option<WindowSnapshot>, HyprError> {
            let state = self.0.lock().unwrap();
            Ok(state.window.map(|window| WindowSnapshot {
                window,
                monitor: state.monitor,
            }))
        }

        async fn resize_to(&self, width: u32, height: u32) -> Result<(), HyprError> {
            let mut state = self.0.lock().unwrap();
            state.resizes.push((width, height));
            let min = state.min_edge;
            if let Some(w) = state.window.as_mut() {
                w.width = (width as i32).max(min);
                w.height = (height as i32).max(min);
            }
            Ok(())
        }

        async fn move_to(&self, x: i32, y: i32) -> Result<(), HyprError> {
            let mut state = self.0.lock().unwrap();
            state.moves.push((x, y));
            if let Some(w) = state.window.as_mut() {
                w.x = x;
                w.y = y;
            }
            Ok(())
        }

        async fn move_by(&self, dx: i32, dy: i32) -> Result<(), HyprError> {
            let mut state = self.0.lock().unwrap();
            state.nudges.push((dx, dy));
            match state.window.as_mut() {
                Some(w) => {
                    w.x += dx;
                    w.y += dy;
                    Ok(())
                }
                None => Err(HyprError::Rejected("No such window".into())),
            }
        }
    }
}
