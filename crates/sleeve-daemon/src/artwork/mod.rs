//! High-resolution album artwork.
//!
//! ```text
//!   Track{artist, album}
//!         │
//!         ▼
//!   TrackKey ──► ArtworkStore (memory) ──hit──► path
//!         │             │
//!         │            miss
//!         │             ▼
//!         │      <cache>/<key>.jpg on disk ──hit──► path
//!         │             │
//!         │            miss, slot free
//!         ▼             ▼
//!   FetchTask ──► search ──► rewrite URL ──► download ──► persist ──► path
//! ```
//!
//! Only one remote lookup runs at a time. Requests that arrive while it is in
//! flight are dropped; the widget keeps showing the player's own artwork.

pub mod error;
pub mod fetcher;
pub mod key;
pub mod pipeline;
pub mod store;

#[cfg(test)]
pub(crate) mod test_server;

pub use error::ArtworkError;
pub use fetcher::RemoteArtworkFetcher;
pub use pipeline::{ArtworkPipeline, FetchCompletion, Resolution};
pub use store::ArtworkStore;
