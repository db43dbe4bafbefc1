use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info};

use super::error::ArtworkError;
use super::fetcher::{FetchRequest, RemoteArtworkFetcher};
use super::key::TrackKey;
use super::store::ArtworkStore;

/// What `resolve` decided. Only `Cached`, `OnDisk` and `Fetch` carry work for
/// the caller; everything else means "keep showing the fallback".
#[derive(Debug)]
pub enum Resolution {
    /// Artist or album blank; nothing to look up.
    Skipped,
    /// Same track as the previous call.
    Unchanged,
    /// Already resolved earlier in this run.
    Cached(PathBuf),
    /// Found in the cache directory from an earlier run.
    OnDisk(PathBuf),
    /// A lookup for this key was already attempted (dropped or failed).
    AlreadyAttempted,
    /// Another lookup holds the slot; this request is discarded.
    Dropped,
    /// Slot taken. Run the task and hand its result to `complete`.
    Fetch(FetchTask),
}

/// One remote lookup, ready to be spawned.
#[derive(Debug)]
pub struct FetchTask {
    key: TrackKey,
    request: FetchRequest,
    fetcher: RemoteArtworkFetcher,
}

impl FetchTask {
    pub async fn run(self) -> FetchCompletion {
        let outcome = self.fetcher.fetch(&self.request).await;
        FetchCompletion {
            key: self.key,
            outcome,
        }
    }
}

/// A finished lookup. The key tells `complete` which track it belongs to.
#[derive(Debug)]
pub struct FetchCompletion {
    pub key: TrackKey,
    pub outcome: Result<PathBuf, ArtworkError>,
}

/// Owns the artwork cache and the single in-flight lookup slot.
///
/// All methods take `&mut self` and are driven from the core event loop, so the
/// slot needs no lock: the loop's execution order is the mutex.
pub struct ArtworkPipeline {
    store: ArtworkStore,
    fetcher: RemoteArtworkFetcher,
    pending: Option<TrackKey>,
    /// The track currently on screen. A completion is shown only if it
    /// belongs to this key.
    last_key: Option<TrackKey>,
    /// Keys whose remote lookup was started or dropped. Never retried.
    attempted: HashSet<TrackKey>,
}

impl ArtworkPipeline {
    pub fn new(store: ArtworkStore, fetcher: RemoteArtworkFetcher) -> Self {
        Self {
            store,
            fetcher,
            pending: None,
            last_key: None,
            attempted: HashSet::new(),
        }
    }

    #[cfg(test)]
    pub fn store(&self) -> &ArtworkStore {
        &self.store
    }

    #[cfg(test)]
    pub fn pending(&self) -> Option<&TrackKey> {
        self.pending.as_ref()
    }

    /// The current track went away. In-flight results will still be cached
    /// but no longer displayed.
    pub fn clear(&mut self) {
        self.last_key = None;
    }

    pub fn resolve(&mut self, artist: &str, album: &str) -> Resolution {
        let Some(key) = TrackKey::for_track(artist, album) else {
            self.clear();
            return Resolution::Skipped;
        };

        if self.last_key.as_ref() == Some(&key) {
            return Resolution::Unchanged;
        }
        self.last_key = Some(key.clone());

        if let Some(path) = self.store.get(&key) {
            return Resolution::Cached(path.to_path_buf());
        }

        if self.attempted.contains(&key) {
            return Resolution::AlreadyAttempted;
        }

        if let Some(busy) = &self.pending {
            debug!("artwork: {} dropped, {} in flight", key, busy);
            self.attempted.insert(key);
            return Resolution::Dropped;
        }

        // The slot is held across the disk probe too, then released at once.
        self.pending = Some(key.clone());
        if let Some(path) = self.store.probe_disk(&key) {
            self.pending = None;
            return Resolution::OnDisk(path);
        }

        self.attempted.insert(key.clone());
        info!("artwork: searching for {}", key);
        Resolution::Fetch(FetchTask {
            request: FetchRequest {
                artist: artist.to_string(),
                album: album.to_string(),
                destination: self.store.path_for(&key),
            },
            key,
            fetcher: self.fetcher.clone(),
        })
    }

    /// Release the slot and record a successful download. Returns the path
    /// only when the completed lookup is for the track now on screen, even if
    /// other tracks played in between.
    pub fn complete(&mut self, done: FetchCompletion) -> Option<PathBuf> {
        self.pending = None;

        let path = match done.outcome {
            Ok(path) => path,
            Err(e) => {
                debug!("artwork: lookup for {} failed: {}", done.key, e);
                return None;
            }
        };

        self.store.insert(done.key.clone(), path);
        let stored = self.store.get(&done.key).map(|p| p.to_path_buf());

        if self.last_key.as_ref() != Some(&done.key) {
            debug!("artwork: {} finished after track changed, not shown", done.key);
            return None;
        }
        stored
    }
}
