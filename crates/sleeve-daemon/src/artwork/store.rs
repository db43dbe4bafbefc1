use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::key::TrackKey;

/// In-memory index of resolved artwork, backed by one file per key in the
/// cache directory.
///
/// Entries are never replaced or evicted; the map lives as long as the daemon.
pub struct ArtworkStore {
    dir: PathBuf,
    entries: HashMap<TrackKey, PathBuf>,
}

impl ArtworkStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            entries: HashMap::new(),
        }
    }

    pub fn ensure_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn get(&self, key: &TrackKey) -> Option<&Path> {
        self.entries.get(key).map(PathBuf::as_path)
    }

    /// Register `path` for `key`. An existing entry wins; returns whether the
    /// new path was stored.
    pub fn insert(&mut self, key: TrackKey, path: PathBuf) -> bool {
        match self.entries.entry(key) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(path);
                true
            }
        }
    }

    /// Where the image for `key` lives on disk, whether or not it exists yet.
    pub fn path_for(&self, key: &TrackKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Adopt a file left by an earlier run. Registers and returns it when
    /// present.
    pub fn probe_disk(&mut self, key: &TrackKey) -> Option<PathBuf> {
        let path = self.path_for(key);
        if !path.is_file() {
            return None;
        }
        self.insert(key.clone(), path.clone());
        Some(path)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(artist: &str, album: &str) -> TrackKey {
        TrackKey::for_track(artist, album).unwrap()
    }

    #[test]
    fn first_entry_is_never_overwritten() {
        let mut store = ArtworkStore::new(PathBuf::from("/cache"));
        let k = key("Daft Punk", "Discovery");
        assert!(store.insert(k.clone(), PathBuf::from("/cache/a.jpg")));
        assert!(!store.insert(k.clone(), PathBuf::from("/cache/b.jpg")));
        assert_eq!(store.get(&k), Some(Path::new("/cache/a.jpg")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn probe_disk_adopts_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ArtworkStore::new(dir.path().to_path_buf());
        let k = key("Air", "Moon Safari");

        assert!(store.probe_disk(&k).is_none());
        assert!(store.is_empty());

        std::fs::write(dir.path().join("air-moon_safari.jpg"), b"jpeg").unwrap();
        let found = store.probe_disk(&k).unwrap();
        assert_eq!(found, dir.path().join("air-moon_safari.jpg"));
        assert_eq!(store.get(&k), Some(found.as_path()));
    }

    #[test]
    fn ensure_dir_creates_nested_cache_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("a").join("sleevie");
        let store = ArtworkStore::new(root.clone());
        store.ensure_dir().unwrap();
        assert!(root.is_dir());
        assert_eq!(store.dir(), root.as_path());
    }
}
