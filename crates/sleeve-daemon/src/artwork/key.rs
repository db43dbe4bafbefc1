use std::fmt;

/// Canonical identity of an (artist, album) pair.
///
/// Characters outside `[A-Za-z0-9-]` become `_` and the result is
/// lower-cased, so inputs that differ only by case or punctuation share a key.
/// The key doubles as the cache file stem.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackKey(String);

impl TrackKey {
    /// `None` when either half is blank: there is nothing worth looking up.
    pub fn for_track(artist: &str, album: &str) -> Option<Self> {
        if artist.trim().is_empty() || album.trim().is_empty() {
            return None;
        }
        Some(Self(normalize(artist, album)))
    }

    #[cfg(test)]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn file_name(&self) -> String {
        format!("{}.jpg", self.0)
    }
}

impl fmt::Display for TrackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn normalize(artist: &str, album: &str) -> String {
    format!("{}-{}", artist, album)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}
