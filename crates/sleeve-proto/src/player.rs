use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    Playing,
    Paused,
    #[default]
    Stopped,
}

/// One media player as reported by the player state provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PlayerRecord {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub album: String,
    /// Low-resolution art the player already exposes. May be a URI or a bare
    /// filesystem path.
    #[serde(default)]
    pub cover_art: Option<String>,
    #[serde(default)]
    pub status: PlaybackStatus,
}

impl PlayerRecord {
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "Nothing playing"
        } else {
            &self.title
        }
    }

    /// Cover art as a URI the widget can load directly. Players commonly hand
    /// out bare paths for local files, which get a `file://` scheme.
    pub fn cover_art_uri(&self) -> Option<String> {
        let art = self.cover_art.as_deref()?.trim();
        if art.is_empty() {
            return None;
        }
        if art.starts_with('/') {
            Some(format!("file://{}", art))
        } else {
            Some(art.to_string())
        }
    }
}

/// The provider's list is ordered; the overlay only mirrors the first entry.
pub fn active_player(players: &[PlayerRecord]) -> Option<&PlayerRecord> {
    players.first()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_art(art: Option<&str>) -> PlayerRecord {
        PlayerRecord {
            cover_art: art.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn bare_path_gets_file_scheme() {
        assert_eq!(
            with_art(Some("/tmp/cover.png")).cover_art_uri().as_deref(),
            Some("file:///tmp/cover.png")
        );
    }

    #[test]
    fn uris_pass_through() {
        assert_eq!(
            with_art(Some("https://i.scdn.co/image/abc")).cover_art_uri().as_deref(),
            Some("https://i.scdn.co/image/abc")
        );
        assert_eq!(
            with_art(Some("file:///a.jpg")).cover_art_uri().as_deref(),
            Some("file:///a.jpg")
        );
    }

    #[test]
    fn missing_or_blank_art_is_none() {
        assert_eq!(with_art(None).cover_art_uri(), None);
        assert_eq!(with_art(Some("  ")).cover_art_uri(), None);
    }

    #[test]
    fn display_title_placeholder() {
        assert_eq!(PlayerRecord::default().display_title(), "Nothing playing");
    }

    #[test]
    fn first_player_wins() {
        let players = vec![
            PlayerRecord {
                title: "a".into(),
                ..Default::default()
            },
            PlayerRecord {
                title: "b".into(),
                ..Default::default()
            },
        ];
        assert_eq!(active_player(&players).map(|p| p.title.as_str()), Some("a"));
        assert!(active_player(&[]).is_none());
    }
}
