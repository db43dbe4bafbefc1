use std::path::PathBuf;

pub const DAEMON_TCP_HOST: &str = "127.0.0.1";

pub fn daemon_address(port: u16) -> String {
    format!("{}:{}", DAEMON_TCP_HOST, port)
}

pub fn data_dir() -> PathBuf {
    // ~/.local/share/sleevie/ (XDG standard)
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".local")
        .join("share")
        .join("sleevie")
}

pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("sleevie")
}

pub fn temp_dir() -> PathBuf {
    std::env::temp_dir()
}

pub fn cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| temp_dir())
        .join("sleevie")
}

/// Locate the Hyprland request socket for the running instance.
///
/// Hyprland >= 0.40 keeps its sockets under `$XDG_RUNTIME_DIR/hypr/<sig>/`;
/// older releases used `/tmp/hypr/<sig>/`. Returns `None` when no instance
/// signature is exported (not running under Hyprland).
pub fn hyprland_socket_path() -> Option<PathBuf> {
    let signature = std::env::var("HYPRLAND_INSTANCE_SIGNATURE").ok()?;
    if signature.is_empty() {
        return None;
    }

    if let Some(runtime) = dirs::runtime_dir() {
        let candidate = runtime.join("hypr").join(&signature).join(".socket.sock");
        if candidate.exists() {
            return Some(candidate);
        }
    }

    Some(
        PathBuf::from("/tmp/hypr")
            .join(&signature)
            .join(".socket.sock"),
    )
}
