//! Path helpers for wallpaper sources supplied by the user.
//!
//! The CLI and the daemon run with different working directories, so every
//! path is made absolute on the client side before it crosses the socket.

use std::path::{Path, PathBuf};

/// Expands a leading `~` to the user's home directory.
///
/// Whitespace around the input is ignored. Relative paths are returned as-is.
#[must_use]
pub fn expand(path: &str) -> PathBuf {
    let path = path.trim();

    if path.is_empty() {
        return PathBuf::new();
    }

    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Expands `~` and resolves relative paths against `base_dir`.
///
/// An empty input stays empty so that callers can report it as missing.
#[must_use]
pub fn resolve_source_path(path: &str, base_dir: &Path) -> PathBuf {
    let expanded = expand(path);

    if expanded.as_os_str().is_empty() || expanded.is_absolute() {
        return expanded;
    }

    base_dir.join(expanded)
}

/// Resolves a user-supplied path against the current working directory.
///
/// Falls back to plain `~` expansion when the working directory is unavailable.
#[must_use]
pub fn resolve_from_cwd(path: &str) -> PathBuf {
    std::env::current_dir().map_or_else(|_| expand(path), |cwd| resolve_source_path(path, &cwd))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_keeps_empty_input_empty() {
        assert_eq!(expand("   "), PathBuf::new());
    }

    #[test]
    fn expand_replaces_tilde() {
        let result = expand("~/Movies/loop.mp4");
        assert!(!result.to_string_lossy().starts_with('~'));
        assert!(result.to_string_lossy().ends_with("Movies/loop.mp4"));
    }

    #[test]
    fn resolve_joins_relative_paths() {
        let base = PathBuf::from("/Users/me/Pictures");
        assert_eq!(
            resolve_source_path("wall.png", &base),
            PathBuf::from("/Users/me/Pictures/wall.png")
        );
    }

    #[test]
    fn resolve_leaves_absolute_paths() {
        let base = PathBuf::from("/Users/me/Pictures");
        assert_eq!(
            resolve_source_path(" /opt/walls/a.gif ", &base),
            PathBuf::from("/opt/walls/a.gif")
        );
    }

    #[test]
    fn resolve_does_not_join_tilde_paths() {
        let base = PathBuf::from("/base");
        let result = resolve_source_path("~/clip.mov", &base);
        assert!(!result.to_string_lossy().starts_with("/base"));
        assert!(result.to_string_lossy().ends_with("clip.mov"));
    }

    #[test]
    fn resolve_empty_is_empty() {
        assert_eq!(resolve_source_path("", Path::new("/base")), PathBuf::new());
    }
}
