//! Persisted state for MotionDesk.
//!
//! The daemon keeps the active wallpaper, the audio settings and the daemon
//! settings in one JSON file. The file tolerates `//` and `/* */` comments so
//! that it can be edited by hand; a running daemon picks up edits of the daemon
//! settings through [`watch_state_file`].

mod state;
mod store;
mod watcher;

use std::path::PathBuf;
use std::sync::OnceLock;

pub use state::{PersistedState, STATE_VERSION, StateUpdate};
pub use store::{JsonStateStore, MemoryStore, StateStore, StoreError, save_or_warn};
pub use watcher::{StateWatcher, watch_state_file};

use crate::constants::{CONFIG_DIR_NAME, STATE_FILE_NAME};

/// Custom state path override (set via the CLI `--state` flag).
static CUSTOM_STATE_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Sets a custom state file path to use instead of the default locations.
///
/// Must be called before [`state_file_path`] to take effect. Returns `false`
/// if a path was already set.
pub fn set_custom_state_path(path: PathBuf) -> bool { CUSTOM_STATE_PATH.set(path).is_ok() }

/// Returns the possible state file locations in priority order.
///
/// 1. `$XDG_CONFIG_HOME/motiondesk/state.json` (when set)
/// 2. `~/.config/motiondesk/state.json`
/// 3. The platform config directory (`~/Library/Application Support` on macOS)
#[must_use]
pub fn state_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
        && !xdg_config.is_empty()
    {
        paths.push(PathBuf::from(xdg_config).join(CONFIG_DIR_NAME).join(STATE_FILE_NAME));
    }

    if let Some(home) = dirs::home_dir() {
        let path = home.join(".config").join(CONFIG_DIR_NAME).join(STATE_FILE_NAME);
        if !paths.contains(&path) {
            paths.push(path);
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let path = config_dir.join(CONFIG_DIR_NAME).join(STATE_FILE_NAME);
        if !paths.contains(&path) {
            paths.push(path);
        }
    }

    paths
}

/// Returns the state file to use.
///
/// The custom override wins, then the first existing candidate, then the first
/// candidate (created on first save).
#[must_use]
pub fn state_file_path() -> PathBuf {
    if let Some(path) = CUSTOM_STATE_PATH.get() {
        return path.clone();
    }

    let candidates = state_paths();
    candidates
        .iter()
        .find(|path| path.exists())
        .or_else(|| candidates.first())
        .cloned()
        .unwrap_or_else(|| PathBuf::from(STATE_FILE_NAME))
}
