//! Layout of the persisted state file.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::types::{AudioSettings, DaemonSettings, WallpaperConfig};

/// Current version of the state file layout.
///
/// Files written before the field existed deserialize as version `0`; every
/// missing section or field is filled with its default and the file is
/// rewritten at the current version on the next save.
pub const STATE_VERSION: u32 = 1;

/// Everything MotionDesk keeps across restarts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct PersistedState {
    /// Layout version of the file.
    #[serde(default)]
    pub version: u32,
    /// The wallpaper shown when the daemon last changed it.
    pub wallpaper: WallpaperConfig,
    /// Audio parameters for video wallpapers.
    pub audio: AudioSettings,
    /// Daemon-wide preferences.
    pub daemon: DaemonSettings,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            wallpaper: WallpaperConfig::none(),
            audio: AudioSettings::default(),
            daemon: DaemonSettings::default(),
        }
    }
}

impl PersistedState {
    /// Whether the file predates the current layout.
    #[must_use]
    pub const fn needs_upgrade(&self) -> bool { self.version < STATE_VERSION }
}

/// One section of the state to write.
#[derive(Debug, Clone, PartialEq)]
pub enum StateUpdate {
    Wallpaper(WallpaperConfig),
    Audio(AudioSettings),
    Daemon(DaemonSettings),
}

impl StateUpdate {
    /// Writes this section into `state` and stamps the current version.
    pub fn apply_to(self, state: &mut PersistedState) {
        match self {
            Self::Wallpaper(wallpaper) => state.wallpaper = wallpaper,
            Self::Audio(audio) => state.audio = audio,
            Self::Daemon(daemon) => state.daemon = daemon,
        }
        state.version = STATE_VERSION;
    }

    /// Section name, for logs.
    #[must_use]
    pub const fn section(&self) -> &'static str {
        match self {
            Self::Wallpaper(_) => "wallpaper",
            Self::Audio(_) => "audio",
            Self::Daemon(_) => "daemon",
        }
    }
}
