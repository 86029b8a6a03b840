//! Names of the notifications MotionDesk publishes.
//!
//! All events follow the pattern `motiondesk://<module>/<event-name>`. The
//! daemon logs every notification under its name so that log consumers can
//! follow state changes.

/// Wallpaper engine events.
pub mod wallpaper {
    /// A wallpaper was set or cleared, or video playback started or stopped.
    ///
    /// Payload: `{ wallpaperType, isPlaying }`
    pub const STATE_CHANGED: &str = "motiondesk://wallpaper/state-changed";
}

/// Audio controller events.
pub mod audio {
    /// Volume, mute or mix settings changed.
    ///
    /// Payload: `{ volume, isMuted, mixWithOtherAudio }`
    pub const SETTINGS_CHANGED: &str = "motiondesk://audio/settings-changed";
}

/// Power monitor events.
pub mod power {
    /// The machine switched between battery and mains power.
    ///
    /// Payload: `PowerState`
    pub const STATE_CHANGED: &str = "motiondesk://power/state-changed";
}

/// Daemon settings events.
pub mod settings {
    /// A daemon setting changed, from a command or an edit of the state file.
    ///
    /// Payload: `DaemonSettings`
    pub const CHANGED: &str = "motiondesk://settings/changed";
}

/// Application lifecycle events.
pub mod app {
    /// The wallpaper changed and the user asked to be told about it.
    ///
    /// Payload: `String` - the message to show.
    pub const NOTIFICATION: &str = "motiondesk://app/notification";

    /// The daemon is shutting down.
    ///
    /// Payload: `()` (no payload)
    pub const SHUTDOWN: &str = "motiondesk://app/shutdown";
}
