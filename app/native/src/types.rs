//! Shared data model for MotionDesk.
//!
//! These types cross every boundary of the application: the engine, the
//! persisted state file, the IPC protocol and the CLI output. Each enum carries
//! a stable integer code (used by external bridges) and a human-readable name.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Power source the machine is currently running from.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub enum PowerState {
    /// Running on battery power.
    OnBattery,
    /// Connected to an external power adapter.
    PluggedIn,
    /// The power source could not be determined.
    #[default]
    Unknown,
}

impl PowerState {
    /// Returns the stable integer code of this state.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::OnBattery => 0,
            Self::PluggedIn => 1,
            Self::Unknown => 2,
        }
    }

    /// Converts an integer code back into a state. Unknown codes map to `Unknown`.
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            0 => Self::OnBattery,
            1 => Self::PluggedIn,
            _ => Self::Unknown,
        }
    }

    /// Returns the display name of this state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OnBattery => "battery",
            Self::PluggedIn => "plugged in",
            Self::Unknown => "unknown",
        }
    }

    /// Whether the reading is a definite battery/AC answer.
    #[must_use]
    pub const fn is_determinate(self) -> bool { !matches!(self, Self::Unknown) }
}

impl std::fmt::Display for PowerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of wallpaper currently displayed.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub enum WallpaperType {
    /// No wallpaper is displayed.
    #[default]
    None,
    /// A single still image.
    StaticImage,
    /// A multi-frame (animated) image.
    Dynamic,
    /// A looping video.
    Video,
}

impl WallpaperType {
    /// Returns the stable integer code of this type.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::None => 0,
            Self::StaticImage => 1,
            Self::Dynamic => 2,
            Self::Video => 3,
        }
    }

    /// Converts an integer code back into a type. Unknown codes map to `None`.
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            1 => Self::StaticImage,
            2 => Self::Dynamic,
            3 => Self::Video,
            _ => Self::None,
        }
    }

    /// Returns the display name of this type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::StaticImage => "static image",
            Self::Dynamic => "dynamic",
            Self::Video => "video",
        }
    }
}

impl std::fmt::Display for WallpaperType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a wallpaper operation.
///
/// This is a value returned from every `set_*` call rather than a fault:
/// `WallpaperError::None` means success.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WallpaperError {
    /// The operation succeeded.
    #[default]
    #[error("no error")]
    None,
    /// The source file does not exist.
    #[error("file not found")]
    FileNotFound,
    /// The source file is not a decodable image of the requested kind.
    #[error("invalid format")]
    InvalidFormat,
    /// The source file cannot be played as a video.
    #[error("unplayable video")]
    UnplayableVideo,
    /// The system refused access to the file or to the display.
    #[error("system permission denied")]
    SystemPermissionDenied,
    /// Any other failure.
    #[error("unknown error")]
    Unknown,
}

impl WallpaperError {
    /// Whether this value represents success.
    #[must_use]
    pub const fn is_ok(self) -> bool { matches!(self, Self::None) }

    /// Converts the value into a `Result`, mapping `None` to `Ok(())`.
    ///
    /// # Errors
    ///
    /// Returns `Err(self)` for every variant other than `None`.
    pub const fn into_result(self) -> Result<(), Self> {
        if self.is_ok() { Ok(()) } else { Err(self) }
    }

    /// Returns the stable integer code of this error.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::None => 0,
            Self::FileNotFound => 1,
            Self::InvalidFormat => 2,
            Self::UnplayableVideo => 3,
            Self::SystemPermissionDenied => 4,
            Self::Unknown => 5,
        }
    }

    /// Converts an integer code back into an error. Unknown codes map to `Unknown`.
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            0 => Self::None,
            1 => Self::FileNotFound,
            2 => Self::InvalidFormat,
            3 => Self::UnplayableVideo,
            4 => Self::SystemPermissionDenied,
            _ => Self::Unknown,
        }
    }
}

/// The wallpaper that is currently displayed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct WallpaperConfig {
    /// Kind of wallpaper.
    #[serde(rename = "type")]
    pub wallpaper_type: WallpaperType,
    /// Path of the source file. Empty when `wallpaper_type` is `None`.
    pub file_path: String,
}

impl WallpaperConfig {
    /// Creates a configuration for the given type and path.
    #[must_use]
    pub fn new(wallpaper_type: WallpaperType, file_path: impl Into<String>) -> Self {
        Self { wallpaper_type, file_path: file_path.into() }
    }

    /// The empty configuration (`{None, ""}`).
    #[must_use]
    pub const fn none() -> Self {
        Self {
            wallpaper_type: WallpaperType::None,
            file_path: String::new(),
        }
    }

    /// Whether no wallpaper is configured.
    #[must_use]
    pub const fn is_none(&self) -> bool { matches!(self.wallpaper_type, WallpaperType::None) }
}

/// Audio parameters applied to video wallpapers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct AudioSettings {
    /// Volume from 0.0 to 1.0.
    pub volume: f32,
    /// Whether audio is muted.
    pub is_muted: bool,
    /// Whether wallpaper audio mixes with other applications' audio.
    pub mix_with_other_audio: bool,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            volume: 0.5,
            is_muted: false,
            mix_with_other_audio: true,
        }
    }
}

impl AudioSettings {
    /// Returns a copy with the volume clamped to `[0.0, 1.0]`.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            volume: clamp_volume(self.volume),
            ..self
        }
    }
}

/// Clamps a volume level to `[0.0, 1.0]`. `NaN` becomes silence.
#[must_use]
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) }
}

/// Daemon-wide preferences read by the wallpaper engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct DaemonSettings {
    /// Keep video wallpapers playing while on battery.
    pub allow_video_on_battery: bool,
    /// Launch the daemon at login.
    pub start_at_login: bool,
    /// Show a notification when the wallpaper changes.
    pub show_notifications: bool,
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            allow_video_on_battery: false,
            start_at_login: true,
            show_notifications: false,
        }
    }
}

impl DaemonSettings {
    /// Names accepted by [`DaemonSettings::set_by_name`].
    pub const NAMES: [&'static str; 3] =
        ["allow_video_on_battery", "start_at_login", "show_notifications"];

    /// Sets a flag by its snake_case or camelCase name.
    ///
    /// Returns `false` if the name is not a known setting.
    pub fn set_by_name(&mut self, name: &str, value: bool) -> bool {
        match name {
            "allow_video_on_battery" | "allowVideoOnBattery" => self.allow_video_on_battery = value,
            "start_at_login" | "startAtLogin" => self.start_at_login = value,
            "show_notifications" | "showNotifications" => self.show_notifications = value,
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_state_codes_round_trip() {
        for state in [PowerState::OnBattery, PowerState::PluggedIn, PowerState::Unknown] {
            assert_eq!(PowerState::from_code(state.code()), state);
        }
        assert_eq!(PowerState::from_code(42), PowerState::Unknown);
    }

    #[test]
    fn power_state_names() {
        assert_eq!(PowerState::OnBattery.to_string(), "battery");
        assert_eq!(PowerState::PluggedIn.to_string(), "plugged in");
        assert!(!PowerState::Unknown.is_determinate());
    }

    #[test]
    fn wallpaper_type_codes_match_bridge_values() {
        assert_eq!(WallpaperType::None.code(), 0);
        assert_eq!(WallpaperType::StaticImage.code(), 1);
        assert_eq!(WallpaperType::Dynamic.code(), 2);
        assert_eq!(WallpaperType::Video.code(), 3);
        assert_eq!(WallpaperType::from_code(-1), WallpaperType::None);
    }

    #[test]
    fn wallpaper_error_into_result() {
        assert!(WallpaperError::None.into_result().is_ok());
        assert_eq!(
            WallpaperError::FileNotFound.into_result(),
            Err(WallpaperError::FileNotFound)
        );
        assert_eq!(WallpaperError::UnplayableVideo.to_string(), "unplayable video");
        assert_eq!(WallpaperError::from_code(4), WallpaperError::SystemPermissionDenied);
    }

    #[test]
    fn wallpaper_config_serializes_type_tag() {
        let config = WallpaperConfig::new(WallpaperType::Video, "/tmp/clip.mp4");
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"type":"video","filePath":"/tmp/clip.mp4"}"#);
    }

    #[test]
    fn audio_settings_defaults_fill_missing_fields() {
        let settings: AudioSettings = serde_json::from_str(r#"{"isMuted":true}"#).unwrap();
        assert!(settings.is_muted);
        assert!((settings.volume - 0.5).abs() < f32::EPSILON);
        assert!(settings.mix_with_other_audio);
    }

    #[test]
    fn clamp_volume_handles_out_of_range_and_nan() {
        assert!((clamp_volume(-1.0) - 0.0).abs() < f32::EPSILON);
        assert!((clamp_volume(5.0) - 1.0).abs() < f32::EPSILON);
        assert!((clamp_volume(f32::NAN) - 0.0).abs() < f32::EPSILON);
    }

    #[test]
    fn daemon_settings_set_by_name() {
        let mut settings = DaemonSettings::default();
        assert!(settings.set_by_name("allow_video_on_battery", true));
        assert!(settings.allow_video_on_battery);
        assert!(settings.set_by_name("showNotifications", true));
        assert!(settings.show_notifications);
        assert!(!settings.set_by_name("volume", true));
    }
}
