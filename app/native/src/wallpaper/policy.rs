//! Power-driven playback policy.

use crate::types::{PowerState, WallpaperType};

/// Whether the power situation allows video playback.
#[must_use]
pub fn playback_allowed(power: PowerState, allow_video_on_battery: bool) -> bool {
    power == PowerState::PluggedIn || allow_video_on_battery
}

/// Whether the wallpaper player should be playing.
///
/// `None` when the wallpaper is not a video and there is nothing to drive.
/// A manual pause always wins.
#[must_use]
pub fn playback_decision(
    wallpaper_type: WallpaperType,
    manually_paused: bool,
    power: PowerState,
    allow_video_on_battery: bool,
) -> Option<bool> {
    if wallpaper_type != WallpaperType::Video {
        return None;
    }

    Some(!manually_paused && playback_allowed(power, allow_video_on_battery))
}
