//! CLI output formatting.
//!
//! Human-readable output uses colored labels; `--json` prints the daemon's
//! data as pretty JSON instead.

use colored::Colorize;

use crate::bridge::{ResourceStats, Status};
use crate::types::{AudioSettings, DaemonSettings, WallpaperConfig};

/// Prints a value as pretty JSON.
pub fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string()));
}

/// Prints a one-line confirmation.
pub fn print_success(message: &str) {
    println!("{} {message}", "✓".green().bold());
}

fn print_row(label: &str, value: impl std::fmt::Display) {
    println!("{:>22}  {value}", label.cyan());
}

fn flag(value: bool) -> colored::ColoredString {
    if value { "on".green() } else { "off".dimmed() }
}

pub fn format_wallpaper(wallpaper: &WallpaperConfig) -> String {
    if wallpaper.is_none() {
        "none".to_string()
    } else {
        format!("{} ({})", wallpaper.wallpaper_type, wallpaper.file_path)
    }
}

pub fn print_status(status: &Status) {
    print_row("wallpaper", format_wallpaper(&status.wallpaper));
    let playback = match (status.is_playing, status.manually_paused) {
        (true, _) => "playing".green(),
        (false, true) => "paused (manual)".yellow(),
        (false, false) => "stopped".dimmed(),
    };
    print_row("playback", playback);
    print_row("surfaces", status.surfaces);
    print_row("power", status.power_state);
    print_audio(&status.audio);
    print_settings(&status.settings);
}

pub fn print_audio(audio: &AudioSettings) {
    #[allow(clippy::cast_possible_truncation)] // Volume is clamped to [0, 1]
    let percent = (audio.volume * 100.0).round() as i32;
    print_row("volume", format!("{percent}%"));
    print_row("muted", flag(audio.is_muted));
    print_row("mix with other audio", flag(audio.mix_with_other_audio));
}

pub fn print_settings(settings: &DaemonSettings) {
    print_row("allow_video_on_battery", flag(settings.allow_video_on_battery));
    print_row("start_at_login", flag(settings.start_at_login));
    print_row("show_notifications", flag(settings.show_notifications));
}

pub fn print_stats(stats: &ResourceStats) {
    print_row("memory", format!("{:.1} MB", stats.memory_mb));
    print_row("cpu", format!("{:.1}%", stats.cpu_percent));
}
