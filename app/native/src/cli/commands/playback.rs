//! Video playback CLI commands.

use clap::Subcommand;

use crate::bridge::BridgeCommand;
use crate::cli::client::Client;
use crate::cli::output;
use crate::error::MotionDeskError;

/// Playback subcommands.
///
/// A manual pause holds until `resume`, `toggle` or the next switch between
/// battery and mains power.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
#[command(next_display_order = None)]
pub enum PlaybackCommands {
    /// Pause a playing video, or resume a paused one.
    Toggle,
    /// Pause the video.
    Pause,
    /// Resume the video, even on battery.
    Resume,
}

impl PlaybackCommands {
    const fn bridge_command(self) -> BridgeCommand {
        match self {
            Self::Toggle => BridgeCommand::TogglePlayback,
            Self::Pause => BridgeCommand::PausePlayback,
            Self::Resume => BridgeCommand::ResumePlayback,
        }
    }
}

/// Execute playback subcommands.
pub fn execute(cmd: &PlaybackCommands, client: &Client, json: bool) -> Result<(), MotionDeskError> {
    let data = client.send(&cmd.bridge_command())?;

    if json {
        output::print_json(&data);
    } else if data["wallpaperType"] != "video" {
        println!("No video wallpaper is set.");
    } else if data["isPlaying"] == true {
        output::print_success("Playing.");
    } else {
        output::print_success("Paused.");
    }
    Ok(())
}
