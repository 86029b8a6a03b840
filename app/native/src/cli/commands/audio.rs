//! Audio CLI commands.

use clap::Subcommand;

use crate::bridge::BridgeCommand;
use crate::cli::client::Client;
use crate::cli::output;
use crate::error::MotionDeskError;
use crate::types::AudioSettings;

/// Audio subcommands.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq)]
#[command(next_display_order = None)]
pub enum AudioCommands {
    /// Show the volume, or set it when a value is given.
    #[command(
        verbatim_doc_comment,
        after_long_help = r"Examples:
  motiondesk audio volume        # Show the audio settings
  motiondesk audio volume 0.3    # Set the volume to 30%"
    )]
    Volume {
        /// Volume from 0.0 to 1.0. Values outside the range are clamped.
        #[arg(value_name = "VOLUME", allow_negative_numbers = true)]
        volume: Option<f32>,
    },
    /// Mute the video wallpaper.
    Mute,
    /// Unmute the video wallpaper.
    Unmute,
    /// Toggle mute.
    #[command(name = "toggle-mute")]
    ToggleMute,
}

impl AudioCommands {
    const fn bridge_command(self) -> BridgeCommand {
        match self {
            Self::Volume { volume: None } => BridgeCommand::GetVolume,
            Self::Volume { volume: Some(volume) } => BridgeCommand::SetVolume { volume },
            Self::Mute => BridgeCommand::SetMuted { muted: true },
            Self::Unmute => BridgeCommand::SetMuted { muted: false },
            Self::ToggleMute => BridgeCommand::ToggleMute,
        }
    }
}

/// Execute audio subcommands.
pub fn execute(cmd: &AudioCommands, client: &Client, json: bool) -> Result<(), MotionDeskError> {
    let data = client.send(&cmd.bridge_command())?;

    if json {
        output::print_json(&data);
    } else {
        let audio: AudioSettings = serde_json::from_value(data)?;
        output::print_audio(&audio);
    }
    Ok(())
}
