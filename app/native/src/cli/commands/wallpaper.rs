//! Wallpaper CLI commands.

use clap::Subcommand;

use crate::bridge::BridgeCommand;
use crate::cli::client::Client;
use crate::cli::output;
use crate::error::MotionDeskError;
use crate::types::WallpaperConfig;
use crate::utils::path::resolve_from_cwd;

/// Wallpaper subcommands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum WallpaperCommands {
    /// Show a still image on every display.
    #[command(
        verbatim_doc_comment,
        after_long_help = r"Examples:
  motiondesk wallpaper static ~/Pictures/mountain.jpg
  motiondesk wallpaper static ./sunset.png"
    )]
    Static {
        /// The image to show (JPEG, PNG or WebP).
        #[arg(value_name = "PATH")]
        path: String,
    },

    /// Show an animated image on every display.
    Dynamic {
        /// The animation to show (GIF, APNG or animated WebP).
        #[arg(value_name = "PATH")]
        path: String,
    },

    /// Play a looping video on every display.
    Video {
        /// The video to play (MP4, M4V or MOV).
        #[arg(value_name = "PATH")]
        path: String,
    },

    /// Remove the wallpaper.
    Clear,

    /// Show the current wallpaper.
    Status,
}

/// Execute wallpaper subcommands.
pub fn execute(
    cmd: &WallpaperCommands,
    client: &Client,
    json: bool,
) -> Result<(), MotionDeskError> {
    let command = match cmd {
        WallpaperCommands::Static { path } => {
            BridgeCommand::SetStaticWallpaper { path: absolute(path) }
        }
        WallpaperCommands::Dynamic { path } => {
            BridgeCommand::SetDynamicWallpaper { path: absolute(path) }
        }
        WallpaperCommands::Video { path } => {
            BridgeCommand::SetVideoWallpaper { path: absolute(path) }
        }
        WallpaperCommands::Clear => BridgeCommand::ClearWallpaper,
        WallpaperCommands::Status => return execute_status(client, json),
    };

    let data = client.send(&command)?;
    if json {
        output::print_json(&data);
    } else if matches!(cmd, WallpaperCommands::Clear) {
        output::print_success("Wallpaper cleared.");
    } else {
        output::print_success("Wallpaper set.");
    }
    Ok(())
}

fn execute_status(client: &Client, json: bool) -> Result<(), MotionDeskError> {
    let data = client.send(&BridgeCommand::Status)?;
    let wallpaper: WallpaperConfig = serde_json::from_value(data["wallpaper"].clone())?;

    if json {
        output::print_json(&data["wallpaper"]);
    } else {
        println!("{}", output::format_wallpaper(&wallpaper));
    }
    Ok(())
}

/// The daemon has its own working directory, so relative paths are resolved here.
fn absolute(path: &str) -> String { resolve_from_cwd(path).to_string_lossy().into_owned() }
