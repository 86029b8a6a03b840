//! CLI command definitions using Clap.
//!
//! Commands are organized into domain-specific submodules:
//!
//! - `wallpaper` - set, clear and inspect the wallpaper
//! - `playback` - pause and resume video wallpapers
//! - `audio` - volume and mute
//! - `settings` - daemon settings

use std::io;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Generator, Shell, generate};

use super::client::Client;
use super::output;
use crate::bridge::{BridgeCommand, ResourceStats, Status};
use crate::cache::get_socket_path;
use crate::daemon::{self, DaemonOptions};
use crate::error::MotionDeskError;
use crate::{config, schema};

pub mod audio;
pub mod playback;
pub mod settings;
pub mod wallpaper;

pub use audio::AudioCommands;
pub use playback::PlaybackCommands;
pub use settings::SettingsCommands;
pub use wallpaper::WallpaperCommands;

/// Application version from Cargo.toml.
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// MotionDesk - animated and video desktop wallpapers.
#[derive(Parser, Debug)]
#[command(name = "motiondesk")]
#[command(author, version = APP_VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a custom state file.
    ///
    /// Overrides the default state file search paths. Only used by the
    /// daemon.
    #[arg(long, global = true, value_name = "PATH")]
    pub state: Option<String>,

    /// Path of the daemon's IPC socket.
    #[arg(long, global = true, value_name = "PATH", env = "MOTIONDESK_SOCKET")]
    pub socket: Option<PathBuf>,

    /// Print the daemon's answer as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum Commands {
    /// Run the daemon in the foreground.
    #[command(
        verbatim_doc_comment,
        after_long_help = r"Examples:
  motiondesk daemon                 # State in ~/.config/motiondesk/state.json
  motiondesk daemon --displays 2    # Render on two displays
  motiondesk daemon --ephemeral     # Keep state in memory only"
    )]
    Daemon {
        /// Number of displays to render on.
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        displays: u32,

        /// Don't read or write the state file.
        #[arg(long)]
        ephemeral: bool,
    },

    /// Wallpaper commands.
    #[command(subcommand)]
    Wallpaper(WallpaperCommands),

    /// Video playback commands.
    #[command(subcommand)]
    Playback(PlaybackCommands),

    /// Video wallpaper audio commands.
    #[command(subcommand)]
    Audio(AudioCommands),

    /// Daemon settings commands.
    #[command(subcommand)]
    Settings(SettingsCommands),

    /// Show the daemon's state.
    Status,

    /// Show the daemon's memory and CPU use.
    Stats,

    /// Stop the running daemon.
    Stop,

    /// Output the state file JSON Schema.
    ///
    /// Can be redirected to a file for use with editors that support JSON
    /// Schema validation.
    Schema,

    /// Generate shell completions.
    ///
    /// Usage:
    ///   eval "$(motiondesk completions --shell zsh)"
    ///   motiondesk completions --shell fish > ~/.config/fish/completions/motiondesk.fish
    Completions {
        /// The shell to generate completions for.
        #[arg(long, short, value_enum)]
        shell: Shell,
    },
}

impl Cli {
    /// Returns the custom state path if specified via --state.
    #[must_use]
    pub fn state_path(&self) -> Option<PathBuf> { self.state.as_ref().map(PathBuf::from) }

    /// Socket to reach the daemon on.
    #[must_use]
    pub fn socket_path(&self) -> PathBuf { self.socket.clone().unwrap_or_else(get_socket_path) }

    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command execution fails.
    pub fn execute(&self) -> Result<(), MotionDeskError> {
        if let Some(path) = self.state_path() {
            config::set_custom_state_path(path);
        }

        let client = Client::new(self.socket_path());

        match &self.command {
            Commands::Daemon { displays, ephemeral } => daemon::run(&DaemonOptions {
                displays: *displays,
                ephemeral: *ephemeral,
                socket_path: self.socket_path(),
            }),
            Commands::Wallpaper(cmd) => wallpaper::execute(cmd, &client, self.json),
            Commands::Playback(cmd) => playback::execute(cmd, &client, self.json),
            Commands::Audio(cmd) => audio::execute(cmd, &client, self.json),
            Commands::Settings(cmd) => settings::execute(cmd, &client, self.json),

            Commands::Status => {
                let data = client.send(&BridgeCommand::Status)?;
                if self.json {
                    output::print_json(&data);
                } else {
                    let status: Status = serde_json::from_value(data)?;
                    output::print_status(&status);
                }
                Ok(())
            }

            Commands::Stats => {
                let data = client.send(&BridgeCommand::ResourceStats)?;
                if self.json {
                    output::print_json(&data);
                } else {
                    let stats: ResourceStats = serde_json::from_value(data)?;
                    output::print_stats(&stats);
                }
                Ok(())
            }

            Commands::Stop => {
                client.send(&BridgeCommand::Shutdown)?;
                output::print_success("Daemon stopped.");
                Ok(())
            }

            Commands::Schema => {
                println!("{}", schema::generate_schema_json());
                Ok(())
            }

            Commands::Completions { shell } => {
                Self::print_completions(*shell);
                Ok(())
            }
        }
    }

    /// Print shell completions to stdout.
    fn print_completions<G: Generator>(generator: G) {
        let mut cmd = Self::command();
        generate(generator, &mut cmd, "motiondesk", &mut io::stdout());
    }
}
