//! Daemon settings CLI commands.

use clap::Subcommand;

use crate::bridge::BridgeCommand;
use crate::cli::client::Client;
use crate::cli::output;
use crate::error::MotionDeskError;
use crate::types::DaemonSettings;

/// Settings subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
#[command(next_display_order = None)]
pub enum SettingsCommands {
    /// Show the daemon settings.
    Get,

    /// Change one daemon setting.
    #[command(
        verbatim_doc_comment,
        after_long_help = r"Settings:
  allow_video_on_battery   Keep videos playing on battery power
  start_at_login           Launch the daemon at login
  show_notifications       Announce wallpaper changes

Examples:
  motiondesk settings set allow_video_on_battery true"
    )]
    Set {
        /// Setting name.
        #[arg(
            value_name = "NAME",
            value_parser = clap::builder::PossibleValuesParser::new(DaemonSettings::NAMES)
        )]
        name: String,

        /// New value.
        #[arg(value_name = "BOOL", action = clap::ArgAction::Set)]
        value: bool,
    },
}

/// Execute settings subcommands.
pub fn execute(cmd: &SettingsCommands, client: &Client, json: bool) -> Result<(), MotionDeskError> {
    let command = match cmd {
        SettingsCommands::Get => BridgeCommand::GetSettings,
        SettingsCommands::Set { name, value } => {
            BridgeCommand::SetSetting { name: name.clone(), value: *value }
        }
    };

    let data = client.send(&command)?;
    if json {
        output::print_json(&data);
    } else {
        let settings: DaemonSettings = serde_json::from_value(data)?;
        output::print_settings(&settings);
    }
    Ok(())
}
