//! MotionDesk - animated and video desktop wallpapers with power-aware playback.
//!
//! The library holds the wallpaper engine and everything around it: the power
//! observer, the audio controller, the persisted state, the daemon loop, the
//! IPC transport and the CLI.

// Core
pub mod audio;
pub mod power;
pub mod types;
pub mod wallpaper;

// Collaborators and state
pub mod config;
pub mod platform;

// Outer surfaces
pub mod bridge;
pub mod cli;
pub mod daemon;
pub mod ipc;

pub mod cache;
pub mod constants;
pub mod error;
pub mod events;
pub mod schema;
pub mod utils;

pub use bridge::{BridgeCommand, MotionDesk};
pub use error::MotionDeskError;
pub use wallpaper::WallpaperEngine;
