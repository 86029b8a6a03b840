//! Wallpaper rendering and playback.
//!
//! - [`engine`] - the lifecycle engine and its notifications
//! - [`surfaces`] - the per-display resources of one wallpaper
//! - [`validate`] - source checks run before anything is built
//! - [`policy`] - the power-driven play/pause decision

pub mod engine;
pub mod policy;
pub mod surfaces;
pub mod validate;

pub use engine::{SettingsAccessor, WallpaperEngine, WallpaperState};
pub use surfaces::SurfaceSet;
