//! Collaborators supplied by the host platform.
//!
//! The wallpaper engine never talks to windowing or media APIs directly. It
//! drives these traits instead:
//!
//! - [`DisplaySource`] - enumerates connected displays
//! - [`SurfaceFactory`] - creates and destroys per-display rendering surfaces
//!   and attaches video presentation layers to them
//! - [`MediaLoader`] - opens a video file as a shared [`MediaPlayer`]
//!
//! [`headless::HeadlessBackend`] implements all of them without a window
//! server; it backs the daemon on hosts without a native backend and the
//! test-suite.

pub mod headless;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

pub use headless::{HeadlessBackend, HeadlessPlayer};

/// Opaque identifier of a connected display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DisplayId(pub u32);

/// Handle to a rendering surface owned by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SurfaceHandle(pub u64);

/// Handle to a video presentation layer attached to a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LayerHandle(pub u64);

/// Token returned when registering an end-of-stream observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverToken(pub u64);

/// What a newly created surface should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceContent {
    /// A still image.
    StillImage(PathBuf),
    /// A multi-frame image that animates on its own.
    AnimatedImage(PathBuf),
    /// An empty host for a video presentation layer.
    VideoHost,
}

/// Errors reported by platform collaborators.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The system refused the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// A surface or layer could not be created.
    #[error("surface error: {0}")]
    Surface(String),
    /// A media file could not be opened for playback.
    #[error("media error: {0}")]
    Media(String),
    /// The handle does not refer to a live resource.
    #[error("unknown handle: {0}")]
    UnknownHandle(String),
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlatformError {
    /// Whether the failure is a permission refusal.
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::PermissionDenied(_) => true,
            Self::Io(err) => err.kind() == std::io::ErrorKind::PermissionDenied,
            _ => false,
        }
    }
}

/// Callback invoked when a player reaches the end of its media.
pub type EndOfStreamHandler = Box<dyn Fn() + Send + Sync>;

/// Shared media decode/transport object.
///
/// One player drives every display of a video wallpaper. Implementations use
/// interior mutability so the player can be shared through `Arc`.
pub trait MediaPlayer: Send + Sync {
    /// Starts or resumes playback.
    fn play(&self);

    /// Pauses playback.
    fn pause(&self);

    /// Moves the playback position back to the start.
    fn seek_to_start(&self);

    /// Sets the output volume (0.0 to 1.0).
    fn set_volume(&self, volume: f32);

    /// Mutes or unmutes the output.
    fn set_muted(&self, muted: bool);

    /// Whether the player's audio mixes with other applications.
    fn set_mix_with_others(&self, mix: bool);

    /// Registers a callback for the end of the stream.
    ///
    /// Hosts must deliver the callback on the daemon's event loop thread.
    fn observe_end_of_stream(&self, handler: EndOfStreamHandler) -> ObserverToken;

    /// Removes a previously registered end-of-stream callback.
    fn remove_observer(&self, token: ObserverToken);
}

/// Enumerates the displays currently connected.
pub trait DisplaySource {
    /// Returns the connected displays in a stable order.
    fn connected_displays(&self) -> Vec<DisplayId>;
}

/// Creates and destroys per-display rendering surfaces.
pub trait SurfaceFactory {
    /// Creates a desktop-level surface on `display` showing `content`.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface cannot be created.
    fn create_surface(
        &self,
        display: DisplayId,
        content: &SurfaceContent,
    ) -> Result<SurfaceHandle, PlatformError>;

    /// Closes a surface.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is unknown or the close fails.
    fn destroy_surface(&self, surface: SurfaceHandle) -> Result<(), PlatformError>;

    /// Attaches a presentation layer for `player` to `surface`.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer cannot be created.
    fn attach_player(
        &self,
        surface: SurfaceHandle,
        player: &Arc<dyn MediaPlayer>,
    ) -> Result<LayerHandle, PlatformError>;

    /// Releases a presentation layer.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is unknown or the release fails.
    fn detach_layer(&self, layer: LayerHandle) -> Result<(), PlatformError>;
}

/// Opens media files for playback.
pub trait MediaLoader {
    /// Loads `path` as a paused, shareable player.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be decoded or played.
    fn load_video(&self, path: &Path) -> Result<Arc<dyn MediaPlayer>, PlatformError>;
}

/// Everything the wallpaper engine needs from the host.
pub trait DesktopBackend: DisplaySource + SurfaceFactory + MediaLoader + Send + Sync {}

impl<T> DesktopBackend for T where T: DisplaySource + SurfaceFactory + MediaLoader + Send + Sync {}
