//! Owned collection of the resources behind one wallpaper.
//!
//! A [`SurfaceSet`] is built wholesale for every connected display or not at
//! all: a failure half-way releases what was already created before the error
//! is returned. It is never patched in place, only torn down and rebuilt.

use std::sync::Arc;

use crate::platform::{
    DesktopBackend, DisplayId, LayerHandle, MediaPlayer, ObserverToken, PlatformError,
    SurfaceContent, SurfaceHandle,
};
use crate::types::WallpaperType;

struct VideoPlayback {
    player: Arc<dyn MediaPlayer>,
    layers: Vec<LayerHandle>,
    end_observer: Option<ObserverToken>,
    playing: bool,
}

/// Surfaces, and for videos the shared player and its layers.
pub struct SurfaceSet {
    kind: WallpaperType,
    surfaces: Vec<(DisplayId, SurfaceHandle)>,
    video: Option<VideoPlayback>,
}

impl std::fmt::Debug for SurfaceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceSet")
            .field("kind", &self.kind)
            .field("surfaces", &self.surfaces)
            .field("playing", &self.is_playing())
            .finish_non_exhaustive()
    }
}

impl Default for SurfaceSet {
    fn default() -> Self { Self::empty() }
}

impl SurfaceSet {
    /// The set of a wallpaper-less desktop.
    #[must_use]
    pub const fn empty() -> Self {
        Self { kind: WallpaperType::None, surfaces: Vec::new(), video: None }
    }

    /// Creates one image surface per display.
    ///
    /// # Errors
    ///
    /// Returns the first surface failure, after closing the surfaces already
    /// created.
    pub fn build_images(
        backend: &dyn DesktopBackend,
        displays: &[DisplayId],
        kind: WallpaperType,
        content: &SurfaceContent,
    ) -> Result<Self, PlatformError> {
        let surfaces = create_surfaces(backend, displays, content)?;
        tracing::debug!(%kind, surfaces = surfaces.len(), "image surfaces built");
        Ok(Self { kind, surfaces, video: None })
    }

    /// Creates one video host surface per display, all presenting `player`.
    ///
    /// The player loops: reaching the end seeks back to the start and plays
    /// again. It is left paused; the caller decides whether to start it.
    ///
    /// # Errors
    ///
    /// Returns the first surface or layer failure, after releasing everything
    /// already created.
    pub fn build_video(
        backend: &dyn DesktopBackend,
        displays: &[DisplayId],
        player: Arc<dyn MediaPlayer>,
    ) -> Result<Self, PlatformError> {
        let surfaces = create_surfaces(backend, displays, &SurfaceContent::VideoHost)?;

        let mut layers = Vec::with_capacity(surfaces.len());
        for (display_id, surface) in &surfaces {
            match backend.attach_player(*surface, &player) {
                Ok(layer) => layers.push(layer),
                Err(err) => {
                    let id = display_id.0;
                    tracing::warn!(display = id, error = %err, "failed to attach video layer");
                    release_layers(backend, &layers);
                    release_surfaces(backend, &surfaces);
                    return Err(err);
                }
            }
        }

        let looping = Arc::downgrade(&player);
        let end_observer = player.observe_end_of_stream(Box::new(move || {
            if let Some(player) = looping.upgrade() {
                player.seek_to_start();
                player.play();
            }
        }));

        tracing::debug!(surfaces = surfaces.len(), "video surfaces built");
        Ok(Self {
            kind: WallpaperType::Video,
            surfaces,
            video: Some(VideoPlayback {
                player,
                layers,
                end_observer: Some(end_observer),
                playing: false,
            }),
        })
    }

    /// Releases everything, best effort. Failures are logged and skipped.
    pub fn teardown(&mut self, backend: &dyn DesktopBackend) {
        if let Some(mut video) = self.video.take() {
            video.player.pause();
            if let Some(token) = video.end_observer.take() {
                video.player.remove_observer(token);
            }
            release_layers(backend, &video.layers);
        }

        release_surfaces(backend, &self.surfaces);
        if !self.surfaces.is_empty() {
            let surfaces = self.surfaces.len();
            tracing::debug!(kind = %self.kind, surfaces, "surfaces torn down");
        }

        *self = Self::empty();
    }

    /// Whether nothing is built.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.kind == WallpaperType::None && self.surfaces.is_empty() }

    /// Number of live surfaces.
    #[must_use]
    pub fn len(&self) -> usize { self.surfaces.len() }

    /// Whether the video player is playing.
    #[must_use]
    pub fn is_playing(&self) -> bool { self.video.as_ref().is_some_and(|video| video.playing) }

    /// Starts or pauses the video player.
    ///
    /// Returns `true` if the playback state changed.
    pub fn set_playing(&mut self, playing: bool) -> bool {
        let Some(video) = self.video.as_mut() else {
            return false;
        };

        if video.playing == playing {
            return false;
        }

        if playing {
            video.player.play();
        } else {
            video.player.pause();
        }
        video.playing = playing;
        true
    }
}

fn create_surfaces(
    backend: &dyn DesktopBackend,
    displays: &[DisplayId],
    content: &SurfaceContent,
) -> Result<Vec<(DisplayId, SurfaceHandle)>, PlatformError> {
    let mut surfaces = Vec::with_capacity(displays.len());

    for display_id in displays {
        match backend.create_surface(*display_id, content) {
            Ok(surface) => surfaces.push((*display_id, surface)),
            Err(err) => {
                let id = display_id.0;
                tracing::warn!(display = id, error = %err, "failed to create surface");
                release_surfaces(backend, &surfaces);
                return Err(err);
            }
        }
    }

    Ok(surfaces)
}

fn release_layers(backend: &dyn DesktopBackend, layers: &[LayerHandle]) {
    for layer in layers {
        if let Err(err) = backend.detach_layer(*layer) {
            tracing::warn!(layer = layer.0, error = %err, "failed to release video layer");
        }
    }
}

fn release_surfaces(backend: &dyn DesktopBackend, surfaces: &[(DisplayId, SurfaceHandle)]) {
    for (display_id, surface) in surfaces {
        if let Err(err) = backend.destroy_surface(*surface) {
            let id = display_id.0;
            tracing::warn!(display = id, error = %err, "failed to close surface");
        }
    }
}
