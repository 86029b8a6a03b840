//! Window-server-free implementation of the platform traits.
//!
//! Surfaces and layers are bookkeeping entries and players only track their
//! transport state. Every call is logged so the daemon's behaviour can be
//! followed with `RUST_LOG=motiondesk_lib=debug`.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::{
    DisplayId, DisplaySource, EndOfStreamHandler, LayerHandle, MediaLoader, MediaPlayer,
    ObserverToken, PlatformError, SurfaceContent, SurfaceFactory, SurfaceHandle,
};

/// In-process desktop backend.
#[derive(Debug)]
pub struct HeadlessBackend {
    displays: Mutex<Vec<DisplayId>>,
    next_handle: AtomicU64,
    surfaces: Mutex<HashMap<SurfaceHandle, (DisplayId, SurfaceContent)>>,
    layers: Mutex<HashMap<LayerHandle, SurfaceHandle>>,
    players: Mutex<Vec<Weak<HeadlessPlayer>>>,
    failing_display: Mutex<Option<DisplayId>>,
    surfaces_created: AtomicUsize,
}

impl HeadlessBackend {
    /// Creates a backend reporting `display_count` displays.
    #[must_use]
    pub fn new(display_count: u32) -> Self {
        Self {
            displays: Mutex::new((0..display_count).map(DisplayId).collect()),
            next_handle: AtomicU64::new(1),
            surfaces: Mutex::new(HashMap::new()),
            layers: Mutex::new(HashMap::new()),
            players: Mutex::new(Vec::new()),
            failing_display: Mutex::new(None),
            surfaces_created: AtomicUsize::new(0),
        }
    }

    /// Simulates connecting or disconnecting displays.
    pub fn set_display_count(&self, display_count: u32) {
        *self.displays.lock() = (0..display_count).map(DisplayId).collect();
    }

    /// Makes surface creation fail on `display` (or never, with `None`).
    pub fn fail_surfaces_on(&self, display: Option<DisplayId>) {
        *self.failing_display.lock() = display;
    }

    /// Number of surfaces currently alive.
    #[must_use]
    pub fn live_surfaces(&self) -> usize { self.surfaces.lock().len() }

    /// Number of presentation layers currently attached.
    #[must_use]
    pub fn live_layers(&self) -> usize { self.layers.lock().len() }

    /// Total number of surfaces created since the backend was built.
    #[must_use]
    pub fn surfaces_created(&self) -> usize { self.surfaces_created.load(Ordering::SeqCst) }

    /// Content shown by every live surface, ordered by display.
    #[must_use]
    pub fn surface_contents(&self) -> Vec<(DisplayId, SurfaceContent)> {
        let mut contents: Vec<_> = self.surfaces.lock().values().cloned().collect();
        contents.sort_by_key(|(display, _)| *display);
        contents
    }

    /// The most recently loaded player that is still alive.
    #[must_use]
    pub fn last_player(&self) -> Option<Arc<HeadlessPlayer>> {
        self.players.lock().iter().rev().find_map(Weak::upgrade)
    }

    fn next_handle(&self) -> u64 { self.next_handle.fetch_add(1, Ordering::SeqCst) }
}

impl Default for HeadlessBackend {
    fn default() -> Self { Self::new(1) }
}

impl DisplaySource for HeadlessBackend {
    fn connected_displays(&self) -> Vec<DisplayId> { self.displays.lock().clone() }
}

impl SurfaceFactory for HeadlessBackend {
    fn create_surface(
        &self,
        display: DisplayId,
        content: &SurfaceContent,
    ) -> Result<SurfaceHandle, PlatformError> {
        if *self.failing_display.lock() == Some(display) {
            return Err(PlatformError::Surface(format!(
                "display {} rejected the surface",
                display.0
            )));
        }

        let handle = SurfaceHandle(self.next_handle());
        self.surfaces.lock().insert(handle, (display, content.clone()));
        self.surfaces_created.fetch_add(1, Ordering::SeqCst);
        let id = display.0;
        tracing::debug!(surface = handle.0, display = id, ?content, "surface created");
        Ok(handle)
    }

    fn destroy_surface(&self, surface: SurfaceHandle) -> Result<(), PlatformError> {
        self.surfaces
            .lock()
            .remove(&surface)
            .map(|_| tracing::debug!(surface = surface.0, "surface destroyed"))
            .ok_or_else(|| PlatformError::UnknownHandle(format!("surface {}", surface.0)))
    }

    fn attach_player(
        &self,
        surface: SurfaceHandle,
        _player: &Arc<dyn MediaPlayer>,
    ) -> Result<LayerHandle, PlatformError> {
        if !self.surfaces.lock().contains_key(&surface) {
            return Err(PlatformError::UnknownHandle(format!("surface {}", surface.0)));
        }

        let layer = LayerHandle(self.next_handle());
        self.layers.lock().insert(layer, surface);
        tracing::debug!(layer = layer.0, surface = surface.0, "player layer attached");
        Ok(layer)
    }

    fn detach_layer(&self, layer: LayerHandle) -> Result<(), PlatformError> {
        self.layers
            .lock()
            .remove(&layer)
            .map(|_| tracing::debug!(layer = layer.0, "player layer detached"))
            .ok_or_else(|| PlatformError::UnknownHandle(format!("layer {}", layer.0)))
    }
}

impl MediaLoader for HeadlessBackend {
    fn load_video(&self, path: &Path) -> Result<Arc<dyn MediaPlayer>, PlatformError> {
        let mut file = std::fs::File::open(path)?;
        let mut header = [0u8; 1];
        if file.read(&mut header)? == 0 {
            return Err(PlatformError::Media(format!(
                "{} contains no media data",
                path.display()
            )));
        }

        let player = Arc::new(HeadlessPlayer::new(path.to_path_buf()));
        self.players.lock().push(Arc::downgrade(&player));
        tracing::debug!(path = %path.display(), "video loaded");
        Ok(player)
    }
}

type SharedHandler = Arc<dyn Fn() + Send + Sync>;

/// Player that records transport and audio calls.
pub struct HeadlessPlayer {
    path: PathBuf,
    playing: AtomicBool,
    muted: AtomicBool,
    mix_with_others: AtomicBool,
    volume: Mutex<f32>,
    restarts: AtomicUsize,
    next_token: AtomicU64,
    observers: Mutex<Vec<(ObserverToken, SharedHandler)>>,
}

impl std::fmt::Debug for HeadlessPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadlessPlayer")
            .field("path", &self.path)
            .field("playing", &self.is_playing())
            .field("volume", &self.volume())
            .field("muted", &self.is_muted())
            .finish_non_exhaustive()
    }
}

impl HeadlessPlayer {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            playing: AtomicBool::new(false),
            muted: AtomicBool::new(false),
            mix_with_others: AtomicBool::new(true),
            volume: Mutex::new(1.0),
            restarts: AtomicUsize::new(0),
            next_token: AtomicU64::new(1),
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Source file of this player.
    #[must_use]
    pub fn path(&self) -> &Path { &self.path }

    /// Whether the player is currently playing.
    #[must_use]
    pub fn is_playing(&self) -> bool { self.playing.load(Ordering::SeqCst) }

    /// Last volume applied to the player.
    #[must_use]
    pub fn volume(&self) -> f32 { *self.volume.lock() }

    /// Whether the player is muted.
    #[must_use]
    pub fn is_muted(&self) -> bool { self.muted.load(Ordering::SeqCst) }

    /// Whether the player mixes with other audio.
    #[must_use]
    pub fn mixes_with_others(&self) -> bool { self.mix_with_others.load(Ordering::SeqCst) }

    /// Number of times the position was moved back to the start.
    #[must_use]
    pub fn restarts(&self) -> usize { self.restarts.load(Ordering::SeqCst) }

    /// Number of registered end-of-stream observers.
    #[must_use]
    pub fn observer_count(&self) -> usize { self.observers.lock().len() }

    /// Simulates reaching the end of the media.
    pub fn finish(&self) {
        self.playing.store(false, Ordering::SeqCst);
        let handlers: Vec<SharedHandler> =
            self.observers.lock().iter().map(|(_, handler)| Arc::clone(handler)).collect();
        for handler in handlers {
            handler();
        }
    }
}

impl MediaPlayer for HeadlessPlayer {
    fn play(&self) { self.playing.store(true, Ordering::SeqCst) }

    fn pause(&self) { self.playing.store(false, Ordering::SeqCst) }

    fn seek_to_start(&self) { self.restarts.fetch_add(1, Ordering::SeqCst); }

    fn set_volume(&self, volume: f32) { *self.volume.lock() = volume }

    fn set_muted(&self, muted: bool) { self.muted.store(muted, Ordering::SeqCst) }

    fn set_mix_with_others(&self, mix: bool) { self.mix_with_others.store(mix, Ordering::SeqCst) }

    fn observe_end_of_stream(&self, handler: EndOfStreamHandler) -> ObserverToken {
        let token = ObserverToken(self.next_token.fetch_add(1, Ordering::SeqCst));
        self.observers.lock().push((token, Arc::from(handler)));
        token
    }

    fn remove_observer(&self, token: ObserverToken) {
        self.observers.lock().retain(|(existing, _)| *existing != token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_configured_displays() {
        let backend = HeadlessBackend::new(3);
        assert_eq!(
            backend.connected_displays(),
            vec![DisplayId(0), DisplayId(1), DisplayId(2)]
        );

        backend.set_display_count(1);
        assert_eq!(backend.connected_displays().len(), 1);
    }

    #[test]
    fn surfaces_are_tracked_until_destroyed() {
        let backend = HeadlessBackend::new(1);
        let surface = backend
            .create_surface(DisplayId(0), &SurfaceContent::StillImage("a.png".into()))
            .unwrap();
        assert_eq!(backend.live_surfaces(), 1);

        backend.destroy_surface(surface).unwrap();
        assert_eq!(backend.live_surfaces(), 0);
        assert!(backend.destroy_surface(surface).is_err());
    }

    #[test]
    fn failing_display_rejects_surfaces() {
        let backend = HeadlessBackend::new(2);
        backend.fail_surfaces_on(Some(DisplayId(1)));

        assert!(backend.create_surface(DisplayId(0), &SurfaceContent::VideoHost).is_ok());
        assert!(backend.create_surface(DisplayId(1), &SurfaceContent::VideoHost).is_err());
    }

    #[test]
    fn load_video_rejects_missing_and_empty_files() {
        let backend = HeadlessBackend::new(1);
        assert!(backend.load_video(Path::new("/nonexistent/clip.mp4")).is_err());

        let empty = tempfile::Builder::new().suffix(".mp4").tempfile().unwrap();
        assert!(matches!(
            backend.load_video(empty.path()),
            Err(PlatformError::Media(_))
        ));
    }

    #[test]
    fn player_end_of_stream_runs_observers() {
        let player = HeadlessPlayer::new(PathBuf::from("clip.mp4"));
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let token = player.observe_end_of_stream(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        player.finish();
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        player.remove_observer(token);
        player.finish();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(player.observer_count(), 0);
    }
}
