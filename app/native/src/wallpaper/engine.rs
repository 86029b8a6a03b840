//! Wallpaper lifecycle engine.
//!
//! Every wallpaper change runs the same sequence: tear the current
//! [`SurfaceSet`] down, validate the new source, build a fresh set for every
//! connected display, then record, persist and announce the new
//! configuration. A failed change leaves the desktop empty (`None`), it does
//! not fall back to the previous wallpaper.
//!
//! The engine also owns the [`PowerMonitor`] and [`AudioController`]: power
//! changes go through the engine so that the playback policy is applied on
//! the same context as every other operation.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc::UnboundedReceiver;

use super::policy;
use super::surfaces::SurfaceSet;
use super::validate;
use crate::audio::AudioController;
use crate::config::{StateStore, StateUpdate, save_or_warn};
use crate::platform::{DesktopBackend, PlatformError, SurfaceContent};
use crate::power::PowerMonitor;
use crate::types::{DaemonSettings, PowerState, WallpaperConfig, WallpaperError, WallpaperType};
use crate::utils::{SubscriptionId, Subscribers};

/// Reads the live daemon settings.
pub type SettingsAccessor = Box<dyn Fn() -> DaemonSettings + Send + Sync>;

/// Payload of a wallpaper state notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WallpaperState {
    pub wallpaper_type: WallpaperType,
    pub is_playing: bool,
}

/// Owns the wallpaper surfaces and drives video playback.
pub struct WallpaperEngine {
    backend: Arc<dyn DesktopBackend>,
    store: Arc<dyn StateStore>,
    power: PowerMonitor,
    audio: AudioController,
    config: WallpaperConfig,
    persisted: Option<WallpaperConfig>,
    surfaces: SurfaceSet,
    manually_paused: bool,
    settings: Option<SettingsAccessor>,
    subscribers: Subscribers<WallpaperState>,
    cleaned_up: bool,
}

impl std::fmt::Debug for WallpaperEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WallpaperEngine")
            .field("config", &self.config)
            .field("surfaces", &self.surfaces)
            .field("manually_paused", &self.manually_paused)
            .field("power", &self.power)
            .field("audio", &self.audio)
            .finish_non_exhaustive()
    }
}

impl WallpaperEngine {
    /// Creates an engine showing nothing.
    ///
    /// The wallpaper stored in `store` is remembered for [`restore`](Self::restore).
    #[must_use]
    pub fn new(
        backend: Arc<dyn DesktopBackend>,
        store: Arc<dyn StateStore>,
        power: PowerMonitor,
        audio: AudioController,
    ) -> Self {
        let persisted = match store.load() {
            Ok(state) => Some(state.wallpaper).filter(|config| !config.is_none()),
            Err(err) => {
                tracing::warn!(error = %err, "failed to load persisted wallpaper");
                None
            }
        };

        Self {
            backend,
            store,
            power,
            audio,
            config: WallpaperConfig::none(),
            persisted,
            surfaces: SurfaceSet::empty(),
            manually_paused: false,
            settings: None,
            subscribers: Subscribers::new(),
            cleaned_up: false,
        }
    }

    /// Shows `path` as a still image on every display.
    pub fn set_static_wallpaper(&mut self, path: impl AsRef<Path>) -> WallpaperError {
        self.transition(WallpaperType::StaticImage, path.as_ref(), false)
    }

    /// Shows `path` as an animated image on every display.
    pub fn set_dynamic_wallpaper(&mut self, path: impl AsRef<Path>) -> WallpaperError {
        self.transition(WallpaperType::Dynamic, path.as_ref(), false)
    }

    /// Plays `path` in a loop on every display, from a single shared player.
    ///
    /// Playback starts right away if the power policy allows it.
    pub fn set_video_wallpaper(&mut self, path: impl AsRef<Path>) -> WallpaperError {
        self.transition(WallpaperType::Video, path.as_ref(), false)
    }

    /// Removes the wallpaper. Does nothing (and notifies nobody) when there is
    /// none.
    pub fn clear_wallpaper(&mut self) {
        if self.config.is_none() && self.surfaces.is_empty() {
            return;
        }

        self.teardown();
        self.config = WallpaperConfig::none();
        save_or_warn(self.store.as_ref(), StateUpdate::Wallpaper(WallpaperConfig::none()));
        tracing::info!("wallpaper cleared");
        self.notify();
    }

    /// Current wallpaper configuration.
    #[must_use]
    pub fn get_current_wallpaper(&self) -> WallpaperConfig { self.config.clone() }

    /// Pauses a playing video or resumes a paused one.
    pub fn toggle_video_playback(&mut self) {
        if self.is_video_playing() {
            self.pause_video();
        } else {
            self.resume_video();
        }
    }

    /// Pauses the video until the user resumes it or the power source changes.
    pub fn pause_video(&mut self) {
        if !self.is_video() {
            return;
        }

        self.manually_paused = true;
        if self.surfaces.set_playing(false) {
            tracing::info!("video paused");
            self.notify();
        }
    }

    /// Resumes the video, whatever the power policy says.
    pub fn resume_video(&mut self) {
        if !self.is_video() {
            return;
        }

        self.manually_paused = false;
        if self.surfaces.set_playing(true) {
            tracing::info!("video resumed");
            self.notify();
        }
    }

    /// Whether a video wallpaper is playing.
    #[must_use]
    pub fn is_video_playing(&self) -> bool { self.is_video() && self.surfaces.is_playing() }

    /// Whether the user paused the video.
    #[must_use]
    pub const fn is_manually_paused(&self) -> bool { self.manually_paused }

    /// Snapshot sent to subscribers.
    #[must_use]
    pub fn current_state(&self) -> WallpaperState {
        WallpaperState {
            wallpaper_type: self.config.wallpaper_type,
            is_playing: self.is_video_playing(),
        }
    }

    /// Registers the primary callback, replacing the previous one.
    pub fn set_wallpaper_state_callback<F>(&self, callback: F) -> SubscriptionId
    where F: Fn(&WallpaperState) + Send + Sync + 'static {
        self.subscribers.replace_primary(callback)
    }

    /// Adds an independent subscriber.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where F: Fn(&WallpaperState) + Send + Sync + 'static {
        self.subscribers.subscribe(callback)
    }

    /// Adds a subscriber that receives changes over a channel.
    pub fn subscribe_channel(&self) -> (SubscriptionId, UnboundedReceiver<WallpaperState>) {
        self.subscribers.subscribe_channel()
    }

    /// Removes a subscriber.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool { self.subscribers.unsubscribe(id) }

    /// Supplies the accessor used to read the daemon settings.
    ///
    /// It is called every time the policy is evaluated; the engine never keeps
    /// the returned value.
    pub fn set_settings_callback<F>(&mut self, accessor: F)
    where F: Fn() -> DaemonSettings + Send + Sync + 'static {
        self.settings = Some(Box::new(accessor));
    }

    /// Resolves a power feed notification and applies the policy.
    pub fn handle_power_source_change(&mut self) {
        if let Some(state) = self.power.handle_power_source_change() {
            self.on_power_state(state);
        }
    }

    /// Samples the power source now and applies the policy on a change.
    pub fn force_power_update(&mut self) {
        if let Some(state) = self.power.force_update() {
            self.on_power_state(state);
        }
    }

    /// Applies the policy after the daemon settings changed.
    ///
    /// A manual pause is kept.
    pub fn reevaluate_policy(&mut self) {
        if self.apply_policy() {
            self.notify();
        }
    }

    /// Rebuilds the current wallpaper for the displays connected now.
    ///
    /// A manual pause survives the rebuild.
    pub fn rebuild_surfaces(&mut self) -> WallpaperError {
        if self.config.is_none() {
            return WallpaperError::None;
        }

        let config = self.config.clone();
        tracing::info!(kind = %config.wallpaper_type, "rebuilding wallpaper surfaces");
        self.transition(config.wallpaper_type, Path::new(&config.file_path), true)
    }

    /// Re-applies the wallpaper that was persisted when the engine started.
    ///
    /// Returns `WallpaperError::None` when there was nothing to restore.
    pub fn restore(&mut self) -> WallpaperError {
        let Some(config) = self.persisted.take() else {
            return WallpaperError::None;
        };

        tracing::info!(
            kind = %config.wallpaper_type,
            path = %config.file_path,
            "restoring wallpaper"
        );
        let result = self.transition(config.wallpaper_type, Path::new(&config.file_path), false);
        if !result.is_ok() {
            tracing::warn!(
                error = %result,
                path = %config.file_path,
                "failed to restore wallpaper"
            );
        }
        result
    }

    /// Releases every surface and stops power monitoring. Safe to call more
    /// than once.
    ///
    /// The persisted wallpaper is kept so the next start can restore it.
    pub fn cleanup(&mut self) {
        if self.cleaned_up {
            return;
        }

        self.teardown();
        self.config = WallpaperConfig::none();
        self.power.cleanup();
        self.subscribers.clear();
        self.cleaned_up = true;
        tracing::debug!("wallpaper engine cleaned up");
    }

    /// Number of live surfaces.
    #[must_use]
    pub fn surface_count(&self) -> usize { self.surfaces.len() }

    /// The power monitor.
    #[must_use]
    pub const fn power(&self) -> &PowerMonitor { &self.power }

    /// The power monitor, mutably (to start its feed).
    pub const fn power_mut(&mut self) -> &mut PowerMonitor { &mut self.power }

    /// The audio controller.
    #[must_use]
    pub const fn audio(&self) -> &AudioController { &self.audio }

    /// The audio controller, mutably.
    pub const fn audio_mut(&mut self) -> &mut AudioController { &mut self.audio }

    /// Current power state.
    #[must_use]
    pub const fn power_state(&self) -> PowerState { self.power.get_current_state() }

    fn is_video(&self) -> bool { self.config.wallpaper_type == WallpaperType::Video }

    fn daemon_settings(&self) -> DaemonSettings {
        self.settings.as_ref().map_or_else(DaemonSettings::default, |accessor| accessor())
    }

    fn transition(
        &mut self,
        kind: WallpaperType,
        path: &Path,
        keep_manual_pause: bool,
    ) -> WallpaperError {
        if self.cleaned_up {
            tracing::warn!("wallpaper engine is shut down, ignoring change");
            return WallpaperError::Unknown;
        }

        let was_showing = !self.config.is_none() || !self.surfaces.is_empty();
        let manually_paused = keep_manual_pause && self.manually_paused;

        self.teardown();
        self.config = WallpaperConfig::none();

        if let Err(err) = self.build(kind, path) {
            tracing::warn!(%kind, path = %path.display(), error = %err, "failed to set wallpaper");
            save_or_warn(self.store.as_ref(), StateUpdate::Wallpaper(WallpaperConfig::none()));
            if was_showing {
                self.notify();
            }
            return err;
        }

        self.config = WallpaperConfig::new(kind, path.to_string_lossy());
        self.manually_paused = manually_paused;
        save_or_warn(self.store.as_ref(), StateUpdate::Wallpaper(self.config.clone()));
        self.apply_policy();

        tracing::info!(
            %kind,
            path = %path.display(),
            surfaces = self.surfaces.len(),
            playing = self.is_video_playing(),
            "wallpaper set"
        );
        self.notify();
        WallpaperError::None
    }

    fn build(&mut self, kind: WallpaperType, path: &Path) -> Result<(), WallpaperError> {
        validate::check_source(path)?;
        let displays = self.backend.connected_displays();

        self.surfaces = match kind {
            WallpaperType::StaticImage => {
                validate::probe_still_image(path)?;
                let content = SurfaceContent::StillImage(path.to_path_buf());
                SurfaceSet::build_images(self.backend.as_ref(), &displays, kind, &content)
                    .map_err(|err| surface_error(&err))?
            }
            WallpaperType::Dynamic => {
                validate::probe_animation(path)?;
                let content = SurfaceContent::AnimatedImage(path.to_path_buf());
                SurfaceSet::build_images(self.backend.as_ref(), &displays, kind, &content)
                    .map_err(|err| surface_error(&err))?
            }
            WallpaperType::Video => {
                if !validate::is_supported_video(path) {
                    return Err(WallpaperError::UnplayableVideo);
                }
                let player = self.backend.load_video(path).map_err(|err| video_error(&err))?;
                let set = SurfaceSet::build_video(
                    self.backend.as_ref(),
                    &displays,
                    Arc::clone(&player),
                )
                .map_err(|err| surface_error(&err))?;
                self.audio.configure_for_video(&player);
                set
            }
            WallpaperType::None => return Err(WallpaperError::Unknown),
        };

        Ok(())
    }

    fn teardown(&mut self) {
        self.surfaces.teardown(self.backend.as_ref());
        self.audio.cleanup();
        self.manually_paused = false;
    }

    fn on_power_state(&mut self, state: PowerState) {
        // A real power transition overrides an earlier manual pause.
        self.manually_paused = false;
        if self.apply_policy() {
            let playing = self.is_video_playing();
            tracing::info!(power = %state, playing, "playback follows power");
            self.notify();
        }
    }

    /// Returns `true` if the playback state changed.
    fn apply_policy(&mut self) -> bool {
        let decision = policy::playback_decision(
            self.config.wallpaper_type,
            self.manually_paused,
            self.power.get_current_state(),
            self.daemon_settings().allow_video_on_battery,
        );

        decision.is_some_and(|play| self.surfaces.set_playing(play))
    }

    fn notify(&self) {
        let state = self.current_state();
        tracing::debug!(?state, "wallpaper state changed");
        self.subscribers.emit(&state);
    }
}

impl Drop for WallpaperEngine {
    fn drop(&mut self) { self.cleanup(); }
}

fn surface_error(err: &PlatformError) -> WallpaperError {
    if err.is_permission_denied() {
        WallpaperError::SystemPermissionDenied
    } else {
        WallpaperError::Unknown
    }
}

fn video_error(err: &PlatformError) -> WallpaperError {
    match err {
        _ if err.is_permission_denied() => WallpaperError::SystemPermissionDenied,
        PlatformError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
            WallpaperError::FileNotFound
        }
        _ => WallpaperError::UnplayableVideo,
    }
}
