//! Inbound operation surface of MotionDesk.
//!
//! [`MotionDesk`] wires the power monitor, the audio controller and the
//! wallpaper engine together and exposes exactly the operations a front-end
//! needs: wallpaper commands, playback and audio controls, daemon settings and
//! process statistics. [`BridgeCommand`] is the serialized form of the same
//! operations, used over IPC.

use std::sync::{Arc, LazyLock};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};

use crate::audio::AudioController;
use crate::config::{StateStore, StateUpdate, save_or_warn};
use crate::error::MotionDeskError;
use crate::events;
use crate::platform::DesktopBackend;
use crate::power::{PowerMonitor, PowerSource};
use crate::types::{
    AudioSettings, DaemonSettings, PowerState, WallpaperConfig, WallpaperError, WallpaperType,
};
use crate::utils::path::expand;
use crate::wallpaper::WallpaperEngine;

/// A request to the running daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BridgeCommand {
    /// Checks that the daemon answers.
    Ping,
    /// Full state snapshot.
    Status,
    SetStaticWallpaper { path: String },
    SetDynamicWallpaper { path: String },
    SetVideoWallpaper { path: String },
    ClearWallpaper,
    TogglePlayback,
    PausePlayback,
    ResumePlayback,
    /// Rebuilds the wallpaper after a display change.
    RebuildSurfaces,
    GetVolume,
    SetVolume { volume: f32 },
    SetMuted { muted: bool },
    ToggleMute,
    GetSettings,
    SetSetting { name: String, value: bool },
    ResourceStats,
    /// Stops the daemon.
    Shutdown,
}

/// Snapshot returned by [`BridgeCommand::Status`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub power_state: PowerState,
    pub wallpaper: WallpaperConfig,
    pub is_playing: bool,
    pub manually_paused: bool,
    pub surfaces: usize,
    pub audio: AudioSettings,
    pub settings: DaemonSettings,
}

/// Memory and CPU use of the daemon process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStats {
    /// Resident memory in megabytes.
    pub memory_mb: f64,
    /// CPU usage since the previous sample, in percent of one core.
    pub cpu_percent: f32,
}

/// Process sampler, kept alive so CPU usage is measured between calls.
static SYSTEM: LazyLock<Mutex<System>> = LazyLock::new(|| Mutex::new(System::new()));

/// Samples the memory and CPU use of the current process.
///
/// The first sample reports 0% CPU.
#[must_use]
#[allow(clippy::cast_precision_loss)] // Precision loss is acceptable for display
pub fn get_resource_stats() -> ResourceStats {
    let Ok(pid) = sysinfo::get_current_pid() else {
        return ResourceStats::default();
    };

    let mut system = SYSTEM.lock();
    system.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[pid]),
        true,
        ProcessRefreshKind::nothing().with_memory().with_cpu(),
    );

    system.process(pid).map_or_else(ResourceStats::default, |process| ResourceStats {
        memory_mb: process.memory() as f64 / (1024.0 * 1024.0),
        cpu_percent: process.cpu_usage(),
    })
}

/// The application core.
pub struct MotionDesk {
    engine: WallpaperEngine,
    settings: Arc<RwLock<DaemonSettings>>,
    store: Arc<dyn StateStore>,
}

impl std::fmt::Debug for MotionDesk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotionDesk")
            .field("engine", &self.engine)
            .field("settings", &*self.settings.read())
            .finish_non_exhaustive()
    }
}

impl MotionDesk {
    /// Builds the core over the given collaborators.
    ///
    /// Nothing is displayed until [`WallpaperEngine::restore`] or a set
    /// command runs.
    #[must_use]
    pub fn new(
        backend: Arc<dyn DesktopBackend>,
        store: Arc<dyn StateStore>,
        power_source: Arc<dyn PowerSource>,
    ) -> Self {
        let daemon_settings = match store.load() {
            Ok(state) => state.daemon,
            Err(err) => {
                tracing::warn!(error = %err, "failed to load daemon settings, using defaults");
                DaemonSettings::default()
            }
        };
        let settings = Arc::new(RwLock::new(daemon_settings));

        let power = PowerMonitor::new(power_source);
        let audio = AudioController::new(Arc::clone(&store));
        let mut engine = WallpaperEngine::new(backend, Arc::clone(&store), power, audio);

        let accessor = Arc::clone(&settings);
        engine.set_settings_callback(move || *accessor.read());

        Self { engine, settings, store }
    }

    /// The wallpaper engine.
    #[must_use]
    pub const fn engine(&self) -> &WallpaperEngine { &self.engine }

    /// The wallpaper engine, mutably.
    pub const fn engine_mut(&mut self) -> &mut WallpaperEngine { &mut self.engine }

    /// Shared handle to the live daemon settings.
    #[must_use]
    pub fn settings_handle(&self) -> Arc<RwLock<DaemonSettings>> { Arc::clone(&self.settings) }

    /// Last known power state.
    #[must_use]
    pub const fn get_power_state(&self) -> PowerState { self.engine.power_state() }

    /// Kind of the current wallpaper.
    #[must_use]
    pub fn get_wallpaper_type(&self) -> WallpaperType {
        self.engine.get_current_wallpaper().wallpaper_type
    }

    /// Source path of the current wallpaper, empty when there is none.
    #[must_use]
    pub fn get_wallpaper_path(&self) -> String { self.engine.get_current_wallpaper().file_path }

    /// Whether a video wallpaper is playing.
    #[must_use]
    pub fn is_playing(&self) -> bool { self.engine.is_video_playing() }

    /// Shows a still image, `~` expanded.
    pub fn set_static_wallpaper(&mut self, path: &str) -> WallpaperError {
        self.engine.set_static_wallpaper(expand(path))
    }

    /// Shows an animated image, `~` expanded.
    pub fn set_dynamic_wallpaper(&mut self, path: &str) -> WallpaperError {
        self.engine.set_dynamic_wallpaper(expand(path))
    }

    /// Shows a looping video, `~` expanded.
    pub fn set_video_wallpaper(&mut self, path: &str) -> WallpaperError {
        self.engine.set_video_wallpaper(expand(path))
    }

    /// Removes the wallpaper.
    pub fn clear_wallpaper(&mut self) { self.engine.clear_wallpaper(); }

    /// Pauses or resumes the video wallpaper.
    pub fn toggle_playback(&mut self) { self.engine.toggle_video_playback(); }

    /// Audible volume, `0.0` while muted.
    #[must_use]
    pub const fn get_volume(&self) -> f32 { self.engine.audio().get_volume() }

    /// Sets the volume, clamped to `[0.0, 1.0]`.
    pub fn set_volume(&mut self, volume: f32) { self.engine.audio_mut().set_volume(volume); }

    /// Whether audio is muted.
    #[must_use]
    pub const fn is_muted(&self) -> bool { self.engine.audio().is_muted() }

    /// Flips the mute state.
    pub fn toggle_mute(&mut self) { self.engine.audio_mut().toggle_mute(); }

    /// Current daemon settings.
    #[must_use]
    pub fn get_settings(&self) -> DaemonSettings { *self.settings.read() }

    /// Changes one daemon setting by name and persists it.
    ///
    /// Changing `allow_video_on_battery` re-applies the playback policy; a
    /// manual pause is kept.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArguments` for an unknown setting name.
    pub fn set_setting(
        &mut self,
        name: &str,
        value: bool,
    ) -> Result<DaemonSettings, MotionDeskError> {
        let mut updated = self.get_settings();
        if !updated.set_by_name(name, value) {
            return Err(MotionDeskError::InvalidArguments(format!(
                "unknown setting '{name}', expected one of: {}",
                DaemonSettings::NAMES.join(", ")
            )));
        }

        save_or_warn(self.store.as_ref(), StateUpdate::Daemon(updated));
        self.apply_settings(updated);
        Ok(updated)
    }

    /// Re-reads the daemon settings from the store, after an external edit.
    ///
    /// Returns `true` if they changed.
    pub fn reload_settings(&mut self) -> bool {
        match self.store.load() {
            Ok(state) => self.apply_settings(state.daemon),
            Err(err) => {
                tracing::warn!(error = %err, "failed to reload daemon settings");
                false
            }
        }
    }

    /// Full state snapshot.
    #[must_use]
    pub fn status(&self) -> Status {
        Status {
            power_state: self.get_power_state(),
            wallpaper: self.engine.get_current_wallpaper(),
            is_playing: self.is_playing(),
            manually_paused: self.engine.is_manually_paused(),
            surfaces: self.engine.surface_count(),
            audio: self.engine.audio().get_settings(),
            settings: self.get_settings(),
        }
    }

    /// Runs a serialized command and returns its JSON result.
    ///
    /// [`BridgeCommand::Shutdown`] is acknowledged here; stopping the daemon
    /// is up to the caller.
    ///
    /// # Errors
    ///
    /// Returns `WallpaperError` when a set command fails and
    /// `InvalidArguments` for an unknown setting.
    pub fn execute(
        &mut self,
        command: BridgeCommand,
    ) -> Result<serde_json::Value, MotionDeskError> {
        tracing::debug!(?command, "executing command");

        match command {
            BridgeCommand::Ping => to_json("pong"),
            BridgeCommand::Status => to_json(self.status()),
            BridgeCommand::SetStaticWallpaper { path } => {
                self.set_static_wallpaper(&path).into_result()?;
                to_json(self.engine.current_state())
            }
            BridgeCommand::SetDynamicWallpaper { path } => {
                self.set_dynamic_wallpaper(&path).into_result()?;
                to_json(self.engine.current_state())
            }
            BridgeCommand::SetVideoWallpaper { path } => {
                self.set_video_wallpaper(&path).into_result()?;
                to_json(self.engine.current_state())
            }
            BridgeCommand::ClearWallpaper => {
                self.clear_wallpaper();
                to_json(self.engine.current_state())
            }
            BridgeCommand::TogglePlayback => {
                self.toggle_playback();
                to_json(self.engine.current_state())
            }
            BridgeCommand::PausePlayback => {
                self.engine.pause_video();
                to_json(self.engine.current_state())
            }
            BridgeCommand::ResumePlayback => {
                self.engine.resume_video();
                to_json(self.engine.current_state())
            }
            BridgeCommand::RebuildSurfaces => {
                self.engine.rebuild_surfaces().into_result()?;
                to_json(self.engine.current_state())
            }
            BridgeCommand::GetVolume => to_json(self.engine.audio().get_settings()),
            BridgeCommand::SetVolume { volume } => {
                self.set_volume(volume);
                to_json(self.engine.audio().get_settings())
            }
            BridgeCommand::SetMuted { muted } => {
                self.engine.audio_mut().set_muted(muted);
                to_json(self.engine.audio().get_settings())
            }
            BridgeCommand::ToggleMute => {
                self.toggle_mute();
                to_json(self.engine.audio().get_settings())
            }
            BridgeCommand::GetSettings => to_json(self.get_settings()),
            BridgeCommand::SetSetting { name, value } => to_json(self.set_setting(&name, value)?),
            BridgeCommand::ResourceStats => to_json(get_resource_stats()),
            BridgeCommand::Shutdown => Ok(serde_json::Value::Null),
        }
    }

    /// Returns `true` if the settings changed.
    fn apply_settings(&mut self, updated: DaemonSettings) -> bool {
        let previous = std::mem::replace(&mut *self.settings.write(), updated);
        if previous == updated {
            return false;
        }

        tracing::info!(
            event = events::settings::CHANGED,
            settings = ?updated,
            "daemon settings changed"
        );
        if previous.allow_video_on_battery != updated.allow_video_on_battery {
            self.engine.reevaluate_policy();
        }
        true
    }
}

fn to_json(value: impl Serialize) -> Result<serde_json::Value, MotionDeskError> {
    Ok(serde_json::to_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryStore;
    use crate::platform::HeadlessBackend;
    use crate::power::SimulatedPowerSource;

    fn core() -> (MotionDesk, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let core = MotionDesk::new(
            Arc::new(HeadlessBackend::new(1)),
            store.clone(),
            Arc::new(SimulatedPowerSource::new(PowerState::PluggedIn)),
        );
        (core, store)
    }

    #[test]
    fn commands_use_tagged_camel_case() {
        let command = BridgeCommand::SetVideoWallpaper { path: "/clip.mp4".to_string() };
        let json = serde_json::to_string(&command).unwrap();
        assert_eq!(json, r#"{"type":"setVideoWallpaper","path":"/clip.mp4"}"#);

        let parsed: BridgeCommand =
            serde_json::from_str(r#"{"type":"setSetting","name":"start_at_login","value":false}"#)
                .unwrap();
        assert_eq!(
            parsed,
            BridgeCommand::SetSetting { name: "start_at_login".to_string(), value: false }
        );
    }

    #[test]
    fn unknown_setting_is_rejected() {
        let (mut core, store) = core();
        let err = core.set_setting("volume", true).unwrap_err();
        assert!(matches!(err, MotionDeskError::InvalidArguments(_)));
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn set_setting_persists_and_feeds_the_engine() {
        let (mut core, store) = core();
        let settings = core.set_setting("allowVideoOnBattery", true).unwrap();
        assert!(settings.allow_video_on_battery);
        assert!(store.snapshot().daemon.allow_video_on_battery);
        assert!(core.get_settings().allow_video_on_battery);
    }

    #[test]
    fn reload_picks_up_external_changes() {
        let (mut core, store) = core();
        assert!(!core.reload_settings());

        let mut edited = DaemonSettings::default();
        edited.show_notifications = true;
        store.save(StateUpdate::Daemon(edited)).unwrap();

        assert!(core.reload_settings());
        assert!(core.get_settings().show_notifications);
    }

    #[test]
    fn failed_set_is_an_error_result() {
        let (mut core, _) = core();
        let err = core
            .execute(BridgeCommand::SetStaticWallpaper { path: "/nonexistent.png".to_string() })
            .unwrap_err();
        assert_eq!(err.to_string(), "Wallpaper error: file not found");
    }

    #[test]
    fn status_reports_defaults() {
        let (mut core, _) = core();
        let status = core.execute(BridgeCommand::Status).unwrap();
        assert_eq!(status["wallpaper"]["type"], "none");
        assert_eq!(status["isPlaying"], false);
        assert_eq!(status["settings"]["startAtLogin"], true);
    }

    #[test]
    fn resource_stats_are_sane() {
        let stats = get_resource_stats();
        assert!(stats.memory_mb >= 0.0);
        assert!(stats.cpu_percent >= 0.0);
    }
}
