//! Audio settings for video wallpapers.
//!
//! [`AudioController`] owns the volume, mute and mix settings, applies them to
//! the player of the current video wallpaper, persists them and notifies
//! subscribers. It never owns the player: the binding is a weak reference and
//! a player that went away is simply forgotten.
//!
//! The stored volume is the level the user picked. Muting never overwrites it,
//! so it is the level restored on unmute, across restarts too; only
//! [`AudioController::get_volume`] reads `0.0` while muted.

use std::sync::{Arc, Weak};

use tokio::sync::mpsc::UnboundedReceiver;

use crate::config::{StateStore, StateUpdate, save_or_warn};
use crate::platform::MediaPlayer;
use crate::types::{AudioSettings, clamp_volume};
use crate::utils::{SubscriptionId, Subscribers};

/// Volume, mute and mix policy for the wallpaper player.
pub struct AudioController {
    settings: AudioSettings,
    player: Option<Weak<dyn MediaPlayer>>,
    store: Arc<dyn StateStore>,
    subscribers: Subscribers<AudioSettings>,
}

impl std::fmt::Debug for AudioController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioController")
            .field("settings", &self.settings)
            .field("bound", &self.is_bound())
            .finish_non_exhaustive()
    }
}

impl AudioController {
    /// Creates a controller with the settings stored in `store`.
    ///
    /// Unreadable settings fall back to the defaults.
    #[must_use]
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        let settings = match store.load() {
            Ok(state) => state.audio.clamped(),
            Err(err) => {
                tracing::warn!(error = %err, "failed to load audio settings, using defaults");
                AudioSettings::default()
            }
        };

        Self {
            settings,
            player: None,
            store,
            subscribers: Subscribers::new(),
        }
    }

    /// Binds the controller to `player` and applies the current settings.
    ///
    /// A previous binding is dropped; stored settings are not changed.
    pub fn configure_for_video(&mut self, player: &Arc<dyn MediaPlayer>) {
        self.player = Some(Arc::downgrade(player));
        self.apply_current_settings();
        tracing::debug!(settings = ?self.settings, "audio bound to video player");
    }

    /// Sets the volume, clamped to `[0.0, 1.0]`.
    ///
    /// While muted only the level restored on unmute changes.
    pub fn set_volume(&mut self, volume: f32) {
        self.settings.volume = clamp_volume(volume);
        self.commit();
    }

    /// Audible volume. Reads `0.0` while muted.
    #[must_use]
    pub const fn get_volume(&self) -> f32 {
        if self.settings.is_muted { 0.0 } else { self.settings.volume }
    }

    /// Flips the mute state.
    pub fn toggle_mute(&mut self) { self.set_muted(!self.settings.is_muted); }

    /// Mutes or unmutes.
    ///
    /// The stored level is kept, so unmuting brings back the volume from
    /// before the mute.
    pub fn set_muted(&mut self, muted: bool) {
        self.settings.is_muted = muted;
        self.commit();
    }

    /// Whether audio is muted.
    #[must_use]
    pub const fn is_muted(&self) -> bool { self.settings.is_muted }

    /// Copy of the current settings, with the stored level as `volume`.
    #[must_use]
    pub const fn get_settings(&self) -> AudioSettings { self.settings }

    /// Replaces every setting at once, with a single apply, save and
    /// notification.
    pub fn apply_settings(&mut self, settings: AudioSettings) {
        self.settings = settings.clamped();
        self.commit();
    }

    /// Registers the primary callback, replacing the previous one.
    pub fn set_audio_settings_callback<F>(&self, callback: F) -> SubscriptionId
    where F: Fn(&AudioSettings) + Send + Sync + 'static {
        self.subscribers.replace_primary(callback)
    }

    /// Adds an independent subscriber.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where F: Fn(&AudioSettings) + Send + Sync + 'static {
        self.subscribers.subscribe(callback)
    }

    /// Adds a subscriber that receives changes over a channel.
    pub fn subscribe_channel(&self) -> (SubscriptionId, UnboundedReceiver<AudioSettings>) {
        self.subscribers.subscribe_channel()
    }

    /// Removes a subscriber.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool { self.subscribers.unsubscribe(id) }

    /// Forgets the bound player. Safe to call when nothing is bound.
    pub fn cleanup(&mut self) {
        if self.player.take().is_some() {
            tracing::debug!("audio unbound from video player");
        }
    }

    /// Whether a live player is bound.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.player.as_ref().is_some_and(|player| player.strong_count() > 0)
    }

    fn commit(&mut self) {
        self.apply_current_settings();
        save_or_warn(self.store.as_ref(), StateUpdate::Audio(self.settings));
        tracing::debug!(settings = ?self.settings, "audio settings changed");
        self.subscribers.emit(&self.settings);
    }

    fn apply_current_settings(&mut self) {
        let Some(weak) = &self.player else {
            return;
        };

        let Some(player) = weak.upgrade() else {
            tracing::debug!("bound video player is gone, dropping binding");
            self.player = None;
            return;
        };

        player.set_mix_with_others(self.settings.mix_with_other_audio);
        player.set_volume(self.settings.volume);
        player.set_muted(self.settings.is_muted);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::config::{MemoryStore, PersistedState};
    use crate::platform::{HeadlessBackend, MediaLoader};

    fn controller() -> (AudioController, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (AudioController::new(store.clone()), store)
    }

    fn video_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".mp4").tempfile().unwrap();
        std::io::Write::write_all(&mut file, b"ftyp").unwrap();
        file
    }

    fn assert_volume(actual: f32, expected: f32) {
        assert!((actual - expected).abs() < f32::EPSILON, "{actual} != {expected}");
    }

    #[test]
    fn loads_persisted_settings() {
        let state = PersistedState {
            audio: AudioSettings { volume: 0.3, is_muted: false, mix_with_other_audio: false },
            ..PersistedState::default()
        };
        let controller = AudioController::new(Arc::new(MemoryStore::with_state(state)));
        assert_volume(controller.get_volume(), 0.3);
        assert!(!controller.get_settings().mix_with_other_audio);
    }

    #[test]
    fn volume_is_clamped() {
        let (mut controller, _) = controller();
        controller.set_volume(-1.0);
        assert_volume(controller.get_volume(), 0.0);
        controller.set_volume(5.0);
        assert_volume(controller.get_volume(), 1.0);
    }

    #[test]
    fn mute_round_trip_restores_volume() {
        let (mut controller, _) = controller();
        controller.set_volume(0.8);

        controller.toggle_mute();
        assert!(controller.is_muted());
        assert_volume(controller.get_volume(), 0.0);

        controller.toggle_mute();
        assert!(!controller.is_muted());
        assert_volume(controller.get_volume(), 0.8);
    }

    #[test]
    fn unmute_after_zero_volume_leaves_volume() {
        let (mut controller, _) = controller();
        controller.set_volume(0.0);
        controller.set_muted(true);
        controller.set_muted(false);
        assert_volume(controller.get_volume(), 0.0);
    }

    #[test]
    fn muting_twice_keeps_the_remembered_volume() {
        let (mut controller, _) = controller();
        controller.set_volume(0.6);
        controller.set_muted(true);
        controller.set_muted(true);
        controller.set_muted(false);
        assert_volume(controller.get_volume(), 0.6);
    }

    #[test]
    fn volume_set_while_muted_waits_for_unmute() {
        let (mut controller, store) = controller();
        controller.set_volume(0.8);
        controller.set_muted(true);

        controller.set_volume(0.5);
        assert!(controller.is_muted());
        assert_volume(controller.get_volume(), 0.0);
        assert_volume(store.snapshot().audio.volume, 0.5);

        controller.set_muted(false);
        assert_volume(controller.get_volume(), 0.5);
    }

    #[test]
    fn muted_volume_survives_a_restart() {
        let (mut controller, store) = controller();
        controller.set_volume(0.8);
        controller.toggle_mute();
        drop(controller);

        let mut restarted = AudioController::new(store);
        assert!(restarted.is_muted());
        assert_volume(restarted.get_volume(), 0.0);

        restarted.toggle_mute();
        assert!(!restarted.is_muted());
        assert_volume(restarted.get_volume(), 0.8);
    }

    #[test]
    fn every_change_is_persisted_and_notified() {
        let (mut controller, store) = controller();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        controller.set_audio_settings_callback(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        controller.set_volume(0.4);
        controller.toggle_mute();

        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(store.save_count(), 2);
        assert!(store.snapshot().audio.is_muted);
    }

    #[test]
    fn apply_settings_notifies_once() {
        let (mut controller, store) = controller();
        let (_, mut rx) = controller.subscribe_channel();

        controller.apply_settings(AudioSettings {
            volume: 2.0,
            is_muted: true,
            mix_with_other_audio: false,
        });

        let received = rx.try_recv().unwrap();
        assert!(rx.try_recv().is_err());
        assert_volume(received.volume, 1.0);
        assert!(received.is_muted);
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn settings_reach_the_bound_player() {
        let (mut controller, _) = controller();
        let backend = HeadlessBackend::new(1);
        let file = video_file();
        let player = backend.load_video(file.path()).unwrap();

        controller.set_volume(0.7);
        controller.configure_for_video(&player);

        let headless = backend.last_player().unwrap();
        assert_volume(headless.volume(), 0.7);
        assert!(headless.mixes_with_others());

        controller.set_muted(true);
        assert!(headless.is_muted());
    }

    #[test]
    fn dropped_player_is_tolerated() {
        let (mut controller, _) = controller();
        let backend = HeadlessBackend::new(1);
        let file = video_file();
        let player = backend.load_video(file.path()).unwrap();
        controller.configure_for_video(&player);
        assert!(controller.is_bound());

        drop(player);
        assert!(!controller.is_bound());
        controller.set_volume(0.2);
        assert_volume(controller.get_volume(), 0.2);
    }

    #[test]
    fn cleanup_keeps_settings() {
        let (mut controller, _) = controller();
        controller.cleanup();
        controller.set_volume(0.9);
        controller.cleanup();
        assert_volume(controller.get_volume(), 0.9);
        assert!(!controller.is_bound());
    }
}
