//! Shared fixtures for the integration tests.
//!
//! A [`Fixture`] owns a temporary directory for media files plus the headless
//! backend, the in-memory store and the simulated power source an engine is
//! built from. The fixture keeps handles to all of them so tests can drive the
//! collaborators and inspect their side effects.

#![allow(dead_code)]

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use image::codecs::gif::GifEncoder;
use image::{Delay, Frame, Rgba, RgbaImage};
use motiondesk_lib::audio::AudioController;
use motiondesk_lib::config::MemoryStore;
use motiondesk_lib::platform::HeadlessBackend;
use motiondesk_lib::power::{PowerMonitor, SimulatedPowerSource};
use motiondesk_lib::types::{DaemonSettings, PowerState};
use motiondesk_lib::wallpaper::WallpaperEngine;
use parking_lot::Mutex;
use tempfile::TempDir;

pub struct Fixture {
    pub dir: TempDir,
    pub backend: Arc<HeadlessBackend>,
    pub store: Arc<MemoryStore>,
    pub power: SimulatedPowerSource,
    pub settings: Arc<Mutex<DaemonSettings>>,
}

impl Fixture {
    pub fn new(displays: u32, power: PowerState) -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            backend: Arc::new(HeadlessBackend::new(displays)),
            store: Arc::new(MemoryStore::new()),
            power: SimulatedPowerSource::new(power),
            settings: Arc::new(Mutex::new(DaemonSettings::default())),
        }
    }

    /// Two displays on mains power.
    pub fn plugged_in() -> Self { Self::new(2, PowerState::PluggedIn) }

    /// Builds an engine over the fixture and takes the first power sample.
    pub fn engine(&self) -> WallpaperEngine {
        let monitor = PowerMonitor::new(Arc::new(self.power.clone()));
        let audio = AudioController::new(self.store.clone());
        let mut engine =
            WallpaperEngine::new(self.backend.clone(), self.store.clone(), monitor, audio);

        let settings = Arc::clone(&self.settings);
        engine.set_settings_callback(move || *settings.lock());
        engine.force_power_update();
        engine
    }

    pub fn allow_video_on_battery(&self, allow: bool) {
        self.settings.lock().allow_video_on_battery = allow;
    }

    /// Switches the simulated power source and delivers the change.
    pub fn switch_power(&self, engine: &mut WallpaperEngine, state: PowerState) {
        self.power.set(state);
        engine.handle_power_source_change();
    }

    pub fn png(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        RgbaImage::from_pixel(8, 8, Rgba([40, 90, 160, 255])).save(&path).unwrap();
        path
    }

    pub fn gif(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        let mut encoder = GifEncoder::new(File::create(&path).unwrap());
        let frames = [Rgba([255, 0, 0, 255]), Rgba([0, 255, 0, 255]), Rgba([0, 0, 255, 255])]
            .map(|color| {
                Frame::from_parts(
                    RgbaImage::from_pixel(8, 8, color),
                    0,
                    0,
                    Delay::from_numer_denom_ms(80, 1),
                )
            });
        encoder.encode_frames(frames).unwrap();
        path
    }

    /// A file the headless backend accepts as a video.
    pub fn video(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, b"\x00\x00\x00\x18ftypmp42").unwrap();
        path
    }

    pub fn text(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub fn missing(&self, name: &str) -> PathBuf { self.dir.path().join(name) }
}

/// Collects every value passed to the returned callback.
pub fn recorder<T>() -> (Arc<Mutex<Vec<T>>>, impl Fn(&T) + Send + Sync + 'static)
where T: Clone + Send + 'static {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (seen, move |value: &T| sink.lock().push(value.clone()))
}
