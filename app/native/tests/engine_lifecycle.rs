//! Wallpaper engine lifecycle: setting, replacing, failing and clearing
//! wallpapers against the headless backend.

mod common;

use common::{Fixture, recorder};
use motiondesk_lib::config::StateStore;
use motiondesk_lib::platform::{DisplayId, SurfaceContent};
use motiondesk_lib::types::{PowerState, WallpaperConfig, WallpaperError, WallpaperType};
use motiondesk_lib::wallpaper::WallpaperState;

#[test]
fn static_image_gets_one_surface_per_display() {
    for displays in 1..=3 {
        let fixture = Fixture::new(displays, PowerState::PluggedIn);
        let mut engine = fixture.engine();
        let image = fixture.png("still.png");

        assert_eq!(engine.set_static_wallpaper(&image), WallpaperError::None);

        let current = engine.get_current_wallpaper();
        assert_eq!(current.wallpaper_type, WallpaperType::StaticImage);
        assert_eq!(current.file_path, image.to_string_lossy());
        assert_eq!(engine.surface_count(), displays as usize);
        assert_eq!(fixture.backend.live_surfaces(), displays as usize);
        assert!(!engine.is_video_playing());
    }
}

#[test]
fn dynamic_image_accepts_multi_frame_gif() {
    let fixture = Fixture::plugged_in();
    let mut engine = fixture.engine();

    assert_eq!(engine.set_dynamic_wallpaper(fixture.gif("loop.gif")), WallpaperError::None);
    assert_eq!(engine.get_current_wallpaper().wallpaper_type, WallpaperType::Dynamic);
    assert_eq!(fixture.backend.live_surfaces(), 2);
    assert!(
        fixture
            .backend
            .surface_contents()
            .iter()
            .all(|(_, content)| matches!(content, SurfaceContent::AnimatedImage(_)))
    );
}

#[test]
fn missing_paths_fail_with_file_not_found() {
    let fixture = Fixture::plugged_in();
    let mut engine = fixture.engine();

    let results = [
        engine.set_static_wallpaper(fixture.missing("a.png")),
        engine.set_dynamic_wallpaper(fixture.missing("b.gif")),
        engine.set_video_wallpaper(fixture.missing("c.mp4")),
    ];

    for result in results {
        assert_eq!(result, WallpaperError::FileNotFound);
    }
    assert_eq!(engine.get_current_wallpaper().wallpaper_type, WallpaperType::None);
    assert_eq!(fixture.backend.live_surfaces(), 0);
}

#[test]
fn undecodable_image_is_invalid_format() {
    let fixture = Fixture::plugged_in();
    let mut engine = fixture.engine();

    let garbage = fixture.text("broken.png", "definitely not a png");
    assert_eq!(engine.set_static_wallpaper(&garbage), WallpaperError::InvalidFormat);
    assert_eq!(engine.set_dynamic_wallpaper(&garbage), WallpaperError::InvalidFormat);
}

#[test]
fn unsupported_or_empty_video_is_unplayable() {
    let fixture = Fixture::plugged_in();
    let mut engine = fixture.engine();

    let not_a_video = fixture.text("notes.txt", "hello");
    assert_eq!(engine.set_video_wallpaper(&not_a_video), WallpaperError::UnplayableVideo);

    let empty = fixture.text("empty.mp4", "");
    assert_eq!(engine.set_video_wallpaper(&empty), WallpaperError::UnplayableVideo);
    assert_eq!(fixture.backend.live_layers(), 0);
}

#[test]
fn failed_set_leaves_nothing_shown_and_persists_none() {
    let fixture = Fixture::plugged_in();
    let mut engine = fixture.engine();
    let (seen, callback) = recorder::<WallpaperState>();
    engine.subscribe(callback);

    assert_eq!(engine.set_static_wallpaper(fixture.png("ok.png")), WallpaperError::None);
    assert_eq!(
        engine.set_static_wallpaper(fixture.missing("gone.png")),
        WallpaperError::FileNotFound
    );

    assert_eq!(engine.get_current_wallpaper(), WallpaperConfig::none());
    assert_eq!(fixture.backend.live_surfaces(), 0);
    assert!(fixture.store.load().unwrap().wallpaper.is_none());

    let seen = seen.lock();
    assert_eq!(seen.len(), 2, "one notification for the set, one for the teardown");
    assert_eq!(seen[1].wallpaper_type, WallpaperType::None);
}

#[test]
fn failure_from_empty_state_is_silent() {
    let fixture = Fixture::plugged_in();
    let mut engine = fixture.engine();
    let (seen, callback) = recorder::<WallpaperState>();
    engine.subscribe(callback);

    engine.set_static_wallpaper(fixture.missing("gone.png"));
    assert!(seen.lock().is_empty());
}

#[test]
fn partial_surface_failure_releases_everything() {
    let fixture = Fixture::new(3, PowerState::PluggedIn);
    let mut engine = fixture.engine();
    fixture.backend.fail_surfaces_on(Some(DisplayId(2)));

    assert_eq!(engine.set_static_wallpaper(fixture.png("a.png")), WallpaperError::Unknown);
    assert_eq!(engine.get_current_wallpaper().wallpaper_type, WallpaperType::None);
    assert_eq!(fixture.backend.live_surfaces(), 0);
    assert!(fixture.backend.surfaces_created() >= 2);

    assert_eq!(engine.set_video_wallpaper(fixture.video("clip.mp4")), WallpaperError::Unknown);
    assert_eq!(fixture.backend.live_surfaces(), 0);
    assert_eq!(fixture.backend.live_layers(), 0);
}

#[test]
fn replacing_a_wallpaper_releases_the_previous_one() {
    let fixture = Fixture::plugged_in();
    let mut engine = fixture.engine();

    engine.set_video_wallpaper(fixture.video("clip.mp4"));
    let first_player = fixture.backend.last_player().unwrap();
    assert_eq!(first_player.observer_count(), 1);

    engine.set_static_wallpaper(fixture.png("still.png"));
    assert_eq!(fixture.backend.live_layers(), 0);
    assert_eq!(fixture.backend.live_surfaces(), 2);
    assert!(!first_player.is_playing());
    assert_eq!(first_player.observer_count(), 0);
    assert!(!engine.audio().is_bound());
}

#[test]
fn clear_is_idempotent() {
    let fixture = Fixture::plugged_in();
    let mut engine = fixture.engine();
    engine.set_static_wallpaper(fixture.png("still.png"));

    let (seen, callback) = recorder::<WallpaperState>();
    engine.subscribe(callback);
    let saves = fixture.store.save_count();

    engine.clear_wallpaper();
    engine.clear_wallpaper();

    assert_eq!(seen.lock().len(), 1);
    assert_eq!(fixture.store.save_count(), saves + 1);
    assert_eq!(engine.get_current_wallpaper().wallpaper_type, WallpaperType::None);
    assert_eq!(fixture.backend.live_surfaces(), 0);
}

#[test]
fn successful_set_notifies_once_and_persists() {
    let fixture = Fixture::plugged_in();
    let mut engine = fixture.engine();
    let (seen, callback) = recorder::<WallpaperState>();
    engine.subscribe(callback);

    let clip = fixture.video("clip.mp4");
    engine.set_video_wallpaper(&clip);

    assert_eq!(
        *seen.lock(),
        vec![WallpaperState { wallpaper_type: WallpaperType::Video, is_playing: true }]
    );
    let persisted = fixture.store.load().unwrap().wallpaper;
    assert_eq!(persisted, WallpaperConfig::new(WallpaperType::Video, clip.to_string_lossy()));
}

#[test]
fn primary_callback_is_replaced_but_subscribers_stay() {
    let fixture = Fixture::plugged_in();
    let mut engine = fixture.engine();

    let (first, first_cb) = recorder::<WallpaperState>();
    let (second, second_cb) = recorder::<WallpaperState>();
    let (extra, extra_cb) = recorder::<WallpaperState>();
    engine.set_wallpaper_state_callback(first_cb);
    engine.subscribe(extra_cb);
    engine.set_wallpaper_state_callback(second_cb);

    engine.set_static_wallpaper(fixture.png("still.png"));

    assert!(first.lock().is_empty());
    assert_eq!(second.lock().len(), 1);
    assert_eq!(extra.lock().len(), 1);
}

#[test]
fn video_loops_forever() {
    let fixture = Fixture::plugged_in();
    let mut engine = fixture.engine();
    engine.set_video_wallpaper(fixture.video("clip.mp4"));
    let player = fixture.backend.last_player().unwrap();

    for restarts in 1..=3 {
        player.finish();
        assert_eq!(player.restarts(), restarts);
        assert!(player.is_playing());
    }
    assert!(engine.is_video_playing());
}

#[test]
fn all_displays_share_one_player() {
    let fixture = Fixture::new(3, PowerState::PluggedIn);
    let mut engine = fixture.engine();
    engine.set_video_wallpaper(fixture.video("clip.mp4"));

    assert_eq!(fixture.backend.live_layers(), 3);
    assert_eq!(fixture.backend.live_surfaces(), 3);
    assert_eq!(fixture.backend.last_player().unwrap().observer_count(), 1);
}

#[test]
fn restore_reapplies_the_persisted_wallpaper() {
    let fixture = Fixture::plugged_in();
    let image = fixture.png("still.png");
    {
        let mut engine = fixture.engine();
        engine.set_static_wallpaper(&image);
    }
    assert_eq!(fixture.backend.live_surfaces(), 0, "dropping the engine releases surfaces");

    let mut engine = fixture.engine();
    assert_eq!(engine.get_current_wallpaper().wallpaper_type, WallpaperType::None);
    assert_eq!(engine.restore(), WallpaperError::None);
    assert_eq!(engine.get_current_wallpaper().file_path, image.to_string_lossy());
    assert_eq!(engine.restore(), WallpaperError::None, "restore runs once");
}

#[test]
fn restore_of_a_deleted_file_clears_the_state() {
    let fixture = Fixture::plugged_in();
    let image = fixture.png("still.png");
    fixture.engine().set_static_wallpaper(&image);
    std::fs::remove_file(&image).unwrap();

    let mut engine = fixture.engine();
    assert_eq!(engine.restore(), WallpaperError::FileNotFound);
    assert!(fixture.store.load().unwrap().wallpaper.is_none());
}

#[test]
fn rebuild_follows_display_changes() {
    let fixture = Fixture::new(1, PowerState::PluggedIn);
    let mut engine = fixture.engine();
    engine.set_static_wallpaper(fixture.png("still.png"));
    assert_eq!(engine.surface_count(), 1);

    fixture.backend.set_display_count(3);
    assert_eq!(engine.rebuild_surfaces(), WallpaperError::None);
    assert_eq!(engine.surface_count(), 3);
    assert_eq!(fixture.backend.live_surfaces(), 3);
}

#[test]
fn rebuild_keeps_manual_pause() {
    let fixture = Fixture::plugged_in();
    let mut engine = fixture.engine();
    engine.set_video_wallpaper(fixture.video("clip.mp4"));
    engine.pause_video();

    fixture.backend.set_display_count(1);
    assert_eq!(engine.rebuild_surfaces(), WallpaperError::None);
    assert!(engine.is_manually_paused());
    assert!(!engine.is_video_playing());
}

#[test]
fn cleanup_releases_resources_and_is_repeatable() {
    let fixture = Fixture::plugged_in();
    let mut engine = fixture.engine();
    engine.set_video_wallpaper(fixture.video("clip.mp4"));

    engine.cleanup();
    engine.cleanup();

    assert_eq!(fixture.backend.live_surfaces(), 0);
    assert_eq!(fixture.backend.live_layers(), 0);
    assert!(!engine.power().is_monitoring());
    assert_eq!(engine.set_static_wallpaper(fixture.png("late.png")), WallpaperError::Unknown);
    assert_eq!(
        fixture.store.load().unwrap().wallpaper.wallpaper_type,
        WallpaperType::Video,
        "cleanup keeps the persisted wallpaper for the next start"
    );
}
