//! State file watcher.
//!
//! Lets hand edits of the daemon settings reach a running daemon without a
//! restart.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Instant;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};

use crate::constants::STATE_WATCH_DEBOUNCE;
use crate::utils::thread::spawn_named_thread;

/// A running watcher. Dropping it stops the watch thread.
#[derive(Debug)]
pub struct StateWatcher {
    _watcher: RecommendedWatcher,
}

/// Starts watching `path` and runs `on_change` (on the watch thread) after
/// each debounced modification.
///
/// Returns `None` (after logging) if the watch cannot be set up.
pub fn watch_state_file<F>(path: &Path, on_change: F) -> Option<StateWatcher>
where F: Fn() + Send + 'static {
    let file_name: OsString = path.file_name()?.to_os_string();
    // Editors and atomic saves replace the file, so watch its directory.
    let watch_dir: PathBuf = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

    if let Err(err) = std::fs::create_dir_all(&watch_dir) {
        tracing::warn!(
            error = %err,
            dir = %watch_dir.display(),
            "failed to create state directory"
        );
        return None;
    }

    let (tx, rx) = std::sync::mpsc::channel();
    let mut watcher: RecommendedWatcher = match notify::recommended_watcher(tx) {
        Ok(watcher) => watcher,
        Err(err) => {
            tracing::warn!(error = %err, "failed to create state file watcher");
            return None;
        }
    };

    if let Err(err) = watcher.watch(&watch_dir, RecursiveMode::NonRecursive) {
        tracing::warn!(error = %err, dir = %watch_dir.display(), "failed to watch state file");
        return None;
    }

    spawn_named_thread("state-watcher", move || {
        let mut last_event: Option<Instant> = None;

        // Ends when the watcher (and with it the sender) is dropped.
        while let Ok(result) = rx.recv() {
            let event = match result {
                Ok(event) => event,
                Err(err) => {
                    tracing::warn!(error = %err, "state file watch error");
                    continue;
                }
            };

            if !is_relevant(&event, &file_name) {
                continue;
            }

            let now = Instant::now();
            if last_event.is_some_and(|at| now.duration_since(at) < STATE_WATCH_DEBOUNCE) {
                continue;
            }
            last_event = Some(now);

            tracing::debug!("state file changed");
            on_change();
        }
    })?;

    Some(StateWatcher { _watcher: watcher })
}

fn is_relevant(event: &notify::Event, file_name: &OsString) -> bool {
    !event.kind.is_access()
        && event.paths.iter().any(|path| path.file_name().is_some_and(|name| name == file_name))
}
