//! Cache directory utilities.
//!
//! The daemon keeps its runtime files (the IPC socket) in
//! `<cache dir>/{APP_BUNDLE_ID}/`, falling back to `/tmp/{APP_BUNDLE_ID}/` when
//! the platform has no cache directory.

use std::path::PathBuf;

use crate::constants::{APP_BUNDLE_ID, SOCKET_FILE_NAME};

/// Returns the root cache directory for the application.
#[must_use]
pub fn get_cache_dir() -> PathBuf {
    dirs::cache_dir().map_or_else(
        || PathBuf::from(format!("/tmp/{APP_BUNDLE_ID}")),
        |cache| cache.join(APP_BUNDLE_ID),
    )
}

/// Returns the path of the daemon's IPC socket.
#[must_use]
pub fn get_socket_path() -> PathBuf { get_cache_dir().join(SOCKET_FILE_NAME) }
