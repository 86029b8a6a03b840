//! Application-wide constants.

use std::time::Duration;

/// Human-readable application name.
pub const APP_NAME: &str = "MotionDesk";

/// Reverse-DNS identifier, used for cache directories.
pub const APP_BUNDLE_ID: &str = "com.motiondesk.daemon";

/// Directory name under the user's config directory.
pub const CONFIG_DIR_NAME: &str = "motiondesk";

/// File name of the persisted state.
pub const STATE_FILE_NAME: &str = "state.json";

/// File name of the daemon's IPC socket inside the cache directory.
pub const SOCKET_FILE_NAME: &str = "motiondesk.sock";

/// How often the battery feed samples the power source.
pub const POWER_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Delay before a changed power reading is confirmed by a second sample.
pub const POWER_SETTLE_DELAY: Duration = Duration::from_millis(300);

/// Debounce window for state-file change events.
pub const STATE_WATCH_DEBOUNCE: Duration = Duration::from_millis(200);
