//! Error types for MotionDesk.
//!
//! [`MotionDeskError`] is the error of the outer surfaces (CLI and IPC). It
//! serializes as `{"kind": ..., "message": ...}` so that the daemon can send
//! it back to a client unchanged.

use serde::Serialize;
use thiserror::Error;

use crate::config::StoreError;
use crate::ipc::IpcError;
use crate::types::WallpaperError;

/// Errors that can occur during application execution.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "kind", content = "message")]
pub enum MotionDeskError {
    /// Invalid command arguments.
    #[error("{0}")]
    InvalidArguments(String),
    /// A wallpaper could not be set.
    #[error("Wallpaper error: {0}")]
    WallpaperError(String),
    /// The state file could not be read or written.
    #[error("State error: {0}")]
    StateError(String),
    /// IPC communication error.
    #[error("IPC error: {0}")]
    IpcError(String),
    /// The daemon answered with an error.
    #[error("Daemon error: {0}")]
    DaemonError(String),
    /// IO error.
    #[error("IO error: {0}")]
    IoError(String),
    /// Generic command error.
    #[error("{0}")]
    CommandError(String),
}

impl From<WallpaperError> for MotionDeskError {
    fn from(err: WallpaperError) -> Self { Self::WallpaperError(err.to_string()) }
}

impl From<StoreError> for MotionDeskError {
    fn from(err: StoreError) -> Self { Self::StateError(err.to_string()) }
}

impl From<IpcError> for MotionDeskError {
    fn from(err: IpcError) -> Self { Self::IpcError(err.to_string()) }
}

impl From<std::io::Error> for MotionDeskError {
    fn from(err: std::io::Error) -> Self { Self::IoError(err.to_string()) }
}

impl From<serde_json::Error> for MotionDeskError {
    fn from(err: serde_json::Error) -> Self { Self::CommandError(err.to_string()) }
}

impl From<String> for MotionDeskError {
    fn from(msg: String) -> Self { Self::CommandError(msg) }
}

impl From<&str> for MotionDeskError {
    fn from(msg: &str) -> Self { Self::CommandError(msg.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_arguments_display_is_bare() {
        let err = MotionDeskError::InvalidArguments("unknown setting: volume".to_string());
        assert_eq!(err.to_string(), "unknown setting: volume");
    }

    #[test]
    fn wallpaper_error_conversion() {
        let err: MotionDeskError = WallpaperError::UnplayableVideo.into();
        assert!(matches!(err, MotionDeskError::WallpaperError(_)));
        assert_eq!(err.to_string(), "Wallpaper error: unplayable video");
    }

    #[test]
    fn io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied");
        let err: MotionDeskError = io.into();
        assert!(matches!(err, MotionDeskError::IoError(_)));
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn ipc_error_conversion() {
        let err: MotionDeskError = IpcError::DaemonNotRunning.into();
        assert!(err.to_string().starts_with("IPC error"));
    }

    #[test]
    fn from_str_is_command_error() {
        let err: MotionDeskError = "boom".into();
        assert!(matches!(err, MotionDeskError::CommandError(_)));
    }

    #[test]
    fn serializes_with_kind() {
        let err = MotionDeskError::DaemonError("engine is shut down".to_string());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "DaemonError");
        assert_eq!(json["message"], "engine is shut down");
    }
}
