//! Sends commands to the running daemon.

use std::path::PathBuf;

use serde::de::DeserializeOwned;

use crate::bridge::BridgeCommand;
use crate::error::MotionDeskError;
use crate::ipc::{self, IpcResponse};

/// Where and how to reach the daemon.
#[derive(Debug, Clone)]
pub struct Client {
    socket: PathBuf,
}

impl Client {
    pub const fn new(socket: PathBuf) -> Self { Self { socket } }

    /// Sends `command` and returns the daemon's data.
    pub fn send(&self, command: &BridgeCommand) -> Result<serde_json::Value, MotionDeskError> {
        match ipc::send_command(&self.socket, command)? {
            IpcResponse::Success { data } => Ok(data),
            IpcResponse::Error { error } => Err(MotionDeskError::DaemonError(error)),
        }
    }

    /// Sends `command` and decodes the daemon's data as `T`.
    pub fn request<T: DeserializeOwned>(
        &self,
        command: &BridgeCommand,
    ) -> Result<T, MotionDeskError> {
        let data = self.send(command)?;
        serde_json::from_value(data).map_err(|e| {
            MotionDeskError::IpcError(format!("unexpected response from daemon: {e}"))
        })
    }
}
