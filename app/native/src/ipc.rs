//! Unix domain socket IPC between the CLI and the daemon.
//!
//! The daemon listens on a socket in the cache directory. A client connects,
//! writes one JSON-encoded [`BridgeCommand`] followed by a newline and reads
//! one JSON line back:
//!
//! ```json
//! {"type": "setVolume", "volume": 0.4}
//! {"data": {"volume": 0.4, "isMuted": false, "mixWithOtherAudio": true}}
//! {"error": "Wallpaper error: file not found"}
//! ```
//!
//! If the socket doesn't exist or refuses connections, the daemon is not
//! running.

use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bridge::BridgeCommand;
use crate::utils::thread::spawn_named_thread;

/// Timeout for socket reads and writes.
const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Number of attempts for transient connection failures.
const MAX_RETRIES: u32 = 3;

/// Delay between attempts.
const RETRY_DELAY: Duration = Duration::from_millis(100);

/// Response from the daemon to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IpcResponse {
    /// Successful response with data.
    Success { data: serde_json::Value },
    /// Error response.
    Error { error: String },
}

impl IpcResponse {
    /// Creates a success response.
    pub fn success(data: impl Serialize) -> Self {
        Self::Success {
            data: serde_json::to_value(data).unwrap_or(serde_json::Value::Null),
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self { Self::Error { error: message.into() } }

    /// Converts the response into a `Result`.
    ///
    /// # Errors
    ///
    /// Returns the daemon's message for an error response.
    pub fn into_result(self) -> Result<serde_json::Value, String> {
        match self {
            Self::Success { data } => Ok(data),
            Self::Error { error } => Err(error),
        }
    }
}

/// Error type for IPC client operations.
#[derive(Debug, Error)]
pub enum IpcError {
    /// The socket doesn't exist or refuses connections.
    #[error("MotionDesk daemon is not running")]
    DaemonNotRunning,
    /// The daemon did not answer in time.
    #[error("connection timed out")]
    Timeout,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The daemon answered with something that is not a response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// How often the accept loop checks whether it should stop.
const ACCEPT_POLL: Duration = Duration::from_millis(50);

/// A running IPC server. Dropping it stops the server and removes the socket.
#[derive(Debug)]
pub struct ServerHandle {
    path: PathBuf,
    identity: Option<SocketIdentity>,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ServerHandle {
    /// The socket path the server listens on.
    #[must_use]
    pub fn path(&self) -> &Path { &self.path }

    /// Stops accepting connections and removes the socket file.
    ///
    /// The file is left alone when another server has bound the path since.
    pub fn stop(&mut self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }

        if self.identity.is_some() && SocketIdentity::of(&self.path) == self.identity {
            remove_socket(&self.path);
        }
        tracing::debug!(path = %self.path.display(), "ipc server stopped");
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) { self.stop(); }
}

/// Device and inode of a bound socket file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SocketIdentity {
    dev: u64,
    ino: u64,
}

impl SocketIdentity {
    fn of(path: &Path) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;

        std::fs::symlink_metadata(path)
            .ok()
            .map(|meta| Self { dev: meta.dev(), ino: meta.ino() })
    }
}

fn remove_socket(path: &Path) {
    if path.exists() {
        let _ = std::fs::remove_file(path);
    }
}

/// Starts the IPC server on `path`.
///
/// A stale socket file at `path` is replaced. Each connection is served on
/// its own thread; `handler` must therefore be shareable.
///
/// Returns `None` (after logging) if the socket cannot be bound.
pub fn start_server<F>(path: &Path, handler: F) -> Option<ServerHandle>
where F: Fn(BridgeCommand) -> IpcResponse + Send + Sync + 'static {
    remove_socket(path);

    if let Some(parent) = path.parent()
        && let Err(err) = std::fs::create_dir_all(parent)
    {
        tracing::warn!(path = %parent.display(), error = %err, "failed to create socket directory");
    }

    let listener = match UnixListener::bind(path) {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(path = %path.display(), error = %err, "failed to bind ipc socket");
            return None;
        }
    };

    if let Err(err) = listener.set_nonblocking(true) {
        tracing::error!(path = %path.display(), error = %err, "failed to configure ipc socket");
        remove_socket(path);
        return None;
    }

    tracing::info!(path = %path.display(), "ipc server listening");

    let identity = SocketIdentity::of(path);
    let running = Arc::new(AtomicBool::new(true));
    let handler = Arc::new(handler);
    let loop_running = Arc::clone(&running);
    let thread = spawn_named_thread("ipc-server", move || {
        server_loop(&listener, &loop_running, &handler);
    });

    if thread.is_none() {
        remove_socket(path);
        return None;
    }

    Some(ServerHandle { path: path.to_path_buf(), identity, running, thread })
}

fn server_loop<F>(listener: &UnixListener, running: &AtomicBool, handler: &Arc<F>)
where F: Fn(BridgeCommand) -> IpcResponse + Send + Sync + 'static {
    while running.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, _)) => {
                // Accepted sockets inherit non-blocking mode on some platforms.
                if let Err(err) = stream.set_nonblocking(false) {
                    tracing::warn!(error = %err, "failed to configure ipc connection");
                    continue;
                }
                let handler = Arc::clone(handler);
                spawn_named_thread("ipc-conn", move || {
                    handle_connection(stream, handler.as_ref());
                });
            }
            Err(err) if err.kind() == ErrorKind::WouldBlock => std::thread::sleep(ACCEPT_POLL),
            Err(err) => {
                tracing::warn!(error = %err, "ipc connection error");
                std::thread::sleep(ACCEPT_POLL);
            }
        }
    }
}

#[allow(clippy::needless_pass_by_value)] // Ownership needed - stream is consumed
fn handle_connection<F>(stream: UnixStream, handler: &F)
where F: Fn(BridgeCommand) -> IpcResponse {
    let _ = stream.set_read_timeout(Some(DEFAULT_TIMEOUT));

    let reader_stream = match stream.try_clone() {
        Ok(clone) => clone,
        Err(err) => {
            tracing::warn!(error = %err, "failed to clone ipc stream");
            return;
        }
    };
    let mut reader = BufReader::new(reader_stream);
    let mut line = String::new();

    if reader.read_line(&mut line).is_err() || line.trim().is_empty() {
        return;
    }

    let response = match serde_json::from_str::<BridgeCommand>(line.trim()) {
        Ok(command) => handler(command),
        Err(err) => IpcResponse::error(format!("Invalid command: {err}")),
    };

    let response_json = serde_json::to_string(&response)
        .unwrap_or_else(|_| r#"{"error":"Failed to serialize response"}"#.to_string());

    let mut stream = stream;
    if let Err(err) = writeln!(stream, "{response_json}") {
        tracing::debug!(error = %err, "client went away before the response");
    }
}

/// Sends a command to the daemon listening on `path`.
///
/// Retries connection failures up to three times; timeouts and malformed
/// responses are returned immediately.
///
/// # Errors
///
/// Returns `DaemonNotRunning` if nothing listens on `path`.
pub fn send_command(path: &Path, command: &BridgeCommand) -> Result<IpcResponse, IpcError> {
    let mut last_error = IpcError::DaemonNotRunning;

    for attempt in 0..MAX_RETRIES {
        match send_command_once(path, command) {
            Ok(response) => return Ok(response),
            Err(err) => {
                last_error = err;
                if !matches!(last_error, IpcError::DaemonNotRunning) {
                    break;
                }
                if attempt < MAX_RETRIES - 1 {
                    std::thread::sleep(RETRY_DELAY);
                }
            }
        }
    }

    Err(last_error)
}

fn connection_error(err: std::io::Error) -> IpcError {
    match err.kind() {
        ErrorKind::ConnectionRefused
        | ErrorKind::NotFound
        | ErrorKind::BrokenPipe
        | ErrorKind::ConnectionReset => IpcError::DaemonNotRunning,
        ErrorKind::WouldBlock | ErrorKind::TimedOut => IpcError::Timeout,
        _ => IpcError::Io(err),
    }
}

fn send_command_once(path: &Path, command: &BridgeCommand) -> Result<IpcResponse, IpcError> {
    if !path.exists() {
        return Err(IpcError::DaemonNotRunning);
    }

    let mut stream = UnixStream::connect(path).map_err(connection_error)?;
    stream.set_read_timeout(Some(DEFAULT_TIMEOUT))?;
    stream.set_write_timeout(Some(DEFAULT_TIMEOUT))?;

    let command_json = serde_json::to_string(command)
        .map_err(|e| IpcError::InvalidResponse(format!("failed to serialize command: {e}")))?;
    writeln!(stream, "{command_json}").map_err(connection_error)?;

    let mut reader = BufReader::new(stream);
    let mut response_line = String::new();
    reader.read_line(&mut response_line).map_err(connection_error)?;

    if response_line.trim().is_empty() {
        return Err(IpcError::InvalidResponse("empty response".to_string()));
    }

    serde_json::from_str(response_line.trim())
        .map_err(|e| IpcError::InvalidResponse(format!("failed to parse response: {e}")))
}

/// Checks whether a daemon answers on `path`.
#[must_use]
pub fn is_daemon_running(path: &Path) -> bool {
    matches!(send_command(path, &BridgeCommand::Ping), Ok(IpcResponse::Success { .. }))
}
