//! The MotionDesk daemon.
//!
//! Everything that touches the engine runs on one thread. Power feed signals,
//! state file edits and IPC commands arrive from their own threads as
//! [`DaemonEvent`]s on a single channel and are processed in order by
//! [`Daemon::run`].

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;

use crate::bridge::{BridgeCommand, MotionDesk};
use crate::config::{self, JsonStateStore, MemoryStore, StateStore, StateWatcher};
use crate::constants::APP_NAME;
use crate::error::MotionDeskError;
use crate::events;
use crate::ipc::{self, IpcResponse, ServerHandle};
use crate::platform::HeadlessBackend;
use crate::power::{BatteryPowerSource, PowerSource};
use crate::types::WallpaperType;

/// How long an IPC connection waits for the loop to answer a command.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Something the daemon loop has to react to.
#[derive(Debug)]
pub enum DaemonEvent {
    /// The power feed saw a change.
    PowerSourceChanged,
    /// The state file was edited.
    StateFileChanged,
    /// A client command and the channel for its response.
    Command(BridgeCommand, Sender<IpcResponse>),
    /// Stop the loop.
    Shutdown,
}

/// How the daemon is started.
#[derive(Debug, Clone)]
pub struct DaemonOptions {
    /// Number of displays of the headless backend.
    pub displays: u32,
    /// Keep state in memory instead of the state file.
    pub ephemeral: bool,
    /// Socket to serve commands on.
    pub socket_path: PathBuf,
}

/// Installs the global tracing subscriber once.
///
/// Honours `RUST_LOG`; defaults to `info` (`debug` in debug builds).
pub fn init_tracing() {
    static INIT: OnceLock<()> = OnceLock::new();

    INIT.get_or_init(|| {
        let default_level = if cfg!(debug_assertions) { "debug" } else { "info" };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "motiondesk_lib={default_level},motiondesk={default_level}"
            ))
        });

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_thread_names(true)
            .try_init();
    });
}

/// The daemon: the application core plus its event channel.
pub struct Daemon {
    core: MotionDesk,
    sender: Sender<DaemonEvent>,
    receiver: Receiver<DaemonEvent>,
}

impl std::fmt::Debug for Daemon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Daemon").field("core", &self.core).finish_non_exhaustive()
    }
}

impl Daemon {
    /// Wraps `core` and subscribes the event log to its notifications.
    #[must_use]
    pub fn new(core: MotionDesk) -> Self {
        let (sender, receiver) = mpsc::channel();
        let daemon = Self { core, sender, receiver };
        daemon.log_notifications();
        daemon
    }

    /// A handle for feeding events into the loop from other threads.
    #[must_use]
    pub fn sender(&self) -> Sender<DaemonEvent> { self.sender.clone() }

    /// The application core.
    #[must_use]
    pub const fn core(&self) -> &MotionDesk { &self.core }

    /// The application core, mutably.
    pub const fn core_mut(&mut self) -> &mut MotionDesk { &mut self.core }

    /// Starts the power feed, takes the first power sample and restores the
    /// persisted wallpaper.
    pub fn start(&mut self) {
        let sender = self.sender();
        self.core.engine_mut().power_mut().start(Box::new(move || {
            let _ = sender.send(DaemonEvent::PowerSourceChanged);
        }));

        self.core.engine_mut().force_power_update();

        let restored = self.core.engine_mut().restore();
        if !restored.is_ok() {
            tracing::warn!(error = %restored, "failed to restore the saved wallpaper");
        }
    }

    /// Processes one event. Returns `Break` when the daemon should stop.
    pub fn handle(&mut self, event: DaemonEvent) -> ControlFlow<()> {
        match event {
            DaemonEvent::PowerSourceChanged => self.core.engine_mut().handle_power_source_change(),
            DaemonEvent::StateFileChanged => {
                self.core.reload_settings();
            }
            DaemonEvent::Command(command, reply) => {
                let shutdown = matches!(command, BridgeCommand::Shutdown);
                let response = match self.core.execute(command) {
                    Ok(data) => IpcResponse::Success { data },
                    Err(err) => IpcResponse::error(err.to_string()),
                };
                let _ = reply.send(response);
                if shutdown {
                    return ControlFlow::Break(());
                }
            }
            DaemonEvent::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    /// Processes every event that is already queued, without blocking.
    pub fn drain(&mut self) -> ControlFlow<()> {
        while let Ok(event) = self.receiver.try_recv() {
            self.handle(event)?;
        }
        ControlFlow::Continue(())
    }

    /// Runs the loop until a shutdown event, then cleans up.
    pub fn run(mut self) {
        tracing::info!(app = APP_NAME, "daemon running");

        loop {
            match self.receiver.recv_timeout(Duration::from_secs(1)) {
                Ok(event) => {
                    if self.handle(event).is_break() {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        self.shutdown();
    }

    fn shutdown(&mut self) {
        tracing::info!(event = events::app::SHUTDOWN, "daemon shutting down");
        self.core.engine_mut().cleanup();
    }

    fn log_notifications(&self) {
        let engine = self.core.engine();
        let settings = self.core.settings_handle();
        let last_type = Mutex::new(WallpaperType::None);

        engine.subscribe(move |state| {
            tracing::info!(
                event = events::wallpaper::STATE_CHANGED,
                wallpaper_type = %state.wallpaper_type,
                is_playing = state.is_playing,
                "wallpaper state changed"
            );

            let mut last = last_type.lock();
            if *last != state.wallpaper_type {
                *last = state.wallpaper_type;
                let shown = state.wallpaper_type != WallpaperType::None;
                if shown && settings.read().show_notifications {
                    tracing::info!(
                        event = events::app::NOTIFICATION,
                        "{} wallpaper applied",
                        state.wallpaper_type
                    );
                }
            }
        });

        engine.audio().subscribe(|audio| {
            tracing::info!(
                event = events::audio::SETTINGS_CHANGED,
                volume = audio.volume,
                is_muted = audio.is_muted,
                "audio settings changed"
            );
        });

        engine.power().subscribe(|state| {
            tracing::info!(event = events::power::STATE_CHANGED, %state, "power source changed");
        });
    }
}

/// Runs the daemon until a `stop` command arrives.
///
/// # Errors
///
/// Returns an error if another daemon already answers on the socket or the
/// socket cannot be bound.
pub fn run(options: &DaemonOptions) -> Result<(), MotionDeskError> {
    init_tracing();

    if ipc::is_daemon_running(&options.socket_path) {
        return Err(MotionDeskError::DaemonError(format!(
            "a daemon is already listening on {}",
            options.socket_path.display()
        )));
    }

    let (store, state_path): (Arc<dyn StateStore>, Option<PathBuf>) = if options.ephemeral {
        (Arc::new(MemoryStore::new()), None)
    } else {
        let path = config::state_file_path();
        tracing::info!(path = %path.display(), "using state file");
        (Arc::new(JsonStateStore::new(&path)), Some(path))
    };

    let backend = Arc::new(HeadlessBackend::new(options.displays.max(1)));
    let power_source: Arc<dyn PowerSource> = Arc::new(BatteryPowerSource);
    let mut daemon = Daemon::new(MotionDesk::new(backend, store, power_source));
    daemon.start();

    let _watcher: Option<StateWatcher> = state_path.as_deref().and_then(|path| {
        let sender = daemon.sender();
        config::watch_state_file(path, move || {
            let _ = sender.send(DaemonEvent::StateFileChanged);
        })
    });

    let server = serve(&options.socket_path, daemon.sender())?;
    daemon.run();
    drop(server);
    Ok(())
}

/// Serves IPC commands on `path` by forwarding them to the loop behind `sender`.
///
/// # Errors
///
/// Returns an error if the socket cannot be bound.
pub fn serve(path: &Path, sender: Sender<DaemonEvent>) -> Result<ServerHandle, MotionDeskError> {
    ipc::start_server(path, move |command| {
        let (reply_tx, reply_rx) = mpsc::channel();
        if sender.send(DaemonEvent::Command(command, reply_tx)).is_err() {
            return IpcResponse::error("daemon is shutting down");
        }
        reply_rx
            .recv_timeout(COMMAND_TIMEOUT)
            .unwrap_or_else(|_| IpcResponse::error("daemon did not answer in time"))
    })
    .ok_or_else(|| {
        MotionDeskError::DaemonError(format!("failed to listen on {}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::power::SimulatedPowerSource;
    use crate::types::PowerState;

    fn daemon(power: &SimulatedPowerSource) -> Daemon {
        let core = MotionDesk::new(
            Arc::new(HeadlessBackend::new(2)),
            Arc::new(MemoryStore::new()),
            Arc::new(power.clone()),
        );
        Daemon::new(core)
    }

    fn command(daemon: &mut Daemon, command: BridgeCommand) -> (ControlFlow<()>, IpcResponse) {
        let (tx, rx) = mpsc::channel();
        let flow = daemon.handle(DaemonEvent::Command(command, tx));
        (flow, rx.recv().unwrap())
    }

    #[test]
    fn commands_are_answered_on_the_reply_channel() {
        let power = SimulatedPowerSource::new(PowerState::PluggedIn);
        let mut daemon = daemon(&power);

        let (flow, response) = command(&mut daemon, BridgeCommand::Ping);
        assert!(flow.is_continue());
        assert_eq!(response, IpcResponse::success("pong"));
    }

    #[test]
    fn failures_become_error_responses() {
        let power = SimulatedPowerSource::new(PowerState::PluggedIn);
        let mut daemon = daemon(&power);

        let (_, response) = command(
            &mut daemon,
            BridgeCommand::SetSetting { name: "bogus".to_string(), value: true },
        );
        assert!(matches!(response, IpcResponse::Error { .. }));
    }

    #[test]
    fn shutdown_command_stops_the_loop() {
        let power = SimulatedPowerSource::new(PowerState::PluggedIn);
        let mut daemon = daemon(&power);

        let (flow, response) = command(&mut daemon, BridgeCommand::Shutdown);
        assert!(flow.is_break());
        assert_eq!(response, IpcResponse::Success { data: serde_json::Value::Null });
    }

    #[test]
    fn power_events_reach_the_engine() {
        let power = SimulatedPowerSource::new(PowerState::PluggedIn);
        let mut daemon = daemon(&power);
        daemon.core_mut().engine_mut().force_power_update();
        assert_eq!(daemon.core().get_power_state(), PowerState::PluggedIn);

        power.set(PowerState::OnBattery);
        daemon.sender().send(DaemonEvent::PowerSourceChanged).unwrap();
        assert!(daemon.drain().is_continue());
        assert_eq!(daemon.core().get_power_state(), PowerState::OnBattery);
    }

    #[test]
    fn drain_stops_at_shutdown() {
        let power = SimulatedPowerSource::new(PowerState::PluggedIn);
        let mut daemon = daemon(&power);
        daemon.sender().send(DaemonEvent::Shutdown).unwrap();
        assert!(daemon.drain().is_break());
    }
}
