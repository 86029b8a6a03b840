//! State stores.
//!
//! [`JsonStateStore`] keeps the state in a JSON file (comments tolerated) and
//! rewrites it atomically. [`MemoryStore`] keeps it in memory for tests and
//! ephemeral daemons.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use thiserror::Error;

use super::state::{PersistedState, StateUpdate};

/// Errors raised while reading or writing the state.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The state file could not be read or written.
    #[error("Failed to access state file: {0}")]
    Io(#[from] std::io::Error),
    /// The state file is not valid JSON.
    #[error("Failed to parse state file: {0}")]
    Parse(#[from] serde_json::Error),
    /// The temporary file could not replace the state file.
    #[error("Failed to replace state file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Load/save access to the persisted state.
pub trait StateStore: Send + Sync {
    /// Reads the whole state. A missing store yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if existing state cannot be read or parsed.
    fn load(&self) -> Result<PersistedState, StoreError>;

    /// Writes one section, leaving the others as they are.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be written.
    fn save(&self, update: StateUpdate) -> Result<(), StoreError>;
}

/// Saves `update`, logging instead of failing.
///
/// Persistence is at-most-once: a failed write leaves the previous value on
/// disk and the live state untouched.
pub fn save_or_warn(store: &dyn StateStore, update: StateUpdate) {
    let section = update.section();
    if let Err(err) = store.save(update) {
        tracing::warn!(section, error = %err, "failed to persist state");
    }
}

/// State kept in a JSON file.
#[derive(Debug)]
pub struct JsonStateStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonStateStore {
    /// Creates a store backed by `path`. The file is created on first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path { &self.path }

    fn read(&self) -> Result<PersistedState, StoreError> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(PersistedState::default());
            }
            Err(err) => return Err(err.into()),
        };

        let reader = json_comments::StripComments::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    fn write(&self, state: &PersistedState) -> Result<(), StoreError> {
        let dir = self.path.parent().filter(|dir| !dir.as_os_str().is_empty());
        let dir = dir.unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut temp, state)?;
        temp.write_all(b"\n")?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path)?;
        Ok(())
    }
}

impl StateStore for JsonStateStore {
    fn load(&self) -> Result<PersistedState, StoreError> {
        let state = self.read()?;
        if state.needs_upgrade() {
            tracing::info!(
                path = %self.path.display(),
                version = state.version,
                "state file uses an older layout, it will be upgraded on next save"
            );
        }
        Ok(state)
    }

    fn save(&self, update: StateUpdate) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();

        let mut state = match self.read() {
            Ok(state) => state,
            Err(StoreError::Parse(err)) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "state file is corrupt, rewriting from defaults"
                );
                PersistedState::default()
            }
            Err(err) => return Err(err),
        };

        let section = update.section();
        update.apply_to(&mut state);
        self.write(&state)?;
        tracing::debug!(path = %self.path.display(), section, "state saved");
        Ok(())
    }
}

/// State kept in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<PersistedState>,
    saves: AtomicUsize,
}

impl MemoryStore {
    /// Creates a store holding the defaults.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Creates a store holding `state`.
    #[must_use]
    pub fn with_state(state: PersistedState) -> Self {
        Self { state: Mutex::new(state), saves: AtomicUsize::new(0) }
    }

    /// Copy of the stored state.
    #[must_use]
    pub fn snapshot(&self) -> PersistedState { self.state.lock().clone() }

    /// Number of saves performed.
    #[must_use]
    pub fn save_count(&self) -> usize { self.saves.load(Ordering::SeqCst) }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<PersistedState, StoreError> { Ok(self.snapshot()) }

    fn save(&self, update: StateUpdate) -> Result<(), StoreError> {
        update.apply_to(&mut self.state.lock());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
