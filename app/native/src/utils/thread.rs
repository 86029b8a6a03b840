use std::thread::{self, JoinHandle};

/// Spawns a worker thread named `motiondesk-<name>`.
///
/// Returns `None` (after logging) if the OS refuses to create the thread.
pub fn spawn_named_thread<F>(name: &str, task: F) -> Option<JoinHandle<()>>
where F: FnOnce() + Send + 'static {
    let thread_name = format!("motiondesk-{name}");

    match thread::Builder::new().name(thread_name.clone()).spawn(task) {
        Ok(handle) => Some(handle),
        Err(err) => {
            tracing::error!(thread = %thread_name, error = %err, "failed to spawn thread");
            None
        }
    }
}
