//! POSIX reference port for the FreeAct runtime.
//!
//! Execution contexts are plain threads, the per-object wakeup primitive is
//! a condvar-backed parker, and a dedicated ticker thread stands in for the
//! hardware timer interrupt. "Interrupt context" on this port is simulated
//! by ordinary threads, so the ISR-safe entry points reduce to their
//! task-context versions.
//!
//! Host thread priorities are best-effort only: the requested priority is
//! recorded in the thread name, and real-time scheduling classes (e.g.
//! `SCHED_FIFO`) are left to the embedding process.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use freeact::{Parker, Platform, Priority, SpawnError, StartOptions};

mod parker;
mod ticker;

pub use parker::PosixParker;
pub use ticker::Ticker;

/// Thread-backed [`Platform`] implementation.
#[derive(Default)]
pub struct PosixPlatform;

impl PosixPlatform {
    pub const fn new() -> Self {
        PosixPlatform
    }
}

impl Platform for PosixPlatform {
    fn parker(&self) -> Arc<dyn Parker> {
        Arc::new(PosixParker::new())
    }

    fn spawn(
        &self,
        name: &'static str,
        priority: Priority,
        options: &StartOptions,
        entry: Box<dyn FnOnce() + Send + 'static>,
    ) -> Result<(), SpawnError> {
        let mut builder = thread::Builder::new().name(format!("{name}-p{}", priority.raw()));
        if options.stack_size > 0 {
            builder = builder.stack_size(options.stack_size);
        }
        builder.spawn(entry).map(|_| ()).map_err(|err| SpawnError {
            reason: err.to_string(),
        })
    }
}

static RUNNING: AtomicBool = AtomicBool::new(false);

/// Parks the calling thread until [`stop`] is called or Ctrl-C arrives.
///
/// Demo binaries call this once every active object is started; the actors
/// keep running on their own threads while this blocks.
pub fn run() {
    RUNNING.store(true, Ordering::SeqCst);
    if let Err(err) = ctrlc::set_handler(stop) {
        log::warn!("ctrl-c handler not installed: {err}");
    }
    while RUNNING.load(Ordering::Relaxed) {
        thread::sleep(Duration::from_millis(10));
    }
    log::info!("shutting down");
}

/// Makes [`run`] return.
pub fn stop() {
    RUNNING.store(false, Ordering::SeqCst);
}
