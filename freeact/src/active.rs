//! Active objects: state plus a dispatch function, run by one dedicated
//! execution context.
//!
//! An active object is constructed once, started once, and then runs its
//! "superloop" for the lifetime of the process: wait for an event, dispatch
//! it, repeat. Only the object's own context ever reads its mailbox or
//! mutates its behavior state; every other context (including interrupts)
//! may only post.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::event::{Evt, Signal};
use crate::mailbox::{Mailbox, QueueFull};
use crate::port::{Parker, Platform, Priority, SpawnError, StartOptions};

// The behavior cell is locked only by the object's own context; the
// `lock-free` feature swaps in a spinlock for embeddings where a blocking
// OS mutex is not acceptable on the task side.
#[cfg(not(feature = "lock-free"))]
use std::sync::Mutex;
#[cfg(feature = "lock-free")]
use spin::Mutex;

/// Application dispatch behavior of one active object.
///
/// `on_event` runs exclusively on the object's own execution context, so the
/// implementation needs no locking for its own state. It must return
/// promptly: the mailbox `take` is the only place an active object may
/// suspend, so handlers never block, sleep, or wait on I/O.
pub trait Behavior: Send + 'static {
    fn on_event(&mut self, evt: &Evt);
}

/// Lifecycle state of an active object. `Running` is terminal: FreeAct
/// defines no stop or teardown path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Constructed,
    Running,
}

const STATE_CONSTRUCTED: u8 = 0;
const STATE_RUNNING: u8 = 1;

/// Failure to start an active object.
///
/// Fatal to that object: callers must propagate it and halt startup rather
/// than run alongside a partially-initialized actor.
#[derive(Debug, Error)]
pub enum StartError {
    /// The host scheduler could not create the execution context.
    #[error("context creation failed: {0}")]
    ContextCreation(String),
    /// `start` was called on an object that is already running.
    #[error("active object already started")]
    AlreadyStarted,
}

impl From<SpawnError> for StartError {
    fn from(err: SpawnError) -> Self {
        StartError::ContextCreation(err.reason)
    }
}

/// Producer-side surface of an active object.
///
/// Application code, interrupt handlers and the tick engine all post through
/// this trait; no producer has special privilege at the queue boundary.
pub trait ActiveHandle: Send + Sync {
    fn name(&self) -> &'static str;

    /// Posts from task context. See [`Mailbox::post`] for failure semantics.
    fn post(&self, evt: Evt) -> Result<(), QueueFull>;

    /// Posts from interrupt context; never blocks.
    fn post_from_isr(&self, evt: Evt) -> Result<(), QueueFull>;
}

/// An active object with behavior `B` and a mailbox of capacity `N`.
///
/// Construct with [`Active::new`], share via the returned [`Arc`], and bring
/// to life with [`Active::start`].
pub struct Active<B: Behavior, const N: usize> {
    name: &'static str,
    mailbox: Mailbox<N>,
    behavior: Mutex<B>,
    state: AtomicU8,
    priority: AtomicU8,
}

impl<B: Behavior, const N: usize> Active<B, N> {
    /// Binds the dispatch behavior. Queue storage is part of the object; the
    /// execution context is not created until [`Active::start`].
    pub fn new(name: &'static str, behavior: B) -> Arc<Self> {
        Arc::new(Self {
            name,
            mailbox: Mailbox::new(),
            behavior: Mutex::new(behavior),
            state: AtomicU8::new(STATE_CONSTRUCTED),
            priority: AtomicU8::new(0),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn lifecycle(&self) -> Lifecycle {
        match self.state.load(Ordering::Acquire) {
            STATE_RUNNING => Lifecycle::Running,
            _ => Lifecycle::Constructed,
        }
    }

    /// Priority assigned at start; `None` until then.
    pub fn priority(&self) -> Option<Priority> {
        Priority::new(self.priority.load(Ordering::Acquire)).ok()
    }

    pub fn queue_capacity(&self) -> usize {
        self.mailbox.capacity()
    }

    pub fn queue_len(&self) -> usize {
        self.mailbox.len()
    }

    /// Starts the object's execution context.
    ///
    /// Binds the wakeup primitive, creates the context at `priority` with the
    /// caller-supplied sizing, and delivers a synthetic [`Signal::INIT`]
    /// event as the first dispatch, strictly before any externally posted
    /// event, no matter how many were queued before `start`.
    pub fn start(
        self: &Arc<Self>,
        platform: &impl Platform,
        priority: Priority,
        options: StartOptions,
    ) -> Result<(), StartError> {
        if self
            .state
            .compare_exchange(
                STATE_CONSTRUCTED,
                STATE_RUNNING,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return Err(StartError::AlreadyStarted);
        }

        self.priority.store(priority.raw(), Ordering::Release);
        // The mailbox keeps whichever parker was bound first; on a retried
        // start the spawned loop must wait on that same one.
        let parker = self.mailbox.bind_parker(platform.parker());

        let this = Arc::clone(self);
        let entry = Box::new(move || this.event_loop(parker));
        match platform.spawn(self.name, priority, &options, entry) {
            Ok(()) => {
                log::info!("{}: started at {}", self.name, priority);
                Ok(())
            }
            Err(err) => {
                self.priority.store(0, Ordering::Release);
                self.state.store(STATE_CONSTRUCTED, Ordering::Release);
                Err(err.into())
            }
        }
    }

    /// The superloop. Runs on the object's own execution context forever.
    fn event_loop(self: Arc<Self>, parker: Arc<dyn Parker>) {
        let init = Evt::new(Signal::INIT);
        self.dispatch(&init);

        loop {
            let evt = self.mailbox.take(parker.as_ref());
            self.dispatch(&evt);
        }
    }

    fn dispatch(&self, evt: &Evt) {
        log::trace!("{}: dispatch {}", self.name, evt.signal());
        // Single-writer by construction: only this context takes the lock
        // while dispatching, so it is never contended. Poisoning is
        // unrecoverable here; a panicking handler has already lost the
        // object's state.
        #[cfg(not(feature = "lock-free"))]
        self.behavior
            .lock()
            .expect("behavior mutex poisoned")
            .on_event(evt);
        #[cfg(feature = "lock-free")]
        self.behavior.lock().on_event(evt);
    }
}

impl<B: Behavior, const N: usize> ActiveHandle for Active<B, N> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn post(&self, evt: Evt) -> Result<(), QueueFull> {
        log::trace!("{}: post {}", self.name, evt.signal());
        let result = self.mailbox.post(evt);
        if result.is_err() {
            log::warn!("{}: queue full, event rejected", self.name);
        }
        result
    }

    fn post_from_isr(&self, evt: Evt) -> Result<(), QueueFull> {
        let result = self.mailbox.post_from_isr(evt);
        if result.is_err() {
            log::warn!("{}: queue full, event rejected from interrupt", self.name);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Inert;

    impl Behavior for Inert {
        fn on_event(&mut self, _evt: &Evt) {}
    }

    #[test]
    fn construction_leaves_object_idle() {
        let ao: Arc<Active<Inert, 4>> = Active::new("inert", Inert);
        assert_eq!(ao.lifecycle(), Lifecycle::Constructed);
        assert_eq!(ao.priority(), None);
        assert_eq!(ao.queue_capacity(), 4);
        assert_eq!(ao.queue_len(), 0);
    }

    #[test]
    fn posting_before_start_queues_events() {
        let ao: Arc<Active<Inert, 2>> = Active::new("inert", Inert);

        ao.post(Evt::new(Signal::user(0))).unwrap();
        ao.post(Evt::new(Signal::user(1))).unwrap();
        assert_eq!(ao.queue_len(), 2);

        // Still bounded even with no consumer yet.
        assert_eq!(ao.post(Evt::new(Signal::user(2))), Err(QueueFull));
    }
}
