//! Host platform services consumed by the runtime.
//!
//! The runtime does not schedule anything itself: a port supplies preemptive,
//! priority-ordered execution contexts and a per-context wakeup primitive.
//! Interrupt disabling (or its host equivalent) comes from the
//! `critical-section` crate and is configured by the port as well.

use core::fmt;

use thiserror::Error;

use std::sync::Arc;

/// Fixed scheduling priority of an execution context.
///
/// Priorities are 1-based and larger values are more urgent; level 0 is
/// reserved for the host's idle context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Priority(u8);

impl Priority {
    /// Lowest usable priority.
    pub const MIN: Priority = Priority(1);
    /// Highest priority.
    pub const MAX: Priority = Priority(u8::MAX);

    /// Validates a priority level; level 0 is rejected.
    pub const fn new(level: u8) -> Result<Priority, InvalidPriority> {
        if level == 0 {
            Err(InvalidPriority)
        } else {
            Ok(Priority(level))
        }
    }

    pub const fn raw(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "prio {}", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Priority {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "prio {}", self.0);
    }
}

/// Priority level 0 is reserved for the idle context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("priority 0 is reserved for the idle context")]
pub struct InvalidPriority;

/// Caller-supplied sizing for an execution context.
#[derive(Debug, Clone, Copy)]
pub struct StartOptions {
    /// Stack size in bytes; 0 lets the host pick its default.
    pub stack_size: usize,
}

impl Default for StartOptions {
    fn default() -> Self {
        Self { stack_size: 0 }
    }
}

/// Per-context wakeup primitive supplied by the host scheduler.
///
/// Permit semantics are required: an `unpark` delivered while the consumer is
/// between its queue check and its `park` must make that `park` return
/// immediately. This is what closes the missed-wakeup window between a post
/// and the consumer suspending.
pub trait Parker: Send + Sync + 'static {
    /// Blocks the calling context until a permit is available, consuming it.
    /// Spurious returns are allowed; callers re-check their condition.
    fn park(&self);

    /// Makes a permit available and wakes a parked context. Task context.
    fn unpark(&self);

    /// Like [`Parker::unpark`], but callable from interrupt context: must
    /// not block, yield, or take a lock held by task code for unbounded time.
    fn unpark_from_isr(&self);
}

/// The host scheduler could not create an execution context.
#[derive(Debug, Error)]
#[error("context creation failed: {reason}")]
pub struct SpawnError {
    pub reason: String,
}

/// Host scheduler services: execution contexts and wakeup primitives.
pub trait Platform {
    /// Allocates the wakeup primitive for one active object.
    fn parker(&self) -> Arc<dyn Parker>;

    /// Creates a priority-ordered execution context running `entry` for the
    /// lifetime of the process.
    fn spawn(
        &self,
        name: &'static str,
        priority: Priority,
        options: &StartOptions,
        entry: Box<dyn FnOnce() + Send + 'static>,
    ) -> Result<(), SpawnError>;
}
