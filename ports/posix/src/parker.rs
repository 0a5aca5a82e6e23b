//! Condvar-backed wakeup primitive for thread-backed active objects.

use std::sync::{Condvar, Mutex};

use freeact::Parker;

/// Permit-carrying parker.
///
/// An unpark delivered while the consumer is between "queue empty" and the
/// actual park is stored as a permit and consumed by the next park, so the
/// wakeup is never lost.
pub struct PosixParker {
    permit: Mutex<bool>,
    condvar: Condvar,
}

impl PosixParker {
    pub const fn new() -> Self {
        Self {
            permit: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }
}

impl Default for PosixParker {
    fn default() -> Self {
        Self::new()
    }
}

impl Parker for PosixParker {
    fn park(&self) {
        let mut permit = self
            .permit
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        while !*permit {
            permit = self
                .condvar
                .wait(permit)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        *permit = false;
    }

    fn unpark(&self) {
        let mut permit = self
            .permit
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *permit = true;
        self.condvar.notify_one();
    }

    fn unpark_from_isr(&self) {
        // Interrupts on this port are ordinary threads, so the ISR variant
        // is the task variant.
        self.unpark();
    }
}
