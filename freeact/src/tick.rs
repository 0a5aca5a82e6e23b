//! The tick engine: one process-wide handler multiplexing every constructed
//! time event onto the hardware timer tick.

use core::cell::RefCell;
use std::sync::atomic::{AtomicU32, Ordering};

use critical_section::Mutex as CsMutex;
use heapless::Vec;
use thiserror::Error;

use crate::event::Evt;
use std::sync::Arc;
use crate::time::TimeEvent;

/// Default registry capacity; topology is static, so this is a build-time
/// sizing decision.
pub const DEFAULT_MAX_TIME_EVENTS: usize = 16;

/// The registry already holds its build-time maximum of time events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("time event registry full")]
pub struct RegistryFull;

/// Registry and tick handler for up to `M` time events.
///
/// [`TickEngine::tick_from_isr`] is invoked once per hardware timer period
/// (the tick source is typically an interrupt). Its work is bounded: one
/// linear scan over the registered events. When several events expire on the
/// same tick, their signals are posted in registration order, which keeps
/// test runs reproducible.
pub struct TickEngine<const M: usize = DEFAULT_MAX_TIME_EVENTS> {
    entries: CsMutex<RefCell<Vec<Arc<TimeEvent>, M>>>,
    dropped: AtomicU32,
}

impl<const M: usize> TickEngine<M> {
    pub fn new() -> Self {
        Self {
            entries: CsMutex::new(RefCell::new(Vec::new())),
            dropped: AtomicU32::new(0),
        }
    }

    /// Registers a constructed time event. Registration order fixes the
    /// same-tick expiry order.
    pub fn register(&self, event: Arc<TimeEvent>) -> Result<(), RegistryFull> {
        critical_section::with(|cs| {
            self.entries
                .borrow_ref_mut(cs)
                .push(event)
                .map_err(|_| RegistryFull)
        })
    }

    /// The process-wide tick handler.
    ///
    /// One bounded critical section decrements every armed countdown and
    /// collects the expiries; the posts themselves happen after the scan, in
    /// registration order, through the ISR-safe path. A rejected post is
    /// counted and logged, never silently dropped, and never retried here.
    pub fn tick_from_isr(&self) {
        let mut fired: Vec<Arc<TimeEvent>, M> = Vec::new();
        critical_section::with(|cs| {
            for entry in self.entries.borrow_ref(cs).iter() {
                if entry.advance(cs) {
                    // Cannot overflow: fired never outgrows the registry.
                    let _ = fired.push(Arc::clone(entry));
                }
            }
        });

        for event in &fired {
            if event
                .owner()
                .post_from_isr(Evt::new(event.signal()))
                .is_err()
            {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                log::warn!(
                    "tick: {} mailbox full, {} dropped",
                    event.owner().name(),
                    event.signal(),
                );
            }
        }
    }

    /// Number of expiry posts rejected by a full mailbox since startup.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.entries.borrow_ref(cs).len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<const M: usize> Default for TickEngine<M> {
    fn default() -> Self {
        Self::new()
    }
}
