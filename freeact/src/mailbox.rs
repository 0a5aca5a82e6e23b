//! Bounded per-object event queues.
//!
//! The mailbox is the only resource shared between interrupt and task
//! context. Every mutation is confined to a bounded critical section; the
//! blocking side is confined to [`Mailbox::take`], which only the owning
//! execution context calls and which is the sole suspension point in the
//! system.

use core::cell::RefCell;
use std::sync::OnceLock;

use critical_section::Mutex as CsMutex;
use heapless::Deque;
use thiserror::Error;

use crate::event::Evt;
use crate::port::Parker;
use std::sync::Arc;

/// A post hit a mailbox already holding `capacity` unconsumed events.
///
/// The queue's contents and count are left untouched; whether and when to
/// retry is the caller's decision, never the runtime's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("event queue full")]
pub struct QueueFull;

#[cfg(feature = "defmt")]
impl defmt::Format for QueueFull {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "QueueFull");
    }
}

/// Fixed-capacity FIFO of pending events for one active object.
///
/// FIFO order per mailbox is the sole delivery-ordering guarantee: producers
/// are ordered relative to each other only at the point of insertion.
pub struct Mailbox<const N: usize> {
    queue: CsMutex<RefCell<Deque<Evt, N>>>,
    // Written once at start; reads afterwards are lock-free, which keeps the
    // ISR posting path bounded.
    parker: OnceLock<Arc<dyn Parker>>,
}

impl<const N: usize> Mailbox<N> {
    pub(crate) fn new() -> Self {
        Self {
            queue: CsMutex::new(RefCell::new(Deque::new())),
            parker: OnceLock::new(),
        }
    }

    /// Binds the consumer's wakeup primitive and returns the bound one.
    ///
    /// First call wins: a `start` retried after a context-creation failure
    /// reuses the original parker, so the posting paths and the event loop
    /// can never end up waking different primitives.
    pub(crate) fn bind_parker(&self, parker: Arc<dyn Parker>) -> Arc<dyn Parker> {
        Arc::clone(self.parker.get_or_init(|| parker))
    }

    fn push(&self, evt: Evt) -> Result<(), QueueFull> {
        critical_section::with(|cs| {
            self.queue
                .borrow_ref_mut(cs)
                .push_back(evt)
                .map_err(|_| QueueFull)
        })
    }

    /// Inserts at the tail and wakes the consumer if it is waiting.
    ///
    /// Never blocks; fails with [`QueueFull`] when `N` events are already
    /// pending. Safe to call while a lower-priority context concurrently
    /// takes from the same mailbox.
    pub fn post(&self, evt: Evt) -> Result<(), QueueFull> {
        self.push(evt)?;
        if let Some(parker) = self.parker.get() {
            parker.unpark();
        }
        Ok(())
    }

    /// Same queue contract as [`Mailbox::post`], restricted to operations
    /// safe in interrupt context: the bounded critical section around the
    /// insertion plus a non-blocking wake.
    pub fn post_from_isr(&self, evt: Evt) -> Result<(), QueueFull> {
        self.push(evt)?;
        if let Some(parker) = self.parker.get() {
            parker.unpark_from_isr();
        }
        Ok(())
    }

    /// Removes and returns the head event, parking the calling context while
    /// the queue is empty.
    ///
    /// Only the owning execution context may call this. The parker's permit
    /// protocol guarantees a post between the empty check and the park is not
    /// missed; spurious wakeups simply re-run the check.
    pub(crate) fn take(&self, parker: &dyn Parker) -> Evt {
        loop {
            if let Some(evt) = self.try_take() {
                return evt;
            }
            parker.park();
        }
    }

    fn try_take(&self) -> Option<Evt> {
        critical_section::with(|cs| self.queue.borrow_ref_mut(cs).pop_front())
    }

    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.queue.borrow_ref(cs).len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Signal;

    /// A parker that must never be reached: used where the queue is known to
    /// be non-empty.
    struct NoPark;

    impl Parker for NoPark {
        fn park(&self) {
            panic!("consumer parked unexpectedly");
        }
        fn unpark(&self) {}
        fn unpark_from_isr(&self) {}
    }

    #[test]
    fn fifo_order_across_posting_paths() {
        let mailbox: Mailbox<4> = Mailbox::new();

        mailbox.post(Evt::new(Signal::user(0))).unwrap();
        mailbox.post_from_isr(Evt::new(Signal::user(1))).unwrap();
        mailbox.post(Evt::new(Signal::user(2))).unwrap();

        assert_eq!(mailbox.len(), 3);
        assert_eq!(mailbox.take(&NoPark).signal(), Signal::user(0));
        assert_eq!(mailbox.take(&NoPark).signal(), Signal::user(1));
        assert_eq!(mailbox.take(&NoPark).signal(), Signal::user(2));
        assert!(mailbox.is_empty());
    }

    #[test]
    fn full_queue_rejects_without_corruption() {
        let mailbox: Mailbox<2> = Mailbox::new();

        mailbox.post(Evt::new(Signal::user(0))).unwrap();
        mailbox.post(Evt::new(Signal::user(1))).unwrap();

        assert_eq!(mailbox.post(Evt::new(Signal::user(2))), Err(QueueFull));
        assert_eq!(
            mailbox.post_from_isr(Evt::new(Signal::user(3))),
            Err(QueueFull)
        );

        // Existing contents and count unchanged by the failed posts.
        assert_eq!(mailbox.len(), 2);
        assert_eq!(mailbox.take(&NoPark).signal(), Signal::user(0));
        assert_eq!(mailbox.take(&NoPark).signal(), Signal::user(1));
    }

    #[test]
    fn capacity_is_fixed_at_construction() {
        let mailbox: Mailbox<8> = Mailbox::new();
        assert_eq!(mailbox.capacity(), 8);
    }
}
