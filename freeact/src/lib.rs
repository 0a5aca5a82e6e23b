//! # freeact
//!
//! A Rust port of the [FreeAct](https://github.com/QuantumLeaps/FreeACT)
//! active object framework: a lightweight actor runtime for
//! resource-constrained, interrupt-driven systems.
//!
//! Each active object owns a bounded event queue (its *mailbox*) and one
//! dedicated execution context that loops "wait for event, dispatch, repeat"
//! forever. Events may be posted from task context or from interrupt context;
//! both paths are non-blocking and confined to a bounded critical section.
//! Time events multiplex one-shot and periodic timeouts onto a single
//! tick-driven handler that posts into mailboxes like any other producer.
//!
//! ## Module overview
//! - [`event`]   – Signals and the event envelope.
//! - [`mailbox`] – Bounded per-object FIFO, safe across the ISR/task boundary.
//! - [`active`]  – Active object construction, startup and dispatch.
//! - [`time`]    – Time events and tick-based durations.
//! - [`tick`]    – The process-wide tick engine.
//! - [`port`]    – Traits the host scheduler port implements.
//!
//! The crate itself never blocks outside of the mailbox `take` and never
//! allocates after startup; topology is fixed once the objects are started.

pub mod active;
pub mod event;
pub mod mailbox;
pub mod port;
pub mod tick;
pub mod time;

pub use active::{Active, ActiveHandle, Behavior, Lifecycle, StartError};
pub use event::{Evt, Signal, SignalRangeError};
pub use mailbox::QueueFull;
pub use port::{InvalidPriority, Parker, Platform, Priority, SpawnError, StartOptions};
pub use tick::{RegistryFull, TickEngine};
pub use time::{TickRate, Ticks, TimeEvent};

#[cfg(test)]
mod tests;
