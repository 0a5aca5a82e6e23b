//! Signals and the event envelope.
//!
//! FreeAct models an event as a numeric signal plus an optional payload. The
//! signal space is partitioned into a reserved range used by the framework
//! itself and a user range starting at [`Signal::USER`]; the two can never
//! collide when application signals are built with [`Signal::user`].

use core::any::Any;
use core::fmt;

use thiserror::Error;

use std::sync::Arc;

/// Identifier for an event signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Signal(u16);

impl Signal {
    /// Synthetic first event, delivered by `start` before anything else.
    pub const INIT: Signal = Signal(0);
    /// Posted on behalf of an expired time event.
    pub const TIMEOUT: Signal = Signal(1);
    /// First signal value available to applications.
    pub const USER: Signal = Signal(4);

    /// Builds the `offset`-th application signal.
    ///
    /// User signals start at [`Signal::USER`], so a signal built here cannot
    /// collide with the reserved range.
    pub const fn user(offset: u16) -> Signal {
        Signal(Signal::USER.0 + offset)
    }

    /// Validates a raw value as an application signal.
    ///
    /// Fails with [`SignalRangeError`] when `raw` falls inside the reserved
    /// range. Prefer [`Signal::user`], which makes the error impossible.
    pub const fn try_user(raw: u16) -> Result<Signal, SignalRangeError> {
        if raw < Signal::USER.0 {
            Err(SignalRangeError { raw })
        } else {
            Ok(Signal(raw))
        }
    }

    /// The raw signal value.
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// True for framework-internal signals.
    pub const fn is_reserved(self) -> bool {
        self.0 < Signal::USER.0
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SIG({})", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Signal {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "SIG({})", self.0);
    }
}

/// A user signal value collided with the reserved range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("signal {raw} lies inside the reserved range")]
pub struct SignalRangeError {
    pub raw: u16,
}

#[cfg(feature = "defmt")]
impl defmt::Format for SignalRangeError {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "SignalRangeError({})", self.raw);
    }
}

type Payload = Arc<dyn Any + Send + Sync>;

/// Event envelope delivered to active objects.
///
/// The signal is immutable after construction and the payload, if present, is
/// read-only to the consumer. An `Evt` is cheap to clone: a long-lived
/// instance cloned on every post plays the role of FreeAct's `static` events,
/// while a freshly built one is released as soon as the last queue drops it
/// after dispatch.
#[derive(Clone)]
pub struct Evt {
    signal: Signal,
    payload: Option<Payload>,
}

impl Evt {
    /// An event carrying no payload.
    pub fn new(signal: Signal) -> Evt {
        Evt {
            signal,
            payload: None,
        }
    }

    /// An event carrying `payload`.
    pub fn with_payload<T: Any + Send + Sync>(signal: Signal, payload: T) -> Evt {
        Evt {
            signal,
            payload: Some(Arc::new(payload)),
        }
    }

    pub fn signal(&self) -> Signal {
        self.signal
    }

    /// The payload, if one of type `T` was attached at construction.
    pub fn payload<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.payload.as_deref().and_then(|p| p.downcast_ref())
    }
}

impl fmt::Debug for Evt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evt")
            .field("signal", &self.signal)
            .field("has_payload", &self.payload.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_signals_start_above_reserved_range() {
        assert_eq!(Signal::user(0), Signal::USER);
        assert!(!Signal::user(0).is_reserved());
        assert!(Signal::INIT.is_reserved());
        assert!(Signal::TIMEOUT.is_reserved());
    }

    #[test]
    fn try_user_rejects_reserved_values() {
        assert!(Signal::try_user(0).is_err());
        assert!(Signal::try_user(3).is_err());
        assert_eq!(Signal::try_user(4), Ok(Signal::USER));
        assert_eq!(Signal::try_user(100).unwrap().raw(), 100);
    }

    #[test]
    fn payload_downcast() {
        let evt = Evt::with_payload(Signal::user(1), 42u32);
        assert_eq!(evt.payload::<u32>(), Some(&42));
        assert_eq!(evt.payload::<u8>(), None);

        let empty = Evt::new(Signal::user(1));
        assert_eq!(empty.payload::<u32>(), None);
    }
}
