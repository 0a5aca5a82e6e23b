//! Time events: one-shot and periodic timeout sources.
//!
//! A time event is constructed once against an owning active object and a
//! target signal, then armed and disarmed repeatedly; it is never
//! reallocated. The countdown lives entirely in units of system ticks;
//! FreeAct's source variants disagreed on whether a raw integer meant
//! milliseconds or ticks, so here the only sanctioned conversion is the
//! explicit [`TickRate`] one.

use core::cell::RefCell;
use core::fmt;

use critical_section::{CriticalSection, Mutex as CsMutex};

use crate::active::ActiveHandle;
use crate::event::Signal;
use std::sync::Arc;

/// Duration expressed in periods of the system tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticks(pub u32);

impl Ticks {
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Ticks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ticks", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Ticks {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{} ticks", self.0);
    }
}

/// System tick frequency, and the one sanctioned wall-clock conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickRate {
    hz: u32,
}

impl TickRate {
    /// A tick rate of `rate` ticks per second.
    ///
    /// Panics on a zero rate: a tick period cannot be derived from it, and
    /// rejecting it here keeps the failure at the configuration site.
    pub const fn hz(rate: u32) -> TickRate {
        assert!(rate != 0, "tick rate must be nonzero");
        TickRate { hz: rate }
    }

    pub const fn raw_hz(self) -> u32 {
        self.hz
    }

    /// Converts milliseconds to ticks, rounding up and never yielding zero
    /// (a zero-tick arm would never fire). Results beyond `u32::MAX` ticks
    /// saturate rather than truncate.
    pub const fn ticks_from_millis(self, millis: u32) -> Ticks {
        let ticks = (millis as u64 * self.hz as u64).div_ceil(1000);
        if ticks == 0 {
            Ticks(1)
        } else if ticks > u32::MAX as u64 {
            Ticks(u32::MAX)
        } else {
            Ticks(ticks as u32)
        }
    }
}

struct Countdown {
    remaining: u32,
    /// Reload value for periodic events; 0 marks one-shot.
    interval: u32,
    armed: bool,
}

/// A timeout source bound to one owning active object.
///
/// Armed countdowns are advanced by the tick engine; on expiry the target
/// signal is posted into the owner's mailbox through the ISR-safe path, with
/// no special privilege over any other producer.
pub struct TimeEvent {
    signal: Signal,
    owner: Arc<dyn ActiveHandle>,
    countdown: CsMutex<RefCell<Countdown>>,
}

impl TimeEvent {
    /// Binds the target signal and owner. Initially disarmed: the engine
    /// skips it until the first [`TimeEvent::arm`].
    pub fn new(signal: Signal, owner: Arc<dyn ActiveHandle>) -> Arc<TimeEvent> {
        Arc::new(TimeEvent {
            signal,
            owner,
            countdown: CsMutex::new(RefCell::new(Countdown {
                remaining: 0,
                interval: 0,
                armed: false,
            })),
        })
    }

    pub fn signal(&self) -> Signal {
        self.signal
    }

    /// Arms (or re-arms) the countdown.
    ///
    /// `Some(interval)` makes the event periodic: each expiry reloads the
    /// countdown with `interval` instead of disarming. Re-arming an armed
    /// event resets its countdown (last call wins), which is how a handler
    /// alternates ON/OFF durations by re-arming the same one-shot timer on
    /// every expiry. Zero durations are clamped to one tick.
    pub fn arm(&self, timeout: Ticks, interval: Option<Ticks>) {
        let remaining = timeout.0.max(1);
        let interval = interval.map_or(0, |t| t.0.max(1));
        critical_section::with(|cs| {
            let mut countdown = self.countdown.borrow_ref_mut(cs);
            countdown.remaining = remaining;
            countdown.interval = interval;
            countdown.armed = true;
        });
        log::debug!(
            "{}: armed {} for {} ticks (interval {})",
            self.owner.name(),
            self.signal,
            remaining,
            interval,
        );
    }

    /// Disarms the event: its countdown stops advancing and nothing is
    /// posted for the current arm cycle. Races benignly with an in-flight
    /// tick; the countdown update and the armed flag live in one critical
    /// section, so the event is left either cleanly expired or cleanly
    /// disarmed.
    pub fn disarm(&self) {
        critical_section::with(|cs| {
            let mut countdown = self.countdown.borrow_ref_mut(cs);
            countdown.armed = false;
            countdown.remaining = 0;
        });
        log::debug!("{}: disarmed {}", self.owner.name(), self.signal);
    }

    pub fn is_armed(&self) -> bool {
        critical_section::with(|cs| self.countdown.borrow_ref(cs).armed)
    }

    pub(crate) fn owner(&self) -> &dyn ActiveHandle {
        self.owner.as_ref()
    }

    /// Advances the countdown by one tick; true means the event expired and
    /// its signal should be posted.
    ///
    /// Runs under the engine's critical section so concurrent `arm`/`disarm`
    /// calls cannot interleave mid-update. Invariant: armed implies
    /// `remaining >= 1`, maintained by the clamps in [`TimeEvent::arm`].
    pub(crate) fn advance(&self, cs: CriticalSection<'_>) -> bool {
        let mut countdown = self.countdown.borrow_ref_mut(cs);
        if !countdown.armed {
            return false;
        }

        countdown.remaining -= 1;
        if countdown.remaining != 0 {
            return false;
        }

        if countdown.interval != 0 {
            countdown.remaining = countdown.interval;
        } else {
            countdown.armed = false;
        }
        true
    }
}
