//! End-to-end scenarios on the POSIX port: real threads, a real ticker, and
//! complete active objects.

use std::sync::mpsc::{channel, Sender};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use freeact::{
    Active, ActiveHandle, Behavior, Evt, Priority, Signal, StartOptions, TickEngine, TickRate,
    Ticks, TimeEvent,
};
use freeact_posix::{PosixPlatform, Ticker};

const RECV_BUDGET: Duration = Duration::from_secs(5);

struct Probe {
    out: Sender<Signal>,
}

impl Behavior for Probe {
    fn on_event(&mut self, evt: &Evt) {
        self.out.send(evt.signal()).unwrap();
    }
}

#[test]
fn init_precedes_events_posted_before_start() {
    let (out, seen) = channel();
    let ao: Arc<Active<Probe, 8>> = Active::new("probe", Probe { out });

    ao.post(Evt::new(Signal::user(7))).unwrap();
    ao.start(&PosixPlatform, Priority::MIN, StartOptions::default())
        .unwrap();

    assert_eq!(seen.recv_timeout(RECV_BUDGET).unwrap(), Signal::INIT);
    assert_eq!(seen.recv_timeout(RECV_BUDGET).unwrap(), Signal::user(7));
}

/// A blinky-style behavior: alternate ON and OFF phases by re-arming the
/// same one-shot time event with a different duration on every expiry.
///
/// The timer must target the object that owns it, so the behavior is built
/// before the object exists and the timer slot is filled in just before
/// start (the behavior does not run until then).
struct Blinky {
    out: Sender<bool>,
    is_on: bool,
    timer: Arc<OnceLock<Arc<TimeEvent>>>,
    on_time: Ticks,
    off_time: Ticks,
}

impl Blinky {
    fn timer(&self) -> &TimeEvent {
        self.timer.get().expect("timer wired before start")
    }
}

impl Behavior for Blinky {
    fn on_event(&mut self, evt: &Evt) {
        match evt.signal() {
            Signal::INIT => {
                self.is_on = false;
                self.timer().arm(self.off_time, None);
            }
            Signal::TIMEOUT => {
                self.is_on = !self.is_on;
                let next = if self.is_on { self.on_time } else { self.off_time };
                self.timer().arm(next, None);
                self.out.send(self.is_on).unwrap();
            }
            _ => {}
        }
    }
}

#[test]
fn blinky_alternates_under_a_live_ticker() {
    let engine: Arc<TickEngine<4>> = Arc::new(TickEngine::new());
    let rate = TickRate::hz(200);

    let (out, seen) = channel();
    let timer_slot = Arc::new(OnceLock::new());
    let ao: Arc<Active<Blinky, 8>> = Active::new(
        "blinky",
        Blinky {
            out,
            is_on: false,
            timer: Arc::clone(&timer_slot),
            on_time: rate.ticks_from_millis(10),
            off_time: rate.ticks_from_millis(20),
        },
    );
    let timer = TimeEvent::new(Signal::TIMEOUT, ao.clone());
    engine.register(timer.clone()).unwrap();
    timer_slot.set(timer).ok().expect("slot set once");

    ao.start(&PosixPlatform, Priority::MIN, StartOptions::default())
        .unwrap();
    let ticker = Ticker::start(Arc::clone(&engine), rate).unwrap();

    // Phases must strictly alternate, starting with ON.
    let mut expected = true;
    for _ in 0..6 {
        assert_eq!(seen.recv_timeout(RECV_BUDGET).unwrap(), expected);
        expected = !expected;
    }

    ticker.stop();
    assert_eq!(engine.dropped(), 0);
}

#[test]
fn interrupt_burst_is_dispatched_in_order() {
    const CAPACITY: usize = 64;

    let (out, seen) = channel();
    let ao: Arc<Active<Probe, CAPACITY>> = Active::new("probe", Probe { out });
    ao.start(&PosixPlatform, Priority::MIN, StartOptions::default())
        .unwrap();
    assert_eq!(seen.recv_timeout(RECV_BUDGET).unwrap(), Signal::INIT);

    let producer = {
        let ao = ao.clone();
        std::thread::spawn(move || {
            for i in 0..CAPACITY as u16 {
                ao.post_from_isr(Evt::new(Signal::user(i))).unwrap();
            }
        })
    };

    for i in 0..CAPACITY as u16 {
        assert_eq!(seen.recv_timeout(RECV_BUDGET).unwrap(), Signal::user(i));
    }
    producer.join().unwrap();
}

#[test]
fn payloads_survive_the_queue() {
    struct Echo {
        out: Sender<u32>,
    }

    impl Behavior for Echo {
        fn on_event(&mut self, evt: &Evt) {
            if let Some(&value) = evt.payload::<u32>() {
                self.out.send(value).unwrap();
            }
        }
    }

    let (out, seen) = channel();
    let ao: Arc<Active<Echo, 4>> = Active::new("echo", Echo { out });
    ao.start(&PosixPlatform, Priority::MIN, StartOptions::default())
        .unwrap();

    ao.post(Evt::with_payload(Signal::user(0), 1234u32)).unwrap();
    assert_eq!(seen.recv_timeout(RECV_BUDGET).unwrap(), 1234);
}
