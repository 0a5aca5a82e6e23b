//! BlinkyButton: the canonical FreeAct demo on the POSIX port.
//!
//! One active object drives two "LEDs" (stdout lines):
//! - LED1 blinks asymmetrically, 200 ms ON / 800 ms OFF, by re-arming a
//!   one-shot time event with the next phase's duration on every expiry.
//! - LED0 tracks a button that is pressed and released from a simulated
//!   interrupt: a thread posting through the ISR-safe path every 3 seconds.
//!
//! Runs until Ctrl-C.

use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::Duration;

use freeact::{
    Active, ActiveHandle, Behavior, Evt, Priority, Signal, StartOptions, TickEngine, TickRate,
    Ticks, TimeEvent,
};
use freeact_posix::{PosixPlatform, Ticker};

const TICK_RATE: TickRate = TickRate::hz(100);

const BUTTON_PRESSED: Signal = Signal::user(0);
const BUTTON_RELEASED: Signal = Signal::user(1);

fn led0(on: bool) {
    println!("LED0 {}", if on { "on" } else { "off" });
}

fn led1(on: bool) {
    println!("LED1 {}", if on { "on" } else { "off" });
}

struct BlinkyButton {
    is_led_on: bool,
    blink_timer: Arc<OnceLock<Arc<TimeEvent>>>,
    on_time: Ticks,
    off_time: Ticks,
}

impl BlinkyButton {
    fn new(blink_timer: Arc<OnceLock<Arc<TimeEvent>>>) -> Self {
        BlinkyButton {
            is_led_on: false,
            blink_timer,
            on_time: TICK_RATE.ticks_from_millis(200),
            off_time: TICK_RATE.ticks_from_millis(800),
        }
    }

    fn toggle(&mut self) {
        let timer = self.blink_timer.get().expect("timer wired before start");
        if self.is_led_on {
            led1(false);
            self.is_led_on = false;
            timer.arm(self.off_time, None);
        } else {
            led1(true);
            self.is_led_on = true;
            timer.arm(self.on_time, None);
        }
    }
}

impl Behavior for BlinkyButton {
    fn on_event(&mut self, evt: &Evt) {
        match evt.signal() {
            // INIT kicks off the first phase; every TIMEOUT flips it.
            Signal::INIT | Signal::TIMEOUT => self.toggle(),
            BUTTON_PRESSED => led0(true),
            BUTTON_RELEASED => led0(false),
            other => log::warn!("blinky-button: unexpected {other}"),
        }
    }
}

/// Simulated button wiring: a free-running thread standing in for the GPIO
/// edge interrupt, posting through the ISR-safe path.
fn start_button_isr(ao: Arc<dyn ActiveHandle>) {
    thread::spawn(move || loop {
        thread::sleep(Duration::from_secs(3));
        if ao.post_from_isr(Evt::new(BUTTON_PRESSED)).is_err() {
            log::warn!("button press lost");
        }
        thread::sleep(Duration::from_millis(250));
        if ao.post_from_isr(Evt::new(BUTTON_RELEASED)).is_err() {
            log::warn!("button release lost");
        }
    });
}

fn main() {
    let engine: Arc<TickEngine> = Arc::new(TickEngine::new());

    let timer_slot = Arc::new(OnceLock::new());
    let ao: Arc<Active<BlinkyButton, 10>> =
        Active::new("blinky-button", BlinkyButton::new(Arc::clone(&timer_slot)));

    let timer = TimeEvent::new(Signal::TIMEOUT, ao.clone());
    engine
        .register(timer.clone())
        .expect("registry sized for this demo");
    let _ = timer_slot.set(timer);

    ao.start(&PosixPlatform, Priority::MIN, StartOptions::default())
        .expect("startup is all-or-nothing");

    let ticker = Ticker::start(Arc::clone(&engine), TICK_RATE).expect("tick thread");
    start_button_isr(ao);

    freeact_posix::run();
    ticker.stop();
}
