//! Periodic system tick generation on a dedicated thread.
//!
//! Stands in for the hardware timer interrupt: each period it calls
//! [`TickEngine::tick_from_isr`] on the supplied engine. Drift-free by
//! construction: the thread sleeps until absolute monotonic deadlines rather
//! than for relative durations, so jitter in one period does not accumulate
//! into the next.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use freeact::{TickEngine, TickRate};

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Handle to a running ticker thread.
///
/// The tick source stops when the handle is dropped (or [`Ticker::stop`] is
/// called); armed time events simply stop advancing.
pub struct Ticker {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Spawns the tick thread driving `engine` at `rate`.
    pub fn start<const M: usize>(
        engine: Arc<TickEngine<M>>,
        rate: TickRate,
    ) -> io::Result<Ticker> {
        let period = Duration::from_nanos(NANOS_PER_SEC / rate.raw_hz() as u64);
        let running = Arc::new(AtomicBool::new(true));

        let thread = {
            let running = Arc::clone(&running);
            thread::Builder::new()
                .name("freeact-tick".into())
                .spawn(move || tick_loop(engine, period, running))?
        };

        log::info!("ticker started at {} Hz", rate.raw_hz());
        Ok(Ticker {
            running,
            thread: Some(thread),
        })
    }

    /// Stops the tick thread and waits for it to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn tick_loop<const M: usize>(
    engine: Arc<TickEngine<M>>,
    period: Duration,
    running: Arc<AtomicBool>,
) {
    let mut deadline = Instant::now();
    while running.load(Ordering::Relaxed) {
        deadline += period;
        let now = Instant::now();
        if deadline > now {
            thread::sleep(deadline - now);
        }
        engine.tick_from_isr();
    }
}
