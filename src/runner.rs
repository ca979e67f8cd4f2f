//! Wall-clock pacing for free-running a machine.
//!
//! The runner is the only place with a notion of real time: it steps the
//! machine at a configurable instruction rate and ticks the timers at
//! 60 Hz from the same loop, so machine state is never touched from two
//! threads. A pending key-wait shows up as `WouldBlock` and is simply
//! re-polled on the next period. Cancellation is cooperative: the
//! `cancelled` closure is checked between steps, never mid-instruction.

use std::time::{Duration, Instant};

use crate::chip8::Chip8;
use crate::context::Context;
use crate::error::Error;

/// Nominal timer frequency in Hz
pub const TIMER_FREQ: u32 = 60;

/// Default instruction rate in Hz, roughly original hardware throughput
pub const DEFAULT_CLOCK_FREQ: u32 = 500;

pub struct Runner {
    clock_freq: u32,
}

impl Runner {
    pub fn new(clock_freq: u32) -> Self {
        // the step period is derived by division, so 0 Hz is not
        // representable; clamp to the slowest possible clock
        Self {
            clock_freq: clock_freq.max(1),
        }
    }

    /// Free-run `chip` until the first fatal error or until `cancelled`
    /// returns true
    ///
    /// Returns `Ok(())` on cancellation, or the error that halted
    /// execution.
    pub fn run_until<C, F>(&self, chip: &mut Chip8<C>, mut cancelled: F) -> Result<(), Error>
    where
        C: Context,
        F: FnMut() -> bool,
    {
        let step_period = Duration::from_nanos(1_000_000_000u64 / u64::from(self.clock_freq));
        let tick_period = Duration::from_nanos(1_000_000_000u64 / u64::from(TIMER_FREQ));
        let started = Instant::now();
        let mut last_step = started;
        let mut last_tick = started;

        while !cancelled() {
            let now = Instant::now();
            if now.duration_since(last_tick) >= tick_period {
                chip.tick_timers();
                last_tick = now;
            }
            if now.duration_since(last_step) >= step_period {
                match chip.tick_chip() {
                    // a pending key-wait, poll again next period
                    Err(nb::Error::WouldBlock) | Ok(()) => last_step = now,
                    Err(nb::Error::Other(err)) => {
                        log::error!("execution halted: {}", err);
                        return Err(err);
                    }
                }
            }
            std::thread::yield_now();
        }
        Ok(())
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(DEFAULT_CLOCK_FREQ)
    }
}
