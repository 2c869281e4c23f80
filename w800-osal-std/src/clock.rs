//! Tick clock derived from the monotonic host clock.

use std::num::NonZeroU32;
use std::time::{Duration, Instant};

use w800_osal_api::Ticks;

const MICROS_PER_SECOND: u128 = 1_000_000;

/// Converts between kernel ticks and host time.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Clock {
    epoch: Instant,
    tick_rate_hz: NonZeroU32,
}

impl Clock {
    /// Starts a clock at tick `0`.
    pub(crate) fn start(tick_rate_hz: NonZeroU32) -> Self {
        Self {
            epoch: Instant::now(),
            tick_rate_hz,
        }
    }

    /// Ticks elapsed since the clock started, wrapping at the counter width.
    pub(crate) fn now(&self) -> Ticks {
        let ticks = self.epoch.elapsed().as_micros() * u128::from(self.tick_rate_hz.get())
            / MICROS_PER_SECOND;
        // Truncation is the counter wrap.
        ticks as Ticks
    }

    /// Host time spanned by `ticks` ticks.
    pub(crate) fn duration(&self, ticks: Ticks) -> Duration {
        let micros =
            u128::from(ticks) * MICROS_PER_SECOND / u128::from(self.tick_rate_hz.get());
        Duration::from_micros(u64::try_from(micros).unwrap_or(u64::MAX))
    }

    /// The instant `ticks` ticks from now.
    pub(crate) fn deadline(&self, ticks: Ticks) -> Instant {
        Instant::now() + self.duration(ticks)
    }
}
