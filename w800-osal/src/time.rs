//! Time related system utilities.

use w800_osal_api::{Kernel, Platform, Ticks};

use crate::error::IntoOsalError;
use crate::Osal;

impl<K, P> Osal<K, P>
where
    K: Kernel,
    P: Platform,
{
    /// Returns the kernel tick counter. Wraps at `u32::MAX`.
    pub fn get_time(&self) -> Ticks {
        self.kernel.tick_count()
    }

    /// Blocks the calling task for `ticks` ticks.
    ///
    /// A delay of `0` returns immediately without entering the kernel, so it does not yield either.
    pub fn time_delay(&self, ticks: Ticks) {
        if ticks == 0 {
            return;
        }

        let _ = self.kernel.sleep(ticks).into_osal_error("sleep");
    }
}
