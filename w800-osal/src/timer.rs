//! Software timers.

use alloc::boxed::Box;

use w800_osal_api::{Kernel, ObjectKind, Platform, Ticks, TimerCallback};

use crate::config::ObjectAllocation;
use crate::error::{Error, IntoOsalError, Result};
use crate::memory::Allocation;
use crate::Osal;

/// Delay of the first expiry; a zero period still fires, one tick later.
fn first_expiry(period: Ticks) -> Ticks {
    if period == 0 { 1 } else { period }
}

/// Handle of a software timer.
#[derive(Debug)]
pub struct Timer<K: Kernel> {
    raw: K::Timer,
    control: Option<Allocation>,
}

impl<K: Kernel> Timer<K> {
    /// Returns the kernel handle.
    pub fn raw(&self) -> &K::Timer {
        &self.raw
    }
}

impl<K, P> Osal<K, P>
where
    K: Kernel,
    P: Platform,
{
    /// Creates a stopped timer that calls `callback(&argument)` on expiry.
    ///
    /// The first expiry happens `period` ticks after [`Self::timer_start`] (one tick for a `period` of `0`). A
    /// repeating timer then keeps firing with the same period. The callback runs in the kernel's timer context, not
    /// in the creating task.
    pub fn timer_create<A, F>(
        &self,
        callback: F,
        argument: A,
        period: Ticks,
        repeat: bool,
        name: Option<&str>,
    ) -> Result<Timer<K>>
    where
        A: Send + Sync + 'static,
        F: Fn(&A) + Send + Sync + 'static,
    {
        let first = first_expiry(period);
        let round = if repeat { first } else { 0 };
        let name = name.unwrap_or(self.config.default_timer_name);
        let callback: TimerCallback = Box::new(move || callback(&argument));

        match self.config.object_allocation {
            ObjectAllocation::Kernel => {
                let raw = self
                    .kernel
                    .timer_create(name, callback, first, round)
                    .into_osal_error("timer_create")?;
                Ok(Timer { raw, control: None })
            }
            ObjectAllocation::Adapter => {
                let mut control = Allocation::new(
                    &self.allocator,
                    self.kernel.control_block_size(ObjectKind::Timer),
                )
                .ok_or(Error)?;
                let raw = self
                    .kernel
                    .timer_init(control.block_mut(), name, callback, first, round)
                    .into_osal_error("timer_init")?;
                Ok(Timer {
                    raw,
                    control: Some(control),
                })
            }
        }
    }

    /// Arms the timer. Failures are logged, not reported.
    pub fn timer_start(&self, timer: &Timer<K>) {
        let _ = self
            .kernel
            .timer_start(&timer.raw)
            .into_osal_error("timer_start");
    }

    /// Changes the timer period to `ticks` and restarts it.
    ///
    /// A repeating timer keeps repeating with the new period, a one-shot timer stays one-shot. A `ticks` of `0` is
    /// treated as one tick. The stop/change/start sequence is not atomic: an expiry racing with it may still run.
    pub fn timer_change(&self, timer: &Timer<K>, ticks: Ticks) {
        let first = first_expiry(ticks);
        let round = if self.kernel.timer_round(&timer.raw) != 0 {
            first
        } else {
            0
        };

        let _ = self
            .kernel
            .timer_stop(&timer.raw)
            .into_osal_error("timer_stop");
        let _ = self
            .kernel
            .timer_change(&timer.raw, first, round)
            .into_osal_error("timer_change");
        let _ = self
            .kernel
            .timer_start(&timer.raw)
            .into_osal_error("timer_start");
    }

    /// Disarms the timer without deleting it. Failures are logged, not reported.
    pub fn timer_stop(&self, timer: &Timer<K>) {
        let _ = self
            .kernel
            .timer_stop(&timer.raw)
            .into_osal_error("timer_stop");
    }

    /// Deletes a timer and releases its storage. Deleting `None` succeeds without doing anything.
    pub fn timer_delete(&self, timer: Option<Timer<K>>) -> Result<()> {
        let Some(Timer { raw, control }) = timer else {
            return Ok(());
        };

        match self.kernel.timer_delete(&raw) {
            Ok(()) => Ok(()),
            Err(error) => {
                // The kernel object may still live in the control block.
                if let Some(control) = control {
                    control.leak();
                }
                Err::<(), _>(error).into_osal_error("timer_delete")
            }
        }
    }
}
