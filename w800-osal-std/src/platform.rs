//! Interrupt masking and halting on a host process.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use w800_osal_api::Platform;
use w800_osal_api::log::LogTarget;

use crate::log::Log;

/// Implements the [`Platform`] trait for `std` hosts.
///
/// A host process has no interrupts to mask, the flag and counters only make the adapter's behavior observable.
#[derive(Debug)]
pub struct StdPlatform {
    interrupts_enabled: AtomicBool,
    disables: AtomicU32,
    enables: AtomicU32,
}

impl Default for StdPlatform {
    fn default() -> Self {
        Self {
            interrupts_enabled: AtomicBool::new(true),
            disables: AtomicU32::new(0),
            enables: AtomicU32::new(0),
        }
    }
}

impl StdPlatform {
    /// Returns `false` while interrupts are masked.
    pub fn interrupts_enabled(&self) -> bool {
        self.interrupts_enabled.load(Ordering::Acquire)
    }

    /// Returns how often interrupts were masked.
    pub fn disable_count(&self) -> u32 {
        self.disables.load(Ordering::Acquire)
    }

    /// Returns how often interrupts were unmasked.
    pub fn enable_count(&self) -> u32 {
        self.enables.load(Ordering::Acquire)
    }
}

impl Platform for StdPlatform {
    type Log = Log;

    fn disable_interrupts(&self) {
        self.interrupts_enabled.store(false, Ordering::Release);
        self.disables.fetch_add(1, Ordering::AcqRel);
    }

    fn enable_interrupts(&self) {
        self.interrupts_enabled.store(true, Ordering::Release);
        self.enables.fetch_add(1, Ordering::AcqRel);
    }

    /// Aborts the process.
    fn halt(&self) -> ! {
        Log::println(format_args!("halted"));
        std::process::abort()
    }
}
