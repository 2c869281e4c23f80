//! Nested interrupt-masking critical sections.

use core::panic::Location;
use core::sync::atomic::{AtomicU32, Ordering};

use w800_osal_api::Platform;
use w800_osal_api::log::LogTarget;

/// Proof of a critical section entry, to be handed back to [`CriticalSection::leave`].
///
/// The raw value is always `1`; it does not carry a saved interrupt state.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a critical section must be left with the token it returned"]
pub struct CriticalToken(u32);

impl CriticalToken {
    /// Rebuilds a token from the raw value a C-style caller kept around.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw token value.
    pub const fn raw(&self) -> u32 {
        self.0
    }
}

/// The nesting counter of interrupt-masking critical sections.
///
/// Starts at zero and lives as long as the adapter context that owns it. Interrupts are masked while the counter is
/// non-zero. Callers must strictly nest `enter`/`leave` pairs.
#[derive(Debug, Default)]
pub struct CriticalSection {
    nesting: AtomicU32,
}

impl CriticalSection {
    /// Creates a counter with no holders.
    pub const fn new() -> Self {
        Self {
            nesting: AtomicU32::new(0),
        }
    }

    /// Returns the current nesting depth.
    pub fn nesting(&self) -> u32 {
        self.nesting.load(Ordering::Acquire)
    }

    /// Enters a critical section, masking interrupts if no section is held yet.
    pub fn enter<P: Platform>(&self, platform: &P) -> CriticalToken {
        if self.nesting.load(Ordering::Acquire) == 0 {
            platform.disable_interrupts();
        }
        self.nesting.fetch_add(1, Ordering::AcqRel);
        CriticalToken(1)
    }

    /// Leaves a critical section, unmasking interrupts when the last holder leaves.
    ///
    /// Leaving without a matching `enter` leaves the interrupt state unknowable: the misuse is reported on the
    /// platform log target and the platform is halted.
    #[track_caller]
    pub fn leave<P: Platform>(&self, platform: &P, token: CriticalToken) {
        let CriticalToken(_) = token;

        if self.nesting.load(Ordering::Acquire) == 0 {
            P::Log::println(format_args!(
                "leave_critical-{}: shouldn't happen.",
                Location::caller().line()
            ));
            platform.halt();
        }

        if self.nesting.fetch_sub(1, Ordering::AcqRel) == 1 {
            platform.enable_interrupts();
        }
    }

    /// Runs `f` inside a critical section.
    pub fn with<P: Platform, R>(&self, platform: &P, f: impl FnOnce() -> R) -> R {
        let token = self.enter(platform);
        let result = f();
        self.leave(platform, token);
        result
    }
}
