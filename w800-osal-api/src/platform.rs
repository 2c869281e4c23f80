//! Abstractions for the interrupt controller and fatal lockup of the target.

use crate::log::LogTarget;

/// `Platform` groups the few CPU-level primitives the adapter needs besides the kernel.
pub trait Platform: Send + Sync {
    /// The print sink used for fatal diagnostics.
    type Log: LogTarget;

    /// Globally masks interrupts.
    fn disable_interrupts(&self);

    /// Globally unmasks interrupts.
    fn enable_interrupts(&self);

    /// Stops the current execution context for good.
    ///
    /// Called after a diagnostic has been printed for a misuse that leaves the system in an unsafe state. Target
    /// implementations trap or spin; test doubles may panic instead.
    fn halt(&self) -> !;
}
