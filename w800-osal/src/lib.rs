//! W800 operating system abstraction layer.
//!
//! [`Osal`] re-exposes the small task, synchronization and timer API the W800 firmware is written against, and
//! forwards every call to a real-time kernel implementing [`w800_osal_api::Kernel`]. Kernel result codes are
//! collapsed into a single [`Error`]; [`Status`] is the two-valued projection for C-style callers.
//!
//! # Example
//!
//! ```rust
//! use w800_osal::w800_osal_api::Message;
//! use w800_osal::{Osal, OsalConfig};
//! use w800_osal_std::{HeapAllocator, StdKernel, StdPlatform};
//!
//! let osal = Osal::new(
//!     StdKernel::default(),
//!     StdPlatform::default(),
//!     HeapAllocator::shared(),
//!     OsalConfig::default(),
//! )
//! .unwrap();
//!
//! let queue = osal.queue_create(4).unwrap();
//! osal.queue_send(&queue, Message::new(0x2000_0000), 0).unwrap();
//! assert_eq!(osal.queue_receive(&queue, 0, 1).unwrap().into_raw(), 0x2000_0000);
//! osal.queue_delete(Some(queue)).unwrap();
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(not(test), no_std)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

use alloc::sync::Arc;
use core::cell::RefCell;
use core::fmt;
use core::sync::atomic::AtomicBool;

use w800_osal_api::{Kernel, MemoryAllocator, OsType, Platform};

pub mod config;
pub mod critical;
pub mod mailbox;
pub mod queue;
pub mod registry;
pub mod semaphore;
pub mod task;
pub mod time;
pub mod timer;

mod error;
mod memory;
mod mutex;

pub use config::{ConfigError, ObjectAllocation, OsalConfig};
pub use critical::{CriticalSection, CriticalToken};
pub use error::{Error, Result, Status};
pub use mailbox::Mailbox;
pub use mutex::Mutex;
pub use queue::Queue;
pub use registry::PriorityRegistry;
pub use semaphore::Semaphore;
pub use task::{Task, TaskSpec};
pub use timer::Timer;
pub use w800_osal_api;

use crate::config::WELL_KNOWN_SLOTS;
use crate::task::Recorded;

/// Marker for operations that report success without any kernel work behind them.
///
/// The current kernel binding provides no mutexes, mailboxes or task suspension. Callers that rely on those for
/// mutual exclusion or flow control get none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "the operation was not performed by the kernel"]
pub struct Unbacked;

/// The adapter context.
///
/// Owns the kernel binding, the platform primitives, the allocator for adapter-owned storage, the critical-section
/// counter and the well-known priority registry. One instance is meant to live for the whole process.
pub struct Osal<K, P>
where
    K: Kernel,
    P: Platform,
{
    kernel: K,
    platform: P,
    allocator: Arc<dyn MemoryAllocator>,
    config: OsalConfig,
    critical: CriticalSection,
    registry: critical_section::Mutex<RefCell<PriorityRegistry<Recorded<K>, WELL_KNOWN_SLOTS>>>,
    unbacked_warned: AtomicBool,
}

impl<K, P> Osal<K, P>
where
    K: Kernel,
    P: Platform,
{
    /// Creates an adapter context with an empty registry and no critical section held.
    pub fn new(
        kernel: K,
        platform: P,
        allocator: Arc<dyn MemoryAllocator>,
        config: OsalConfig,
    ) -> core::result::Result<Self, ConfigError> {
        let registry = PriorityRegistry::new(config.well_known_priorities)?;

        Ok(Self {
            kernel,
            platform,
            allocator,
            config,
            critical: CriticalSection::new(),
            registry: critical_section::Mutex::new(RefCell::new(registry)),
            unbacked_warned: AtomicBool::new(false),
        })
    }

    /// Returns the kernel binding.
    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Returns the platform primitives.
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &OsalConfig {
        &self.config
    }

    /// Reports which kernel family the adapter drives.
    pub fn os_type(&self) -> OsType {
        self.kernel.os_type()
    }

    /// Kept for API compatibility; the kernel is initialized by the board support code.
    pub fn init(&self) {}

    /// Kept for API compatibility; the kernel scheduler is started by the board support code.
    pub fn start_scheduler(&self) {}

    /// Kept for API compatibility; the kernel drives its own tick.
    pub fn time_tick(&self) {}

    /// Enters a critical section. See [`CriticalSection::enter`].
    pub fn enter_critical(&self) -> CriticalToken {
        self.critical.enter(&self.platform)
    }

    /// Leaves a critical section. See [`CriticalSection::leave`].
    #[track_caller]
    pub fn leave_critical(&self, token: CriticalToken) {
        self.critical.leave(&self.platform, token);
    }

    /// Runs `f` inside a critical section.
    pub fn critical<R>(&self, f: impl FnOnce() -> R) -> R {
        self.critical.with(&self.platform, f)
    }

    /// Returns the critical-section nesting depth.
    pub fn critical_nesting(&self) -> u32 {
        self.critical.nesting()
    }

    /// Runs `f` with exclusive access to the priority registry.
    fn with_registry<R>(
        &self,
        f: impl FnOnce(&mut PriorityRegistry<Recorded<K>, WELL_KNOWN_SLOTS>) -> R,
    ) -> R {
        critical_section::with(|cs| f(&mut self.registry.borrow_ref_mut(cs)))
    }

    /// Logs the first use of an operation without kernel backing.
    fn note_unbacked(&self, operation: &'static str) -> Unbacked {
        if !self
            .unbacked_warned
            .swap(true, core::sync::atomic::Ordering::Relaxed)
        {
            tracing::warn!(
                operation,
                "operation reports success without kernel backing"
            );
        }
        Unbacked
    }
}

impl<K, P> fmt::Debug for Osal<K, P>
where
    K: Kernel + fmt::Debug,
    P: Platform + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Osal")
            .field("kernel", &self.kernel)
            .field("platform", &self.platform)
            .field("config", &self.config)
            .field("critical", &self.critical)
            .finish_non_exhaustive()
    }
}
