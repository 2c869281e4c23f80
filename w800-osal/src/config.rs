//! Adapter configuration.

use w800_osal_api::{Priority, Ticks};

/// Number of well-known priority slots.
pub const WELL_KNOWN_SLOTS: usize = 3;

/// Where kernel objects get their memory from.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ObjectAllocation {
    /// The kernel allocates semaphores, queues and timers itself.
    #[default]
    Kernel,
    /// The adapter allocates control blocks and message storage from its [`MemoryAllocator`] and the kernel
    /// constructs objects inside them.
    ///
    /// [`MemoryAllocator`]: w800_osal_api::MemoryAllocator
    Adapter,
}

/// Configuration of an [`Osal`](crate::Osal) instance.
///
/// The default matches the W800 SDK build with Bluetooth enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OsalConfig {
    /// Where kernel objects get their memory from.
    pub object_allocation: ObjectAllocation,
    /// Priorities whose tasks can be deleted by priority. Must be distinct.
    pub well_known_priorities: [Priority; WELL_KNOWN_SLOTS],
    /// Round-robin time slice given to every task.
    pub task_time_slice: Ticks,
    /// Timer name used when the caller gives none.
    #[cfg_attr(feature = "serde", serde(skip, default = "default_timer_name"))]
    pub default_timer_name: &'static str,
}

fn default_timer_name() -> &'static str {
    "wmtimer"
}

impl Default for OsalConfig {
    fn default() -> Self {
        Self {
            object_allocation: ObjectAllocation::Kernel,
            well_known_priorities: [2, 8, 9],
            task_time_slice: 50,
            default_timer_name: default_timer_name(),
        }
    }
}

/// Errors detected when building an [`Osal`](crate::Osal) from an [`OsalConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A well-known priority is listed more than once.
    #[error("well-known priority {0} is listed more than once")]
    DuplicatePriority(Priority),
}
