//! The W800 operating system abstraction layer downstream contract.
//!
//! The OSAL adapter in `w800-osal` never talks to a concrete real-time kernel. Instead it forwards every operation
//! through the traits defined here:
//!
//! - [`Kernel`]: task, semaphore, queue and timer primitives plus the tick counter and task sleep.
//! - [`Platform`]: interrupt masking, the deliberate lockup used on fatal misuse, and the diagnostic print sink.
//! - [`MemoryAllocator`]: the allocation service used for adapter-owned control blocks and message storage.
//!
//! Porting the adapter to another kernel means implementing these traits, nothing else.

#![no_std]
#![forbid(unsafe_code)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

#[cfg(test)]
extern crate std;

mod error;
pub mod kernel;
pub mod log;
pub mod memory;
pub mod platform;
pub mod tick;

pub use error::{KernelError, KernelResult};
pub use kernel::{Kernel, ObjectKind, OsType, Priority, TaskEntry, TaskParams, TimerCallback};
pub use memory::{Block, MemoryAllocator};
pub use platform::Platform;
pub use tick::{Message, Ticks, Wait};
