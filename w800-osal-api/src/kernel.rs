//! The kernel primitives the adapter forwards to.
//!
//! The trait follows the shape of a classic C real-time kernel API: every object can either be created by the kernel
//! from its own heap (`*_create`), or be constructed inside a control block provided by the caller (`*_init`). Which
//! one the adapter uses is a configuration decision, kernels should support both.

use alloc::boxed::Box;
use core::fmt;

use crate::error::KernelResult;
use crate::memory::Block;
use crate::tick::{Message, Ticks, Wait};

/// Task priority as understood by the kernel. Lower values are more urgent.
pub type Priority = u8;

/// The code a new task starts executing.
pub type TaskEntry = Box<dyn FnOnce() + Send + 'static>;

/// The code a timer runs on each expiry.
///
/// Kernels invoke it from their timer context, which is usually not the task that created the timer.
pub type TimerCallback = Box<dyn Fn() + Send + Sync + 'static>;

/// The family of the kernel behind a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OsType {
    /// uC/OS-II.
    UcosII,
    /// FreeRTOS.
    FreeRtos,
    /// AliOS Things Rhino.
    Rhino,
}

/// Kinds of objects a caller-provided control block can be sized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// A task control block.
    Task,
    /// A counting semaphore.
    Semaphore,
    /// A message queue, excluding its message storage.
    Queue,
    /// A software timer.
    Timer,
}

/// Everything the kernel needs to start a task.
pub struct TaskParams<'a> {
    /// Name shown by kernel diagnostics.
    pub name: &'a str,
    /// Scheduling priority.
    pub priority: Priority,
    /// Round-robin time slice among equal priorities.
    pub time_slice: Ticks,
    /// Caller-provided stack memory, if any.
    pub stack: Option<&'static mut [u8]>,
    /// Stack size in kernel stack words.
    pub stack_words: usize,
    /// Whether the task is made ready immediately.
    pub autorun: bool,
    /// The task body.
    pub entry: TaskEntry,
}

impl fmt::Debug for TaskParams<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskParams")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("time_slice", &self.time_slice)
            .field("stack", &self.stack.as_ref().map(|stack| stack.len()))
            .field("stack_words", &self.stack_words)
            .field("autorun", &self.autorun)
            .finish_non_exhaustive()
    }
}

/// `Kernel` is the downstream contract of the adapter.
///
/// All methods take `&self`; bindings synchronize internally. Blocking methods (`semaphore_take`, `queue_receive`,
/// `sleep`) must not be called from interrupt context.
pub trait Kernel: Send + Sync {
    /// Handle of a kernel task.
    type Task: Clone + fmt::Debug + Send + Sync;
    /// Handle of a counting semaphore.
    type Semaphore: fmt::Debug + Send + Sync;
    /// Handle of a message queue.
    type Queue: fmt::Debug + Send + Sync;
    /// Handle of a software timer.
    type Timer: fmt::Debug + Send + Sync;

    /// Reports which kernel family this binding drives.
    fn os_type(&self) -> OsType;

    /// Minimum size of a caller-provided control block for `kind`.
    fn control_block_size(&self, kind: ObjectKind) -> usize;

    /// Creates a task whose control block lives in `control`.
    fn task_create(&self, control: &mut Block, params: TaskParams<'_>) -> KernelResult<Self::Task>;

    /// Deletes a task.
    fn task_delete(&self, task: &Self::Task) -> KernelResult<()>;

    /// Creates a semaphore from kernel memory.
    fn semaphore_create(&self, name: &str, count: u32) -> KernelResult<Self::Semaphore>;

    /// Creates a semaphore inside `control`.
    fn semaphore_init(
        &self,
        control: &mut Block,
        name: &str,
        count: u32,
    ) -> KernelResult<Self::Semaphore>;

    /// Deletes a semaphore, waking every waiter.
    fn semaphore_delete(&self, semaphore: &Self::Semaphore) -> KernelResult<()>;

    /// Takes one count, blocking according to `wait`.
    fn semaphore_take(&self, semaphore: &Self::Semaphore, wait: Wait) -> KernelResult<()>;

    /// Gives one count. Safe from any context.
    fn semaphore_give(&self, semaphore: &Self::Semaphore) -> KernelResult<()>;

    /// Creates a queue of `capacity` message slots from kernel memory.
    fn queue_create(&self, name: &str, capacity: usize) -> KernelResult<Self::Queue>;

    /// Creates a queue inside `control`, storing messages in `storage`.
    fn queue_init(
        &self,
        control: &mut Block,
        storage: &mut Block,
        name: &str,
        capacity: usize,
    ) -> KernelResult<Self::Queue>;

    /// Deletes a queue, waking every waiter.
    fn queue_delete(&self, queue: &Self::Queue) -> KernelResult<()>;

    /// Appends a message at the tail of the queue.
    fn queue_send_back(&self, queue: &Self::Queue, message: Message) -> KernelResult<()>;

    /// Removes the message at the head of the queue, blocking according to `wait`.
    fn queue_receive(&self, queue: &Self::Queue, wait: Wait) -> KernelResult<Message>;

    /// Drops every queued message.
    fn queue_flush(&self, queue: &Self::Queue) -> KernelResult<()>;

    /// Creates a stopped timer from kernel memory.
    ///
    /// `first` is the delay of the first expiry, `round` the period of later expiries or `0` for a one-shot timer.
    fn timer_create(
        &self,
        name: &str,
        callback: TimerCallback,
        first: Ticks,
        round: Ticks,
    ) -> KernelResult<Self::Timer>;

    /// Creates a stopped timer inside `control`.
    fn timer_init(
        &self,
        control: &mut Block,
        name: &str,
        callback: TimerCallback,
        first: Ticks,
        round: Ticks,
    ) -> KernelResult<Self::Timer>;

    /// Arms the timer for its first expiry.
    fn timer_start(&self, timer: &Self::Timer) -> KernelResult<()>;

    /// Disarms the timer without deleting it.
    fn timer_stop(&self, timer: &Self::Timer) -> KernelResult<()>;

    /// Reconfigures a stopped timer.
    fn timer_change(&self, timer: &Self::Timer, first: Ticks, round: Ticks) -> KernelResult<()>;

    /// Returns the configured recurrence period, `0` for one-shot timers.
    fn timer_round(&self, timer: &Self::Timer) -> Ticks;

    /// Deletes a timer.
    fn timer_delete(&self, timer: &Self::Timer) -> KernelResult<()>;

    /// Returns the monotonic tick counter.
    fn tick_count(&self) -> Ticks;

    /// Blocks the calling task for `ticks` ticks.
    fn sleep(&self, ticks: Ticks) -> KernelResult<()>;
}
