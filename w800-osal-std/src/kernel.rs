//! The [`Kernel`] implementation for `std` hosts.

use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;

use w800_osal_api::{
    Block, Kernel, KernelError, KernelResult, Message, ObjectKind, OsType, TaskParams, Ticks,
    TimerCallback, Wait,
};

use crate::clock::Clock;
use crate::sync::{StdQueue, StdSemaphore};
use crate::task::StdTask;
use crate::timer::{StdTimer, TimerService};

/// Tick rate of the W800 SDK configuration.
const DEFAULT_TICK_RATE_HZ: NonZeroU32 = NonZeroU32::new(1000).unwrap();

/// Configuration of a [`StdKernel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StdKernelConfig {
    /// Kernel ticks per second of host time.
    pub tick_rate_hz: NonZeroU32,
}

impl Default for StdKernelConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: DEFAULT_TICK_RATE_HZ,
        }
    }
}

/// Runs the adapter on a development host.
///
/// Tasks are named threads, semaphores and queues are condition variables, and timers fire on a dedicated
/// timer-service thread started with the first timer. This is a mapping onto the host, not a scheduler: priorities
/// and time slices are recorded but not enforced.
///
/// Objects created inside a caller-provided control block validate its size and stamp their id into its first
/// bytes; their state lives on the host heap either way.
pub struct StdKernel {
    clock: Clock,
    next_id: AtomicU32,
    timers: Arc<TimerService>,
}

impl StdKernel {
    /// Creates a kernel whose tick counter starts at `0` now.
    pub fn new(config: StdKernelConfig) -> Self {
        let clock = Clock::start(config.tick_rate_hz);
        Self {
            clock,
            next_id: AtomicU32::new(1),
            timers: TimerService::new(clock),
        }
    }

    fn next_id(&self) -> u32 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Checks `control` against the control block size of `kind` and records `id` in it.
    fn stamp(&self, control: &mut Block, kind: ObjectKind, id: u32) -> KernelResult<()> {
        if control.len() < self.control_block_size(kind) {
            tracing::debug!(?kind, size = control.len(), "control block too small");
            return Err(KernelError::InvalidArgument);
        }
        control.as_mut_slice()[..size_of::<u32>()].copy_from_slice(&id.to_le_bytes());
        Ok(())
    }
}

impl Default for StdKernel {
    fn default() -> Self {
        Self::new(StdKernelConfig::default())
    }
}

impl Drop for StdKernel {
    fn drop(&mut self) {
        self.timers.shutdown();
    }
}

impl fmt::Debug for StdKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdKernel")
            .field("clock", &self.clock)
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl Kernel for StdKernel {
    type Task = StdTask;
    type Semaphore = StdSemaphore;
    type Queue = StdQueue;
    type Timer = StdTimer;

    fn os_type(&self) -> OsType {
        OsType::Rhino
    }

    fn control_block_size(&self, kind: ObjectKind) -> usize {
        match kind {
            ObjectKind::Task => 128,
            ObjectKind::Semaphore => 48,
            ObjectKind::Queue => 96,
            ObjectKind::Timer => 64,
        }
    }

    fn task_create(&self, control: &mut Block, params: TaskParams<'_>) -> KernelResult<StdTask> {
        let id = self.next_id();
        self.stamp(control, ObjectKind::Task, id)?;
        let task = StdTask::spawn(id, params)?;
        tracing::trace!(id, name = task.name(), priority = task.priority(), "task spawned");
        Ok(task)
    }

    fn task_delete(&self, task: &StdTask) -> KernelResult<()> {
        task.delete()
    }

    fn semaphore_create(&self, name: &str, count: u32) -> KernelResult<StdSemaphore> {
        Ok(StdSemaphore::new(self.next_id(), name, count))
    }

    fn semaphore_init(
        &self,
        control: &mut Block,
        name: &str,
        count: u32,
    ) -> KernelResult<StdSemaphore> {
        let id = self.next_id();
        self.stamp(control, ObjectKind::Semaphore, id)?;
        Ok(StdSemaphore::new(id, name, count))
    }

    fn semaphore_delete(&self, semaphore: &StdSemaphore) -> KernelResult<()> {
        semaphore.delete()
    }

    fn semaphore_take(&self, semaphore: &StdSemaphore, wait: Wait) -> KernelResult<()> {
        semaphore.take(&self.clock, wait)
    }

    fn semaphore_give(&self, semaphore: &StdSemaphore) -> KernelResult<()> {
        semaphore.give()
    }

    fn queue_create(&self, name: &str, capacity: usize) -> KernelResult<StdQueue> {
        StdQueue::new(self.next_id(), name, capacity)
    }

    fn queue_init(
        &self,
        control: &mut Block,
        storage: &mut Block,
        name: &str,
        capacity: usize,
    ) -> KernelResult<StdQueue> {
        if storage.len() < capacity.saturating_mul(size_of::<usize>()) {
            tracing::debug!(capacity, size = storage.len(), "message storage too small");
            return Err(KernelError::InvalidArgument);
        }
        let id = self.next_id();
        self.stamp(control, ObjectKind::Queue, id)?;
        StdQueue::new(id, name, capacity)
    }

    fn queue_delete(&self, queue: &StdQueue) -> KernelResult<()> {
        queue.delete()
    }

    fn queue_send_back(&self, queue: &StdQueue, message: Message) -> KernelResult<()> {
        queue.send_back(message)
    }

    fn queue_receive(&self, queue: &StdQueue, wait: Wait) -> KernelResult<Message> {
        queue.receive(&self.clock, wait)
    }

    fn queue_flush(&self, queue: &StdQueue) -> KernelResult<()> {
        queue.flush()
    }

    fn timer_create(
        &self,
        name: &str,
        callback: TimerCallback,
        first: Ticks,
        round: Ticks,
    ) -> KernelResult<StdTimer> {
        self.timers
            .create(self.next_id(), name, callback, first, round)
    }

    fn timer_init(
        &self,
        control: &mut Block,
        name: &str,
        callback: TimerCallback,
        first: Ticks,
        round: Ticks,
    ) -> KernelResult<StdTimer> {
        let id = self.next_id();
        self.stamp(control, ObjectKind::Timer, id)?;
        self.timers.create(id, name, callback, first, round)
    }

    fn timer_start(&self, timer: &StdTimer) -> KernelResult<()> {
        self.timers.start(timer)
    }

    fn timer_stop(&self, timer: &StdTimer) -> KernelResult<()> {
        self.timers.stop(timer)
    }

    fn timer_change(&self, timer: &StdTimer, first: Ticks, round: Ticks) -> KernelResult<()> {
        self.timers.change(timer, first, round)
    }

    fn timer_round(&self, timer: &StdTimer) -> Ticks {
        self.timers.round(timer)
    }

    fn timer_delete(&self, timer: &StdTimer) -> KernelResult<()> {
        self.timers.delete(timer)
    }

    fn tick_count(&self) -> Ticks {
        self.clock.now()
    }

    fn sleep(&self, ticks: Ticks) -> KernelResult<()> {
        thread::sleep(self.clock.duration(ticks));
        Ok(())
    }
}
