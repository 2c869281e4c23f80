//! Tasks as named host threads.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use w800_osal_api::{KernelError, KernelResult, Priority, TaskParams};

/// Smallest host stack a task thread gets, whatever the task asked for.
const MIN_THREAD_STACK: usize = 256 * 1024;

/// Size of one kernel stack word in bytes.
const STACK_WORD_SIZE: usize = 4;

#[derive(Debug)]
struct TaskControl {
    id: u32,
    name: String,
    priority: Priority,
    deleted: AtomicBool,
    finished: AtomicBool,
}

/// Handle of a host task.
///
/// Host threads cannot be killed: deleting a task marks it deleted, its thread keeps running until the entry
/// returns.
#[derive(Debug, Clone)]
pub struct StdTask {
    control: Arc<TaskControl>,
}

impl StdTask {
    pub(crate) fn spawn(id: u32, params: TaskParams<'_>) -> KernelResult<Self> {
        let TaskParams {
            name,
            priority,
            time_slice: _,
            stack,
            stack_words,
            autorun,
            entry,
        } = params;

        // There is no resume on the host, a task that does not start right away would never start.
        if !autorun || name.contains('\0') {
            return Err(KernelError::InvalidArgument);
        }

        let stack_bytes = stack_words.saturating_mul(STACK_WORD_SIZE);
        if let Some(stack) = stack
            && stack.len() < stack_bytes
        {
            return Err(KernelError::InvalidArgument);
        }

        let control = Arc::new(TaskControl {
            id,
            name: name.to_owned(),
            priority,
            deleted: AtomicBool::new(false),
            finished: AtomicBool::new(false),
        });

        let running = Arc::clone(&control);
        thread::Builder::new()
            .name(name.to_owned())
            .stack_size(stack_bytes.max(MIN_THREAD_STACK))
            .spawn(move || {
                entry();
                running.finished.store(true, Ordering::Release);
                tracing::trace!(name = %running.name, "task returned");
            })
            .map_err(|error| {
                tracing::debug!(%error, name, "failed to spawn task thread");
                KernelError::NoMemory
            })?;

        Ok(Self { control })
    }

    /// Returns the kernel object id.
    pub fn id(&self) -> u32 {
        self.control.id
    }

    /// Returns the name the task was created with.
    pub fn name(&self) -> &str {
        &self.control.name
    }

    /// Returns the priority the task was created at.
    pub fn priority(&self) -> Priority {
        self.control.priority
    }

    /// Returns `true` once the task was deleted.
    pub fn is_deleted(&self) -> bool {
        self.control.deleted.load(Ordering::Acquire)
    }

    /// Returns `true` once the task entry returned.
    pub fn is_finished(&self) -> bool {
        self.control.finished.load(Ordering::Acquire)
    }

    pub(crate) fn delete(&self) -> KernelResult<()> {
        if self.control.deleted.swap(true, Ordering::AcqRel) {
            return Err(KernelError::InvalidHandle);
        }
        Ok(())
    }
}
