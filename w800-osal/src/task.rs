//! Task creation, deletion by priority, and the suspend/resume stubs.

use alloc::boxed::Box;
use alloc::string::{String, ToString};
use core::fmt;

use w800_osal_api::{Kernel, ObjectKind, Platform, Priority, TaskParams};

use crate::error::{Error, IntoOsalError, Result};
use crate::memory::Allocation;
use crate::{Osal, Unbacked};

/// Size of one kernel stack word in bytes.
const STACK_WORD_SIZE: u32 = 4;

/// Returns the name a task gets when its creator does not give one.
///
/// # Examples
///
/// ```
/// use w800_osal::task::default_task_name;
///
/// assert_eq!(default_task_name(7), "rx");
/// assert_eq!(default_task_name(3), "task");
/// ```
pub const fn default_task_name(priority: Priority) -> &'static str {
    match priority {
        4 => "mlme",
        5 => "scan",
        7 => "rx",
        9 => "litepoint",
        10 => "bss",
        13 => "supplicant",
        14 => "supplicant timer",
        28 => "plcp",
        _ => "task",
    }
}

/// How a task should be created.
///
/// ```
/// use w800_osal::TaskSpec;
///
/// let spec = TaskSpec::new(8, 2048).name("bt host");
/// assert_eq!(spec.stack_words(), 512);
/// ```
#[derive(Debug)]
pub struct TaskSpec<'a> {
    name: Option<&'a str>,
    stack: Option<&'static mut [u8]>,
    stack_size: u32,
    priority: Priority,
    flags: u32,
}

impl<'a> TaskSpec<'a> {
    /// A task at `priority` with a kernel-allocated stack of `stack_size` bytes.
    pub fn new(priority: Priority, stack_size: u32) -> Self {
        Self {
            name: None,
            stack: None,
            stack_size,
            priority,
            flags: 0,
        }
    }

    /// Names the task instead of using [`default_task_name`].
    pub fn name(mut self, name: &'a str) -> Self {
        self.name = Some(name);
        self
    }

    /// Runs the task on caller-provided stack memory.
    pub fn stack(mut self, stack: &'static mut [u8]) -> Self {
        self.stack = Some(stack);
        self
    }

    /// Sets creation flags. Accepted for compatibility, the current binding ignores them.
    pub fn flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    /// Returns the stack size in kernel stack words.
    pub fn stack_words(&self) -> usize {
        (self.stack_size / STACK_WORD_SIZE) as usize
    }
}

/// Handle of a task created through the adapter.
///
/// Dropping the handle does not affect the task or its control block.
pub struct Task<K: Kernel> {
    raw: K::Task,
    name: String,
    priority: Priority,
}

impl<K: Kernel> Task<K> {
    /// Returns the kernel handle.
    pub fn raw(&self) -> &K::Task {
        &self.raw
    }

    /// Returns the name the task was created with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the priority the task was created at.
    pub fn priority(&self) -> Priority {
        self.priority
    }
}

impl<K: Kernel> Clone for Task<K> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            name: self.name.clone(),
            priority: self.priority,
        }
    }
}

impl<K: Kernel> fmt::Debug for Task<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("raw", &self.raw)
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// A task recorded at a well-known priority together with its control block.
///
/// The block is returned to the allocator when the entry is dropped, which only happens once the kernel deleted the
/// task.
pub(crate) struct Recorded<K: Kernel> {
    task: Task<K>,
    control: Allocation,
}

impl<K: Kernel> fmt::Debug for Recorded<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recorded")
            .field("task", &self.task)
            .field("control", &self.control)
            .finish()
    }
}

impl<K, P> Osal<K, P>
where
    K: Kernel,
    P: Platform,
{
    /// Creates and starts a task running `entry(argument)`.
    ///
    /// The task control block comes from the platform allocator and is released again if the kernel refuses the
    /// task. Once the task exists the block belongs to it: tasks created at a well-known priority are remembered
    /// for [`Self::task_delete_by_priority`], which releases the block, and all other blocks stay allocated.
    pub fn task_create<A, F>(&self, spec: TaskSpec<'_>, entry: F, argument: A) -> Result<Task<K>>
    where
        A: Send + 'static,
        F: FnOnce(A) + Send + 'static,
    {
        let TaskSpec {
            name,
            stack,
            stack_size,
            priority,
            flags: _,
        } = spec;

        let mut control = Allocation::new(
            &self.allocator,
            self.kernel.control_block_size(ObjectKind::Task),
        )
        .ok_or(Error)?;

        let name = name.unwrap_or(default_task_name(priority));
        let params = TaskParams {
            name,
            priority,
            time_slice: self.config.task_time_slice,
            stack,
            stack_words: (stack_size / STACK_WORD_SIZE) as usize,
            autorun: true,
            entry: Box::new(move || entry(argument)),
        };

        // On failure `control` is dropped here, returning the block.
        let raw = self
            .kernel
            .task_create(control.block_mut(), params)
            .into_osal_error("task_create")?;

        let task = Task {
            raw,
            name: name.to_string(),
            priority,
        };

        let recorded = Recorded {
            task: task.clone(),
            control,
        };
        self.with_registry(|registry| match registry.record(priority, recorded) {
            Ok(None) => {}
            Ok(Some(previous)) => {
                // The replaced task keeps running in its block.
                tracing::debug!(
                    priority,
                    previous = ?previous.task,
                    "well-known priority slot overwritten"
                );
                previous.control.leak();
            }
            Err(unrecorded) => unrecorded.control.leak(),
        });

        tracing::trace!(name, priority, "task created");
        Ok(task)
    }

    /// Deletes the task recorded at a well-known priority and runs `cleanup` after it is gone.
    ///
    /// Fails for priorities without a slot, for empty slots, and when the kernel refuses. The slot is only cleared
    /// after the kernel deleted the task.
    pub fn task_delete_by_priority(
        &self,
        priority: Priority,
        cleanup: Option<fn()>,
    ) -> Result<()> {
        let Some(task) = self.task_at_priority(priority) else {
            tracing::debug!(priority, "no task recorded at priority");
            return Err(Error);
        };

        self.kernel
            .task_delete(&task.raw)
            .into_osal_error("task_delete")?;

        // Dropping the entry returns the control block.
        drop(self.with_registry(|registry| registry.clear(priority)));

        if let Some(cleanup) = cleanup {
            cleanup();
        }

        Ok(())
    }

    /// Always succeeds; the current binding does not suspend tasks.
    pub fn task_suspend(&self, _task: &Task<K>) -> Result<Unbacked> {
        Ok(self.note_unbacked("task_suspend"))
    }

    /// Always succeeds; the current binding does not resume tasks.
    pub fn task_resume(&self, _task: &Task<K>) -> Result<Unbacked> {
        Ok(self.note_unbacked("task_resume"))
    }

    /// Returns the task recorded at a well-known priority, if any.
    pub fn task_at_priority(&self, priority: Priority) -> Option<Task<K>> {
        self.with_registry(|registry| {
            registry
                .lookup(priority)
                .map(|recorded| recorded.task.clone())
        })
    }

    /// Logs the occupied well-known priority slots.
    pub fn display_task_stats(&self) {
        self.with_registry(|registry| {
            for (priority, recorded) in registry.iter() {
                tracing::info!(priority, name = recorded.task.name(), "well-known task");
            }
        });
    }
}
