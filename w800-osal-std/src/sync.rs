//! Semaphores and message queues built on `Mutex` and `Condvar`.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use w800_osal_api::{KernelError, KernelResult, Message, Wait};

use crate::clock::Clock;

/// Locks `mutex`, ignoring poisoning: every critical region below leaves the state consistent.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Blocks on `condvar` until `poll` produces a result or the wait elapses.
fn block_on<T, R>(
    mutex: &Mutex<T>,
    condvar: &Condvar,
    clock: &Clock,
    wait: Wait,
    mut poll: impl FnMut(&mut T) -> Option<KernelResult<R>>,
) -> KernelResult<R> {
    let deadline: Option<Instant> = match wait {
        Wait::Forever => None,
        Wait::Ticks(ticks) => Some(clock.deadline(ticks.get())),
    };

    let mut guard = lock(mutex);
    loop {
        if let Some(result) = poll(&mut guard) {
            return result;
        }

        guard = match deadline {
            None => condvar.wait(guard).unwrap_or_else(PoisonError::into_inner),
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return Err(KernelError::Timeout);
                }
                condvar
                    .wait_timeout(guard, deadline - now)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0
            }
        };
    }
}

#[derive(Debug)]
struct SemaphoreState {
    count: u32,
    deleted: bool,
}

#[derive(Debug)]
struct SemaphoreControl {
    id: u32,
    name: String,
    state: Mutex<SemaphoreState>,
    available: Condvar,
}

/// Handle of a host semaphore.
#[derive(Debug, Clone)]
pub struct StdSemaphore {
    control: Arc<SemaphoreControl>,
}

impl StdSemaphore {
    pub(crate) fn new(id: u32, name: &str, count: u32) -> Self {
        Self {
            control: Arc::new(SemaphoreControl {
                id,
                name: name.to_owned(),
                state: Mutex::new(SemaphoreState {
                    count,
                    deleted: false,
                }),
                available: Condvar::new(),
            }),
        }
    }

    /// Returns the kernel object id.
    pub fn id(&self) -> u32 {
        self.control.id
    }

    /// Returns the name the semaphore was created with.
    pub fn name(&self) -> &str {
        &self.control.name
    }

    /// Returns the counts currently available.
    pub fn count(&self) -> u32 {
        lock(&self.control.state).count
    }

    pub(crate) fn take(&self, clock: &Clock, wait: Wait) -> KernelResult<()> {
        block_on(
            &self.control.state,
            &self.control.available,
            clock,
            wait,
            |state| {
                if state.deleted {
                    Some(Err(KernelError::Deleted))
                } else if state.count > 0 {
                    state.count -= 1;
                    Some(Ok(()))
                } else {
                    None
                }
            },
        )
    }

    pub(crate) fn give(&self) -> KernelResult<()> {
        let mut state = lock(&self.control.state);
        if state.deleted {
            return Err(KernelError::InvalidHandle);
        }
        state.count = state.count.checked_add(1).ok_or(KernelError::Internal)?;
        self.control.available.notify_one();
        Ok(())
    }

    pub(crate) fn delete(&self) -> KernelResult<()> {
        let mut state = lock(&self.control.state);
        if state.deleted {
            return Err(KernelError::InvalidHandle);
        }
        state.deleted = true;
        self.control.available.notify_all();
        Ok(())
    }
}

#[derive(Debug)]
struct QueueState {
    messages: VecDeque<Message>,
    deleted: bool,
}

#[derive(Debug)]
struct QueueControl {
    id: u32,
    name: String,
    capacity: usize,
    state: Mutex<QueueState>,
    available: Condvar,
}

/// Handle of a host message queue.
#[derive(Debug, Clone)]
pub struct StdQueue {
    control: Arc<QueueControl>,
}

impl StdQueue {
    pub(crate) fn new(id: u32, name: &str, capacity: usize) -> KernelResult<Self> {
        if capacity == 0 {
            return Err(KernelError::InvalidArgument);
        }

        Ok(Self {
            control: Arc::new(QueueControl {
                id,
                name: name.to_owned(),
                capacity,
                state: Mutex::new(QueueState {
                    messages: VecDeque::with_capacity(capacity),
                    deleted: false,
                }),
                available: Condvar::new(),
            }),
        })
    }

    /// Returns the kernel object id.
    pub fn id(&self) -> u32 {
        self.control.id
    }

    /// Returns the name the queue was created with.
    pub fn name(&self) -> &str {
        &self.control.name
    }

    /// Returns the number of message slots.
    pub fn capacity(&self) -> usize {
        self.control.capacity
    }

    /// Returns the number of queued messages.
    pub fn len(&self) -> usize {
        lock(&self.control.state).messages.len()
    }

    /// Returns `true` if no message is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn send_back(&self, message: Message) -> KernelResult<()> {
        let mut state = lock(&self.control.state);
        if state.deleted {
            return Err(KernelError::InvalidHandle);
        }
        if state.messages.len() == self.control.capacity {
            return Err(KernelError::QueueFull);
        }
        state.messages.push_back(message);
        self.control.available.notify_one();
        Ok(())
    }

    pub(crate) fn receive(&self, clock: &Clock, wait: Wait) -> KernelResult<Message> {
        block_on(
            &self.control.state,
            &self.control.available,
            clock,
            wait,
            |state| {
                if state.deleted {
                    Some(Err(KernelError::Deleted))
                } else {
                    state.messages.pop_front().map(Ok)
                }
            },
        )
    }

    pub(crate) fn flush(&self) -> KernelResult<()> {
        let mut state = lock(&self.control.state);
        if state.deleted {
            return Err(KernelError::InvalidHandle);
        }
        state.messages.clear();
        Ok(())
    }

    pub(crate) fn delete(&self) -> KernelResult<()> {
        let mut state = lock(&self.control.state);
        if state.deleted {
            return Err(KernelError::InvalidHandle);
        }
        state.deleted = true;
        state.messages.clear();
        self.control.available.notify_all();
        Ok(())
    }
}
