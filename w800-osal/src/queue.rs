//! Message queues of pointer-sized messages.

use w800_osal_api::{Kernel, Message, ObjectKind, Platform, Ticks, Wait};

use crate::config::ObjectAllocation;
use crate::error::{Error, IntoOsalError, Result};
use crate::memory::Allocation;
use crate::Osal;

/// Kernel name given to every queue.
const QUEUE_NAME: &str = "wmqueue";

/// Memory the adapter owns for a queue in [`ObjectAllocation::Adapter`] mode.
#[derive(Debug)]
struct QueueStorage {
    /// Bookkeeping record tying the other two together, drawn from the same heap as the kernel memory.
    _record: Allocation,
    control: Allocation,
    messages: Allocation,
}

impl QueueStorage {
    fn leak(self) {
        let QueueStorage {
            _record,
            control,
            messages,
        } = self;
        _record.leak();
        control.leak();
        messages.leak();
    }
}

/// Handle of a message queue.
#[derive(Debug)]
pub struct Queue<K: Kernel> {
    raw: K::Queue,
    storage: Option<QueueStorage>,
}

impl<K: Kernel> Queue<K> {
    /// Returns the kernel handle.
    pub fn raw(&self) -> &K::Queue {
        &self.raw
    }
}

impl<K, P> Osal<K, P>
where
    K: Kernel,
    P: Platform,
{
    /// Creates a queue with room for `capacity` messages.
    pub fn queue_create(&self, capacity: usize) -> Result<Queue<K>> {
        match self.config.object_allocation {
            ObjectAllocation::Kernel => {
                let raw = self
                    .kernel
                    .queue_create(QUEUE_NAME, capacity)
                    .into_osal_error("queue_create")?;
                Ok(Queue { raw, storage: None })
            }
            ObjectAllocation::Adapter => {
                // Each step drops the allocations of the previous ones when it fails.
                let record =
                    Allocation::new(&self.allocator, size_of::<QueueStorage>()).ok_or(Error)?;
                let mut control = Allocation::new(
                    &self.allocator,
                    self.kernel.control_block_size(ObjectKind::Queue),
                )
                .ok_or(Error)?;
                let mut messages = Allocation::new(
                    &self.allocator,
                    capacity.saturating_mul(size_of::<usize>()),
                )
                .ok_or(Error)?;

                let raw = self
                    .kernel
                    .queue_init(
                        control.block_mut(),
                        messages.block_mut(),
                        QUEUE_NAME,
                        capacity,
                    )
                    .into_osal_error("queue_init")?;

                Ok(Queue {
                    raw,
                    storage: Some(QueueStorage {
                        _record: record,
                        control,
                        messages,
                    }),
                })
            }
        }
    }

    /// Deletes a queue and releases its storage. Deleting `None` succeeds without doing anything.
    pub fn queue_delete(&self, queue: Option<Queue<K>>) -> Result<()> {
        let Some(Queue { raw, storage }) = queue else {
            return Ok(());
        };

        match self.kernel.queue_delete(&raw) {
            Ok(()) => Ok(()),
            Err(error) => {
                // The kernel object may still live in the adapter storage.
                if let Some(storage) = storage {
                    storage.leak();
                }
                Err::<(), _>(error).into_osal_error("queue_delete")
            }
        }
    }

    /// Appends `message` at the tail of the queue. `size` is accepted for compatibility and ignored.
    pub fn queue_send(&self, queue: &Queue<K>, message: Message, _size: u32) -> Result<()> {
        self.kernel
            .queue_send_back(&queue.raw, message)
            .into_osal_error("queue_send_back")
    }

    /// Removes the message at the head of the queue.
    ///
    /// A `wait` of `0` blocks until a message arrives, anything else is a tick timeout. `size` is accepted for
    /// compatibility and ignored. Must not be called from interrupt context.
    pub fn queue_receive(&self, queue: &Queue<K>, _size: u32, wait: Ticks) -> Result<Message> {
        self.kernel
            .queue_receive(&queue.raw, Wait::from_raw(wait))
            .into_osal_error("queue_receive")
    }

    /// Drops every queued message.
    pub fn queue_flush(&self, queue: &Queue<K>) -> Result<()> {
        self.kernel
            .queue_flush(&queue.raw)
            .into_osal_error("queue_flush")
    }
}
