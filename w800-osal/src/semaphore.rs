//! Counting semaphores.

use w800_osal_api::{Kernel, ObjectKind, Platform, Ticks, Wait};

use crate::config::ObjectAllocation;
use crate::error::{Error, IntoOsalError, Result};
use crate::memory::Allocation;
use crate::Osal;

/// Kernel name given to every semaphore.
const SEMAPHORE_NAME: &str = "wmsem";

/// Handle of a counting semaphore.
#[derive(Debug)]
pub struct Semaphore<K: Kernel> {
    raw: K::Semaphore,
    control: Option<Allocation>,
}

impl<K: Kernel> Semaphore<K> {
    /// Returns the kernel handle.
    pub fn raw(&self) -> &K::Semaphore {
        &self.raw
    }
}

impl<K, P> Osal<K, P>
where
    K: Kernel,
    P: Platform,
{
    /// Creates a semaphore holding `count` initial counts.
    pub fn sem_create(&self, count: u32) -> Result<Semaphore<K>> {
        match self.config.object_allocation {
            ObjectAllocation::Kernel => {
                let raw = self
                    .kernel
                    .semaphore_create(SEMAPHORE_NAME, count)
                    .into_osal_error("semaphore_create")?;
                Ok(Semaphore { raw, control: None })
            }
            ObjectAllocation::Adapter => {
                let mut control = Allocation::new(
                    &self.allocator,
                    self.kernel.control_block_size(ObjectKind::Semaphore),
                )
                .ok_or(Error)?;
                let raw = self
                    .kernel
                    .semaphore_init(control.block_mut(), SEMAPHORE_NAME, count)
                    .into_osal_error("semaphore_init")?;
                Ok(Semaphore {
                    raw,
                    control: Some(control),
                })
            }
        }
    }

    /// Deletes a semaphore and releases its storage. Deleting `None` succeeds without doing anything.
    pub fn sem_delete(&self, semaphore: Option<Semaphore<K>>) -> Result<()> {
        let Some(Semaphore { raw, control }) = semaphore else {
            return Ok(());
        };

        match self.kernel.semaphore_delete(&raw) {
            Ok(()) => Ok(()),
            Err(error) => {
                // The kernel object may still live in the control block.
                if let Some(control) = control {
                    control.leak();
                }
                Err::<(), _>(error).into_osal_error("semaphore_delete")
            }
        }
    }

    /// Takes one count. A `wait` of `0` blocks until a count is available, anything else is a tick timeout.
    ///
    /// Must not be called from interrupt context.
    pub fn sem_acquire(&self, semaphore: &Semaphore<K>, wait: Ticks) -> Result<()> {
        self.kernel
            .semaphore_take(&semaphore.raw, Wait::from_raw(wait))
            .into_osal_error("semaphore_take")
    }

    /// Gives one count. Safe from any context.
    pub fn sem_release(&self, semaphore: &Semaphore<K>) -> Result<()> {
        self.kernel
            .semaphore_give(&semaphore.raw)
            .into_osal_error("semaphore_give")
    }
}
