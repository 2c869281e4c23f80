use w800_osal_api::{Kernel, Platform, Priority, Ticks};

use crate::error::Result;
use crate::{Osal, Unbacked};

/// Handle of a mutex.
///
/// The current binding provides no kernel mutex: every operation reports success and nothing is excluded.
#[derive(Debug, PartialEq, Eq)]
pub struct Mutex {
    priority: Priority,
}

impl Mutex {
    /// Returns the ceiling priority the mutex was created with.
    pub fn priority(&self) -> Priority {
        self.priority
    }
}

impl<K, P> Osal<K, P>
where
    K: Kernel,
    P: Platform,
{
    /// Creates a mutex. No kernel object is created.
    pub fn mutex_create(&self, priority: Priority) -> Result<(Mutex, Unbacked)> {
        Ok((Mutex { priority }, self.note_unbacked("mutex_create")))
    }

    /// Deletes a mutex. No kernel work is done.
    pub fn mutex_delete(&self, _mutex: Mutex) -> Result<Unbacked> {
        Ok(self.note_unbacked("mutex_delete"))
    }

    /// Acquires a mutex. Returns immediately; nothing is excluded.
    ///
    /// Must not be called from interrupt context.
    pub fn mutex_acquire(&self, _mutex: &Mutex, _wait: Ticks) -> Result<Unbacked> {
        Ok(self.note_unbacked("mutex_acquire"))
    }

    /// Releases a mutex. No kernel work is done.
    pub fn mutex_release(&self, _mutex: &Mutex) -> Result<Unbacked> {
        Ok(self.note_unbacked("mutex_release"))
    }
}
