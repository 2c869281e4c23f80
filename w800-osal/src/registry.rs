//! Registry of tasks created at well-known priorities.
//!
//! Some firmware components (the Bluetooth host and controller tasks) need to be torn down by priority rather than
//! by handle. The registry remembers the last task created at each of a fixed set of priorities, independently of
//! any kernel: it is generic over the handle it stores.

use w800_osal_api::Priority;

use crate::config::ConfigError;

/// One priority slot.
#[derive(Debug, Clone)]
struct Slot<H> {
    priority: Priority,
    handle: Option<H>,
}

/// A size-bounded map from well-known priorities to task handles.
#[derive(Debug, Clone)]
pub struct PriorityRegistry<H, const N: usize> {
    slots: [Slot<H>; N],
}

impl<H, const N: usize> PriorityRegistry<H, N> {
    /// Creates an empty registry for the given priorities.
    pub fn new(priorities: [Priority; N]) -> Result<Self, ConfigError> {
        for (index, priority) in priorities.iter().enumerate() {
            if priorities[..index].contains(priority) {
                return Err(ConfigError::DuplicatePriority(*priority));
            }
        }

        Ok(Self {
            slots: priorities.map(|priority| Slot {
                priority,
                handle: None,
            }),
        })
    }

    /// Returns `true` if `priority` has a slot.
    pub fn is_well_known(&self, priority: Priority) -> bool {
        self.slot(priority).is_some()
    }

    /// Records `handle` as the task at `priority`, returning the handle it replaces.
    ///
    /// Priorities without a slot are ignored and the handle is handed back as `Err`.
    pub fn record(&mut self, priority: Priority, handle: H) -> Result<Option<H>, H> {
        match self.slot_mut(priority) {
            Some(slot) => Ok(slot.handle.replace(handle)),
            None => Err(handle),
        }
    }

    /// Returns the task recorded at `priority`.
    pub fn lookup(&self, priority: Priority) -> Option<&H> {
        self.slot(priority)?.handle.as_ref()
    }

    /// Empties the slot of `priority`, returning what it held.
    pub fn clear(&mut self, priority: Priority) -> Option<H> {
        self.slot_mut(priority)?.handle.take()
    }

    /// Iterates over the occupied slots.
    pub fn iter(&self) -> impl Iterator<Item = (Priority, &H)> {
        self.slots
            .iter()
            .filter_map(|slot| slot.handle.as_ref().map(|handle| (slot.priority, handle)))
    }

    /// Returns the priorities that have a slot, occupied or not.
    pub fn priorities(&self) -> impl Iterator<Item = Priority> + '_ {
        self.slots.iter().map(|slot| slot.priority)
    }

    fn slot(&self, priority: Priority) -> Option<&Slot<H>> {
        self.slots.iter().find(|slot| slot.priority == priority)
    }

    fn slot_mut(&mut self, priority: Priority) -> Option<&mut Slot<H>> {
        self.slots.iter_mut().find(|slot| slot.priority == priority)
    }
}
