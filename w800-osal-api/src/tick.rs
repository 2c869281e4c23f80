//! Tick, wait and message types shared by the adapter and the kernels.

use core::fmt;
use core::num::NonZeroU32;

/// Kernel time unit. The counter wraps at the native width.
pub type Ticks = u32;

/// How long a blocking kernel call may wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wait {
    /// Block until the event occurs.
    Forever,
    /// Block for at most this many ticks.
    Ticks(NonZeroU32),
}

impl Wait {
    /// Translates the upstream wait argument, where `0` means "wait indefinitely".
    ///
    /// # Examples
    ///
    /// ```
    /// use core::num::NonZeroU32;
    /// use w800_osal_api::Wait;
    ///
    /// assert_eq!(Wait::from_raw(0), Wait::Forever);
    /// assert_eq!(Wait::from_raw(7), Wait::Ticks(NonZeroU32::new(7).unwrap()));
    /// ```
    pub const fn from_raw(ticks: Ticks) -> Self {
        match NonZeroU32::new(ticks) {
            Some(ticks) => Wait::Ticks(ticks),
            None => Wait::Forever,
        }
    }
}

/// A pointer-sized message word carried by queues.
///
/// Firmware callers usually pass the address of a message buffer they own; the adapter and the kernels never look
/// inside.
#[derive(Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message(usize);

impl Message {
    /// Wraps a raw word.
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }

    /// Returns the raw word.
    pub const fn into_raw(self) -> usize {
        self.0
    }
}

impl From<usize> for Message {
    fn from(raw: usize) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Message({:#x})", self.0)
    }
}
