//! Mailboxes.
//!
//! The current binding provides no kernel mailbox. Every operation reports success, sent messages are dropped and
//! receiving yields nothing. Use a [`Queue`](crate::Queue) for real message passing.

use w800_osal_api::{Kernel, Message, Platform, Ticks};

use crate::error::Result;
use crate::{Osal, Unbacked};

/// Handle of a mailbox.
#[derive(Debug, PartialEq, Eq)]
pub struct Mailbox {
    capacity: usize,
}

impl Mailbox {
    /// Returns the capacity the mailbox was created with.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<K, P> Osal<K, P>
where
    K: Kernel,
    P: Platform,
{
    /// Creates a mailbox. No kernel object is created.
    pub fn mailbox_create(&self, capacity: usize) -> Result<(Mailbox, Unbacked)> {
        Ok((Mailbox { capacity }, self.note_unbacked("mailbox_create")))
    }

    /// Deletes a mailbox. No kernel work is done.
    pub fn mailbox_delete(&self, _mailbox: Mailbox) -> Result<Unbacked> {
        Ok(self.note_unbacked("mailbox_delete"))
    }

    /// Sends a message. The message is dropped.
    pub fn mailbox_send(&self, _mailbox: &Mailbox, _message: Message) -> Result<Unbacked> {
        Ok(self.note_unbacked("mailbox_send"))
    }

    /// Receives a message. Returns immediately with no message.
    pub fn mailbox_receive(
        &self,
        _mailbox: &Mailbox,
        _wait: Ticks,
    ) -> Result<(Option<Message>, Unbacked)> {
        Ok((None, self.note_unbacked("mailbox_receive")))
    }
}
