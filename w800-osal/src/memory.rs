//! Adapter-owned memory.

use alloc::sync::Arc;
use core::fmt;

use w800_osal_api::{Block, MemoryAllocator};

/// A block drawn from the platform allocator, returned to it on drop.
///
/// Multi-step creation sequences hold one `Allocation` per step, so an early return on failure releases every block
/// allocated so far.
pub(crate) struct Allocation {
    block: Block,
    allocator: Arc<dyn MemoryAllocator>,
    leaked: bool,
}

impl Allocation {
    /// Allocates `size` bytes, logging exhaustion.
    pub(crate) fn new(allocator: &Arc<dyn MemoryAllocator>, size: usize) -> Option<Self> {
        let Some(block) = allocator.allocate(size) else {
            tracing::debug!(size, "platform allocator exhausted");
            return None;
        };

        Some(Self {
            block,
            allocator: Arc::clone(allocator),
            leaked: false,
        })
    }

    /// Returns the underlying block.
    pub(crate) fn block_mut(&mut self) -> &mut Block {
        &mut self.block
    }

    /// Gives up on the block without returning it to the allocator.
    ///
    /// Used when the kernel refused to delete an object that may still live inside the block.
    pub(crate) fn leak(mut self) {
        self.leaked = true;
        core::mem::forget(core::mem::replace(&mut self.block, Block::zeroed(0)));
    }
}

impl Drop for Allocation {
    fn drop(&mut self) {
        if !self.leaked {
            let block = core::mem::replace(&mut self.block, Block::zeroed(0));
            self.allocator.release(block);
        }
    }
}

impl fmt::Debug for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Allocation")
            .field("len", &self.block.len())
            .field("leaked", &self.leaked)
            .finish_non_exhaustive()
    }
}
