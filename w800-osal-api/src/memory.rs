//! Memory service used for adapter-owned kernel storage.

use alloc::boxed::Box;
use alloc::vec;

/// An owned, zero-initialized chunk of memory handed out by a [`MemoryAllocator`].
///
/// Kernels that construct their objects in caller-provided memory receive a `&mut Block` and may use it as they
/// see fit; the adapter keeps ownership and returns the block to its allocator once the kernel object is gone.
#[derive(Debug, PartialEq, Eq)]
pub struct Block {
    bytes: Box<[u8]>,
}

impl Block {
    /// Creates a zeroed block of `size` bytes.
    pub fn zeroed(size: usize) -> Self {
        Self {
            bytes: vec![0; size].into_boxed_slice(),
        }
    }

    /// Returns the size of the block in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` for a zero sized block.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the contents of the block.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the contents of the block for writing.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

/// `MemoryAllocator` is the platform allocation service.
pub trait MemoryAllocator: Send + Sync {
    /// Allocates a block of `size` bytes, or returns `None` when memory is exhausted.
    fn allocate(&self, size: usize) -> Option<Block>;

    /// Returns a block previously handed out by [`Self::allocate`].
    fn release(&self, block: Block);
}
