//! Heap-backed memory service.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use w800_osal_api::{Block, MemoryAllocator};

/// Implements the [`MemoryAllocator`] trait on the global heap.
///
/// Keeps count of the blocks and bytes handed out and not yet released. An optional byte limit makes exhaustion
/// reproducible.
#[derive(Debug, Default)]
pub struct HeapAllocator {
    live_blocks: AtomicUsize,
    live_bytes: AtomicUsize,
    limit: Option<usize>,
}

impl HeapAllocator {
    /// A shareable allocator without limit.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A shareable allocator that refuses to hold more than `limit` bytes at once.
    pub fn with_limit(limit: usize) -> Arc<Self> {
        Arc::new(Self {
            limit: Some(limit),
            ..Self::default()
        })
    }

    /// Returns the number of blocks not yet released.
    pub fn live_blocks(&self) -> usize {
        self.live_blocks.load(Ordering::Acquire)
    }

    /// Returns the number of bytes not yet released.
    pub fn live_bytes(&self) -> usize {
        self.live_bytes.load(Ordering::Acquire)
    }
}

impl MemoryAllocator for HeapAllocator {
    fn allocate(&self, size: usize) -> Option<Block> {
        let reserved = self
            .live_bytes
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |live| {
                let total = live.checked_add(size)?;
                match self.limit {
                    Some(limit) if total > limit => None,
                    _ => Some(total),
                }
            });
        if reserved.is_err() {
            return None;
        }

        self.live_blocks.fetch_add(1, Ordering::AcqRel);
        Some(Block::zeroed(size))
    }

    fn release(&self, block: Block) {
        self.live_bytes.fetch_sub(block.len(), Ordering::AcqRel);
        self.live_blocks.fetch_sub(1, Ordering::AcqRel);
    }
}
