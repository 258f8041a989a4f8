//! Fixed-item-size memory pool with an intrusive free list.
//!
//! A pool owns a chain of large raw blocks carved into equal-size slots.
//! Free slots double as list nodes: the first word of a free slot stores the
//! next free slot, and the first word of each block stores the previously
//! grown block. Allocation pops the free-list head in O(1); freeing pushes in
//! O(1); blocks are only ever returned to the system in [`Pool::release_all`].

use std::mem;
use std::ptr::NonNull;
use std::rc::Rc;

use tracing::trace;

use crate::memory::raw;
use crate::memory::stats::{PoolInfo, UsageKind, UsageTracker};
use crate::memory::MemoryError;

/// Maximum length of a pool name, in bytes. Exceeding it is a configuration
/// error, not a truncation case.
pub const MAX_POOL_NAME_LENGTH: usize = 32;

/// Usable item region per block. Slightly under 32 KiB so a block plus its
/// chain-link header and the raw size header stays within one 32 KiB region.
pub const BLOCK_CAPACITY: usize = 32 * 1024 - 32;

/// Reserved first word of each block, holding the previous block in the chain.
pub(crate) const BLOCK_HEADER_SIZE: usize = mem::size_of::<usize>();

/// Runtime behavior flags a pool picks up from the manager's configuration at
/// init time.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PoolPolicy {
    /// Route every allocate/free straight to the raw primitives, never
    /// touching blocks or the free list. Debugging aid for hunting
    /// pool-related corruption; observable behavior is otherwise identical.
    pub bypass_pooling: bool,
    /// Maintain a live-item count (one increment per allocate, one decrement
    /// per free).
    pub track_used_count: bool,
    /// Overwrite freed slots with a recognizable fill byte.
    pub scribble_on_free: bool,
}

/// One fixed-item-size pool.
///
/// Pools are owned by the manager and permanently associated with a single
/// item size after initialization. Not `Send`: the whole allocation subsystem
/// is single-threaded by design.
pub struct Pool {
    item_size: usize,
    items_per_block: usize,
    num_blocks: usize,
    /// Head of the block chain; each block's first word links to the block
    /// grown before it. Null when no block has been grown yet.
    first_block: *mut u8,
    /// Head of the free-slot list; each free slot's first word links to the
    /// next free slot. Null when empty.
    free_list: *mut u8,
    used_count: u64,
    index: usize,
    name: String,
    initialized: bool,
    policy: PoolPolicy,
    tracker: Rc<UsageTracker>,
}

impl Pool {
    /// Create an uninitialized pool slot. Usable only after [`Pool::init`].
    pub(crate) fn new(tracker: Rc<UsageTracker>) -> Self {
        Self {
            item_size: 0,
            items_per_block: 0,
            num_blocks: 0,
            first_block: std::ptr::null_mut(),
            free_list: std::ptr::null_mut(),
            used_count: 0,
            index: 0,
            name: String::new(),
            initialized: false,
            policy: PoolPolicy::default(),
            tracker,
        }
    }

    /// One-time initialization. A second call is a no-op regardless of
    /// arguments: re-initializing with a different item size would corrupt
    /// the free list, so the first configuration wins.
    pub(crate) fn init(
        &mut self,
        item_size: usize,
        name: &str,
        index: usize,
        policy: PoolPolicy,
    ) -> Result<(), MemoryError> {
        if self.initialized {
            return Ok(());
        }

        if name.len() > MAX_POOL_NAME_LENGTH {
            return Err(MemoryError::NameTooLong {
                name: name.to_string(),
                max: MAX_POOL_NAME_LENGTH,
            });
        }

        self.item_size = rounded_item_size(item_size);
        self.items_per_block = (BLOCK_CAPACITY / self.item_size).max(1);
        self.num_blocks = 0;
        self.first_block = std::ptr::null_mut();
        self.free_list = std::ptr::null_mut();
        self.used_count = 0;
        self.index = index;
        self.name = name.to_string();
        self.policy = policy;
        self.initialized = true;
        Ok(())
    }

    /// Grow the pool by one block and thread its slots onto the free list.
    ///
    /// Slots are linked in address order; allocation then proceeds LIFO from
    /// the highest-address slot of the newest block. Blocks are never grown
    /// eagerly: a kind that goes unused in a run never allocates one.
    pub(crate) fn grow(&mut self) -> Result<(), MemoryError> {
        if self.policy.bypass_pooling {
            return Ok(());
        }

        let block_bytes = self.item_size * self.items_per_block + BLOCK_HEADER_SIZE;
        let block = raw::allocate(block_bytes, UsageKind::Pool, &self.tracker)?.as_ptr();

        unsafe {
            block.cast::<*mut u8>().write(self.first_block);
            let items = block.add(BLOCK_HEADER_SIZE);
            for i in 0..self.items_per_block {
                let slot = items.add(i * self.item_size);
                slot.cast::<*mut u8>().write(self.free_list);
                self.free_list = slot;
            }
        }

        self.first_block = block;
        self.num_blocks += 1;
        trace!(
            pool = %self.name,
            num_blocks = self.num_blocks,
            block_bytes,
            "grew pool"
        );
        Ok(())
    }

    /// Pop one zero-filled slot off the free list, growing the pool first if
    /// the list is empty.
    pub fn allocate(&mut self) -> Result<NonNull<u8>, MemoryError> {
        debug_assert!(self.initialized, "allocate from uninitialized pool");

        if self.policy.bypass_pooling {
            let ptr = raw::allocate(self.item_size, UsageKind::Pool, &self.tracker)?;
            if self.policy.track_used_count {
                self.used_count += 1;
            }
            return Ok(ptr);
        }

        if self.free_list.is_null() {
            self.grow()?;
        }

        let slot = self.free_list;
        unsafe {
            self.free_list = slot.cast::<*mut u8>().read();
            std::ptr::write_bytes(slot, 0, self.item_size);
        }
        if self.policy.track_used_count {
            self.used_count += 1;
        }
        Ok(unsafe { NonNull::new_unchecked(slot) })
    }

    /// Push a slot back onto the free list.
    ///
    /// Frees never shrink the block chain; reused slots are handed out again
    /// before any new block is grown.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by [`Pool::allocate`] on this same pool
    /// and must not already be on the free list.
    pub unsafe fn free(&mut self, ptr: NonNull<u8>) {
        if self.policy.track_used_count {
            debug_assert!(self.used_count > 0, "free without matching allocate");
            self.used_count = self.used_count.saturating_sub(1);
        }

        if self.policy.bypass_pooling {
            raw::free(
                ptr.as_ptr(),
                UsageKind::Pool,
                &self.tracker,
                self.policy.scribble_on_free,
            );
            return;
        }

        let slot = ptr.as_ptr();
        if self.policy.scribble_on_free {
            std::ptr::write_bytes(slot, raw::FREED_FILL, self.item_size);
        }
        slot.cast::<*mut u8>().write(self.free_list);
        self.free_list = slot;
    }

    /// Return every block to the raw primitives and reset the pool to its
    /// freshly-initialized (blockless) state.
    ///
    /// Only for teardown or explicit reinitialization; outstanding slot
    /// pointers are invalidated.
    pub(crate) fn release_all(&mut self) {
        let mut block = self.first_block;
        while !block.is_null() {
            // The chain link lives in the block's first word; read it before
            // the block goes away.
            let next = unsafe { block.cast::<*mut u8>().read() };
            unsafe { raw::free(block, UsageKind::Pool, &self.tracker, false) };
            block = next;
        }
        self.first_block = std::ptr::null_mut();
        self.free_list = std::ptr::null_mut();
        self.num_blocks = 0;
        self.used_count = 0;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Slot size in bytes after rounding (at least one pointer, word-aligned).
    pub fn item_size(&self) -> usize {
        self.item_size
    }

    pub fn items_per_block(&self) -> usize {
        self.items_per_block
    }

    pub fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Live-item count, if fine-grained accounting was configured.
    pub fn used_count(&self) -> Option<u64> {
        self.policy.track_used_count.then_some(self.used_count)
    }

    /// Number of slots currently on the free list. O(capacity) walk, for
    /// diagnostics only.
    pub fn free_slots(&self) -> usize {
        let mut count = 0;
        let mut slot = self.free_list;
        while !slot.is_null() {
            count += 1;
            slot = unsafe { slot.cast::<*mut u8>().read() };
        }
        count
    }

    pub fn info(&self) -> PoolInfo {
        PoolInfo {
            name: self.name.clone(),
            index: self.index,
            item_size: self.item_size,
            items_per_block: self.items_per_block,
            num_blocks: self.num_blocks,
            used_count: self.used_count(),
        }
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        self.release_all();
    }
}

impl std::fmt::Debug for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("name", &self.name)
            .field("index", &self.index)
            .field("item_size", &self.item_size)
            .field("items_per_block", &self.items_per_block)
            .field("num_blocks", &self.num_blocks)
            .field("initialized", &self.initialized)
            .finish()
    }
}

/// Round a requested item size up to at least one pointer width (a free slot
/// must be able to hold its list link) and to a multiple of the word
/// alignment. Deterministic for any input size.
fn rounded_item_size(item_size: usize) -> usize {
    let size = item_size.max(mem::size_of::<*mut u8>());
    let align = mem::align_of::<usize>();
    (size + align - 1) & !(align - 1)
}
