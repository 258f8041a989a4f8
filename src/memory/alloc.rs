//! Pool-backed allocator adapter for node-based containers.
//!
//! Node-based bookkeeping structures (condition lists, symbol sets, identity
//! graphs) perform thousands of same-shaped single-element allocations. This
//! adapter resolves a shared pool from the manager purely by element size, so
//! every node allocation becomes a free-list pop instead of a heap call.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::mem;
use std::ptr::NonNull;
use std::rc::Rc;

use crate::memory::manager::MemoryManager;
use crate::memory::pool::Pool;
use crate::memory::MemoryError;

/// Allocator handle for single elements of `T`, backed by a size-keyed pool.
///
/// Two handles for the same element type always resolve to the same
/// underlying pool: pools are shared by size, not by handle identity. Cloning
/// is a reference-count bump, so handles are cheap to pass by value, and a
/// handle keeps its pool's storage alive even across manager teardown.
pub struct PoolAllocator<T> {
    pool: Rc<RefCell<Pool>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> PoolAllocator<T> {
    /// Resolve (or create) the pool serving `size_of::<T>()`-byte elements.
    ///
    /// Pool slots are word-aligned, so element types demanding a larger
    /// alignment are rejected up front rather than handed misaligned memory.
    pub fn new(manager: &mut MemoryManager) -> Result<Self, MemoryError> {
        if mem::align_of::<T>() > mem::align_of::<usize>() {
            return Err(MemoryError::UnsupportedAlignment {
                align: mem::align_of::<T>(),
                max: mem::align_of::<usize>(),
            });
        }
        let pool = manager.get_or_create_pool(mem::size_of::<T>())?;
        Ok(Self {
            pool,
            _marker: PhantomData,
        })
    }

    /// Resolve an allocator for a different element type, the way container
    /// internals rebind a node allocator from the value allocator they were
    /// handed.
    pub fn rebind<U>(&self, manager: &mut MemoryManager) -> Result<PoolAllocator<U>, MemoryError> {
        PoolAllocator::new(manager)
    }

    /// Allocate storage for exactly one `T`. The returned slot is zero-filled
    /// and uninitialized as a `T`; follow with [`PoolAllocator::construct`].
    ///
    /// Only single-element allocation is supported; any other `count` is a
    /// caller bug and panics.
    pub fn allocate(&self, count: usize) -> Result<NonNull<T>, MemoryError> {
        assert_eq!(count, 1, "pool-backed allocator only supports single-element allocation");
        let slot = self.pool.borrow_mut().allocate()?;
        Ok(slot.cast())
    }

    /// Return storage obtained from [`PoolAllocator::allocate`]. Does not run
    /// `T`'s destructor; call [`PoolAllocator::destroy`] first for live values.
    ///
    /// # Safety
    ///
    /// `ptr` must have come from [`PoolAllocator::allocate`] on an allocator
    /// sharing this pool and must not already have been deallocated.
    pub unsafe fn deallocate(&self, ptr: NonNull<T>, count: usize) {
        assert_eq!(count, 1, "pool-backed allocator only supports single-element deallocation");
        self.pool.borrow_mut().free(ptr.cast());
    }

    /// Move `value` into uninitialized storage.
    ///
    /// # Safety
    ///
    /// `ptr` must point to valid, uninitialized storage for a `T`.
    pub unsafe fn construct(&self, ptr: NonNull<T>, value: T) {
        ptr.as_ptr().write(value);
    }

    /// Run `T`'s destructor in place, leaving the storage allocated.
    ///
    /// # Safety
    ///
    /// `ptr` must point to a live `T` that is not dropped again afterwards.
    pub unsafe fn destroy(&self, ptr: NonNull<T>) {
        std::ptr::drop_in_place(ptr.as_ptr());
    }

    /// Shared handle to the backing pool, for identity checks and diagnostics.
    pub fn pool(&self) -> Rc<RefCell<Pool>> {
        self.pool.clone()
    }
}

impl<T> Clone for PoolAllocator<T> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _marker: PhantomData,
        }
    }
}

/// Allocator handles are interchangeable exactly when they draw from the same
/// pool, which for a given element type is always.
impl<T> PartialEq for PoolAllocator<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.pool, &other.pool)
    }
}

impl<T> Eq for PoolAllocator<T> {}

impl<T> std::fmt::Debug for PoolAllocator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolAllocator")
            .field("element_size", &mem::size_of::<T>())
            .field("pool", &self.pool.borrow().name())
            .finish()
    }
}
