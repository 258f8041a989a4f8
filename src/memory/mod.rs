//! Fixed-size memory pool subsystem.
//!
//! This module provides the pool data structure, the process-wide manager
//! that owns every pool, the raw allocation primitives underneath them, and
//! the pool-backed allocator adapter for node-based containers.

pub mod alloc;
pub mod kind;
pub mod manager;
pub mod pool;
pub mod raw;
pub mod stats;

pub use alloc::PoolAllocator;
pub use kind::PoolKind;
pub use manager::MemoryManager;
pub use pool::{Pool, BLOCK_CAPACITY, MAX_POOL_NAME_LENGTH};
pub use stats::{MemoryStats, PoolInfo, UsageKind, UsageSnapshot, UsageTracker};

/// Errors from the allocation subsystem.
///
/// Out-of-memory and configuration errors have no recovery path inside the
/// kernel; callers at the top level are expected to unwrap them and abort.
/// Returning them as values keeps the failure paths testable.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("Out of memory: failed to allocate {requested} bytes from the system allocator")]
    OutOfMemory { requested: usize },

    #[error("Pool name '{name}' exceeds the maximum length of {max} bytes")]
    NameTooLong { name: String, max: usize },

    #[error("Pool '{name}' was never initialized")]
    UninitializedPool { name: &'static str },

    #[error("Element alignment {align} exceeds the pool slot alignment {max}")]
    UnsupportedAlignment { align: usize, max: usize },

    #[error("Allocation failed: {0}")]
    AllocationFailed(String),
}
