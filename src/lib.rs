//! # Quarry - Pooled Memory Management
//!
//! Quarry provides fixed-size memory pools for the hot object kinds of a
//! rule-engine kernel (symbols, working-memory elements, preferences, match
//! network records), plus size-keyed pools for node-based container
//! allocations. Same-shaped heap allocations that happen millions of times
//! per run become O(1) free-list pops.
//!
//! ## Core Features
//!
//! - **Built-in pools**: one permanently reserved pool per kernel object kind
//! - **Dynamic pools**: created on demand, shared by element size
//! - **Usage accounting**: strictly additive per-category byte counters
//! - **Runtime switches**: pooling bypass, live-item counts, and freed-slot
//!   scribbling without recompilation
//!
//! ## Quick Start
//!
//! ```rust
//! use quarry::memory::{MemoryManager, PoolKind};
//!
//! # fn main() -> Result<(), quarry::MemoryError> {
//! let mut manager = MemoryManager::default();
//! manager.init_pool(PoolKind::Wme, 48, "wme")?;
//!
//! // First allocation grows the pool by one block, lazily.
//! let slot = manager.allocate(PoolKind::Wme)?;
//! assert_eq!(manager.pool(PoolKind::Wme).num_blocks(), 1);
//!
//! unsafe { manager.free(PoolKind::Wme, slot.as_ptr()) };
//!
//! let stats = manager.stats();
//! println!("{}", stats.format_summary());
//! # Ok(())
//! # }
//! ```

pub mod memory;

// Re-export commonly used types for convenience
pub use memory::{
    MemoryError, MemoryManager, MemoryStats, Pool, PoolAllocator, PoolInfo, PoolKind, UsageKind,
};

/// Version information for the quarry crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Runtime configuration for the memory manager.
///
/// These switches replace what would otherwise be compile-time features, so a
/// single binary serves both production and corruption-hunting sessions.
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// Route allocations through pools. When false every request goes
    /// straight to the system allocator (and straight back on free), with
    /// identical observable behavior but no reuse.
    pub pooling_enabled: bool,
    /// Maintain per-pool live-item counts for statistics.
    pub track_used_count: bool,
    /// Overwrite freed memory with a recognizable fill byte.
    pub scribble_on_free: bool,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            pooling_enabled: true,
            track_used_count: false,
            scribble_on_free: false,
        }
    }
}

impl MemoryConfig {
    /// Production defaults plus live-item accounting, for operator memory
    /// reports that need a live/free split.
    pub fn with_accounting() -> Self {
        Self {
            track_used_count: true,
            ..Self::default()
        }
    }

    /// Configuration for hunting memory corruption: pooling bypassed so every
    /// free returns to the system allocator immediately, freed memory
    /// scribbled so stale reads stand out.
    pub fn corruption_hunting() -> Self {
        Self {
            pooling_enabled: false,
            track_used_count: true,
            scribble_on_free: true,
        }
    }

    /// Create a memory manager using this configuration.
    pub fn create_manager(self) -> memory::MemoryManager {
        memory::MemoryManager::new(self)
    }
}
