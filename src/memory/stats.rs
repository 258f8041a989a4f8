// File: src/memory/stats.rs
use std::cell::Cell;

use serde::Serialize;

/// Accounting bucket for a raw allocation.
///
/// Categories exist purely for statistics; they never influence where an
/// allocation is routed. Every byte handed out by the raw primitives is
/// charged to exactly one of these, plus a fixed per-allocation header charge
/// against [`UsageKind::Overhead`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UsageKind {
    /// Anything without a more specific bucket.
    Miscellaneous,
    /// Hash-table bucket arrays and table headers.
    HashTable,
    /// Interned string storage.
    String,
    /// Pool block storage.
    Pool,
    /// Size-header words prepended to every raw allocation.
    Overhead,
}

impl UsageKind {
    pub const COUNT: usize = 5;

    pub const ALL: [UsageKind; Self::COUNT] = [
        UsageKind::Miscellaneous,
        UsageKind::HashTable,
        UsageKind::String,
        UsageKind::Pool,
        UsageKind::Overhead,
    ];

    pub fn label(self) -> &'static str {
        match self {
            UsageKind::Miscellaneous => "miscellaneous",
            UsageKind::HashTable => "hash tables",
            UsageKind::String => "strings",
            UsageKind::Pool => "pools",
            UsageKind::Overhead => "overhead",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Running per-category byte totals, shared between the manager and every
/// pool it owns.
///
/// Strictly additive bookkeeping: every `add` during allocation must be
/// mirrored by a `sub` of the same size at free time, so a category's total
/// always equals the sum of its currently-live allocations. Interior
/// mutability via `Cell` keeps the tracker shareable through `Rc` on the
/// single-threaded allocation path.
#[derive(Debug, Default)]
pub struct UsageTracker {
    totals: [Cell<u64>; UsageKind::COUNT],
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&self, usage: UsageKind, bytes: usize) {
        let cell = &self.totals[usage.index()];
        cell.set(cell.get() + bytes as u64);
    }

    pub(crate) fn sub(&self, usage: UsageKind, bytes: usize) {
        let cell = &self.totals[usage.index()];
        let current = cell.get();
        debug_assert!(
            current >= bytes as u64,
            "usage counter underflow for {:?}: {} - {}",
            usage,
            current,
            bytes
        );
        cell.set(current.saturating_sub(bytes as u64));
    }

    /// Bytes currently live in one category.
    pub fn total(&self, usage: UsageKind) -> u64 {
        self.totals[usage.index()].get()
    }

    /// Bytes currently live across all categories.
    pub fn grand_total(&self) -> u64 {
        self.totals.iter().map(Cell::get).sum()
    }

    pub fn snapshot(&self) -> UsageSnapshot {
        UsageSnapshot {
            miscellaneous: self.total(UsageKind::Miscellaneous),
            hash_tables: self.total(UsageKind::HashTable),
            strings: self.total(UsageKind::String),
            pools: self.total(UsageKind::Pool),
            overhead: self.total(UsageKind::Overhead),
        }
    }
}

/// Point-in-time copy of the per-category byte totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UsageSnapshot {
    pub miscellaneous: u64,
    pub hash_tables: u64,
    pub strings: u64,
    pub pools: u64,
    pub overhead: u64,
}

impl UsageSnapshot {
    pub fn total(&self) -> u64 {
        self.miscellaneous + self.hash_tables + self.strings + self.pools + self.overhead
    }
}

/// Per-pool metadata as reported by [`MemoryManager::stats`].
///
/// `used_count` is `Some` only when the manager was configured with
/// fine-grained accounting; otherwise only block-level aggregates are
/// available.
///
/// [`MemoryManager::stats`]: crate::memory::manager::MemoryManager::stats
#[derive(Debug, Clone, Serialize)]
pub struct PoolInfo {
    pub name: String,
    pub index: usize,
    pub item_size: usize,
    pub items_per_block: usize,
    pub num_blocks: usize,
    pub used_count: Option<u64>,
}

impl PoolInfo {
    /// Total slot capacity across all blocks currently owned by the pool.
    pub fn capacity(&self) -> usize {
        self.num_blocks * self.items_per_block
    }
}

/// Full statistics snapshot: category totals plus one entry per active pool
/// (built-in and dynamic alike).
#[derive(Debug, Clone, Serialize)]
pub struct MemoryStats {
    pub usage: UsageSnapshot,
    pub pools: Vec<PoolInfo>,
}

impl MemoryStats {
    /// Format the snapshot as a human-readable report.
    pub fn format_summary(&self) -> String {
        let mut out = String::new();
        out.push_str("Memory Usage:\n");
        out.push_str(&format!("  - Miscellaneous: {} bytes\n", self.usage.miscellaneous));
        out.push_str(&format!("  - Hash tables:   {} bytes\n", self.usage.hash_tables));
        out.push_str(&format!("  - Strings:       {} bytes\n", self.usage.strings));
        out.push_str(&format!("  - Pools:         {} bytes\n", self.usage.pools));
        out.push_str(&format!("  - Overhead:      {} bytes\n", self.usage.overhead));
        out.push_str(&format!("  - Total:         {} bytes\n", self.usage.total()));
        out.push_str("Pools:\n");
        for pool in &self.pools {
            out.push_str(&format!(
                "  - {}: {} bytes/item, {} items/block, {} block(s)",
                pool.name, pool.item_size, pool.items_per_block, pool.num_blocks
            ));
            if let Some(used) = pool.used_count {
                out.push_str(&format!(", {} in use", used));
            }
            out.push('\n');
        }
        out
    }
}
