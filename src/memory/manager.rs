//! Process-wide owner of every memory pool.
//!
//! The manager holds one permanently reserved pool per [`PoolKind`] plus a
//! size-keyed map of dynamically created pools for the container-allocator
//! path. It is an explicitly constructed value meant to live on whatever
//! kernel/session context owns the allocation subsystem; there is no hidden
//! global.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ptr::NonNull;
use std::rc::Rc;

use tracing::debug;

use crate::memory::kind::PoolKind;
use crate::memory::pool::{Pool, PoolPolicy};
use crate::memory::raw;
use crate::memory::stats::{MemoryStats, UsageKind, UsageTracker};
use crate::memory::MemoryError;
use crate::MemoryConfig;

/// Name given to every size-keyed pool created for container allocators.
const DYNAMIC_POOL_NAME: &str = "dynamic";

/// Owner of the built-in pool array, the dynamic pool map, and the usage
/// counters.
///
/// Single-threaded by design: pools link free slots through raw pointers and
/// share their usage tracker through `Rc`, so the manager is deliberately
/// `!Send`. A multi-threaded kernel would need its own locking around the
/// dynamic map and every pool's free list; none is provided here.
pub struct MemoryManager {
    pools: [Pool; PoolKind::COUNT],
    dynamic_pools: HashMap<usize, Rc<RefCell<Pool>>>,
    tracker: Rc<UsageTracker>,
    config: MemoryConfig,
    next_dynamic_index: usize,
}

impl MemoryManager {
    pub fn new(config: MemoryConfig) -> Self {
        let tracker = Rc::new(UsageTracker::new());
        Self {
            pools: std::array::from_fn(|_| Pool::new(tracker.clone())),
            dynamic_pools: HashMap::new(),
            tracker,
            config,
            next_dynamic_index: PoolKind::COUNT,
        }
    }

    fn policy(&self) -> PoolPolicy {
        PoolPolicy {
            bypass_pooling: !self.config.pooling_enabled,
            track_used_count: self.config.track_used_count,
            scribble_on_free: self.config.scribble_on_free,
        }
    }

    /// Initialize the built-in pool for `kind`. Idempotent: the first call
    /// wins, later calls are no-ops.
    pub fn init_pool(
        &mut self,
        kind: PoolKind,
        item_size: usize,
        name: &str,
    ) -> Result<(), MemoryError> {
        let policy = self.policy();
        self.pools[kind.index()].init(item_size, name, kind.index(), policy)
    }

    /// Hot-path allocation from a built-in pool. Returns a zero-filled,
    /// word-aligned slot of at least the pool's item size.
    pub fn allocate(&mut self, kind: PoolKind) -> Result<NonNull<u8>, MemoryError> {
        let pool = &mut self.pools[kind.index()];
        if !pool.is_initialized() {
            return Err(MemoryError::UninitializedPool { name: kind.label() });
        }
        pool.allocate()
    }

    /// Return a slot to its built-in pool. No-op on null.
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must have been returned by [`MemoryManager::allocate`]
    /// for this same `kind` and must not have been freed already.
    pub unsafe fn free(&mut self, kind: PoolKind, ptr: *mut u8) {
        let Some(ptr) = NonNull::new(ptr) else {
            return;
        };
        self.pools[kind.index()].free(ptr);
    }

    /// Look up (or create) the dynamic pool serving `item_size`-byte elements.
    ///
    /// Requesting the same size twice is the expected cache-hit path and
    /// returns the same shared pool, so every container allocator for a given
    /// element size draws from one free list.
    pub fn get_or_create_pool(
        &mut self,
        item_size: usize,
    ) -> Result<Rc<RefCell<Pool>>, MemoryError> {
        if let Some(pool) = self.dynamic_pools.get(&item_size) {
            return Ok(pool.clone());
        }

        let mut pool = Pool::new(self.tracker.clone());
        let index = self.next_dynamic_index;
        pool.init(item_size, DYNAMIC_POOL_NAME, index, self.policy())?;
        debug!(item_size, index, "created dynamic pool");

        let pool = Rc::new(RefCell::new(pool));
        self.dynamic_pools.insert(item_size, pool.clone());
        self.next_dynamic_index += 1;
        Ok(pool)
    }

    /// Variable-size allocation path for clients with no pooled kind
    /// (string storage, hash-table arrays). Same zero-fill and alignment
    /// guarantees as the raw primitives, accounted under `usage`.
    pub fn allocate_raw(
        &self,
        size: usize,
        usage: UsageKind,
    ) -> Result<NonNull<u8>, MemoryError> {
        raw::allocate(size, usage, &self.tracker)
    }

    /// Release memory obtained from [`MemoryManager::allocate_raw`]. No-op on
    /// null.
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must come from [`MemoryManager::allocate_raw`], not
    /// yet freed, and `usage` must match the category it was allocated under.
    pub unsafe fn free_raw(&self, ptr: *mut u8, usage: UsageKind) {
        raw::free(ptr, usage, &self.tracker, self.config.scribble_on_free);
    }

    /// Force `blocks` additional growth steps on the built-in pool named
    /// `name`. Operator tooling hook, not a hot path.
    ///
    /// Returns `Ok(false)` when no built-in pool carries that name; growth
    /// failures propagate as errors.
    pub fn add_blocks_to_named_pool(
        &mut self,
        name: &str,
        blocks: usize,
    ) -> Result<bool, MemoryError> {
        let Some(pool) = self
            .pools
            .iter_mut()
            .find(|p| p.is_initialized() && p.name() == name)
        else {
            return Ok(false);
        };
        for _ in 0..blocks {
            pool.grow()?;
        }
        Ok(true)
    }

    /// Read access to a built-in pool's metadata.
    pub fn pool(&self, kind: PoolKind) -> &Pool {
        &self.pools[kind.index()]
    }

    /// Return the built-in pool for `kind` to its blockless state,
    /// invalidating every outstanding slot pointer it handed out.
    pub fn release_pool(&mut self, kind: PoolKind) {
        self.pools[kind.index()].release_all();
    }

    /// Snapshot of category totals plus metadata for every active pool,
    /// built-in and dynamic. Raw counters only; formatting is the reporting
    /// layer's job.
    pub fn stats(&self) -> MemoryStats {
        let mut pools: Vec<_> = self
            .pools
            .iter()
            .filter(|p| p.is_initialized())
            .map(Pool::info)
            .collect();
        pools.extend(self.dynamic_pools.values().map(|p| p.borrow().info()));
        pools.sort_by_key(|info| info.index);

        MemoryStats {
            usage: self.tracker.snapshot(),
            pools,
        }
    }

    /// Number of distinct element sizes with a dynamic pool.
    pub fn dynamic_pool_count(&self) -> usize {
        self.dynamic_pools.len()
    }

    /// Shared handle to the usage counters. Outlives the manager, which lets
    /// teardown be audited against a pre-test baseline.
    pub fn usage_tracker(&self) -> Rc<UsageTracker> {
        self.tracker.clone()
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }
}

impl Default for MemoryManager {
    fn default() -> Self {
        Self::new(MemoryConfig::default())
    }
}

impl Drop for MemoryManager {
    fn drop(&mut self) {
        debug!(
            pool_bytes = self.tracker.total(UsageKind::Pool),
            dynamic_pools = self.dynamic_pools.len(),
            "tearing down memory manager"
        );
        // Built-in pools release their block chains in Pool::drop. Dynamic
        // pools do the same when the last allocator handle drops.
        self.dynamic_pools.clear();
    }
}

impl std::fmt::Debug for MemoryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryManager")
            .field("config", &self.config)
            .field(
                "initialized_pools",
                &self.pools.iter().filter(|p| p.is_initialized()).count(),
            )
            .field("dynamic_pools", &self.dynamic_pools.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_requires_init() {
        let mut manager = MemoryManager::default();
        let result = manager.allocate(PoolKind::Wme);
        assert!(matches!(result, Err(MemoryError::UninitializedPool { .. })));
    }

    #[test]
    fn test_first_allocation_grows_once() {
        let mut manager = MemoryManager::default();
        manager.init_pool(PoolKind::Wme, 48, "wme").unwrap();
        assert_eq!(manager.pool(PoolKind::Wme).num_blocks(), 0);

        let ptr = manager.allocate(PoolKind::Wme).unwrap();
        assert_eq!(manager.pool(PoolKind::Wme).num_blocks(), 1);
        unsafe { manager.free(PoolKind::Wme, ptr.as_ptr()) };
    }

    #[test]
    fn test_free_null_is_noop() {
        let mut manager = MemoryManager::default();
        manager.init_pool(PoolKind::Token, 40, "token").unwrap();
        unsafe { manager.free(PoolKind::Token, std::ptr::null_mut()) };
    }

    #[test]
    fn test_dynamic_pools_shared_by_size() {
        let mut manager = MemoryManager::default();

        let a = manager.get_or_create_pool(24).unwrap();
        let b = manager.get_or_create_pool(24).unwrap();
        let c = manager.get_or_create_pool(40).unwrap();

        assert!(Rc::ptr_eq(&a, &b));
        assert!(!Rc::ptr_eq(&a, &c));
        assert_eq!(manager.dynamic_pool_count(), 2);
    }

    #[test]
    fn test_dynamic_pool_indices_follow_builtins() {
        let mut manager = MemoryManager::default();
        let a = manager.get_or_create_pool(16).unwrap();
        let b = manager.get_or_create_pool(32).unwrap();
        assert_eq!(a.borrow().index(), PoolKind::COUNT);
        assert_eq!(b.borrow().index(), PoolKind::COUNT + 1);
    }

    #[test]
    fn test_add_blocks_to_named_pool() {
        let mut manager = MemoryManager::default();
        manager.init_pool(PoolKind::Token, 40, "token").unwrap();

        assert!(manager.add_blocks_to_named_pool("token", 3).unwrap());
        assert_eq!(manager.pool(PoolKind::Token).num_blocks(), 3);

        assert!(!manager.add_blocks_to_named_pool("no such pool", 1).unwrap());
    }

    #[test]
    fn test_stats_cover_builtin_and_dynamic_pools() {
        let mut manager = MemoryManager::default();
        manager.init_pool(PoolKind::Wme, 48, "wme").unwrap();
        manager.init_pool(PoolKind::Preference, 56, "preference").unwrap();
        let _dynamic = manager.get_or_create_pool(24).unwrap();

        let stats = manager.stats();
        assert_eq!(stats.pools.len(), 3);
        let names: Vec<_> = stats.pools.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["wme", "preference", "dynamic"]);
    }

    #[test]
    fn test_release_pool_resets_blocks() {
        let mut manager = MemoryManager::default();
        manager.init_pool(PoolKind::Condition, 72, "condition").unwrap();
        let _ = manager.allocate(PoolKind::Condition).unwrap();
        assert_eq!(manager.pool(PoolKind::Condition).num_blocks(), 1);

        manager.release_pool(PoolKind::Condition);
        assert_eq!(manager.pool(PoolKind::Condition).num_blocks(), 0);
    }

    #[test]
    fn test_raw_path_accounting() {
        let manager = MemoryManager::default();
        let tracker = manager.usage_tracker();

        let ptr = manager.allocate_raw(256, UsageKind::String).unwrap();
        assert_eq!(tracker.total(UsageKind::String), 256);
        unsafe { manager.free_raw(ptr.as_ptr(), UsageKind::String) };
        assert_eq!(tracker.total(UsageKind::String), 0);
    }

    #[test]
    fn test_pooling_disabled_fallback() {
        let config = MemoryConfig {
            pooling_enabled: false,
            ..MemoryConfig::default()
        };
        let mut manager = MemoryManager::new(config);
        manager.init_pool(PoolKind::Wme, 48, "wme").unwrap();

        let ptr = manager.allocate(PoolKind::Wme).unwrap();
        assert_eq!(manager.pool(PoolKind::Wme).num_blocks(), 0);
        let bytes = unsafe { std::slice::from_raw_parts(ptr.as_ptr(), 48) };
        assert!(bytes.iter().all(|&b| b == 0));
        unsafe { manager.free(PoolKind::Wme, ptr.as_ptr()) };

        let tracker = manager.usage_tracker();
        drop(manager);
        assert_eq!(tracker.grand_total(), 0);
    }
}
