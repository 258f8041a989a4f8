//! Basic memory pool usage example demonstrating built-in pools, dynamic
//! pools, and the statistics surface.

use quarry::memory::{MemoryManager, PoolAllocator, PoolKind};
use quarry::MemoryConfig;

fn main() -> anyhow::Result<()> {
    println!("🔧 Basic Memory Pool Usage");
    println!("==========================");

    let mut manager = MemoryConfig::with_accounting().create_manager();

    builtin_pool_demo(&mut manager)?;
    dynamic_pool_demo(&mut manager)?;
    stats_demo(&manager);

    Ok(())
}

fn builtin_pool_demo(manager: &mut MemoryManager) -> anyhow::Result<()> {
    println!("\n📦 Built-in Pool Demo");
    println!("---------------------");

    manager.init_pool(PoolKind::Wme, 48, "wme")?;
    manager.init_pool(PoolKind::Preference, 56, "preference")?;

    let pool = manager.pool(PoolKind::Wme);
    println!(
        "Initialized '{}': {} bytes/item, {} items/block, {} blocks (lazy)",
        pool.name(),
        pool.item_size(),
        pool.items_per_block(),
        pool.num_blocks()
    );

    // First allocation grows the first block.
    let slots: Vec<_> = (0..5)
        .map(|_| manager.allocate(PoolKind::Wme))
        .collect::<Result<_, _>>()?;
    println!(
        "Allocated 5 slots, first at {:p}; blocks now: {}",
        slots[0].as_ptr(),
        manager.pool(PoolKind::Wme).num_blocks()
    );

    for slot in slots {
        unsafe { manager.free(PoolKind::Wme, slot.as_ptr()) };
    }
    println!("✅ Returned all 5 slots to the free list");

    Ok(())
}

fn dynamic_pool_demo(manager: &mut MemoryManager) -> anyhow::Result<()> {
    println!("\n🧩 Dynamic Pool Demo");
    println!("--------------------");

    struct SetNode {
        value: u64,
        left: *mut SetNode,
        right: *mut SetNode,
    }

    let alloc = PoolAllocator::<SetNode>::new(manager)?;
    let twin = PoolAllocator::<SetNode>::new(manager)?;
    println!(
        "Two allocators for the same node type share one pool: {}",
        alloc == twin
    );

    let node = alloc.allocate(1)?;
    unsafe {
        alloc.construct(
            node,
            SetNode {
                value: 42,
                left: std::ptr::null_mut(),
                right: std::ptr::null_mut(),
            },
        );
        println!("Constructed node with value {}", node.as_ref().value);
        alloc.destroy(node);
        alloc.deallocate(node, 1);
    }
    println!("✅ Node round-trip complete");

    Ok(())
}

fn stats_demo(manager: &MemoryManager) {
    println!("\n📊 Statistics");
    println!("-------------");
    print!("{}", manager.stats().format_summary());
}
