//! Raw allocation primitives: the bottom of the allocation stack.
//!
//! Every byte the pools (and the variable-size clients) touch comes through
//! here. Each allocation is prefixed with a one-word size header so the free
//! path can recover the original request size without the caller carrying it,
//! and every request is charged to a [`UsageKind`] bucket for statistics.

use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::mem;
use std::ptr::NonNull;

use crate::memory::stats::{UsageKind, UsageTracker};
use crate::memory::MemoryError;

/// Size of the header word prepended to every raw allocation.
pub(crate) const HEADER_SIZE: usize = mem::size_of::<usize>();

/// Fill byte written over freed regions when scribbling is enabled. Chosen to
/// be an obviously-bogus pointer pattern in a debugger.
pub(crate) const FREED_FILL: u8 = 0xBD;

fn layout_for(size: usize) -> Result<Layout, MemoryError> {
    Layout::from_size_align(size + HEADER_SIZE, mem::align_of::<usize>())
        .map_err(|e| MemoryError::AllocationFailed(format!("invalid layout for {size} bytes: {e}")))
}

/// Allocate `size` bytes from the system allocator, charged to `usage`.
///
/// The returned pointer is word-aligned, valid for exactly `size` bytes, and
/// zero-filled. The word immediately before it holds `size` so that [`free`]
/// can reconstruct the layout. The header itself is charged to
/// [`UsageKind::Overhead`].
///
/// System-allocator exhaustion is reported as [`MemoryError::OutOfMemory`];
/// kernel-level callers are expected to treat that as fatal, since inference
/// has no defined behavior after a failed allocation.
pub fn allocate(
    size: usize,
    usage: UsageKind,
    tracker: &UsageTracker,
) -> Result<NonNull<u8>, MemoryError> {
    let layout = layout_for(size)?;
    let base = unsafe { alloc_zeroed(layout) };
    let Some(base) = NonNull::new(base) else {
        return Err(MemoryError::OutOfMemory { requested: size });
    };

    unsafe {
        base.as_ptr().cast::<usize>().write(size);
    }
    tracker.add(usage, size);
    tracker.add(UsageKind::Overhead, HEADER_SIZE);

    Ok(unsafe { NonNull::new_unchecked(base.as_ptr().add(HEADER_SIZE)) })
}

/// Allocate `size` bytes of zeroed memory, charged to `usage`.
///
/// [`allocate`] already zero-fills; this alias exists so call sites that rely
/// on the zeroing read explicitly.
pub fn allocate_zeroed(
    size: usize,
    usage: UsageKind,
    tracker: &UsageTracker,
) -> Result<NonNull<u8>, MemoryError> {
    allocate(size, usage, tracker)
}

/// Release a pointer previously returned by [`allocate`].
///
/// No-op on null. When `scribble` is set the region is overwritten with
/// [`FREED_FILL`] before release, which makes use-after-free reads stand out
/// in a debugger; nothing may rely on that pattern for correctness.
///
/// # Safety
///
/// `ptr` must be null or a pointer obtained from [`allocate`] /
/// [`allocate_zeroed`] that has not already been freed, and `usage` must match
/// the category it was allocated under (counters go inconsistent otherwise).
pub unsafe fn free(ptr: *mut u8, usage: UsageKind, tracker: &UsageTracker, scribble: bool) {
    if ptr.is_null() {
        return;
    }

    let base = ptr.sub(HEADER_SIZE);
    let size = base.cast::<usize>().read();
    if scribble {
        std::ptr::write_bytes(ptr, FREED_FILL, size);
    }

    tracker.sub(usage, size);
    tracker.sub(UsageKind::Overhead, HEADER_SIZE);

    let layout = Layout::from_size_align_unchecked(size + HEADER_SIZE, mem::align_of::<usize>());
    dealloc(base, layout);
}
