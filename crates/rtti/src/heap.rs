// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Allocator hook.
//!
//! Every piece of storage the value layer creates (`new`, `make_slice`,
//! boxing, call results, ...) comes from the installed [`Heap`]. The default
//! [`SystemHeap`] hands out zeroed blocks from the global allocator and never
//! frees them: reclamation belongs to the collector that owns the process.
//!
//! A host with its own collector installs a heap once at startup:
//!
//! ```
//! use rtti::heap::{self, SystemHeap};
//!
//! heap::install_heap(Box::new(SystemHeap::new()));
//! assert_eq!(heap::heap_stats().live_bytes, 0);
//! ```

use crate::config::MAX_ALIGN;
use crate::types::Type;
use arc_swap::ArcSwap;
use std::alloc::{alloc_zeroed, Layout};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

/// Allocation counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HeapStats {
    pub allocations: u64,
    /// Bytes handed out so far; nothing is ever returned.
    pub live_bytes: u64,
}

/// Storage provider for the value layer.
///
/// Returned storage must be zeroed, aligned to at least `align`, and stay
/// valid for the rest of the process (or until the host's collector proves
/// it unreachable).
pub trait Heap: Send + Sync {
    /// Zeroed block of `size` bytes.
    fn allocate_bytes(&self, size: usize, align: usize) -> *mut u8;

    /// Zeroed storage for one value of type `t`.
    fn allocate(&self, t: Type) -> *mut u8 {
        self.allocate_bytes(t.size(), t.align().max(1))
    }

    /// Zeroed storage for `n` consecutive values of type `t`.
    fn allocate_array(&self, t: Type, n: usize) -> *mut u8 {
        match t.size().checked_mul(n) {
            Some(size) => self.allocate_bytes(size, t.align().max(1)),
            None => panic!("rtti: allocation of {} x {} overflows", n, t),
        }
    }

    /// Notified after pointer-bearing bytes of type `t` were written at `dst`.
    fn write_barrier(&self, _dst: *mut u8, _t: Type) {}

    fn stats(&self) -> HeapStats {
        HeapStats::default()
    }
}

/// Common base address for zero-sized allocations.
static ZERO_BASE: u64 = 0;

pub(crate) fn zero_base() -> *mut u8 {
    std::ptr::addr_of!(ZERO_BASE).cast::<u8>().cast_mut()
}

/// Zeroed, never-freed storage from the global allocator.
#[derive(Debug, Default)]
pub struct SystemHeap {
    allocations: AtomicU64,
    bytes: AtomicU64,
}

impl SystemHeap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Heap for SystemHeap {
    fn allocate_bytes(&self, size: usize, align: usize) -> *mut u8 {
        if size == 0 {
            return zero_base();
        }
        let align = align.clamp(1, MAX_ALIGN);
        let Ok(layout) = Layout::from_size_align(size, align) else {
            panic!("rtti: invalid allocation of {} bytes", size);
        };
        // SAFETY: layout has non-zero size.
        let p = unsafe { alloc_zeroed(layout) };
        if p.is_null() {
            std::alloc::handle_alloc_error(layout);
        }
        self.allocations.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(size as u64, Ordering::Relaxed);
        p
    }

    fn stats(&self) -> HeapStats {
        HeapStats {
            allocations: self.allocations.load(Ordering::Relaxed),
            live_bytes: self.bytes.load(Ordering::Relaxed),
        }
    }
}

fn cell() -> &'static ArcSwap<Box<dyn Heap>> {
    static HEAP: OnceLock<ArcSwap<Box<dyn Heap>>> = OnceLock::new();
    HEAP.get_or_init(|| ArcSwap::from_pointee(Box::new(SystemHeap::new()) as Box<dyn Heap>))
}

/// Replace the allocator hook. Storage obtained from the previous heap stays
/// valid.
pub fn install_heap(heap: Box<dyn Heap>) {
    log::debug!("[heap] installing allocator hook");
    cell().store(Arc::new(heap));
}

/// Run `f` against the current heap.
pub fn with_heap<R>(f: impl FnOnce(&dyn Heap) -> R) -> R {
    let guard = cell().load();
    f(&***guard)
}

/// Counters of the current heap.
#[must_use]
pub fn heap_stats() -> HeapStats {
    with_heap(|h| h.stats())
}

pub(crate) fn alloc(t: Type) -> *mut u8 {
    with_heap(|h| h.allocate(t))
}

pub(crate) fn alloc_array(t: Type, n: usize) -> *mut u8 {
    with_heap(|h| h.allocate_array(t, n))
}

pub(crate) fn alloc_bytes(size: usize) -> *mut u8 {
    with_heap(|h| h.allocate_bytes(size, 1))
}

// ---------------------------------------------------------------------------
// Layout-aware copies
// ---------------------------------------------------------------------------

/// Report a store of a value of type `t` at `dst`; pointer-free types are
/// not reported.
pub(crate) fn write_barrier(dst: *mut u8, t: Type) {
    if t.has_pointers() {
        with_heap(|h| h.write_barrier(dst, t));
    }
}

/// Copy one value of type `t` from `src` to `dst`.
///
/// # Safety
/// Both addresses must hold (or have room for) a value of type `t`.
pub(crate) unsafe fn typed_copy(t: Type, dst: *mut u8, src: *const u8) {
    if t.size() == 0 || std::ptr::eq(dst, src) {
        return;
    }
    std::ptr::copy(src, dst, t.size());
    write_barrier(dst, t);
}

/// Copy `n` consecutive values of type `t`; regions may overlap.
///
/// # Safety
/// Both ranges must be valid for `n` values of type `t`.
pub(crate) unsafe fn typed_copy_n(t: Type, dst: *mut u8, src: *const u8, n: usize) {
    let size = t.size() * n;
    if size == 0 || std::ptr::eq(dst, src) {
        return;
    }
    std::ptr::copy(src, dst, size);
    write_barrier(dst, t);
}

/// Overwrite the value of type `t` at `dst` with zeroes.
///
/// # Safety
/// `dst` must hold a value of type `t`.
pub(crate) unsafe fn typed_zero(t: Type, dst: *mut u8) {
    typed_zero_n(t, dst, 1);
}

/// Overwrite `n` consecutive values of type `t` at `dst` with zeroes.
///
/// # Safety
/// `dst` must hold `n` values of type `t`.
pub(crate) unsafe fn typed_zero_n(t: Type, dst: *mut u8, n: usize) {
    let size = t.size() * n;
    if size == 0 {
        return;
    }
    std::ptr::write_bytes(dst, 0, size);
    write_barrier(dst, t);
}

/// Move a runtime object to process-lifetime storage.
pub(crate) fn retain<T>(obj: T) -> &'static T {
    Box::leak(Box::new(obj))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{basic, Kind};

    #[test]
    fn test_system_heap_zeroes_and_counts() {
        let h = SystemHeap::new();
        let p = h.allocate(basic(Kind::Int64));
        assert_eq!(p as usize % 8, 0);
        assert_eq!(unsafe { *p.cast::<i64>() }, 0);
        let s = h.stats();
        assert_eq!(s.allocations, 1);
        assert_eq!(s.live_bytes, 8);
    }

    #[test]
    fn test_zero_size_uses_shared_base() {
        let h = SystemHeap::new();
        assert_eq!(h.allocate_bytes(0, 1), zero_base());
        assert_eq!(h.stats().allocations, 0);
    }

    #[test]
    fn test_typed_copy_moves_bytes() {
        let t = basic(Kind::Uint32);
        let src = 0xdead_beef_u32;
        let mut dst = 0u32;
        unsafe {
            typed_copy(
                t,
                std::ptr::addr_of_mut!(dst).cast(),
                std::ptr::addr_of!(src).cast(),
            );
        }
        assert_eq!(dst, 0xdead_beef);
    }
}
