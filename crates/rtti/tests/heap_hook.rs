// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Allocator hook behaviour. Kept to a single test: the heap is process-wide
//! and the counters would race with other tests in the same binary.

use rtti::heap::{self, Heap, HeapStats, SystemHeap};
use rtti::synth::{chan_of, map_of, pointer_to, slice_of, struct_of, StructFieldSpec};
use rtti::types::{basic, register_module, ChanDir, Kind, TableBuilder, Type};
use rtti::value::{make_chan, make_map, make_slice, new};
use rtti::value_of_native;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// System heap that also counts write barriers.
struct CountingHeap {
    inner: SystemHeap,
    barriers: Arc<AtomicU64>,
}

impl Heap for CountingHeap {
    fn allocate_bytes(&self, size: usize, align: usize) -> *mut u8 {
        self.inner.allocate_bytes(size, align)
    }

    fn write_barrier(&self, _dst: *mut u8, t: Type) {
        assert!(t.has_pointers(), "barrier for pointer-free {}", t);
        self.barriers.fetch_add(1, Ordering::Relaxed);
    }

    fn stats(&self) -> HeapStats {
        self.inner.stats()
    }
}

fn allocations() -> u64 {
    heap::heap_stats().allocations
}

/// Run `f` and return how many barriers it reported.
fn barriers_during(counter: &AtomicU64, f: impl FnOnce()) -> u64 {
    let before = counter.load(Ordering::Relaxed);
    f();
    counter.load(Ordering::Relaxed) - before
}

/// Every store of a pointer-bearing value is reported, whichever setter
/// performs it.
fn check_setter_barriers(counter: &AtomicU64) {
    let s = new(basic(Kind::String)).elem();
    assert_eq!(barriers_during(counter, || s.set_string("barrier")), 1);
    assert_eq!(s.string(), "barrier");

    let b = new(slice_of(basic(Kind::Uint8))).elem();
    assert_eq!(barriers_during(counter, || b.set_bytes(b"xyz")), 1);

    let up = new(basic(Kind::UnsafePointer)).elem();
    let target = new(basic(Kind::Int64)).unsafe_pointer();
    assert_eq!(barriers_during(counter, || up.set_pointer(target)), 1);
    assert_eq!(up.unsafe_pointer(), target);

    let words = new(slice_of(basic(Kind::String))).elem();
    assert!(barriers_during(counter, || words.grow(8)) >= 1);
    assert!(words.cap() >= 8);

    let ptrs = make_slice(slice_of(pointer_to(basic(Kind::Int64))), 3, 3);
    ptrs.index(1).set(new(basic(Kind::Int64)));
    assert_eq!(barriers_during(counter, || ptrs.clear()), 1);
    assert!(ptrs.index(1).is_nil());

    // Pointer-free slices are zeroed without a report.
    let nums = make_slice(slice_of(basic(Kind::Int64)), 4, 4);
    assert_eq!(barriers_during(counter, || nums.clear()), 0);
}

/// Map entries and channel buffers take their payload storage from the
/// installed heap.
fn check_container_storage(counter: &AtomicU64) {
    let strt = basic(Kind::String);
    let m = make_map(map_of(strt, strt));
    let before = allocations();
    let n = barriers_during(counter, || {
        m.set_map_index(value_of_native(String::from("k")), value_of_native(String::from("v")));
    });
    assert!(allocations() >= before + 2, "key and elem storage");
    assert!(n >= 2);

    // Overwriting an entry stores into its existing slot.
    let n = barriers_during(counter, || {
        m.set_map_index(value_of_native(String::from("k")), value_of_native(String::from("w")));
    });
    assert!(n >= 1);
    assert_eq!(m.len(), 1);
    let got = m.map_index(value_of_native(String::from("k")));
    assert_eq!(got.map(|v| v.string()), Some(String::from("w")));

    let c = make_chan(chan_of(ChanDir::Both, strt), 1);
    let before = allocations();
    let n = barriers_during(counter, || c.send(value_of_native(String::from("queued"))));
    assert!(allocations() > before);
    assert!(n >= 1);
    let (got, ok) = c.recv();
    assert!(ok);
    assert_eq!(got.string(), "queued");
}

#[test]
fn test_heap_hook_counts_allocations_and_barriers() {
    let barriers = Arc::new(AtomicU64::new(0));
    heap::install_heap(Box::new(CountingHeap {
        inner: SystemHeap::new(),
        barriers: Arc::clone(&barriers),
    }));
    assert_eq!(heap::heap_stats(), HeapStats::default());

    // Identical-layout conversion reuses the source storage.
    let mut tb = TableBuilder::new("test.local/heap_named");
    let level = tb.named("Level", basic(Kind::Int64));
    register_module(tb.finish());
    let v = value_of_native(0x41i64).convert(level);

    let before = allocations();
    let raw = v.convert(basic(Kind::Int64));
    assert_eq!(allocations(), before);
    assert_eq!(raw.int(), 0x41);

    // Numeric to text builds a new string.
    let text = v.convert(basic(Kind::String));
    assert!(allocations() > before);
    assert_eq!(text.string(), "A");

    // Writing pointer-bearing values goes through the barrier; scalars don't.
    let node = struct_of(&[
        StructFieldSpec::new("Next", pointer_to(basic(Kind::Int64))),
        StructFieldSpec::new("Weight", basic(Kind::Float64)),
    ]);
    let n = new(node).elem();
    let seen = barriers.load(Ordering::Relaxed);
    n.field(1).set_float(1.5);
    assert_eq!(barriers.load(Ordering::Relaxed), seen);
    n.field(0).set(new(basic(Kind::Int64)));
    assert!(barriers.load(Ordering::Relaxed) > seen);

    check_setter_barriers(&barriers);
    check_container_storage(&barriers);

    let stats = heap::heap_stats();
    assert!(stats.live_bytes >= stats.allocations);
}
