// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;
use crate::error::Error;
use crate::iface::{value_of, value_of_native};
use crate::synth::{array_of, chan_of, map_of, pointer_to, slice_of, struct_of, StructFieldSpec};
use crate::types::{basic, empty_interface, ChanDir, Kind};

fn ints(xs: &[i64]) -> Value {
    let s = make_slice(slice_of(basic(Kind::Int64)), xs.len(), xs.len());
    for (i, x) in xs.iter().enumerate() {
        s.index(i).set_int(*x);
    }
    s
}

fn collect_ints(s: Value) -> Vec<i64> {
    (0..s.len()).map(|i| s.index(i).int()).collect()
}

#[test]
fn test_new_set_and_pack_round_trip() {
    let p = new(basic(Kind::Int32));
    assert_eq!(p.kind(), Kind::Pointer);
    let v = p.elem();
    assert!(v.can_set());
    v.set_int(42);

    let back = value_of(v.interface());
    assert_eq!(back.typ(), basic(Kind::Int32));
    assert_eq!(back.int(), 42);
    assert!(!back.can_addr());
}

#[test]
fn test_field_addressability_follows_parent() {
    let t = struct_of(&[
        StructFieldSpec::new("Count", basic(Kind::Int)),
        StructFieldSpec::new("Name", basic(Kind::String)),
    ]);
    let addressable = new(t).elem();
    assert!(addressable.field(0).can_addr());
    assert!(addressable.field(1).can_set());

    let detached = zero(t);
    assert!(!detached.field(0).can_addr());
    assert!(matches!(
        detached.field(0).try_set(value_of_native(1isize)),
        Err(Error::NotAddressable { .. })
    ));
}

#[test]
fn test_array_and_slice_element_addressability() {
    let at = array_of(4, basic(Kind::Uint16));
    let arr = new(at).elem();
    assert!(arr.index(3).can_set());
    assert!(!zero(at).index(3).can_addr());

    // Slice elements live in the backing array, so they are addressable
    // even through a non-addressable slice handle.
    let s = ints(&[1, 2, 3]);
    assert!(!s.can_addr());
    assert!(s.index(0).can_set());
}

#[test]
fn test_unexported_field_is_read_only() {
    let inner = struct_of(&[StructFieldSpec::new("X", basic(Kind::Int))]);
    let outer = struct_of(&[
        StructFieldSpec::new("hidden", inner).with_pkg_path("test.local/value_ro"),
        StructFieldSpec::new("Shown", inner),
    ]);
    let o = new(outer).elem();
    o.field(1).field(0).set_int(5);
    assert_eq!(o.field(1).field(0).int(), 5);

    let x = o.field(0).field(0);
    assert_eq!(x.int(), 0);
    assert!(x.can_addr());
    assert!(!x.can_set());
    assert!(!x.can_interface());
    assert!(matches!(
        x.try_set(value_of_native(1isize)),
        Err(Error::ReadOnly { .. })
    ));
    assert!(matches!(x.try_interface(), Err(Error::ReadOnly { .. })));
}

#[test]
#[should_panic(expected = "using value obtained using unexported field")]
fn test_set_through_unexported_field_is_fatal() {
    let outer = struct_of(&[
        StructFieldSpec::new("secret", basic(Kind::Int)).with_pkg_path("test.local/value_fatal")
    ]);
    new(outer).elem().field(0).set_int(1);
}

#[test]
fn test_make_slice_len_cap_and_bounds() {
    let s = make_slice(slice_of(basic(Kind::Int32)), 3, 5);
    assert_eq!(s.len(), 3);
    assert_eq!(s.cap(), 5);
    assert_eq!(s.index(2).int(), 0);
    assert!(matches!(
        s.try_index(4),
        Err(Error::IndexOutOfRange { index: 4, len: 3, .. })
    ));

    let wide = s.slice(0, 5);
    assert_eq!(wide.len(), 5);
    wide.index(4).set_int(9);
    assert_eq!(s.slice3(1, 5, 5).index(3).int(), 9);
    assert!(matches!(s.try_slice3(0, 2, 6), Err(Error::SliceBounds { .. })));
}

#[test]
#[should_panic(expected = "index out of range [4] with length 3")]
fn test_index_past_len_is_fatal() {
    let s = make_slice(slice_of(basic(Kind::Int32)), 3, 5);
    let _ = s.index(4);
}

#[test]
fn test_string_index_and_slice() {
    let s = value_of_native(String::from("héllo"));
    assert_eq!(s.len(), 6);
    assert_eq!(s.index(0).uint(), u64::from(b'h'));
    assert!(!s.index(0).can_set());
    assert_eq!(s.slice(3, 6).string(), "llo");
    assert!(s.try_slice(4, 9).is_err());
}

#[test]
fn test_append_copy_and_append_slice() {
    let s = ints(&[1, 2]);
    let grown = append(s, &[value_of_native(3i64), value_of_native(4i64)]);
    assert_eq!(collect_ints(grown), vec![1, 2, 3, 4]);
    assert_eq!(collect_ints(s), vec![1, 2]);

    let joined = append_slice(grown, ints(&[5]));
    assert_eq!(collect_ints(joined), vec![1, 2, 3, 4, 5]);

    let dst = make_slice(slice_of(basic(Kind::Int64)), 3, 3);
    assert_eq!(copy(dst, joined), 3);
    assert_eq!(collect_ints(dst), vec![1, 2, 3]);

    let bytes = make_slice(slice_of(basic(Kind::Uint8)), 2, 2);
    assert_eq!(copy(bytes, value_of_native(String::from("xyz"))), 2);
    assert_eq!(bytes.bytes(), b"xy".to_vec());
}

/// Struct with an unexported `[]int64` field holding `[7]` with spare
/// capacity; returns the read-only field handle.
fn hidden_ints(pkg: &'static str) -> Value {
    let outer = struct_of(&[StructFieldSpec::new("hidden", slice_of(basic(Kind::Int64)))
        .with_pkg_path(pkg)]);
    let field = new(outer).elem().field(0);
    assert!(field.flag().is_read_only());
    // Seed through a writable alias of the same storage.
    let seed = Value::from_parts(field.typ(), field.ptr, field.flag.without(Flag::RO));
    let backing = make_slice(slice_of(basic(Kind::Int64)), 1, 4);
    backing.index(0).set_int(7);
    seed.set(backing);
    field
}

#[test]
#[should_panic(expected = "append using value obtained using unexported field")]
fn test_append_to_read_only_slice_is_fatal() {
    let hidden = hidden_ints("test.local/value_append_ro");
    let _ = append(hidden, &[]);
}

#[test]
fn test_read_only_slice_cannot_leak_through_append_or_copy() {
    use std::panic::{catch_unwind, AssertUnwindSafe};

    let hidden = hidden_ints("test.local/value_copy_ro");
    let dst = make_slice(slice_of(basic(Kind::Int64)), 1, 1);

    assert!(catch_unwind(AssertUnwindSafe(|| copy(dst, hidden))).is_err());
    assert!(catch_unwind(AssertUnwindSafe(|| append_slice(dst, hidden))).is_err());
    assert!(catch_unwind(AssertUnwindSafe(|| append(hidden, &[value_of_native(1i64)]))).is_err());

    assert_eq!(dst.index(0).int(), 0);
    assert_eq!(collect_ints(hidden), vec![7]);
    assert_eq!(hidden.cap(), 4);
}

#[test]
fn test_set_len_and_grow() {
    let p = new(slice_of(basic(Kind::Int64)));
    let s = p.elem();
    s.set(ints(&[7, 8, 9]));
    s.set_len(2);
    assert_eq!(collect_ints(s), vec![7, 8]);
    s.grow(10);
    assert!(s.cap() >= 12);
    assert_eq!(collect_ints(s), vec![7, 8]);
}

#[test]
fn test_empty_map_iteration_ends_immediately() {
    let m = make_map(map_of(basic(Kind::String), basic(Kind::Int)));
    assert_eq!(m.len(), 0);
    let mut it = m.map_range();
    assert!(!it.advance());
}

#[test]
fn test_map_set_get_delete() {
    let m = make_map(map_of(basic(Kind::String), basic(Kind::Int)));
    let key = |s: &str| value_of_native(String::from(s));
    m.set_map_index(key("a"), value_of_native(1isize));
    m.set_map_index(key("b"), value_of_native(2isize));
    m.set_map_index(key("a"), value_of_native(3isize));
    assert_eq!(m.len(), 2);
    assert_eq!(m.map_index(key("a")).map(|v| v.int()), Some(3));
    assert!(m.map_index(key("zzz")).is_none());

    let found = m.map_index(key("b")).map(|v| v.can_addr());
    assert_eq!(found, Some(false));

    let mut seen: Vec<(String, i64)> = Vec::new();
    let mut it = m.map_range();
    while it.advance() {
        seen.push((it.key().string(), it.value().int()));
    }
    seen.sort();
    assert_eq!(seen, vec![("a".into(), 3), ("b".into(), 2)]);

    m.set_map_index(key("a"), Value::invalid());
    assert_eq!(m.len(), 1);
    assert_eq!(m.map_keys().len(), 1);

    m.clear();
    assert_eq!(m.len(), 0);
}

#[test]
fn test_nil_map_reads_absent_and_rejects_writes() {
    let mt = map_of(basic(Kind::Int), basic(Kind::Int));
    let nil = zero(mt);
    assert!(nil.is_nil());
    assert!(nil.map_index(value_of_native(1isize)).is_none());
    assert!(matches!(
        nil.try_set_map_index(value_of_native(1isize), value_of_native(2isize)),
        Err(Error::NilMap)
    ));
}

#[test]
fn test_map_with_interface_keys() {
    let m = make_map(map_of(empty_interface(), basic(Kind::Bool)));
    m.set_map_index(value_of_native(1isize), value_of_native(true));
    m.set_map_index(value_of_native(String::from("1")), value_of_native(false));
    assert_eq!(m.len(), 2);
    assert_eq!(m.map_index(value_of_native(1isize)).map(|v| v.bool()), Some(true));
    assert!(m.map_index(value_of_native(1i64)).is_none());
}

#[test]
fn test_buffered_channel() {
    let c = make_chan(chan_of(ChanDir::Both, basic(Kind::Int)), 1);
    assert!(c.try_recv().is_none());
    assert!(c.try_send(value_of_native(7isize)));
    assert!(!c.try_send(value_of_native(8isize)));
    assert_eq!(c.len(), 1);
    assert_eq!(c.cap(), 1);

    let got = c.try_recv().map(|(v, ok)| (v.int(), ok));
    assert_eq!(got, Some((7, true)));

    c.send(value_of_native(9isize));
    c.close();
    let (v, ok) = c.recv();
    assert_eq!((v.int(), ok), (9, true));
    let (v, ok) = c.recv();
    assert_eq!((v.int(), ok), (0, false));
}

#[test]
fn test_unbuffered_channel_across_threads() {
    let c = make_chan(chan_of(ChanDir::Both, basic(Kind::Int64)), 0);
    let sender = std::thread::spawn(move || {
        for i in 0..3i64 {
            c.send(value_of_native(i));
        }
        c.close();
    });
    let mut got = Vec::new();
    loop {
        let (v, ok) = c.recv();
        if !ok {
            break;
        }
        got.push(v.int());
    }
    sender.join().expect("sender thread");
    assert_eq!(got, vec![0, 1, 2]);
}

#[test]
fn test_nil_channel_try_ops() {
    let nil = zero(chan_of(ChanDir::Both, basic(Kind::Int)));
    assert!(nil.is_nil());
    assert!(!nil.try_send(value_of_native(1isize)));
    assert!(nil.try_recv().is_none());
}

#[test]
#[should_panic(expected = "Value::recv using")]
fn test_recv_on_send_only_channel_is_fatal() {
    let c = make_chan(chan_of(ChanDir::Both, basic(Kind::Int)), 1);
    let send_only = c.convert(chan_of(ChanDir::Send, basic(Kind::Int)));
    let _ = send_only.recv();
}

#[test]
fn test_equal_and_deep_equal() {
    let a = value_of_native(3isize);
    assert!(a.equal(value_of_native(3isize)));
    assert!(!a.equal(value_of_native(3i64)));
    assert!(Value::invalid().equal(Value::invalid()));

    let x = ints(&[1, 2, 3]);
    let y = ints(&[1, 2, 3]);
    assert!(matches!(x.try_equal(y), Err(Error::NotComparable { .. })));
    assert!(deep_equal(x, y));
    assert!(!deep_equal(x, ints(&[1, 2])));
    assert!(!deep_equal(x, zero(slice_of(basic(Kind::Int64)))));

    assert!(!deep_equal(value_of_native(f64::NAN), value_of_native(f64::NAN)));

    let m1 = make_map(map_of(basic(Kind::Int), slice_of(basic(Kind::Int64))));
    let m2 = make_map(map_of(basic(Kind::Int), slice_of(basic(Kind::Int64))));
    m1.set_map_index(value_of_native(1isize), ints(&[4]));
    m2.set_map_index(value_of_native(1isize), ints(&[4]));
    assert!(deep_equal(m1, m2));
    m2.set_map_index(value_of_native(1isize), ints(&[5]));
    assert!(!deep_equal(m1, m2));
}

#[test]
fn test_deep_equal_terminates_on_cycles() {
    let node = struct_of(&[
        StructFieldSpec::new("Next", pointer_to(empty_interface())),
        StructFieldSpec::new("V", basic(Kind::Int)),
    ]);
    let a = new(node);
    let b = new(node);
    // Each node's Next points at an interface holding the node itself.
    for p in [a, b] {
        let boxed = new(empty_interface());
        boxed.elem().set(p);
        p.elem().field(0).set(boxed);
    }
    assert!(deep_equal(a, b));
}

#[test]
fn test_is_zero() {
    let t = struct_of(&[
        StructFieldSpec::new("F", basic(Kind::Float64)),
        StructFieldSpec::new("S", basic(Kind::String)),
    ]);
    let v = new(t).elem();
    assert!(v.is_zero());
    v.field(1).set_string("x");
    assert!(!v.is_zero());
    v.set_zero();
    assert!(v.is_zero());

    let neg_zero = value_of_native(-0.0f64);
    assert!(!neg_zero.is_zero());
    assert!(zero(pointer_to(t)).is_zero());
}

#[test]
fn test_overflow_checks() {
    let v = zero(basic(Kind::Int8));
    assert!(v.overflow_int(128));
    assert!(!v.overflow_int(-128));
    assert!(zero(basic(Kind::Uint16)).overflow_uint(1 << 16));
    assert!(zero(basic(Kind::Float32)).overflow_float(1e39));
    assert!(!zero(basic(Kind::Float64)).overflow_float(1e39));
}

#[test]
fn test_interface_elem_and_nil() {
    let p = new(empty_interface());
    let slot = p.elem();
    assert!(slot.is_nil());
    assert!(!slot.elem().is_valid());

    slot.set(value_of_native(String::from("boxed")));
    assert!(!slot.is_nil());
    assert_eq!(slot.elem().kind(), Kind::String);
    assert_eq!(slot.elem().string(), "boxed");
}

#[test]
fn test_pointer_to_array_len_and_indirect() {
    let p = new(array_of(3, basic(Kind::Bool)));
    assert_eq!(p.len(), 3);
    let arr = indirect(p);
    arr.index(1).set_bool(true);
    assert!(p.elem().index(1).bool());
    assert_eq!(indirect(arr).kind(), Kind::Array);
}

#[test]
#[should_panic(expected = "rtti: call of Value::int on string Value")]
fn test_wrong_kind_accessor_is_fatal() {
    let _ = value_of_native(String::from("nope")).int();
}
