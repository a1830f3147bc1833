// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::cast_possible_truncation)] // Random test data
#![allow(clippy::cast_possible_wrap)] // Random test data

//! Pack/unpack round trips for every kind, through both the direct and the
//! indirect container encodings.

use rtti::call::make_func;
use rtti::synth::{array_of, chan_of, func_of, map_of, pointer_to, slice_of, struct_of, StructFieldSpec};
use rtti::types::{basic, empty_interface, ChanDir, Kind, Type};
use rtti::value::{make_chan, make_map, make_slice, new};
use rtti::{deep_equal, value_of, value_of_native, Complex128, Complex64, Eface, Reflect, Value};

fn round_trip(v: Value) -> Value {
    let e = v.interface();
    assert_eq!(e.typ(), Some(v.typ()), "container type for {}", v.typ());
    let back = value_of(e);
    assert_eq!(back.typ(), v.typ());
    assert!(!back.can_addr());
    back
}

fn check(v: Value) {
    let back = round_trip(v);
    assert!(deep_equal(v, back), "round trip of {}", v.typ());
}

fn settable(t: Type) -> Value {
    new(t).elem()
}

#[test]
fn test_scalar_kinds_round_trip() {
    let mut rng = fastrand::Rng::with_seed(0x5eed);
    for _ in 0..32 {
        let n = rng.i64(..);
        for k in [Kind::Int, Kind::Int8, Kind::Int16, Kind::Int32, Kind::Int64] {
            let v = settable(basic(k));
            v.set_int((n << (64 - basic(k).size() * 8)) >> (64 - basic(k).size() * 8));
            check(v);
        }
        let u = rng.u64(..);
        for k in [Kind::Uint, Kind::Uint8, Kind::Uint16, Kind::Uint32, Kind::Uint64, Kind::Uintptr] {
            let v = settable(basic(k));
            v.set_uint(u & (u64::MAX >> (64 - basic(k).size() * 8)));
            check(v);
        }
        let f = rng.f64() * 1e6 - 5e5;
        let v = settable(basic(Kind::Float64));
        v.set_float(f);
        check(v);
        let v = settable(basic(Kind::Float32));
        v.set_float(f64::from(f as f32));
        check(v);
        let v = settable(basic(Kind::Complex128));
        v.set_complex(Complex128::new(f, -f));
        check(v);
        let v = settable(basic(Kind::Bool));
        v.set_bool(rng.bool());
        check(v);
    }
}

#[test]
fn test_string_and_slice_round_trip() {
    let s = settable(basic(Kind::String));
    s.set_string("round trip ✓");
    check(s);

    let xs = make_slice(slice_of(basic(Kind::Uint16)), 4, 8);
    for i in 0..4 {
        xs.index(i).set_uint(i as u64 * 1000);
    }
    let back = round_trip(xs);
    assert_eq!(back.len(), 4);
    assert_eq!(back.cap(), 8);
    // Both handles share the backing array.
    back.index(0).set_uint(7);
    assert_eq!(xs.index(0).uint(), 7);
}

#[test]
fn test_composite_kinds_round_trip() {
    let arr = settable(array_of(3, basic(Kind::Int8)));
    arr.index(2).set_int(-3);
    check(arr);

    let st = settable(struct_of(&[
        StructFieldSpec::new("Id", basic(Kind::Uint32)),
        StructFieldSpec::new("Tags", slice_of(basic(Kind::String))),
    ]));
    st.field(0).set_uint(9);
    st.field(1).set(value_of_native(vec![String::from("a"), String::from("b")]));
    check(st);

    let m = make_map(map_of(basic(Kind::String), basic(Kind::Float64)));
    m.set_map_index(value_of_native(String::from("half")), value_of_native(0.5f64));
    check(m);

    let c = make_chan(chan_of(ChanDir::Both, basic(Kind::Int)), 2);
    check(c);
}

#[test]
fn test_direct_encodings_round_trip() {
    let pint = pointer_to(basic(Kind::Int32));
    let p = new(basic(Kind::Int32));
    p.elem().set_int(5);
    let back = round_trip(p);
    assert_eq!(back.unsafe_pointer(), p.unsafe_pointer());
    assert_eq!(back.elem().int(), 5);

    // One pointer field or one pointer element keeps the direct encoding.
    let wrapped = settable(struct_of(&[StructFieldSpec::new("Ptr", pint)]));
    wrapped.field(0).set(p);
    let back = round_trip(wrapped);
    assert_eq!(back.field(0).elem().int(), 5);

    let single = settable(array_of(1, pint));
    single.index(0).set(p);
    let back = round_trip(single);
    assert_eq!(back.index(0).unsafe_pointer(), p.unsafe_pointer());

    let up = settable(basic(Kind::UnsafePointer));
    up.set_pointer(p.unsafe_pointer());
    let back = round_trip(up);
    assert_eq!(back.unsafe_pointer(), p.unsafe_pointer());

    let i64t = basic(Kind::Int64);
    let f = make_func(func_of(&[i64t], &[i64t], false), |args| {
        vec![value_of_native(-args[0].int())]
    });
    let back = round_trip(f);
    assert_eq!(back.unsafe_pointer(), f.unsafe_pointer());
    assert_eq!(back.call(&[value_of_native(4i64)])[0].int(), -4);
}

#[test]
fn test_interface_values_unwrap_on_pack() {
    let slot = settable(empty_interface());
    slot.set(value_of_native(12u8));
    // Packing an interface-typed handle yields its dynamic contents.
    let e = slot.interface();
    assert_eq!(e.typ(), Some(basic(Kind::Uint8)));
    assert_eq!(e.downcast::<u8>(), Some(12));

    let nil = settable(empty_interface());
    assert!(nil.interface().is_nil());
    assert!(!value_of(Eface::nil()).is_valid());
}

#[test]
fn test_native_bridge() {
    assert_eq!(i16::from_value(value_of_native(-7i16)), Some(-7));
    assert_eq!(i16::from_value(value_of_native(-7i32)), None);
    assert_eq!(
        Complex64::from_value(value_of_native(Complex64::new(1.0, 2.0))),
        Some(Complex64::new(1.0, 2.0))
    );
    assert_eq!(
        Vec::<String>::from_value(value_of_native(vec![String::from("x")])),
        Some(vec![String::from("x")])
    );
    assert_eq!(Eface::new(3usize).downcast::<usize>(), Some(3));
    assert_eq!(<Vec<u8> as Reflect>::rtti_type(), slice_of(basic(Kind::Uint8)));

    let boxed = Eface::new(String::from("inside")).into_value();
    assert_eq!(boxed.kind(), Kind::Interface);
    assert_eq!(boxed.elem().string(), "inside");
}
