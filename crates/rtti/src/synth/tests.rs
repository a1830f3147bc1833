// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;
use crate::config::WORD_SIZE;
use crate::error::Error;
use crate::types::{basic, empty_interface, register_module, ChanDir, Kind, TableBuilder};

fn int() -> crate::types::Type {
    basic(Kind::Int)
}

#[test]
fn test_struct_of_layout_and_string() {
    let t = struct_of(&[
        StructFieldSpec::new("A", basic(Kind::Int8)),
        StructFieldSpec::new("B", basic(Kind::Int64)),
        StructFieldSpec::new("C", basic(Kind::Int8)),
    ]);
    assert_eq!(t.kind(), Kind::Struct);
    assert_eq!(t.string(), "struct { A int8; B int64; C int8 }");
    let offsets: Vec<usize> = t.fields().map(|f| f.offset).collect();
    assert_eq!(offsets, vec![0, 8, 16]);
    assert_eq!(t.size(), 24);
    assert_eq!(t.align(), 8);
    assert!(t.comparable());
    assert!(!t.is_named());
}

#[test]
fn test_struct_of_is_canonical() {
    let spec = [
        StructFieldSpec::new("Canon", basic(Kind::Uint32)),
        StructFieldSpec::new("Label", basic(Kind::String)).with_tag(r#"json:"label""#),
    ];
    let a = struct_of(&spec);
    let b = struct_of(&spec.clone());
    assert_eq!(a, b);
    assert_eq!(a.addr(), b.addr());
    assert_eq!(a.field(1).tag.get("json"), "label");
    assert_eq!(a.string(), r#"struct { Canon uint32; Label string "json:\"label\"" }"#);
}

#[test]
fn test_struct_of_field_order_and_tags_matter() {
    let x = StructFieldSpec::new("OrdX", int());
    let y = StructFieldSpec::new("OrdY", basic(Kind::Bool));
    let xy = struct_of(&[x.clone(), y.clone()]);
    let yx = struct_of(&[y.clone(), x.clone()]);
    assert_ne!(xy, yx);

    let tagged = struct_of(&[x.with_tag("k:\"v\""), y]);
    assert_ne!(xy, tagged);
}

#[test]
fn test_struct_of_trailing_zero_size_field_is_padded() {
    let t = struct_of(&[
        StructFieldSpec::new("P", pointer_to(int())),
        StructFieldSpec::new("Z", struct_of(&[])),
    ]);
    assert_eq!(t.field(1).offset, WORD_SIZE);
    assert_eq!(t.size(), 2 * WORD_SIZE);
    assert_eq!(t.pointer_words(), vec![true]);
}

#[test]
fn test_struct_of_rejects_illegal_shapes() {
    let dup = try_struct_of(&[
        StructFieldSpec::new("Same", int()),
        StructFieldSpec::new("Same", int()),
    ]);
    assert!(matches!(dup, Err(Error::IllegalShape { op: "struct_of", .. })));

    let unexported = try_struct_of(&[StructFieldSpec::new("hidden", int())]);
    assert!(matches!(unexported, Err(Error::IllegalShape { .. })));

    let ok = try_struct_of(&[
        StructFieldSpec::new("hidden", int()).with_pkg_path("test.local/synth_hidden")
    ]);
    let t = ok.expect("unexported field with package path");
    assert_eq!(t.struct_pkg_path(), "test.local/synth_hidden");
    assert!(!t.field(0).is_exported());

    let mixed = try_struct_of(&[
        StructFieldSpec::new("a", int()).with_pkg_path("test.local/one"),
        StructFieldSpec::new("b", int()).with_pkg_path("test.local/two"),
    ]);
    assert!(mixed.is_err());

    // An embedded builtin takes its lower-case type name, so it needs a package.
    assert!(try_struct_of(&[StructFieldSpec::embed(int())]).is_err());

    let bad_embed = try_struct_of(&[StructFieldSpec::embed(slice_of(int()))]);
    assert!(bad_embed.is_err());

    let bad_name = try_struct_of(&[StructFieldSpec::new("1st", int())]);
    assert!(bad_name.is_err());
}

#[test]
#[should_panic(expected = "duplicate field")]
fn test_struct_of_duplicate_field_is_fatal() {
    let _ = struct_of(&[
        StructFieldSpec::new("Twice", int()),
        StructFieldSpec::new("Twice", int()),
    ]);
}

#[test]
fn test_func_of_is_canonical() {
    let strt = basic(Kind::String);
    let f = func_of(&[int(), strt], &[basic(Kind::Bool)], false);
    let g = func_of(&[int(), strt], &[basic(Kind::Bool)], false);
    assert_eq!(f, g);
    assert_eq!(f.string(), "func(int, string) bool");
    assert_eq!(f.num_in(), 2);
    assert_eq!(f.out(0), basic(Kind::Bool));
    assert!(!f.comparable());

    let v = func_of(&[strt, slice_of(int())], &[int(), strt], true);
    assert_eq!(v.string(), "func(string, ...int) (int, string)");
    assert!(v.is_variadic());
    assert_ne!(v, func_of(&[strt, slice_of(int())], &[int(), strt], false));
}

#[test]
fn test_func_of_variadic_needs_trailing_slice() {
    let err = try_func_of(&[int()], &[], true);
    assert!(matches!(err, Err(Error::IllegalShape { op: "func_of", .. })));
    assert!(try_func_of(&[], &[], true).is_err());
}

#[test]
fn test_composite_constructors_are_canonical() {
    let i16t = basic(Kind::Int16);
    assert_eq!(pointer_to(i16t), pointer_to(i16t));
    assert_eq!(pointer_to(i16t).elem(), i16t);
    assert_eq!(slice_of(i16t), slice_of(i16t));
    assert_eq!(array_of(3, i16t), array_of(3, i16t));
    assert_ne!(array_of(3, i16t), array_of(4, i16t));
    assert_eq!(array_of(3, i16t).size(), 6);
    assert_eq!(map_of(basic(Kind::String), i16t).string(), "map[string]int16");
    assert_eq!(chan_of(ChanDir::Recv, i16t).string(), "<-chan int16");
    assert_eq!(chan_of(ChanDir::Send, i16t).string(), "chan<- int16");
    assert_ne!(chan_of(ChanDir::Both, i16t), chan_of(ChanDir::Recv, i16t));

    let inner = chan_of(ChanDir::Recv, i16t);
    assert_eq!(chan_of(ChanDir::Both, inner).string(), "chan (<-chan int16)");
}

#[test]
fn test_map_of_incomparable_key_is_illegal() {
    let err = try_map_of(slice_of(int()), int());
    assert!(matches!(err, Err(Error::IllegalShape { op: "map_of", .. })));
    assert!(try_map_of(empty_interface(), int()).is_ok());
}

#[test]
fn test_array_of_too_large_is_illegal() {
    let big = array_of(1 << 20, basic(Kind::Int64));
    assert!(try_array_of(usize::MAX / 2, big).is_err());
}

#[test]
fn test_large_pointer_array_uses_gc_program() {
    let pint = pointer_to(basic(Kind::Int32));
    let n = crate::config::runtime().max_mask_words() + 16;
    let t = array_of(n, pint);
    assert!(t.gc_data().is_program());
    let words = t.pointer_words();
    assert_eq!(words.len(), n);
    assert!(words.iter().all(|w| *w));

    let small = array_of(4, pint);
    assert!(!small.gc_data().is_program());
    assert_eq!(small.pointer_words(), vec![true; 4]);
}

#[test]
fn test_concurrent_synthesis_returns_one_descriptor() {
    let spec = vec![
        StructFieldSpec::new("Racer", basic(Kind::Uint64)),
        StructFieldSpec::new("Lane", basic(Kind::Int8)),
    ];
    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                s.spawn(|| {
                    let f = func_of(&[basic(Kind::Uint64)], &[basic(Kind::Int8)], false);
                    (struct_of(&spec), f)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("synthesis thread"))
            .collect()
    });
    let (first_s, first_f) = results[0];
    assert!(results.iter().all(|(s, f)| *s == first_s && *f == first_f));
}

#[test]
fn test_compiled_in_descriptor_is_reused() {
    let mut tb = TableBuilder::new("test.local/synth_table");
    let emitted = tb.struct_type(&[StructFieldSpec::new("TableOnly", basic(Kind::Int16))]);
    let pt = tb.named("Point", int());
    let emitted_slice = tb.slice_type(pt);
    register_module(tb.finish());

    let before = cache_stats();
    let synthesized = struct_of(&[StructFieldSpec::new("TableOnly", basic(Kind::Int16))]);
    assert_eq!(synthesized, emitted);
    assert_eq!(slice_of(pt), emitted_slice);
    let after = cache_stats();
    assert!(after.table_hits >= before.table_hits + 2);
}

#[test]
fn test_cache_stats_count_hits() {
    let t = struct_of(&[StructFieldSpec::new("Counted", basic(Kind::Float32))]);
    let before = cache_stats();
    for _ in 0..3 {
        assert_eq!(
            struct_of(&[StructFieldSpec::new("Counted", basic(Kind::Float32))]),
            t
        );
    }
    let after = cache_stats();
    assert!(after.hits >= before.hits + 3);
    assert!(after.entries >= 1);
}

#[test]
fn test_shape_hash_display() {
    let h = ShapeHash::compute(b"");
    assert_eq!(h.to_string(), "d41d8cd98f00b204e9800998ecf8427e");
    assert_eq!(h.as_bytes().len(), 16);
}

#[test]
fn test_embedded_methods_promote_through_struct_of() {
    use crate::iface::value_of_native;
    use crate::types::Receiver;
    use crate::value::new;

    let mut tb = TableBuilder::new("test.local/synth_promote");
    let celsius = tb.named("Celsius", basic(Kind::Float64));
    let sig = func_of(&[], &[basic(Kind::Float64)], false);
    tb.method(celsius, "Fahrenheit", Receiver::Value, sig, |args| {
        vec![value_of_native(args[0].float() * 9.0 / 5.0 + 32.0)]
    });
    register_module(tb.finish());

    let reading = struct_of(&[
        StructFieldSpec::embed(celsius),
        StructFieldSpec::new("Station", basic(Kind::String)),
    ]);
    assert_eq!(reading.num_method(), 1);
    assert_eq!(reading.method(0).name, "Fahrenheit");

    let r = new(reading).elem();
    r.field(0).set_float(100.0);
    let out = r.method_by_name("Fahrenheit").map(|m| m.call(&[]));
    assert_eq!(out.map(|o| o[0].float()), Some(212.0));
}

#[test]
fn test_pointer_to_promoting_struct_carries_pointer_methods() {
    use crate::error::OrRaise;
    use crate::iface::value_of_native;
    use crate::types::Receiver;
    use crate::value::new;

    let f64t = basic(Kind::Float64);
    let mut tb = TableBuilder::new("test.local/synth_promote_ptr");
    let kelvin = tb.named("Kelvin", f64t);
    tb.method(kelvin, "Celsius", Receiver::Value, func_of(&[], &[f64t], false), |args| {
        vec![value_of_native(args[0].float() - 273.15)]
    });
    tb.method(kelvin, "Warm", Receiver::Pointer, func_of(&[f64t], &[], false), |args| {
        let k = args[0].elem();
        k.set_float(k.float() + args[1].float());
        Vec::new()
    });
    register_module(tb.finish());
    let has_celsius = interface_of(&[MethodSpec {
        name: "Celsius",
        pkg_path: "",
        typ: func_of(&[], &[f64t], false),
    }])
    .or_raise();

    let reading = struct_of(&[
        StructFieldSpec::embed(kelvin),
        StructFieldSpec::new("Label", basic(Kind::String)),
    ]);
    let preading = pointer_to(reading);
    assert_eq!(reading.num_method(), 1);
    assert_eq!(preading.num_method(), 2);
    assert!(reading.method_by_name("Warm").is_none());
    assert!(preading.method_by_name("Warm").is_some());
    assert_eq!(pointer_to(reading), preading);
    assert!(reading.implements(has_celsius));
    assert!(preading.implements(has_celsius));

    let p = new(reading);
    assert_eq!(p.typ(), preading);
    p.elem().field(0).set_float(300.0);
    let warm = p.method_by_name("Warm").map(|m| m.call(&[value_of_native(10.0f64)]));
    assert!(warm.is_some());
    assert_eq!(p.elem().field(0).float(), 310.0);

    let c = p.method_by_name("Celsius").map(|m| m.call(&[]));
    let c = c.map(|o| o[0].float()).unwrap_or(f64::NAN);
    assert!((c - 36.85).abs() < 1e-9, "{}", c);
}
