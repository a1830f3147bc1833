// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test code readability over pedantic
#![allow(clippy::float_cmp)] // Test assertions with constants
#![allow(clippy::cast_possible_truncation)] // Test parameters

//! End-to-end checks of layout, handles, synthesis and conversion through
//! the public API only.

use rtti::convert::{select_converter, Converter};
use rtti::layout::align_up;
use rtti::synth::{func_of, map_of, slice_of, struct_of, StructFieldSpec};
use rtti::types::{basic, register_module, Kind, TableBuilder};
use rtti::value::{make_map, make_slice, new};
use rtti::{value_of, value_of_native, Error, Value};
use std::panic::AssertUnwindSafe;

const WORD: usize = std::mem::size_of::<usize>();

#[test]
fn test_struct_int32_string_layout() {
    let t = struct_of(&[
        StructFieldSpec::new("A", basic(Kind::Int32)),
        StructFieldSpec::new("B", basic(Kind::String)),
    ]);
    let header = basic(Kind::String);
    assert_eq!(header.size(), 2 * WORD);
    assert_eq!(t.size(), align_up(4 + header.size(), WORD));
    assert_eq!(t.field(1).offset, align_up(4, header.align()));
    assert_eq!(t.field_by_name("B").map(|f| f.offset), Some(WORD));
}

#[test]
fn test_new_set_pack_unpack_int32() {
    let p = new(basic(Kind::Int32));
    p.elem().set(value_of_native(42i32));
    let e = p.elem().interface();
    assert_eq!(e.typ(), Some(basic(Kind::Int32)));
    assert_eq!(e.downcast::<i32>(), Some(42));

    let v = value_of(e);
    assert_eq!(v.kind(), Kind::Int32);
    assert_eq!(v.int(), 42);
}

#[test]
fn test_view_len_cap_and_index() {
    let v = make_slice(slice_of(basic(Kind::Int32)), 3, 5);
    assert_eq!(v.len(), 3);
    assert_eq!(v.cap(), 5);
    assert!(v.try_index(2).is_ok());
    assert!(matches!(
        v.try_index(4),
        Err(Error::IndexOutOfRange { index: 4, len: 3, .. })
    ));
    let fatal = std::panic::catch_unwind(AssertUnwindSafe(|| v.index(4)));
    assert!(fatal.is_err());
}

#[test]
fn test_empty_map_cursor() {
    let m = make_map(map_of(basic(Kind::Int64), basic(Kind::String)));
    let mut it = m.map_range();
    assert!(!it.advance());
    assert!(!it.advance());
}

#[test]
fn test_function_type_synthesized_twice() {
    let i32t = basic(Kind::Int32);
    let a = func_of(&[i32t], &[i32t], false);
    let b = func_of(&[i32t], &[i32t], false);
    assert_eq!(a, b);
    assert_eq!(a.addr(), b.addr());
    assert_eq!(a.string(), "func(int32) int32");
}

#[test]
fn test_named_integer_conversions() {
    let mut tb = TableBuilder::new("test.local/scenario_named");
    let code = tb.named("Code", basic(Kind::Int32));
    register_module(tb.finish());

    let v = value_of_native(0x263a_i32).convert(code);
    assert_eq!(v.typ(), code);

    // Direct reinterpretation allocates nothing. The heap counters are
    // process-wide, so that is asserted in tests/heap_hook.rs.
    assert_eq!(select_converter(code, basic(Kind::Int32)), Some(Converter::Direct));
    let raw = v.convert(basic(Kind::Int32));
    assert_eq!(raw.int(), 0x263a);

    assert_eq!(select_converter(code, basic(Kind::String)), Some(Converter::IntToString));
    let text = v.convert(basic(Kind::String));
    assert_eq!(text.string(), "\u{263a}");
}

#[test]
fn test_reordered_fields_are_a_different_type() {
    let a = StructFieldSpec::new("Left", basic(Kind::Uint8));
    let b = StructFieldSpec::new("Right", basic(Kind::Uint8));
    let ab = struct_of(&[a.clone(), b.clone()]);
    assert_eq!(ab, struct_of(&[a.clone(), b.clone()]));
    assert_ne!(ab, struct_of(&[b, a]));
}

#[test]
fn test_read_only_provenance_blocks_set_and_pack() {
    let inner = struct_of(&[StructFieldSpec::new("Visible", basic(Kind::Int))]);
    let outer = struct_of(&[
        StructFieldSpec::new("private", inner).with_pkg_path("test.local/scenario_ro")
    ]);
    let field = new(outer).elem().field(0).field(0);
    assert_eq!(field.int(), 0);
    assert!(field.flag().is_read_only());
    assert!(matches!(
        field.try_set(value_of_native(1isize)),
        Err(Error::ReadOnly { .. })
    ));
    assert!(!field.can_interface());
    assert!(field.try_interface().is_err());
}

#[test]
fn test_zero_handle_is_fatal_to_use() {
    let z = Value::invalid();
    assert!(!z.is_valid());
    assert_eq!(z.kind(), Kind::Invalid);
    assert!(matches!(z.try_typ(), Err(Error::UsageOnZeroValue { .. })));
    assert!(std::panic::catch_unwind(AssertUnwindSafe(|| z.typ())).is_err());
}
