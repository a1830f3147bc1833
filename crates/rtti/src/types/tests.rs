// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;
use crate::iface::value_of_native;
use crate::synth::{func_of, pointer_to, slice_of, StructFieldSpec};
use crate::value::{new, zero, Value};

#[test]
fn test_builtin_sizes_and_alignment() {
    assert_eq!(basic(Kind::Bool).size(), 1);
    assert_eq!(basic(Kind::Int16).align(), 2);
    assert_eq!(basic(Kind::Int).size(), std::mem::size_of::<usize>());
    assert_eq!(basic(Kind::Complex128).size(), 16);
    assert_eq!(basic(Kind::String).size(), 2 * std::mem::size_of::<usize>());
    assert_eq!(empty_interface().size(), 2 * std::mem::size_of::<usize>());
    assert!(basic(Kind::String).has_pointers());
    assert!(!basic(Kind::Float64).has_pointers());
}

#[test]
fn test_builtin_strings_resolve_in_table() {
    for name in ["int32", "string", "bool", "complex64", "interface {}"] {
        let found = lookup_by_string(name);
        assert_eq!(found.len(), 1, "lookup of {}", name);
        assert_eq!(found[0].string(), name);
    }
    assert!(lookup_by_string("no.SuchType").is_empty());
}

#[test]
fn test_builtins_are_unique_and_named() {
    assert_eq!(basic(Kind::Uint8), basic(Kind::Uint8));
    assert_eq!(basic(Kind::Uint8).name(), "uint8");
    assert_eq!(basic(Kind::Uint8).pkg_path(), "");
    assert_eq!(empty_interface().name(), "");
    assert_ne!(basic(Kind::Uint8), basic(Kind::Int8));
    assert!(contains(basic(Kind::Uintptr)));
}

#[test]
#[should_panic(expected = "rtti: call of Type::elem on int Value")]
fn test_kind_specific_accessor_on_wrong_kind_is_fatal() {
    let _ = basic(Kind::Int).elem();
}

#[test]
#[should_panic(expected = "rtti: Type::in_: index out of range [2] with length 2")]
fn test_func_param_index_out_of_range_is_fatal() {
    let f = func_of(&[basic(Kind::Int), basic(Kind::String)], &[], false);
    assert_eq!(f.in_(1), basic(Kind::String));
    let _ = f.in_(2);
}

#[test]
#[should_panic(expected = "rtti: Type::out: index out of range [0] with length 0")]
fn test_func_result_index_out_of_range_is_fatal() {
    let _ = func_of(&[], &[], false).out(0);
}

#[test]
fn test_comparability() {
    assert!(basic(Kind::String).comparable());
    assert!(!slice_of(basic(Kind::Int)).comparable());
    assert!(empty_interface().comparable());
}

#[test]
fn test_struct_tag_lookup() {
    let tag = StructTag::new(r#"json:"name,omitempty" xml:"n" empty:"""#);
    assert_eq!(tag.get("json"), "name,omitempty");
    assert_eq!(tag.get("xml"), "n");
    assert_eq!(tag.lookup("empty"), Some(String::new()));
    assert_eq!(tag.lookup("yaml"), None);
}

#[test]
fn test_builder_named_type_with_value_method() {
    let f64t = basic(Kind::Float64);
    let mut tb = TableBuilder::new("test.local/types_named");
    let meters = tb.named("Meters", f64t);
    let ret = func_of(&[], &[f64t], false);
    tb.method(meters, "Km", Receiver::Value, ret, |args| {
        vec![value_of_native(args[0].float() / 1000.0)]
    });
    let module = register_module(tb.finish());

    assert!(module.contains(meters));
    assert_eq!(meters.string(), "types_named.Meters");
    assert_eq!(meters.name(), "Meters");
    assert_eq!(meters.pkg_path(), "test.local/types_named");
    assert_eq!(lookup_by_string("types_named.Meters"), vec![meters]);

    assert_eq!(meters.num_method(), 1);
    let km = meters.method(0);
    assert_eq!(km.name, "Km");
    assert_eq!(km.typ.num_in(), 1);
    assert_eq!(km.typ.in_(0), meters);

    // *Meters gets the value method through a dereferencing wrapper.
    let pm = pointer_to(meters);
    assert_eq!(pm.num_method(), 1);
    assert_eq!(pm.method(0).typ.in_(0), pm);

    let p = new(meters);
    p.elem().set_float(2500.0);
    let out = p.method_by_name("Km").map(|m| m.call(&[]));
    assert_eq!(out.map(|o| o[0].float()), Some(2.5));
}

#[test]
fn test_pointer_methods_are_not_in_value_method_set() {
    let i64t = basic(Kind::Int64);
    let mut tb = TableBuilder::new("test.local/types_ptr");
    let counter = tb.named("Counter", i64t);
    let inc = func_of(&[], &[], false);
    tb.method(counter, "Inc", Receiver::Pointer, inc, |args| {
        let c = args[0].elem();
        c.set_int(c.int() + 1);
        vec![]
    });
    register_module(tb.finish());

    assert_eq!(counter.num_method(), 0);
    let pc = pointer_to(counter);
    assert_eq!(pc.num_method(), 1);

    let p = new(counter);
    p.method(0).call(&[]);
    p.method(0).call(&[]);
    assert_eq!(p.elem().int(), 2);
}

#[test]
fn test_unexported_methods_are_hidden() {
    let mut tb = TableBuilder::new("test.local/types_hidden");
    let t = tb.named("Thing", basic(Kind::Int));
    let sig = func_of(&[], &[], false);
    tb.method(t, "visible", Receiver::Value, sig, |_| vec![]);
    tb.method(t, "Visible", Receiver::Value, sig, |_| vec![]);
    register_module(tb.finish());

    assert_eq!(t.num_method(), 1);
    assert_eq!(t.method(0).name, "Visible");
    assert!(t.method_by_name("visible").is_none());
}

#[test]
fn test_methods_sorted_by_name() {
    let mut tb = TableBuilder::new("test.local/types_sorted");
    let t = tb.named("Sorted", basic(Kind::Int));
    let sig = func_of(&[], &[], false);
    for name in ["Zeta", "Alpha", "Mid"] {
        tb.method(t, name, Receiver::Value, sig, |_| vec![]);
    }
    register_module(tb.finish());
    let names: Vec<&str> = (0..t.num_method()).map(|i| t.method(i).name).collect();
    assert_eq!(names, ["Alpha", "Mid", "Zeta"]);
}

#[test]
fn test_named_struct_promotes_embedded_methods() {
    let strt = basic(Kind::String);
    let mut tb = TableBuilder::new("test.local/types_promote");
    let inner = tb.named_struct("Inner", &[StructFieldSpec::new("Name", strt)]);
    let sig = func_of(&[], &[strt], false);
    tb.method(inner, "Hello", Receiver::Value, sig, |args| {
        vec![value_of_native(format!("hello {}", args[0].field(0).string()))]
    });
    let outer = tb.named_struct(
        "Outer",
        &[
            StructFieldSpec::embed(inner),
            StructFieldSpec::new("N", basic(Kind::Int)),
        ],
    );
    register_module(tb.finish());

    assert_eq!(outer.num_method(), 1);
    let o = new(outer).elem();
    o.field(0).field(0).set_string("world");
    let out = o.method(0).call(&[]);
    assert_eq!(out[0].string(), "hello world");
}

#[test]
fn test_implements_and_assignable() {
    let strt = basic(Kind::String);
    let mut tb = TableBuilder::new("test.local/types_iface");
    let sig = func_of(&[], &[strt], false);
    let stringer = tb.named_interface("Stringer", &[("String", sig)]);
    let name = tb.named("Name", strt);
    tb.method(name, "String", Receiver::Value, sig, |args| vec![args[0].convert(basic(Kind::String))]);
    let other = tb.named("Other", strt);
    register_module(tb.finish());

    assert!(name.implements(stringer));
    assert!(!other.implements(stringer));
    assert!(pointer_to(name).implements(stringer));
    assert!(name.assignable_to(stringer));
    assert!(name.assignable_to(empty_interface()));
    assert!(!name.assignable_to(other));
    assert!(!name.assignable_to(strt));
    assert!(!strt.assignable_to(name));
    assert!(name.convertible_to(other));
}

#[test]
#[should_panic(expected = "method redeclared")]
fn test_duplicate_method_is_fatal() {
    let mut tb = TableBuilder::new("test.local/types_dup");
    let t = tb.named("Dup", basic(Kind::Int));
    let sig = func_of(&[], &[], false);
    tb.method(t, "M", Receiver::Value, sig, |_| vec![]);
    tb.method(t, "M", Receiver::Pointer, sig, |_| vec![]);
}

#[test]
fn test_zero_of_named_type_keeps_type() {
    let mut tb = TableBuilder::new("test.local/types_zero");
    let t = tb.named("Flags", basic(Kind::Uint16));
    register_module(tb.finish());
    let z: Value = zero(t);
    assert_eq!(z.typ(), t);
    assert_eq!(z.kind(), Kind::Uint16);
    assert_eq!(z.uint(), 0);
}
