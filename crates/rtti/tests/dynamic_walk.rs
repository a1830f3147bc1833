// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test code readability over pedantic

//! A small tag-driven encoder written against the value layer only, run over
//! types built at run time.

use rtti::synth::{map_of, pointer_to, slice_of, struct_of, StructFieldSpec};
use rtti::types::{basic, empty_interface, Kind};
use rtti::value::{make_map, new};
use rtti::{value_of_native, Value};
use std::fmt::Write;

fn encode(v: Value, out: &mut String) {
    match v.kind() {
        Kind::Invalid => out.push_str("null"),
        Kind::Bool => out.push_str(if v.bool() { "true" } else { "false" }),
        k if k.is_int() => {
            let _ = write!(out, "{}", v.int());
        }
        k if k.is_uint() => {
            let _ = write!(out, "{}", v.uint());
        }
        Kind::Float32 | Kind::Float64 => {
            let _ = write!(out, "{}", v.float());
        }
        Kind::String => {
            let _ = write!(out, "{:?}", v.string());
        }
        Kind::Pointer | Kind::Interface => {
            if v.is_nil() {
                out.push_str("null");
            } else {
                encode(v.elem(), out);
            }
        }
        Kind::Slice | Kind::Array => {
            out.push('[');
            for i in 0..v.len() {
                if i > 0 {
                    out.push(',');
                }
                encode(v.index(i), out);
            }
            out.push(']');
        }
        Kind::Map => {
            let mut entries: Vec<(String, Value)> = Vec::new();
            let mut it = v.map_range();
            while it.advance() {
                entries.push((it.key().string(), it.value()));
            }
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            out.push('{');
            for (i, (k, e)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                let _ = write!(out, "{:?}:", k);
                encode(e, out);
            }
            out.push('}');
        }
        Kind::Struct => {
            let t = v.typ();
            out.push('{');
            let mut first = true;
            for (i, f) in t.fields().enumerate() {
                let tag = f.tag.get("json");
                if tag == "-" || !f.is_exported() {
                    continue;
                }
                let mut parts = tag.split(',');
                let name = parts.next().filter(|n| !n.is_empty()).unwrap_or(f.name);
                let fv = v.field(i);
                if parts.any(|p| p == "omitempty") && fv.is_zero() {
                    continue;
                }
                if !first {
                    out.push(',');
                }
                first = false;
                let _ = write!(out, "{:?}:", name);
                encode(fv, out);
            }
            out.push('}');
        }
        k => panic!("cannot encode {}", k),
    }
}

fn to_json(v: Value) -> String {
    let mut s = String::new();
    encode(v, &mut s);
    s
}

#[test]
fn test_encode_runtime_built_struct() {
    let strt = basic(Kind::String);
    let address = struct_of(&[
        StructFieldSpec::new("Street", strt).with_tag(r#"json:"street""#),
        StructFieldSpec::new("Zip", basic(Kind::Uint32)).with_tag(r#"json:"zip,omitempty""#),
    ]);
    let person = struct_of(&[
        StructFieldSpec::new("Name", strt).with_tag(r#"json:"name""#),
        StructFieldSpec::new("Age", basic(Kind::Int16)),
        StructFieldSpec::new("Home", pointer_to(address)).with_tag(r#"json:"home""#),
        StructFieldSpec::new("Nicknames", slice_of(strt)).with_tag(r#"json:"nicks""#),
        StructFieldSpec::new("Scores", map_of(strt, basic(Kind::Float64)))
            .with_tag(r#"json:"scores""#),
        StructFieldSpec::new("Extra", empty_interface()).with_tag(r#"json:"extra""#),
        StructFieldSpec::new("Secret", strt).with_tag(r#"json:"-""#),
        StructFieldSpec::new("note", strt).with_pkg_path("test.local/walk"),
    ]);

    let p = new(person).elem();
    let named = |n: &str| p.field_by_name(n).unwrap_or_else(|| panic!("no field {}", n));
    named("Name").set_string("Ada");
    named("Age").set_int(36);
    named("Secret").set_string("hidden");

    let home = new(address);
    home.elem().field(0).set_string("1 Loop");
    p.field(2).set(home);

    p.field(3).set(value_of_native(vec![String::from("a"), String::from("b")]));

    let scores = make_map(map_of(strt, basic(Kind::Float64)));
    scores.set_map_index(value_of_native(String::from("math")), value_of_native(9.5f64));
    scores.set_map_index(value_of_native(String::from("art")), value_of_native(7.0f64));
    p.field(4).set(scores);

    p.field(5).set(value_of_native(true));

    assert_eq!(
        to_json(p),
        r#"{"name":"Ada","Age":36,"home":{"street":"1 Loop"},"nicks":["a","b"],"scores":{"art":7,"math":9.5},"extra":true}"#
    );

    // Clearing the pointer and interface encodes them as null.
    p.field(2).set_zero();
    p.field(5).set_zero();
    let s = to_json(p);
    assert!(s.contains(r#""home":null"#), "{}", s);
    assert!(s.contains(r#""extra":null"#), "{}", s);
}

#[test]
fn test_encode_nested_slices_of_structs() {
    let point = struct_of(&[
        StructFieldSpec::new("X", basic(Kind::Int32)),
        StructFieldSpec::new("Y", basic(Kind::Int32)),
    ]);
    let path = rtti::value::make_slice(slice_of(point), 2, 2);
    for i in 0..2 {
        let pt = path.index(i);
        pt.field(0).set_int(i as i64);
        pt.field(1).set_int(-(i as i64));
    }
    assert_eq!(to_json(path), r#"[{"X":0,"Y":0},{"X":1,"Y":-1}]"#);
}
