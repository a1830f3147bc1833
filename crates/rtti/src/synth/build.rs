// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Descriptor constructors shared by runtime synthesis and the table builder.
//!
//! Each `new_*` function lays the type out, picks its GC encoding, renders
//! its canonical string and leaks the finished record. None of them consult
//! a cache; canonicalization is the caller's job.

use crate::config::{runtime, MAX_TYPE_SIZE, WORD_SIZE};
use crate::error::{Error, Result};
use crate::layout::{words, GcData, GcProgBuilder, PtrMask, StructLayout};
use crate::types::alg;
use crate::types::rtype::{
    fnv1a, method_order, FieldDesc, IMethod, RType, TFlag, TypeExt, Uncommon,
};
use crate::types::{ChanDir, EqualFn, Kind, Type};
use std::fmt::Write as _;
use std::sync::OnceLock;

const PTR_MASK: GcData = GcData::Mask(&[0b1]);
const IFACE_MASK: GcData = GcData::Mask(&[0b11]);

pub(crate) fn leak_str(s: impl Into<String>) -> &'static str {
    Box::leak(s.into().into_boxed_str())
}

pub(crate) fn leak_slice<T>(v: Vec<T>) -> &'static [T] {
    Box::leak(v.into_boxed_slice())
}

pub(crate) fn publish(r: RType) -> Type {
    Type::from_static(Box::leak(Box::new(r)))
}

fn leak_uncommon(pkg_path: &str, name: &str) -> &'static Uncommon {
    Box::leak(Box::new(Uncommon {
        pkg_path: leak_str(pkg_path),
        name: leak_str(name),
        methods: OnceLock::new(),
    }))
}

/// Record for a one-word, pointer-shaped kind.
fn pointer_shaped(kind: Kind, s: String, equal: Option<EqualFn>, ext: TypeExt) -> RType {
    let regular = if equal.is_some() {
        TFlag::REGULAR_MEMORY
    } else {
        TFlag::NONE
    };
    RType {
        size: WORD_SIZE,
        ptrdata: WORD_SIZE,
        hash: fnv1a(&s),
        tflag: TFlag::DIRECT_IFACE.union(regular),
        align: WORD_SIZE as u8,
        field_align: WORD_SIZE as u8,
        kind,
        equal,
        gcdata: PTR_MASK,
        str: leak_str(s),
        ptr_to_this: OnceLock::new(),
        uncommon: None,
        ext,
    }
}

// ---------------------------------------------------------------------------
// GC encoding
// ---------------------------------------------------------------------------

/// Pointer encoding for components placed at byte offsets.
pub(crate) fn gc_for_parts(ptrdata: usize, parts: &[(Type, usize)]) -> GcData {
    if ptrdata == 0 {
        return GcData::Empty;
    }
    let nwords = words(ptrdata);
    if nwords <= runtime().max_mask_words() {
        let mut mask = PtrMask::with_words(nwords);
        for (t, off) in parts {
            mask.append_type(*t, off / WORD_SIZE);
        }
        GcData::Mask(leak_slice(mask.into_bytes()))
    } else {
        let mut prog = GcProgBuilder::new();
        for (t, off) in parts {
            prog.append_type(*t, off / WORD_SIZE);
        }
        GcData::Program(leak_slice(prog.finish()))
    }
}

fn gc_for_array(elem: Type, len: usize, ptrdata: usize) -> GcData {
    if ptrdata == 0 {
        return GcData::Empty;
    }
    let nwords = words(ptrdata);
    let ew = elem.size() / WORD_SIZE;
    if nwords <= runtime().max_mask_words() {
        let mut mask = PtrMask::with_words(nwords);
        for i in 0..len {
            mask.append_type(elem, i * ew);
        }
        GcData::Mask(leak_slice(mask.into_bytes()))
    } else {
        let mut prog = GcProgBuilder::new();
        prog.append_type(elem, 0);
        if len > 1 {
            prog.pad_to(ew);
            prog.repeat(ew, len - 1);
        }
        GcData::Program(leak_slice(prog.finish()))
    }
}

// ---------------------------------------------------------------------------
// Canonical strings
// ---------------------------------------------------------------------------

pub(crate) fn pointer_string(elem: Type) -> String {
    format!("*{}", elem)
}

pub(crate) fn slice_string(elem: Type) -> String {
    format!("[]{}", elem)
}

pub(crate) fn array_string(elem: Type, len: usize) -> String {
    format!("[{}]{}", len, elem)
}

pub(crate) fn map_string(key: Type, elem: Type) -> String {
    format!("map[{}]{}", key, elem)
}

pub(crate) fn chan_string(dir: ChanDir, elem: Type) -> String {
    // `chan (<-chan T)` keeps the inner arrow from binding to the outer chan.
    if dir == ChanDir::Both
        && elem.kind() == Kind::Chan
        && !elem.is_named()
        && elem.chan_dir() == ChanDir::Recv
    {
        return format!("chan ({})", elem);
    }
    format!("{} {}", dir, elem)
}

fn signature(ins: &[Type], outs: &[Type], variadic: bool) -> String {
    let mut s = String::from("(");
    for (i, t) in ins.iter().enumerate() {
        if i > 0 {
            s.push_str(", ");
        }
        if variadic && i == ins.len() - 1 && t.kind() == Kind::Slice {
            let _ = write!(s, "...{}", t.elem());
        } else {
            s.push_str(t.string());
        }
    }
    s.push(')');
    match outs {
        [] => {}
        [one] => {
            let _ = write!(s, " {}", one);
        }
        many => {
            s.push_str(" (");
            for (i, t) in many.iter().enumerate() {
                if i > 0 {
                    s.push_str(", ");
                }
                s.push_str(t.string());
            }
            s.push(')');
        }
    }
    s
}

pub(crate) fn func_string(ins: &[Type], outs: &[Type], variadic: bool) -> String {
    format!("func{}", signature(ins, outs, variadic))
}

pub(crate) fn interface_string<'a>(
    methods: impl IntoIterator<Item = (&'a str, Type)>,
) -> String {
    let body: Vec<String> = methods
        .into_iter()
        .map(|(name, typ)| {
            let sig = typ.string().strip_prefix("func").unwrap_or(typ.string());
            format!("{}{}", name, sig)
        })
        .collect();
    if body.is_empty() {
        return "interface {}".to_owned();
    }
    format!("interface {{ {} }}", body.join("; "))
}

pub(crate) fn struct_string(fields: &[FieldSpecRef<'_>]) -> String {
    if fields.is_empty() {
        return "struct {}".to_owned();
    }
    let body: Vec<String> = fields
        .iter()
        .map(|f| {
            let mut s = if f.embedded {
                f.typ.string().to_owned()
            } else {
                format!("{} {}", f.name, f.typ)
            };
            if !f.tag.is_empty() {
                let _ = write!(s, " {:?}", f.tag);
            }
            s
        })
        .collect();
    format!("struct {{ {} }}", body.join("; "))
}

/// Last element of a package path, used as the qualifier in named types.
pub(crate) fn package_name(pkg_path: &str) -> &str {
    pkg_path.rsplit('/').next().unwrap_or(pkg_path)
}

// ---------------------------------------------------------------------------
// Constructors
// ---------------------------------------------------------------------------

pub(crate) fn new_pointer(elem: Type, uncommon: Option<&'static Uncommon>) -> Type {
    let mut r = pointer_shaped(
        Kind::Pointer,
        pointer_string(elem),
        Some(alg::mem_equal),
        TypeExt::Pointer { elem },
    );
    r.uncommon = uncommon;
    publish(r)
}

pub(crate) fn new_slice(elem: Type) -> Type {
    let s = slice_string(elem);
    publish(RType {
        size: 3 * WORD_SIZE,
        ptrdata: WORD_SIZE,
        hash: fnv1a(&s),
        tflag: TFlag::NONE,
        align: WORD_SIZE as u8,
        field_align: WORD_SIZE as u8,
        kind: Kind::Slice,
        equal: None,
        gcdata: PTR_MASK,
        str: leak_str(s),
        ptr_to_this: OnceLock::new(),
        uncommon: None,
        ext: TypeExt::Slice { elem },
    })
}

pub(crate) fn new_array(elem: Type, len: usize) -> Result<Type> {
    let size = elem
        .size()
        .checked_mul(len)
        .filter(|s| *s <= MAX_TYPE_SIZE)
        .ok_or_else(|| Error::IllegalShape {
            op: "array_of",
            reason: format!("[{}]{} is too large", len, elem),
        })?;
    let ptrdata = if len == 0 || elem.ptrdata() == 0 {
        0
    } else {
        (len - 1) * elem.size() + elem.ptrdata()
    };

    let mut tflag = TFlag::NONE;
    if elem.regular_memory() {
        tflag = tflag.union(TFlag::REGULAR_MEMORY);
    }
    if len == 1 && elem.is_direct_iface() {
        tflag = tflag.union(TFlag::DIRECT_IFACE);
    }
    let equal: Option<EqualFn> = match elem.rtype().equal {
        None => None,
        Some(_) if elem.regular_memory() => Some(alg::mem_equal),
        Some(_) => Some(alg::array_equal),
    };

    let s = array_string(elem, len);
    Ok(publish(RType {
        size,
        ptrdata,
        hash: fnv1a(&s),
        tflag,
        align: elem.rtype().align,
        field_align: elem.rtype().field_align,
        kind: Kind::Array,
        equal,
        gcdata: gc_for_array(elem, len, ptrdata),
        str: leak_str(s),
        ptr_to_this: OnceLock::new(),
        uncommon: None,
        ext: TypeExt::Array { elem, len },
    }))
}

pub(crate) fn new_map(key: Type, elem: Type) -> Result<Type> {
    if !key.comparable() {
        return Err(Error::IllegalShape {
            op: "map_of",
            reason: format!("invalid key type {}", key),
        });
    }
    Ok(publish(pointer_shaped(
        Kind::Map,
        map_string(key, elem),
        None,
        TypeExt::Map {
            key,
            elem,
            hasher: alg::typehash,
        },
    )))
}

pub(crate) fn new_chan(dir: ChanDir, elem: Type) -> Type {
    publish(pointer_shaped(
        Kind::Chan,
        chan_string(dir, elem),
        Some(alg::mem_equal),
        TypeExt::Chan { elem, dir },
    ))
}

pub(crate) fn new_func(ins: &[Type], outs: &[Type], variadic: bool) -> Type {
    publish(pointer_shaped(
        Kind::Func,
        func_string(ins, outs, variadic),
        None,
        TypeExt::Func {
            ins: leak_slice(ins.to_vec()),
            outs: leak_slice(outs.to_vec()),
            variadic,
        },
    ))
}

/// Interface over `methods`, sorted into method-table order.
pub(crate) fn new_interface(mut methods: Vec<IMethod>, pkg_path: &str) -> Type {
    methods.sort_by_key(|m| method_order(m.name, m.pkg_path));
    let s = interface_string(methods.iter().map(|m| (m.name, m.typ)));
    let equal: EqualFn = if methods.is_empty() {
        alg::eface_equal
    } else {
        alg::iface_equal
    };
    publish(RType {
        size: 2 * WORD_SIZE,
        ptrdata: 2 * WORD_SIZE,
        hash: fnv1a(&s),
        tflag: TFlag::NONE,
        align: WORD_SIZE as u8,
        field_align: WORD_SIZE as u8,
        kind: Kind::Interface,
        equal: Some(equal),
        gcdata: IFACE_MASK,
        str: leak_str(s),
        ptr_to_this: OnceLock::new(),
        uncommon: None,
        ext: TypeExt::Interface {
            pkg_path: leak_str(pkg_path),
            methods: leak_slice(methods),
        },
    })
}

/// Validated struct field, before layout.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FieldSpecRef<'a> {
    pub name: &'a str,
    pub pkg_path: &'a str,
    pub typ: Type,
    pub tag: &'a str,
    pub embedded: bool,
}

/// Struct over already validated fields. With `method_set` the record gets
/// an (empty) method table for the caller to fill before publication.
pub(crate) fn new_struct(
    fields: &[FieldSpecRef<'_>],
    pkg_path: &str,
    method_set: bool,
) -> Result<Type> {
    let types: Vec<Type> = fields.iter().map(|f| f.typ).collect();
    let layout = StructLayout::compute(&types).ok_or_else(|| Error::IllegalShape {
        op: "struct_of",
        reason: "struct size overflows".to_owned(),
    })?;
    if layout.size > MAX_TYPE_SIZE {
        return Err(Error::IllegalShape {
            op: "struct_of",
            reason: "struct too large".to_owned(),
        });
    }

    let descs: Vec<FieldDesc> = fields
        .iter()
        .zip(&layout.offsets)
        .map(|(f, off)| FieldDesc {
            name: leak_str(f.name),
            pkg_path: if f.pkg_path.is_empty() {
                ""
            } else {
                leak_str(f.pkg_path)
            },
            typ: f.typ,
            tag: if f.tag.is_empty() { "" } else { leak_str(f.tag) },
            offset: *off,
            embedded: f.embedded,
        })
        .collect();

    let comparable = fields.iter().all(|f| f.typ.comparable());
    let regular = comparable
        && !layout.has_padding
        && fields
            .iter()
            .all(|f| f.typ.regular_memory() && f.name != "_");
    let equal: Option<EqualFn> = match (comparable, regular) {
        (false, _) => None,
        (true, true) => Some(alg::mem_equal),
        (true, false) => Some(alg::struct_equal),
    };

    let mut tflag = TFlag::NONE;
    if regular {
        tflag = tflag.union(TFlag::REGULAR_MEMORY);
    }
    if fields.len() == 1 && fields[0].typ.is_direct_iface() {
        tflag = tflag.union(TFlag::DIRECT_IFACE);
    }

    let parts: Vec<(Type, usize)> = types
        .iter()
        .copied()
        .zip(layout.offsets.iter().copied())
        .collect();
    let s = struct_string(fields);
    Ok(publish(RType {
        size: layout.size,
        ptrdata: layout.ptrdata,
        hash: fnv1a(&s),
        tflag,
        align: layout.align as u8,
        field_align: layout.align as u8,
        kind: Kind::Struct,
        equal,
        gcdata: gc_for_parts(layout.ptrdata, &parts),
        str: leak_str(s),
        ptr_to_this: OnceLock::new(),
        uncommon: method_set.then(|| leak_uncommon("", "")),
        ext: TypeExt::Struct {
            pkg_path: leak_str(pkg_path),
            fields: leak_slice(descs),
        },
    }))
}

/// Named type with the layout of `underlying` and an empty method table.
pub(crate) fn new_named(pkg_path: &str, name: &str, underlying: Type) -> Type {
    let u = underlying.rtype();
    let s = format!("{}.{}", package_name(pkg_path), name);
    publish(RType {
        size: u.size,
        ptrdata: u.ptrdata,
        hash: fnv1a(&s),
        tflag: u.tflag.union(TFlag::NAMED),
        align: u.align,
        field_align: u.field_align,
        kind: u.kind,
        equal: u.equal,
        gcdata: u.gcdata,
        str: leak_str(s),
        ptr_to_this: OnceLock::new(),
        uncommon: Some(leak_uncommon(pkg_path, name)),
        ext: u.ext,
    })
}

/// Method side record for a pointer type created alongside a named type.
pub(crate) fn method_holder() -> &'static Uncommon {
    leak_uncommon("", "")
}
