// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type identity, assignability and interface satisfaction.

use crate::types::rtype::method_order;
use crate::types::{ChanDir, Kind, Type};

/// Whether a value of type `src` is assignable to `dst` without boxing:
/// identical types, or identical underlying types where at least one side
/// is unnamed. A bidirectional channel is also assignable to any unnamed
/// channel type with the same element.
pub(crate) fn directly_assignable(dst: Type, src: Type) -> bool {
    if dst == src {
        return true;
    }
    if (dst.is_named() && src.is_named()) || dst.kind() != src.kind() {
        return false;
    }
    if dst.kind() == Kind::Chan && special_channel_assignability(dst, src) {
        return true;
    }
    identical_underlying(dst, src, true)
}

pub(crate) fn special_channel_assignability(dst: Type, src: Type) -> bool {
    src.chan_dir() == ChanDir::Both
        && (!dst.is_named() || !src.is_named())
        && identical(dst.elem(), src.elem(), true)
}

/// Whether `src` is assignable to `dst` under the language's rules.
pub(crate) fn assignable(dst: Type, src: Type) -> bool {
    directly_assignable(dst, src) || (dst.kind() == Kind::Interface && implements(dst, src))
}

/// Whether `t`'s method set contains every method of interface `iface`.
///
/// Both method lists are sorted in method-table order, so one forward walk
/// over `t`'s methods suffices.
pub(crate) fn implements(iface: Type, t: Type) -> bool {
    if iface.kind() != Kind::Interface {
        return false;
    }
    let want = iface.imethods();
    if want.is_empty() {
        return true;
    }
    if t.kind() == Kind::Interface {
        let have = t.imethods();
        let mut j = 0;
        for m in want {
            let key = method_order(m.name, m.pkg_path);
            while j < have.len() && method_order(have[j].name, have[j].pkg_path) < key {
                j += 1;
            }
            if j == have.len() || have[j].name != m.name || have[j].pkg_path != m.pkg_path || have[j].typ != m.typ {
                return false;
            }
            j += 1;
        }
        return true;
    }

    let have = t.method_entries();
    let mut j = 0;
    for m in want {
        let key = method_order(m.name, m.pkg_path);
        while j < have.len() && method_order(have[j].name, have[j].pkg_path) < key {
            j += 1;
        }
        if j == have.len() || have[j].name != m.name || have[j].pkg_path != m.pkg_path || have[j].mtyp != m.typ {
            return false;
        }
        j += 1;
    }
    true
}

/// Type identity. With `cmp_tags` canonical descriptors make this pointer
/// equality; without it struct tags are ignored.
pub(crate) fn identical(a: Type, b: Type, cmp_tags: bool) -> bool {
    if cmp_tags {
        return a == b;
    }
    if a.name() != b.name() || a.kind() != b.kind() || a.pkg_path() != b.pkg_path() {
        return false;
    }
    identical_underlying(a, b, false)
}

/// Whether `a` and `b` share the same underlying type.
pub(crate) fn identical_underlying(a: Type, b: Type, cmp_tags: bool) -> bool {
    if a == b {
        return true;
    }
    let kind = a.kind();
    if kind != b.kind() {
        return false;
    }
    if kind.is_basic() {
        return true;
    }
    match kind {
        Kind::Array => a.len() == b.len() && identical(a.elem(), b.elem(), cmp_tags),
        Kind::Chan => a.chan_dir() == b.chan_dir() && identical(a.elem(), b.elem(), cmp_tags),
        Kind::Func => {
            a.is_variadic() == b.is_variadic()
                && a.ins().len() == b.ins().len()
                && a.outs().len() == b.outs().len()
                && a.ins().iter().zip(b.ins()).all(|(x, y)| identical(*x, *y, cmp_tags))
                && a.outs().iter().zip(b.outs()).all(|(x, y)| identical(*x, *y, cmp_tags))
        }
        Kind::Interface => {
            let (ma, mb) = (a.imethods(), b.imethods());
            ma.len() == mb.len()
                && ma
                    .iter()
                    .zip(mb)
                    .all(|(x, y)| x.name == y.name && x.pkg_path == y.pkg_path && x.typ == y.typ)
        }
        Kind::Map => {
            identical(a.key(), b.key(), cmp_tags) && identical(a.elem(), b.elem(), cmp_tags)
        }
        Kind::Pointer | Kind::Slice => identical(a.elem(), b.elem(), cmp_tags),
        Kind::Struct => {
            let (fa, fb) = (a.field_descs(), b.field_descs());
            if fa.len() != fb.len() || a.struct_pkg_path() != b.struct_pkg_path() {
                return false;
            }
            fa.iter().zip(fb).all(|(x, y)| {
                x.name == y.name
                    && x.pkg_path == y.pkg_path
                    && identical(x.typ, y.typ, cmp_tags)
                    && (!cmp_tags || x.tag == y.tag)
                    && x.offset == y.offset
                    && x.embedded == y.embedded
            })
        }
        _ => false,
    }
}
