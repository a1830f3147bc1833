// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Equality and hashing over raw storage.
//!
//! All functions take the descriptor and the address(es) of the value(s).
//! Callers guarantee the addresses hold initialised values of that type.

use super::{Kind, Type};
use crate::error::{raise, Error};
use crate::iface::{Eface, Itab};
use crate::objects::StringHeader;
use std::hash::Hasher;
use std::slice;

#[inline]
unsafe fn bytes<'a>(p: *const u8, n: usize) -> &'a [u8] {
    if n == 0 {
        return &[];
    }
    slice::from_raw_parts(p, n)
}

/// Byte-wise equality; valid for types with regular memory.
pub(crate) unsafe fn mem_equal(t: Type, a: *const u8, b: *const u8) -> bool {
    bytes(a, t.size()) == bytes(b, t.size())
}

pub(crate) unsafe fn f32_equal(_: Type, a: *const u8, b: *const u8) -> bool {
    *a.cast::<f32>() == *b.cast::<f32>()
}

pub(crate) unsafe fn f64_equal(_: Type, a: *const u8, b: *const u8) -> bool {
    *a.cast::<f64>() == *b.cast::<f64>()
}

pub(crate) unsafe fn c64_equal(_: Type, a: *const u8, b: *const u8) -> bool {
    let (a, b) = (a.cast::<[f32; 2]>(), b.cast::<[f32; 2]>());
    (*a)[0] == (*b)[0] && (*a)[1] == (*b)[1]
}

pub(crate) unsafe fn c128_equal(_: Type, a: *const u8, b: *const u8) -> bool {
    let (a, b) = (a.cast::<[f64; 2]>(), b.cast::<[f64; 2]>());
    (*a)[0] == (*b)[0] && (*a)[1] == (*b)[1]
}

pub(crate) unsafe fn str_equal(_: Type, a: *const u8, b: *const u8) -> bool {
    let (a, b) = (&*a.cast::<StringHeader>(), &*b.cast::<StringHeader>());
    a.len == b.len && a.as_bytes() == b.as_bytes()
}

/// Compare two payloads of the same dynamic type.
unsafe fn payload_equal(t: Type, x: *mut u8, y: *mut u8) -> bool {
    let Some(eq) = t.rtype().equal else {
        raise(Error::NotComparable {
            type_name: t.string().to_owned(),
        })
    };
    if t.is_direct_iface() {
        // The payload words are the values themselves.
        return eq(
            t,
            std::ptr::addr_of!(x).cast::<u8>(),
            std::ptr::addr_of!(y).cast::<u8>(),
        );
    }
    eq(t, x, y)
}

pub(crate) unsafe fn eface_equal(_: Type, a: *const u8, b: *const u8) -> bool {
    let (a, b) = (*a.cast::<Eface>(), *b.cast::<Eface>());
    match (a.typ, b.typ) {
        (None, None) => true,
        (Some(ta), Some(tb)) if ta == tb => payload_equal(ta, a.word, b.word),
        _ => false,
    }
}

pub(crate) unsafe fn iface_equal(_: Type, a: *const u8, b: *const u8) -> bool {
    let (a, b) = (a.cast::<[*mut u8; 2]>(), b.cast::<[*mut u8; 2]>());
    let (tab_a, tab_b) = ((*a)[0].cast::<Itab>(), (*b)[0].cast::<Itab>());
    if tab_a != tab_b {
        return false;
    }
    if tab_a.is_null() {
        return true;
    }
    payload_equal((*tab_a).typ, (*a)[1], (*b)[1])
}

pub(crate) unsafe fn array_equal(t: Type, a: *const u8, b: *const u8) -> bool {
    let elem = t.elem();
    let Some(eq) = elem.rtype().equal else {
        return false;
    };
    let size = elem.size();
    (0..t.len()).all(|i| eq(elem, a.add(i * size), b.add(i * size)))
}

pub(crate) unsafe fn struct_equal(t: Type, a: *const u8, b: *const u8) -> bool {
    t.field_descs().iter().filter(|f| f.name != "_").all(|f| {
        f.typ
            .rtype()
            .equal
            .is_some_and(|eq| eq(f.typ, a.add(f.offset), b.add(f.offset)))
    })
}

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

/// Hash the value at `p`. Values that compare equal hash equally.
pub(crate) unsafe fn typehash(t: Type, p: *const u8, h: &mut dyn Hasher) {
    match t.kind() {
        Kind::Float32 => {
            let f = *p.cast::<f32>();
            h.write_u32(if f == 0.0 { 0 } else { f.to_bits() });
        }
        Kind::Float64 => {
            let f = *p.cast::<f64>();
            h.write_u64(if f == 0.0 { 0 } else { f.to_bits() });
        }
        Kind::Complex64 => {
            let f32t = super::basic(Kind::Float32);
            typehash(f32t, p, h);
            typehash(f32t, p.add(4), h);
        }
        Kind::Complex128 => {
            let f64t = super::basic(Kind::Float64);
            typehash(f64t, p, h);
            typehash(f64t, p.add(8), h);
        }
        Kind::String => {
            let s = &*p.cast::<StringHeader>();
            h.write(s.as_bytes());
            h.write_usize(s.len);
        }
        Kind::Interface => {
            let words = p.cast::<[*mut u8; 2]>();
            let dyn_type = if t.imethods().is_empty() {
                (*p.cast::<Eface>()).typ
            } else {
                let tab = (*words)[0].cast::<Itab>();
                (!tab.is_null()).then(|| (*tab).typ)
            };
            let Some(dt) = dyn_type else {
                h.write_u8(0);
                return;
            };
            if !dt.comparable() {
                raise(Error::NotComparable {
                    type_name: dt.string().to_owned(),
                });
            }
            h.write_usize(dt.addr());
            let word = (*words)[1];
            if dt.is_direct_iface() {
                typehash(dt, std::ptr::addr_of!(word).cast::<u8>(), h);
            } else {
                typehash(dt, word, h);
            }
        }
        Kind::Array => {
            let elem = t.elem();
            for i in 0..t.len() {
                typehash(elem, p.add(i * elem.size()), h);
            }
        }
        Kind::Struct => {
            for f in t.field_descs().iter().filter(|f| f.name != "_") {
                typehash(f.typ, p.add(f.offset), h);
            }
        }
        Kind::Slice | Kind::Map | Kind::Func | Kind::Invalid => raise(Error::NotComparable {
            type_name: t.string().to_owned(),
        }),
        _ => h.write(bytes(p, t.size())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::basic;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(t: Type, p: *const u8) -> u64 {
        let mut h = DefaultHasher::new();
        unsafe { typehash(t, p, &mut h) };
        h.finish()
    }

    #[test]
    fn test_float_zero_signs_hash_equal() {
        let t = basic(Kind::Float64);
        let (a, b) = (0.0f64, -0.0f64);
        let (pa, pb) = (std::ptr::addr_of!(a).cast(), std::ptr::addr_of!(b).cast());
        assert!(unsafe { f64_equal(t, pa, pb) });
        assert_eq!(hash_of(t, pa), hash_of(t, pb));
    }

    #[test]
    fn test_nan_is_not_equal_to_itself() {
        let t = basic(Kind::Float32);
        let a = f32::NAN;
        let p = std::ptr::addr_of!(a).cast();
        assert!(!unsafe { f32_equal(t, p, p) });
    }

    #[test]
    fn test_string_equality_compares_contents() {
        let t = basic(Kind::String);
        let a = StringHeader::from_bytes(b"hello");
        let b = StringHeader::from_bytes(b"hello");
        let c = StringHeader::from_bytes(b"help!");
        let (pa, pb, pc) = (
            std::ptr::addr_of!(a).cast(),
            std::ptr::addr_of!(b).cast(),
            std::ptr::addr_of!(c).cast(),
        );
        assert!(unsafe { str_equal(t, pa, pb) });
        assert!(!unsafe { str_equal(t, pa, pc) });
        assert_eq!(hash_of(t, pa), hash_of(t, pb));
    }
}
