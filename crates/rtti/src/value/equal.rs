// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shallow (`==`) and deep equality.

use super::Value;
use crate::error::{Error, OrRaise, Result};
use crate::types::{Kind, Type};
use std::collections::HashSet;

impl Value {
    /// `self == u` under the language's comparison rules. Interfaces compare
    /// their dynamic contents. Raises on incomparable types.
    #[track_caller]
    #[must_use]
    pub fn equal(&self, u: Value) -> bool {
        self.try_equal(u).or_raise()
    }

    pub fn try_equal(&self, u: Value) -> Result<bool> {
        let v = if self.kind() == Kind::Interface { self.elem() } else { *self };
        let u = if u.kind() == Kind::Interface { u.elem() } else { u };
        let (Some(vt), Some(ut)) = (v.typ, u.typ) else {
            return Ok(v.is_valid() == u.is_valid());
        };
        if vt != ut {
            return Ok(false);
        }
        let Some(eq) = vt.rtype().equal else {
            return Err(Error::NotComparable {
                type_name: vt.string().to_owned(),
            });
        };
        // SAFETY: both handles hold values of type vt.
        Ok(unsafe { eq(vt, v.data(), u.data()) })
    }
}

type Visit = (usize, usize, Type);

/// Deep equality: pointers, slices and maps compare what they reference.
///
/// Two values are deeply equal when they have identical types and
/// - basic values compare `==` (so `NaN` is never deeply equal to itself),
/// - arrays, structs and interfaces hold deeply equal components,
/// - pointers are identical or point at deeply equal values,
/// - slices and maps are both nil or both non-nil with the same length, and
///   either share storage or hold deeply equal elements (maps: under equal
///   keys),
/// - funcs are both nil.
///
/// Cyclic structures terminate: a pair already under comparison is assumed
/// equal.
#[must_use]
pub fn deep_equal(a: Value, b: Value) -> bool {
    match (a.typ, b.typ) {
        (None, None) => true,
        (Some(ta), Some(tb)) if ta == tb => deep_value_equal(a, b, &mut HashSet::new()),
        _ => false,
    }
}

fn deep_value_equal(v1: Value, v2: Value, visited: &mut HashSet<Visit>) -> bool {
    if !v1.is_valid() || !v2.is_valid() {
        return v1.is_valid() == v2.is_valid();
    }
    let t = v1.typ();
    if t != v2.typ() {
        return false;
    }

    let hard = matches!(t.kind(), Kind::Map | Kind::Slice | Kind::Pointer | Kind::Interface);
    if hard {
        let (p1, p2) = (identity(v1), identity(v2));
        if p1 != 0 && p2 != 0 {
            let key = if p1 <= p2 { (p1, p2, t) } else { (p2, p1, t) };
            if !visited.insert(key) {
                return true;
            }
        }
    }

    match t.kind() {
        Kind::Array => (0..t.len()).all(|i| deep_value_equal(v1.index(i), v2.index(i), visited)),
        Kind::Slice => {
            if v1.is_nil() != v2.is_nil() || v1.len() != v2.len() {
                return false;
            }
            if v1.slice_header().data == v2.slice_header().data {
                return true;
            }
            (0..v1.len()).all(|i| deep_value_equal(v1.index(i), v2.index(i), visited))
        }
        Kind::Interface => {
            if v1.is_nil() || v2.is_nil() {
                return v1.is_nil() == v2.is_nil();
            }
            deep_value_equal(v1.elem(), v2.elem(), visited)
        }
        Kind::Pointer => {
            if v1.word() == v2.word() {
                return true;
            }
            deep_value_equal(v1.elem(), v2.elem(), visited)
        }
        Kind::Struct => {
            (0..t.num_field()).all(|i| deep_value_equal(v1.field(i), v2.field(i), visited))
        }
        Kind::Map => {
            if v1.is_nil() != v2.is_nil() || v1.len() != v2.len() {
                return false;
            }
            if v1.word() == v2.word() {
                return true;
            }
            v1.map_keys().into_iter().all(|k| {
                match (v1.map_index(k), v2.map_index(k)) {
                    (Some(e1), Some(e2)) => deep_value_equal(e1, e2, visited),
                    _ => false,
                }
            })
        }
        Kind::Func => v1.is_nil() && v2.is_nil(),
        _ => v1.try_equal(v2).unwrap_or(false),
    }
}

/// Address identifying the storage a reference-like value refers to.
fn identity(v: Value) -> usize {
    match v.kind() {
        Kind::Slice => v.slice_header().data as usize,
        Kind::Interface => v.ptr as usize,
        _ => v.word() as usize,
    }
}
