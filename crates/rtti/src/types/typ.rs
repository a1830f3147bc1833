// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `Type`: the public handle on a descriptor.
//!
//! Identity is pointer identity: two `Type`s are the same type iff they
//! refer to the same record. Kind-specific accessors raise a
//! [`Error::KindMismatch`] when called on the wrong kind.

use super::rtype::{FieldDesc, IMethod, MethodEntry, RType, TFlag, TypeExt};
use super::{ChanDir, Kind, StructTag};
use crate::error::{raise, Error};
use crate::layout::{words, GcData};
use crate::value::Value;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Handle on an immutable, process-lifetime type descriptor.
#[derive(Clone, Copy)]
#[repr(transparent)]
pub struct Type(pub(crate) &'static RType);

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.0, other.0)
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.0 as *const RType as usize).hash(state);
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({})", self.0.str)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.str)
    }
}

/// Struct field as seen by callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructField {
    pub name: &'static str,
    /// Declaring package of an unexported field; empty when exported.
    pub pkg_path: &'static str,
    pub typ: Type,
    pub tag: StructTag,
    /// Byte offset within the struct.
    pub offset: usize,
    /// Index path for [`Value::field_by_index`].
    pub index: Vec<usize>,
    pub embedded: bool,
}

impl StructField {
    #[must_use]
    pub fn is_exported(&self) -> bool {
        self.pkg_path.is_empty()
    }

    fn from_desc(d: &FieldDesc, i: usize) -> Self {
        Self {
            name: d.name,
            pkg_path: d.pkg_path,
            typ: d.typ,
            tag: StructTag::new(d.tag),
            offset: d.offset,
            index: vec![i],
            embedded: d.embedded,
        }
    }
}

/// Method as seen by callers.
#[derive(Debug, Clone, Copy)]
pub struct Method {
    pub name: &'static str,
    pub pkg_path: &'static str,
    /// Signature; for concrete types the receiver is the first parameter.
    pub typ: Type,
    /// Implementation taking the receiver first. Invalid for interface types.
    pub func: Value,
    pub index: usize,
}

impl Method {
    #[must_use]
    pub fn is_exported(&self) -> bool {
        self.pkg_path.is_empty()
    }
}

#[track_caller]
fn param(list: &'static [Type], i: usize, method: &'static str) -> Type {
    match list.get(i) {
        Some(t) => *t,
        None => raise(Error::IndexOutOfRange {
            method,
            index: i,
            len: list.len(),
        }),
    }
}

#[track_caller]
fn mismatch(method: &'static str, kind: Kind) -> ! {
    raise(Error::KindMismatch { method, kind })
}

impl Type {
    #[inline]
    pub(crate) const fn from_static(r: &'static RType) -> Self {
        Self(r)
    }

    #[inline]
    pub(crate) fn rtype(self) -> &'static RType {
        self.0
    }

    #[inline]
    pub(crate) fn as_ptr(self) -> *const RType {
        self.0
    }

    /// Address of the descriptor record, stable for the process lifetime.
    #[must_use]
    pub fn addr(self) -> usize {
        self.as_ptr() as usize
    }

    // -----------------------------------------------------------------------
    // Common accessors
    // -----------------------------------------------------------------------

    #[inline]
    #[must_use]
    pub fn kind(self) -> Kind {
        self.0.kind
    }

    #[inline]
    #[must_use]
    pub fn size(self) -> usize {
        self.0.size
    }

    #[inline]
    #[must_use]
    pub fn align(self) -> usize {
        self.0.align as usize
    }

    /// Alignment when used as a struct field.
    #[inline]
    #[must_use]
    pub fn field_align(self) -> usize {
        self.0.field_align as usize
    }

    /// Length of the prefix that may contain pointers.
    #[inline]
    #[must_use]
    pub fn ptrdata(self) -> usize {
        self.0.ptrdata
    }

    #[must_use]
    pub fn has_pointers(self) -> bool {
        self.0.ptrdata != 0
    }

    /// Hash of the canonical string.
    #[must_use]
    pub fn hash32(self) -> u32 {
        self.0.hash
    }

    /// Canonical string form, e.g. `map[string][]int32`.
    #[must_use]
    pub fn string(self) -> &'static str {
        self.0.str
    }

    /// Declared name; empty for unnamed types. Predeclared types are
    /// named after themselves.
    #[must_use]
    pub fn name(self) -> &'static str {
        if !self.is_named() {
            return "";
        }
        self.0.uncommon.map_or(self.0.str, |u| u.name)
    }

    /// Declaring package of a named type.
    #[must_use]
    pub fn pkg_path(self) -> &'static str {
        if !self.is_named() {
            return "";
        }
        self.0.uncommon.map_or("", |u| u.pkg_path)
    }

    #[must_use]
    pub fn is_named(self) -> bool {
        self.0.tflag.contains(TFlag::NAMED)
    }

    #[must_use]
    pub fn comparable(self) -> bool {
        self.0.equal.is_some()
    }

    #[must_use]
    pub fn gc_data(self) -> GcData {
        self.0.gcdata
    }

    /// One flag per word of the pointer prefix.
    #[must_use]
    pub fn pointer_words(self) -> Vec<bool> {
        self.0.gcdata.pointer_words(words(self.0.ptrdata))
    }

    /// Whether values are carried in the container payload word itself.
    #[inline]
    pub(crate) fn is_direct_iface(self) -> bool {
        self.0.tflag.contains(TFlag::DIRECT_IFACE)
    }

    #[inline]
    pub(crate) fn regular_memory(self) -> bool {
        self.0.tflag.contains(TFlag::REGULAR_MEMORY)
    }

    #[inline]
    pub(crate) fn ext(self) -> TypeExt {
        self.0.ext
    }

    // -----------------------------------------------------------------------
    // Kind-specific accessors
    // -----------------------------------------------------------------------

    /// Element type of an array, chan, map, pointer or slice.
    #[track_caller]
    #[must_use]
    pub fn elem(self) -> Type {
        match self.0.ext {
            TypeExt::Array { elem, .. }
            | TypeExt::Chan { elem, .. }
            | TypeExt::Map { elem, .. }
            | TypeExt::Pointer { elem }
            | TypeExt::Slice { elem } => elem,
            _ => mismatch("Type::elem", self.kind()),
        }
    }

    #[track_caller]
    #[must_use]
    pub fn key(self) -> Type {
        match self.0.ext {
            TypeExt::Map { key, .. } => key,
            _ => mismatch("Type::key", self.kind()),
        }
    }

    /// Length of an array type.
    #[track_caller]
    #[must_use]
    pub fn len(self) -> usize {
        match self.0.ext {
            TypeExt::Array { len, .. } => len,
            _ => mismatch("Type::len", self.kind()),
        }
    }

    #[track_caller]
    #[must_use]
    pub fn chan_dir(self) -> ChanDir {
        match self.0.ext {
            TypeExt::Chan { dir, .. } => dir,
            _ => mismatch("Type::chan_dir", self.kind()),
        }
    }

    #[track_caller]
    pub(crate) fn field_descs(self) -> &'static [FieldDesc] {
        match self.0.ext {
            TypeExt::Struct { fields, .. } => fields,
            _ => mismatch("Type::field", self.kind()),
        }
    }

    /// Package path shared by the unexported fields of a struct type.
    #[track_caller]
    #[must_use]
    pub fn struct_pkg_path(self) -> &'static str {
        match self.0.ext {
            TypeExt::Struct { pkg_path, .. } => pkg_path,
            _ => mismatch("Type::struct_pkg_path", self.kind()),
        }
    }

    #[track_caller]
    #[must_use]
    pub fn num_field(self) -> usize {
        self.field_descs().len()
    }

    #[track_caller]
    #[must_use]
    pub fn field(self, i: usize) -> StructField {
        let fields = self.field_descs();
        match fields.get(i) {
            Some(d) => StructField::from_desc(d, i),
            None => raise(Error::IndexOutOfRange {
                method: "Type::field",
                index: i,
                len: fields.len(),
            }),
        }
    }

    /// Fields in declaration order.
    #[track_caller]
    pub fn fields(self) -> impl ExactSizeIterator<Item = StructField> {
        self.field_descs()
            .iter()
            .enumerate()
            .map(|(i, d)| StructField::from_desc(d, i))
    }

    /// Field reached through an index path, following embedded pointers.
    #[track_caller]
    #[must_use]
    pub fn field_by_index(self, index: &[usize]) -> StructField {
        let mut t = self;
        let mut out: Option<StructField> = None;
        for (depth, &i) in index.iter().enumerate() {
            if depth > 0 && t.kind() == Kind::Pointer && t.elem().kind() == Kind::Struct {
                t = t.elem();
            }
            let f = t.field(i);
            t = f.typ;
            out = Some(f);
        }
        match out {
            Some(mut f) => {
                f.index = index.to_vec();
                f
            }
            None => raise(Error::IndexOutOfRange {
                method: "Type::field_by_index",
                index: 0,
                len: 0,
            }),
        }
    }

    /// Field by name, searching embedded structs breadth first.
    ///
    /// A name found more than once at the shallowest depth is ambiguous and
    /// reported as absent.
    #[track_caller]
    #[must_use]
    pub fn field_by_name(self, name: &str) -> Option<StructField> {
        self.field_by_name_func(|n| n == name)
    }

    /// Breadth-first field search with an arbitrary name predicate.
    #[track_caller]
    pub fn field_by_name_func(self, matches: impl Fn(&str) -> bool) -> Option<StructField> {
        self.field_descs();
        let mut current: Vec<(Type, Vec<usize>)> = vec![(self, Vec::new())];
        let mut visited: HashSet<Type> = HashSet::new();

        while !current.is_empty() {
            let mut next = Vec::new();
            let mut found: Option<StructField> = None;
            let mut count = 0usize;

            for (st, path) in &current {
                if !visited.insert(*st) {
                    continue;
                }
                for (i, d) in st.field_descs().iter().enumerate() {
                    let mut index = path.clone();
                    index.push(i);
                    if matches(d.name) {
                        count += 1;
                        if found.is_none() {
                            let mut f = StructField::from_desc(d, i);
                            f.index = index.clone();
                            found = Some(f);
                        }
                        continue;
                    }
                    if d.embedded {
                        let mut ft = d.typ;
                        if ft.kind() == Kind::Pointer {
                            ft = ft.elem();
                        }
                        if ft.kind() == Kind::Struct {
                            next.push((ft, index));
                        }
                    }
                }
            }

            match count {
                0 => current = next,
                1 => return found,
                _ => return None,
            }
        }
        None
    }

    // -- functions ----------------------------------------------------------

    #[track_caller]
    fn func_parts(self) -> (&'static [Type], &'static [Type], bool) {
        match self.0.ext {
            TypeExt::Func {
                ins,
                outs,
                variadic,
            } => (ins, outs, variadic),
            _ => mismatch("Type::in", self.kind()),
        }
    }

    #[track_caller]
    #[must_use]
    pub fn ins(self) -> &'static [Type] {
        self.func_parts().0
    }

    #[track_caller]
    #[must_use]
    pub fn outs(self) -> &'static [Type] {
        self.func_parts().1
    }

    #[track_caller]
    #[must_use]
    pub fn num_in(self) -> usize {
        self.ins().len()
    }

    #[track_caller]
    #[must_use]
    pub fn num_out(self) -> usize {
        self.outs().len()
    }

    #[track_caller]
    #[must_use]
    pub fn in_(self, i: usize) -> Type {
        param(self.ins(), i, "Type::in_")
    }

    #[track_caller]
    #[must_use]
    pub fn out(self, i: usize) -> Type {
        param(self.outs(), i, "Type::out")
    }

    #[track_caller]
    #[must_use]
    pub fn is_variadic(self) -> bool {
        self.func_parts().2
    }

    // -- methods ------------------------------------------------------------

    pub(crate) fn imethods(self) -> &'static [IMethod] {
        match self.0.ext {
            TypeExt::Interface { methods, .. } => methods,
            _ => &[],
        }
    }

    /// Full method table, unexported entries included.
    pub(crate) fn method_entries(self) -> &'static [MethodEntry] {
        self.0.uncommon.map_or(&[], |u| u.methods())
    }

    pub(crate) fn exported_method_entries(self) -> &'static [MethodEntry] {
        self.0.uncommon.map_or(&[], |u| u.exported_methods())
    }

    /// Number of methods in the method set: exported methods for concrete
    /// types, all methods for interfaces.
    #[must_use]
    pub fn num_method(self) -> usize {
        if self.kind() == Kind::Interface {
            return self.imethods().len();
        }
        self.exported_method_entries().len()
    }

    #[track_caller]
    #[must_use]
    pub fn method(self, i: usize) -> Method {
        let n = self.num_method();
        if i >= n {
            raise(Error::IndexOutOfRange {
                method: "Type::method",
                index: i,
                len: n,
            });
        }
        if self.kind() == Kind::Interface {
            let m = self.imethods()[i];
            return Method {
                name: m.name,
                pkg_path: m.pkg_path,
                typ: m.typ,
                func: Value::invalid(),
                index: i,
            };
        }
        let m = self.exported_method_entries()[i];
        Method {
            name: m.name,
            pkg_path: m.pkg_path,
            typ: m.ifn.typ(),
            func: Value::from_func_object(m.ifn),
            index: i,
        }
    }

    #[must_use]
    pub fn method_by_name(self, name: &str) -> Option<Method> {
        let i = if self.kind() == Kind::Interface {
            self.imethods().iter().position(|m| m.name == name)?
        } else {
            self.exported_method_entries()
                .iter()
                .position(|m| m.name == name)?
        };
        Some(self.method(i))
    }

    // -- relations ----------------------------------------------------------

    /// Whether this type's method set satisfies interface `u`.
    #[track_caller]
    #[must_use]
    pub fn implements(self, u: Type) -> bool {
        if u.kind() != Kind::Interface {
            raise(Error::KindMismatch {
                method: "Type::implements",
                kind: u.kind(),
            });
        }
        crate::convert::implements(u, self)
    }

    /// Whether a value of this type is assignable to `u`.
    #[must_use]
    pub fn assignable_to(self, u: Type) -> bool {
        crate::convert::assignable(u, self)
    }

    /// Whether a value of this type can be converted to `u`.
    #[must_use]
    pub fn convertible_to(self, u: Type) -> bool {
        crate::convert::select_converter(self, u).is_some()
    }

    /// Pointer-to-this type.
    #[must_use]
    pub fn pointer_to(self) -> Type {
        crate::synth::pointer_to(self)
    }
}
