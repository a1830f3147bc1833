// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The descriptor record shared by compiled-in and synthesized types.
//!
//! Every reference inside an [`RType`] is `&'static`: builtin descriptors are
//! plain `static` items, synthesized ones are leaked on publication. After
//! publication a record is never mutated; the two `OnceLock` slots are filled
//! by the table builder before the owning module is registered.

use super::Type;
use crate::layout::GcData;
use crate::objects::FuncObject;
use std::fmt;
use std::hash::Hasher;
use std::sync::OnceLock;

use super::Kind;

/// Equality of two values of the given type, by address.
pub type EqualFn = unsafe fn(Type, *const u8, *const u8) -> bool;

/// Feed the value at the given address into a hasher.
pub type HashFn = unsafe fn(Type, *const u8, &mut dyn Hasher);

/// Descriptor flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TFlag(u8);

impl TFlag {
    pub const NONE: Self = Self(0);
    /// The type has a declared name.
    pub const NAMED: Self = Self(1 << 0);
    /// Values can be compared and hashed as plain bytes.
    pub const REGULAR_MEMORY: Self = Self(1 << 1);
    /// Values are stored in the dynamic container's payload word.
    pub const DIRECT_IFACE: Self = Self(1 << 2);

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[must_use]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

/// Channel direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ChanDir {
    /// `<-chan T`
    Recv = 1,
    /// `chan<- T`
    Send = 2,
    /// `chan T`
    Both = 3,
}

impl ChanDir {
    #[must_use]
    pub const fn can_send(self) -> bool {
        (self as u8) & (Self::Send as u8) != 0
    }

    #[must_use]
    pub const fn can_recv(self) -> bool {
        (self as u8) & (Self::Recv as u8) != 0
    }
}

impl fmt::Display for ChanDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Recv => "<-chan",
            Self::Send => "chan<-",
            Self::Both => "chan",
        })
    }
}

/// Whether an identifier is visible outside its declaring package.
#[must_use]
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

// ---------------------------------------------------------------------------
// Component records
// ---------------------------------------------------------------------------

/// Stored struct field.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FieldDesc {
    pub name: &'static str,
    /// Empty for exported fields.
    pub pkg_path: &'static str,
    pub typ: Type,
    pub tag: &'static str,
    pub offset: usize,
    pub embedded: bool,
}

impl FieldDesc {
    pub fn exported(&self) -> bool {
        self.pkg_path.is_empty()
    }
}

/// Interface method: name plus signature without receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct IMethod {
    pub name: &'static str,
    pub pkg_path: &'static str,
    pub typ: Type,
}

/// Concrete method of a named (or method-promoting) type.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MethodEntry {
    pub name: &'static str,
    /// Empty for exported methods.
    pub pkg_path: &'static str,
    /// Signature without receiver.
    pub mtyp: Type,
    /// Implementation; takes the receiver as its first argument.
    pub ifn: &'static FuncObject,
}

/// Sort key shared by method tables and interface method lists: exported
/// names first, then by name, then by package.
pub(crate) fn method_order<'a>(name: &'a str, pkg_path: &'a str) -> (bool, &'a str, &'a str) {
    (!pkg_path.is_empty(), name, pkg_path)
}

/// Sorted methods; the first `xcount` are exported.
#[derive(Debug, Default)]
pub(crate) struct MethodTable {
    pub entries: Vec<MethodEntry>,
    pub xcount: usize,
}

impl MethodTable {
    pub fn new(mut entries: Vec<MethodEntry>) -> Self {
        entries.sort_by_key(|m| method_order(m.name, m.pkg_path));
        let xcount = entries.iter().filter(|m| m.pkg_path.is_empty()).count();
        Self { entries, xcount }
    }

    pub fn exported(&self) -> &[MethodEntry] {
        &self.entries[..self.xcount]
    }
}

/// Side record for named or method-bearing types.
#[derive(Debug)]
pub(crate) struct Uncommon {
    pub pkg_path: &'static str,
    pub name: &'static str,
    pub methods: OnceLock<MethodTable>,
}

impl Uncommon {
    pub fn methods(&self) -> &[MethodEntry] {
        self.methods.get().map_or(&[], |t| t.entries.as_slice())
    }

    pub fn exported_methods(&self) -> &[MethodEntry] {
        self.methods.get().map_or(&[], |t| t.exported())
    }
}

/// Kind-specific extension of the base record.
#[derive(Clone, Copy)]
pub(crate) enum TypeExt {
    None,
    Array {
        elem: Type,
        len: usize,
    },
    Chan {
        elem: Type,
        dir: ChanDir,
    },
    Func {
        ins: &'static [Type],
        outs: &'static [Type],
        variadic: bool,
    },
    Interface {
        pkg_path: &'static str,
        methods: &'static [IMethod],
    },
    Map {
        key: Type,
        elem: Type,
        hasher: HashFn,
    },
    Pointer {
        elem: Type,
    },
    Slice {
        elem: Type,
    },
    Struct {
        pkg_path: &'static str,
        fields: &'static [FieldDesc],
    },
}

impl fmt::Debug for TypeExt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Array { elem, len } => write!(f, "Array({}, {})", elem, len),
            Self::Chan { elem, dir } => write!(f, "Chan({}, {})", dir, elem),
            Self::Func { ins, outs, variadic } => {
                write!(f, "Func({:?} -> {:?}, variadic={})", ins, outs, variadic)
            }
            Self::Interface { methods, .. } => write!(f, "Interface({} methods)", methods.len()),
            Self::Map { key, elem, .. } => write!(f, "Map({}, {})", key, elem),
            Self::Pointer { elem } => write!(f, "Pointer({})", elem),
            Self::Slice { elem } => write!(f, "Slice({})", elem),
            Self::Struct { fields, .. } => write!(f, "Struct({} fields)", fields.len()),
        }
    }
}

// ---------------------------------------------------------------------------
// Descriptor
// ---------------------------------------------------------------------------

/// Type descriptor record. Use it through [`Type`].
pub struct RType {
    pub(crate) size: usize,
    /// Prefix of the value that may contain pointers.
    pub(crate) ptrdata: usize,
    pub(crate) hash: u32,
    pub(crate) tflag: TFlag,
    pub(crate) align: u8,
    pub(crate) field_align: u8,
    pub(crate) kind: Kind,
    /// `None` for incomparable types.
    pub(crate) equal: Option<EqualFn>,
    pub(crate) gcdata: GcData,
    /// Canonical string form.
    pub(crate) str: &'static str,
    pub(crate) ptr_to_this: OnceLock<Type>,
    pub(crate) uncommon: Option<&'static Uncommon>,
    pub(crate) ext: TypeExt,
}

impl fmt::Debug for RType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RType")
            .field("str", &self.str)
            .field("kind", &self.kind)
            .field("size", &self.size)
            .field("align", &self.align)
            .field("ptrdata", &self.ptrdata)
            .finish_non_exhaustive()
    }
}

/// FNV-1a over the canonical string; stable across runs.
#[must_use]
pub const fn fnv1a(s: &str) -> u32 {
    let bytes = s.as_bytes();
    let mut h: u32 = 0x811c_9dc5;
    let mut i = 0;
    while i < bytes.len() {
        h ^= bytes[i] as u32;
        h = h.wrapping_mul(0x0100_0193);
        i += 1;
    }
    h
}
