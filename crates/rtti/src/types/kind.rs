// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type kinds.

use std::fmt;

/// The specific kind of type a descriptor represents.
///
/// The discriminant fits in five bits; value handles pack it into their flag word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Kind {
    Invalid = 0,
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    /// Fixed-length array.
    Array,
    /// Message queue.
    Chan,
    Func,
    /// Dynamic interface (method set).
    Interface,
    Map,
    Pointer,
    /// View of an array: `{data, len, cap}`.
    Slice,
    String,
    Struct,
    /// Opaque pointer, no element type.
    UnsafePointer,
}

const KINDS: [Kind; 27] = [
    Kind::Invalid,
    Kind::Bool,
    Kind::Int,
    Kind::Int8,
    Kind::Int16,
    Kind::Int32,
    Kind::Int64,
    Kind::Uint,
    Kind::Uint8,
    Kind::Uint16,
    Kind::Uint32,
    Kind::Uint64,
    Kind::Uintptr,
    Kind::Float32,
    Kind::Float64,
    Kind::Complex64,
    Kind::Complex128,
    Kind::Array,
    Kind::Chan,
    Kind::Func,
    Kind::Interface,
    Kind::Map,
    Kind::Pointer,
    Kind::Slice,
    Kind::String,
    Kind::Struct,
    Kind::UnsafePointer,
];

impl Kind {
    /// Decode a kind from its discriminant; unknown values map to `Invalid`.
    #[must_use]
    pub const fn from_u8(v: u8) -> Self {
        if (v as usize) < KINDS.len() {
            KINDS[v as usize]
        } else {
            Kind::Invalid
        }
    }

    /// Canonical lower-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Invalid => "invalid",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint => "uint",
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Uintptr => "uintptr",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Complex64 => "complex64",
            Self::Complex128 => "complex128",
            Self::Array => "array",
            Self::Chan => "chan",
            Self::Func => "func",
            Self::Interface => "interface",
            Self::Map => "map",
            Self::Pointer => "ptr",
            Self::Slice => "slice",
            Self::String => "string",
            Self::Struct => "struct",
            Self::UnsafePointer => "unsafe.Pointer",
        }
    }

    /// Signed integer kinds.
    #[must_use]
    pub const fn is_int(self) -> bool {
        matches!(
            self,
            Self::Int | Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64
        )
    }

    /// Unsigned integer kinds, `uintptr` included.
    #[must_use]
    pub const fn is_uint(self) -> bool {
        matches!(
            self,
            Self::Uint | Self::Uint8 | Self::Uint16 | Self::Uint32 | Self::Uint64 | Self::Uintptr
        )
    }

    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    #[must_use]
    pub const fn is_complex(self) -> bool {
        matches!(self, Self::Complex64 | Self::Complex128)
    }

    /// Scalar kinds with no components: everything up to `Complex128`,
    /// plus `String` and `UnsafePointer`.
    #[must_use]
    pub const fn is_basic(self) -> bool {
        (self as u8) <= (Self::Complex128 as u8)
            || matches!(self, Self::String | Self::UnsafePointer)
    }

    /// Kinds whose whole representation is one pointer word.
    #[must_use]
    pub const fn is_pointer_shaped(self) -> bool {
        matches!(
            self,
            Self::Pointer | Self::Map | Self::Chan | Self::Func | Self::UnsafePointer
        )
    }

    /// Kinds for which `is_nil` is defined.
    #[must_use]
    pub const fn is_nillable(self) -> bool {
        matches!(
            self,
            Self::Chan
                | Self::Func
                | Self::Map
                | Self::Pointer
                | Self::UnsafePointer
                | Self::Interface
                | Self::Slice
        )
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
