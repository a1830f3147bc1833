// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Compiled-in descriptors for the basic kinds, `unsafe.Pointer` and the
//! empty interface `interface {}`.

use super::alg;
use super::rtype::{fnv1a, RType, TFlag, TypeExt};
use super::{Kind, Type};
use crate::complex::{Complex128, Complex64};
use crate::config::WORD_SIZE;
use crate::error::{raise, Error};
use crate::layout::GcData;
use crate::objects::StringHeader;
use std::mem::{align_of, size_of};
use std::sync::OnceLock;

const SCALAR: TFlag = TFlag::REGULAR_MEMORY.union(TFlag::NAMED);

macro_rules! scalar_type {
    ($name:ident, $kind:expr, $repr:ty, $str:literal, $eq:expr, $tflag:expr) => {
        static $name: RType = RType {
            size: size_of::<$repr>(),
            ptrdata: 0,
            hash: fnv1a($str),
            tflag: $tflag,
            align: align_of::<$repr>() as u8,
            field_align: align_of::<$repr>() as u8,
            kind: $kind,
            equal: Some($eq),
            gcdata: GcData::Empty,
            str: $str,
            ptr_to_this: OnceLock::new(),
            uncommon: None,
            ext: TypeExt::None,
        };
    };
}

scalar_type!(BOOL, Kind::Bool, bool, "bool", alg::mem_equal, SCALAR);
scalar_type!(INT, Kind::Int, isize, "int", alg::mem_equal, SCALAR);
scalar_type!(INT8, Kind::Int8, i8, "int8", alg::mem_equal, SCALAR);
scalar_type!(INT16, Kind::Int16, i16, "int16", alg::mem_equal, SCALAR);
scalar_type!(INT32, Kind::Int32, i32, "int32", alg::mem_equal, SCALAR);
scalar_type!(INT64, Kind::Int64, i64, "int64", alg::mem_equal, SCALAR);
scalar_type!(UINT, Kind::Uint, usize, "uint", alg::mem_equal, SCALAR);
scalar_type!(UINT8, Kind::Uint8, u8, "uint8", alg::mem_equal, SCALAR);
scalar_type!(UINT16, Kind::Uint16, u16, "uint16", alg::mem_equal, SCALAR);
scalar_type!(UINT32, Kind::Uint32, u32, "uint32", alg::mem_equal, SCALAR);
scalar_type!(UINT64, Kind::Uint64, u64, "uint64", alg::mem_equal, SCALAR);
scalar_type!(UINTPTR, Kind::Uintptr, usize, "uintptr", alg::mem_equal, SCALAR);
scalar_type!(FLOAT32, Kind::Float32, f32, "float32", alg::f32_equal, TFlag::NAMED);
scalar_type!(FLOAT64, Kind::Float64, f64, "float64", alg::f64_equal, TFlag::NAMED);
scalar_type!(COMPLEX64, Kind::Complex64, Complex64, "complex64", alg::c64_equal, TFlag::NAMED);
scalar_type!(COMPLEX128, Kind::Complex128, Complex128, "complex128", alg::c128_equal, TFlag::NAMED);

static STRING: RType = RType {
    size: size_of::<StringHeader>(),
    ptrdata: WORD_SIZE,
    hash: fnv1a("string"),
    tflag: TFlag::NAMED,
    align: WORD_SIZE as u8,
    field_align: WORD_SIZE as u8,
    kind: Kind::String,
    equal: Some(alg::str_equal),
    gcdata: GcData::Mask(&[0b1]),
    str: "string",
    ptr_to_this: OnceLock::new(),
    uncommon: None,
    ext: TypeExt::None,
};

static UNSAFE_POINTER: RType = RType {
    size: WORD_SIZE,
    ptrdata: WORD_SIZE,
    hash: fnv1a("unsafe.Pointer"),
    tflag: TFlag::REGULAR_MEMORY
        .union(TFlag::DIRECT_IFACE)
        .union(TFlag::NAMED),
    align: WORD_SIZE as u8,
    field_align: WORD_SIZE as u8,
    kind: Kind::UnsafePointer,
    equal: Some(alg::mem_equal),
    gcdata: GcData::Mask(&[0b1]),
    str: "unsafe.Pointer",
    ptr_to_this: OnceLock::new(),
    uncommon: None,
    ext: TypeExt::None,
};

static EMPTY_INTERFACE: RType = RType {
    size: 2 * WORD_SIZE,
    ptrdata: 2 * WORD_SIZE,
    hash: fnv1a("interface {}"),
    tflag: TFlag::NONE,
    align: WORD_SIZE as u8,
    field_align: WORD_SIZE as u8,
    kind: Kind::Interface,
    equal: Some(alg::eface_equal),
    gcdata: GcData::Mask(&[0b11]),
    str: "interface {}",
    ptr_to_this: OnceLock::new(),
    uncommon: None,
    ext: TypeExt::Interface {
        pkg_path: "",
        methods: &[],
    },
};

/// Descriptor of a basic kind (`bool` through `complex128`, `string`,
/// `unsafe.Pointer`).
#[track_caller]
#[must_use]
pub fn basic(kind: Kind) -> Type {
    let r: &'static RType = match kind {
        Kind::Bool => &BOOL,
        Kind::Int => &INT,
        Kind::Int8 => &INT8,
        Kind::Int16 => &INT16,
        Kind::Int32 => &INT32,
        Kind::Int64 => &INT64,
        Kind::Uint => &UINT,
        Kind::Uint8 => &UINT8,
        Kind::Uint16 => &UINT16,
        Kind::Uint32 => &UINT32,
        Kind::Uint64 => &UINT64,
        Kind::Uintptr => &UINTPTR,
        Kind::Float32 => &FLOAT32,
        Kind::Float64 => &FLOAT64,
        Kind::Complex64 => &COMPLEX64,
        Kind::Complex128 => &COMPLEX128,
        Kind::String => &STRING,
        Kind::UnsafePointer => &UNSAFE_POINTER,
        other => raise(Error::KindMismatch {
            method: "types::basic",
            kind: other,
        }),
    };
    Type::from_static(r)
}

/// `interface {}`.
#[must_use]
pub fn empty_interface() -> Type {
    Type::from_static(&EMPTY_INTERFACE)
}

/// Every compiled-in descriptor, for registration in the descriptor table.
pub(crate) fn all() -> Vec<Type> {
    const KINDS: [Kind; 18] = [
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
        Kind::String,
        Kind::UnsafePointer,
    ];
    let mut out: Vec<Type> = KINDS.iter().map(|k| basic(*k)).collect();
    out.push(empty_interface());
    out
}
