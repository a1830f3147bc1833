// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `*T`, `[]T`, `[N]T`, `map[K]V` and `chan T`.

use super::build;
use super::cache::{canonical, CacheKey};
use crate::error::{OrRaise, Result};
use crate::types::{ChanDir, Kind, Type};

/// Pointer type with element `elem`.
#[must_use]
pub fn pointer_to(elem: Type) -> Type {
    if let Some(p) = elem.rtype().ptr_to_this.get() {
        return *p;
    }
    canonical(
        CacheKey::Pointer(elem),
        || build::pointer_string(elem),
        |t| t.kind() == Kind::Pointer && t.elem() == elem,
        |_| Ok(build::new_pointer(elem, None)),
    )
    .or_raise()
}

/// Slice type with element `elem`.
#[must_use]
pub fn slice_of(elem: Type) -> Type {
    canonical(
        CacheKey::Slice(elem),
        || build::slice_string(elem),
        |t| t.kind() == Kind::Slice && t.elem() == elem,
        |_| Ok(build::new_slice(elem)),
    )
    .or_raise()
}

/// Array type `[len]elem`. Raises when the array would not fit in memory.
#[track_caller]
#[must_use]
pub fn array_of(len: usize, elem: Type) -> Type {
    try_array_of(len, elem).or_raise()
}

pub fn try_array_of(len: usize, elem: Type) -> Result<Type> {
    canonical(
        CacheKey::Array(elem, len),
        || build::array_string(elem, len),
        |t| t.kind() == Kind::Array && t.elem() == elem && t.len() == len,
        |_| build::new_array(elem, len),
    )
}

/// Map type `map[key]elem`. Raises when `key` is not comparable.
#[track_caller]
#[must_use]
pub fn map_of(key: Type, elem: Type) -> Type {
    try_map_of(key, elem).or_raise()
}

pub fn try_map_of(key: Type, elem: Type) -> Result<Type> {
    canonical(
        CacheKey::Map(key, elem),
        || build::map_string(key, elem),
        |t| t.kind() == Kind::Map && t.key() == key && t.elem() == elem,
        |_| build::new_map(key, elem),
    )
}

/// Channel type with direction `dir` and element `elem`.
#[must_use]
pub fn chan_of(dir: ChanDir, elem: Type) -> Type {
    canonical(
        CacheKey::Chan(dir, elem),
        || build::chan_string(dir, elem),
        |t| t.kind() == Kind::Chan && t.chan_dir() == dir && t.elem() == elem,
        |_| Ok(build::new_chan(dir, elem)),
    )
    .or_raise()
}
