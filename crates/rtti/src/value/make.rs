// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Constructors. All storage comes from the installed heap hook.

use super::{Flag, Value};
use crate::error::{raise, Error};
use crate::heap;
use crate::objects::{ChanObject, MapObject, SliceHeader};
use crate::synth::pointer_to;
use crate::types::{Kind, Type};

#[track_caller]
fn must_kind(t: Type, kind: Kind, method: &'static str) {
    if t.kind() != kind {
        raise(Error::KindMismatch {
            method,
            kind: t.kind(),
        });
    }
}

/// Zero value of `t`; not addressable.
#[must_use]
pub fn zero(t: Type) -> Value {
    let fl = Flag::from_kind(t.kind());
    if t.is_direct_iface() {
        return Value::from_parts(t, std::ptr::null_mut(), fl);
    }
    Value::from_parts(t, heap::alloc(t), fl.with(Flag::INDIR))
}

/// Pointer to freshly allocated zero storage of type `t`.
#[must_use]
pub fn new(t: Type) -> Value {
    let p = heap::alloc(t);
    Value::from_parts(pointer_to(t), p, Flag::from_kind(Kind::Pointer))
}

/// Pointer value of type `*t` holding `p`.
///
/// # Safety
/// `p` must be null or point at a value of type `t` that stays valid for
/// as long as the returned handle (or anything derived from it) is used.
#[must_use]
pub unsafe fn new_at(t: Type, p: *mut u8) -> Value {
    Value::from_parts(pointer_to(t), p, Flag::from_kind(Kind::Pointer))
}

/// Slice of type `t` with `len` zeroed elements and room for `cap`.
#[track_caller]
#[must_use]
pub fn make_slice(t: Type, len: usize, cap: usize) -> Value {
    must_kind(t, Kind::Slice, "make_slice");
    if len > cap {
        raise(Error::SliceBounds {
            low: 0,
            high: len,
            max: cap,
            cap,
        });
    }
    let data = heap::alloc_array(t.elem(), cap);
    Value::slice_value(t, SliceHeader { data, len, cap }, Flag::default())
}

/// Empty map of type `t`.
#[track_caller]
#[must_use]
pub fn make_map(t: Type) -> Value {
    make_map_with_size(t, 0)
}

/// Empty map of type `t` with room for about `n` entries.
#[track_caller]
#[must_use]
pub fn make_map_with_size(t: Type, n: usize) -> Value {
    must_kind(t, Kind::Map, "make_map");
    let m = heap::retain(MapObject::new(t.key(), t.elem(), n));
    let word = (m as *const MapObject).cast_mut().cast::<u8>();
    Value::from_parts(t, word, Flag::from_kind(Kind::Map))
}

/// Bidirectional channel of type `t` with `buffer` slots.
#[track_caller]
#[must_use]
pub fn make_chan(t: Type, buffer: usize) -> Value {
    must_kind(t, Kind::Chan, "make_chan");
    if !t.chan_dir().can_send() || !t.chan_dir().can_recv() {
        raise(Error::ChanDirection {
            method: "make_chan",
            dir: t.chan_dir().to_string(),
        });
    }
    let c = heap::retain(ChanObject::new(t.elem(), buffer));
    let word = (c as *const ChanObject).cast_mut().cast::<u8>();
    Value::from_parts(t, word, Flag::from_kind(Kind::Chan))
}

/// `v.elem()` for pointers, `v` otherwise.
#[track_caller]
#[must_use]
pub fn indirect(v: Value) -> Value {
    if v.kind() != Kind::Pointer {
        return v;
    }
    v.elem()
}
