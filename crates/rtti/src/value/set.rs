// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Mutation: the `set*` family, slice growth, `append` and `copy`.
//!
//! Every setter requires an addressable handle that was not obtained
//! through an unexported field.

use super::Value;
use crate::complex::{Complex128, Complex64};
use crate::error::{raise, Error, OrRaise, Result};
use crate::heap;
use crate::objects::{SliceHeader, StringHeader};
use crate::types::{Kind, Type};

#[track_caller]
fn mismatch(method: &'static str, kind: Kind) -> ! {
    raise(Error::KindMismatch { method, kind })
}

impl Value {
    #[track_caller]
    fn settable(&self, method: &'static str) -> Type {
        if let Err(e) = self.must_be_assignable(method) {
            raise(e);
        }
        self.typ()
    }

    /// Assign `x` to this value. `x` must be assignable to the value's type.
    #[track_caller]
    pub fn set(&self, x: Value) {
        self.try_set(x).or_raise();
    }

    pub fn try_set(&self, x: Value) -> Result<()> {
        self.must_be_assignable("Value::set")?;
        x.must_be_exported("Value::set")?;
        let t = self.rtype("Value::set")?;
        let x = x.try_assign_to("Value::set", t)?;
        // SAFETY: self is addressable storage of type t.
        unsafe { x.store_to(self.ptr) };
        Ok(())
    }

    #[track_caller]
    pub fn set_bool(&self, x: bool) {
        self.settable("Value::set_bool");
        if self.kind() != Kind::Bool {
            mismatch("Value::set_bool", self.kind());
        }
        // SAFETY: bool storage.
        unsafe { *self.ptr.cast::<bool>() = x };
    }

    /// Store `x`, truncated to the width of the value's signed type.
    #[track_caller]
    pub fn set_int(&self, x: i64) {
        self.settable("Value::set_int");
        let p = self.ptr;
        // SAFETY: the kind fixes the width of the storage.
        unsafe {
            match self.kind() {
                Kind::Int => *p.cast::<isize>() = x as isize,
                Kind::Int8 => *p.cast::<i8>() = x as i8,
                Kind::Int16 => *p.cast::<i16>() = x as i16,
                Kind::Int32 => *p.cast::<i32>() = x as i32,
                Kind::Int64 => *p.cast::<i64>() = x,
                k => mismatch("Value::set_int", k),
            }
        }
    }

    /// Store `x`, truncated to the width of the value's unsigned type.
    #[track_caller]
    pub fn set_uint(&self, x: u64) {
        self.settable("Value::set_uint");
        let p = self.ptr;
        // SAFETY: the kind fixes the width of the storage.
        unsafe {
            match self.kind() {
                Kind::Uint | Kind::Uintptr => *p.cast::<usize>() = x as usize,
                Kind::Uint8 => *p = x as u8,
                Kind::Uint16 => *p.cast::<u16>() = x as u16,
                Kind::Uint32 => *p.cast::<u32>() = x as u32,
                Kind::Uint64 => *p.cast::<u64>() = x,
                k => mismatch("Value::set_uint", k),
            }
        }
    }

    #[track_caller]
    pub fn set_float(&self, x: f64) {
        self.settable("Value::set_float");
        // SAFETY: the kind fixes the width of the storage.
        unsafe {
            match self.kind() {
                Kind::Float32 => *self.ptr.cast::<f32>() = x as f32,
                Kind::Float64 => *self.ptr.cast::<f64>() = x,
                k => mismatch("Value::set_float", k),
            }
        }
    }

    #[track_caller]
    pub fn set_complex(&self, x: Complex128) {
        self.settable("Value::set_complex");
        // SAFETY: the kind fixes the width of the storage.
        unsafe {
            match self.kind() {
                Kind::Complex64 => *self.ptr.cast::<Complex64>() = x.into(),
                Kind::Complex128 => *self.ptr.cast::<Complex128>() = x,
                k => mismatch("Value::set_complex", k),
            }
        }
    }

    /// Store a copy of `x` in a string value.
    #[track_caller]
    pub fn set_string(&self, x: &str) {
        self.set_string_bytes(x.as_bytes());
    }

    /// Store a copy of arbitrary bytes in a string value.
    #[track_caller]
    pub fn set_string_bytes(&self, x: &[u8]) {
        let t = self.settable("Value::set_string");
        if self.kind() != Kind::String {
            mismatch("Value::set_string", self.kind());
        }
        // SAFETY: string storage.
        unsafe { *self.ptr.cast::<StringHeader>() = StringHeader::copied(x) };
        heap::write_barrier(self.ptr, t);
    }

    /// Store a copy of `x` in a `[]byte` value.
    #[track_caller]
    pub fn set_bytes(&self, x: &[u8]) {
        let t = self.settable("Value::set_bytes");
        if self.kind() != Kind::Slice || t.elem().kind() != Kind::Uint8 {
            mismatch("Value::set_bytes", self.kind());
        }
        let data = heap::alloc_bytes(x.len());
        // SAFETY: data has room for x.len() bytes; self is slice storage.
        unsafe {
            if !x.is_empty() {
                std::ptr::copy_nonoverlapping(x.as_ptr(), data, x.len());
            }
            *self.ptr.cast::<SliceHeader>() = SliceHeader {
                data,
                len: x.len(),
                cap: x.len(),
            };
        }
        heap::write_barrier(self.ptr, t);
    }

    #[track_caller]
    pub fn set_pointer(&self, p: *mut u8) {
        let t = self.settable("Value::set_pointer");
        if self.kind() != Kind::UnsafePointer {
            mismatch("Value::set_pointer", self.kind());
        }
        // SAFETY: one-word storage.
        unsafe { *self.ptr.cast::<*mut u8>() = p };
        heap::write_barrier(self.ptr, t);
    }

    /// Overwrite with the zero value of the type.
    #[track_caller]
    pub fn set_zero(&self) {
        let t = self.settable("Value::set_zero");
        // SAFETY: addressable storage of type t.
        unsafe { heap::typed_zero(t, self.ptr) };
    }

    /// Change a slice's length within its capacity.
    #[track_caller]
    pub fn set_len(&self, n: usize) {
        self.settable("Value::set_len");
        if self.kind() != Kind::Slice {
            mismatch("Value::set_len", self.kind());
        }
        let mut h = self.slice_header();
        if n > h.cap {
            raise(Error::SliceBounds {
                low: 0,
                high: n,
                max: h.cap,
                cap: h.cap,
            });
        }
        h.len = n;
        // SAFETY: slice storage.
        unsafe { *self.ptr.cast::<SliceHeader>() = h };
    }

    /// Shrink a slice's capacity, not below its length.
    #[track_caller]
    pub fn set_cap(&self, n: usize) {
        self.settable("Value::set_cap");
        if self.kind() != Kind::Slice {
            mismatch("Value::set_cap", self.kind());
        }
        let mut h = self.slice_header();
        if n < h.len || n > h.cap {
            raise(Error::SliceBounds {
                low: 0,
                high: h.len,
                max: n,
                cap: h.cap,
            });
        }
        h.cap = n;
        // SAFETY: slice storage.
        unsafe { *self.ptr.cast::<SliceHeader>() = h };
    }

    /// Make room for `n` more elements without changing the length.
    #[track_caller]
    pub fn grow(&self, n: usize) {
        let t = self.settable("Value::grow");
        if self.kind() != Kind::Slice {
            mismatch("Value::grow", self.kind());
        }
        let h = self.slice_header();
        let Some(need) = h.len.checked_add(n) else {
            raise(Error::SliceBounds {
                low: 0,
                high: usize::MAX,
                max: usize::MAX,
                cap: h.cap,
            })
        };
        if need > h.cap {
            let grown = grow_header(t.elem(), h, need);
            // SAFETY: slice storage.
            unsafe { *self.ptr.cast::<SliceHeader>() = grown };
            heap::write_barrier(self.ptr, t);
        }
    }

    /// Copy of this slice extended by `n` zeroed (or stale) elements,
    /// reallocating when the capacity is exceeded. The result shares the
    /// backing array when it fits, so the source must not be read-only.
    pub(crate) fn extend_slice(&self, n: usize) -> Result<Value> {
        self.must_be_exported("append")?;
        let t = self.must_be(Kind::Slice, "append")?;
        let h = self.slice_header();
        let need = h.len + n;
        let mut out = if need > h.cap {
            grow_header(t.elem(), h, need)
        } else {
            h
        };
        out.len = need;
        Ok(Value::slice_value(t, out, self.flag.ro()))
    }
}

/// Capacity growth policy: double small slices, grow large ones by ~25%.
fn next_cap(old: usize, need: usize) -> usize {
    let double = old.saturating_mul(2);
    if need > double {
        return need;
    }
    if old < 256 {
        return double.max(need);
    }
    let mut cap = old;
    while cap < need {
        cap = cap.saturating_add((cap + 3 * 256) / 4);
    }
    cap
}

/// Header over a fresh backing array of at least `need` elements holding a
/// copy of `h`'s elements.
fn grow_header(elem: Type, h: SliceHeader, need: usize) -> SliceHeader {
    let cap = next_cap(h.cap, need);
    let data = heap::alloc_array(elem, cap);
    // SAFETY: the new array holds cap >= h.len elements.
    unsafe { heap::typed_copy_n(elem, data, h.data, h.len) };
    SliceHeader {
        data,
        len: h.len,
        cap,
    }
}

/// `append(s, xs...)`: a slice value holding `s`'s elements followed by `xs`.
#[track_caller]
#[must_use]
pub fn append(s: Value, xs: &[Value]) -> Value {
    s.must_be(Kind::Slice, "append").or_raise();
    let n = s.len();
    let out = s.extend_slice(xs.len()).or_raise();
    for (i, x) in xs.iter().enumerate() {
        out.index(n + i).set(*x);
    }
    out
}

/// `append(s, t...)` for two slices with the same element type.
#[track_caller]
#[must_use]
pub fn append_slice(s: Value, t: Value) -> Value {
    let st = s.must_be(Kind::Slice, "append_slice").or_raise();
    let tt = t.must_be(Kind::Slice, "append_slice").or_raise();
    if st.elem() != tt.elem() {
        raise(Error::NotAssignable {
            context: "append_slice",
            from: tt.string().to_owned(),
            to: st.string().to_owned(),
        });
    }
    t.must_be_exported("append_slice").or_raise();
    let (ns, nt) = (s.len(), t.len());
    let out = s.extend_slice(nt).or_raise();
    copy(out.slice3(ns, ns + nt, ns + nt), t);
    out
}

/// Copy elements from `src` into `dst` (a slice or an addressable array);
/// returns the number copied. A `[]byte`/`[N]byte` destination also
/// accepts a string source.
#[track_caller]
pub fn copy(dst: Value, src: Value) -> usize {
    let dt = dst.typ();
    let (dbase, dlen) = match dst.kind() {
        Kind::Array => {
            if let Err(e) = dst.must_be_assignable("copy") {
                raise(e);
            }
            (dst.ptr, dt.len())
        }
        Kind::Slice => {
            if let Err(e) = dst.must_be_exported("copy") {
                raise(e);
            }
            let h = dst.slice_header();
            (h.data, h.len)
        }
        k => mismatch("copy", k),
    };
    let elem = dt.elem();

    if let Err(e) = src.must_be_exported("copy") {
        raise(e);
    }
    let st = src.typ();
    let (sbase, slen): (*const u8, usize) = match src.kind() {
        Kind::Array => (src.data(), st.len()),
        Kind::Slice => {
            let h = src.slice_header();
            (h.data, h.len)
        }
        Kind::String if elem.kind() == Kind::Uint8 => {
            let h = src.string_header();
            (h.data, h.len)
        }
        k => mismatch("copy", k),
    };
    if src.kind() != Kind::String && st.elem() != elem {
        raise(Error::NotAssignable {
            context: "copy",
            from: st.string().to_owned(),
            to: dt.string().to_owned(),
        });
    }

    let n = dlen.min(slen);
    // SAFETY: both ranges hold at least n elements; copy handles overlap.
    unsafe { heap::typed_copy_n(elem, dbase, sbase, n) };
    n
}

#[cfg(test)]
mod tests {
    use super::next_cap;

    #[test]
    fn test_next_cap_policy() {
        assert_eq!(next_cap(0, 1), 1);
        assert_eq!(next_cap(4, 5), 8);
        assert_eq!(next_cap(4, 20), 20);
        assert!(next_cap(1024, 1025) >= 1025);
        assert!(next_cap(1024, 1025) < 2048);
    }
}
