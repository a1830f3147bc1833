// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed getters and size queries.

use super::Value;
use crate::complex::{Complex128, Complex64};
use crate::error::{raise, Error, OrRaise, Result};
use crate::objects::{SliceHeader, StringHeader};
use crate::types::Kind;

#[track_caller]
fn mismatch(method: &'static str, kind: Kind) -> ! {
    raise(Error::KindMismatch { method, kind })
}

impl Value {
    #[inline]
    pub(crate) fn slice_header(&self) -> SliceHeader {
        // SAFETY: slices are never direct; ptr refers to a header.
        unsafe { *self.ptr.cast::<SliceHeader>() }
    }

    #[inline]
    pub(crate) fn string_header(&self) -> StringHeader {
        // SAFETY: strings are never direct; ptr refers to a header.
        unsafe { *self.ptr.cast::<StringHeader>() }
    }

    #[track_caller]
    #[must_use]
    pub fn bool(&self) -> bool {
        if self.kind() != Kind::Bool {
            mismatch("Value::bool", self.kind());
        }
        // SAFETY: bool storage.
        unsafe { *self.ptr.cast::<bool>() }
    }

    /// Signed integer value, widened to `i64`.
    #[track_caller]
    #[must_use]
    pub fn int(&self) -> i64 {
        let p = self.ptr.cast_const();
        // SAFETY: the kind fixes the width of the storage.
        unsafe {
            match self.kind() {
                Kind::Int => *p.cast::<isize>() as i64,
                Kind::Int8 => *p.cast::<i8>() as i64,
                Kind::Int16 => *p.cast::<i16>() as i64,
                Kind::Int32 => *p.cast::<i32>() as i64,
                Kind::Int64 => *p.cast::<i64>(),
                k => mismatch("Value::int", k),
            }
        }
    }

    /// Unsigned integer value, widened to `u64`.
    #[track_caller]
    #[must_use]
    pub fn uint(&self) -> u64 {
        let p = self.ptr.cast_const();
        // SAFETY: the kind fixes the width of the storage.
        unsafe {
            match self.kind() {
                Kind::Uint | Kind::Uintptr => *p.cast::<usize>() as u64,
                Kind::Uint8 => *p as u64,
                Kind::Uint16 => *p.cast::<u16>() as u64,
                Kind::Uint32 => *p.cast::<u32>() as u64,
                Kind::Uint64 => *p.cast::<u64>(),
                k => mismatch("Value::uint", k),
            }
        }
    }

    #[track_caller]
    #[must_use]
    pub fn float(&self) -> f64 {
        // SAFETY: the kind fixes the width of the storage.
        unsafe {
            match self.kind() {
                Kind::Float32 => *self.ptr.cast::<f32>() as f64,
                Kind::Float64 => *self.ptr.cast::<f64>(),
                k => mismatch("Value::float", k),
            }
        }
    }

    #[track_caller]
    #[must_use]
    pub fn complex(&self) -> Complex128 {
        // SAFETY: the kind fixes the width of the storage.
        unsafe {
            match self.kind() {
                Kind::Complex64 => (*self.ptr.cast::<Complex64>()).into(),
                Kind::Complex128 => *self.ptr.cast::<Complex128>(),
                k => mismatch("Value::complex", k),
            }
        }
    }

    /// Contents of a string value. Other kinds render as `<T Value>`.
    ///
    /// Bytes that are not valid UTF-8 are replaced with U+FFFD; use
    /// [`Value::string_bytes`] for the raw bytes.
    #[must_use]
    pub fn string(&self) -> String {
        match self.kind() {
            Kind::Invalid => "<invalid Value>".to_owned(),
            Kind::String => String::from_utf8_lossy(&self.string_bytes()).into_owned(),
            _ => format!("<{} Value>", self.typ()),
        }
    }

    /// Raw bytes of a string value.
    #[track_caller]
    #[must_use]
    pub fn string_bytes(&self) -> Vec<u8> {
        if self.kind() != Kind::String {
            mismatch("Value::string_bytes", self.kind());
        }
        // SAFETY: string headers always describe readable bytes.
        unsafe { self.string_header().as_bytes().to_vec() }
    }

    /// Contents of a `[]byte` or of an addressable `[N]byte`.
    #[track_caller]
    #[must_use]
    pub fn bytes(&self) -> Vec<u8> {
        let t = self.typ();
        match self.kind() {
            Kind::Slice if t.elem().kind() == Kind::Uint8 => {
                let h = self.slice_header();
                if h.len == 0 {
                    return Vec::new();
                }
                // SAFETY: the header covers len bytes.
                unsafe { std::slice::from_raw_parts(h.data, h.len).to_vec() }
            }
            Kind::Array if t.elem().kind() == Kind::Uint8 => {
                if !self.can_addr() {
                    raise(Error::NotAddressable {
                        method: "Value::bytes",
                    });
                }
                // SAFETY: addressable arrays are stored indirectly.
                unsafe { std::slice::from_raw_parts(self.ptr, t.len()).to_vec() }
            }
            k => mismatch("Value::bytes", k),
        }
    }

    /// Address held by a pointer-shaped value, or the data address of a
    /// slice, as an integer.
    #[track_caller]
    #[must_use]
    pub fn pointer(&self) -> usize {
        self.unsafe_pointer() as usize
    }

    #[track_caller]
    #[must_use]
    pub fn unsafe_pointer(&self) -> *mut u8 {
        match self.kind() {
            Kind::Pointer | Kind::Chan | Kind::Map | Kind::UnsafePointer => self.word(),
            Kind::Func if self.flag.is_method() => raise(Error::KindMismatch {
                method: "Value::pointer of method",
                kind: Kind::Func,
            }),
            Kind::Func => self.word(),
            Kind::Slice => self.slice_header().data,
            k => mismatch("Value::pointer", k),
        }
    }

    /// Whether a nillable value is nil. Raises for kinds that cannot be.
    #[track_caller]
    #[must_use]
    pub fn is_nil(&self) -> bool {
        match self.kind() {
            Kind::Func if self.flag.is_method() => false,
            Kind::Chan | Kind::Func | Kind::Map | Kind::Pointer | Kind::UnsafePointer => {
                self.word().is_null()
            }
            // SAFETY: both are stored indirectly, first word is the data or type word.
            Kind::Interface | Kind::Slice => unsafe { (*self.ptr.cast::<*const u8>()).is_null() },
            k => mismatch("Value::is_nil", k),
        }
    }

    /// Whether the value is the zero value of its type.
    #[track_caller]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match self.kind() {
            Kind::Invalid => raise(Error::UsageOnZeroValue {
                method: "Value::is_zero",
            }),
            Kind::Bool => !self.bool(),
            k if k.is_int() => self.int() == 0,
            k if k.is_uint() => self.uint() == 0,
            Kind::Float32 | Kind::Float64 => self.float().to_bits() == 0,
            Kind::Complex64 | Kind::Complex128 => {
                let c = self.complex();
                c.re.to_bits() == 0 && c.im.to_bits() == 0
            }
            Kind::Array => {
                let t = self.typ();
                if t.regular_memory() {
                    return self.raw_bytes().iter().all(|b| *b == 0);
                }
                (0..t.len()).all(|i| self.index(i).is_zero())
            }
            Kind::Chan | Kind::Func | Kind::Map | Kind::Pointer | Kind::UnsafePointer => {
                self.is_nil()
            }
            Kind::Interface | Kind::Slice => self.is_nil(),
            Kind::String => self.string_header().len == 0,
            Kind::Struct => {
                let t = self.typ();
                if t.regular_memory() {
                    return self.raw_bytes().iter().all(|b| *b == 0);
                }
                t.field_descs()
                    .iter()
                    .enumerate()
                    .all(|(i, f)| f.name == "_" || self.field(i).is_zero())
            }
            k => mismatch("Value::is_zero", k),
        }
    }

    fn raw_bytes(&self) -> &[u8] {
        let n = self.typ.map_or(0, |t| t.size());
        if n == 0 {
            return &[];
        }
        // SAFETY: data() covers size bytes while self is borrowed.
        unsafe { std::slice::from_raw_parts(self.data(), n) }
    }

    /// Length of an array, chan, map, slice, string or pointer to array.
    #[track_caller]
    #[must_use]
    pub fn len(&self) -> usize {
        self.try_len().or_raise()
    }

    pub fn try_len(&self) -> Result<usize> {
        let t = self.rtype("Value::len")?;
        match self.kind() {
            Kind::Array => Ok(t.len()),
            Kind::Chan => Ok(self.chan_object().map_or(0, |c| c.len())),
            Kind::Map => Ok(self.map_object().map_or(0, |m| m.len())),
            Kind::Slice => Ok(self.slice_header().len),
            Kind::String => Ok(self.string_header().len),
            Kind::Pointer if t.elem().kind() == Kind::Array => Ok(t.elem().len()),
            k => Err(Error::KindMismatch {
                method: "Value::len",
                kind: k,
            }),
        }
    }

    /// Capacity of an array, chan, slice or pointer to array.
    #[track_caller]
    #[must_use]
    pub fn cap(&self) -> usize {
        let t = self.typ();
        match self.kind() {
            Kind::Array => t.len(),
            Kind::Chan => self.chan_object().map_or(0, |c| c.cap()),
            Kind::Slice => self.slice_header().cap,
            Kind::Pointer if t.elem().kind() == Kind::Array => t.elem().len(),
            k => mismatch("Value::cap", k),
        }
    }

    // -----------------------------------------------------------------------
    // Overflow checks
    // -----------------------------------------------------------------------

    /// Whether `x` cannot be represented by this signed integer value's type.
    #[track_caller]
    #[must_use]
    pub fn overflow_int(&self, x: i64) -> bool {
        match self.kind() {
            k if k.is_int() => {
                let bits = self.typ().size() * 8;
                let trunc = (x << (64 - bits)) >> (64 - bits);
                x != trunc
            }
            k => mismatch("Value::overflow_int", k),
        }
    }

    /// Whether `x` cannot be represented by this unsigned integer value's type.
    #[track_caller]
    #[must_use]
    pub fn overflow_uint(&self, x: u64) -> bool {
        match self.kind() {
            k if k.is_uint() => {
                let bits = self.typ().size() * 8;
                let trunc = (x << (64 - bits)) >> (64 - bits);
                x != trunc
            }
            k => mismatch("Value::overflow_uint", k),
        }
    }

    /// Whether `x` overflows this float value's type.
    #[track_caller]
    #[must_use]
    pub fn overflow_float(&self, x: f64) -> bool {
        match self.kind() {
            Kind::Float32 => {
                let ax = x.abs();
                ax > f32::MAX as f64 && ax.is_finite()
            }
            Kind::Float64 => false,
            k => mismatch("Value::overflow_float", k),
        }
    }

    #[must_use]
    pub fn can_int(&self) -> bool {
        self.kind().is_int()
    }

    #[must_use]
    pub fn can_uint(&self) -> bool {
        self.kind().is_uint()
    }

    #[must_use]
    pub fn can_float(&self) -> bool {
        self.kind().is_float()
    }

    #[must_use]
    pub fn can_complex(&self) -> bool {
        self.kind().is_complex()
    }
}
