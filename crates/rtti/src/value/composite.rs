// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Traversal: struct fields, indexing, dereference, slicing, methods.
//!
//! Provenance rules:
//!
//! - A field keeps its parent's `INDIR`/`ADDR` bits and `STICKY_RO`. An
//!   unexported field adds `EMBED_RO` when embedded, `STICKY_RO` otherwise.
//!   `EMBED_RO` is not inherited, so exported fields promoted through an
//!   unexported embedded struct stay settable.
//! - Array elements share the array's storage and bits; slice elements are
//!   always addressable.
//! - Dereferencing yields an addressable value, or the zero handle for nil.

use super::{Flag, Value};
use crate::error::{raise, Error, OrRaise, Result};
use crate::heap;
use crate::iface;
use crate::objects::{SliceHeader, StringHeader};
use crate::synth::{pointer_to, slice_of};
use crate::types::{Kind, Type};

impl Value {
    // -----------------------------------------------------------------------
    // Structs
    // -----------------------------------------------------------------------

    #[track_caller]
    #[must_use]
    pub fn num_field(&self) -> usize {
        match self.must_be(Kind::Struct, "Value::num_field") {
            Ok(t) => t.num_field(),
            Err(e) => raise(e),
        }
    }

    /// `i`th field of a struct.
    #[track_caller]
    #[must_use]
    pub fn field(&self, i: usize) -> Value {
        self.try_field(i).or_raise()
    }

    pub fn try_field(&self, i: usize) -> Result<Value> {
        let t = self.must_be(Kind::Struct, "Value::field")?;
        let fields = t.field_descs();
        let Some(f) = fields.get(i) else {
            return Err(Error::IndexOutOfRange {
                method: "Value::field",
                index: i,
                len: fields.len(),
            });
        };
        let mut fl = self
            .flag
            .only(Flag::STICKY_RO.with(Flag::INDIR).with(Flag::ADDR))
            .with(Flag::from_kind(f.typ.kind()));
        if !f.exported() {
            fl = fl.with(if f.embedded {
                Flag::EMBED_RO
            } else {
                Flag::STICKY_RO
            });
        }
        // Direct single-field structs keep the field's word in ptr.
        let ptr = if self.flag.is_indirect() {
            // SAFETY: offset lies within the struct's storage.
            unsafe { self.ptr.add(f.offset) }
        } else {
            self.ptr
        };
        Ok(Value::from_parts(f.typ, ptr, fl))
    }

    /// Nested field reached through an index path, following embedded
    /// pointers. Raises when an embedded pointer on the path is nil.
    #[track_caller]
    #[must_use]
    pub fn field_by_index(&self, index: &[usize]) -> Value {
        self.try_field_by_index(index).or_raise()
    }

    pub fn try_field_by_index(&self, index: &[usize]) -> Result<Value> {
        let mut v = *self;
        for (depth, &i) in index.iter().enumerate() {
            if depth > 0 && v.kind() == Kind::Pointer {
                let t = v.rtype("Value::field_by_index")?;
                if t.elem().kind() == Kind::Struct {
                    if v.is_nil() {
                        return Err(Error::UsageOnZeroValue {
                            method: "Value::field_by_index (nil embedded pointer)",
                        });
                    }
                    v = v.try_elem()?;
                }
            }
            v = v.try_field(i)?;
        }
        Ok(v)
    }

    /// Field by name, promoted through embedded structs. `None` when absent
    /// or ambiguous.
    #[track_caller]
    #[must_use]
    pub fn field_by_name(&self, name: &str) -> Option<Value> {
        let t = self.must_be(Kind::Struct, "Value::field_by_name").or_raise();
        let f = t.field_by_name(name)?;
        Some(self.field_by_index(&f.index))
    }

    #[track_caller]
    pub fn field_by_name_func(&self, matches: impl Fn(&str) -> bool) -> Option<Value> {
        let t = self
            .must_be(Kind::Struct, "Value::field_by_name_func")
            .or_raise();
        let f = t.field_by_name_func(matches)?;
        Some(self.field_by_index(&f.index))
    }

    // -----------------------------------------------------------------------
    // Indexing
    // -----------------------------------------------------------------------

    /// Element `i` of an array, slice or string. Out of range raises.
    #[track_caller]
    #[must_use]
    pub fn index(&self, i: usize) -> Value {
        self.try_index(i).or_raise()
    }

    pub fn try_index(&self, i: usize) -> Result<Value> {
        let t = self.rtype("Value::index")?;
        let out_of_range = |len| Error::IndexOutOfRange {
            method: "Value::index",
            index: i,
            len,
        };
        match self.kind() {
            Kind::Array => {
                if i >= t.len() {
                    return Err(out_of_range(t.len()));
                }
                let elem = t.elem();
                let fl = self
                    .flag
                    .only(Flag::INDIR.with(Flag::ADDR))
                    .with(self.flag.ro())
                    .with(Flag::from_kind(elem.kind()));
                let ptr = if self.flag.is_indirect() {
                    // SAFETY: i < len.
                    unsafe { self.ptr.add(i * elem.size()) }
                } else {
                    self.ptr
                };
                Ok(Value::from_parts(elem, ptr, fl))
            }
            Kind::Slice => {
                let h = self.slice_header();
                if i >= h.len {
                    return Err(out_of_range(h.len));
                }
                let elem = t.elem();
                let fl = Flag::ADDR
                    .with(Flag::INDIR)
                    .with(self.flag.ro())
                    .with(Flag::from_kind(elem.kind()));
                // SAFETY: i < len <= cap.
                let ptr = unsafe { h.data.add(i * elem.size()) };
                Ok(Value::from_parts(elem, ptr, fl))
            }
            Kind::String => {
                let h = self.string_header();
                if i >= h.len {
                    return Err(out_of_range(h.len));
                }
                let fl = self
                    .flag
                    .ro()
                    .with(Flag::INDIR)
                    .with(Flag::from_kind(Kind::Uint8));
                // SAFETY: i < len.
                let ptr = unsafe { h.data.add(i) }.cast_mut();
                Ok(Value::from_parts(
                    crate::types::basic(Kind::Uint8),
                    ptr,
                    fl,
                ))
            }
            k => Err(Error::KindMismatch {
                method: "Value::index",
                kind: k,
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Dereference
    // -----------------------------------------------------------------------

    /// Pointee of a pointer, or the dynamic value inside an interface.
    ///
    /// A nil pointer or nil interface gives the zero handle.
    #[track_caller]
    #[must_use]
    pub fn elem(&self) -> Value {
        self.try_elem().or_raise()
    }

    pub fn try_elem(&self) -> Result<Value> {
        let t = self.rtype("Value::elem")?;
        match self.kind() {
            Kind::Interface => {
                // SAFETY: interface values are stored indirectly.
                let e = unsafe { iface::read_interface(t, self.ptr) };
                let mut x = iface::unpack(e);
                if x.is_valid() {
                    x.flag = x.flag.with(self.flag.ro());
                }
                Ok(x)
            }
            Kind::Pointer => {
                let p = self.word();
                if p.is_null() {
                    return Ok(Value::invalid());
                }
                let elem = t.elem();
                let fl = self
                    .flag
                    .only(Flag::RO)
                    .with(Flag::INDIR)
                    .with(Flag::ADDR)
                    .with(Flag::from_kind(elem.kind()));
                Ok(Value::from_parts(elem, p, fl))
            }
            k => Err(Error::KindMismatch {
                method: "Value::elem",
                kind: k,
            }),
        }
    }

    /// Pointer to an addressable value.
    #[track_caller]
    #[must_use]
    pub fn addr(&self) -> Value {
        self.try_addr().or_raise()
    }

    pub fn try_addr(&self) -> Result<Value> {
        let t = self.rtype("Value::addr")?;
        if !self.flag.is_addressable() {
            return Err(Error::NotAddressable {
                method: "Value::addr",
            });
        }
        let fl = self.flag.ro().with(Flag::from_kind(Kind::Pointer));
        Ok(Value::from_parts(pointer_to(t), self.ptr, fl))
    }

    // -----------------------------------------------------------------------
    // Slicing
    // -----------------------------------------------------------------------

    /// `v[low:high]` of an addressable array, a slice or a string.
    #[track_caller]
    #[must_use]
    pub fn slice(&self, low: usize, high: usize) -> Value {
        self.try_slice(low, high).or_raise()
    }

    pub fn try_slice(&self, low: usize, high: usize) -> Result<Value> {
        if self.kind() == Kind::String {
            let t = self.rtype("Value::slice")?;
            let h = self.string_header();
            if low > high || high > h.len {
                return Err(Error::SliceBounds {
                    low,
                    high,
                    max: h.len,
                    cap: h.len,
                });
            }
            let sub = StringHeader {
                data: if high > low {
                    // SAFETY: low < len.
                    unsafe { h.data.add(low) }
                } else {
                    h.data
                },
                len: high - low,
            };
            let p = heap::alloc(t);
            // SAFETY: p is fresh string storage.
            unsafe { *p.cast::<StringHeader>() = sub };
            return Ok(Value::from_parts(
                t,
                p,
                self.flag
                    .ro()
                    .with(Flag::INDIR)
                    .with(Flag::from_kind(Kind::String)),
            ));
        }
        let cap = self.slice_base("Value::slice")?.2;
        self.try_slice3(low, high, cap)
    }

    /// `v[low:high:max]` of an addressable array or a slice.
    #[track_caller]
    #[must_use]
    pub fn slice3(&self, low: usize, high: usize, max: usize) -> Value {
        self.try_slice3(low, high, max).or_raise()
    }

    pub fn try_slice3(&self, low: usize, high: usize, max: usize) -> Result<Value> {
        let (typ, base, cap) = self.slice_base("Value::slice3")?;
        if low > high || high > max || max > cap {
            return Err(Error::SliceBounds {
                low,
                high,
                max,
                cap,
            });
        }
        let esize = typ.elem().size();
        let h = SliceHeader {
            data: if max > low {
                // SAFETY: low < max <= cap.
                unsafe { base.add(low * esize) }
            } else {
                base
            },
            len: high - low,
            cap: max - low,
        };
        Ok(Value::slice_value(typ, h, self.flag.ro()))
    }

    /// Slice type, backing data and capacity of a sliceable value.
    fn slice_base(&self, method: &'static str) -> Result<(Type, *mut u8, usize)> {
        let t = self.rtype(method)?;
        match self.kind() {
            Kind::Array => {
                if !self.flag.is_addressable() {
                    return Err(Error::NotAddressable { method });
                }
                Ok((slice_of(t.elem()), self.ptr, t.len()))
            }
            Kind::Slice => {
                let h = self.slice_header();
                Ok((t, h.data, h.cap))
            }
            k => Err(Error::KindMismatch { method, kind: k }),
        }
    }

    /// Fresh, non-addressable slice value holding `h`.
    pub(crate) fn slice_value(t: Type, h: SliceHeader, extra: Flag) -> Value {
        let p = heap::alloc(t);
        // SAFETY: p is fresh slice storage.
        unsafe { *p.cast::<SliceHeader>() = h };
        Value::from_parts(
            t,
            p,
            extra.with(Flag::INDIR).with(Flag::from_kind(Kind::Slice)),
        )
    }

    // -----------------------------------------------------------------------
    // Methods
    // -----------------------------------------------------------------------

    /// Number of methods in the value's method set.
    #[track_caller]
    #[must_use]
    pub fn num_method(&self) -> usize {
        let t = self
            .rtype("Value::num_method")
            .or_raise();
        if self.flag.is_method() {
            return 0;
        }
        t.num_method()
    }

    /// Method `i` bound to this value as receiver.
    #[track_caller]
    #[must_use]
    pub fn method(&self, i: usize) -> Value {
        self.try_method(i).or_raise()
    }

    pub fn try_method(&self, i: usize) -> Result<Value> {
        let t = self.rtype("Value::method")?;
        let n = if self.flag.is_method() { 0 } else { t.num_method() };
        if i >= n {
            return Err(Error::IndexOutOfRange {
                method: "Value::method",
                index: i,
                len: n,
            });
        }
        if t.kind() == Kind::Interface && self.is_nil() {
            return Err(Error::UsageOnZeroValue {
                method: "Value::method on nil interface value",
            });
        }
        let fl = self
            .flag
            .without(Flag::ADDR)
            .without(Flag::RO)
            .with(self.flag.ro())
            .bind_method(i);
        Ok(Value::from_parts(t, self.ptr, fl))
    }

    /// Method bound to this value, by name.
    #[must_use]
    pub fn method_by_name(&self, name: &str) -> Option<Value> {
        let t = self.typ?;
        if self.flag.is_method() {
            return None;
        }
        let m = t.method_by_name(name)?;
        self.try_method(m.index).ok()
    }
}
