// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Conversion engine.
//!
//! [`select_converter`] picks the rule that turns a value of one type into
//! another, or reports that none applies. Rules are tried in this order:
//!
//! 1. identical underlying layout (including unnamed pointers to identical
//!    types and bidirectional channels), which reinterprets the storage;
//! 2. numeric to numeric;
//! 3. numeric to text;
//! 4. byte or rune slices to and from text, slices to arrays;
//! 5. boxing into an interface the source implements;
//! 6. re-boxing between interfaces, preserving nil.
//!
//! An identical layout therefore never boxes, even when the destination is
//! an interface the source also implements.

mod assign;

pub(crate) use assign::{assignable, directly_assignable, identical_underlying, implements};

use crate::complex::{Complex128, Complex64};
use crate::error::{Error, OrRaise, Result};
use crate::heap;
use crate::iface;
use crate::objects::{SliceHeader, StringHeader};
use crate::types::{Kind, Type};
use crate::value::{zero, Flag, Value};

/// Conversion rule between two types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Converter {
    /// Reinterpret the same bytes as the destination type.
    Direct,
    Int,
    Uint,
    IntToFloat,
    UintToFloat,
    FloatToInt,
    FloatToUint,
    Float,
    Complex,
    /// Integer as a Unicode code point.
    IntToString,
    UintToString,
    BytesToString,
    StringToBytes,
    RunesToString,
    StringToRunes,
    SliceToArray,
    SliceToArrayPtr,
    /// Box a concrete value into an interface.
    ConcreteToInterface,
    /// Re-box an interface value, preserving nil.
    InterfaceToInterface,
}

/// Rule converting values of `src` to `dst`, if any.
#[must_use]
pub fn select_converter(src: Type, dst: Type) -> Option<Converter> {
    let (sk, dk) = (src.kind(), dst.kind());
    if identical_underlying(dst, src, false) {
        return Some(Converter::Direct);
    }
    if dk == Kind::Pointer
        && !dst.is_named()
        && sk == Kind::Pointer
        && !src.is_named()
        && identical_underlying(dst.elem(), src.elem(), false)
    {
        return Some(Converter::Direct);
    }
    if dk == Kind::Chan && sk == Kind::Chan && assign::special_channel_assignability(dst, src) {
        return Some(Converter::Direct);
    }

    let by_kind = match sk {
        _ if sk.is_int() => match dk {
            _ if dk.is_int() || dk.is_uint() => Some(Converter::Int),
            _ if dk.is_float() => Some(Converter::IntToFloat),
            Kind::String => Some(Converter::IntToString),
            _ => None,
        },
        _ if sk.is_uint() => match dk {
            _ if dk.is_int() || dk.is_uint() => Some(Converter::Uint),
            _ if dk.is_float() => Some(Converter::UintToFloat),
            Kind::String => Some(Converter::UintToString),
            _ => None,
        },
        _ if sk.is_float() => match dk {
            _ if dk.is_int() => Some(Converter::FloatToInt),
            _ if dk.is_uint() => Some(Converter::FloatToUint),
            _ if dk.is_float() => Some(Converter::Float),
            _ => None,
        },
        _ if sk.is_complex() => dk.is_complex().then_some(Converter::Complex),
        Kind::String if dk == Kind::Slice && dst.elem().pkg_path().is_empty() => {
            match dst.elem().kind() {
                Kind::Uint8 => Some(Converter::StringToBytes),
                Kind::Int32 => Some(Converter::StringToRunes),
                _ => None,
            }
        }
        Kind::Slice => {
            if dk == Kind::String && src.elem().pkg_path().is_empty() {
                match src.elem().kind() {
                    Kind::Uint8 => Some(Converter::BytesToString),
                    Kind::Int32 => Some(Converter::RunesToString),
                    _ => None,
                }
            } else if dk == Kind::Pointer
                && dst.elem().kind() == Kind::Array
                && src.elem() == dst.elem().elem()
            {
                Some(Converter::SliceToArrayPtr)
            } else if dk == Kind::Array && src.elem() == dst.elem() {
                Some(Converter::SliceToArray)
            } else {
                None
            }
        }
        _ => None,
    };
    if by_kind.is_some() {
        return by_kind;
    }

    if implements(dst, src) {
        return Some(if sk == Kind::Interface {
            Converter::InterfaceToInterface
        } else {
            Converter::ConcreteToInterface
        });
    }
    None
}

impl Converter {
    /// Apply the rule to `v`, producing a value of type `dst`.
    pub fn apply(self, v: Value, dst: Type) -> Result<Value> {
        let ro = v.flag.ro();
        Ok(match self {
            Self::Direct => direct(v, dst),
            Self::Int => make_int(ro, v.int() as u64, dst),
            Self::Uint => make_int(ro, v.uint(), dst),
            Self::IntToFloat => make_float(ro, v.int() as f64, dst),
            Self::UintToFloat => make_float(ro, v.uint() as f64, dst),
            Self::FloatToInt => make_int(ro, v.float() as i64 as u64, dst),
            Self::FloatToUint => make_int(ro, v.float() as u64, dst),
            Self::Float => {
                if v.kind() == Kind::Float32 && dst.kind() == Kind::Float32 {
                    // Same width: keep the exact bits, NaN payload included.
                    // SAFETY: float32 storage.
                    let f = unsafe { *v.data().cast::<f32>() };
                    make_f32(ro, f, dst)
                } else {
                    make_float(ro, v.float(), dst)
                }
            }
            Self::Complex => make_complex(ro, v.complex(), dst),
            Self::IntToString => make_string(ro, code_point(v.int()).as_bytes(), dst),
            Self::UintToString => {
                let c = i64::try_from(v.uint()).unwrap_or(-1);
                make_string(ro, code_point(c).as_bytes(), dst)
            }
            Self::BytesToString => make_string(ro, &v.bytes(), dst),
            Self::StringToBytes => make_slice_of_bytes(ro, &v.string_bytes(), dst),
            Self::RunesToString => {
                let s: String = (0..v.len())
                    .map(|i| code_point_char(v.index(i).int()))
                    .collect();
                make_string(ro, s.as_bytes(), dst)
            }
            Self::StringToRunes => {
                let runes: Vec<i32> = String::from_utf8_lossy(&v.string_bytes())
                    .chars()
                    .map(|c| c as i32)
                    .collect();
                make_runes(ro, &runes, dst)
            }
            Self::SliceToArray => {
                let h = v.slice_header();
                check_slice_len(h.len, dst.len())?;
                let p = heap::alloc(dst);
                // SAFETY: the slice holds at least dst.len() elements.
                unsafe { heap::typed_copy(dst, p, h.data) };
                Value::from_parts(dst, p, ro.with(Flag::INDIR).with(Flag::from_kind(Kind::Array)))
            }
            Self::SliceToArrayPtr => {
                let h = v.slice_header();
                check_slice_len(h.len, dst.elem().len())?;
                let p = if h.data.is_null() && dst.elem().len() == 0 {
                    heap::alloc(dst.elem())
                } else {
                    h.data
                };
                Value::from_parts(dst, p, ro.with(Flag::from_kind(Kind::Pointer)))
            }
            Self::ConcreteToInterface => box_into(v, dst, ro)?,
            Self::InterfaceToInterface => {
                if v.is_nil() {
                    let mut z = zero(dst);
                    z.flag = z.flag.with(ro);
                    z
                } else {
                    box_into(v.elem(), dst, ro)?
                }
            }
        })
    }
}

fn check_slice_len(have: usize, want: usize) -> Result<()> {
    if have < want {
        return Err(Error::IllegalShape {
            op: "Value::convert",
            reason: format!(
                "cannot convert slice with length {} to array or pointer to array with length {}",
                have, want
            ),
        });
    }
    Ok(())
}

/// Reuse `v`'s storage as a `dst`; addressable storage is copied first so
/// the result does not alias a mutable location.
fn direct(v: Value, dst: Type) -> Value {
    let mut ptr = v.ptr;
    let mut fl = v.flag.only(Flag::INDIR).with(v.flag.ro());
    if v.flag.is_addressable() {
        let c = heap::alloc(dst);
        // SAFETY: v.ptr holds a value whose layout is dst's.
        unsafe { heap::typed_copy(dst, c, v.ptr) };
        ptr = c;
        fl = fl.with(Flag::INDIR);
    }
    Value::from_parts(dst, ptr, fl.with(Flag::from_kind(dst.kind())))
}

fn box_into(v: Value, dst: Type, ro: Flag) -> Result<Value> {
    let x = iface::pack(v, false)?;
    let target = heap::alloc(dst);
    // SAFETY: target is fresh interface storage; the caller checked that
    // v's type implements dst.
    unsafe { iface::write_interface(dst, x, target) };
    Ok(Value::from_parts(
        dst,
        target,
        ro.with(Flag::INDIR).with(Flag::from_kind(Kind::Interface)),
    ))
}

fn code_point_char(c: i64) -> char {
    u32::try_from(c)
        .ok()
        .and_then(char::from_u32)
        .unwrap_or(char::REPLACEMENT_CHARACTER)
}

fn code_point(c: i64) -> String {
    code_point_char(c).to_string()
}

fn fresh(t: Type, ro: Flag) -> Value {
    Value::from_parts(
        t,
        heap::alloc(t),
        ro.with(Flag::INDIR).with(Flag::from_kind(t.kind())),
    )
}

/// Integer of type `t` holding the low bits of `bits`.
fn make_int(ro: Flag, bits: u64, t: Type) -> Value {
    let v = fresh(t, ro);
    // SAFETY: fresh storage of t's width.
    unsafe {
        match t.size() {
            1 => *v.ptr = bits as u8,
            2 => *v.ptr.cast::<u16>() = bits as u16,
            4 => *v.ptr.cast::<u32>() = bits as u32,
            _ => *v.ptr.cast::<u64>() = bits,
        }
    }
    v
}

fn make_f32(ro: Flag, f: f32, t: Type) -> Value {
    let v = fresh(t, ro);
    // SAFETY: fresh float32 storage.
    unsafe { *v.ptr.cast::<f32>() = f };
    v
}

fn make_float(ro: Flag, f: f64, t: Type) -> Value {
    if t.size() == 4 {
        return make_f32(ro, f as f32, t);
    }
    let v = fresh(t, ro);
    // SAFETY: fresh float64 storage.
    unsafe { *v.ptr.cast::<f64>() = f };
    v
}

fn make_complex(ro: Flag, c: Complex128, t: Type) -> Value {
    let v = fresh(t, ro);
    // SAFETY: fresh complex storage of t's width.
    unsafe {
        if t.size() == 8 {
            *v.ptr.cast::<Complex64>() = c.into();
        } else {
            *v.ptr.cast::<Complex128>() = c;
        }
    }
    v
}

fn make_string(ro: Flag, s: &[u8], t: Type) -> Value {
    let v = fresh(t, ro);
    // SAFETY: fresh string storage.
    unsafe { *v.ptr.cast::<StringHeader>() = StringHeader::copied(s) };
    v
}

fn make_slice_of_bytes(ro: Flag, b: &[u8], t: Type) -> Value {
    let data = heap::alloc_bytes(b.len());
    if !b.is_empty() {
        // SAFETY: data has room for b.len() bytes.
        unsafe { std::ptr::copy_nonoverlapping(b.as_ptr(), data, b.len()) };
    }
    let h = SliceHeader {
        data,
        len: b.len(),
        cap: b.len(),
    };
    Value::slice_value(t, h, ro)
}

fn make_runes(ro: Flag, r: &[i32], t: Type) -> Value {
    let data = heap::alloc_array(t.elem(), r.len());
    if !r.is_empty() {
        // SAFETY: data has room for r.len() int32 elements.
        unsafe { std::ptr::copy_nonoverlapping(r.as_ptr(), data.cast::<i32>(), r.len()) };
    }
    let h = SliceHeader {
        data,
        len: r.len(),
        cap: r.len(),
    };
    Value::slice_value(t, h, ro)
}

impl Value {
    /// The value converted to type `t`. Raises when no conversion rule
    /// applies.
    #[track_caller]
    #[must_use]
    pub fn convert(&self, t: Type) -> Value {
        self.try_convert(t).or_raise()
    }

    pub fn try_convert(&self, t: Type) -> Result<Value> {
        let v = if self.flag.is_method() {
            crate::call::method_value("Value::convert", *self)?
        } else {
            *self
        };
        let vt = v.rtype("Value::convert")?;
        let Some(op) = select_converter(vt, t) else {
            return Err(Error::NotConvertible {
                from: vt.string().to_owned(),
                to: t.string().to_owned(),
            });
        };
        op.apply(v, t)
    }

    /// Whether [`Value::convert`] to `t` would succeed, including the length
    /// check of slice-to-array conversions.
    #[must_use]
    pub fn can_convert(&self, t: Type) -> bool {
        let Ok(vt) = self.try_typ() else {
            return false;
        };
        match select_converter(vt, t) {
            None => false,
            Some(Converter::SliceToArray) => self.len() >= t.len(),
            Some(Converter::SliceToArrayPtr) => self.len() >= t.elem().len(),
            Some(_) => true,
        }
    }
}
