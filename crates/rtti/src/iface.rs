// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic-container bridge.
//!
//! An [`Eface`] is the two-word form of a value held in an empty interface:
//! the dynamic type plus a data word. For direct types the data word *is*
//! the value; for every other type it points at a private copy.
//!
//! Non-empty interfaces store an itab pointer in place of the type word.
//! Itabs pair an interface type with a concrete type and resolve the
//! interface's methods once; they are cached for the life of the process.
//!
//! Rust values cross into the system through the [`Reflect`] trait:
//!
//! ```
//! use rtti::iface::{value_of_native, Eface};
//! use rtti::types::Kind;
//!
//! let v = value_of_native(42i64);
//! assert_eq!(v.kind(), Kind::Int64);
//! assert_eq!(v.int(), 42);
//!
//! let e = v.interface();
//! assert_eq!(e.downcast::<i64>(), Some(42));
//! assert_eq!(e.downcast::<i32>(), None);
//! ```

use crate::call;
use crate::complex::{Complex128, Complex64};
use crate::error::{raise, Error, OrRaise, Result};
use crate::heap;
use crate::objects::{FuncObject, StringHeader};
use crate::synth::slice_of;
use crate::types::{basic, empty_interface, Kind, Type};
use crate::value::{make_slice, Flag, Value};
use dashmap::DashMap;
use std::fmt;
use std::sync::OnceLock;

/// Empty-interface pair `{dynamic type, data word}`.
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct Eface {
    pub(crate) typ: Option<Type>,
    pub(crate) word: *mut u8,
}

// SAFETY: the data word refers to storage owned by the value system; sharing
// it follows the same rules as sharing a `Value`.
unsafe impl Send for Eface {}
unsafe impl Sync for Eface {}

impl Default for Eface {
    fn default() -> Self {
        Self::nil()
    }
}

impl Eface {
    /// The nil interface.
    #[must_use]
    pub const fn nil() -> Self {
        Self {
            typ: None,
            word: std::ptr::null_mut(),
        }
    }

    /// Box a Rust value.
    #[must_use]
    pub fn new<T: Reflect>(x: T) -> Self {
        x.into_eface()
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.typ.is_none()
    }

    /// Dynamic type; `None` for the nil interface.
    #[must_use]
    pub fn typ(&self) -> Option<Type> {
        self.typ
    }

    /// The held value as `T`, if its dynamic type is exactly `T`'s.
    #[must_use]
    pub fn downcast<T: Reflect>(&self) -> Option<T> {
        T::from_value(unpack(*self))
    }
}

impl fmt::Debug for Eface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.typ {
            None => f.write_str("Eface(nil)"),
            Some(t) => write!(f, "Eface({} @ {:p})", t, self.word),
        }
    }
}

/// Method table of a concrete type viewed through an interface.
pub(crate) struct Itab {
    pub(crate) inter: Type,
    pub(crate) typ: Type,
    /// Implementations in the interface's method order.
    pub(crate) fun: Vec<&'static FuncObject>,
}

fn itabs() -> &'static DashMap<(Type, Type), &'static Itab> {
    static ITABS: OnceLock<DashMap<(Type, Type), &'static Itab>> = OnceLock::new();
    ITABS.get_or_init(DashMap::new)
}

/// Itab for concrete type `typ` viewed as interface `inter`.
pub(crate) fn itab(inter: Type, typ: Type) -> Result<&'static Itab> {
    if let Some(tab) = itabs().get(&(inter, typ)) {
        return Ok(*tab);
    }
    let methods = typ.method_entries();
    let mut fun = Vec::with_capacity(inter.imethods().len());
    for im in inter.imethods() {
        let found = methods
            .iter()
            .find(|m| m.name == im.name && m.pkg_path == im.pkg_path && m.mtyp == im.typ);
        match found {
            Some(m) => fun.push(m.ifn),
            None => {
                return Err(Error::NotAssignable {
                    context: "interface conversion",
                    from: typ.string().to_owned(),
                    to: inter.string().to_owned(),
                })
            }
        }
    }
    let tab = *itabs()
        .entry((inter, typ))
        .or_insert_with(|| heap::retain(Itab { inter, typ, fun }));
    log::debug!("[iface] itab {} -> {}", tab.typ, tab.inter);
    Ok(tab)
}

/// Read the interface of type `t` stored at `p`.
///
/// # Safety
/// `p` must hold a value of interface type `t`.
pub(crate) unsafe fn read_interface(t: Type, p: *const u8) -> Eface {
    if t.imethods().is_empty() {
        return *p.cast::<Eface>();
    }
    let words = p.cast::<[*mut u8; 2]>();
    let tab = (*words)[0].cast::<Itab>();
    Eface {
        typ: (!tab.is_null()).then(|| (*tab).typ),
        word: (*words)[1],
    }
}

/// Store `x` as a value of interface type `t` at `dst`.
///
/// # Safety
/// `dst` must have room for an interface value, and `x`'s dynamic type must
/// implement `t`.
pub(crate) unsafe fn write_interface(t: Type, x: Eface, dst: *mut u8) {
    if t.imethods().is_empty() {
        *dst.cast::<Eface>() = x;
        return;
    }
    let words = dst.cast::<[*mut u8; 2]>();
    let tab = match x.typ {
        None => std::ptr::null_mut(),
        Some(dt) => (itab(t, dt).or_raise() as *const Itab).cast_mut().cast::<u8>(),
    };
    *words = [tab, x.word];
}

/// Handle on the dynamic value of `e`; the zero handle for nil.
pub(crate) fn unpack(e: Eface) -> Value {
    let Some(t) = e.typ else {
        return Value::invalid();
    };
    let fl = Flag::from_kind(t.kind());
    if t.is_direct_iface() {
        Value::from_parts(t, e.word, fl)
    } else {
        Value::from_parts(t, e.word, fl.with(Flag::INDIR))
    }
}

/// Box `v` into an [`Eface`]. Addressable storage is copied so later writes
/// through `v` are not observed. With `safe` set, values reached through
/// unexported fields are refused.
pub(crate) fn pack(v: Value, safe: bool) -> Result<Eface> {
    if !v.is_valid() {
        return Err(Error::UsageOnZeroValue {
            method: "Value::interface",
        });
    }
    if safe && v.flag.is_read_only() {
        return Err(Error::ReadOnly {
            method: "Value::interface",
        });
    }
    let v = if v.flag.is_method() {
        call::method_value("Value::interface", v)?
    } else {
        v
    };
    let t = v.rtype("Value::interface")?;
    if t.kind() == Kind::Interface {
        // SAFETY: interface values are stored indirectly.
        return Ok(unsafe { read_interface(t, v.ptr) });
    }
    if t.is_direct_iface() {
        return Ok(Eface {
            typ: Some(t),
            word: v.word(),
        });
    }
    let word = if v.flag.is_addressable() {
        let p = heap::alloc(t);
        // SAFETY: p is fresh storage of type t; v.ptr holds a t.
        unsafe { heap::typed_copy(t, p, v.ptr) };
        p
    } else {
        v.ptr
    };
    Ok(Eface { typ: Some(t), word })
}

/// Handle on the dynamic value held by `e`.
#[must_use]
pub fn value_of(e: Eface) -> Value {
    unpack(e)
}

/// Handle on a copy of a Rust value.
#[must_use]
pub fn value_of_native<T: Reflect>(x: T) -> Value {
    x.into_value()
}

impl Value {
    /// The value as an [`Eface`]. Raises for values obtained through
    /// unexported fields.
    #[track_caller]
    #[must_use]
    pub fn interface(&self) -> Eface {
        self.try_interface().or_raise()
    }

    pub fn try_interface(&self) -> Result<Eface> {
        pack(*self, true)
    }
}

// ---------------------------------------------------------------------------
// Native bridge
// ---------------------------------------------------------------------------

/// Rust types with a fixed counterpart descriptor.
pub trait Reflect: Sized {
    /// Descriptor of the counterpart type.
    fn rtti_type() -> Type;

    /// Box a copy of `self`.
    fn into_eface(self) -> Eface;

    /// Read a value whose type is exactly [`Reflect::rtti_type`].
    fn from_value(v: Value) -> Option<Self>;

    /// Handle on a copy of `self`.
    fn into_value(self) -> Value {
        unpack(self.into_eface())
    }
}

fn exact<T: Reflect>(v: &Value) -> bool {
    v.typ.is_some_and(|t| t == T::rtti_type()) && !v.flag.is_method()
}

fn boxed<T: Copy>(t: Type, x: T) -> Eface {
    let p = heap::alloc(t);
    // SAFETY: p is fresh storage sized and aligned for t, whose layout is T's.
    unsafe { p.cast::<T>().write(x) };
    Eface {
        typ: Some(t),
        word: p,
    }
}

macro_rules! reflect_scalar {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Reflect for $ty {
                fn rtti_type() -> Type {
                    basic(Kind::$kind)
                }

                fn into_eface(self) -> Eface {
                    boxed(Self::rtti_type(), self)
                }

                fn from_value(v: Value) -> Option<Self> {
                    // SAFETY: the exact type guarantees the storage layout.
                    exact::<Self>(&v).then(|| unsafe { *v.data().cast::<$ty>() })
                }
            }
        )*
    };
}

reflect_scalar! {
    bool => Bool,
    isize => Int,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    usize => Uint,
    u8 => Uint8,
    u16 => Uint16,
    u32 => Uint32,
    u64 => Uint64,
    f32 => Float32,
    f64 => Float64,
    Complex64 => Complex64,
    Complex128 => Complex128,
}

impl Reflect for String {
    fn rtti_type() -> Type {
        basic(Kind::String)
    }

    fn into_eface(self) -> Eface {
        boxed(Self::rtti_type(), StringHeader::copied(self.as_bytes()))
    }

    fn from_value(v: Value) -> Option<Self> {
        exact::<Self>(&v).then(|| v.string())
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn rtti_type() -> Type {
        slice_of(T::rtti_type())
    }

    fn into_eface(self) -> Eface {
        let s = make_slice(Self::rtti_type(), self.len(), self.len());
        for (i, x) in self.into_iter().enumerate() {
            s.index(i).set(x.into_value());
        }
        pack(s, false).or_raise()
    }

    fn from_value(v: Value) -> Option<Self> {
        if !exact::<Self>(&v) {
            return None;
        }
        (0..v.len()).map(|i| T::from_value(v.index(i))).collect()
    }
}

impl Reflect for Eface {
    fn rtti_type() -> Type {
        empty_interface()
    }

    fn into_eface(self) -> Eface {
        self
    }

    /// Any valid value converts. A value read through an unexported field
    /// raises `ReadOnly` like [`Value::interface`]; the zero `Value` gives
    /// `None`.
    fn from_value(v: Value) -> Option<Self> {
        if !v.is_valid() {
            return None;
        }
        if v.flag.is_read_only() {
            raise(Error::ReadOnly {
                method: "Eface::from_value",
            });
        }
        if v.kind() == Kind::Interface {
            // SAFETY: interface values are stored indirectly.
            return Some(unsafe { read_interface(v.typ(), v.ptr) });
        }
        Some(pack(v, true).or_raise())
    }

    /// An `interface{}`-typed handle holding `self`.
    fn into_value(self) -> Value {
        let t = empty_interface();
        let p = heap::alloc(t);
        // SAFETY: p is fresh empty-interface storage.
        unsafe { write_interface(t, self, p) };
        Value::from_parts(t, p, Flag::from_kind(Kind::Interface).with(Flag::INDIR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_round_trip_keeps_exact_type() {
        let e = Eface::new(7u16);
        assert_eq!(e.typ(), Some(basic(Kind::Uint16)));
        assert_eq!(e.downcast::<u16>(), Some(7));
        assert_eq!(e.downcast::<u32>(), None);
    }

    #[test]
    fn test_nil_eface_unpacks_to_invalid() {
        let v = value_of(Eface::nil());
        assert!(!v.is_valid());
        assert!(Eface::default().is_nil());
    }

    #[test]
    fn test_vec_bridge() {
        let v = value_of_native(vec![String::from("a"), String::from("bc")]);
        assert_eq!(v.kind(), Kind::Slice);
        assert_eq!(v.len(), 2);
        assert_eq!(v.index(1).string(), "bc");
        assert_eq!(
            v.interface().downcast::<Vec<String>>(),
            Some(vec!["a".to_owned(), "bc".to_owned()])
        );
    }

    #[test]
    fn test_pack_copies_addressable_storage() {
        let p = crate::value::new(basic(Kind::Int));
        let x = p.elem();
        x.set_int(1);
        let e = x.interface();
        x.set_int(2);
        assert_eq!(e.downcast::<isize>(), Some(1));
    }

    #[test]
    fn test_eface_from_value_accepts_any_valid_value() {
        assert_eq!(Eface::from_value(Value::default()), None);
        let e = Eface::from_value(value_of_native(3i8));
        assert_eq!(e.and_then(|e| e.downcast::<i8>()), Some(3));
    }

    #[test]
    #[should_panic(expected = "rtti: Eface::from_value using value obtained using unexported field")]
    fn test_eface_from_read_only_value_is_fatal() {
        let t = crate::synth::struct_of(&[crate::synth::StructFieldSpec::new(
            "count",
            basic(Kind::Int),
        )
        .with_pkg_path("test.local/iface_ro")]);
        let hidden = crate::value::new(t).elem().field(0);
        let _ = Eface::from_value(hidden);
    }

    #[test]
    fn test_eface_into_value_is_interface_kind() {
        let v = Eface::new(1.5f64).into_value();
        assert_eq!(v.kind(), Kind::Interface);
        assert_eq!(v.elem().float(), 1.5);
    }
}
