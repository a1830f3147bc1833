// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Value handles.
//!
//! A [`Value`] is a three-word tuple `{type, pointer, flag}` naming a value of
//! a dynamically known type located somewhere in memory:
//!
//! - For *direct* types (pointer-shaped kinds and one-component wrappers of
//!   them) the pointer word is the value itself, unless `INDIR` is set.
//! - For every other type `INDIR` is always set and the pointer refers to
//!   `type.size()` bytes of storage.
//!
//! Handles are plain `Copy` data; they do not own the storage they refer to
//! and carry no synchronization. Aliasing handles follow ordinary raw-pointer
//! rules.
//!
//! Operators are grouped by concern:
//!
//! | Module       | Operations                                                  |
//! |--------------|-------------------------------------------------------------|
//! | `access`     | typed getters, `len`, `cap`, `is_nil`, `is_zero`, overflow  |
//! | `composite`  | `field*`, `index`, `elem`, `slice*`, `addr`, methods        |
//! | `set`        | the `set*` family, `append`, `copy`, `grow`                 |
//! | `map`        | `map_index`, `set_map_index`, `map_keys`, [`MapIter`]       |
//! | `chan`       | `send`, `recv`, `try_*`, `close`                            |
//! | `make`       | `zero`, `new`, `make_slice`, `make_map`, `make_chan`        |
//! | `equal`      | `equal`, `deep_equal`                                       |

mod access;
mod chan;
mod composite;
mod equal;
mod flag;
mod make;
mod map;
mod set;

pub use equal::deep_equal;
pub use flag::Flag;
pub use make::{indirect, make_chan, make_map, make_map_with_size, make_slice, new, new_at, zero};
pub use map::MapIter;
pub use set::{append, append_slice, copy};

use crate::convert;
use crate::error::{raise, Error, OrRaise, Result};
use crate::heap;
use crate::iface;
use crate::objects::FuncObject;
use crate::types::{Kind, Type};
use std::fmt;

/// Handle on a value of dynamically known type.
#[derive(Clone, Copy)]
pub struct Value {
    pub(crate) typ: Option<Type>,
    pub(crate) ptr: *mut u8,
    pub(crate) flag: Flag,
}

// SAFETY: a Value is a typed address. Thread-safety of the storage it
// refers to is the caller's concern, as with any shared raw pointer.
unsafe impl Send for Value {}
unsafe impl Sync for Value {}

impl Default for Value {
    fn default() -> Self {
        Self::invalid()
    }
}

impl Value {
    /// The zero handle: no type, kind `Invalid`.
    #[must_use]
    pub const fn invalid() -> Self {
        Self {
            typ: None,
            ptr: std::ptr::null_mut(),
            flag: Flag::from_kind(Kind::Invalid),
        }
    }

    #[inline]
    pub(crate) const fn from_parts(typ: Type, ptr: *mut u8, flag: Flag) -> Self {
        Self {
            typ: Some(typ),
            ptr,
            flag,
        }
    }

    /// Func value calling `f`.
    #[must_use]
    pub fn from_func_object(f: &'static FuncObject) -> Self {
        Self::from_parts(
            f.typ(),
            (f as *const FuncObject).cast_mut().cast(),
            Flag::from_kind(Kind::Func),
        )
    }

    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.flag.kind() != Kind::Invalid
    }

    /// Kind of the value; `Invalid` for the zero handle.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> Kind {
        self.flag.kind()
    }

    #[inline]
    #[must_use]
    pub fn flag(&self) -> Flag {
        self.flag
    }

    /// Type of the value. Raises on the zero handle.
    #[track_caller]
    #[must_use]
    pub fn typ(&self) -> Type {
        self.try_typ().or_raise()
    }

    pub fn try_typ(&self) -> Result<Type> {
        let t = self.rtype("Value::typ")?;
        if !self.flag.is_method() {
            return Ok(t);
        }
        let i = self.flag.method_index();
        if t.kind() == Kind::Interface {
            return Ok(t.imethods()[i].typ);
        }
        Ok(t.exported_method_entries()[i].mtyp)
    }

    /// Whether the value's storage can be addressed (and thus mutated).
    #[must_use]
    pub fn can_addr(&self) -> bool {
        self.flag.is_addressable()
    }

    /// Addressable and not obtained through an unexported field.
    #[must_use]
    pub fn can_set(&self) -> bool {
        self.flag.is_addressable() && !self.flag.is_read_only()
    }

    /// Whether [`Value::interface`] would succeed.
    #[track_caller]
    #[must_use]
    pub fn can_interface(&self) -> bool {
        if !self.is_valid() {
            raise(Error::UsageOnZeroValue {
                method: "Value::can_interface",
            });
        }
        !self.flag.is_read_only()
    }

    // -----------------------------------------------------------------------
    // Precondition helpers
    // -----------------------------------------------------------------------

    /// Stored descriptor (the receiver's type for bound methods).
    #[inline]
    pub(crate) fn rtype(&self, method: &'static str) -> Result<Type> {
        self.typ.ok_or(Error::UsageOnZeroValue { method })
    }

    pub(crate) fn must_be(&self, kind: Kind, method: &'static str) -> Result<Type> {
        let t = self.rtype(method)?;
        if self.kind() != kind {
            return Err(Error::KindMismatch {
                method,
                kind: self.kind(),
            });
        }
        Ok(t)
    }

    pub(crate) fn must_be_exported(&self, method: &'static str) -> Result<()> {
        if !self.is_valid() {
            return Err(Error::UsageOnZeroValue { method });
        }
        if self.flag.is_read_only() {
            return Err(Error::ReadOnly { method });
        }
        Ok(())
    }

    pub(crate) fn must_be_assignable(&self, method: &'static str) -> Result<()> {
        self.must_be_exported(method)?;
        if !self.flag.is_addressable() {
            return Err(Error::NotAddressable { method });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Storage
    // -----------------------------------------------------------------------

    /// Address of the value's bytes, valid while `self` is borrowed.
    #[inline]
    pub(crate) fn data(&self) -> *const u8 {
        if self.flag.is_indirect() {
            self.ptr
        } else {
            std::ptr::addr_of!(self.ptr).cast()
        }
    }

    /// The word of a pointer-shaped value.
    #[inline]
    pub(crate) fn word(&self) -> *mut u8 {
        if self.flag.is_indirect() {
            // SAFETY: indirect pointer-shaped values refer to one word.
            unsafe { *self.ptr.cast::<*mut u8>() }
        } else {
            self.ptr
        }
    }

    /// Non-addressable copy of the value of type `t` at `src`.
    ///
    /// # Safety
    /// `src` must hold a value of type `t`.
    pub(crate) unsafe fn copy_from(t: Type, src: *const u8, extra: Flag) -> Self {
        let fl = Flag::from_kind(t.kind()).with(extra);
        if t.is_direct_iface() {
            return Self::from_parts(t, *src.cast::<*mut u8>(), fl);
        }
        let p = heap::alloc(t);
        heap::typed_copy(t, p, src);
        Self::from_parts(t, p, fl.with(Flag::INDIR))
    }

    /// Write the value's bytes to `dst`.
    ///
    /// # Safety
    /// `dst` must have room for a value of this type.
    pub(crate) unsafe fn store_to(&self, dst: *mut u8) {
        let Some(t) = self.typ else { return };
        if self.flag.is_indirect() {
            heap::typed_copy(t, dst, self.ptr);
        } else {
            *dst.cast::<*mut u8>() = self.ptr;
            heap::write_barrier(dst, t);
        }
    }

    /// Value of type `dst` usable wherever `self` is assigned to a `dst`.
    ///
    /// Identical or directly assignable types reinterpret the same storage;
    /// an interface destination boxes `self`.
    pub(crate) fn try_assign_to(self, context: &'static str, dst: Type) -> Result<Value> {
        let v = if self.flag.is_method() {
            crate::call::method_value(context, self)?
        } else {
            self
        };
        let vt = v.rtype(context)?;

        if convert::directly_assignable(dst, vt) {
            let fl = v
                .flag
                .only(Flag::ADDR.with(Flag::INDIR))
                .with(v.flag.ro())
                .with(Flag::from_kind(dst.kind()));
            return Ok(Self::from_parts(dst, v.ptr, fl));
        }
        if dst.kind() == Kind::Interface && convert::implements(dst, vt) {
            if v.kind() == Kind::Interface && v.is_nil() {
                return Ok(zero(dst));
            }
            let x = iface::pack(v, false)?;
            let target = heap::alloc(dst);
            // SAFETY: target is fresh interface storage.
            unsafe { iface::write_interface(dst, x, target) };
            return Ok(Self::from_parts(
                dst,
                target,
                Flag::from_kind(Kind::Interface).with(Flag::INDIR),
            ));
        }
        Err(Error::NotAssignable {
            context,
            from: vt.string().to_owned(),
            to: dst.string().to_owned(),
        })
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(t) = self.typ else {
            return f.write_str("Value(<invalid>)");
        };
        if self.flag.is_method() {
            return write!(f, "Value(<{} method #{}>)", t, self.flag.method_index());
        }
        let k = self.kind();
        match k {
            Kind::Bool => write!(f, "Value({} = {})", t, self.bool()),
            _ if k.is_int() => write!(f, "Value({} = {})", t, self.int()),
            _ if k.is_uint() => write!(f, "Value({} = {})", t, self.uint()),
            _ if k.is_float() => write!(f, "Value({} = {})", t, self.float()),
            Kind::String => write!(f, "Value({} = {:?})", t, self.string()),
            _ => write!(f, "Value(<{} Value>)", t),
        }
    }
}

#[cfg(test)]
mod tests;
