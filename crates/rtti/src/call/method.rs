// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bound methods, method values and method-set wrappers.

use super::make_func::func_object;
use super::{call_func_object, invoke};
use crate::error::{raise, Error, OrRaise, Result};
use crate::iface;
use crate::objects::FuncObject;
use crate::synth::method_func_type;
use crate::types::rtype::{IMethod, MethodEntry};
use crate::types::{Kind, Type};
use crate::value::{Flag, Value};

/// Receiver, implementation and receiver-less signature of a bound-method
/// handle.
pub(crate) struct Resolved {
    pub recv: Value,
    pub func: &'static FuncObject,
    pub mtyp: Type,
}

pub(crate) fn resolve(op: &'static str, v: Value) -> Result<Resolved> {
    let t = v.rtype(op)?;
    let i = v.flag.method_index();
    if t.kind() == Kind::Interface {
        let Some(im) = t.imethods().get(i) else {
            return Err(Error::IndexOutOfRange {
                method: op,
                index: i,
                len: t.imethods().len(),
            });
        };
        // SAFETY: interface values are stored indirectly.
        let e = unsafe { iface::read_interface(t, v.ptr) };
        let Some(dt) = e.typ() else {
            return Err(Error::UsageOnZeroValue {
                method: "method call on nil interface value",
            });
        };
        let tab = iface::itab(t, dt)?;
        return Ok(Resolved {
            recv: iface::unpack(e),
            func: tab.fun[i],
            mtyp: im.typ,
        });
    }
    let Some(m) = t.exported_method_entries().get(i) else {
        return Err(Error::IndexOutOfRange {
            method: op,
            index: i,
            len: t.num_method(),
        });
    };
    Ok(Resolved {
        recv: Value::from_parts(t, v.ptr, v.flag.receiver(t.kind())),
        func: m.ifn,
        mtyp: m.mtyp,
    })
}

/// Materialize a bound-method handle as an ordinary func value of the
/// method's signature. The receiver is copied at this point.
pub(crate) fn method_value(op: &'static str, v: Value) -> Result<Value> {
    let r = resolve(op, v)?;
    let recv_type = r.recv.typ();
    let recv = if r.recv.flag().is_indirect() {
        // SAFETY: the receiver refers to a value of its type.
        unsafe { Value::copy_from(recv_type, r.recv.data(), Flag::default()) }
    } else {
        r.recv
    };
    let func = r.func;
    let fobj = func_object(r.mtyp, move |args| {
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push(recv);
        full.extend_from_slice(args);
        call_func_object(func, &full)
    });
    let mut out = Value::from_func_object(fobj);
    out.flag = out.flag.with(v.flag.ro());
    Ok(out)
}

/// `*T` wrapper around value method `e` of `T`: dereferences the receiver
/// and calls `e`. A nil receiver raises.
pub(crate) fn deref_method(pt: Type, e: MethodEntry) -> Result<MethodEntry> {
    let ftyp = method_func_type(pt, e.mtyp)?;
    let inner = e.ifn;
    let name = e.name;
    let ifn = func_object(ftyp, move |args| {
        let p = args[0];
        if p.is_nil() {
            raise(Error::NilReceiver { method: name });
        }
        let mut full = Vec::with_capacity(args.len());
        full.push(p.elem());
        full.extend_from_slice(&args[1..]);
        call_func_object(inner, &full)
    });
    Ok(MethodEntry { ifn, ..e })
}

/// Method reachable through an embedded field.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Promoted {
    /// Method of an embedded concrete type.
    Concrete(MethodEntry),
    /// Method of `*T` reached through the address of an embedded `T`.
    Addressed(MethodEntry),
    /// Method of an embedded interface.
    Interface(IMethod),
}

impl Promoted {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Concrete(m) | Self::Addressed(m) => m.name,
            Self::Interface(m) => m.name,
        }
    }
}

/// Method entry of `owner` forwarding `p` to embedded field `field`.
pub(crate) fn promoted_method(owner: Type, field: usize, p: Promoted) -> Result<MethodEntry> {
    match p {
        Promoted::Concrete(m) => {
            let ftyp = method_func_type(owner, m.mtyp)?;
            let inner = m.ifn;
            let ifn = func_object(ftyp, move |args| {
                let mut full = Vec::with_capacity(args.len());
                full.push(embedded(args[0], field));
                full.extend_from_slice(&args[1..]);
                call_func_object(inner, &full)
            });
            Ok(MethodEntry { ifn, ..m })
        }
        Promoted::Interface(im) => {
            let ftyp = method_func_type(owner, im.typ)?;
            let ityp = owner.field_descs()[field].typ;
            let Some(k) = ityp.imethods().iter().position(|x| *x == im) else {
                return Err(Error::IllegalShape {
                    op: "promoted_method",
                    reason: format!("{} has no method {}", ityp, im.name),
                });
            };
            let ifn = func_object(ftyp, move |args| {
                let bound = embedded(args[0], field).try_method(k).or_raise();
                let r = resolve("promoted method call", bound).or_raise();
                invoke("promoted method call", r.func, r.mtyp, Some(r.recv), &args[1..], r.mtyp.is_variadic())
                    .or_raise()
            });
            Ok(MethodEntry {
                name: im.name,
                pkg_path: im.pkg_path,
                mtyp: im.typ,
                ifn,
            })
        }
        Promoted::Addressed(m) => Err(Error::IllegalShape {
            op: "promoted_method",
            reason: format!("{} is not addressable; cannot promote {}", owner, m.name),
        }),
    }
}

/// Method entry of `pt`, a pointer to struct `S`, forwarding `p` to embedded
/// field `field` of the pointee. A nil receiver raises.
pub(crate) fn promoted_pointer_method(pt: Type, field: usize, p: Promoted) -> Result<MethodEntry> {
    let Promoted::Addressed(m) = p else {
        return deref_method(pt, promoted_method(pt.elem(), field, p)?);
    };
    let ftyp = method_func_type(pt, m.mtyp)?;
    let inner = m.ifn;
    let name = m.name;
    let ifn = func_object(ftyp, move |args| {
        let s = args[0];
        if s.is_nil() {
            raise(Error::NilReceiver { method: name });
        }
        let mut full = Vec::with_capacity(args.len());
        full.push(embedded(s.elem(), field).addr());
        full.extend_from_slice(&args[1..]);
        call_func_object(inner, &full)
    });
    Ok(MethodEntry { ifn, ..m })
}

/// Embedded field `i` of `recv`, readable even when the field itself is
/// unexported.
fn embedded(recv: Value, i: usize) -> Value {
    let mut f = recv.field(i);
    f.flag = f.flag.without(Flag::RO);
    f
}
