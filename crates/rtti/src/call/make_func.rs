// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Func values backed by host closures.

use super::frame::Frame;
use crate::error::{raise, Error};
use crate::heap;
use crate::objects::FuncObject;
use crate::types::{Kind, Type};
use crate::value::Value;
use std::sync::Arc;

/// Shared body of a declared method. Receives the receiver followed by the
/// arguments; returns the results.
pub(crate) type MethodBody = Arc<dyn Fn(&[Value]) -> Vec<Value> + Send + Sync>;

/// Retained function object of type `ftyp` running `f`.
///
/// `f` sees the arguments in frame form: a variadic tail arrives as one
/// slice. Returning the wrong number of results, or a result not assignable
/// to its slot, raises.
pub(crate) fn func_object<F>(ftyp: Type, f: F) -> &'static FuncObject
where
    F: Fn(&[Value]) -> Vec<Value> + Send + Sync + 'static,
{
    heap::retain(FuncObject::new(ftyp, move |frame: &mut Frame<'_>| {
        let args = frame.args();
        let outs = f(&args);
        if let Err(e) = frame.try_set_results(&outs) {
            raise(e);
        }
    }))
}

/// Func value of type `typ` that runs `f`.
///
/// ```
/// use rtti::call::make_func;
/// use rtti::synth::func_of;
/// use rtti::types::{basic, Kind};
/// use rtti::iface::value_of_native;
///
/// let i64t = basic(Kind::Int64);
/// let double = make_func(func_of(&[i64t], &[i64t], false), |args| {
///     vec![value_of_native(args[0].int() * 2)]
/// });
/// let out = double.call(&[value_of_native(21i64)]);
/// assert_eq!(out[0].int(), 42);
/// ```
#[track_caller]
#[must_use]
pub fn make_func<F>(typ: Type, f: F) -> Value
where
    F: Fn(&[Value]) -> Vec<Value> + Send + Sync + 'static,
{
    if typ.kind() != Kind::Func {
        raise(Error::KindMismatch {
            method: "make_func",
            kind: typ.kind(),
        });
    }
    Value::from_func_object(func_object(typ, f))
}
