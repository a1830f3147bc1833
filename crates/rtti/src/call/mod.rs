// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Call bridge.
//!
//! [`Value::call`] checks the arguments against the signature, packs a
//! variadic tail into a slice, copies everything into a frame laid out by
//! [`FrameLayout`], runs the function's code and copies the results out
//! into fresh, non-addressable values.
//!
//! Bound methods (from [`Value::method`]) pass their receiver as the first
//! frame slot; interface receivers dispatch through the itab. A panic in the
//! called code unwinds through the bridge untouched.

mod frame;
mod make_func;
mod method;

pub use frame::{Frame, FrameLayout, Slot};
pub use make_func::make_func;

pub(crate) use make_func::{func_object, MethodBody};
pub(crate) use method::{
    deref_method, method_value, promoted_method, promoted_pointer_method, Promoted,
};

use crate::error::{Error, OrRaise, Result};
use crate::objects::{Block, FuncObject};
use crate::types::{Kind, Type};
use crate::value::{make_slice, Value};

impl Value {
    /// Call the function with `args`. A variadic function receives its
    /// trailing arguments packed into a fresh slice.
    #[track_caller]
    pub fn call(&self, args: &[Value]) -> Vec<Value> {
        self.try_call(args).or_raise()
    }

    pub fn try_call(&self, args: &[Value]) -> Result<Vec<Value>> {
        self.call_impl("Value::call", args, false)
    }

    /// Call a variadic function whose last argument is already the slice
    /// for the variadic parameter.
    #[track_caller]
    pub fn call_slice(&self, args: &[Value]) -> Vec<Value> {
        self.try_call_slice(args).or_raise()
    }

    pub fn try_call_slice(&self, args: &[Value]) -> Result<Vec<Value>> {
        self.call_impl("Value::call_slice", args, true)
    }

    fn call_impl(&self, op: &'static str, args: &[Value], spread: bool) -> Result<Vec<Value>> {
        self.must_be(Kind::Func, op)?;
        self.must_be_exported(op)?;
        if self.flag.is_method() {
            let r = method::resolve(op, *self)?;
            return invoke(op, r.func, r.mtyp, Some(r.recv), args, spread);
        }
        let p = self.word();
        if p.is_null() {
            return Err(Error::NilFunc);
        }
        // SAFETY: a non-nil func word points at a retained FuncObject.
        let f = unsafe { &*p.cast::<FuncObject>() };
        invoke(op, f, self.typ(), None, args, spread)
    }
}

/// Call `f` with arguments already in frame form (a variadic tail packed).
pub(crate) fn call_func_object(f: &'static FuncObject, args: &[Value]) -> Vec<Value> {
    let t = f.typ();
    invoke("call", f, t, None, args, t.is_variadic()).or_raise()
}

/// Check `args` against `sig`, build the frame and run `f`.
///
/// `sig` excludes the receiver; `f`'s own signature includes it when `recv`
/// is given.
pub(crate) fn invoke(
    op: &'static str,
    f: &'static FuncObject,
    sig: Type,
    recv: Option<Value>,
    args: &[Value],
    spread: bool,
) -> Result<Vec<Value>> {
    let n = sig.num_in();
    let variadic = sig.is_variadic();
    if spread && !variadic {
        return Err(Error::IllegalShape {
            op,
            reason: format!("call_slice of non-variadic function {}", sig),
        });
    }
    if let Some(i) = args.iter().position(|a| !a.is_valid()) {
        return Err(Error::IllegalShape {
            op,
            reason: format!("argument {} is a zero Value", i),
        });
    }
    if variadic && !spread {
        if args.len() < n - 1 {
            return Err(Error::ArgumentCount {
                method: op,
                got: args.len(),
                want: n - 1,
            });
        }
    } else if args.len() != n {
        return Err(Error::ArgumentCount {
            method: op,
            got: args.len(),
            want: n,
        });
    }

    // Frame-form arguments, each converted to its parameter type.
    let mut frame_args = Vec::with_capacity(n + 1);
    if let Some(r) = recv {
        frame_args.push(r);
    }
    let fixed = if variadic && !spread { n - 1 } else { n };
    for (i, a) in args[..fixed].iter().enumerate() {
        a.must_be_exported(op)?;
        frame_args.push(a.try_assign_to(op, sig.in_(i))?);
    }
    if variadic && !spread {
        let st = sig.in_(n - 1);
        let extra = &args[fixed..];
        let tail = make_slice(st, extra.len(), extra.len());
        for (j, a) in extra.iter().enumerate() {
            tail.index(j).try_set(*a)?;
        }
        frame_args.push(tail);
    }

    let layout = FrameLayout::try_of(sig, recv.map(|r| r.typ()))?;
    let mut buf = Block::zeroed(layout.size());
    // SAFETY: buf holds layout.size() word-aligned bytes and outlives the frame.
    let mut frame = unsafe { Frame::new(layout, buf.as_mut_ptr()) };
    for (i, a) in frame_args.into_iter().enumerate() {
        // SAFETY: every argument was converted to its slot's type above; the
        // receiver already has the receiver slot's type.
        unsafe { frame.put_arg(i, a) };
    }
    log::trace!("[call] {} ({} args)", sig, frame.num_args());
    f.invoke(&mut frame);
    Ok(frame.results())
}
