// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Call frames.
//!
//! A frame is one word-aligned buffer holding the receiver (if any), the
//! arguments, then the results, each at its natural alignment. Results start
//! on a word boundary. Zero-sized slots get no offset at all, so no address
//! is ever formed for them (it could point one past the end of the frame).
//!
//! Layouts are computed once per `(signature, receiver type)` pair and
//! cached for the life of the process.

use crate::config::WORD_SIZE;
use crate::error::{Error, OrRaise, Result};
use crate::layout::align_up;
use crate::types::{Kind, Type};
use crate::value::{zero, Flag, Value};
use dashmap::DashMap;
use std::marker::PhantomData;
use std::sync::OnceLock;

/// One argument or result slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub typ: Type,
    /// Byte offset in the frame; `None` for zero-sized types.
    pub offset: Option<usize>,
}

/// Argument and result placement for one signature.
#[derive(Debug)]
pub struct FrameLayout {
    slots: Vec<Slot>,
    num_args: usize,
    size: usize,
}

type LayoutKey = (Type, Option<Type>);

fn layouts() -> &'static DashMap<LayoutKey, &'static FrameLayout> {
    static LAYOUTS: OnceLock<DashMap<LayoutKey, &'static FrameLayout>> = OnceLock::new();
    LAYOUTS.get_or_init(DashMap::new)
}

impl FrameLayout {
    /// Layout for calls of `ftyp`, with `recv` passed ahead of the
    /// arguments when given.
    #[track_caller]
    #[must_use]
    pub fn of(ftyp: Type, recv: Option<Type>) -> &'static FrameLayout {
        Self::try_of(ftyp, recv).or_raise()
    }

    pub fn try_of(ftyp: Type, recv: Option<Type>) -> Result<&'static FrameLayout> {
        if ftyp.kind() != Kind::Func {
            return Err(Error::KindMismatch {
                method: "FrameLayout::of",
                kind: ftyp.kind(),
            });
        }
        if let Some(l) = layouts().get(&(ftyp, recv)) {
            return Ok(*l);
        }
        let built = Self::compute(ftyp, recv);
        let l = *layouts()
            .entry((ftyp, recv))
            .or_insert_with(|| crate::heap::retain(built));
        match recv {
            Some(r) => log::debug!("[call] frame layout for ({}) {}: {} bytes", r, ftyp, l.size),
            None => log::debug!("[call] frame layout for {}: {} bytes", ftyp, l.size),
        }
        Ok(l)
    }

    fn compute(ftyp: Type, recv: Option<Type>) -> Self {
        let mut slots = Vec::with_capacity(ftyp.num_in() + ftyp.num_out() + 1);
        let mut off = 0;
        let mut place = |t: Type, off: &mut usize| {
            let offset = (t.size() != 0).then(|| {
                let at = align_up(*off, t.align());
                *off = at + t.size();
                at
            });
            slots.push(Slot { typ: t, offset });
        };
        for t in recv.iter().chain(ftyp.ins()) {
            place(*t, &mut off);
        }
        off = align_up(off, WORD_SIZE);
        for t in ftyp.outs() {
            place(*t, &mut off);
        }
        let num_args = ftyp.num_in() + usize::from(recv.is_some());
        Self {
            slots,
            num_args,
            size: align_up(off, WORD_SIZE),
        }
    }

    /// Frame size in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of argument slots, receiver included.
    #[must_use]
    pub fn num_args(&self) -> usize {
        self.num_args
    }

    #[must_use]
    pub fn num_results(&self) -> usize {
        self.slots.len() - self.num_args
    }

    #[must_use]
    pub fn args(&self) -> &[Slot] {
        &self.slots[..self.num_args]
    }

    #[must_use]
    pub fn results(&self) -> &[Slot] {
        &self.slots[self.num_args..]
    }
}

/// Live frame handed to a function's code.
pub struct Frame<'a> {
    layout: &'static FrameLayout,
    base: *mut u8,
    _buf: PhantomData<&'a mut [u64]>,
}

impl<'a> Frame<'a> {
    /// # Safety
    /// `base` must point at `layout.size()` writable, word-aligned bytes
    /// that outlive the frame.
    pub(crate) unsafe fn new(layout: &'static FrameLayout, base: *mut u8) -> Self {
        Self {
            layout,
            base,
            _buf: PhantomData,
        }
    }

    #[must_use]
    pub fn layout(&self) -> &'static FrameLayout {
        self.layout
    }

    #[must_use]
    pub fn num_args(&self) -> usize {
        self.layout.num_args
    }

    #[must_use]
    pub fn num_results(&self) -> usize {
        self.layout.num_results()
    }

    fn read(&self, s: Slot) -> Value {
        match s.offset {
            // SAFETY: the slot lies inside the frame and holds a value of s.typ.
            Some(off) => unsafe { Value::copy_from(s.typ, self.base.add(off), Flag::default()) },
            None => zero(s.typ),
        }
    }

    /// Copy of argument `i` (the receiver is argument 0 for methods).
    #[track_caller]
    #[must_use]
    pub fn arg(&self, i: usize) -> Value {
        match self.layout.args().get(i) {
            Some(s) => self.read(*s),
            None => crate::error::raise(Error::IndexOutOfRange {
                method: "Frame::arg",
                index: i,
                len: self.layout.num_args,
            }),
        }
    }

    /// Copies of every argument.
    #[must_use]
    pub fn args(&self) -> Vec<Value> {
        self.layout.args().iter().map(|s| self.read(*s)).collect()
    }

    /// Store result `i`.
    #[track_caller]
    pub fn set_result(&mut self, i: usize, v: Value) {
        self.try_set_result(i, v).or_raise();
    }

    pub fn try_set_result(&mut self, i: usize, v: Value) -> Result<()> {
        let Some(s) = self.layout.results().get(i).copied() else {
            return Err(Error::IndexOutOfRange {
                method: "Frame::set_result",
                index: i,
                len: self.layout.num_results(),
            });
        };
        if !v.is_valid() {
            return Err(Error::BadResult {
                reason: format!("zero Value for result {}", i),
            });
        }
        if v.flag().is_read_only() {
            return Err(Error::BadResult {
                reason: format!("result {} obtained using unexported field", i),
            });
        }
        let v = v.try_assign_to("Frame::set_result", s.typ).map_err(|_| Error::BadResult {
            reason: format!("{} for result {} of type {}", v.typ(), i, s.typ),
        })?;
        if let Some(off) = s.offset {
            // SAFETY: the slot lies inside the frame and has room for s.typ.
            unsafe { v.store_to(self.base.add(off)) };
        }
        Ok(())
    }

    /// Store every result; the count must match the signature.
    pub(crate) fn try_set_results(&mut self, outs: &[Value]) -> Result<()> {
        if outs.len() != self.num_results() {
            return Err(Error::BadResult {
                reason: format!("{} values, want {}", outs.len(), self.num_results()),
            });
        }
        for (i, v) in outs.iter().enumerate() {
            self.try_set_result(i, *v)?;
        }
        Ok(())
    }

    /// Copies of every result.
    pub(crate) fn results(&self) -> Vec<Value> {
        self.layout.results().iter().map(|s| self.read(*s)).collect()
    }

    /// Store argument `i` during frame setup.
    ///
    /// # Safety
    /// `v` must already have the slot's type.
    pub(crate) unsafe fn put_arg(&mut self, i: usize, v: Value) {
        if let Some(off) = self.layout.slots[i].offset {
            v.store_to(self.base.add(off));
        }
    }
}
