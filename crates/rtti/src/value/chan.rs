// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Channel operators.

use super::{zero, Flag, Value};
use crate::error::{raise, Error, OrRaise, Result};
use crate::objects::{ChanObject, Recv, Stored};
use crate::types::{Kind, Type};

impl Value {
    pub(crate) fn chan_object(&self) -> Option<&'static ChanObject> {
        let p = self.word();
        // SAFETY: a non-nil chan word points at a retained ChanObject.
        (!p.is_null()).then(|| unsafe { &*p.cast::<ChanObject>() })
    }

    fn chan_for(&self, method: &'static str, send: bool) -> Result<(Type, Option<&'static ChanObject>)> {
        let t = self.must_be(Kind::Chan, method)?;
        self.must_be_exported(method)?;
        let dir = t.chan_dir();
        if (send && !dir.can_send()) || (!send && !dir.can_recv()) {
            return Err(Error::ChanDirection {
                method,
                dir: dir.to_string(),
            });
        }
        Ok((t, self.chan_object()))
    }

    fn outgoing(t: Type, x: Value, method: &'static str) -> Result<Stored> {
        x.must_be_exported(method)?;
        let x = x.try_assign_to(method, t.elem())?;
        // SAFETY: x holds a value of the element type.
        Ok(unsafe { Stored::copy_of(t.elem(), x.data()) })
    }

    fn incoming(t: Type, r: Recv) -> Option<(Value, bool)> {
        match r {
            // SAFETY: the block holds a value of the element type.
            Recv::Value(b) => Some((
                unsafe { Value::copy_from(t.elem(), b.as_ptr(), Flag::default()) },
                true,
            )),
            Recv::Closed => Some((zero(t.elem()), false)),
            Recv::Empty => None,
        }
    }

    /// Send `x`, blocking until a receiver or buffer slot takes it.
    #[track_caller]
    pub fn send(&self, x: Value) {
        self.try_send_blocking(x).or_raise();
    }

    fn try_send_blocking(&self, x: Value) -> Result<()> {
        let (t, c) = self.chan_for("Value::send", true)?;
        let Some(c) = c else {
            return Err(Error::NilChan {
                method: "Value::send",
            });
        };
        c.send(Self::outgoing(t, x, "Value::send")?);
        Ok(())
    }

    /// Send without blocking; `false` if the send could not proceed.
    #[track_caller]
    pub fn try_send(&self, x: Value) -> bool {
        let (t, c) = self.chan_for("Value::try_send", true).or_raise();
        let block = Self::outgoing(t, x, "Value::try_send").or_raise();
        c.is_some_and(|c| c.try_send(block))
    }

    /// Receive, blocking until a value arrives. On a closed, drained channel
    /// returns the element's zero value and `false`.
    #[track_caller]
    #[must_use]
    pub fn recv(&self) -> (Value, bool) {
        let (t, c) = self.chan_for("Value::recv", false).or_raise();
        let Some(c) = c else {
            raise(Error::NilChan {
                method: "Value::recv",
            });
        };
        match Self::incoming(t, c.recv()) {
            Some(r) => r,
            None => (zero(t.elem()), false),
        }
    }

    /// Receive without blocking; `None` when nothing is ready.
    #[track_caller]
    #[must_use]
    pub fn try_recv(&self) -> Option<(Value, bool)> {
        let (t, c) = self.chan_for("Value::try_recv", false).or_raise();
        Self::incoming(t, c?.try_recv())
    }

    /// Close the channel. Raises on a nil or already closed channel.
    #[track_caller]
    pub fn close(&self) {
        let (_, c) = self.chan_for("Value::close", true).or_raise();
        match c {
            Some(c) => c.close(),
            None => raise(Error::NilChan {
                method: "Value::close",
            }),
        }
    }
}
