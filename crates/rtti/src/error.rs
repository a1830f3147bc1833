// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Precondition violations.
//!
//! Misusing the type system (wrong kind, out-of-range index, writing through a
//! read-only handle, ...) is a programming error. Every operator has a `try_*`
//! form that reports it as an [`Error`]; the plain form hands the error to
//! [`raise`], which logs it and panics at the call site.
//!
//! Expected outcomes such as an absent map key, a nil pointer or an exhausted
//! iterator are never errors: they come back as `Option`/`bool`.

use crate::types::Kind;
use std::fmt;

/// Precondition violation raised by an operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Operation invoked on the zero (invalid) handle.
    UsageOnZeroValue { method: &'static str },
    /// Operation not defined for the handle's or descriptor's kind.
    KindMismatch { method: &'static str, kind: Kind },
    /// Index outside `0..len`.
    IndexOutOfRange {
        method: &'static str,
        index: usize,
        len: usize,
    },
    /// Invalid `low:high:max` bounds for the given capacity.
    SliceBounds {
        low: usize,
        high: usize,
        max: usize,
        cap: usize,
    },
    /// Mutation or slicing through a handle that is not addressable.
    NotAddressable { method: &'static str },
    /// Handle obtained through an unexported field or method.
    ReadOnly { method: &'static str },
    /// Value of one type used where another, unassignable type is required.
    NotAssignable {
        context: &'static str,
        from: String,
        to: String,
    },
    /// No conversion rule between the two types.
    NotConvertible { from: String, to: String },
    /// Wrong number of call arguments.
    ArgumentCount {
        method: &'static str,
        got: usize,
        want: usize,
    },
    /// Call of a nil function value.
    NilFunc,
    /// Value method reached through a nil pointer receiver.
    NilReceiver { method: &'static str },
    /// Write into a nil map.
    NilMap,
    /// Operation on a nil channel that would block forever.
    NilChan { method: &'static str },
    /// Send on, or close of, a closed channel.
    ClosedChan { method: &'static str },
    /// Channel direction does not allow the operation.
    ChanDirection { method: &'static str, dir: String },
    /// A type synthesis request describes an illegal shape.
    IllegalShape { op: &'static str, reason: String },
    /// Comparison or hashing of an incomparable type.
    NotComparable { type_name: String },
    /// A function body returned results that do not match its signature.
    BadResult { reason: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UsageOnZeroValue { method } => {
                write!(f, "rtti: call of {} on zero Value", method)
            }
            Self::KindMismatch { method, kind } => {
                write!(f, "rtti: call of {} on {} Value", method, kind)
            }
            Self::IndexOutOfRange { method, index, len } => {
                write!(f, "rtti: {}: index out of range [{}] with length {}", method, index, len)
            }
            Self::SliceBounds {
                low,
                high,
                max,
                cap,
            } => write!(
                f,
                "rtti: slice index out of bounds [{}:{}:{}] with capacity {}",
                low, high, max, cap
            ),
            Self::NotAddressable { method } => {
                write!(f, "rtti: {} using unaddressable value", method)
            }
            Self::ReadOnly { method } => write!(
                f,
                "rtti: {} using value obtained using unexported field",
                method
            ),
            Self::NotAssignable { context, from, to } => {
                write!(f, "rtti: {}: value of type {} is not assignable to type {}", context, from, to)
            }
            Self::NotConvertible { from, to } => {
                write!(f, "rtti: cannot convert value of type {} to type {}", from, to)
            }
            Self::ArgumentCount { method, got, want } => write!(
                f,
                "rtti: {}: wrong argument count: got {}, want {}",
                method, got, want
            ),
            Self::NilFunc => write!(f, "rtti: call of nil function"),
            Self::NilReceiver { method } => {
                write!(f, "rtti: value method {} called using nil pointer", method)
            }
            Self::NilMap => write!(f, "rtti: assignment to entry in nil map"),
            Self::NilChan { method } => {
                write!(f, "rtti: {} on nil channel would block forever", method)
            }
            Self::ClosedChan { method } => write!(f, "rtti: {} of closed channel", method),
            Self::ChanDirection { method, dir } => {
                write!(f, "rtti: {} using {} channel", method, dir)
            }
            Self::IllegalShape { op, reason } => write!(f, "rtti: {}: {}", op, reason),
            Self::NotComparable { type_name } => {
                write!(f, "rtti: comparing uncomparable type {}", type_name)
            }
            Self::BadResult { reason } => write!(f, "rtti: function returned {}", reason),
        }
    }
}

impl std::error::Error for Error {}

/// Result alias for precondition-checked operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Abort the current operation with a precondition violation.
///
/// The error is logged at `error` level before the panic so that it stays
/// visible when a host swallows the unwind.
#[cold]
#[track_caller]
pub fn raise(err: Error) -> ! {
    log::error!("[rtti] {}", err);
    panic!("{}", err)
}

/// `Result` extension that raises instead of returning the error.
pub(crate) trait OrRaise<T> {
    fn or_raise(self) -> T;
}

impl<T> OrRaise<T> for Result<T> {
    #[track_caller]
    #[inline]
    fn or_raise(self) -> T {
        match self {
            Ok(v) => v,
            Err(e) => raise(e),
        }
    }
}
