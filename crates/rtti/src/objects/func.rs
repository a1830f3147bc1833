// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use crate::call::Frame;
use crate::types::{Kind, Type};
use std::fmt;

type Code = Box<dyn Fn(&mut Frame<'_>) + Send + Sync>;

/// Callable behind a func value's word: its signature plus host code that
/// reads arguments from, and writes results to, a [`Frame`].
pub struct FuncObject {
    typ: Type,
    code: Code,
}

impl FuncObject {
    /// `typ` must be a function type.
    pub fn new<F>(typ: Type, code: F) -> Self
    where
        F: Fn(&mut Frame<'_>) + Send + Sync + 'static,
    {
        debug_assert_eq!(typ.kind(), Kind::Func, "FuncObject over non-func type");
        Self {
            typ,
            code: Box::new(code),
        }
    }

    /// Signature.
    #[must_use]
    pub fn typ(&self) -> Type {
        self.typ
    }

    pub(crate) fn invoke(&self, frame: &mut Frame<'_>) {
        (self.code)(frame);
    }
}

impl fmt::Debug for FuncObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuncObject")
            .field("typ", &self.typ)
            .finish_non_exhaustive()
    }
}
