// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Function and interface types.

use super::build;
use super::cache::{canonical_shape, ShapeEncoder};
use crate::config::MAX_FUNC_PARAMS;
use crate::error::{Error, OrRaise, Result};
use crate::types::rtype::{is_exported, method_order, IMethod};
use crate::types::{Kind, Type};

/// Function type with the given parameters and results.
///
/// A variadic function's last parameter must be a slice. Raises on an
/// illegal signature.
#[track_caller]
#[must_use]
pub fn func_of(ins: &[Type], outs: &[Type], variadic: bool) -> Type {
    try_func_of(ins, outs, variadic).or_raise()
}

pub fn try_func_of(ins: &[Type], outs: &[Type], variadic: bool) -> Result<Type> {
    if variadic && ins.last().map_or(true, |t| t.kind() != Kind::Slice) {
        return Err(Error::IllegalShape {
            op: "func_of",
            reason: "last arg of variadic func must be slice".to_owned(),
        });
    }
    if ins.len() > MAX_FUNC_PARAMS || outs.len() > MAX_FUNC_PARAMS {
        return Err(Error::IllegalShape {
            op: "func_of",
            reason: format!(
                "too many arguments: {} in, {} out (limit {})",
                ins.len(),
                outs.len(),
                MAX_FUNC_PARAMS
            ),
        });
    }

    let mut enc = ShapeEncoder::new("func");
    for t in ins {
        enc.typ(*t);
    }
    enc.str("->");
    for t in outs {
        enc.typ(*t);
    }
    enc.flag(variadic);

    canonical_shape(
        enc.finish(),
        || build::func_string(ins, outs, variadic),
        |t| {
            t.kind() == Kind::Func
                && t.ins() == ins
                && t.outs() == outs
                && t.is_variadic() == variadic
        },
        |_| Ok(build::new_func(ins, outs, variadic)),
    )
}

/// Signature of a method with its receiver as the first parameter.
pub(crate) fn method_func_type(recv: Type, mtyp: Type) -> Result<Type> {
    let mut ins = Vec::with_capacity(mtyp.num_in() + 1);
    ins.push(recv);
    ins.extend_from_slice(mtyp.ins());
    try_func_of(&ins, mtyp.outs(), mtyp.is_variadic())
}

/// Interface method request.
#[derive(Debug, Clone)]
pub(crate) struct MethodSpec<'a> {
    pub name: &'a str,
    /// Required for unexported names.
    pub pkg_path: &'a str,
    pub typ: Type,
}

/// Unnamed interface type over `methods`.
pub(crate) fn interface_of(methods: &[MethodSpec<'_>]) -> Result<Type> {
    let mut sorted: Vec<MethodSpec<'_>> = Vec::with_capacity(methods.len());
    let mut pkg_path = "";
    for m in methods {
        if m.typ.kind() != Kind::Func {
            return Err(Error::IllegalShape {
                op: "interface_of",
                reason: format!("method {} has non-func type {}", m.name, m.typ),
            });
        }
        if is_exported(m.name) {
            sorted.push(MethodSpec {
                pkg_path: "",
                ..m.clone()
            });
            continue;
        }
        if m.pkg_path.is_empty() {
            return Err(Error::IllegalShape {
                op: "interface_of",
                reason: format!("method {} is unexported but missing PkgPath", m.name),
            });
        }
        pkg_path = m.pkg_path;
        sorted.push(m.clone());
    }
    sorted.sort_by(|a, b| {
        method_order(a.name, a.pkg_path).cmp(&method_order(b.name, b.pkg_path))
    });
    if let Some(w) = sorted.windows(2).find(|w| w[0].name == w[1].name) {
        return Err(Error::IllegalShape {
            op: "interface_of",
            reason: format!("duplicate method {}", w[0].name),
        });
    }

    let mut enc = ShapeEncoder::new("interface");
    for m in &sorted {
        enc.str(m.name).str(m.pkg_path).typ(m.typ);
    }

    let same = |t: Type| {
        let have = t.imethods();
        t.kind() == Kind::Interface
            && have.len() == sorted.len()
            && have
                .iter()
                .zip(&sorted)
                .all(|(h, m)| h.name == m.name && h.pkg_path == m.pkg_path && h.typ == m.typ)
    };

    canonical_shape(
        enc.finish(),
        || build::interface_string(sorted.iter().map(|m| (m.name, m.typ))),
        same,
        |_| {
            let owned: Vec<IMethod> = sorted.iter().map(MethodSpec::to_imethod).collect();
            Ok(build::new_interface(owned, pkg_path))
        },
    )
}

impl MethodSpec<'_> {
    fn to_imethod(&self) -> IMethod {
        IMethod {
            name: build::leak_str(self.name),
            pkg_path: if self.pkg_path.is_empty() {
                ""
            } else {
                build::leak_str(self.pkg_path)
            },
            typ: self.typ,
        }
    }
}
