// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Struct types.
//!
//! `struct_of` validates the field list, lays it out, and promotes the
//! exported methods of embedded fields. Two requests with the same fields
//! (names, types, tags, embedding, order) return the same descriptor.

use super::build::{self, FieldSpecRef};
use super::cache::{canonical_shape, ShapeEncoder};
use crate::call::{promoted_method, promoted_pointer_method, Promoted};
use crate::error::{Error, OrRaise, Result};
use crate::types::rtype::{is_exported, MethodEntry, MethodTable};
use crate::types::{Kind, Type};
use std::collections::{HashMap, HashSet};

/// One field of a [`struct_of`] request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructFieldSpec {
    /// Field name; may be left empty for embedded fields of named type.
    pub name: String,
    /// Declaring package, required for unexported names.
    pub pkg_path: String,
    pub typ: Type,
    pub tag: String,
    pub embedded: bool,
}

impl StructFieldSpec {
    /// Named field.
    #[must_use]
    pub fn new(name: impl Into<String>, typ: Type) -> Self {
        Self {
            name: name.into(),
            pkg_path: String::new(),
            typ,
            tag: String::new(),
            embedded: false,
        }
    }

    /// Embedded field; its name is the (pointed-to) type's name.
    #[must_use]
    pub fn embed(typ: Type) -> Self {
        Self {
            embedded: true,
            ..Self::new("", typ)
        }
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    #[must_use]
    pub fn with_pkg_path(mut self, pkg_path: impl Into<String>) -> Self {
        self.pkg_path = pkg_path.into();
        self
    }
}

fn illegal(reason: String) -> Error {
    Error::IllegalShape {
        op: "struct_of",
        reason,
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c == '_' || c.is_alphabetic())
        && chars.all(|c| c == '_' || c.is_alphanumeric())
}

/// Check a field list and resolve embedded names; returns the fields and
/// the struct's package path.
pub(crate) fn validate(fields: &[StructFieldSpec]) -> Result<(Vec<FieldSpecRef<'_>>, String)> {
    let mut out = Vec::with_capacity(fields.len());
    let mut seen: HashSet<&str> = HashSet::with_capacity(fields.len());
    let mut pkg_path: Option<&str> = None;

    for (i, f) in fields.iter().enumerate() {
        let name: &str = if f.name.is_empty() {
            if !f.embedded {
                return Err(illegal(format!("field {} has no name", i)));
            }
            let base = if f.typ.kind() == Kind::Pointer {
                f.typ.elem()
            } else {
                f.typ
            };
            if base.name().is_empty() {
                return Err(illegal(format!(
                    "embedded field {} has unnamed type {}",
                    i, f.typ
                )));
            }
            base.name()
        } else {
            &f.name
        };

        if !is_identifier(name) {
            return Err(illegal(format!("field {} has invalid name {:?}", i, name)));
        }
        if !seen.insert(name) {
            return Err(illegal(format!("duplicate field {}", name)));
        }

        let exported = is_exported(name);
        if !exported {
            if f.pkg_path.is_empty() {
                return Err(illegal(format!(
                    "field {:?} is unexported but missing PkgPath",
                    name
                )));
            }
            match pkg_path {
                Some(p) if p != f.pkg_path => {
                    return Err(illegal(format!(
                        "fields with different PkgPath {:?} and {:?}",
                        p, f.pkg_path
                    )))
                }
                _ => pkg_path = Some(&f.pkg_path),
            }
        }

        if f.embedded
            && f.typ.kind() == Kind::Interface
            && f.typ.imethods().iter().any(|m| !m.pkg_path.is_empty())
        {
            return Err(illegal(format!(
                "embedded interface {} with unexported method(s) not implemented",
                f.typ
            )));
        }

        out.push(FieldSpecRef {
            name,
            pkg_path: if exported { "" } else { &f.pkg_path },
            typ: f.typ,
            tag: &f.tag,
            embedded: f.embedded,
        });
    }

    Ok((out, pkg_path.unwrap_or_default().to_owned()))
}

/// Struct type with the given fields. Raises on an illegal field list.
#[track_caller]
#[must_use]
pub fn struct_of(fields: &[StructFieldSpec]) -> Type {
    try_struct_of(fields).or_raise()
}

pub fn try_struct_of(fields: &[StructFieldSpec]) -> Result<Type> {
    let (refs, pkg_path) = validate(fields)?;

    let mut enc = ShapeEncoder::new("struct");
    enc.str(&pkg_path);
    for f in &refs {
        enc.str(f.name)
            .str(f.pkg_path)
            .typ(f.typ)
            .str(f.tag)
            .flag(f.embedded);
    }

    let same = |t: Type| {
        if t.kind() != Kind::Struct || t.struct_pkg_path() != pkg_path {
            return false;
        }
        let have = t.field_descs();
        have.len() == refs.len()
            && have.iter().zip(&refs).all(|(h, f)| {
                h.name == f.name
                    && h.pkg_path == f.pkg_path
                    && h.typ == f.typ
                    && h.tag == f.tag
                    && h.embedded == f.embedded
            })
    };

    canonical_shape(
        enc.finish(),
        || build::struct_string(&refs),
        same,
        |_| {
            let promotes = refs.iter().any(|f| f.embedded && f.typ.num_method() > 0);
            let t = build::new_struct(&refs, &pkg_path, promotes)?;
            if promotes {
                attach_pointer_type(t)?;
                attach_methods(t, promoted_methods(t, &[])?);
            }
            Ok(t)
        },
    )
}

/// Give an unnamed promoting struct its own `*S` carrying the promoted
/// pointer method set. `pointer_to` returns it from then on.
pub(crate) fn attach_pointer_type(t: Type) -> Result<Type> {
    let pt = build::new_pointer(t, Some(build::method_holder()));
    let _ = t.rtype().ptr_to_this.set(pt);
    attach_methods(pt, promoted_pointer_methods(t, pt, &[])?);
    Ok(pt)
}

/// Fill the method table of a freshly built type.
pub(crate) fn attach_methods(t: Type, entries: Vec<MethodEntry>) {
    if let Some(u) = t.rtype().uncommon {
        // The record is unpublished, so the slot is still empty.
        let _ = u.methods.set(MethodTable::new(entries));
    }
}

/// Methods promoted from the embedded fields of struct `owner`.
///
/// A name provided by more than one embedded field at the same depth is
/// ambiguous and dropped; so is a name that is also a field of `owner` or
/// listed in `declared`.
pub(crate) fn promoted_methods(owner: Type, declared: &[&str]) -> Result<Vec<MethodEntry>> {
    promotable(owner, declared, false)
        .into_iter()
        .map(|(i, p)| promoted_method(owner, i, p))
        .collect()
}

/// Methods promoted into the method set of `pt`, the pointer to struct
/// `owner`. Embedded value fields contribute their pointer-receiver methods
/// as well, called through the field's address.
pub(crate) fn promoted_pointer_methods(
    owner: Type,
    pt: Type,
    declared: &[&str],
) -> Result<Vec<MethodEntry>> {
    promotable(owner, declared, true)
        .into_iter()
        .map(|(i, p)| promoted_pointer_method(pt, i, p))
        .collect()
}

fn candidates(owner: Type, addressable: bool) -> Vec<(usize, Promoted)> {
    let mut out = Vec::new();
    for (i, f) in owner.field_descs().iter().enumerate().filter(|(_, f)| f.embedded) {
        match f.typ.kind() {
            Kind::Interface => {
                out.extend(f.typ.imethods().iter().map(|m| (i, Promoted::Interface(*m))));
            }
            Kind::Pointer => {
                out.extend(
                    f.typ
                        .exported_method_entries()
                        .iter()
                        .map(|m| (i, Promoted::Concrete(*m))),
                );
            }
            _ => match f.typ.rtype().ptr_to_this.get() {
                Some(fp) if addressable => out.extend(
                    fp.exported_method_entries()
                        .iter()
                        .map(|m| (i, Promoted::Addressed(*m))),
                ),
                _ => out.extend(
                    f.typ
                        .exported_method_entries()
                        .iter()
                        .map(|m| (i, Promoted::Concrete(*m))),
                ),
            },
        }
    }
    out
}

/// Candidates that survive the ambiguity rules. Names are counted over the
/// addressable set, so a pointer-receiver method of one embedded field
/// still shadows a same-named value method of another.
fn promotable(owner: Type, declared: &[&str], addressable: bool) -> Vec<(usize, Promoted)> {
    let fields = owner.field_descs();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for (_, p) in candidates(owner, true) {
        *counts.entry(p.name()).or_default() += 1;
    }

    candidates(owner, addressable)
        .into_iter()
        .filter(|(_, p)| {
            let name = p.name();
            counts.get(name) == Some(&1)
                && !fields.iter().any(|f| f.name == name)
                && !declared.contains(&name)
        })
        .collect()
}
