// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Module builder.
//!
//! Stands in for the compiler: declares the named types, methods and unnamed
//! composites one unit of code would emit, then produces a [`TypeModule`]
//! for [`register_module`](super::register_module).
//!
//! # Example
//!
//! ```
//! use rtti::types::{basic, register_module, Kind, Receiver, TableBuilder};
//! use rtti::synth::func_of;
//!
//! let mut tb = TableBuilder::new("example.com/geo");
//! let meters = tb.named("Meters", basic(Kind::Float64));
//! let ret_f64 = func_of(&[], &[basic(Kind::Float64)], false);
//! tb.method(meters, "Km", Receiver::Value, ret_f64, |args| {
//!     vec![rtti::value_of_native(args[0].float() / 1000.0)]
//! });
//! let module = register_module(tb.finish());
//! assert!(module.contains(meters));
//! assert_eq!(meters.string(), "geo.Meters");
//! assert_eq!(meters.num_method(), 1);
//! ```
//!
//! Types handed out by a builder must not be used before [`TableBuilder::finish`]
//! has run: method tables and pointer types are attached there.

use super::rtype::is_exported;
use super::table::TypeModule;
use super::{Kind, Type};
use crate::call::{deref_method, func_object, MethodBody};
use crate::error::{raise, Error, OrRaise};
use crate::synth::{
    self, attach_methods, attach_pointer_type, build, interface_of, method_func_type,
    promoted_methods, promoted_pointer_methods, validate_fields, MethodSpec, StructFieldSpec,
};
use crate::types::rtype::MethodEntry;
use crate::value::Value;
use std::sync::Arc;

/// Receiver form of a declared method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receiver {
    /// `func (t T) M()`: in the method set of both `T` and `*T`.
    Value,
    /// `func (t *T) M()`: in the method set of `*T` only.
    Pointer,
}

struct PendingMethod {
    owner: Type,
    name: String,
    recv: Receiver,
    mtyp: Type,
    body: MethodBody,
}

/// Collects the descriptors of one module.
pub struct TableBuilder {
    pkg_path: String,
    types: Vec<Type>,
    named: Vec<Type>,
    methods: Vec<PendingMethod>,
}

impl TableBuilder {
    #[must_use]
    pub fn new(pkg_path: impl Into<String>) -> Self {
        Self {
            pkg_path: pkg_path.into(),
            types: Vec::new(),
            named: Vec::new(),
            methods: Vec::new(),
        }
    }

    #[must_use]
    pub fn pkg_path(&self) -> &str {
        &self.pkg_path
    }

    fn emit(&mut self, t: Type) -> Type {
        if !self.types.contains(&t) {
            self.types.push(t);
        }
        t
    }

    /// Unexported fields without a package default to this module's.
    fn own_fields(&self, fields: &[StructFieldSpec]) -> Vec<StructFieldSpec> {
        fields
            .iter()
            .map(|f| {
                let mut f = f.clone();
                let unexported = if f.name.is_empty() {
                    false
                } else {
                    !is_exported(&f.name)
                };
                if unexported && f.pkg_path.is_empty() {
                    f.pkg_path.clone_from(&self.pkg_path);
                }
                f
            })
            .collect()
    }

    fn fresh_struct(&self, fields: &[StructFieldSpec]) -> Type {
        let fields = self.own_fields(fields);
        let (refs, pkg_path) = validate_fields(&fields).or_raise();
        let promotes = refs.iter().any(|f| f.embedded && f.typ.num_method() > 0);
        let t = build::new_struct(&refs, &pkg_path, promotes).or_raise();
        if promotes {
            attach_pointer_type(t).or_raise();
            attach_methods(t, promoted_methods(t, &[]).or_raise());
        }
        t
    }

    /// Declare `type Name underlying`.
    pub fn named(&mut self, name: &str, underlying: Type) -> Type {
        let t = build::new_named(&self.pkg_path, name, underlying);
        self.named.push(t);
        log::debug!("[table] declared {} ({})", t, underlying);
        self.emit(t)
    }

    /// Declare `type Name struct { ... }`.
    pub fn named_struct(&mut self, name: &str, fields: &[StructFieldSpec]) -> Type {
        let fields = self.own_fields(fields);
        let (refs, pkg_path) = validate_fields(&fields).or_raise();
        let underlying = build::new_struct(&refs, &pkg_path, false).or_raise();
        self.named(name, underlying)
    }

    /// Declare `type Name interface { ... }`.
    pub fn named_interface(&mut self, name: &str, methods: &[(&str, Type)]) -> Type {
        let underlying = self.interface_type(methods);
        self.named(name, underlying)
    }

    fn interface_type(&self, methods: &[(&str, Type)]) -> Type {
        let specs: Vec<MethodSpec<'_>> = methods
            .iter()
            .map(|(name, typ)| MethodSpec {
                name,
                pkg_path: &self.pkg_path,
                typ: *typ,
            })
            .collect();
        interface_of(&specs).or_raise()
    }

    /// Unnamed interface type.
    pub fn interface(&mut self, methods: &[(&str, Type)]) -> Type {
        let t = self.interface_type(methods);
        self.emit(t)
    }

    /// Unnamed struct type emitted by this module.
    pub fn struct_type(&mut self, fields: &[StructFieldSpec]) -> Type {
        let t = self.fresh_struct(fields);
        self.emit(t)
    }

    /// Unnamed slice type emitted by this module.
    pub fn slice_type(&mut self, elem: Type) -> Type {
        let t = build::new_slice(elem);
        self.emit(t)
    }

    /// Function type; function types are always canonical.
    pub fn func_type(&mut self, ins: &[Type], outs: &[Type], variadic: bool) -> Type {
        let t = synth::func_of(ins, outs, variadic);
        self.emit(t)
    }

    /// Declare a method on a named type of this module.
    ///
    /// `mtyp` is the signature without receiver. `body` receives the receiver
    /// followed by the arguments and returns the results.
    pub fn method<F>(
        &mut self,
        owner: Type,
        name: &str,
        recv: Receiver,
        mtyp: Type,
        body: F,
    ) -> &mut Self
    where
        F: Fn(&[Value]) -> Vec<Value> + Send + Sync + 'static,
    {
        if !self.named.contains(&owner) {
            raise(Error::IllegalShape {
                op: "TableBuilder::method",
                reason: format!("{} is not a named type of {}", owner, self.pkg_path),
            });
        }
        if owner.kind() == Kind::Interface || owner.kind() == Kind::Pointer {
            raise(Error::IllegalShape {
                op: "TableBuilder::method",
                reason: format!("invalid receiver type {}", owner),
            });
        }
        if mtyp.kind() != Kind::Func {
            raise(Error::KindMismatch {
                method: "TableBuilder::method",
                kind: mtyp.kind(),
            });
        }
        if self
            .methods
            .iter()
            .any(|m| m.owner == owner && m.name == name)
        {
            raise(Error::IllegalShape {
                op: "TableBuilder::method",
                reason: format!("method redeclared: {}.{}", owner, name),
            });
        }
        self.methods.push(PendingMethod {
            owner,
            name: name.to_owned(),
            recv,
            mtyp,
            body: Arc::new(body),
        });
        self
    }

    fn entry(&self, recv_type: Type, m: &PendingMethod) -> MethodEntry {
        let ftyp = method_func_type(recv_type, m.mtyp).or_raise();
        let body = Arc::clone(&m.body);
        MethodEntry {
            name: build::leak_str(m.name.as_str()),
            pkg_path: if is_exported(&m.name) {
                ""
            } else {
                build::leak_str(self.pkg_path.as_str())
            },
            mtyp: m.mtyp,
            ifn: func_object(ftyp, move |args| body(args)),
        }
    }

    /// Lay out method tables, create `*T` for every named `T`, and return
    /// the module.
    #[must_use]
    pub fn finish(mut self) -> TypeModule {
        let named = std::mem::take(&mut self.named);
        for t in named {
            let pt = build::new_pointer(t, Some(build::method_holder()));
            let _ = t.rtype().ptr_to_this.set(pt);

            let mut value_methods = Vec::new();
            let mut pointer_methods = Vec::new();
            let mut declared: Vec<&str> = Vec::new();
            for m in self.methods.iter().filter(|m| m.owner == t) {
                declared.push(&m.name);
                match m.recv {
                    Receiver::Value => value_methods.push(self.entry(t, m)),
                    Receiver::Pointer => pointer_methods.push(self.entry(pt, m)),
                }
            }
            for e in &value_methods {
                pointer_methods.push(deref_method(pt, *e).or_raise());
            }
            if t.kind() == Kind::Struct {
                value_methods.extend(promoted_methods(t, &declared).or_raise());
                pointer_methods.extend(promoted_pointer_methods(t, pt, &declared).or_raise());
            }

            log::debug!(
                "[table] {} has {} value and {} pointer methods",
                t,
                value_methods.len(),
                pointer_methods.len()
            );
            attach_methods(t, value_methods);
            attach_methods(pt, pointer_methods);
            self.emit(pt);
        }
        TypeModule::new(self.pkg_path, self.types)
    }
}
