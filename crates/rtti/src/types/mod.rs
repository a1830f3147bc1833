// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type descriptors and the descriptor table.
//!
//! A [`Type`] is a `Copy` handle on an immutable [`RType`] record. Builtin
//! descriptors are statics; everything else is produced either by a
//! [`TableBuilder`] (compile-time emission) or by [`crate::synth`] (runtime
//! synthesis), and deduplicated so that pointer equality is type identity.

pub(crate) mod alg;
mod builder;
mod builtin;
mod kind;
pub(crate) mod rtype;
pub mod table;
mod tag;
mod typ;

pub use builder::{Receiver, TableBuilder};
pub use builtin::{basic, empty_interface};
pub use kind::Kind;
pub use rtype::{fnv1a, is_exported, ChanDir, EqualFn, HashFn, RType, TFlag};
pub use table::{contains, lookup_by_string, register_module, table, TypeModule, TypeTable};
pub use tag::StructTag;
pub use typ::{Method, StructField, Type};

#[cfg(test)]
mod tests;
