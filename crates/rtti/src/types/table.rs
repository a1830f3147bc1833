// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Descriptor table.
//!
//! The table is a list of modules, each holding the descriptors one unit of
//! code emitted, sorted by canonical string. It is published through an
//! `ArcSwap`: lookups load a snapshot without locking, registration builds
//! a new table and swaps it in.
//!
//! The builtin module (basic kinds, `unsafe.Pointer`, `interface {}`) is
//! present from first use.

use super::{builtin, Type};
use arc_swap::ArcSwap;
use std::sync::{Arc, OnceLock};

/// Descriptors emitted by one unit of code.
#[derive(Debug, Clone)]
pub struct TypeModule {
    name: String,
    /// Sorted by canonical string.
    by_string: Vec<Type>,
    /// Sorted by descriptor address.
    by_addr: Vec<usize>,
}

impl TypeModule {
    /// Build a module from an arbitrary list of descriptors.
    #[must_use]
    pub fn new(name: impl Into<String>, mut types: Vec<Type>) -> Self {
        types.sort_by(|a, b| a.string().cmp(b.string()).then(a.addr().cmp(&b.addr())));
        types.dedup();
        let mut by_addr: Vec<usize> = types.iter().map(|t| t.addr()).collect();
        by_addr.sort_unstable();
        Self {
            name: name.into(),
            by_string: types,
            by_addr,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn types(&self) -> &[Type] {
        &self.by_string
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_string.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_string.is_empty()
    }

    /// All descriptors with canonical string `s`.
    #[must_use]
    pub fn lookup(&self, s: &str) -> &[Type] {
        let lo = self.by_string.partition_point(|t| t.string() < s);
        let hi = lo + self.by_string[lo..].partition_point(|t| t.string() == s);
        &self.by_string[lo..hi]
    }

    #[must_use]
    pub fn contains(&self, t: Type) -> bool {
        self.by_addr.binary_search(&t.addr()).is_ok()
    }
}

/// Snapshot of every registered module.
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    modules: Vec<Arc<TypeModule>>,
}

impl TypeTable {
    fn with_builtins() -> Self {
        Self {
            modules: vec![Arc::new(TypeModule::new("builtin", builtin::all()))],
        }
    }

    #[must_use]
    pub fn modules(&self) -> &[Arc<TypeModule>] {
        &self.modules
    }

    /// Descriptors whose canonical string is `s`, across all modules.
    ///
    /// Several descriptors may share a string (same name declared in
    /// different packages); callers disambiguate structurally.
    #[must_use]
    pub fn lookup_by_string(&self, s: &str) -> Vec<Type> {
        self.modules
            .iter()
            .flat_map(|m| m.lookup(s).iter().copied())
            .collect()
    }

    /// Whether `t` was emitted by a registered module.
    #[must_use]
    pub fn contains(&self, t: Type) -> bool {
        self.modules.iter().any(|m| m.contains(t))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.iter().map(|m| m.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn cell() -> &'static ArcSwap<TypeTable> {
    static TABLE: OnceLock<ArcSwap<TypeTable>> = OnceLock::new();
    TABLE.get_or_init(|| ArcSwap::from_pointee(TypeTable::with_builtins()))
}

/// Current table snapshot.
#[must_use]
pub fn table() -> Arc<TypeTable> {
    cell().load_full()
}

/// Publish a module. Its descriptors become visible to lookups and to
/// synthesis canonicalization.
pub fn register_module(module: TypeModule) -> Arc<TypeModule> {
    let module = Arc::new(module);
    log::debug!(
        "[table] registering module '{}' ({} types)",
        module.name(),
        module.len()
    );
    cell().rcu(|cur| {
        let mut next = TypeTable::clone(cur);
        next.modules.push(Arc::clone(&module));
        next
    });
    module
}

/// Shorthand for `table().lookup_by_string(s)`.
#[must_use]
pub fn lookup_by_string(s: &str) -> Vec<Type> {
    cell().load().lookup_by_string(s)
}

/// Shorthand for `table().contains(t)`.
#[must_use]
pub fn contains(t: Type) -> bool {
    cell().load().contains(t)
}
