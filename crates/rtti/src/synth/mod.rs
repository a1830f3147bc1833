// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic type synthesis.
//!
//! Builds composite descriptors on demand:
//!
//! | Entry point      | Result                 | Cache              |
//! |------------------|------------------------|--------------------|
//! | [`pointer_to`]   | `*T`                   | exact key          |
//! | [`slice_of`]     | `[]T`                  | exact key          |
//! | [`array_of`]     | `[N]T`                 | exact key          |
//! | [`map_of`]       | `map[K]V`              | exact key          |
//! | [`chan_of`]      | `chan T` / directional | exact key          |
//! | [`struct_of`]    | `struct { ... }`       | MD5 shape + linear |
//! | [`func_of`]      | `func(...) ...`        | MD5 shape + linear |
//!
//! Every request first consults its cache, then the descriptor table (so a
//! compiled-in descriptor with the same shape is reused), and only then
//! builds a new record. Structurally identical requests always return the
//! same [`Type`](crate::types::Type).

pub(crate) mod build;
mod cache;
mod composite;
mod func_of;
mod struct_of;

pub use cache::{cache_stats, CacheStats, ShapeHash};
pub use composite::{array_of, chan_of, map_of, pointer_to, slice_of, try_array_of, try_map_of};
pub use func_of::{func_of, try_func_of};
pub use struct_of::{struct_of, try_struct_of, StructFieldSpec};

pub(crate) use func_of::{interface_of, method_func_type, MethodSpec};
pub(crate) use struct_of::{
    attach_methods, attach_pointer_type, promoted_methods, promoted_pointer_methods,
    validate as validate_fields,
};

#[cfg(test)]
mod tests;
