// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # rtti - runtime type descriptors and dynamic values
//!
//! Type descriptors, value handles over raw memory, on-demand type synthesis,
//! conversions and dynamic calls, for a statically typed host that needs to
//! inspect and build values whose types are only known at run time.
//!
//! ## Quick Start
//!
//! ```rust
//! use rtti::synth::{struct_of, StructFieldSpec};
//! use rtti::types::{basic, Kind};
//! use rtti::value;
//!
//! let point = struct_of(&[
//!     StructFieldSpec::new("X", basic(Kind::Int32)),
//!     StructFieldSpec::new("Label", basic(Kind::String)),
//! ]);
//!
//! let p = value::new(point).elem();
//! p.field(0).set_int(42);
//! p.field(1).set_string("origin");
//!
//! assert_eq!(p.field(0).int(), 42);
//! assert_eq!(p.field_by_name("Label").map(|f| f.string()), Some("origin".into()));
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |   call (Value::call, make_func)      convert (select_converter)     |
//! +---------------------------------------------------------------------+
//! |   value (Value, field/index/elem/map/chan/set/make)   iface (Eface) |
//! +---------------------------------------------------------------------+
//! |   synth (struct_of, func_of, ...)    types (Type, table, builder)   |
//! +---------------------------------------------------------------------+
//! |   layout (offsets, pointer masks)    heap / objects (storage hooks) |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Type`] | Canonical descriptor; equal types are pointer-equal |
//! | [`Value`] | `{type, pointer, flags}` handle on a located value |
//! | [`Eface`] | Two-word boxed form crossing the static/dynamic boundary |
//! | [`Kind`] | The 27 kinds of type |
//! | [`Error`] | Precondition violations; raised as panics by plain methods |
//!
//! ## Errors
//!
//! Misuse (wrong kind, out-of-range index, writing through a non-settable
//! handle, ...) is fatal: plain methods log the [`Error`] and panic. Every
//! such method has a `try_*` twin returning [`Result`]. Expected outcomes
//! (absent map key, nil pointer, exhausted iterator, no conversion) are
//! `Option`/`bool` results.
//!
//! ## Logging
//!
//! The crate logs through the `log` facade and installs no logger.

/// Call bridge (dynamic calls, closures as func values, frames).
pub mod call;
/// Complex number storage types.
pub mod complex;
/// Layout constants and runtime tunables.
pub mod config;
/// Conversion engine and assignability.
pub mod convert;
/// Error type and the raise policy.
pub mod error;
/// Storage allocation hook.
pub mod heap;
/// Dynamic-container bridge and the native `Reflect` bridge.
pub mod iface;
/// Offset arithmetic and pointer maps.
pub mod layout;
/// Runtime objects: string/slice headers, maps, channels, functions.
pub mod objects;
/// Dynamic type synthesis.
pub mod synth;
/// Type descriptors and the descriptor table.
pub mod types;
/// Value handles and composite-kind operators.
pub mod value;

pub use complex::{Complex128, Complex64};
pub use error::{raise, Error, Result};
pub use iface::{value_of, value_of_native, Eface, Reflect};
pub use types::{ChanDir, Kind, Type};
pub use value::{deep_equal, Value};
