// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Layout builder.
//!
//! All byte-offset arithmetic and pointer-mask construction lives here:
//!
//! - [`align_up`] / [`checked_align_up`]: successive alignment of components
//! - [`StructLayout`]: offsets, size, alignment and pointer prefix of a
//!   sequence of fields (structs and call frames)
//! - [`PtrMask`]: bit-per-word pointer bitmap
//! - [`GcProgBuilder`] / [`run_program`]: run-length GC program used when a
//!   bitmap would exceed the configured budget
//!
//! Nothing here touches memory; the rest of the crate only consumes the
//! numbers it produces.

pub mod gcprog;

pub use gcprog::{run_program, GcData, GcProgBuilder, PtrMask};

use crate::config::WORD_SIZE;
use crate::types::Type;

/// Round `x` up to a multiple of `align` (a power of two).
#[inline]
#[must_use]
pub const fn align_up(x: usize, align: usize) -> usize {
    (x + align - 1) & !(align - 1)
}

/// Overflow-checked [`align_up`].
#[inline]
#[must_use]
pub fn checked_align_up(x: usize, align: usize) -> Option<usize> {
    debug_assert!(align.is_power_of_two(), "alignment must be a power of two");
    Some(x.checked_add(align - 1)? & !(align - 1))
}

/// Number of whole words covering `bytes`.
#[inline]
#[must_use]
pub const fn words(bytes: usize) -> usize {
    bytes.div_ceil(WORD_SIZE)
}

/// Layout of a sequence of components placed one after another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructLayout {
    /// Byte offset of each component.
    pub offsets: Vec<usize>,
    /// Total size, rounded to `align`.
    pub size: usize,
    /// Maximum component alignment (at least 1).
    pub align: usize,
    /// Length of the prefix that can contain pointers.
    pub ptrdata: usize,
    /// Whether alignment introduced padding anywhere.
    pub has_padding: bool,
    /// Whether a byte was added after a trailing zero-sized component.
    pub padded_tail: bool,
}

impl StructLayout {
    /// Lay out `types` in order. Returns `None` on size overflow.
    ///
    /// A non-empty layout that ends in a zero-sized component gets one byte
    /// of tail padding, so that the address of that last component never
    /// points past the end of the object.
    #[must_use]
    pub fn compute(types: &[Type]) -> Option<Self> {
        let mut offsets = Vec::with_capacity(types.len());
        let mut off = 0usize;
        let mut align = 1usize;
        let mut ptrdata = 0usize;
        let mut has_padding = false;

        for t in types {
            let fa = t.field_align();
            let at = checked_align_up(off, fa)?;
            if at != off {
                has_padding = true;
            }
            offsets.push(at);
            if t.ptrdata() != 0 {
                ptrdata = at + t.ptrdata();
            }
            off = at.checked_add(t.size())?;
            align = align.max(fa);
        }

        let mut padded_tail = false;
        if off > 0 && types.last().is_some_and(|t| t.size() == 0) {
            off += 1;
            padded_tail = true;
            has_padding = true;
        }

        let size = checked_align_up(off, align)?;
        if size != off {
            has_padding = true;
        }

        Some(Self {
            offsets,
            size,
            align,
            ptrdata,
            has_padding,
            padded_tail,
        })
    }
}
