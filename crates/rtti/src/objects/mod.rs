// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime objects behind the composite kinds.
//!
//! The value layer only ever sees one word per map, channel or function: a
//! pointer to one of the objects below. Strings and slices are plain
//! headers laid out in place.

mod chan;
mod func;
mod map;
mod slice;
mod string;

pub use chan::ChanObject;
pub(crate) use chan::Recv;
pub use func::FuncObject;
pub use map::MapObject;
pub use slice::SliceHeader;
pub use string::StringHeader;

use crate::heap;
use crate::types::Type;

/// Owned, 8-byte aligned scratch copy of one value: call frames and the
/// copies handed out by map reads. Never seen by the installed heap.
pub(crate) struct Block(Box<[u64]>);

impl Block {
    pub fn zeroed(size: usize) -> Self {
        Self(vec![0u64; size.div_ceil(8)].into_boxed_slice())
    }

    /// Copy of the value of type `t` at `src`.
    ///
    /// # Safety
    /// `src` must hold a value of type `t`.
    pub unsafe fn copy_of(t: Type, src: *const u8) -> Self {
        let mut b = Self::zeroed(t.size());
        if t.size() != 0 {
            std::ptr::copy_nonoverlapping(src, b.as_mut_ptr(), t.size());
        }
        b
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.0.as_ptr().cast()
    }

    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.0.as_mut_ptr().cast()
    }

    /// Move the contents to fresh heap storage for type `t`.
    pub fn into_heap(self, t: Type) -> *mut u8 {
        let p = heap::alloc(t);
        // SAFETY: both regions hold t.size() bytes.
        unsafe { heap::typed_copy(t, p, self.as_ptr()) };
        p
    }
}

/// One value kept by a runtime object (a map key or element, a queued
/// message), in storage from the installed heap. Writes go through the
/// heap's write barrier.
pub(crate) struct Stored(*mut u8);

// SAFETY: the storage lives for the process; the owning map or channel
// serializes writes to it.
unsafe impl Send for Stored {}
unsafe impl Sync for Stored {}

impl Stored {
    /// Heap copy of the value of type `t` at `src`.
    ///
    /// # Safety
    /// `src` must hold a value of type `t`.
    pub unsafe fn copy_of(t: Type, src: *const u8) -> Self {
        let p = heap::alloc(t);
        heap::typed_copy(t, p, src);
        Self(p)
    }

    /// Replace the stored value with the one at `src`.
    ///
    /// # Safety
    /// `src` must hold a value of type `t`, the type this was created with.
    pub unsafe fn overwrite(&self, t: Type, src: *const u8) {
        heap::typed_copy(t, self.0, src);
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.0
    }
}
