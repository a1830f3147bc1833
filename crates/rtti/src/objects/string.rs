// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use crate::heap;

/// In-memory form of a `string`: data pointer and byte length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct StringHeader {
    pub data: *const u8,
    pub len: usize,
}

impl Default for StringHeader {
    fn default() -> Self {
        Self {
            data: std::ptr::null(),
            len: 0,
        }
    }
}

impl StringHeader {
    /// Header viewing `bytes`; the bytes must outlive every use of it.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            data: bytes.as_ptr(),
            len: bytes.len(),
        }
    }

    #[must_use]
    pub fn from_static(s: &'static str) -> Self {
        Self::from_bytes(s.as_bytes())
    }

    /// Header over a heap copy of `bytes`.
    #[must_use]
    pub fn copied(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return Self::default();
        }
        let data = heap::alloc_bytes(bytes.len());
        // SAFETY: fresh allocation of bytes.len() bytes.
        unsafe { std::ptr::copy_nonoverlapping(bytes.as_ptr(), data, bytes.len()) };
        Self {
            data,
            len: bytes.len(),
        }
    }

    /// # Safety
    /// `data` must point at `len` readable bytes.
    #[must_use]
    pub unsafe fn as_bytes<'a>(&self) -> &'a [u8] {
        if self.len == 0 {
            return &[];
        }
        std::slice::from_raw_parts(self.data, self.len)
    }
}
