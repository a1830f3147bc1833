// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

/// In-memory form of a slice: backing array, length and capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct SliceHeader {
    pub data: *mut u8,
    pub len: usize,
    pub cap: usize,
}

impl Default for SliceHeader {
    fn default() -> Self {
        Self {
            data: std::ptr::null_mut(),
            len: 0,
            cap: 0,
        }
    }
}

impl SliceHeader {
    /// Whether this is the nil slice.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.data.is_null()
    }
}
