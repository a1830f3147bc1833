// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Complex number storage types (`complex64`, `complex128`).

/// Two `f32` parts, laid out as `[re, im]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C)]
pub struct Complex64 {
    pub re: f32,
    pub im: f32,
}

/// Two `f64` parts, laid out as `[re, im]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C)]
pub struct Complex128 {
    pub re: f64,
    pub im: f64,
}

impl Complex64 {
    #[must_use]
    pub const fn new(re: f32, im: f32) -> Self {
        Self { re, im }
    }
}

impl Complex128 {
    #[must_use]
    pub const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }
}

impl From<Complex64> for Complex128 {
    fn from(c: Complex64) -> Self {
        Self::new(f64::from(c.re), f64::from(c.im))
    }
}

impl From<Complex128> for Complex64 {
    fn from(c: Complex128) -> Self {
        Self::new(c.re as f32, c.im as f32)
    }
}
