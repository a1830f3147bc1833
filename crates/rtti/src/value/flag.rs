// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Value flag word.
//!
//! ```text
//!  bits 0..5   kind
//!  bit  5      STICKY_RO  reached through an unexported, non-embedded field
//!  bit  6      EMBED_RO   reached through an unexported embedded field
//!  bit  7      INDIR      pointer refers to the value's storage
//!  bit  8      ADDR       storage is addressable (implies INDIR)
//!  bit  9      METHOD     bound method; index in bits 10..
//! ```

use crate::types::Kind;
use std::fmt;

/// Packed kind, provenance and method index of a [`Value`](super::Value).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Flag(usize);

impl Flag {
    const KIND_MASK: usize = (1 << 5) - 1;
    pub(crate) const STICKY_RO: Self = Self(1 << 5);
    pub(crate) const EMBED_RO: Self = Self(1 << 6);
    pub(crate) const INDIR: Self = Self(1 << 7);
    pub(crate) const ADDR: Self = Self(1 << 8);
    pub(crate) const METHOD: Self = Self(1 << 9);
    const METHOD_SHIFT: usize = 10;
    pub(crate) const RO: Self = Self(Self::STICKY_RO.0 | Self::EMBED_RO.0);

    #[inline]
    pub(crate) const fn from_kind(k: Kind) -> Self {
        Self(k as usize)
    }

    #[inline]
    #[must_use]
    pub const fn kind(self) -> Kind {
        Kind::from_u8((self.0 & Self::KIND_MASK) as u8)
    }

    #[inline]
    pub(crate) const fn has(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub(crate) const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline]
    pub(crate) const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    #[inline]
    pub(crate) const fn only(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Same flags with a different kind.
    #[inline]
    pub(crate) const fn with_kind(self, k: Kind) -> Self {
        Self((self.0 & !Self::KIND_MASK) | k as usize)
    }

    /// Read-only provenance collapsed to `STICKY_RO`, the form a value keeps
    /// once it leaves the struct it was read from.
    #[inline]
    pub(crate) const fn ro(self) -> Self {
        if self.has(Self::RO) {
            Self::STICKY_RO
        } else {
            Self(0)
        }
    }

    #[inline]
    pub(crate) const fn method_index(self) -> usize {
        self.0 >> Self::METHOD_SHIFT
    }

    /// Bound-method flag for method `i` of a receiver with flags `self`.
    #[inline]
    pub(crate) const fn bind_method(self, i: usize) -> Self {
        let keep = self.0 & (Self::RO.0 | Self::INDIR.0);
        Self(keep | (i << Self::METHOD_SHIFT) | Self::METHOD.0 | Kind::Func as usize)
    }

    /// Receiver flags recovered from a bound-method flag with receiver kind `k`.
    #[inline]
    pub(crate) const fn receiver(self, k: Kind) -> Self {
        Self((self.0 & (Self::RO.0 | Self::INDIR.0)) | k as usize)
    }

    #[inline]
    #[must_use]
    pub const fn is_addressable(self) -> bool {
        self.has(Self::ADDR)
    }

    #[inline]
    #[must_use]
    pub const fn is_read_only(self) -> bool {
        self.has(Self::RO)
    }

    #[inline]
    #[must_use]
    pub const fn is_indirect(self) -> bool {
        self.has(Self::INDIR)
    }

    #[inline]
    #[must_use]
    pub const fn is_method(self) -> bool {
        self.has(Self::METHOD)
    }
}

impl fmt::Debug for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Flag({}", self.kind())?;
        for (bit, name) in [
            (Self::STICKY_RO, "sticky_ro"),
            (Self::EMBED_RO, "embed_ro"),
            (Self::INDIR, "indir"),
            (Self::ADDR, "addr"),
        ] {
            if self.has(bit) {
                write!(f, "|{}", name)?;
            }
        }
        if self.is_method() {
            write!(f, "|method#{}", self.method_index())?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_survives_bits() {
        let f = Flag::from_kind(Kind::Struct)
            .with(Flag::ADDR)
            .with(Flag::INDIR)
            .with(Flag::EMBED_RO);
        assert_eq!(f.kind(), Kind::Struct);
        assert!(f.is_addressable() && f.is_read_only());
        assert_eq!(f.with_kind(Kind::Int8).kind(), Kind::Int8);
        assert!(f.with_kind(Kind::Int8).is_addressable());
    }

    #[test]
    fn test_ro_collapses_to_sticky() {
        let f = Flag::from_kind(Kind::Int).with(Flag::EMBED_RO);
        assert_eq!(f.ro(), Flag::STICKY_RO);
        assert_eq!(Flag::from_kind(Kind::Int).ro(), Flag::default());
    }

    #[test]
    fn test_method_binding_roundtrip() {
        let recv = Flag::from_kind(Kind::Struct)
            .with(Flag::INDIR)
            .with(Flag::ADDR);
        let m = recv.bind_method(37);
        assert_eq!(m.kind(), Kind::Func);
        assert!(m.is_method());
        assert!(!m.is_addressable());
        assert_eq!(m.method_index(), 37);
        assert_eq!(m.receiver(Kind::Struct), Flag::from_kind(Kind::Struct).with(Flag::INDIR));
    }
}
