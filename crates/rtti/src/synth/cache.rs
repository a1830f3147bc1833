// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Synthesis caches.
//!
//! Two concurrent maps with insert-or-get semantics:
//!
//! - `composite`: one descriptor per exact key (`*T`, `[]T`, `[N]T`,
//!   `map[K]V`, `chan T`).
//! - `shapes`: struct, function and interface descriptors bucketed by an MD5
//!   digest of their shape, with a linear structural comparison inside the
//!   bucket.
//!
//! A lookup that misses both the cache and the descriptor table builds a new
//! record and then races to insert it; the loser drops its record and returns
//! the winner's. Building has no side effect visible to other callers, so
//! losing the race is harmless.

use crate::config::runtime;
use crate::error::Result;
use crate::types::{table, ChanDir, Type};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use md5::{Digest, Md5};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

/// Exact cache key for the simple composite kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum CacheKey {
    Pointer(Type),
    Slice(Type),
    Array(Type, usize),
    Map(Type, Type),
    Chan(ChanDir, Type),
}

/// MD5 digest of a shape description.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeHash([u8; 16]);

impl ShapeHash {
    /// Digest of an encoded shape.
    #[must_use]
    pub fn compute(encoded: &[u8]) -> Self {
        let mut hasher = Md5::new();
        hasher.update(encoded);
        let result = hasher.finalize();

        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&result[..16]);
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Debug for ShapeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShapeHash({})", self)
    }
}

impl fmt::Display for ShapeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Incremental shape encoder feeding [`ShapeHash::compute`].
#[derive(Debug, Default)]
pub(crate) struct ShapeEncoder(Vec<u8>);

impl ShapeEncoder {
    pub fn new(tag: &str) -> Self {
        let mut e = Self(Vec::with_capacity(64));
        e.str(tag);
        e
    }

    pub fn str(&mut self, s: &str) -> &mut Self {
        self.0.extend_from_slice(&(s.len() as u64).to_le_bytes());
        self.0.extend_from_slice(s.as_bytes());
        self
    }

    pub fn typ(&mut self, t: Type) -> &mut Self {
        self.0.extend_from_slice(&(t.addr() as u64).to_le_bytes());
        self
    }

    pub fn flag(&mut self, b: bool) -> &mut Self {
        self.0.push(u8::from(b));
        self
    }

    pub fn finish(&self) -> ShapeHash {
        ShapeHash::compute(&self.0)
    }
}

/// Cache counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Requests answered by a compiled-in descriptor.
    pub table_hits: u64,
    /// Published entries across both maps.
    pub entries: usize,
}

#[derive(Default)]
struct SynthCache {
    composite: DashMap<CacheKey, Type>,
    shapes: DashMap<ShapeHash, Vec<Type>>,
    hits: AtomicU64,
    misses: AtomicU64,
    table_hits: AtomicU64,
}

fn cache() -> &'static SynthCache {
    static CACHE: OnceLock<SynthCache> = OnceLock::new();
    CACHE.get_or_init(SynthCache::default)
}

/// Snapshot of the synthesis cache counters.
#[must_use]
pub fn cache_stats() -> CacheStats {
    let c = cache();
    CacheStats {
        hits: c.hits.load(Ordering::Relaxed),
        misses: c.misses.load(Ordering::Relaxed),
        table_hits: c.table_hits.load(Ordering::Relaxed),
        entries: c.composite.len() + c.shapes.iter().map(|b| b.len()).sum::<usize>(),
    }
}

fn hit(t: Type) -> Type {
    cache().hits.fetch_add(1, Ordering::Relaxed);
    if runtime().log_cache_hits {
        log::trace!("[synth] cache hit {}", t);
    }
    t
}

/// Search the descriptor table for an unnamed type with this string and shape.
fn table_match(s: &str, matches: &impl Fn(Type) -> bool) -> Option<Type> {
    let found = table::lookup_by_string(s)
        .into_iter()
        .find(|t| !t.is_named() && matches(*t))?;
    cache().table_hits.fetch_add(1, Ordering::Relaxed);
    log::debug!("[synth] using compiled-in descriptor {}", found);
    Some(found)
}

/// Canonical descriptor for an exact composite key.
pub(crate) fn canonical(
    key: CacheKey,
    string: impl FnOnce() -> String,
    matches: impl Fn(Type) -> bool,
    build: impl FnOnce(String) -> Result<Type>,
) -> Result<Type> {
    let c = cache();
    if let Some(t) = c.composite.get(&key) {
        return Ok(hit(*t));
    }
    c.misses.fetch_add(1, Ordering::Relaxed);

    let s = string();
    let t = match table_match(&s, &matches) {
        Some(t) => t,
        None => build(s)?,
    };

    Ok(match c.composite.entry(key) {
        Entry::Occupied(e) => *e.get(),
        Entry::Vacant(e) => {
            log::debug!("[synth] published {}", t);
            *e.insert(t)
        }
    })
}

/// Canonical descriptor for a hashed shape.
///
/// `build` must return a fully initialised descriptor: anything it attaches
/// (method tables of promoting structs) happens before publication.
pub(crate) fn canonical_shape(
    hash: ShapeHash,
    string: impl FnOnce() -> String,
    matches: impl Fn(Type) -> bool,
    build: impl FnOnce(String) -> Result<Type>,
) -> Result<Type> {
    let c = cache();
    if let Some(bucket) = c.shapes.get(&hash) {
        if let Some(t) = bucket.iter().copied().find(|t| matches(*t)) {
            return Ok(hit(t));
        }
    }
    c.misses.fetch_add(1, Ordering::Relaxed);

    let s = string();
    let t = match table_match(&s, &matches) {
        Some(t) => t,
        None => build(s)?,
    };

    let mut bucket = c.shapes.entry(hash).or_default();
    if let Some(winner) = bucket.iter().copied().find(|w| matches(*w)) {
        return Ok(winner);
    }
    log::debug!("[synth] published {} (shape {})", t, hash);
    bucket.push(t);
    Ok(t)
}
