// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Hash map over raw keys.
//!
//! Keys and elements are [`Stored`] in the installed heap; reads hand out
//! [`Block`] copies. Lookups hash the key
//! with the key type's hasher and compare with its equality function, so a
//! `map[float64]T` treats `+0` and `-0` as one key and never finds `NaN`.
//!
//! Entries live in a slot vector; iteration walks slots in index order,
//! which is unrelated to insertion order.

use super::{Block, Stored};
use crate::types::alg;
use crate::types::Type;
use parking_lot::RwLock;
use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hasher};

struct Entry {
    hash: u64,
    key: Stored,
    elem: Stored,
}

#[derive(Default)]
struct MapTable {
    buckets: HashMap<u64, Vec<usize>>,
    slots: Vec<Option<Entry>>,
    free: Vec<usize>,
    live: usize,
}

/// Map object referenced by a map value's word.
pub struct MapObject {
    key: Type,
    elem: Type,
    seed: RandomState,
    table: RwLock<MapTable>,
}

impl std::fmt::Debug for MapObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapObject")
            .field("key", &self.key)
            .field("elem", &self.elem)
            .field("len", &self.len())
            .finish()
    }
}

impl MapObject {
    #[must_use]
    pub fn new(key: Type, elem: Type, hint: usize) -> Self {
        Self {
            key,
            elem,
            seed: RandomState::new(),
            table: RwLock::new(MapTable {
                buckets: HashMap::with_capacity(hint),
                slots: Vec::with_capacity(hint),
                free: Vec::new(),
                live: 0,
            }),
        }
    }

    #[must_use]
    pub fn key_type(&self) -> Type {
        self.key
    }

    #[must_use]
    pub fn elem_type(&self) -> Type {
        self.elem
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.table.read().live
    }

    unsafe fn hash(&self, key: *const u8) -> u64 {
        let mut h = self.seed.build_hasher();
        alg::typehash(self.key, key, &mut h);
        h.finish()
    }

    unsafe fn key_eq(&self, a: *const u8, b: *const u8) -> bool {
        self.key
            .rtype()
            .equal
            .is_some_and(|eq| eq(self.key, a, b))
    }

    unsafe fn find(&self, t: &MapTable, hash: u64, key: *const u8) -> Option<usize> {
        t.buckets.get(&hash)?.iter().copied().find(|&slot| {
            t.slots[slot]
                .as_ref()
                .is_some_and(|e| self.key_eq(e.key.as_ptr(), key))
        })
    }

    /// Copy of the element stored under `key`.
    ///
    /// # Safety
    /// `key` must hold a value of the key type.
    pub(crate) unsafe fn get(&self, key: *const u8) -> Option<Block> {
        let hash = self.hash(key);
        let t = self.table.read();
        let slot = self.find(&t, hash, key)?;
        t.slots[slot]
            .as_ref()
            .map(|e| Block::copy_of(self.elem, e.elem.as_ptr()))
    }

    /// Insert or overwrite.
    ///
    /// # Safety
    /// `key` and `elem` must hold values of the key and element types.
    pub(crate) unsafe fn insert(&self, key: *const u8, elem: *const u8) {
        let hash = self.hash(key);
        let mut t = self.table.write();
        if let Some(slot) = self.find(&t, hash, key) {
            if let Some(e) = t.slots[slot].as_ref() {
                e.elem.overwrite(self.elem, elem);
            }
            return;
        }
        let entry = Entry {
            hash,
            key: Stored::copy_of(self.key, key),
            elem: Stored::copy_of(self.elem, elem),
        };
        let slot = match t.free.pop() {
            Some(slot) => {
                t.slots[slot] = Some(entry);
                slot
            }
            None => {
                t.slots.push(Some(entry));
                t.slots.len() - 1
            }
        };
        t.buckets.entry(hash).or_default().push(slot);
        t.live += 1;
    }

    /// Remove `key`; returns whether it was present.
    ///
    /// # Safety
    /// `key` must hold a value of the key type.
    pub(crate) unsafe fn remove(&self, key: *const u8) -> bool {
        let hash = self.hash(key);
        let mut t = self.table.write();
        let Some(slot) = self.find(&t, hash, key) else {
            return false;
        };
        if let Some(e) = t.slots[slot].take() {
            if let Some(bucket) = t.buckets.get_mut(&e.hash) {
                bucket.retain(|s| *s != slot);
                if bucket.is_empty() {
                    t.buckets.remove(&e.hash);
                }
            }
        }
        t.free.push(slot);
        t.live -= 1;
        true
    }

    pub fn clear(&self) {
        let mut t = self.table.write();
        *t = MapTable::default();
    }

    /// Number of slots, occupied or not; an upper bound for [`Self::entry_at`].
    pub(crate) fn slot_count(&self) -> usize {
        self.table.read().slots.len()
    }

    /// Copies of the key and element in `slot`, if occupied.
    pub(crate) fn entry_at(&self, slot: usize) -> Option<(Block, Block)> {
        let t = self.table.read();
        let e = t.slots.get(slot)?.as_ref()?;
        // SAFETY: blocks hold values of the key and element types.
        unsafe {
            Some((
                Block::copy_of(self.key, e.key.as_ptr()),
                Block::copy_of(self.elem, e.elem.as_ptr()),
            ))
        }
    }
}
