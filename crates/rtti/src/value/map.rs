// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Map operators.
//!
//! Lookups return copies: elements of a map are never addressable.
//! Iteration order is unspecified. Modifying the map while a [`MapIter`] is
//! live is allowed; entries added or removed meanwhile may or may not be
//! visited.

use super::{Flag, Value};
use crate::error::{raise, Error, OrRaise, Result};
use crate::heap;
use crate::objects::{Block, MapObject};
use crate::types::{Kind, Type};

impl Value {
    pub(crate) fn map_object(&self) -> Option<&'static MapObject> {
        let p = self.word();
        // SAFETY: a non-nil map word points at a retained MapObject.
        (!p.is_null()).then(|| unsafe { &*p.cast::<MapObject>() })
    }

    /// Element stored under `key`; `None` when absent (or the map is nil).
    #[track_caller]
    #[must_use]
    pub fn map_index(&self, key: Value) -> Option<Value> {
        self.try_map_index(key).or_raise()
    }

    pub fn try_map_index(&self, key: Value) -> Result<Option<Value>> {
        let t = self.must_be(Kind::Map, "Value::map_index")?;
        let key = key.try_assign_to("Value::map_index", t.key())?;
        let Some(m) = self.map_object() else {
            return Ok(None);
        };
        // SAFETY: key holds a value of the key type.
        let Some(elem) = (unsafe { m.get(key.data()) }) else {
            return Ok(None);
        };
        let ro = self.flag.with(key.flag).ro();
        // SAFETY: the block holds a value of the element type.
        Ok(Some(unsafe { Value::copy_from(t.elem(), elem.as_ptr(), ro) }))
    }

    /// Store `elem` under `key`; an invalid `elem` deletes the key.
    #[track_caller]
    pub fn set_map_index(&self, key: Value, elem: Value) {
        self.try_set_map_index(key, elem).or_raise();
    }

    pub fn try_set_map_index(&self, key: Value, elem: Value) -> Result<()> {
        let t = self.must_be(Kind::Map, "Value::set_map_index")?;
        self.must_be_exported("Value::set_map_index")?;
        key.must_be_exported("Value::set_map_index")?;
        let key = key.try_assign_to("Value::set_map_index", t.key())?;

        if !elem.is_valid() {
            if let Some(m) = self.map_object() {
                // SAFETY: key holds a value of the key type.
                unsafe { m.remove(key.data()) };
            }
            return Ok(());
        }
        elem.must_be_exported("Value::set_map_index")?;
        let elem = elem.try_assign_to("Value::set_map_index", t.elem())?;
        let Some(m) = self.map_object() else {
            return Err(Error::NilMap);
        };
        // SAFETY: both hold values of the map's key and element types.
        unsafe { m.insert(key.data(), elem.data()) };
        Ok(())
    }

    /// Copies of every key, in unspecified order.
    #[track_caller]
    #[must_use]
    pub fn map_keys(&self) -> Vec<Value> {
        let t = self.must_be(Kind::Map, "Value::map_keys").or_raise();
        let Some(m) = self.map_object() else {
            return Vec::new();
        };
        let ro = self.flag.ro();
        (0..m.slot_count())
            .filter_map(|slot| m.entry_at(slot))
            // SAFETY: key blocks hold values of the key type.
            .map(|(k, _)| unsafe { Value::copy_from(t.key(), k.as_ptr(), ro) })
            .collect()
    }

    /// Cursor over the map's entries.
    #[track_caller]
    #[must_use]
    pub fn map_range(&self) -> MapIter {
        let t = self.must_be(Kind::Map, "Value::map_range").or_raise();
        MapIter {
            typ: t,
            map: self.map_object(),
            ro: self.flag.ro(),
            slot: 0,
            current: None,
        }
    }

    /// Remove every entry of a map, or zero every element of a slice.
    #[track_caller]
    pub fn clear(&self) {
        match self.kind() {
            Kind::Map => {
                if let Some(m) = self.map_object() {
                    m.clear();
                }
            }
            Kind::Slice => {
                let t = self.typ();
                let h = self.slice_header();
                // SAFETY: the backing array holds len elements.
                unsafe { heap::typed_zero_n(t.elem(), h.data, h.len) };
            }
            k => raise(Error::KindMismatch {
                method: "Value::clear",
                kind: k,
            }),
        }
    }
}

/// Map iteration cursor.
///
/// ```
/// use rtti::types::{basic, Kind};
/// use rtti::synth::map_of;
/// use rtti::value::make_map;
///
/// let m = make_map(map_of(basic(Kind::String), basic(Kind::Int)));
/// let mut it = m.map_range();
/// assert!(!it.advance());
/// ```
pub struct MapIter {
    typ: Type,
    map: Option<&'static MapObject>,
    ro: Flag,
    slot: usize,
    current: Option<(Block, Block)>,
}

impl MapIter {
    /// Move to the next entry; `false` once the map is exhausted.
    pub fn advance(&mut self) -> bool {
        let Some(m) = self.map else {
            return false;
        };
        while self.slot < m.slot_count() {
            let slot = self.slot;
            self.slot += 1;
            if let Some(entry) = m.entry_at(slot) {
                self.current = Some(entry);
                return true;
            }
        }
        self.current = None;
        false
    }

    fn entry(&self, method: &'static str) -> &(Block, Block) {
        match &self.current {
            Some(e) => e,
            None => raise(Error::UsageOnZeroValue { method }),
        }
    }

    /// Key of the current entry. Raises before the first `advance` or after
    /// exhaustion.
    #[track_caller]
    #[must_use]
    pub fn key(&self) -> Value {
        let (k, _) = self.entry("MapIter::key");
        // SAFETY: key blocks hold values of the key type.
        unsafe { Value::copy_from(self.typ.key(), k.as_ptr(), self.ro) }
    }

    #[track_caller]
    #[must_use]
    pub fn value(&self) -> Value {
        let (_, e) = self.entry("MapIter::value");
        // SAFETY: element blocks hold values of the element type.
        unsafe { Value::copy_from(self.typ.elem(), e.as_ptr(), self.ro) }
    }

    /// Restart over `m`, which must have the same map type.
    #[track_caller]
    pub fn reset(&mut self, m: Value) {
        let t = m.must_be(Kind::Map, "MapIter::reset").or_raise();
        if t != self.typ {
            raise(Error::NotAssignable {
                context: "MapIter::reset",
                from: t.string().to_owned(),
                to: self.typ.string().to_owned(),
            });
        }
        self.map = m.map_object();
        self.ro = m.flag.ro();
        self.slot = 0;
        self.current = None;
    }
}

impl Iterator for MapIter {
    type Item = (Value, Value);

    fn next(&mut self) -> Option<Self::Item> {
        self.advance().then(|| (self.key(), self.value()))
    }
}
