// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Collector-facing pointer encodings.
//!
//! A descriptor tells the (external) collector which words of a value hold
//! pointers, in one of two encodings:
//!
//! - **Mask**: one bit per word of the pointer prefix, LSB first.
//! - **Program**: a run-length program for large, repetitive layouts.
//!
//! Program byte code:
//!
//! ```text
//! 0x00                      end
//! 0x01..=0x7f  n  bits...   n literal bits, packed LSB first in ceil(n/8) bytes
//! 0x80 varint(c) varint(r)  repeat the previous c bits r more times
//! ```
//!
//! Both encodings answer the same query, [`GcData::pointer_words`].

use crate::config::WORD_SIZE;
use crate::types::{Kind, Type};

/// Pointer-location encoding attached to a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GcData {
    /// The type holds no pointers.
    Empty,
    /// Direct bit-per-word mask.
    Mask(&'static [u8]),
    /// Run-length GC program.
    Program(&'static [u8]),
}

impl GcData {
    /// Expand to one flag per word for the first `nwords` words.
    #[must_use]
    pub fn pointer_words(&self, nwords: usize) -> Vec<bool> {
        match self {
            Self::Empty => vec![false; nwords],
            Self::Mask(bits) => (0..nwords)
                .map(|i| bits.get(i / 8).is_some_and(|b| (b >> (i % 8)) & 1 == 1))
                .collect(),
            Self::Program(prog) => {
                let mut bits = run_program(prog);
                bits.resize(nwords, false);
                bits
            }
        }
    }

    /// Whether this is the run-length encoding.
    #[must_use]
    pub fn is_program(&self) -> bool {
        matches!(self, Self::Program(_))
    }
}

// ---------------------------------------------------------------------------
// Bitmap
// ---------------------------------------------------------------------------

/// Bit-per-word pointer mask under construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PtrMask {
    bits: Vec<u8>,
    words: usize,
}

impl PtrMask {
    /// Empty mask covering `words` words.
    #[must_use]
    pub fn with_words(words: usize) -> Self {
        Self {
            bits: vec![0; words.div_ceil(8)],
            words,
        }
    }

    /// Mark `word` as holding a pointer, growing the mask if needed.
    pub fn set(&mut self, word: usize) {
        if word >= self.words {
            self.words = word + 1;
            self.bits.resize(self.words.div_ceil(8), 0);
        }
        self.bits[word / 8] |= 1 << (word % 8);
    }

    #[must_use]
    pub fn get(&self, word: usize) -> bool {
        word < self.words && (self.bits[word / 8] >> (word % 8)) & 1 == 1
    }

    /// Number of words covered.
    #[must_use]
    pub fn words(&self) -> usize {
        self.words
    }

    /// Copy the pointer words of `t` into the mask starting at `word`.
    pub fn append_type(&mut self, t: Type, word: usize) {
        if t.ptrdata() == 0 {
            return;
        }
        match t.kind() {
            Kind::Array => {
                let elem = t.elem();
                let ew = elem.size() / WORD_SIZE;
                for i in 0..t.len() {
                    self.append_type(elem, word + i * ew);
                }
            }
            Kind::Struct => {
                for f in t.fields() {
                    self.append_type(f.typ, word + f.offset / WORD_SIZE);
                }
            }
            _ => {
                for (i, p) in t.pointer_words().into_iter().enumerate() {
                    if p {
                        self.set(word + i);
                    }
                }
            }
        }
    }

    /// Finished mask bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bits
    }
}

// ---------------------------------------------------------------------------
// GC program
// ---------------------------------------------------------------------------

const MAX_LITERAL: usize = 0x7f;
const REPEAT: u8 = 0x80;

/// Incremental GC program writer.
#[derive(Debug, Default)]
pub struct GcProgBuilder {
    out: Vec<u8>,
    lit: Vec<bool>,
    total: usize,
}

impl GcProgBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bits described so far.
    #[must_use]
    pub fn bits(&self) -> usize {
        self.total
    }

    fn push_bit(&mut self, bit: bool) {
        self.lit.push(bit);
        self.total += 1;
        if self.lit.len() == MAX_LITERAL {
            self.flush_literal();
        }
    }

    fn flush_literal(&mut self) {
        if self.lit.is_empty() {
            return;
        }
        self.out.push(self.lit.len() as u8);
        for chunk in self.lit.chunks(8) {
            let mut byte = 0u8;
            for (i, b) in chunk.iter().enumerate() {
                if *b {
                    byte |= 1 << i;
                }
            }
            self.out.push(byte);
        }
        self.lit.clear();
    }

    /// Emit non-pointer bits until `word` bits are described.
    pub fn pad_to(&mut self, word: usize) {
        assert!(word >= self.total, "gc program: cannot move backwards");
        let n = word - self.total;
        if n == 0 {
            return;
        }
        if n <= 64 {
            for _ in 0..n {
                self.push_bit(false);
            }
        } else {
            self.push_bit(false);
            self.repeat(1, n - 1);
        }
    }

    /// Mark `word` as a pointer.
    pub fn ptr(&mut self, word: usize) {
        self.pad_to(word);
        self.push_bit(true);
    }

    /// Repeat the last `nbits` bits `count` more times.
    pub fn repeat(&mut self, nbits: usize, count: usize) {
        if count == 0 || nbits == 0 {
            return;
        }
        assert!(nbits <= self.total, "gc program: repeat past start");
        self.flush_literal();
        self.out.push(REPEAT);
        write_varint(&mut self.out, nbits);
        write_varint(&mut self.out, count);
        self.total += nbits * count;
    }

    /// Describe the pointers of `t` placed at `word`.
    ///
    /// Arrays are emitted as one element plus a repeat, which keeps the
    /// program proportional to the shape rather than to the array length.
    pub fn append_type(&mut self, t: Type, word: usize) {
        if t.ptrdata() == 0 {
            return;
        }
        match t.kind() {
            Kind::Array if t.len() > 1 => {
                let elem = t.elem();
                let ew = elem.size() / WORD_SIZE;
                self.append_type(elem, word);
                self.pad_to(word + ew);
                self.repeat(ew, t.len() - 1);
            }
            Kind::Array => self.append_type(t.elem(), word),
            Kind::Struct => {
                for f in t.fields() {
                    self.append_type(f.typ, word + f.offset / WORD_SIZE);
                }
            }
            _ => {
                for (i, p) in t.pointer_words().into_iter().enumerate() {
                    if p {
                        self.ptr(word + i);
                    }
                }
            }
        }
    }

    /// Terminate and return the program bytes.
    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        self.flush_literal();
        self.out.push(0);
        self.out
    }
}

fn write_varint(out: &mut Vec<u8>, mut v: usize) {
    loop {
        let byte = (v & 0x7f) as u8;
        v >>= 7;
        if v == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

fn read_varint(prog: &[u8], mut i: usize) -> (usize, usize) {
    let mut v = 0usize;
    let mut shift = 0;
    loop {
        let byte = prog[i];
        i += 1;
        v |= ((byte & 0x7f) as usize) << shift;
        if byte & 0x80 == 0 {
            return (v, i);
        }
        shift += 7;
    }
}

/// Execute a GC program, producing one flag per described word.
#[must_use]
pub fn run_program(prog: &[u8]) -> Vec<bool> {
    let mut bits = Vec::new();
    let mut i = 0;
    while i < prog.len() {
        let op = prog[i];
        i += 1;
        if op == 0 {
            break;
        }
        if op & REPEAT == 0 {
            let n = op as usize;
            for j in 0..n {
                bits.push((prog[i + j / 8] >> (j % 8)) & 1 == 1);
            }
            i += n.div_ceil(8);
        } else {
            let (c, next) = read_varint(prog, i);
            let (r, next) = read_varint(prog, next);
            i = next;
            let start = bits.len() - c;
            for _ in 0..r {
                for j in 0..c {
                    bits.push(bits[start + j]);
                }
            }
        }
    }
    bits
}
