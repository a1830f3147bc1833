// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Struct field tags.
//!
//! By convention a tag is a space-separated list of `key:"value"` pairs.
//! Values are double quoted and may use the escapes `\"`, `\\`, `\n`, `\t`,
//! `\r`, `\0` and `\xNN`.

use std::fmt;

/// Tag string attached to a struct field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StructTag(&'static str);

impl StructTag {
    #[must_use]
    pub const fn new(tag: &'static str) -> Self {
        Self(tag)
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }

    /// Value for `key`, or the empty string.
    #[must_use]
    pub fn get(&self, key: &str) -> String {
        self.lookup(key).unwrap_or_default()
    }

    /// Value for `key`; `None` when the key is absent.
    ///
    /// A malformed tag stops the scan; keys before the malformed part are
    /// still found.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<String> {
        let mut tag = self.0;
        loop {
            tag = tag.trim_start_matches(' ');
            if tag.is_empty() {
                return None;
            }

            // Key: run of printable ASCII other than space, quote and colon.
            let name_len = tag
                .bytes()
                .take_while(|&b| b > b' ' && b != b':' && b != b'"' && b != 0x7f)
                .count();
            if name_len == 0 || tag.len() < name_len + 2 {
                return None;
            }
            let rest = &tag[name_len..];
            if !rest.starts_with(":\"") {
                return None;
            }
            let name = &tag[..name_len];

            // Quoted value, honouring backslash escapes.
            let body = &rest[2..];
            let mut end = None;
            let mut escaped = false;
            for (i, b) in body.bytes().enumerate() {
                if escaped {
                    escaped = false;
                } else if b == b'\\' {
                    escaped = true;
                } else if b == b'"' {
                    end = Some(i);
                    break;
                }
            }
            let end = end?;
            let quoted = &body[..end];
            tag = &body[end + 1..];

            if name == key {
                return unquote(quoted);
            }
        }
    }
}

impl fmt::Display for StructTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

fn unquote(s: &str) -> Option<String> {
    if !s.contains('\\') {
        return Some(s.to_owned());
    }
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            'x' => {
                let hi = chars.next()?.to_digit(16)?;
                let lo = chars.next()?.to_digit(16)?;
                out.push(char::from_u32(hi * 16 + lo)?);
            }
            _ => return None,
        }
    }
    Some(out)
}
