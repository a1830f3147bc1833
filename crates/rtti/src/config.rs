// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! rtti Global Configuration
//!
//! Layout constants and runtime tunables live here and nowhere else.
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: Compile-time constants (word size, alignment ceiling,
//!   pointer-mask budget, call frame limits)
//! - **Level 2 (Dynamic)**: [`RuntimeConfig`] behind an `ArcSwap`, read lock-free
//!   on every synthesis and replaced atomically
//!
//! # Example
//!
//! ```
//! use rtti::config::{self, RuntimeConfig};
//!
//! let mut cfg = (*config::runtime()).clone();
//! cfg.log_cache_hits = true;
//! config::set_runtime(cfg);
//! assert!(config::runtime().log_cache_hits);
//! ```

use arc_swap::ArcSwap;
use std::sync::{Arc, OnceLock};

// =======================================================================
// Memory layout
// =======================================================================

/// Size in bytes of a machine word (pointer, `int`, `uint`, `uintptr`).
pub const WORD_SIZE: usize = std::mem::size_of::<usize>();

/// Largest alignment any descriptor may carry.
///
/// Complex128 and the 64-bit integers need 8 even on 32-bit targets; all
/// internal storage blocks are `u64` backed so this is always honoured.
pub const MAX_ALIGN: usize = 8;

/// Default pointer-mask budget, in bytes of mask.
///
/// A synthesized type whose pointer-bearing prefix needs more than
/// `PTR_MASK_MAX_BYTES * 8` words of mask is described by a run-length
/// GC program instead of a direct bitmap.
pub const PTR_MASK_MAX_BYTES: usize = 2048;

/// Maximum number of parameters (or results) a synthesized function may have.
pub const MAX_FUNC_PARAMS: usize = 128;

/// Maximum byte size of a synthesized array or struct.
pub const MAX_TYPE_SIZE: usize = isize::MAX as usize;

// =======================================================================
// Runtime configuration
// =======================================================================

/// Runtime tunables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Pointer-mask budget used when choosing between bitmap and GC program.
    pub ptr_mask_max_bytes: usize,
    /// Emit `trace!` records on synthesis-cache hits.
    pub log_cache_hits: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            ptr_mask_max_bytes: PTR_MASK_MAX_BYTES,
            log_cache_hits: cfg!(feature = "trace"),
        }
    }
}

impl RuntimeConfig {
    /// Largest pointer prefix, in words, that still gets a direct bitmap.
    #[must_use]
    pub fn max_mask_words(&self) -> usize {
        self.ptr_mask_max_bytes.saturating_mul(8)
    }
}

fn cell() -> &'static ArcSwap<RuntimeConfig> {
    static RUNTIME: OnceLock<ArcSwap<RuntimeConfig>> = OnceLock::new();
    RUNTIME.get_or_init(|| ArcSwap::from_pointee(RuntimeConfig::default()))
}

/// Current runtime configuration snapshot.
#[must_use]
pub fn runtime() -> Arc<RuntimeConfig> {
    cell().load_full()
}

/// Atomically replace the runtime configuration.
///
/// Descriptors already published keep whichever GC encoding they were built
/// with; both encodings answer the same pointer queries.
pub fn set_runtime(cfg: RuntimeConfig) {
    log::debug!(
        "[config] runtime updated: ptr_mask_max_bytes={} log_cache_hits={}",
        cfg.ptr_mask_max_bytes,
        cfg.log_cache_hits
    );
    cell().store(Arc::new(cfg));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_constants() {
        assert!(WORD_SIZE == 4 || WORD_SIZE == 8);
        assert!(MAX_ALIGN >= WORD_SIZE);
    }

    #[test]
    fn test_default_mask_budget() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.ptr_mask_max_bytes, PTR_MASK_MAX_BYTES);
        assert_eq!(cfg.max_mask_words(), PTR_MASK_MAX_BYTES * 8);
    }
}
