// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Concurrent cache of compiled encode and decode handlers.
//!
//! Handlers are compiled on first use and shared behind `Arc`s. Lookups go
//! through sharded `DashMap`s, so concurrent encode/decode calls on a
//! registry contend only when they hit the same shard on a miss. The shard
//! guard is dropped before a handler runs; a handler may therefore look up
//! other handlers (nested struct fields) without deadlocking.

use super::decode::DecodePlan;
use super::encode::{EncodeMode, EncodePlan};
use crate::error::SchemaResult;
use crate::schema::TypeName;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;

/// Cache hit/miss statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HandlerStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries dropped because a registration touched their type.
    pub invalidations: u64,
    /// Compile time of the most recent miss.
    pub last_compile_ns: u64,
}

pub(crate) struct HandlerCache {
    encoders: DashMap<(TypeName, EncodeMode), Arc<EncodePlan>>,
    decoders: DashMap<TypeName, Arc<DecodePlan>>,
    stats: RwLock<HandlerStats>,
}

impl HandlerCache {
    pub(crate) fn new() -> Self {
        Self {
            encoders: DashMap::new(),
            decoders: DashMap::new(),
            stats: RwLock::new(HandlerStats::default()),
        }
    }

    pub(crate) fn encoder_or_try_build<F>(
        &self,
        name: &TypeName,
        mode: EncodeMode,
        build: F,
    ) -> SchemaResult<Arc<EncodePlan>>
    where
        F: FnOnce() -> SchemaResult<EncodePlan>,
    {
        let key = (name.clone(), mode);
        if let Some(hit) = self.encoders.get(&key).map(|entry| Arc::clone(entry.value())) {
            self.record_hit();
            return Ok(hit);
        }

        let start = Instant::now();
        let built = Arc::new(build()?);
        self.encoders.insert(key, Arc::clone(&built));
        self.record_miss(start);
        Ok(built)
    }

    pub(crate) fn decoder_or_try_build<F>(
        &self,
        name: &TypeName,
        build: F,
    ) -> SchemaResult<Arc<DecodePlan>>
    where
        F: FnOnce() -> SchemaResult<DecodePlan>,
    {
        if let Some(hit) = self.decoders.get(name).map(|entry| Arc::clone(entry.value())) {
            self.record_hit();
            return Ok(hit);
        }

        let start = Instant::now();
        let built = Arc::new(build()?);
        self.decoders.insert(name.clone(), Arc::clone(&built));
        self.record_miss(start);
        Ok(built)
    }

    /// Drop every handler compiled for one of `names`.
    pub(crate) fn invalidate(&self, names: &[TypeName]) {
        let mut dropped = 0u64;
        for name in names {
            for mode in EncodeMode::ALL {
                if self.encoders.remove(&(name.clone(), mode)).is_some() {
                    dropped += 1;
                }
            }
            if self.decoders.remove(name).is_some() {
                dropped += 1;
            }
        }
        if dropped > 0 {
            log::debug!(
                "[cache] invalidated {} handlers across {} types",
                dropped,
                names.len()
            );
            let mut stats = self.stats.write();
            stats.invalidations = stats.invalidations.saturating_add(dropped);
        }
    }

    pub(crate) fn clear(&self) {
        self.encoders.clear();
        self.decoders.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.encoders.len() + self.decoders.len()
    }

    pub(crate) fn stats(&self) -> HandlerStats {
        *self.stats.read()
    }

    fn record_hit(&self) {
        let mut stats = self.stats.write();
        stats.hits = stats.hits.saturating_add(1);
    }

    fn record_miss(&self, start: Instant) {
        let mut stats = self.stats.write();
        stats.misses = stats.misses.saturating_add(1);
        stats.last_compile_ns = start.elapsed().as_nanos() as u64;
    }
}
