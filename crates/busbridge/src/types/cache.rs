// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Concurrent LRU cache of parsed type descriptors.
//!
//! Descriptors discovered repeatedly (the same signature on many members, or
//! signals only ever seen on the wire) share one `Arc<TypeDescriptor>` tree.
//! A hit refreshes the entry's recency, so lookups take the write lock; parsing
//! on a miss happens outside it.

use super::{parse_signature, TypeDescriptor};
use crate::error::Result;
use lru::LruCache;
use parking_lot::RwLock;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Cache hit/miss statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LookupStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// LRU-based concurrent cache keyed by single-type signature strings.
pub struct TypeCache {
    inner: RwLock<LruCache<String, Arc<TypeDescriptor>>>,
    stats: RwLock<LookupStats>,
}

impl TypeCache {
    /// Create a cache holding at most `capacity` trees (minimum one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: RwLock::new(LruCache::new(capacity)),
            stats: RwLock::new(LookupStats::default()),
        }
    }

    /// Shared descriptor for a signature holding exactly one complete type.
    pub fn intern(&self, signature: &str) -> Result<Arc<TypeDescriptor>> {
        if let Some(hit) = self.lookup(signature) {
            return Ok(hit);
        }
        let ty = TypeDescriptor::parse_single(signature)?;
        Ok(self.insert(signature.to_string(), ty))
    }

    /// Shared descriptors for every complete type of a signature, in order.
    pub fn intern_all(&self, signature: &str) -> Result<Vec<Arc<TypeDescriptor>>> {
        let types = parse_signature(signature)?;
        Ok(types
            .into_iter()
            .map(|ty| {
                let key = ty.signature();
                match self.lookup(&key) {
                    Some(hit) => hit,
                    None => self.insert(key, ty),
                }
            })
            .collect())
    }

    /// Cached tree for `key`, marked most recently used.
    fn lookup(&self, key: &str) -> Option<Arc<TypeDescriptor>> {
        let hit = self.inner.write().get(key).map(Arc::clone)?;
        self.stats.write().hits += 1;
        Some(hit)
    }

    fn insert(&self, key: String, ty: TypeDescriptor) -> Arc<TypeDescriptor> {
        let mut cache = self.inner.write();
        // Another thread may have won the race between the two locks.
        if let Some(hit) = cache.get(&key) {
            self.stats.write().hits += 1;
            return Arc::clone(hit);
        }
        let ty = Arc::new(ty);
        let evicted = cache.push(key.clone(), Arc::clone(&ty));
        let mut stats = self.stats.write();
        stats.misses += 1;
        if let Some((old, _)) = evicted.filter(|(old, _)| *old != key) {
            log::debug!("[types] cache full, evicted '{}'", old);
            stats.evictions += 1;
        }
        ty
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }

    #[must_use]
    pub fn stats(&self) -> LookupStats {
        *self.stats.read()
    }
}

impl Default for TypeCache {
    fn default() -> Self {
        Self::new(256)
    }
}
