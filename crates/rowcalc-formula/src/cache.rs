//! Compiled-formula cache
//!
//! Formulas are keyed by their exact text. Least recently used entries are
//! evicted once the cache is full; compile failures are never stored.

use crate::error::FormulaResult;
use crate::evaluator::CompiledFormula;
use crate::lexer::tokenize;
use crate::options::{EngineOptions, DEFAULT_CACHE_CAPACITY};
use crate::parser::compile;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Cumulative cache counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

#[derive(Debug)]
struct Inner {
    formulas: LruCache<String, Arc<CompiledFormula>>,
    stats: CacheStats,
}

/// Thread-safe LRU cache of compiled formulas
#[derive(Debug)]
pub struct FormulaCache {
    inner: Mutex<Inner>,
}

impl FormulaCache {
    /// Create a cache holding at most `capacity` formulas (at least one)
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(Inner {
                formulas: LruCache::new(cap),
                stats: CacheStats::default(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the compiled form of `formula`, compiling it on a miss.
    ///
    /// Compilation runs outside the lock. When two threads miss on the same
    /// text, the first insert wins and both get an equivalent unit.
    pub fn get_or_compile(
        &self,
        formula: &str,
        options: &EngineOptions,
    ) -> FormulaResult<Arc<CompiledFormula>> {
        {
            let mut inner = self.lock();
            if let Some(compiled) = inner.formulas.get(formula).cloned() {
                inner.stats.hits += 1;
                return Ok(compiled);
            }
            inner.stats.misses += 1;
        }

        let tokens = tokenize(formula)?;
        let compiled = Arc::new(compile(&tokens, options)?);

        let mut inner = self.lock();
        if let Some(existing) = inner.formulas.get(formula).cloned() {
            return Ok(existing);
        }
        if let Some((evicted, _)) = inner.formulas.push(formula.to_string(), compiled.clone()) {
            inner.stats.evictions += 1;
            log::debug!("evicted compiled formula {:?}", evicted);
        }
        Ok(compiled)
    }

    /// Check whether `formula` is cached, without touching recency
    pub fn contains(&self, formula: &str) -> bool {
        self.lock().formulas.contains(formula)
    }

    /// Number of cached formulas
    pub fn len(&self) -> usize {
        self.lock().formulas.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of cached formulas
    pub fn capacity(&self) -> usize {
        self.lock().formulas.cap().get()
    }

    /// Drop every cached formula; counters are kept
    pub fn clear(&self) {
        self.lock().formulas.clear();
    }

    /// Snapshot of the hit, miss and eviction counters
    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }
}

impl Default for FormulaCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}
