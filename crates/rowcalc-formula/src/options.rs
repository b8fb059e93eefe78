//! Engine configuration

use rowcalc_core::DEFAULT_MEMO_CAPACITY;

/// Default number of compiled formulas kept by the cache
pub const DEFAULT_CACHE_CAPACITY: usize = 4096;

/// Default decimals kept by numeric output rounding
pub const DEFAULT_PRECISION: i32 = 4;

/// Options for a [`FormulaEngine`](crate::FormulaEngine)
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    /// Maximum compiled formulas kept, least recently used evicted first (default: 4096)
    pub cache_capacity: usize,
    /// Entries at which a normalizer memo table is cleared (default: 10 000)
    pub memo_capacity: usize,
    /// Decimals kept when rounding numeric results (default: 4)
    pub precision: i32,
    /// Reject unknown function names at compile time instead of compiling them to `0`
    pub strict_functions: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            memo_capacity: DEFAULT_MEMO_CAPACITY,
            precision: DEFAULT_PRECISION,
            strict_functions: false,
        }
    }
}

impl EngineOptions {
    /// Create options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the compiled-formula cache capacity
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Set the normalizer memo capacity
    pub fn with_memo_capacity(mut self, capacity: usize) -> Self {
        self.memo_capacity = capacity;
        self
    }

    /// Set the number of decimals kept by numeric rounding
    pub fn with_precision(mut self, precision: i32) -> Self {
        self.precision = precision;
        self
    }

    /// Enable or disable strict function names
    pub fn with_strict_functions(mut self, strict: bool) -> Self {
        self.strict_functions = strict;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = EngineOptions::default();
        assert_eq!(options.cache_capacity, 4096);
        assert_eq!(options.memo_capacity, 10_000);
        assert_eq!(options.precision, 4);
        assert!(!options.strict_functions);
    }

    #[test]
    fn test_builders() {
        let options = EngineOptions::new()
            .with_cache_capacity(8)
            .with_memo_capacity(16)
            .with_precision(2)
            .with_strict_functions(true);
        assert_eq!(options.cache_capacity, 8);
        assert_eq!(options.memo_capacity, 16);
        assert_eq!(options.precision, 2);
        assert!(options.strict_functions);
    }
}
