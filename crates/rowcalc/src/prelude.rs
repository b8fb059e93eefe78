//! Prelude module - common imports for rowcalc users
//!
//! ```rust
//! use rowcalc::prelude::*;
//! ```

pub use crate::{
    // Batch evaluation
    evaluate_rows,
    BatchStats,
    // Engine
    EngineOptions,
    FormulaEngine,
    FormulaError,
    FormulaResult,
    // Values
    Grouping,
    OutputKind,
    Row,
    Value,
};
