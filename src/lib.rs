//! Typed genetic programming for evolutionary model discovery.
//!
//! Programs are typed expression trees grown from a [`PrimitiveCatalog`]
//! supplied by the caller and scored by a caller-supplied [`Objective`].
//! [`EvolutionEngine`] runs the generational loop and returns the final
//! population, a per-generation [`RunLog`] and a [`FactorScoreTable`] with
//! one row per objective call.

pub mod config;
pub mod engines;
pub mod error;
pub mod functions;
pub mod types;

pub use config::{AppConfig, ConfigManager, DepthRange, EvaluationConfig, EvaluationErrorPolicy, EvolutionConfig};
pub use engines::evaluation::{Evaluation, EvaluationScheduler, FactorRecord, Objective};
pub use engines::generation::{
    EvolutionEngine, EvolutionOutcome, ExpressionNode, FactorScoreRow, FactorScoreTable,
    GenerationRecord, HallOfFame, Individual, OptimizationDirection, RunLog,
};
pub use error::{EmdError, Result};
pub use functions::{PrimitiveCatalog, PrimitiveSpec, TerminalSpec};
pub use types::{DataType, Value};
