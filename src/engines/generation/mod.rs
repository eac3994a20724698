pub mod ast;
pub mod genome;
pub mod tree_generator;
pub mod operators;
pub mod hall_of_fame;
pub mod statistics;
pub mod evolution_engine;
pub mod progress;

pub use ast::ExpressionNode;
pub use genome::{Individual, OptimizationDirection, Population};
pub use hall_of_fame::HallOfFame;
pub use statistics::{FactorScoreRow, FactorScoreTable, GenerationRecord, RunLog};
pub use evolution_engine::{EvolutionEngine, EvolutionOutcome, ProgressCallback};
pub use progress::{ChannelProgressCallback, LogProgressCallback, ProgressMessage};
