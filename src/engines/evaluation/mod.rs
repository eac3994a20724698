pub mod objective;
pub mod scheduler;

pub use objective::{Evaluation, FactorRecord, Objective};
pub use scheduler::{EvaluatedBatch, EvaluationScheduler};
