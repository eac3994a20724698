use crate::engines::generation::ExpressionNode;
use crate::types::Value;
use std::collections::BTreeMap;

/// Flat key/value row returned alongside a fitness, domain-defined
pub type FactorRecord = BTreeMap<String, Value>;

/// Outcome of one objective call
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub fitness: f64,
    pub record: FactorRecord,
}

impl Evaluation {
    pub fn new(fitness: f64) -> Self {
        Self {
            fitness,
            record: FactorRecord::new(),
        }
    }

    pub fn with_record(fitness: f64, record: FactorRecord) -> Self {
        Self { fitness, record }
    }
}

/// External fitness function.
///
/// Called from several worker threads at once on different trees, so any
/// context it holds must be shared read-only. Implementations that write
/// artifacts (model files, logs) must keep paths distinct per call.
pub trait Objective: Send + Sync {
    fn evaluate(&self, tree: &ExpressionNode) -> anyhow::Result<Evaluation>;
}

impl<F> Objective for F
where
    F: Fn(&ExpressionNode) -> anyhow::Result<Evaluation> + Send + Sync,
{
    fn evaluate(&self, tree: &ExpressionNode) -> anyhow::Result<Evaluation> {
        self(tree)
    }
}
