use super::traits::ConfigSection;
use crate::error::EmdError;
use serde::{Deserialize, Serialize};

/// What a failing objective call does to its batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationErrorPolicy {
    /// Abort the batch and the run
    #[default]
    Abort,
    /// Log the failure, give the individual the worst fitness and continue
    WorstFitness,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Worker threads per batch; `None` or 0 uses the host's available parallelism
    pub workers: Option<usize>,
    pub on_error: EvaluationErrorPolicy,
}

impl EvaluationConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Effective worker count, never below 1
    pub fn worker_count(&self) -> usize {
        match self.workers {
            Some(n) if n >= 1 => n,
            _ => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

impl ConfigSection for EvaluationConfig {
    fn section_name() -> &'static str {
        "evaluation"
    }

    fn validate(&self) -> Result<(), EmdError> {
        Ok(())
    }
}
