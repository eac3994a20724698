use super::objective::{Evaluation, Objective};
use crate::config::{EvaluationConfig, EvaluationErrorPolicy};
use crate::engines::generation::{ExpressionNode, Individual, OptimizationDirection};
use crate::error::{EmdError, Result};
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Runs objective calls for one batch at a time on a bounded worker pool.
///
/// Each batch gets its own scoped rayon pool whose threads are joined before
/// the call returns, so two batches never overlap and no worker outlives its
/// batch. Results come back in input order.
pub struct EvaluationScheduler {
    workers: usize,
    on_error: EvaluationErrorPolicy,
    live_workers: AtomicUsize,
}

/// Counts a worker thread as live until its run loop has returned
struct LiveWorker<'a>(&'a AtomicUsize);

impl<'a> LiveWorker<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LiveWorker<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Fitness written back by [`EvaluationScheduler::evaluate_invalid`]
#[derive(Debug, Clone)]
pub struct EvaluatedBatch {
    /// Population positions that were evaluated, ascending
    pub indices: Vec<usize>,
    /// `evaluations[i]` belongs to `indices[i]`
    pub evaluations: Vec<Evaluation>,
}

impl EvaluatedBatch {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

impl EvaluationScheduler {
    pub fn new(workers: usize, on_error: EvaluationErrorPolicy) -> Self {
        Self {
            workers: workers.max(1),
            on_error,
            live_workers: AtomicUsize::new(0),
        }
    }

    pub fn from_config(config: &EvaluationConfig) -> Self {
        Self::new(config.worker_count(), config.on_error)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Worker threads currently running; zero whenever no batch is in flight
    pub fn live_workers(&self) -> usize {
        self.live_workers.load(Ordering::SeqCst)
    }

    /// Evaluate every tree; `result[i]` belongs to `trees[i]`.
    ///
    /// With [`EvaluationErrorPolicy::Abort`] the first failure ends the batch
    /// and all sibling results are dropped.
    pub fn evaluate_batch<O: Objective + ?Sized>(
        &self,
        objective: &O,
        trees: &[&ExpressionNode],
        direction: OptimizationDirection,
    ) -> Result<Vec<Evaluation>> {
        if trees.is_empty() {
            return Ok(Vec::new());
        }

        let on_error = self.on_error;
        let live = &self.live_workers;
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers.min(trees.len()))
            .thread_name(|i| format!("emd-eval-{}", i))
            .build_scoped(
                |thread| {
                    let _live = LiveWorker::enter(live);
                    thread.run()
                },
                |pool| {
                    log::debug!(
                        "Evaluating batch of {} on {} workers",
                        trees.len(),
                        pool.current_num_threads()
                    );
                    pool.install(|| {
                        trees
                            .par_iter()
                            .enumerate()
                            .map(|(index, tree)| match objective.evaluate(tree) {
                                Ok(evaluation) => Ok(evaluation),
                                Err(err) => match on_error {
                                    EvaluationErrorPolicy::Abort => Err(EmdError::Evaluation {
                                        index,
                                        message: format!("{:#}", err),
                                    }),
                                    EvaluationErrorPolicy::WorstFitness => {
                                        log::warn!("Evaluation of {} failed, scoring as worst: {:#}", tree, err);
                                        Ok(Evaluation::new(direction.worst()))
                                    }
                                },
                            })
                            .collect::<Result<Vec<_>>>()
                    })
                },
            )
            .map_err(|e| EmdError::ThreadPool(e.to_string()))?
    }

    /// Evaluate only the individuals whose fitness is unset and store the results.
    ///
    /// Individuals already holding a fitness are skipped, so a fully evaluated
    /// population costs no objective calls. Nothing is written back if the
    /// batch fails.
    pub fn evaluate_invalid<O: Objective + ?Sized>(
        &self,
        objective: &O,
        population: &mut [Individual],
        direction: OptimizationDirection,
    ) -> Result<EvaluatedBatch> {
        let indices: Vec<usize> = population
            .iter()
            .enumerate()
            .filter(|(_, ind)| !ind.has_valid_fitness())
            .map(|(i, _)| i)
            .collect();

        let trees: Vec<&ExpressionNode> = indices.iter().map(|&i| population[i].tree()).collect();
        let evaluations = self
            .evaluate_batch(objective, &trees, direction)
            .map_err(|err| match err {
                EmdError::Evaluation { index, message } => EmdError::Evaluation {
                    index: indices[index],
                    message,
                },
                other => other,
            })?;

        for (&i, evaluation) in indices.iter().zip(&evaluations) {
            population[i].set_fitness(evaluation.fitness);
        }

        Ok(EvaluatedBatch { indices, evaluations })
    }
}
