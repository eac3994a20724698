use crate::config::{AppConfig, ConfigSection, EvaluationConfig, EvolutionConfig};
use crate::engines::evaluation::{EvaluationScheduler, Objective};
use crate::engines::generation::{
    genome::{Individual, Population},
    hall_of_fame::HallOfFame,
    operators,
    statistics::{FactorScoreRow, FactorScoreTable, GenerationRecord, RunLog},
    tree_generator,
};
use crate::error::{EmdError, Result};
use crate::functions::PrimitiveCatalog;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Everything a completed run produces
#[derive(Debug, Clone)]
pub struct EvolutionOutcome {
    pub population: Population,
    pub logbook: RunLog,
    pub factor_scores: FactorScoreTable,
    /// Best individual seen across all generations
    pub best: Option<Individual>,
}

pub trait ProgressCallback: Send {
    fn on_generation_start(&mut self, generation: usize);
    fn on_batch_evaluated(&mut self, generation: usize, nevals: usize);
    fn on_generation_complete(&mut self, record: &GenerationRecord, best_fitness: Option<f64>);
}

/// Generational GP loop: evaluate the initial population, then for each
/// generation select by tournament, vary, evaluate what changed and record.
///
/// The engine's RNG is only touched on the calling thread, so for a fixed
/// seed the sequence of genomes is the same whatever the worker count.
pub struct EvolutionEngine<O: Objective> {
    config: EvolutionConfig,
    catalog: Arc<PrimitiveCatalog>,
    objective: O,
    scheduler: EvaluationScheduler,
    hall_of_fame: HallOfFame,
    rng: StdRng,
}

impl<O: Objective> EvolutionEngine<O> {
    pub fn new(config: AppConfig, catalog: PrimitiveCatalog, objective: O) -> Result<Self> {
        Self::with_sections(config.evolution, &config.evaluation, catalog, objective)
    }

    pub fn with_sections(
        config: EvolutionConfig,
        evaluation: &EvaluationConfig,
        catalog: PrimitiveCatalog,
        objective: O,
    ) -> Result<Self> {
        config.validate()?;
        evaluation.validate()?;
        catalog.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let hall_of_fame = HallOfFame::new(config.hall_of_fame_size, config.direction);

        Ok(Self {
            config,
            catalog: Arc::new(catalog),
            objective,
            scheduler: EvaluationScheduler::from_config(evaluation),
            hall_of_fame,
            rng,
        })
    }

    /// Run the evolution process
    pub fn run<C: ProgressCallback>(&mut self, callback: C) -> Result<EvolutionOutcome> {
        self.run_with_cancel(callback, None)
    }

    /// Run, checking `cancel` before every generation.
    ///
    /// A cancelled run returns [`EmdError::Cancelled`] and no outcome.
    pub fn run_with_cancel<C: ProgressCallback>(
        &mut self,
        mut callback: C,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<EvolutionOutcome> {
        self.hall_of_fame = HallOfFame::new(self.config.hall_of_fame_size, self.config.direction);
        let mut logbook = RunLog::new();
        let mut factor_scores = FactorScoreTable::new();

        log::info!(
            "Starting run: population {}, generations {}, {} workers",
            self.config.population_size,
            self.config.generations,
            self.scheduler.workers()
        );

        Self::check_cancel(cancel.as_deref(), 0)?;
        callback.on_generation_start(0);
        let mut population = self.initialize_population()?;
        let nevals = self.evaluate(&mut population, 0, &mut factor_scores)?;
        callback.on_batch_evaluated(0, nevals);
        self.hall_of_fame.update(&population);
        self.record(0, nevals, &population, &mut logbook, &mut callback);

        for generation in 1..=self.config.generations {
            Self::check_cancel(cancel.as_deref(), generation)?;
            callback.on_generation_start(generation);

            let selected = operators::select_tournament(
                &population,
                self.config.population_size,
                self.config.tournament_size,
                self.config.direction,
                &mut self.rng,
            );
            let mut offspring = self.vary(selected)?;

            let nevals = self.evaluate(&mut offspring, generation, &mut factor_scores)?;
            callback.on_batch_evaluated(generation, nevals);

            // Update Hall of Fame
            self.hall_of_fame.update(&offspring);
            population = offspring;
            self.record(generation, nevals, &population, &mut logbook, &mut callback);
        }

        let best = self.hall_of_fame.best().cloned();
        if let Some(best) = &best {
            log::info!("Best individual: {} (fitness {:?})", best.tree(), best.fitness());
        }

        Ok(EvolutionOutcome {
            population,
            logbook,
            factor_scores,
            best,
        })
    }

    fn check_cancel(cancel: Option<&AtomicBool>, generation: usize) -> Result<()> {
        match cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => {
                log::info!("Run cancelled before generation {}", generation);
                Err(EmdError::Cancelled { generation })
            }
            _ => Ok(()),
        }
    }

    fn initialize_population(&mut self) -> Result<Population> {
        let depth = self.config.init_depth;
        let root_type = self.catalog.root_type().clone();
        (0..self.config.population_size)
            .map(|_| {
                tree_generator::generate(&self.catalog, depth.min, depth.max, &root_type, &mut self.rng)
                    .map(Individual::new)
            })
            .collect()
    }

    /// Evaluate individuals lacking fitness and log their factor rows.
    /// Returns the number of objective calls.
    fn evaluate(
        &self,
        population: &mut [Individual],
        generation: usize,
        factor_scores: &mut FactorScoreTable,
    ) -> Result<usize> {
        let batch = self
            .scheduler
            .evaluate_invalid(&self.objective, population, self.config.direction)?;
        let nevals = batch.len();

        for (idx, evaluation) in batch.indices.into_iter().zip(batch.evaluations) {
            factor_scores.push(FactorScoreRow {
                generation,
                fitness: evaluation.fitness,
                genome: population[idx].tree().canonical_string(),
                factors: evaluation.record,
            });
        }

        Ok(nevals)
    }

    /// Crossover on adjacent pairs, then independent mutation of every slot.
    /// Any slot touched by either operator loses its fitness.
    fn vary(&mut self, mut offspring: Vec<Individual>) -> Result<Vec<Individual>> {
        for i in (1..offspring.len()).step_by(2) {
            if self.rng.gen::<f64>() < self.config.crossover_rate {
                match operators::crossover(offspring[i - 1].tree(), offspring[i].tree(), &mut self.rng) {
                    Some((child1, child2)) => {
                        offspring[i - 1] = Individual::new(child1);
                        offspring[i] = Individual::new(child2);
                    }
                    // a mated pair is re-scored even when no subtrees could be swapped
                    None => {
                        offspring[i - 1].invalidate();
                        offspring[i].invalidate();
                    }
                }
            }
        }

        for slot in offspring.iter_mut() {
            if self.rng.gen::<f64>() < self.config.mutation_rate {
                let child = operators::mutate(
                    slot.tree(),
                    &self.catalog,
                    self.config.mutation_depth,
                    &mut self.rng,
                )?;
                *slot = Individual::new(child);
            }
        }

        Ok(offspring)
    }

    fn record<C: ProgressCallback>(
        &self,
        generation: usize,
        nevals: usize,
        population: &[Individual],
        logbook: &mut RunLog,
        callback: &mut C,
    ) {
        let record = GenerationRecord::compile(generation, nevals, population);
        logbook.record(record);
        let best_fitness = self.hall_of_fame.best().and_then(Individual::fitness);
        callback.on_generation_complete(&record, best_fitness);
    }

    pub fn get_hall_of_fame(&self) -> &HallOfFame {
        &self.hall_of_fame
    }

    pub fn catalog(&self) -> &PrimitiveCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }
}
