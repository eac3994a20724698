use super::traits::ConfigSection;
use crate::engines::generation::OptimizationDirection;
use crate::error::EmdError;
use serde::{Deserialize, Serialize};

/// Inclusive tree height bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthRange {
    pub min: usize,
    pub max: usize,
}

impl DepthRange {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    fn validate(&self, label: &str) -> Result<(), EmdError> {
        if self.min > self.max {
            return Err(EmdError::Configuration(format!(
                "{} depth min {} exceeds max {}",
                label, self.min, self.max
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub population_size: usize,
    pub generations: usize,
    pub crossover_rate: f64,
    pub mutation_rate: f64,
    pub direction: OptimizationDirection,
    /// Height bounds of trees in the initial population
    pub init_depth: DepthRange,
    /// Height bounds of subtrees grown by mutation
    pub mutation_depth: DepthRange,
    pub tournament_size: usize,
    pub hall_of_fame_size: usize,
    pub seed: Option<u64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 5,
            generations: 10,
            crossover_rate: 0.8,
            mutation_rate: 0.2,
            direction: OptimizationDirection::Minimize,
            init_depth: DepthRange::new(2, 10),
            mutation_depth: DepthRange::new(2, 3),
            tournament_size: 3,
            hall_of_fame_size: 1,
            seed: None,
        }
    }
}

impl EvolutionConfig {
    /// Use the same height bounds for initial trees and mutation subtrees
    pub fn with_depth(mut self, min: usize, max: usize) -> Self {
        self.init_depth = DepthRange::new(min, max);
        self.mutation_depth = DepthRange::new(min, max);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl ConfigSection for EvolutionConfig {
    fn section_name() -> &'static str {
        "evolution"
    }

    fn validate(&self) -> Result<(), EmdError> {
        if self.population_size == 0 {
            return Err(EmdError::Configuration(
                "Population size must be at least 1".to_string()
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(EmdError::Configuration(
                "Mutation rate must be between 0 and 1".to_string()
            ));
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return Err(EmdError::Configuration(
                "Crossover rate must be between 0 and 1".to_string()
            ));
        }
        if self.tournament_size == 0 {
            return Err(EmdError::Configuration(
                "Tournament size must be at least 1".to_string()
            ));
        }
        if self.hall_of_fame_size == 0 {
            return Err(EmdError::Configuration(
                "Hall of fame size must be at least 1".to_string()
            ));
        }
        self.init_depth.validate("Initial")?;
        self.mutation_depth.validate("Mutation")?;
        Ok(())
    }
}
