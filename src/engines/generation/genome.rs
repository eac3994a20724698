//! Genome representation for genetic programming
//!
//! An individual's genome is a typed [`ExpressionNode`] tree. Fitness is a
//! single scalar whose meaning ("bigger is better" or "smaller is better")
//! is fixed for the whole run by an [`OptimizationDirection`] carried in the
//! run configuration; nothing global records it.
//!
//! # Lifecycle
//!
//! - Created by the tree generator or derived by a variation operator,
//!   always with fitness unset.
//! - Fitness is assigned once by the evaluation scheduler.
//! - Variation never edits a genome; it builds a new tree and wraps it
//!   in [`Individual::new`], so the offspring starts with fitness unset.

use super::ast::ExpressionNode;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationDirection {
    Maximize,
    #[default]
    Minimize,
}

impl OptimizationDirection {
    /// Orders two fitness values so that `Greater` means `a` is better
    pub fn compare(&self, a: f64, b: f64) -> Ordering {
        let ord = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
        match self {
            OptimizationDirection::Maximize => ord,
            OptimizationDirection::Minimize => ord.reverse(),
        }
    }

    /// `a` is strictly better than `b`
    pub fn is_better(&self, a: f64, b: f64) -> bool {
        self.compare(a, b) == Ordering::Greater
    }

    /// Fitness no real evaluation can lose to
    pub fn worst(&self) -> f64 {
        match self {
            OptimizationDirection::Maximize => f64::NEG_INFINITY,
            OptimizationDirection::Minimize => f64::INFINITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    tree: ExpressionNode,
    fitness: Option<f64>,
}

impl Individual {
    pub fn new(tree: ExpressionNode) -> Self {
        Self { tree, fitness: None }
    }

    pub fn tree(&self) -> &ExpressionNode {
        &self.tree
    }

    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    pub fn has_valid_fitness(&self) -> bool {
        self.fitness.is_some()
    }

    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = Some(fitness);
    }

    pub fn invalidate(&mut self) {
        self.fitness = None;
    }

    /// Genome equality, ignoring fitness
    pub fn same_genome(&self, other: &Individual) -> bool {
        self.tree == other.tree
    }
}

pub type Population = Vec<Individual>;
