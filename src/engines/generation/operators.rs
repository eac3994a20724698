use super::ast::ExpressionNode;
use super::genome::{Individual, OptimizationDirection};
use super::tree_generator;
use crate::config::DepthRange;
use crate::error::Result;
use crate::functions::PrimitiveCatalog;
use crate::types::DataType;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;

/// Tournament selection: pick best of K random candidates.
///
/// Candidates are drawn with replacement; on equal fitness the first one
/// drawn wins. Individuals without fitness lose to any evaluated one.
/// Returns `None` for an empty population.
pub fn tournament_selection<'a, R: Rng>(
    population: &'a [Individual],
    tournament_size: usize,
    direction: OptimizationDirection,
    rng: &mut R,
) -> Option<&'a Individual> {
    if population.is_empty() {
        return None;
    }
    let score = |ind: &Individual| ind.fitness().unwrap_or_else(|| direction.worst());

    let mut best_idx = rng.gen_range(0..population.len());
    let mut best_fitness = score(&population[best_idx]);

    for _ in 1..tournament_size {
        let idx = rng.gen_range(0..population.len());
        let fitness = score(&population[idx]);
        if direction.is_better(fitness, best_fitness) {
            best_idx = idx;
            best_fitness = fitness;
        }
    }

    Some(&population[best_idx])
}

/// Run `count` independent tournaments, cloning each winner
pub fn select_tournament<R: Rng>(
    population: &[Individual],
    count: usize,
    tournament_size: usize,
    direction: OptimizationDirection,
    rng: &mut R,
) -> Vec<Individual> {
    (0..count)
        .map_while(|_| tournament_selection(population, tournament_size, direction, rng).cloned())
        .collect()
}

/// Prefix indices of every non-root node, grouped by output type
fn points_by_type(tree: &ExpressionNode) -> BTreeMap<&DataType, Vec<usize>> {
    let mut points: BTreeMap<&DataType, Vec<usize>> = BTreeMap::new();
    for (idx, node) in tree.iter().enumerate().skip(1) {
        points.entry(node.output_type()).or_default().push(idx);
    }
    points
}

/// Typed one-point crossover: swap two subtrees of the same type.
///
/// A type shared by both parents is picked first, then one point of that
/// type in each parent. Roots are never swapped. Returns `None` when either
/// tree is a single node or the parents share no type below the root.
pub fn crossover<R: Rng>(
    parent1: &ExpressionNode,
    parent2: &ExpressionNode,
    rng: &mut R,
) -> Option<(ExpressionNode, ExpressionNode)> {
    if parent1.size() < 2 || parent2.size() < 2 {
        return None;
    }

    let points1 = points_by_type(parent1);
    let points2 = points_by_type(parent2);
    let common: Vec<&DataType> = points1
        .keys()
        .filter(|t| points2.contains_key(*t))
        .copied()
        .collect();

    let data_type = common.choose(rng)?;
    let idx1 = *points1.get(data_type)?.choose(rng)?;
    let idx2 = *points2.get(data_type)?.choose(rng)?;

    let sub1 = parent1.subtree(idx1)?.clone();
    let sub2 = parent2.subtree(idx2)?.clone();

    let child1 = parent1.replace_subtree(idx1, sub2)?;
    let child2 = parent2.replace_subtree(idx2, sub1)?;
    Some((child1, child2))
}

/// Subtree-replacement mutation.
///
/// A node is picked uniformly (root included) and replaced by a fresh tree
/// of the same output type grown within `depth`.
pub fn mutate<R: Rng>(
    tree: &ExpressionNode,
    catalog: &PrimitiveCatalog,
    depth: DepthRange,
    rng: &mut R,
) -> Result<ExpressionNode> {
    let idx = rng.gen_range(0..tree.size());
    let Some(target) = tree.subtree(idx) else {
        return Ok(tree.clone());
    };
    let data_type = target.output_type().clone();
    let replacement = tree_generator::generate(catalog, depth.min, depth.max, &data_type, rng)?;
    Ok(tree.replace_subtree(idx, replacement).unwrap_or_else(|| tree.clone()))
}
