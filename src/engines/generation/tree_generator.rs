use super::ast::ExpressionNode;
use crate::error::{EmdError, Result};
use crate::functions::{PrimitiveCatalog, PrimitiveSpec};
use crate::types::DataType;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;

/// Node chosen for one obligation, recorded in prefix order
enum Placed {
    Primitive(Arc<PrimitiveSpec>),
    Leaf(ExpressionNode),
}

/// Grow a random tree of `root_type` whose target height is drawn uniformly
/// from `[min_height, max_height]`.
///
/// Once `min_height` is reached a leaf is preferred with probability
/// [`PrimitiveCatalog::terminal_ratio`]; at the target height a leaf is
/// always preferred. When the preferred kind is missing for the required
/// type the other kind is used, and if the catalog has neither the whole
/// call fails with [`EmdError::InvalidType`]. A single height draw is made;
/// failures are not retried.
pub fn generate<R: Rng>(
    catalog: &PrimitiveCatalog,
    min_height: usize,
    max_height: usize,
    root_type: &DataType,
    rng: &mut R,
) -> Result<ExpressionNode> {
    if min_height > max_height {
        return Err(EmdError::Configuration(format!(
            "Minimum height {} exceeds maximum height {}",
            min_height, max_height
        )));
    }

    let height = rng.gen_range(min_height..=max_height);
    let ratio = catalog.terminal_ratio();
    let mut placed = Vec::new();
    let mut stack = vec![(0usize, root_type.clone())];

    while let Some((depth, data_type)) = stack.pop() {
        let want_leaf = depth == height || (depth >= min_height && rng.gen::<f64>() < ratio);
        let primitives = catalog.primitives_of(&data_type);
        let terminals = catalog.terminals_of(&data_type);

        let use_leaf = match (want_leaf, terminals.is_empty(), primitives.is_empty()) {
            (_, true, true) => {
                return Err(EmdError::InvalidType(format!(
                    "No primitives or terminals of type {}",
                    data_type
                )))
            }
            (true, false, _) => true,
            (true, true, false) => false,
            (false, _, false) => false,
            (false, false, true) => true,
        };

        if use_leaf {
            let terminal = terminals
                .choose(rng)
                .ok_or_else(|| EmdError::InvalidType(format!("No terminals of type {}", data_type)))?;
            let value = terminal.sample(rng);
            placed.push(Placed::Leaf(ExpressionNode::terminal(
                terminal.name(),
                data_type,
                value,
            )));
        } else {
            let primitive = primitives
                .choose(rng)
                .ok_or_else(|| EmdError::InvalidType(format!("No primitives of type {}", data_type)))?;
            for arg in primitive.input_types().iter().rev() {
                stack.push((depth + 1, arg.clone()));
            }
            placed.push(Placed::Primitive(Arc::clone(primitive)));
        }
    }

    assemble(placed)
}

/// Fold a prefix-ordered node list into an owned tree
fn assemble(placed: Vec<Placed>) -> Result<ExpressionNode> {
    let mut built: Vec<ExpressionNode> = Vec::new();
    for item in placed.into_iter().rev() {
        match item {
            Placed::Leaf(node) => built.push(node),
            Placed::Primitive(spec) => {
                let arity = spec.arity();
                if built.len() < arity {
                    return Err(EmdError::InvalidType(format!(
                        "Primitive {} is missing arguments",
                        spec.name()
                    )));
                }
                let mut children = built.split_off(built.len() - arity);
                children.reverse();
                built.push(ExpressionNode::primitive(spec, children));
            }
        }
    }
    match (built.pop(), built.is_empty()) {
        (Some(root), true) => Ok(root),
        _ => Err(EmdError::InvalidType("Malformed prefix expression".to_string())),
    }
}
