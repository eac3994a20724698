use super::primitives::{PrimitiveSpec, TerminalSpec};
use crate::error::{EmdError, Result};
use crate::types::DataType;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Typed set of primitives and terminals a tree may be built from.
///
/// Entries are kept per output type in insertion order, so a seeded run
/// picks the same entries regardless of hashing. The catalog is read-only
/// once handed to the engine and is shared across evaluation workers.
#[derive(Debug, Clone)]
pub struct PrimitiveCatalog {
    root_type: DataType,
    primitives: BTreeMap<DataType, Vec<Arc<PrimitiveSpec>>>,
    terminals: BTreeMap<DataType, Vec<Arc<TerminalSpec>>>,
}

impl PrimitiveCatalog {
    pub fn new(root_type: DataType) -> Self {
        Self {
            root_type,
            primitives: BTreeMap::new(),
            terminals: BTreeMap::new(),
        }
    }

    pub fn add_primitive(&mut self, primitive: PrimitiveSpec) -> &mut Self {
        self.primitives
            .entry(primitive.output_type().clone())
            .or_default()
            .push(Arc::new(primitive));
        self
    }

    pub fn add_terminal(&mut self, terminal: TerminalSpec) -> &mut Self {
        self.terminals
            .entry(terminal.output_type().clone())
            .or_default()
            .push(Arc::new(terminal));
        self
    }

    pub fn root_type(&self) -> &DataType {
        &self.root_type
    }

    pub fn primitives_of(&self, data_type: &DataType) -> &[Arc<PrimitiveSpec>] {
        self.primitives
            .get(data_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn terminals_of(&self, data_type: &DataType) -> &[Arc<TerminalSpec>] {
        self.terminals
            .get(data_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn primitive_count(&self) -> usize {
        self.primitives.values().map(Vec::len).sum()
    }

    pub fn terminal_count(&self) -> usize {
        self.terminals.values().map(Vec::len).sum()
    }

    /// Probability of preferring a terminal once the minimum depth is reached.
    ///
    /// Derived over the whole catalog: terminals / (terminals + primitives).
    pub fn terminal_ratio(&self) -> f64 {
        let terms = self.terminal_count();
        let total = terms + self.primitive_count();
        if total == 0 {
            return 0.0;
        }
        terms as f64 / total as f64
    }

    /// Types that can be reached from the root through primitive arguments
    pub fn reachable_types(&self) -> BTreeSet<DataType> {
        let mut seen = BTreeSet::new();
        let mut stack = vec![self.root_type.clone()];
        while let Some(data_type) = stack.pop() {
            if !seen.insert(data_type.clone()) {
                continue;
            }
            for primitive in self.primitives_of(&data_type) {
                stack.extend(primitive.input_types().iter().cloned());
            }
        }
        seen
    }

    /// Types for which some finite tree exists
    fn terminating_types(&self) -> BTreeSet<DataType> {
        let mut done: BTreeSet<DataType> = self.terminals.keys().cloned().collect();
        loop {
            let before = done.len();
            for (data_type, primitives) in &self.primitives {
                if done.contains(data_type) {
                    continue;
                }
                if primitives
                    .iter()
                    .any(|p| p.input_types().iter().all(|arg| done.contains(arg)))
                {
                    done.insert(data_type.clone());
                }
            }
            if done.len() == before {
                return done;
            }
        }
    }

    /// Check that every type reachable from the root can be built into a finite tree
    pub fn validate(&self) -> Result<()> {
        let terminating = self.terminating_types();
        for data_type in self.reachable_types() {
            if self.primitives_of(&data_type).is_empty() && self.terminals_of(&data_type).is_empty() {
                return Err(EmdError::Configuration(format!(
                    "No primitives or terminals of type {}",
                    data_type
                )));
            }
            if !terminating.contains(&data_type) {
                return Err(EmdError::Configuration(format!(
                    "Type {} can never be closed by a terminal",
                    data_type
                )));
            }
        }
        Ok(())
    }
}
