use crate::functions::PrimitiveSpec;
use crate::types::{DataType, Value};
use std::fmt;
use std::sync::Arc;

/// Typed expression tree.
///
/// A primitive node exclusively owns its children, one per declared
/// argument type. Trees are never edited in place: [`ExpressionNode::replace_subtree`]
/// returns a new tree.
#[derive(Debug, Clone)]
pub enum ExpressionNode {
    Primitive {
        spec: Arc<PrimitiveSpec>,
        children: Vec<ExpressionNode>,
    },
    Terminal {
        name: String,
        ret: DataType,
        value: Value,
    },
}

impl ExpressionNode {
    pub fn terminal(name: impl Into<String>, ret: DataType, value: Value) -> Self {
        ExpressionNode::Terminal {
            name: name.into(),
            ret,
            value,
        }
    }

    pub fn primitive(spec: Arc<PrimitiveSpec>, children: Vec<ExpressionNode>) -> Self {
        ExpressionNode::Primitive { spec, children }
    }

    pub fn output_type(&self) -> &DataType {
        match self {
            ExpressionNode::Primitive { spec, .. } => spec.output_type(),
            ExpressionNode::Terminal { ret, .. } => ret,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ExpressionNode::Primitive { spec, .. } => spec.name(),
            ExpressionNode::Terminal { name, .. } => name,
        }
    }

    pub fn children(&self) -> &[ExpressionNode] {
        match self {
            ExpressionNode::Primitive { children, .. } => children,
            ExpressionNode::Terminal { .. } => &[],
        }
    }

    /// Number of nodes in the tree
    pub fn size(&self) -> usize {
        1 + self.children().iter().map(ExpressionNode::size).sum::<usize>()
    }

    /// Longest root-to-leaf path, counted in edges (a lone leaf has height 0)
    pub fn height(&self) -> usize {
        self.children()
            .iter()
            .map(|c| c.height() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Nodes in prefix (depth-first, left-to-right) order
    pub fn iter(&self) -> PreorderIter<'_> {
        PreorderIter { stack: vec![self] }
    }

    /// Node at a prefix-order index
    pub fn subtree(&self, index: usize) -> Option<&ExpressionNode> {
        self.iter().nth(index)
    }

    /// Copy of this tree with the node at `index` (and everything below it)
    /// replaced by `replacement`. Returns `None` when `index` is out of range.
    pub fn replace_subtree(&self, index: usize, replacement: ExpressionNode) -> Option<ExpressionNode> {
        if index >= self.size() {
            return None;
        }
        let mut replacement = Some(replacement);
        Some(self.rebuild(index, &mut replacement))
    }

    fn rebuild(&self, index: usize, replacement: &mut Option<ExpressionNode>) -> ExpressionNode {
        if index == 0 {
            if let Some(node) = replacement.take() {
                return node;
            }
        }
        match self {
            ExpressionNode::Terminal { .. } => self.clone(),
            ExpressionNode::Primitive { spec, children } => {
                let mut offset = 1;
                let mut rebuilt = Vec::with_capacity(children.len());
                for child in children {
                    let size = child.size();
                    if replacement.is_some() && index >= offset && index < offset + size {
                        rebuilt.push(child.rebuild(index - offset, replacement));
                    } else {
                        rebuilt.push(child.clone());
                    }
                    offset += size;
                }
                ExpressionNode::Primitive {
                    spec: Arc::clone(spec),
                    children: rebuilt,
                }
            }
        }
    }

    /// Every primitive's children match its declared argument types
    pub fn is_well_typed(&self) -> bool {
        match self {
            ExpressionNode::Terminal { .. } => true,
            ExpressionNode::Primitive { spec, children } => {
                children.len() == spec.arity()
                    && children
                        .iter()
                        .zip(spec.input_types())
                        .all(|(child, expected)| child.output_type() == expected && child.is_well_typed())
            }
        }
    }

    /// Stable textual form used for genome equality, e.g. `add(const=1, const=1)`
    pub fn canonical_string(&self) -> String {
        self.to_string()
    }
}

impl PartialEq for ExpressionNode {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                ExpressionNode::Primitive { spec: a, children: ac },
                ExpressionNode::Primitive { spec: b, children: bc },
            ) => a == b && ac == bc,
            (
                ExpressionNode::Terminal { name: an, ret: ar, value: av },
                ExpressionNode::Terminal { name: bn, ret: br, value: bv },
            ) => an == bn && ar == br && av == bv,
            _ => false,
        }
    }
}

impl fmt::Display for ExpressionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpressionNode::Terminal { name, value, .. } => write!(f, "{}={}", name, value),
            ExpressionNode::Primitive { spec, children } => {
                write!(f, "{}(", spec.name())?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", child)?;
                }
                f.write_str(")")
            }
        }
    }
}

pub struct PreorderIter<'a> {
    stack: Vec<&'a ExpressionNode>,
}

impl<'a> Iterator for PreorderIter<'a> {
    type Item = &'a ExpressionNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}
