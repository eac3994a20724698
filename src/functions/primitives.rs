use crate::types::{DataType, Value};
use rand::RngCore;
use std::fmt;
use std::sync::Arc;

/// Typed function node: `name(args...) -> ret`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimitiveSpec {
    name: String,
    args: Vec<DataType>,
    ret: DataType,
}

impl PrimitiveSpec {
    pub fn new(name: impl Into<String>, args: Vec<DataType>, ret: DataType) -> Self {
        Self {
            name: name.into(),
            args,
            ret,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }

    pub fn input_types(&self) -> &[DataType] {
        &self.args
    }

    pub fn output_type(&self) -> &DataType {
        &self.ret
    }
}

pub type EphemeralFn = Arc<dyn Fn(&mut dyn RngCore) -> Value + Send + Sync>;

/// How a terminal produces its value when placed in a tree
#[derive(Clone)]
pub enum TerminalKind {
    /// Same value every time
    Constant(Value),
    /// Fresh value drawn from the run RNG at placement time
    Ephemeral(EphemeralFn),
}

impl fmt::Debug for TerminalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalKind::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            TerminalKind::Ephemeral(_) => f.write_str("Ephemeral(..)"),
        }
    }
}

/// Typed leaf of the catalog
#[derive(Debug, Clone)]
pub struct TerminalSpec {
    name: String,
    ret: DataType,
    kind: TerminalKind,
}

impl TerminalSpec {
    pub fn constant(name: impl Into<String>, ret: DataType, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            ret,
            kind: TerminalKind::Constant(value.into()),
        }
    }

    pub fn ephemeral<F>(name: impl Into<String>, ret: DataType, generator: F) -> Self
    where
        F: Fn(&mut dyn RngCore) -> Value + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            ret,
            kind: TerminalKind::Ephemeral(Arc::new(generator)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn output_type(&self) -> &DataType {
        &self.ret
    }

    pub fn kind(&self) -> &TerminalKind {
        &self.kind
    }

    /// Produce the value a new leaf of this terminal carries
    pub fn sample(&self, rng: &mut dyn RngCore) -> Value {
        match &self.kind {
            TerminalKind::Constant(v) => v.clone(),
            TerminalKind::Ephemeral(generate) => (**generate)(rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_constant_terminal_always_same_value() {
        let term = TerminalSpec::constant("one", DataType::new("Num"), 1i64);
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(term.sample(&mut rng), Value::Integer(1));
        assert_eq!(term.sample(&mut rng), Value::Integer(1));
    }

    #[test]
    fn test_ephemeral_terminal_draws_from_rng() {
        let term = TerminalSpec::ephemeral("rand", DataType::new("Num"), |rng| {
            Value::Integer(rng.gen_range(0..1000))
        });
        let mut a = StdRng::seed_from_u64(3);
        let mut b = StdRng::seed_from_u64(3);
        assert_eq!(term.sample(&mut a), term.sample(&mut b));
    }

    #[test]
    fn test_primitive_arity() {
        let add = PrimitiveSpec::new(
            "add",
            vec![DataType::new("Num"), DataType::new("Num")],
            DataType::new("Num"),
        );
        assert_eq!(add.arity(), 2);
        assert_eq!(add.output_type().name(), "Num");
    }
}
