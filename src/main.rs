use anyhow::{bail, Context, Result};
use emd::engines::generation::LogProgressCallback;
use emd::{
    ConfigManager, DataType, Evaluation, EvolutionEngine, ExpressionNode, FactorRecord,
    OptimizationDirection, PrimitiveCatalog, PrimitiveSpec, TerminalSpec, Value,
};
use rand::Rng;

const TARGET: f64 = 42.0;

/// Small arithmetic catalog used when no domain catalog is wired in
fn demo_catalog() -> PrimitiveCatalog {
    let num = DataType::new("Num");
    let mut catalog = PrimitiveCatalog::new(num.clone());
    catalog
        .add_terminal(TerminalSpec::constant("one", num.clone(), 1i64))
        .add_terminal(TerminalSpec::ephemeral("rand", num.clone(), |rng| {
            Value::Integer(rng.gen_range(-10..=10))
        }))
        .add_primitive(PrimitiveSpec::new("add", vec![num.clone(), num.clone()], num.clone()))
        .add_primitive(PrimitiveSpec::new("sub", vec![num.clone(), num.clone()], num.clone()))
        .add_primitive(PrimitiveSpec::new("mul", vec![num.clone(), num.clone()], num));
    catalog
}

fn interpret(tree: &ExpressionNode) -> Result<f64> {
    match tree {
        ExpressionNode::Terminal { value, .. } => value
            .as_f64()
            .with_context(|| format!("terminal {} is not numeric", value)),
        ExpressionNode::Primitive { spec, children } => {
            let args = children.iter().map(interpret).collect::<Result<Vec<_>>>()?;
            match (spec.name(), args.as_slice()) {
                ("add", [a, b]) => Ok(a + b),
                ("sub", [a, b]) => Ok(a - b),
                ("mul", [a, b]) => Ok(a * b),
                (name, _) => bail!("unknown primitive {}", name),
            }
        }
    }
}

fn distance_to_target(tree: &ExpressionNode) -> Result<Evaluation> {
    let value = interpret(tree)?;
    let mut record = FactorRecord::new();
    record.insert("value".to_string(), Value::Float(value));
    record.insert("size".to_string(), Value::Integer(tree.size() as i64));
    record.insert("height".to_string(), Value::Integer(tree.height() as i64));
    Ok(Evaluation::with_record((value - TARGET).abs(), record))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // usage: emd [config.toml|config.json] [factor_scores.json]
    let args: Vec<String> = std::env::args().skip(1).collect();
    let manager = ConfigManager::new();
    if let Some(path) = args.first() {
        manager
            .load_from_file(path)
            .with_context(|| format!("loading config from {}", path))?;
    } else {
        manager.update(|c| {
            c.evolution.population_size = 50;
            c.evolution.generations = 20;
            c.evolution.direction = OptimizationDirection::Minimize;
        })?;
    }

    let mut engine = EvolutionEngine::new(manager.get(), demo_catalog(), distance_to_target)?;
    let outcome = engine.run(LogProgressCallback)?;

    log::info!(
        "{} generations logged, {} evaluations recorded",
        outcome.logbook.len(),
        outcome.factor_scores.len()
    );
    if let Some(path) = args.get(1) {
        outcome
            .factor_scores
            .write_json(path)
            .with_context(|| format!("writing factor scores to {}", path))?;
        log::info!("Factor scores written to {}", path);
    }
    if let Some(best) = outcome.best {
        println!("{}", best.tree());
        println!("fitness = {:?}", best.fitness());
    }
    Ok(())
}
