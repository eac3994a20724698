use emd::engines::generation::{ChannelProgressCallback, ProgressMessage};
use emd::{
    AppConfig, DataType, EmdError, Evaluation, EvaluationScheduler, EvaluationErrorPolicy,
    EvolutionConfig, EvolutionEngine, ExpressionNode, FactorRecord, Individual,
    OptimizationDirection, PrimitiveCatalog, PrimitiveSpec, TerminalSpec, Value,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;

/// `const=1` and `add(Num, Num)`, rooted at Num
fn sum_catalog() -> PrimitiveCatalog {
    let num = DataType::new("Num");
    let mut catalog = PrimitiveCatalog::new(num.clone());
    catalog
        .add_terminal(TerminalSpec::constant("const", num.clone(), 1i64))
        .add_primitive(PrimitiveSpec::new("add", vec![num.clone(), num.clone()], num));
    catalog
}

fn sum(tree: &ExpressionNode) -> f64 {
    match tree {
        ExpressionNode::Terminal { value, .. } => value.as_f64().unwrap_or(0.0),
        ExpressionNode::Primitive { children, .. } => children.iter().map(sum).sum(),
    }
}

fn sum_objective(tree: &ExpressionNode) -> anyhow::Result<Evaluation> {
    let mut record = FactorRecord::new();
    record.insert("leaves".to_string(), Value::Integer(tree.iter().filter(|n| n.children().is_empty()).count() as i64));
    Ok(Evaluation::with_record(sum(tree), record))
}

/// Minimal run settings from the end-to-end scenarios
fn scenario_config(crossover: f64, mutation: f64, seed: u64) -> AppConfig {
    let mut config = AppConfig::default();
    config.evolution = EvolutionConfig {
        population_size: 4,
        generations: 2,
        crossover_rate: crossover,
        mutation_rate: mutation,
        direction: OptimizationDirection::Maximize,
        ..EvolutionConfig::default().with_depth(1, 2).with_seed(seed)
    };
    config.evaluation.workers = Some(2);
    config
}

#[test]
fn test_pure_selection_run() {
    let mut engine = EvolutionEngine::new(scenario_config(0.0, 0.0, 7), sum_catalog(), sum_objective).unwrap();
    let outcome = engine.run(()).unwrap();

    assert_eq!(outcome.logbook.len(), 3);
    assert_eq!(outcome.population.len(), 4);
    for (gen, record) in outcome.logbook.records().iter().enumerate() {
        assert_eq!(record.generation, gen);
        assert!(record.nevals <= 4);
    }
    assert_eq!(outcome.logbook.records()[0].nevals, 4);
    // nothing is varied, so carried-over individuals are never re-scored
    assert_eq!(outcome.logbook.records()[1].nevals, 0);
    assert_eq!(outcome.logbook.records()[2].nevals, 0);
    assert_eq!(outcome.factor_scores.len(), 4);

    for ind in &outcome.population {
        let leaves = ind.tree().iter().filter(|n| n.children().is_empty()).count();
        assert_eq!(ind.fitness(), Some(leaves as f64));
        assert!(ind.tree().height() >= 1 && ind.tree().height() <= 2);
    }
}

#[test]
fn test_full_mutation_reevaluates_everyone() {
    let mut engine = EvolutionEngine::new(scenario_config(0.0, 1.0, 11), sum_catalog(), sum_objective).unwrap();
    let outcome = engine.run(()).unwrap();

    assert_eq!(outcome.logbook.len(), 3);
    for record in outcome.logbook.records() {
        assert_eq!(record.nevals, 4);
    }
    assert_eq!(outcome.factor_scores.len(), 12);
    for generation in 0..3 {
        assert_eq!(outcome.factor_scores.generation(generation).count(), 4);
    }
}

#[test]
fn test_crossover_and_mutation_keep_trees_typed() {
    let mut config = scenario_config(0.9, 0.3, 99);
    config.evolution.population_size = 12;
    config.evolution.generations = 6;
    let mut engine = EvolutionEngine::new(config, sum_catalog(), sum_objective).unwrap();
    let outcome = engine.run(()).unwrap();

    assert_eq!(outcome.logbook.len(), 7);
    for ind in &outcome.population {
        assert!(ind.tree().is_well_typed());
        assert_eq!(ind.tree().output_type(), &DataType::new("Num"));
        assert!(ind.has_valid_fitness());
    }
    for row in outcome.factor_scores.rows() {
        assert_eq!(row.factors.get("leaves").and_then(Value::as_f64), Some(row.fitness));
    }
}

#[test]
fn test_hall_of_fame_holds_best_ever() {
    for direction in [OptimizationDirection::Maximize, OptimizationDirection::Minimize] {
        let mut config = scenario_config(0.8, 0.4, 5);
        config.evolution.direction = direction;
        config.evolution.population_size = 10;
        config.evolution.generations = 5;
        config.evolution.init_depth = emd::DepthRange::new(1, 4);
        let mut engine = EvolutionEngine::new(config, sum_catalog(), sum_objective).unwrap();
        let outcome = engine.run(()).unwrap();

        let scores = outcome.factor_scores.rows().iter().map(|r| r.fitness);
        let expected = match direction {
            OptimizationDirection::Maximize => scores.fold(f64::NEG_INFINITY, f64::max),
            OptimizationDirection::Minimize => scores.fold(f64::INFINITY, f64::min),
        };
        let best = outcome.best.expect("a completed run has a best individual");
        assert_eq!(best.fitness(), Some(expected));
        assert_eq!(engine.get_hall_of_fame().len(), 1);
    }
}

#[test]
fn test_worker_count_does_not_change_results() {
    let run = |workers: usize| {
        let mut config = scenario_config(0.7, 0.3, 2024);
        config.evolution.population_size = 16;
        config.evolution.generations = 4;
        config.evaluation.workers = Some(workers);
        let mut engine = EvolutionEngine::new(config, sum_catalog(), sum_objective).unwrap();
        engine.run(()).unwrap()
    };
    let single = run(1);
    let many = run(8);
    assert_eq!(single.population, many.population);
    assert_eq!(single.logbook.records(), many.logbook.records());
    assert_eq!(single.factor_scores.rows(), many.factor_scores.rows());
}

#[test]
fn test_evaluated_population_costs_no_calls() {
    let calls = AtomicUsize::new(0);
    let counting = |tree: &ExpressionNode| -> anyhow::Result<Evaluation> {
        calls.fetch_add(1, Ordering::SeqCst);
        sum_objective(tree)
    };
    let leaf = ExpressionNode::terminal("const", DataType::new("Num"), Value::Integer(1));
    let mut population: Vec<Individual> = (0..5).map(|_| Individual::new(leaf.clone())).collect();

    let scheduler = EvaluationScheduler::new(3, EvaluationErrorPolicy::Abort);
    scheduler
        .evaluate_invalid(&counting, &mut population, OptimizationDirection::Maximize)
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 5);

    let batch = scheduler
        .evaluate_invalid(&counting, &mut population, OptimizationDirection::Maximize)
        .unwrap();
    assert!(batch.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 5);
}

#[test]
fn test_objective_failure_aborts_run() {
    let failing = |tree: &ExpressionNode| -> anyhow::Result<Evaluation> {
        if tree.size() > 3 {
            anyhow::bail!("model run failed");
        }
        sum_objective(tree)
    };
    let mut config = scenario_config(0.0, 0.0, 1);
    config.evolution.init_depth = emd::DepthRange::new(2, 2);
    let mut engine = EvolutionEngine::new(config, sum_catalog(), failing).unwrap();
    match engine.run(()) {
        Err(EmdError::Evaluation { message, .. }) => assert!(message.contains("model run failed")),
        other => panic!("expected evaluation failure, got {:?}", other.map(|o| o.logbook.len())),
    }
}

#[test]
fn test_worst_fitness_policy_keeps_run_alive() {
    let failing = |tree: &ExpressionNode| -> anyhow::Result<Evaluation> {
        if tree.size() > 3 {
            anyhow::bail!("model run failed");
        }
        sum_objective(tree)
    };
    let mut config = scenario_config(0.5, 0.5, 1);
    config.evolution.init_depth = emd::DepthRange::new(1, 2);
    config.evaluation.on_error = EvaluationErrorPolicy::WorstFitness;
    let mut engine = EvolutionEngine::new(config, sum_catalog(), failing).unwrap();
    let outcome = engine.run(()).unwrap();
    assert_eq!(outcome.logbook.len(), 3);
    for row in outcome.factor_scores.rows() {
        if row.fitness.is_finite() {
            assert!(row.factors.contains_key("leaves"));
        } else {
            assert_eq!(row.fitness, f64::NEG_INFINITY);
            assert!(row.factors.is_empty());
        }
    }
    if let Some(best) = outcome.best.filter(|b| b.fitness().map_or(false, f64::is_finite)) {
        assert!(best.tree().size() <= 3);
    }
}

#[test]
fn test_progress_messages() {
    let (tx, rx) = mpsc::channel();
    let mut engine = EvolutionEngine::new(scenario_config(0.0, 1.0, 3), sum_catalog(), sum_objective).unwrap();
    engine.run(ChannelProgressCallback::new(tx)).unwrap();

    let messages: Vec<ProgressMessage> = rx.iter().collect();
    let starts = messages
        .iter()
        .filter(|m| matches!(m, ProgressMessage::GenerationStart(_)))
        .count();
    let completed: Vec<usize> = messages
        .iter()
        .filter_map(|m| match m {
            ProgressMessage::GenerationComplete { record, .. } => Some(record.generation),
            _ => None,
        })
        .collect();
    assert_eq!(starts, 3);
    assert_eq!(completed, vec![0, 1, 2]);
    assert!(messages.contains(&ProgressMessage::BatchEvaluated { generation: 2, nevals: 4 }));
}

#[test]
fn test_zero_generations_records_initial_population_only() {
    let mut config = scenario_config(0.5, 0.5, 8);
    config.evolution.generations = 0;
    let mut engine = EvolutionEngine::new(config, sum_catalog(), sum_objective).unwrap();
    let outcome = engine.run(()).unwrap();
    assert_eq!(outcome.logbook.len(), 1);
    assert_eq!(outcome.logbook.records()[0].nevals, 4);
}

#[test]
fn test_mated_single_node_trees_are_rescored() {
    let num = DataType::new("Num");
    let mut leaves = PrimitiveCatalog::new(num.clone());
    leaves.add_terminal(TerminalSpec::constant("const", num, 1i64));

    let mut config = scenario_config(1.0, 0.0, 17);
    config.evolution = config.evolution.with_depth(0, 0);
    let mut engine = EvolutionEngine::new(config, leaves, sum_objective).unwrap();
    let outcome = engine.run(()).unwrap();

    let nevals: Vec<usize> = outcome.logbook.records().iter().map(|r| r.nevals).collect();
    assert_eq!(nevals, vec![4, 4, 4]);
    assert_eq!(outcome.factor_scores.len(), 12);
}
