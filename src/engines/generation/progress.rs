use super::evolution_engine::ProgressCallback;
use super::statistics::{GenerationRecord, RunLog};

/// Writes the run log stream through `log`, one row per generation
pub struct LogProgressCallback;

impl ProgressCallback for LogProgressCallback {
    fn on_generation_start(&mut self, generation: usize) {
        if generation == 0 {
            log::info!("{}", RunLog::header());
        }
    }

    fn on_batch_evaluated(&mut self, generation: usize, nevals: usize) {
        log::debug!("Generation {}: {} evaluations", generation, nevals);
    }

    fn on_generation_complete(&mut self, record: &GenerationRecord, best_fitness: Option<f64>) {
        log::info!("{}", RunLog::format_row(record));
        if let Some(best) = best_fitness {
            log::debug!("Best so far: {:.6}", best);
        }
    }
}

// For handing progress to another thread (e.g. a UI)
pub struct ChannelProgressCallback {
    sender: std::sync::mpsc::Sender<ProgressMessage>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressMessage {
    GenerationStart(usize),
    BatchEvaluated { generation: usize, nevals: usize },
    GenerationComplete { record: GenerationRecord, best_fitness: Option<f64> },
}

impl ChannelProgressCallback {
    pub fn new(sender: std::sync::mpsc::Sender<ProgressMessage>) -> Self {
        Self { sender }
    }
}

impl ProgressCallback for ChannelProgressCallback {
    fn on_generation_start(&mut self, generation: usize) {
        let _ = self.sender.send(ProgressMessage::GenerationStart(generation));
    }

    fn on_batch_evaluated(&mut self, generation: usize, nevals: usize) {
        let _ = self.sender.send(ProgressMessage::BatchEvaluated { generation, nevals });
    }

    fn on_generation_complete(&mut self, record: &GenerationRecord, best_fitness: Option<f64>) {
        let _ = self.sender.send(ProgressMessage::GenerationComplete {
            record: *record,
            best_fitness,
        });
    }
}

/// No-op
impl ProgressCallback for () {
    fn on_generation_start(&mut self, _generation: usize) {}

    fn on_batch_evaluated(&mut self, _generation: usize, _nevals: usize) {}

    fn on_generation_complete(&mut self, _record: &GenerationRecord, _best_fitness: Option<f64>) {}
}
