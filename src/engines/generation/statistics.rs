use super::genome::Individual;
use crate::engines::evaluation::FactorRecord;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

/// Aggregate fitness of one generation's population
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub generation: usize,
    /// Objective calls made in this generation
    pub nevals: usize,
    pub avg: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl GenerationRecord {
    /// Population (not sample) statistics over every evaluated individual
    pub fn compile(generation: usize, nevals: usize, population: &[Individual]) -> Self {
        let values: Vec<f64> = population.iter().filter_map(Individual::fitness).collect();
        if values.is_empty() {
            return Self {
                generation,
                nevals,
                avg: f64::NAN,
                std: f64::NAN,
                min: f64::NAN,
                max: f64::NAN,
            };
        }
        let n = values.len() as f64;
        let avg = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / n;
        Self {
            generation,
            nevals,
            avg,
            std: var.sqrt(),
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

const HEADER: [&str; 6] = ["gen", "nevals", "avg", "std", "min", "max"];

/// Append-only per-generation log of a run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunLog {
    records: Vec<GenerationRecord>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, record: GenerationRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[GenerationRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&GenerationRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn header() -> String {
        HEADER.join("\t")
    }

    pub fn format_row(record: &GenerationRecord) -> String {
        format!(
            "{}\t{}\t{:.6}\t{:.6}\t{:.6}\t{:.6}",
            record.generation, record.nevals, record.avg, record.std, record.min, record.max
        )
    }

    /// Whole log as tab-separated text, header first
    pub fn stream(&self) -> String {
        let mut out = Self::header();
        for record in &self.records {
            let _ = write!(out, "\n{}", Self::format_row(record));
        }
        out
    }
}

/// One evaluated individual's auxiliary record, tagged with its generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorScoreRow {
    pub generation: usize,
    pub fitness: f64,
    pub genome: String,
    pub factors: FactorRecord,
}

/// Append-only table of every objective call in the run, in evaluation order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FactorScoreTable {
    rows: Vec<FactorScoreRow>,
}

impl FactorScoreTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: FactorScoreRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[FactorScoreRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn generation(&self, generation: usize) -> impl Iterator<Item = &FactorScoreRow> {
        self.rows.iter().filter(move |r| r.generation == generation)
    }

    /// All rows as a JSON array of objects. Non-finite fitness values
    /// (e.g. worst-fitness substitutes) are written as `null`.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.rows)?)
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
