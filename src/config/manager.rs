use super::{
    evaluation::EvaluationConfig,
    evolution::EvolutionConfig,
    traits::ConfigSection,
};
use crate::error::EmdError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

/// Prefix of environment overrides, e.g. `EMD__EVOLUTION__POPULATION_SIZE=50`
pub const ENV_PREFIX: &str = "EMD";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub evolution: EvolutionConfig,
    pub evaluation: EvaluationConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), EmdError> {
        self.evolution.validate()?;
        self.evaluation.validate()?;
        Ok(())
    }

    /// Read a TOML or JSON file (picked by extension) with environment overrides on top
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, EmdError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(AppConfig::default())),
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<(), EmdError> {
        let config = AppConfig::from_file(&path)?;
        log::debug!(
            "Loaded [{}] and [{}] from {}",
            EvolutionConfig::section_name(),
            EvaluationConfig::section_name(),
            path.as_ref().display()
        );
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), EmdError> {
        let config = self.get();
        let toml_str = toml::to_string_pretty(&config)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn get(&self) -> AppConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply `f` to a copy and commit it only if the result validates
    pub fn update<F>(&self, f: F) -> Result<(), EmdError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut guard = self.config.write().unwrap_or_else(PoisonError::into_inner);
        let mut candidate = guard.clone();
        f(&mut candidate);
        candidate.validate()?;
        *guard = candidate;
        Ok(())
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EvaluationErrorPolicy;
    use crate::engines::generation::OptimizationDirection;
    use std::io::Write;

    #[test]
    fn test_load_toml_sections() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[evolution]
population_size = 40
generations = 3
direction = "maximize"
init_depth = {{ min = 1, max = 4 }}

[evaluation]
workers = 2
on_error = "worst_fitness"
"#
        )
        .unwrap();

        let manager = ConfigManager::new();
        manager.load_from_file(file.path()).unwrap();
        let config = manager.get();
        assert_eq!(config.evolution.population_size, 40);
        assert_eq!(config.evolution.generations, 3);
        assert_eq!(config.evolution.direction, OptimizationDirection::Maximize);
        assert_eq!(config.evolution.init_depth.max, 4);
        assert_eq!(config.evolution.mutation_depth.max, 3);
        assert_eq!(config.evaluation.workers, Some(2));
        assert_eq!(config.evaluation.on_error, EvaluationErrorPolicy::WorstFitness);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"evolution": {{"population_size": 0}}}}"#).unwrap();
        let manager = ConfigManager::new();
        assert!(manager.load_from_file(file.path()).is_err());
        assert_eq!(manager.get().evolution.population_size, 5);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("emd.toml");
        let manager = ConfigManager::new();
        manager
            .update(|c| {
                c.evolution.seed = Some(17);
                c.evolution.crossover_rate = 0.5;
            })
            .unwrap();
        manager.save_to_file(&path).unwrap();

        let reloaded = ConfigManager::new();
        reloaded.load_from_file(&path).unwrap();
        assert_eq!(reloaded.get().evolution.seed, Some(17));
        assert_eq!(reloaded.get().evolution.crossover_rate, 0.5);
    }

    #[test]
    fn test_update_rejects_invalid_change() {
        let manager = ConfigManager::new();
        let result = manager.update(|c| c.evolution.tournament_size = 0);
        assert!(result.is_err());
        assert_eq!(manager.get().evolution.tournament_size, 3);
    }

    #[test]
    fn test_environment_overrides_file() {
        // no other test reads this key back from a file
        const KEY: &str = "EMD__EVOLUTION__HALL_OF_FAME_SIZE";
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[evolution]\npopulation_size = 7\nhall_of_fame_size = 2").unwrap();

        let previous = std::env::var_os(KEY);
        std::env::set_var(KEY, "4");
        let loaded = AppConfig::from_file(file.path());
        match previous {
            Some(value) => std::env::set_var(KEY, value),
            None => std::env::remove_var(KEY),
        }

        let config = loaded.unwrap();
        assert_eq!(config.evolution.hall_of_fame_size, 4);
        assert_eq!(config.evolution.population_size, 7);
    }
}
