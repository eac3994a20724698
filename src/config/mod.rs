pub mod traits;
pub mod evolution;
pub mod evaluation;
pub mod manager;

pub use manager::{ConfigManager, AppConfig};
pub use evolution::{DepthRange, EvolutionConfig};
pub use evaluation::{EvaluationConfig, EvaluationErrorPolicy};
pub use traits::ConfigSection;
