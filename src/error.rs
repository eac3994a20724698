use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmdError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid tree: {0}")]
    InvalidType(String),

    #[error("Evaluation of individual {index} failed: {message}")]
    Evaluation { index: usize, message: String },

    #[error("Worker pool error: {0}")]
    ThreadPool(String),

    #[error("Run cancelled before generation {generation}")]
    Cancelled { generation: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Config source error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, EmdError>;
