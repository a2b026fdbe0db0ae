use thiserror::Error;

/// Errors that escape a `simulate` call or a data/config load.
///
/// In-battle faults never surface here; they degrade to diagnostic log lines.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("entity not found: {slug}")]
    DataNotFound { slug: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;

/// Runtime fault inside a single action. Caught by the dispatcher, logged, and
/// treated as a no-op for that action only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("invalid parameter `{field}`: {reason}")]
    InvalidParameter { field: &'static str, reason: String },

    #[error("magnitude overflow while scaling `{field}`")]
    Overflow { field: &'static str },
}
