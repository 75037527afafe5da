use thiserror::Error;

use crate::render::shaders::ShaderStage;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("{stage} shader compilation failed: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("Program linking failed: {log}")]
    ProgramLink { log: String },

    #[error("Failed to create {object}: {reason}")]
    Resource { object: &'static str, reason: String },

    #[error("Pipeline resources were already released")]
    Released,
}

impl PipelineError {
    pub(crate) fn resource(object: &'static str) -> impl FnOnce(String) -> Self {
        move |reason| PipelineError::Resource { object, reason }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
