pub mod config;
pub mod render;
pub mod utils;

// Re-export commonly used types
pub use config::core::AppConfig;
pub use config::rendering::{FailurePolicy, RenderConfig};
pub use render::backend::{GlowContext, GpuContext};
pub use render::pipeline::{Ready, ShaderPipeline};
pub use render::shaders::{ShaderSource, ShaderStage};
pub use utils::error::PipelineError;
