pub mod backend;
pub mod mesh;
pub mod pipeline;
pub mod shaders;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{GlowContext, GpuContext};
pub use mesh::{GeometryBuffer, Vertex, TRIANGLE};
pub use pipeline::{Ready, ShaderPipeline};
pub use shaders::{ShaderSource, ShaderStage};
