// shaders.rs - shader stage compilation and program linkage

use std::fmt;

use log::error;

use crate::render::backend::GpuContext;
use crate::utils::error::{PipelineError, Result};

/// Size of the buffer driver info logs are copied into, terminator included.
pub const INFO_LOG_CAPACITY: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn gl_enum(self) -> u32 {
        match self {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Vertex and fragment source text for one program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderSource {
    pub vertex: &'static str,
    pub fragment: &'static str,
}

impl ShaderSource {
    /// Passes NDC positions straight through and fills with a flat orange.
    pub const TRIANGLE: ShaderSource = ShaderSource {
        vertex: r#"#version 330 core
layout (location = 0) in vec3 aPos;
void main() {
    gl_Position = vec4(aPos.x, aPos.y, aPos.z, 1.0);
}
"#,
        fragment: r#"#version 330 core
out vec4 FragColor;
void main() {
    FragColor = vec4(1.0f, 0.5f, 0.2f, 1.0f);
}
"#,
    };
}

/// Cuts a driver info log down to what fits in [`INFO_LOG_CAPACITY`].
pub fn bound_info_log(log: &str) -> String {
    let log = log.trim_end_matches(['\0', '\n', '\r', ' ']);
    let limit = INFO_LOG_CAPACITY - 1;
    if log.len() <= limit {
        return log.to_owned();
    }

    let mut end = limit;
    while !log.is_char_boundary(end) {
        end -= 1;
    }
    log[..end].to_owned()
}

/// One compiled stage. Lives only until it is linked into a program.
pub struct CompiledShader<G: GpuContext> {
    handle: G::Shader,
    stage: ShaderStage,
    log: Option<String>,
}

impl<G: GpuContext> CompiledShader<G> {
    /// Creates and compiles a stage. A compile failure is recorded on the
    /// returned value, only object creation failure is an `Err`.
    pub fn compile(gl: &G, stage: ShaderStage, source: &str) -> Result<Self> {
        let handle = gl
            .create_shader(stage)
            .map_err(PipelineError::resource(stage.name()))?;
        gl.shader_source(handle, source);
        gl.compile_shader(handle);

        let log = if gl.shader_compile_status(handle) {
            None
        } else {
            let log = bound_info_log(&gl.shader_info_log(handle));
            error!("{} shader compilation failed:\n{}", stage, log);
            Some(log)
        };

        Ok(Self { handle, stage, log })
    }

    pub fn handle(&self) -> G::Shader {
        self.handle
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn is_compiled(&self) -> bool {
        self.log.is_none()
    }

    pub fn status(&self) -> Result<()> {
        match &self.log {
            None => Ok(()),
            Some(log) => Err(PipelineError::ShaderCompile {
                stage: self.stage,
                log: log.clone(),
            }),
        }
    }

    pub fn delete(self, gl: &G) {
        gl.delete_shader(self.handle);
    }
}

/// A linked program object.
pub struct ShaderProgram<G: GpuContext> {
    handle: G::Program,
    log: Option<String>,
}

impl<G: GpuContext> ShaderProgram<G> {
    /// Links both stages into a new program, then detaches and deletes them
    /// whether or not the link succeeded.
    pub fn link(
        gl: &G,
        vertex: CompiledShader<G>,
        fragment: CompiledShader<G>,
    ) -> Result<Self> {
        let handle = match gl.create_program() {
            Ok(handle) => handle,
            Err(reason) => {
                vertex.delete(gl);
                fragment.delete(gl);
                return Err(PipelineError::Resource {
                    object: "program",
                    reason,
                });
            }
        };

        gl.attach_shader(handle, vertex.handle);
        gl.attach_shader(handle, fragment.handle);
        gl.link_program(handle);

        let log = if gl.program_link_status(handle) {
            None
        } else {
            let log = bound_info_log(&gl.program_info_log(handle));
            error!("Shader program linking failed:\n{}", log);
            Some(log)
        };

        for stage in [vertex, fragment] {
            gl.detach_shader(handle, stage.handle);
            stage.delete(gl);
        }

        Ok(Self { handle, log })
    }

    pub fn handle(&self) -> G::Program {
        self.handle
    }

    pub fn is_linked(&self) -> bool {
        self.log.is_none()
    }

    pub fn status(&self) -> Result<()> {
        match &self.log {
            None => Ok(()),
            Some(log) => Err(PipelineError::ProgramLink { log: log.clone() }),
        }
    }

    pub fn delete(self, gl: &G) {
        gl.delete_program(self.handle);
    }
}
