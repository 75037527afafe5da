use log::{debug, info, trace, warn};

use crate::config::rendering::{FailurePolicy, RenderConfig};
use crate::render::backend::GpuContext;
use crate::render::mesh::{GeometryBuffer, TRIANGLE};
use crate::render::shaders::{CompiledShader, ShaderProgram, ShaderSource, ShaderStage};
use crate::utils::error::{PipelineError, Result};

/// Handles owned by an initialized pipeline.
pub struct Ready<G: GpuContext> {
    pub program: G::Program,
    pub geometry: GeometryBuffer<G>,
    /// False when a stage failed to compile or the program failed to link and
    /// the pipeline carried on anyway.
    pub valid: bool,
}

impl<G: GpuContext> Clone for Ready<G> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<G: GpuContext> Copy for Ready<G> {}

impl<G: GpuContext> PartialEq for Ready<G> {
    fn eq(&self, other: &Self) -> bool {
        self.program == other.program && self.geometry == other.geometry && self.valid == other.valid
    }
}

impl<G: GpuContext> std::fmt::Debug for Ready<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ready")
            .field("program", &self.program)
            .field("geometry", &self.geometry)
            .field("valid", &self.valid)
            .finish()
    }
}

enum State<G: GpuContext> {
    Uninitialized,
    Ready {
        program: ShaderProgram<G>,
        geometry: GeometryBuffer<G>,
        /// First compile or link failure a lenient initialize carried past.
        error: Option<PipelineError>,
    },
    Released,
}

/// Compiles the shader pair, uploads the triangle and draws it.
///
/// The host calls [`initialize`](Self::initialize) once with the GL context
/// current, [`paint`](Self::paint) every frame, [`resize`](Self::resize) on
/// surface changes and [`teardown`](Self::teardown) before the context goes
/// away. All calls come from the thread that owns the context.
pub struct ShaderPipeline<G: GpuContext> {
    gl: G,
    config: RenderConfig,
    sources: ShaderSource,
    state: State<G>,
    surface_size: Option<(u32, u32)>,
}

impl<G: GpuContext> ShaderPipeline<G> {
    pub fn new(gl: G, config: RenderConfig) -> Self {
        Self::with_sources(gl, config, ShaderSource::TRIANGLE)
    }

    pub fn with_sources(gl: G, config: RenderConfig, sources: ShaderSource) -> Self {
        Self {
            gl,
            config,
            sources,
            state: State::Uninitialized,
            surface_size: None,
        }
    }

    pub fn gl(&self) -> &G {
        &self.gl
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, State::Ready { .. })
    }

    pub fn ready(&self) -> Option<Ready<G>> {
        match &self.state {
            State::Ready {
                program,
                geometry,
                error,
            } => Some(Ready {
                program: program.handle(),
                geometry: *geometry,
                valid: error.is_none(),
            }),
            _ => None,
        }
    }

    /// Last size passed to [`resize`](Self::resize).
    pub fn surface_size(&self) -> Option<(u32, u32)> {
        self.surface_size
    }

    /// Compiles, links and uploads.
    ///
    /// Any compile or link failure is returned. Under
    /// [`FailurePolicy::LogAndContinue`] the pipeline is still left Ready with
    /// `valid == false`. Under [`FailurePolicy::Strict`] every object created
    /// so far is released and the pipeline stays uninitialized. Calling it
    /// again on a Ready pipeline returns the same outcome without touching
    /// the GPU.
    pub fn initialize(&mut self) -> Result<Ready<G>> {
        match &self.state {
            State::Uninitialized => {}
            State::Ready { error, .. } => {
                warn!("Shader pipeline is already initialized");
                if let Some(err) = error {
                    return Err(err.clone());
                }
                return self.ready().ok_or(PipelineError::Released);
            }
            State::Released => return Err(PipelineError::Released),
        }

        let mut first_error = None;

        let vertex = CompiledShader::compile(&self.gl, ShaderStage::Vertex, self.sources.vertex)?;
        if let Err(err) = self.admit(vertex.status(), &mut first_error) {
            vertex.delete(&self.gl);
            return Err(err);
        }

        let fragment =
            match CompiledShader::compile(&self.gl, ShaderStage::Fragment, self.sources.fragment) {
                Ok(fragment) => fragment,
                Err(err) => {
                    vertex.delete(&self.gl);
                    return Err(err);
                }
            };
        if let Err(err) = self.admit(fragment.status(), &mut first_error) {
            vertex.delete(&self.gl);
            fragment.delete(&self.gl);
            return Err(err);
        }

        let program = ShaderProgram::link(&self.gl, vertex, fragment)?;
        if let Err(err) = self.admit(program.status(), &mut first_error) {
            program.delete(&self.gl);
            return Err(err);
        }

        let geometry = match GeometryBuffer::upload(&self.gl, &TRIANGLE) {
            Ok(geometry) => geometry,
            Err(err) => {
                program.delete(&self.gl);
                return Err(err);
            }
        };

        let ready = Ready {
            program: program.handle(),
            geometry,
            valid: first_error.is_none(),
        };
        self.state = State::Ready {
            program,
            geometry,
            error: first_error.clone(),
        };

        match first_error {
            None => {
                info!(
                    "Shader pipeline ready ({} vertices uploaded)",
                    geometry.vertex_count()
                );
                Ok(ready)
            }
            Some(err) => {
                warn!("Shader pipeline continuing without a usable program");
                Err(err)
            }
        }
    }

    /// Records a stage failure. Only returns `Err` when the policy is strict.
    fn admit(
        &self,
        status: Result<()>,
        first_error: &mut Option<PipelineError>,
    ) -> Result<()> {
        let Err(err) = status else {
            return Ok(());
        };
        match self.config.failure_policy {
            FailurePolicy::Strict => Err(err),
            FailurePolicy::LogAndContinue => {
                if first_error.is_none() {
                    *first_error = Some(err);
                }
                Ok(())
            }
        }
    }

    /// Binds the program and vertex array and draws the triangle.
    pub fn draw(&self) {
        match &self.state {
            State::Ready {
                program, geometry, ..
            } => {
                self.gl.use_program(Some(program.handle()));
                self.gl.bind_vertex_array(Some(geometry.vertex_array()));
                self.gl.draw_triangles(0, geometry.vertex_count());
            }
            _ => trace!("Skipping draw, shader pipeline is not ready"),
        }
    }

    /// Clears the colour buffer and draws.
    pub fn paint(&self) {
        self.gl.clear_color(self.config.effective_clear_color());
        self.gl.clear_color_buffer();
        self.draw();
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        debug!("Surface resized to {}x{}", width, height);
        self.surface_size = Some((width, height));
    }

    /// Deletes the program and geometry. Safe to call any number of times.
    pub fn teardown(&mut self) {
        match std::mem::replace(&mut self.state, State::Released) {
            State::Ready {
                program, geometry, ..
            } => {
                program.delete(&self.gl);
                geometry.delete(&self.gl);
                info!("Shader pipeline resources released");
            }
            State::Uninitialized | State::Released => {}
        }
    }
}

impl<G: GpuContext> Drop for ShaderPipeline<G> {
    fn drop(&mut self) {
        self.teardown();
    }
}
