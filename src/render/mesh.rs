use bytemuck::{Pod, Zeroable};

use crate::render::backend::GpuContext;
use crate::utils::error::{PipelineError, Result};

/// A position in normalized device coordinates.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: [x, y, z],
        }
    }
}

pub const TRIANGLE: [Vertex; 3] = [
    Vertex::new(-0.5, -0.5, 0.0),
    Vertex::new(0.5, -0.5, 0.0),
    Vertex::new(0.0, 0.5, 0.0),
];

/// Layout of one float vertex attribute inside the bound array buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    pub components: i32,
    pub normalized: bool,
    pub stride: i32,
    pub offset: i32,
}

impl VertexAttribute {
    /// `layout (location = 0) in vec3 aPos`, tightly packed.
    pub const POSITION: VertexAttribute = VertexAttribute {
        location: 0,
        components: 3,
        normalized: false,
        stride: std::mem::size_of::<Vertex>() as i32,
        offset: 0,
    };
}

/// Vertex array plus the buffer backing it.
pub struct GeometryBuffer<G: GpuContext> {
    vertex_array: G::VertexArray,
    vertex_buffer: G::Buffer,
    vertex_count: i32,
}

impl<G: GpuContext> GeometryBuffer<G> {
    pub fn upload(gl: &G, vertices: &[Vertex]) -> Result<Self> {
        let vertex_array = gl
            .create_vertex_array()
            .map_err(PipelineError::resource("vertex array"))?;
        gl.bind_vertex_array(Some(vertex_array));

        let vertex_buffer = match gl.create_buffer() {
            Ok(buffer) => buffer,
            Err(reason) => {
                gl.bind_vertex_array(None);
                gl.delete_vertex_array(vertex_array);
                return Err(PipelineError::Resource {
                    object: "vertex buffer",
                    reason,
                });
            }
        };
        gl.bind_array_buffer(Some(vertex_buffer));
        gl.upload_static_array_buffer(bytemuck::cast_slice(vertices));

        let attribute = VertexAttribute::POSITION;
        gl.vertex_attrib_pointer_f32(&attribute);
        gl.enable_vertex_attrib_array(attribute.location);

        gl.bind_vertex_array(None);

        Ok(Self {
            vertex_array,
            vertex_buffer,
            vertex_count: vertices.len() as i32,
        })
    }

    pub fn vertex_array(&self) -> G::VertexArray {
        self.vertex_array
    }

    pub fn vertex_buffer(&self) -> G::Buffer {
        self.vertex_buffer
    }

    pub fn vertex_count(&self) -> i32 {
        self.vertex_count
    }

    pub fn delete(self, gl: &G) {
        gl.delete_vertex_array(self.vertex_array);
        gl.delete_buffer(self.vertex_buffer);
    }
}

impl<G: GpuContext> Clone for GeometryBuffer<G> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<G: GpuContext> Copy for GeometryBuffer<G> {}

impl<G: GpuContext> PartialEq for GeometryBuffer<G> {
    fn eq(&self, other: &Self) -> bool {
        self.vertex_array == other.vertex_array
            && self.vertex_buffer == other.vertex_buffer
            && self.vertex_count == other.vertex_count
    }
}

impl<G: GpuContext> std::fmt::Debug for GeometryBuffer<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeometryBuffer")
            .field("vertex_array", &self.vertex_array)
            .field("vertex_buffer", &self.vertex_buffer)
            .field("vertex_count", &self.vertex_count)
            .finish()
    }
}
