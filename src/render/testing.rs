//! A `GpuContext` that records every call and keeps just enough object state
//! to answer status queries. Compilation fails for sources containing an
//! `#error` directive or lacking `void main`. Linking fails when a stage did
//! not compile or after `refuse_link`.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::render::backend::GpuContext;
use crate::render::mesh::VertexAttribute;
use crate::render::shaders::ShaderStage;

#[derive(Debug, Clone, PartialEq)]
pub enum GlCall {
    CreateShader(ShaderStage),
    ShaderSource(u32),
    CompileShader(u32),
    DeleteShader(u32),
    CreateProgram,
    AttachShader(u32, u32),
    DetachShader(u32, u32),
    LinkProgram(u32),
    UseProgram(Option<u32>),
    DeleteProgram(u32),
    CreateVertexArray,
    BindVertexArray(Option<u32>),
    DeleteVertexArray(u32),
    CreateBuffer,
    BindArrayBuffer(Option<u32>),
    BufferData(usize),
    DeleteBuffer(u32),
    VertexAttribPointer(VertexAttribute),
    EnableVertexAttribArray(u32),
    Viewport(i32, i32, i32, i32),
    ClearColor([f32; 4]),
    Clear,
    DrawTriangles(i32, i32),
}

struct FakeShader {
    source: String,
    compiled: bool,
}

#[derive(Default)]
struct FakeProgram {
    attached: Vec<u32>,
    linked: bool,
}

#[derive(Default)]
struct State {
    next_id: u32,
    calls: Vec<GlCall>,
    shaders: HashMap<u32, FakeShader>,
    programs: HashMap<u32, FakeProgram>,
    vertex_arrays: HashSet<u32>,
    buffers: HashMap<u32, Vec<u8>>,
    bound_array_buffer: Option<u32>,
    refused: HashSet<&'static str>,
    refuse_link: bool,
    double_frees: usize,
}

impl State {
    fn alloc(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

/// Clones share one recorded state, so a test can keep a handle to a fake it
/// moved into a pipeline.
#[derive(Clone, Default)]
pub struct RecordingGl {
    state: Rc<RefCell<State>>,
}

impl RecordingGl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next and all later `create_*` calls for `object` fail.
    /// `object` is one of `shader`, `program`, `vertex array` or `buffer`.
    pub fn refuse_create(&self, object: &'static str) {
        self.state.borrow_mut().refused.insert(object);
    }

    /// Makes every later link fail even when both stages compiled.
    pub fn refuse_link(&self) {
        self.state.borrow_mut().refuse_link = true;
    }

    pub fn calls(&self) -> Vec<GlCall> {
        self.state.borrow().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.borrow().calls.len()
    }

    pub fn calls_since(&self, mark: usize) -> Vec<GlCall> {
        self.state.borrow().calls[mark..].to_vec()
    }

    pub fn buffer_floats(&self, buffer: u32) -> Option<Vec<f32>> {
        let state = self.state.borrow();
        let bytes = state.buffers.get(&buffer)?;
        Some(
            bytes
                .chunks_exact(4)
                .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
                .collect(),
        )
    }

    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn live_objects(&self) -> usize {
        let state = self.state.borrow();
        state.shaders.len() + state.programs.len() + state.vertex_arrays.len() + state.buffers.len()
    }

    pub fn double_frees(&self) -> usize {
        self.state.borrow().double_frees
    }

    fn record(&self, call: GlCall) {
        self.state.borrow_mut().calls.push(call);
    }

    fn create(&self, object: &'static str, call: GlCall) -> Result<u32, String> {
        let mut state = self.state.borrow_mut();
        state.calls.push(call);
        if state.refused.contains(object) {
            return Err(format!("out of {object} names"));
        }
        Ok(state.alloc())
    }
}

impl GpuContext for RecordingGl {
    type Shader = u32;
    type Program = u32;
    type VertexArray = u32;
    type Buffer = u32;

    fn create_shader(&self, stage: ShaderStage) -> Result<u32, String> {
        let id = self.create("shader", GlCall::CreateShader(stage))?;
        self.state.borrow_mut().shaders.insert(
            id,
            FakeShader {
                source: String::new(),
                compiled: false,
            },
        );
        Ok(id)
    }

    fn shader_source(&self, shader: u32, source: &str) {
        let mut state = self.state.borrow_mut();
        state.calls.push(GlCall::ShaderSource(shader));
        if let Some(s) = state.shaders.get_mut(&shader) {
            s.source = source.to_owned();
        }
    }

    fn compile_shader(&self, shader: u32) {
        let mut state = self.state.borrow_mut();
        state.calls.push(GlCall::CompileShader(shader));
        if let Some(s) = state.shaders.get_mut(&shader) {
            s.compiled = !s.source.contains("#error") && s.source.contains("void main");
        }
    }

    fn shader_compile_status(&self, shader: u32) -> bool {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .map_or(false, |s| s.compiled)
    }

    fn shader_info_log(&self, shader: u32) -> String {
        let state = self.state.borrow();
        match state.shaders.get(&shader) {
            Some(s) if s.source.contains("#error") => "0:2(1): error: #error directive\n".into(),
            Some(s) if !s.compiled => "0:1(1): error: missing main()\n".into(),
            _ => String::new(),
        }
    }

    fn delete_shader(&self, shader: u32) {
        let mut state = self.state.borrow_mut();
        state.calls.push(GlCall::DeleteShader(shader));
        if state.shaders.remove(&shader).is_none() {
            state.double_frees += 1;
        }
    }

    fn create_program(&self) -> Result<u32, String> {
        let id = self.create("program", GlCall::CreateProgram)?;
        self.state
            .borrow_mut()
            .programs
            .insert(id, FakeProgram::default());
        Ok(id)
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        let mut state = self.state.borrow_mut();
        state.calls.push(GlCall::AttachShader(program, shader));
        if let Some(p) = state.programs.get_mut(&program) {
            p.attached.push(shader);
        }
    }

    fn detach_shader(&self, program: u32, shader: u32) {
        let mut state = self.state.borrow_mut();
        state.calls.push(GlCall::DetachShader(program, shader));
        if let Some(p) = state.programs.get_mut(&program) {
            p.attached.retain(|&s| s != shader);
        }
    }

    fn link_program(&self, program: u32) {
        let mut state = self.state.borrow_mut();
        state.calls.push(GlCall::LinkProgram(program));
        let attached = match state.programs.get(&program) {
            Some(p) => p.attached.clone(),
            None => return,
        };
        let linked = !state.refuse_link
            && attached.len() == 2
            && attached
                .iter()
                .all(|s| state.shaders.get(s).map_or(false, |s| s.compiled));
        if let Some(p) = state.programs.get_mut(&program) {
            p.linked = linked;
        }
    }

    fn program_link_status(&self, program: u32) -> bool {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map_or(false, |p| p.linked)
    }

    fn program_info_log(&self, program: u32) -> String {
        if self.program_link_status(program) {
            String::new()
        } else {
            "error: program failed to link\n".into()
        }
    }

    fn use_program(&self, program: Option<u32>) {
        self.record(GlCall::UseProgram(program));
    }

    fn delete_program(&self, program: u32) {
        let mut state = self.state.borrow_mut();
        state.calls.push(GlCall::DeleteProgram(program));
        if state.programs.remove(&program).is_none() {
            state.double_frees += 1;
        }
    }

    fn create_vertex_array(&self) -> Result<u32, String> {
        let id = self.create("vertex array", GlCall::CreateVertexArray)?;
        self.state.borrow_mut().vertex_arrays.insert(id);
        Ok(id)
    }

    fn bind_vertex_array(&self, vertex_array: Option<u32>) {
        self.record(GlCall::BindVertexArray(vertex_array));
    }

    fn delete_vertex_array(&self, vertex_array: u32) {
        let mut state = self.state.borrow_mut();
        state.calls.push(GlCall::DeleteVertexArray(vertex_array));
        if !state.vertex_arrays.remove(&vertex_array) {
            state.double_frees += 1;
        }
    }

    fn create_buffer(&self) -> Result<u32, String> {
        let id = self.create("buffer", GlCall::CreateBuffer)?;
        self.state.borrow_mut().buffers.insert(id, Vec::new());
        Ok(id)
    }

    fn bind_array_buffer(&self, buffer: Option<u32>) {
        let mut state = self.state.borrow_mut();
        state.calls.push(GlCall::BindArrayBuffer(buffer));
        state.bound_array_buffer = buffer;
    }

    fn upload_static_array_buffer(&self, data: &[u8]) {
        let mut state = self.state.borrow_mut();
        state.calls.push(GlCall::BufferData(data.len()));
        if let Some(bound) = state.bound_array_buffer {
            if let Some(contents) = state.buffers.get_mut(&bound) {
                *contents = data.to_vec();
            }
        }
    }

    fn delete_buffer(&self, buffer: u32) {
        let mut state = self.state.borrow_mut();
        state.calls.push(GlCall::DeleteBuffer(buffer));
        if state.buffers.remove(&buffer).is_none() {
            state.double_frees += 1;
        }
        if state.bound_array_buffer == Some(buffer) {
            state.bound_array_buffer = None;
        }
    }

    fn vertex_attrib_pointer_f32(&self, attribute: &VertexAttribute) {
        self.record(GlCall::VertexAttribPointer(*attribute));
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        self.record(GlCall::EnableVertexAttribArray(index));
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.record(GlCall::Viewport(x, y, width, height));
    }

    fn clear_color(&self, rgba: [f32; 4]) {
        self.record(GlCall::ClearColor(rgba));
    }

    fn clear_color_buffer(&self) {
        self.record(GlCall::Clear);
    }

    fn draw_triangles(&self, first: i32, count: i32) {
        self.record(GlCall::DrawTriangles(first, count));
    }
}
