// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! An in-memory model of the GL driver state.
//!
//! [`HeadlessDevice`] keeps object tables, bind points and a log of the
//! state-changing calls this crate issues. It compiles any shader whose
//! source declares `main` and whose `#version` does not exceed
//! [`HeadlessDevice::with_max_glsl_version`], and it reflects uniforms at
//! link time by scanning the attached sources for plain `uniform`
//! declarations. That is enough to exercise every resource path without a
//! GPU.

use super::format::{pixel_buffer_len, FilterMode, InternalFormat};
use super::gl_type;
use super::types::*;
use super::GlDevice;
use crate::error::DeviceError;
use regex::Regex;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

/// A state-changing call recorded by [`HeadlessDevice`].
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    /// `bind_framebuffer`.
    BindFramebuffer(Option<GlHandle>),
    /// `framebuffer_texture_2d`.
    FramebufferTexture {
        /// Attachment point.
        attachment: FramebufferAttachment,
        /// Attached texture.
        texture: Option<GlHandle>,
    },
    /// `draw_buffers`.
    DrawBuffers(Vec<FramebufferAttachment>),
    /// `set_capability`.
    SetCapability(Capability, bool),
    /// `set_clear_color`.
    SetClearColor([f32; 4]),
    /// `clear`.
    Clear(ClearMask),
    /// `clear_color_buffer`.
    ClearColorBuffer {
        /// Draw buffer index.
        draw_buffer: u32,
        /// Clear value.
        rgba: [f32; 4],
    },
    /// `clear_depth_buffer`.
    ClearDepthBuffer(f32),
    /// `set_viewport`.
    Viewport {
        /// Left edge.
        x: i32,
        /// Bottom edge.
        y: i32,
        /// Width.
        width: i32,
        /// Height.
        height: i32,
    },
    /// `use_program`.
    UseProgram(Option<GlHandle>),
    /// `bind_texture`, with the unit active at the time.
    BindTexture {
        /// Active texture unit.
        unit: u32,
        /// Bound texture.
        texture: Option<GlHandle>,
    },
    /// `bind_vertex_array`.
    BindVertexArray(Option<GlHandle>),
    /// `bind_buffer_base`.
    BindBufferBase {
        /// Target.
        target: BufferTarget,
        /// Binding index.
        index: u32,
        /// Bound buffer.
        buffer: Option<GlHandle>,
    },
    /// `draw_arrays`.
    DrawArrays {
        /// Topology.
        mode: PrimitiveMode,
        /// First vertex.
        first: i32,
        /// Vertex count.
        count: i32,
    },
    /// `dispatch_compute`.
    DispatchCompute(u32, u32, u32),
    /// `memory_barrier`.
    MemoryBarrier(MemoryBarrier),
}

/// A uniform found while linking, with its assigned base location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectedUniform {
    /// Declared name, without any array suffix.
    pub name: String,
    /// Array length, 1 for non-arrays.
    pub size: i32,
    /// GL type code.
    pub gl_type: u32,
    /// Location of element 0.
    pub location: u32,
}

/// A vertex attribute as described on a vertex array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexAttribRecord {
    /// Attribute index.
    pub index: u32,
    /// Floats per vertex.
    pub components: u32,
    /// Stride in bytes.
    pub stride: u32,
    /// Offset in bytes.
    pub offset: u32,
    /// Whether the attribute array is enabled.
    pub enabled: bool,
    /// The array buffer bound when the attribute was described.
    pub buffer: Option<GlHandle>,
}

/// Link state of a program object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramSnapshot {
    /// Attached shader objects, in attach order.
    pub attached: Vec<GlHandle>,
    /// Result of the last link.
    pub linked: bool,
    /// Uniforms reflected by the last successful link.
    pub uniforms: Vec<ReflectedUniform>,
}

#[derive(Debug)]
struct ShaderRecord {
    source: String,
    compiled: bool,
    info_log: String,
}

#[derive(Debug, Default)]
struct ProgramRecord {
    snapshot: ProgramSnapshot,
    info_log: String,
    values: HashMap<UniformLocation, UniformValue>,
}

#[derive(Debug, Default)]
struct TextureRecord {
    width: u32,
    height: u32,
    internal_format: Option<InternalFormat>,
    pixels: Option<Vec<u8>>,
    filter: Option<FilterMode>,
}

#[derive(Debug, Default)]
struct FramebufferRecord {
    attachments: BTreeMap<FramebufferAttachment, GlHandle>,
    draw_buffers: Vec<FramebufferAttachment>,
}

#[derive(Debug, Default)]
struct BufferRecord {
    data: Vec<u8>,
    usage: Option<BufferUsage>,
}

#[derive(Debug)]
struct HeadlessState {
    next_name: u32,
    reuse_names: bool,
    free_names: Vec<GlHandle>,
    max_glsl_version: u32,
    live: HashMap<GlHandle, ObjectKind>,
    allocations: usize,
    deletions: HashMap<GlHandle, u32>,
    shaders: HashMap<GlHandle, ShaderRecord>,
    programs: HashMap<GlHandle, ProgramRecord>,
    textures: HashMap<GlHandle, TextureRecord>,
    framebuffers: HashMap<GlHandle, FramebufferRecord>,
    buffers: HashMap<GlHandle, BufferRecord>,
    vertex_arrays: HashMap<GlHandle, Vec<VertexAttribRecord>>,
    current_program: Option<GlHandle>,
    active_unit: u32,
    texture_units: HashMap<u32, GlHandle>,
    bound_framebuffer: Option<GlHandle>,
    bound_vertex_array: Option<GlHandle>,
    bound_buffers: HashMap<BufferTarget, GlHandle>,
    indexed_bindings: HashMap<(BufferTarget, u32), GlHandle>,
    capabilities: HashMap<Capability, bool>,
    clear_color: [f32; 4],
    forced_status: Option<FramebufferStatus>,
    fail_allocations: usize,
    allocations_before_failure: usize,
    calls: Vec<DeviceCall>,
}

impl Default for HeadlessState {
    fn default() -> Self {
        Self {
            next_name: 1,
            reuse_names: false,
            free_names: Vec::new(),
            max_glsl_version: 460,
            live: HashMap::new(),
            allocations: 0,
            deletions: HashMap::new(),
            shaders: HashMap::new(),
            programs: HashMap::new(),
            textures: HashMap::new(),
            framebuffers: HashMap::new(),
            buffers: HashMap::new(),
            vertex_arrays: HashMap::new(),
            current_program: None,
            active_unit: 0,
            texture_units: HashMap::new(),
            bound_framebuffer: None,
            bound_vertex_array: None,
            bound_buffers: HashMap::new(),
            indexed_bindings: HashMap::new(),
            capabilities: HashMap::new(),
            clear_color: [0.0; 4],
            forced_status: None,
            fail_allocations: 0,
            allocations_before_failure: 0,
            calls: Vec::new(),
        }
    }
}

/// A [`GlDevice`] that tracks driver state in memory.
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    state: RefCell<HeadlessState>,
}

impl HeadlessDevice {
    /// Creates a device that accepts GLSL up to version 460.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the highest `#version` the compiler accepts.
    pub fn with_max_glsl_version(self, version: u32) -> Self {
        self.state.borrow_mut().max_glsl_version = version;
        self
    }

    /// Hands deleted names out again, most recently deleted first, the way
    /// drivers do.
    pub fn with_name_reuse(self) -> Self {
        self.state.borrow_mut().reuse_names = true;
        self
    }

    /// Makes the next `count` object creations fail.
    pub fn fail_next_allocations(&self, count: usize) {
        self.fail_allocations_after(0, count);
    }

    /// Lets `successes` object creations through, then fails the next `count`.
    pub fn fail_allocations_after(&self, successes: usize, count: usize) {
        let mut state = self.state.borrow_mut();
        state.allocations_before_failure = successes;
        state.fail_allocations = count;
    }

    /// Overrides the result of every following completeness query.
    pub fn force_framebuffer_status(&self, status: Option<FramebufferStatus>) {
        self.state.borrow_mut().forced_status = status;
    }

    // --- Inspection ---

    /// Number of successful object creations so far.
    pub fn allocation_count(&self) -> usize {
        self.state.borrow().allocations
    }

    /// Number of objects created and not yet deleted.
    pub fn live_object_count(&self) -> usize {
        self.state.borrow().live.len()
    }

    /// Returns `true` if `handle` names a live object.
    pub fn is_live(&self, handle: GlHandle) -> bool {
        self.state.borrow().live.contains_key(&handle)
    }

    /// How many delete calls named `handle`.
    pub fn delete_count(&self, handle: GlHandle) -> u32 {
        self.state
            .borrow()
            .deletions
            .get(&handle)
            .copied()
            .unwrap_or(0)
    }

    /// The recorded state-changing calls, oldest first.
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.state.borrow().calls.clone()
    }

    /// Returns and forgets the recorded calls.
    pub fn take_calls(&self) -> Vec<DeviceCall> {
        std::mem::take(&mut self.state.borrow_mut().calls)
    }

    /// The last source submitted for a shader.
    pub fn shader_source_of(&self, shader: GlHandle) -> Option<String> {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .map(|record| record.source.clone())
    }

    /// Link state of a program.
    pub fn program_snapshot(&self, program: GlHandle) -> Option<ProgramSnapshot> {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|record| record.snapshot.clone())
    }

    /// Reads back the value last set on a uniform, by name.
    pub fn uniform_value(&self, program: GlHandle, name: &str) -> Option<UniformValue> {
        let location = self.uniform_location(program, name)?;
        let state = self.state.borrow();
        state.programs.get(&program)?.values.get(&location).copied()
    }

    /// Pixel data last uploaded to a texture, if any.
    pub fn texture_pixels(&self, texture: GlHandle) -> Option<Vec<u8>> {
        self.state
            .borrow()
            .textures
            .get(&texture)
            .and_then(|record| record.pixels.clone())
    }

    /// Dimensions and storage format of a texture's level 0.
    pub fn texture_storage(&self, texture: GlHandle) -> Option<(u32, u32, InternalFormat)> {
        let state = self.state.borrow();
        let record = state.textures.get(&texture)?;
        Some((record.width, record.height, record.internal_format?))
    }

    /// Filter set on a texture, if any.
    pub fn texture_filter(&self, texture: GlHandle) -> Option<FilterMode> {
        self.state
            .borrow()
            .textures
            .get(&texture)
            .and_then(|record| record.filter)
    }

    /// Attachments of a framebuffer object.
    pub fn framebuffer_attachments(
        &self,
        framebuffer: GlHandle,
    ) -> BTreeMap<FramebufferAttachment, GlHandle> {
        self.state
            .borrow()
            .framebuffers
            .get(&framebuffer)
            .map(|record| record.attachments.clone())
            .unwrap_or_default()
    }

    /// Draw buffers declared on a framebuffer object.
    pub fn framebuffer_draw_buffers(&self, framebuffer: GlHandle) -> Vec<FramebufferAttachment> {
        self.state
            .borrow()
            .framebuffers
            .get(&framebuffer)
            .map(|record| record.draw_buffers.clone())
            .unwrap_or_default()
    }

    /// The framebuffer currently bound, `None` for the window-system one.
    pub fn bound_framebuffer(&self) -> Option<GlHandle> {
        self.state.borrow().bound_framebuffer
    }

    /// Data store of a buffer object.
    pub fn buffer_contents(&self, buffer: GlHandle) -> Option<Vec<u8>> {
        self.state
            .borrow()
            .buffers
            .get(&buffer)
            .map(|record| record.data.clone())
    }

    /// Usage hint of a buffer object's data store.
    pub fn buffer_usage(&self, buffer: GlHandle) -> Option<BufferUsage> {
        self.state
            .borrow()
            .buffers
            .get(&buffer)
            .and_then(|record| record.usage)
    }

    /// Buffer bound to an indexed binding point.
    pub fn indexed_binding(&self, target: BufferTarget, index: u32) -> Option<GlHandle> {
        self.state
            .borrow()
            .indexed_bindings
            .get(&(target, index))
            .copied()
    }

    /// Attributes described on a vertex array, ordered by index.
    pub fn vertex_attributes(&self, vertex_array: GlHandle) -> Vec<VertexAttribRecord> {
        let mut attributes = self
            .state
            .borrow()
            .vertex_arrays
            .get(&vertex_array)
            .cloned()
            .unwrap_or_default();
        attributes.sort_by_key(|attribute| attribute.index);
        attributes
    }

    /// Current state of a capability (all start disabled).
    pub fn capability(&self, capability: Capability) -> bool {
        self.state
            .borrow()
            .capabilities
            .get(&capability)
            .copied()
            .unwrap_or(false)
    }

    /// The color used by `clear`.
    pub fn clear_color(&self) -> [f32; 4] {
        self.state.borrow().clear_color
    }

    /// Texture bound to a unit.
    pub fn texture_on_unit(&self, unit: u32) -> Option<GlHandle> {
        self.state.borrow().texture_units.get(&unit).copied()
    }

    /// Program made current last.
    pub fn current_program(&self) -> Option<GlHandle> {
        self.state.borrow().current_program
    }

    // --- Internals ---

    fn record(&self, call: DeviceCall) {
        self.state.borrow_mut().calls.push(call);
    }

    fn create(&self, kind: ObjectKind) -> Result<GlHandle, DeviceError> {
        let mut state = self.state.borrow_mut();
        if state.fail_allocations > 0 && state.allocations_before_failure > 0 {
            state.allocations_before_failure -= 1;
        } else if state.fail_allocations > 0 {
            state.fail_allocations -= 1;
            return Err(DeviceError::ObjectCreation {
                kind,
                reason: "out of memory".to_owned(),
            });
        }
        let reused = if state.reuse_names {
            state.free_names.pop()
        } else {
            None
        };
        let handle = reused.unwrap_or_else(|| {
            let fresh = GlHandle(state.next_name);
            state.next_name += 1;
            fresh
        });
        state.allocations += 1;
        state.live.insert(handle, kind);
        match kind {
            ObjectKind::Shader(_) => {
                state.shaders.insert(
                    handle,
                    ShaderRecord {
                        source: String::new(),
                        compiled: false,
                        info_log: String::new(),
                    },
                );
            }
            ObjectKind::Program => {
                state.programs.insert(handle, ProgramRecord::default());
            }
            ObjectKind::Texture => {
                state.textures.insert(handle, TextureRecord::default());
            }
            ObjectKind::Framebuffer => {
                state.framebuffers.insert(handle, FramebufferRecord::default());
            }
            ObjectKind::Buffer => {
                state.buffers.insert(handle, BufferRecord::default());
            }
            ObjectKind::VertexArray => {
                state.vertex_arrays.insert(handle, Vec::new());
            }
        }
        Ok(handle)
    }

    fn delete(&self, handle: GlHandle) {
        let mut state = self.state.borrow_mut();
        *state.deletions.entry(handle).or_insert(0) += 1;
        if state.live.remove(&handle).is_some() {
            state.shaders.remove(&handle);
            state.programs.remove(&handle);
            state.textures.remove(&handle);
            state.framebuffers.remove(&handle);
            state.buffers.remove(&handle);
            state.vertex_arrays.remove(&handle);
            if state.reuse_names {
                state.free_names.push(handle);
            }
        }
    }

    fn framebuffer_status(state: &HeadlessState) -> FramebufferStatus {
        let Some(framebuffer) = state.bound_framebuffer else {
            return FramebufferStatus::Complete;
        };
        let Some(record) = state.framebuffers.get(&framebuffer) else {
            return FramebufferStatus::Other(0);
        };
        if record.attachments.is_empty() {
            return FramebufferStatus::MissingAttachment;
        }
        for (attachment, texture) in &record.attachments {
            let format = state
                .textures
                .get(texture)
                .filter(|texture| texture.width > 0 && texture.height > 0)
                .and_then(|texture| texture.internal_format);
            let renderable = match (attachment, format) {
                (_, None) => false,
                (FramebufferAttachment::Depth, Some(format)) => format.is_depth(),
                (FramebufferAttachment::Color(_), Some(format)) => !format.is_depth(),
            };
            if !renderable {
                return FramebufferStatus::IncompleteAttachment;
            }
        }
        FramebufferStatus::Complete
    }
}

fn uniform_declaration() -> Option<&'static Regex> {
    static DECLARATION: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    DECLARATION
        .get_or_init(|| {
            Regex::new(
                r"\buniform\s+(?:(?:lowp|mediump|highp)\s+)?([A-Za-z_]\w*)\s+([A-Za-z_]\w*)\s*(?:\[\s*(\d+)\s*\])?\s*;",
            )
        })
        .as_ref()
        .ok()
}

fn version_number(source: &str) -> Option<u32> {
    source
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("#version"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|number| number.parse().ok())
}

fn glsl_type_code(name: &str) -> Option<u32> {
    let code = match name {
        "bool" => gl_type::BOOL,
        "int" => gl_type::INT,
        "uint" => gl_type::UNSIGNED_INT,
        "float" => gl_type::FLOAT,
        "vec2" => gl_type::FLOAT_VEC2,
        "vec3" => gl_type::FLOAT_VEC3,
        "vec4" => gl_type::FLOAT_VEC4,
        "ivec2" => gl_type::INT_VEC2,
        "ivec3" => gl_type::INT_VEC3,
        "ivec4" => gl_type::INT_VEC4,
        "mat2" => gl_type::FLOAT_MAT2,
        "mat3" => gl_type::FLOAT_MAT3,
        "mat4" => gl_type::FLOAT_MAT4,
        "sampler2D" => gl_type::SAMPLER_2D,
        "sampler3D" => gl_type::SAMPLER_3D,
        "samplerCube" => gl_type::SAMPLER_CUBE,
        "image2D" => gl_type::IMAGE_2D,
        "dmat4" => gl_type::DOUBLE_MAT4,
        _ => return None,
    };
    Some(code)
}

fn reflect_uniforms(sources: &[&str]) -> Vec<ReflectedUniform> {
    let Some(declaration) = uniform_declaration() else {
        return Vec::new();
    };
    let mut uniforms: Vec<ReflectedUniform> = Vec::new();
    let mut next_location = 0;
    for source in sources {
        for captures in declaration.captures_iter(source) {
            let Some(gl_type) = glsl_type_code(&captures[1]) else {
                continue;
            };
            let name = captures[2].to_owned();
            if uniforms.iter().any(|uniform| uniform.name == name) {
                continue;
            }
            let size = captures
                .get(3)
                .and_then(|size| size.as_str().parse().ok())
                .unwrap_or(1);
            uniforms.push(ReflectedUniform {
                name,
                size,
                gl_type,
                location: next_location,
            });
            next_location += size as u32;
        }
    }
    uniforms
}

impl GlDevice for HeadlessDevice {
    fn create_vertex_array(&self) -> Result<GlHandle, DeviceError> {
        self.create(ObjectKind::VertexArray)
    }

    fn delete_vertex_array(&self, handle: GlHandle) {
        self.delete(handle);
    }

    fn create_buffer(&self) -> Result<GlHandle, DeviceError> {
        self.create(ObjectKind::Buffer)
    }

    fn delete_buffer(&self, handle: GlHandle) {
        self.delete(handle);
    }

    fn create_texture(&self) -> Result<GlHandle, DeviceError> {
        self.create(ObjectKind::Texture)
    }

    fn delete_texture(&self, handle: GlHandle) {
        self.delete(handle);
    }

    fn create_shader(&self, stage: ShaderStage) -> Result<GlHandle, DeviceError> {
        self.create(ObjectKind::Shader(stage))
    }

    fn delete_shader(&self, handle: GlHandle) {
        self.delete(handle);
    }

    fn create_program(&self) -> Result<GlHandle, DeviceError> {
        self.create(ObjectKind::Program)
    }

    fn delete_program(&self, handle: GlHandle) {
        self.delete(handle);
    }

    fn create_framebuffer(&self) -> Result<GlHandle, DeviceError> {
        self.create(ObjectKind::Framebuffer)
    }

    fn delete_framebuffer(&self, handle: GlHandle) {
        self.delete(handle);
    }

    fn shader_source(&self, shader: GlHandle, source: &str) {
        if let Some(record) = self.state.borrow_mut().shaders.get_mut(&shader) {
            record.source = source.to_owned();
        }
    }

    fn compile_shader(&self, shader: GlHandle) {
        let mut state = self.state.borrow_mut();
        let max_version = state.max_glsl_version;
        let Some(record) = state.shaders.get_mut(&shader) else {
            return;
        };
        let version = version_number(&record.source);
        let (compiled, info_log) = match version {
            Some(version) if version > max_version => (
                false,
                format!("0:1(10): error: GLSL {version} is not supported"),
            ),
            _ if !record.source.contains("void main") => (
                false,
                "0:1(1): error: entry point `main' not found".to_owned(),
            ),
            _ => (true, String::new()),
        };
        record.compiled = compiled;
        record.info_log = info_log;
    }

    fn shader_compile_status(&self, shader: GlHandle) -> bool {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .is_some_and(|record| record.compiled)
    }

    fn shader_info_log(&self, shader: GlHandle) -> String {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .map(|record| record.info_log.clone())
            .unwrap_or_default()
    }

    fn attach_shader(&self, program: GlHandle, shader: GlHandle) {
        if let Some(record) = self.state.borrow_mut().programs.get_mut(&program) {
            record.snapshot.attached.push(shader);
        }
    }

    fn link_program(&self, program: GlHandle) {
        let mut state = self.state.borrow_mut();
        let Some(attached) = state
            .programs
            .get(&program)
            .map(|record| record.snapshot.attached.clone())
        else {
            return;
        };
        let shaders: Vec<&ShaderRecord> = attached
            .iter()
            .filter_map(|shader| state.shaders.get(shader))
            .collect();
        let failure = if shaders.is_empty() {
            Some("error: no shaders attached".to_owned())
        } else if shaders.iter().any(|shader| !shader.compiled) {
            Some("error: linking with uncompiled shader".to_owned())
        } else {
            None
        };
        let uniforms = match failure {
            Some(_) => Vec::new(),
            None => {
                let sources: Vec<&str> = shaders.iter().map(|shader| shader.source.as_str()).collect();
                reflect_uniforms(&sources)
            }
        };
        if let Some(record) = state.programs.get_mut(&program) {
            record.snapshot.linked = failure.is_none();
            record.snapshot.uniforms = uniforms;
            record.info_log = failure.unwrap_or_default();
            record.values.clear();
        }
    }

    fn program_link_status(&self, program: GlHandle) -> bool {
        self.state
            .borrow()
            .programs
            .get(&program)
            .is_some_and(|record| record.snapshot.linked)
    }

    fn program_info_log(&self, program: GlHandle) -> String {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|record| record.info_log.clone())
            .unwrap_or_default()
    }

    fn active_uniforms(&self, program: GlHandle) -> Vec<ActiveUniform> {
        let state = self.state.borrow();
        let Some(record) = state.programs.get(&program) else {
            return Vec::new();
        };
        record
            .snapshot
            .uniforms
            .iter()
            .map(|uniform| ActiveUniform {
                name: if uniform.size > 1 {
                    format!("{}[0]", uniform.name)
                } else {
                    uniform.name.clone()
                },
                size: uniform.size,
                gl_type: uniform.gl_type,
            })
            .collect()
    }

    fn uniform_location(&self, program: GlHandle, name: &str) -> Option<UniformLocation> {
        let state = self.state.borrow();
        let record = state.programs.get(&program)?;
        let (base, element) = match name.strip_suffix(']').and_then(|rest| rest.split_once('[')) {
            Some((base, index)) => (base, index.trim().parse::<u32>().ok()?),
            None => (name, 0),
        };
        record
            .snapshot
            .uniforms
            .iter()
            .find(|uniform| uniform.name == base && element < uniform.size as u32)
            .map(|uniform| UniformLocation(uniform.location + element))
    }

    fn use_program(&self, program: Option<GlHandle>) {
        self.state.borrow_mut().current_program = program;
        self.record(DeviceCall::UseProgram(program));
    }

    fn set_uniform(&self, location: UniformLocation, value: &UniformValue) {
        let mut state = self.state.borrow_mut();
        let Some(program) = state.current_program else {
            return;
        };
        if let Some(record) = state.programs.get_mut(&program) {
            record.values.insert(location, *value);
        }
    }

    fn active_texture_unit(&self, unit: u32) {
        self.state.borrow_mut().active_unit = unit;
    }

    fn bind_texture(&self, texture: Option<GlHandle>) {
        let unit = {
            let mut state = self.state.borrow_mut();
            let unit = state.active_unit;
            match texture {
                Some(texture) => state.texture_units.insert(unit, texture),
                None => state.texture_units.remove(&unit),
            };
            unit
        };
        self.record(DeviceCall::BindTexture { unit, texture });
    }

    fn tex_image_2d(&self, upload: &TextureUpload<'_>) {
        let mut state = self.state.borrow_mut();
        let unit = state.active_unit;
        let Some(texture) = state.texture_units.get(&unit).copied() else {
            return;
        };
        if let Some(record) = state.textures.get_mut(&texture) {
            record.width = upload.width;
            record.height = upload.height;
            record.internal_format = Some(upload.internal_format);
            record.pixels = upload.data.map(<[u8]>::to_vec);
        }
    }

    fn set_texture_sampling(&self, filter: FilterMode) {
        let mut state = self.state.borrow_mut();
        let unit = state.active_unit;
        let Some(texture) = state.texture_units.get(&unit).copied() else {
            return;
        };
        if let Some(record) = state.textures.get_mut(&texture) {
            record.filter = Some(filter);
        }
    }

    fn read_texture_rgba8(&self, texture: GlHandle, width: u32, height: u32) -> Vec<u8> {
        self.bind_texture(Some(texture));
        let Some(len) = pixel_buffer_len(width, height, 4) else {
            return Vec::new();
        };
        let state = self.state.borrow();
        state
            .textures
            .get(&texture)
            .filter(|record| {
                matches!(
                    record.internal_format,
                    Some(InternalFormat::Rgba8 | InternalFormat::Srgb8Alpha8)
                )
            })
            .and_then(|record| record.pixels.clone())
            .filter(|pixels| pixels.len() == len)
            .unwrap_or_else(|| vec![0; len])
    }

    fn bind_framebuffer(&self, framebuffer: Option<GlHandle>) {
        self.state.borrow_mut().bound_framebuffer = framebuffer;
        self.record(DeviceCall::BindFramebuffer(framebuffer));
    }

    fn framebuffer_texture_2d(&self, attachment: FramebufferAttachment, texture: Option<GlHandle>) {
        {
            let mut state = self.state.borrow_mut();
            let Some(framebuffer) = state.bound_framebuffer else {
                return;
            };
            if let Some(record) = state.framebuffers.get_mut(&framebuffer) {
                match texture {
                    Some(texture) => record.attachments.insert(attachment, texture),
                    None => record.attachments.remove(&attachment),
                };
            }
        }
        self.record(DeviceCall::FramebufferTexture {
            attachment,
            texture,
        });
    }

    fn draw_buffers(&self, attachments: &[FramebufferAttachment]) {
        {
            let mut state = self.state.borrow_mut();
            if let Some(framebuffer) = state.bound_framebuffer {
                if let Some(record) = state.framebuffers.get_mut(&framebuffer) {
                    record.draw_buffers = attachments.to_vec();
                }
            }
        }
        self.record(DeviceCall::DrawBuffers(attachments.to_vec()));
    }

    fn check_framebuffer_status(&self) -> FramebufferStatus {
        let state = self.state.borrow();
        state
            .forced_status
            .unwrap_or_else(|| Self::framebuffer_status(&state))
    }

    fn bind_vertex_array(&self, vertex_array: Option<GlHandle>) {
        self.state.borrow_mut().bound_vertex_array = vertex_array;
        self.record(DeviceCall::BindVertexArray(vertex_array));
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<GlHandle>) {
        let mut state = self.state.borrow_mut();
        match buffer {
            Some(buffer) => state.bound_buffers.insert(target, buffer),
            None => state.bound_buffers.remove(&target),
        };
    }

    fn buffer_data(&self, target: BufferTarget, data: BufferData<'_>, usage: BufferUsage) {
        let mut state = self.state.borrow_mut();
        let Some(buffer) = state.bound_buffers.get(&target).copied() else {
            return;
        };
        if let Some(record) = state.buffers.get_mut(&buffer) {
            record.data = match data {
                BufferData::Bytes(bytes) => bytes.to_vec(),
                BufferData::Uninitialized(size) => vec![0; size],
            };
            record.usage = Some(usage);
        }
    }

    fn buffer_sub_data(&self, target: BufferTarget, offset: usize, data: &[u8]) {
        let mut state = self.state.borrow_mut();
        let Some(buffer) = state.bound_buffers.get(&target).copied() else {
            return;
        };
        if let Some(record) = state.buffers.get_mut(&buffer) {
            // Out-of-range writes are a GL_INVALID_VALUE no-op.
            if let Some(range) = record.data.get_mut(offset..offset + data.len()) {
                range.copy_from_slice(data);
            }
        }
    }

    fn bind_buffer_base(&self, target: BufferTarget, index: u32, buffer: Option<GlHandle>) {
        {
            let mut state = self.state.borrow_mut();
            match buffer {
                Some(buffer) => {
                    state.indexed_bindings.insert((target, index), buffer);
                    state.bound_buffers.insert(target, buffer);
                }
                None => {
                    state.indexed_bindings.remove(&(target, index));
                }
            }
        }
        self.record(DeviceCall::BindBufferBase {
            target,
            index,
            buffer,
        });
    }

    fn vertex_attrib_pointer_f32(&self, index: u32, components: u32, stride: u32, offset: u32) {
        let mut state = self.state.borrow_mut();
        let buffer = state.bound_buffers.get(&BufferTarget::Array).copied();
        let Some(vertex_array) = state.bound_vertex_array else {
            return;
        };
        if let Some(attributes) = state.vertex_arrays.get_mut(&vertex_array) {
            attributes.retain(|attribute| attribute.index != index);
            attributes.push(VertexAttribRecord {
                index,
                components,
                stride,
                offset,
                enabled: false,
                buffer,
            });
        }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        let mut state = self.state.borrow_mut();
        let Some(vertex_array) = state.bound_vertex_array else {
            return;
        };
        if let Some(attributes) = state.vertex_arrays.get_mut(&vertex_array) {
            if let Some(attribute) = attributes.iter_mut().find(|attribute| attribute.index == index) {
                attribute.enabled = true;
            }
        }
    }

    fn set_capability(&self, capability: Capability, enabled: bool) {
        self.state
            .borrow_mut()
            .capabilities
            .insert(capability, enabled);
        self.record(DeviceCall::SetCapability(capability, enabled));
    }

    fn set_clear_color(&self, rgba: [f32; 4]) {
        self.state.borrow_mut().clear_color = rgba;
        self.record(DeviceCall::SetClearColor(rgba));
    }

    fn clear(&self, mask: ClearMask) {
        self.record(DeviceCall::Clear(mask));
    }

    fn clear_color_buffer(&self, draw_buffer: u32, rgba: [f32; 4]) {
        self.record(DeviceCall::ClearColorBuffer { draw_buffer, rgba });
    }

    fn clear_depth_buffer(&self, depth: f32) {
        self.record(DeviceCall::ClearDepthBuffer(depth));
    }

    fn set_viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.record(DeviceCall::Viewport {
            x,
            y,
            width,
            height,
        });
    }

    fn draw_arrays(&self, mode: PrimitiveMode, first: i32, count: i32) {
        self.record(DeviceCall::DrawArrays { mode, first, count });
    }

    fn dispatch_compute(&self, groups_x: u32, groups_y: u32, groups_z: u32) {
        self.record(DeviceCall::DispatchCompute(groups_x, groups_y, groups_z));
    }

    fn memory_barrier(&self, barrier: MemoryBarrier) {
        self.record(DeviceCall::MemoryBarrier(barrier));
    }
}
