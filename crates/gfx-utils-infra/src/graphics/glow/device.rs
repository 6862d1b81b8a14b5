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

use std::num::NonZeroU32;

use glow::{HasContext, PixelPackData, PixelUnpackData};

use gfx_utils_core::device::{
    ActiveUniform, BufferData, BufferTarget, BufferUsage, Capability, ClearMask, FilterMode,
    FramebufferAttachment, FramebufferStatus, GlDevice, GlHandle, MemoryBarrier, ObjectKind,
    pixel_buffer_len, PrimitiveMode, ShaderStage, TextureUpload, UniformLocation, UniformValue,
};
use gfx_utils_core::error::DeviceError;

use super::conversions::{framebuffer_status_from_gl, IntoGl};

/// [`GlDevice`] over a native `glow` context.
///
/// Every call goes straight to the driver on the calling thread. The device
/// must only be used while its context is current.
#[derive(Debug)]
pub struct GlowDevice {
    gl: glow::Context,
}

fn native<T>(handle: GlHandle, wrap: fn(NonZeroU32) -> T) -> Option<T> {
    NonZeroU32::new(handle.0).map(wrap)
}

fn raw(handle: NonZeroU32) -> GlHandle {
    GlHandle(handle.get())
}

fn creation_error(kind: ObjectKind) -> impl FnOnce(String) -> DeviceError {
    move |reason| DeviceError::ObjectCreation { kind, reason }
}

fn gl_size(len: usize) -> Option<i32> {
    let size = i32::try_from(len).ok();
    if size.is_none() {
        log::warn!("{len} bytes exceed the GL size range");
    }
    size
}

impl GlowDevice {
    /// Wraps a context created by the windowing host.
    ///
    /// Byte rows are packed and unpacked without padding, so RGB8 and R8
    /// uploads of any width are accepted.
    ///
    /// # Safety
    /// `gl` must be current on the calling thread, and must stay current
    /// whenever this device (or any resource built from it) is used or
    /// dropped.
    pub unsafe fn new(gl: glow::Context) -> Self {
        gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
        gl.pixel_store_i32(glow::PACK_ALIGNMENT, 1);
        let version = gl.version();
        log::info!(
            "OpenGL {}.{} ({})",
            version.major,
            version.minor,
            version.vendor_info
        );
        Self { gl }
    }

    /// The wrapped context, for calls this crate does not cover.
    pub fn context(&self) -> &glow::Context {
        &self.gl
    }
}

// SAFETY (whole impl): `GlowDevice::new` requires the context to be current
// whenever the device is used. Handles are only ever produced by the create
// calls below, and GL ignores names it does not know in every call used here.
impl GlDevice for GlowDevice {
    fn create_vertex_array(&self) -> Result<GlHandle, DeviceError> {
        unsafe { self.gl.create_vertex_array() }
            .map(|vao| raw(vao.0))
            .map_err(creation_error(ObjectKind::VertexArray))
    }

    fn delete_vertex_array(&self, handle: GlHandle) {
        if let Some(vao) = native(handle, glow::NativeVertexArray) {
            unsafe { self.gl.delete_vertex_array(vao) };
        }
    }

    fn create_buffer(&self) -> Result<GlHandle, DeviceError> {
        unsafe { self.gl.create_buffer() }
            .map(|buffer| raw(buffer.0))
            .map_err(creation_error(ObjectKind::Buffer))
    }

    fn delete_buffer(&self, handle: GlHandle) {
        if let Some(buffer) = native(handle, glow::NativeBuffer) {
            unsafe { self.gl.delete_buffer(buffer) };
        }
    }

    fn create_texture(&self) -> Result<GlHandle, DeviceError> {
        unsafe { self.gl.create_texture() }
            .map(|texture| raw(texture.0))
            .map_err(creation_error(ObjectKind::Texture))
    }

    fn delete_texture(&self, handle: GlHandle) {
        if let Some(texture) = native(handle, glow::NativeTexture) {
            unsafe { self.gl.delete_texture(texture) };
        }
    }

    fn create_shader(&self, stage: ShaderStage) -> Result<GlHandle, DeviceError> {
        unsafe { self.gl.create_shader(stage.into_gl()) }
            .map(|shader| raw(shader.0))
            .map_err(creation_error(ObjectKind::Shader(stage)))
    }

    fn delete_shader(&self, handle: GlHandle) {
        if let Some(shader) = native(handle, glow::NativeShader) {
            unsafe { self.gl.delete_shader(shader) };
        }
    }

    fn create_program(&self) -> Result<GlHandle, DeviceError> {
        unsafe { self.gl.create_program() }
            .map(|program| raw(program.0))
            .map_err(creation_error(ObjectKind::Program))
    }

    fn delete_program(&self, handle: GlHandle) {
        if let Some(program) = native(handle, glow::NativeProgram) {
            unsafe { self.gl.delete_program(program) };
        }
    }

    fn create_framebuffer(&self) -> Result<GlHandle, DeviceError> {
        unsafe { self.gl.create_framebuffer() }
            .map(|framebuffer| raw(framebuffer.0))
            .map_err(creation_error(ObjectKind::Framebuffer))
    }

    fn delete_framebuffer(&self, handle: GlHandle) {
        if let Some(framebuffer) = native(handle, glow::NativeFramebuffer) {
            unsafe { self.gl.delete_framebuffer(framebuffer) };
        }
    }

    // --- Shaders and programs ---

    fn shader_source(&self, shader: GlHandle, source: &str) {
        if let Some(shader) = native(shader, glow::NativeShader) {
            unsafe { self.gl.shader_source(shader, source) };
        }
    }

    fn compile_shader(&self, shader: GlHandle) {
        if let Some(shader) = native(shader, glow::NativeShader) {
            unsafe { self.gl.compile_shader(shader) };
        }
    }

    fn shader_compile_status(&self, shader: GlHandle) -> bool {
        native(shader, glow::NativeShader)
            .is_some_and(|shader| unsafe { self.gl.get_shader_compile_status(shader) })
    }

    fn shader_info_log(&self, shader: GlHandle) -> String {
        native(shader, glow::NativeShader)
            .map(|shader| unsafe { self.gl.get_shader_info_log(shader) })
            .unwrap_or_default()
    }

    fn attach_shader(&self, program: GlHandle, shader: GlHandle) {
        if let (Some(program), Some(shader)) = (
            native(program, glow::NativeProgram),
            native(shader, glow::NativeShader),
        ) {
            unsafe { self.gl.attach_shader(program, shader) };
        }
    }

    fn link_program(&self, program: GlHandle) {
        if let Some(program) = native(program, glow::NativeProgram) {
            unsafe { self.gl.link_program(program) };
        }
    }

    fn program_link_status(&self, program: GlHandle) -> bool {
        native(program, glow::NativeProgram)
            .is_some_and(|program| unsafe { self.gl.get_program_link_status(program) })
    }

    fn program_info_log(&self, program: GlHandle) -> String {
        native(program, glow::NativeProgram)
            .map(|program| unsafe { self.gl.get_program_info_log(program) })
            .unwrap_or_default()
    }

    fn active_uniforms(&self, program: GlHandle) -> Vec<ActiveUniform> {
        let Some(program) = native(program, glow::NativeProgram) else {
            return Vec::new();
        };
        let count = unsafe { self.gl.get_active_uniforms(program) };
        (0..count)
            .filter_map(|index| unsafe { self.gl.get_active_uniform(program, index) })
            .map(|uniform| ActiveUniform {
                name: uniform.name,
                size: uniform.size,
                gl_type: uniform.utype,
            })
            .collect()
    }

    fn uniform_location(&self, program: GlHandle, name: &str) -> Option<UniformLocation> {
        let program = native(program, glow::NativeProgram)?;
        unsafe { self.gl.get_uniform_location(program, name) }
            .map(|location| UniformLocation(location.0))
    }

    fn use_program(&self, program: Option<GlHandle>) {
        let program = program.and_then(|program| native(program, glow::NativeProgram));
        unsafe { self.gl.use_program(program) };
    }

    fn set_uniform(&self, location: UniformLocation, value: &UniformValue) {
        let location = glow::NativeUniformLocation(location.0);
        let location = Some(&location);
        unsafe {
            match *value {
                UniformValue::Bool(value) => self.gl.uniform_1_i32(location, value as i32),
                UniformValue::Int(value) => self.gl.uniform_1_i32(location, value),
                UniformValue::UInt(value) => self.gl.uniform_1_u32(location, value),
                UniformValue::Float(value) => self.gl.uniform_1_f32(location, value),
                UniformValue::Vec2(value) => {
                    self.gl.uniform_2_f32_slice(location, &value.to_array())
                }
                UniformValue::Vec3(value) => {
                    self.gl.uniform_3_f32_slice(location, &value.to_array())
                }
                UniformValue::Vec4(value) => {
                    self.gl.uniform_4_f32_slice(location, &value.to_array())
                }
                UniformValue::Mat2(value) => {
                    self.gl
                        .uniform_matrix_2_f32_slice(location, false, &value.to_cols_array())
                }
                UniformValue::Mat3(value) => {
                    self.gl
                        .uniform_matrix_3_f32_slice(location, false, &value.to_cols_array())
                }
                UniformValue::Mat4(value) => {
                    self.gl
                        .uniform_matrix_4_f32_slice(location, false, &value.to_cols_array())
                }
            }
        }
    }

    // --- Textures ---

    fn active_texture_unit(&self, unit: u32) {
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) };
    }

    fn bind_texture(&self, texture: Option<GlHandle>) {
        let texture = texture.and_then(|texture| native(texture, glow::NativeTexture));
        unsafe { self.gl.bind_texture(glow::TEXTURE_2D, texture) };
    }

    fn tex_image_2d(&self, upload: &TextureUpload<'_>) {
        unsafe {
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                upload.internal_format.into_gl(),
                upload.width as i32,
                upload.height as i32,
                0,
                upload.pixel_format.into_gl(),
                upload.component_type.into_gl(),
                PixelUnpackData::Slice(upload.data),
            );
        }
    }

    fn set_texture_sampling(&self, filter: FilterMode) {
        let filter: i32 = filter.into_gl();
        unsafe {
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, filter);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, filter);
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_S,
                glow::CLAMP_TO_EDGE as i32,
            );
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_T,
                glow::CLAMP_TO_EDGE as i32,
            );
        }
    }

    fn read_texture_rgba8(&self, texture: GlHandle, width: u32, height: u32) -> Vec<u8> {
        let Some(len) = pixel_buffer_len(width, height, 4) else {
            log::warn!("texture {texture}: {width}x{height} read-back does not fit in memory");
            return Vec::new();
        };
        let mut pixels = vec![0; len];
        let Some(texture) = native(texture, glow::NativeTexture) else {
            return pixels;
        };
        unsafe {
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.gl.get_tex_image(
                glow::TEXTURE_2D,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                PixelPackData::Slice(Some(pixels.as_mut_slice())),
            );
        }
        pixels
    }

    // --- Framebuffers ---

    fn bind_framebuffer(&self, framebuffer: Option<GlHandle>) {
        let framebuffer =
            framebuffer.and_then(|framebuffer| native(framebuffer, glow::NativeFramebuffer));
        unsafe { self.gl.bind_framebuffer(glow::FRAMEBUFFER, framebuffer) };
    }

    fn framebuffer_texture_2d(&self, attachment: FramebufferAttachment, texture: Option<GlHandle>) {
        let texture = texture.and_then(|texture| native(texture, glow::NativeTexture));
        unsafe {
            self.gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                attachment.into_gl(),
                glow::TEXTURE_2D,
                texture,
                0,
            );
        }
    }

    fn draw_buffers(&self, attachments: &[FramebufferAttachment]) {
        let buffers: Vec<u32> = attachments
            .iter()
            .map(|attachment| attachment.into_gl())
            .collect();
        unsafe { self.gl.draw_buffers(&buffers) };
    }

    fn check_framebuffer_status(&self) -> FramebufferStatus {
        framebuffer_status_from_gl(unsafe { self.gl.check_framebuffer_status(glow::FRAMEBUFFER) })
    }

    // --- Buffers and vertex arrays ---

    fn bind_vertex_array(&self, vertex_array: Option<GlHandle>) {
        let vertex_array = vertex_array.and_then(|vao| native(vao, glow::NativeVertexArray));
        unsafe { self.gl.bind_vertex_array(vertex_array) };
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<GlHandle>) {
        let buffer = buffer.and_then(|buffer| native(buffer, glow::NativeBuffer));
        unsafe { self.gl.bind_buffer(target.into_gl(), buffer) };
    }

    fn buffer_data(&self, target: BufferTarget, data: BufferData<'_>, usage: BufferUsage) {
        match data {
            BufferData::Bytes(bytes) => unsafe {
                self.gl
                    .buffer_data_u8_slice(target.into_gl(), bytes, usage.into_gl())
            },
            BufferData::Uninitialized(len) => {
                if let Some(size) = gl_size(len) {
                    unsafe {
                        self.gl
                            .buffer_data_size(target.into_gl(), size, usage.into_gl())
                    };
                }
            }
        }
    }

    fn buffer_sub_data(&self, target: BufferTarget, offset: usize, data: &[u8]) {
        if let Some(offset) = gl_size(offset) {
            unsafe {
                self.gl
                    .buffer_sub_data_u8_slice(target.into_gl(), offset, data)
            };
        }
    }

    fn bind_buffer_base(&self, target: BufferTarget, index: u32, buffer: Option<GlHandle>) {
        let buffer = buffer.and_then(|buffer| native(buffer, glow::NativeBuffer));
        unsafe { self.gl.bind_buffer_base(target.into_gl(), index, buffer) };
    }

    fn vertex_attrib_pointer_f32(&self, index: u32, components: u32, stride: u32, offset: u32) {
        unsafe {
            self.gl.vertex_attrib_pointer_f32(
                index,
                components as i32,
                glow::FLOAT,
                false,
                stride as i32,
                offset as i32,
            );
        }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(index) };
    }

    // --- Pipeline state and commands ---

    fn set_capability(&self, capability: Capability, enabled: bool) {
        let capability = capability.into_gl();
        unsafe {
            if enabled {
                self.gl.enable(capability);
            } else {
                self.gl.disable(capability);
            }
        }
    }

    fn set_clear_color(&self, [red, green, blue, alpha]: [f32; 4]) {
        unsafe { self.gl.clear_color(red, green, blue, alpha) };
    }

    fn clear(&self, mask: ClearMask) {
        unsafe { self.gl.clear(mask.into_gl()) };
    }

    fn clear_color_buffer(&self, draw_buffer: u32, rgba: [f32; 4]) {
        unsafe {
            self.gl
                .clear_buffer_f32_slice(glow::COLOR, draw_buffer, &rgba)
        };
    }

    fn clear_depth_buffer(&self, depth: f32) {
        unsafe { self.gl.clear_buffer_f32_slice(glow::DEPTH, 0, &[depth]) };
    }

    fn set_viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.viewport(x, y, width, height) };
    }

    fn draw_arrays(&self, mode: PrimitiveMode, first: i32, count: i32) {
        unsafe { self.gl.draw_arrays(mode.into_gl(), first, count) };
    }

    fn dispatch_compute(&self, groups_x: u32, groups_y: u32, groups_z: u32) {
        unsafe { self.gl.dispatch_compute(groups_x, groups_y, groups_z) };
    }

    fn memory_barrier(&self, barrier: MemoryBarrier) {
        unsafe { self.gl.memory_barrier(barrier.into_gl()) };
    }
}
