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

//! The driver seam.
//!
//! [`GlDevice`] mirrors the slice of the OpenGL 4.6 core API this crate
//! needs, one method per driver entry point. The production implementation
//! lives in `gfx-utils-infra`; [`HeadlessDevice`] models the driver state in
//! memory for tests and CI.

pub mod format;
pub mod gl_type;
mod headless;
mod types;

pub use self::format::{
    bytes_per_pixel, pixel_buffer_len, ComponentType, FilterMode, InternalFormat, PixelFormat,
};
pub use self::headless::{
    DeviceCall, HeadlessDevice, ProgramSnapshot, ReflectedUniform, VertexAttribRecord,
};
pub use self::types::*;

use crate::error::DeviceError;
use std::fmt::Debug;

/// A single-threaded OpenGL 4.6 core context.
///
/// Every method maps onto one driver call (or a short fixed sequence of
/// them). Calls are only valid on the thread that owns the context, which is
/// why the trait does not require `Send` or `Sync`.
///
/// Bind-point methods take `Option<GlHandle>`; `None` binds the null object
/// (for framebuffers, the window-system framebuffer).
pub trait GlDevice: Debug {
    // --- Object lifecycle ---

    /// Creates a vertex array object.
    /// ## Returns
    /// The new object name, or an error if the driver refused.
    fn create_vertex_array(&self) -> Result<GlHandle, DeviceError>;

    /// Deletes a vertex array object.
    fn delete_vertex_array(&self, handle: GlHandle);

    /// Creates a buffer object with no data store.
    fn create_buffer(&self) -> Result<GlHandle, DeviceError>;

    /// Deletes a buffer object.
    fn delete_buffer(&self, handle: GlHandle);

    /// Creates a texture object with no image.
    fn create_texture(&self) -> Result<GlHandle, DeviceError>;

    /// Deletes a texture object.
    fn delete_texture(&self, handle: GlHandle);

    /// Creates an empty shader object.
    /// ## Arguments
    /// * `stage` - The pipeline stage the shader will be compiled for.
    fn create_shader(&self, stage: ShaderStage) -> Result<GlHandle, DeviceError>;

    /// Deletes a shader object.
    fn delete_shader(&self, handle: GlHandle);

    /// Creates an empty program object.
    fn create_program(&self) -> Result<GlHandle, DeviceError>;

    /// Deletes a program object.
    fn delete_program(&self, handle: GlHandle);

    /// Creates a framebuffer object with no attachments.
    fn create_framebuffer(&self) -> Result<GlHandle, DeviceError>;

    /// Deletes a framebuffer object.
    fn delete_framebuffer(&self, handle: GlHandle);

    // --- Shaders and programs ---

    /// Replaces the source of a shader object.
    fn shader_source(&self, shader: GlHandle, source: &str);

    /// Compiles the current source of a shader object.
    fn compile_shader(&self, shader: GlHandle);

    /// Returns `true` if the last compilation succeeded.
    fn shader_compile_status(&self, shader: GlHandle) -> bool;

    /// Returns the full info log of a shader object.
    fn shader_info_log(&self, shader: GlHandle) -> String;

    /// Attaches a shader object to a program object.
    fn attach_shader(&self, program: GlHandle, shader: GlHandle);

    /// Links a program object from its attached shaders.
    fn link_program(&self, program: GlHandle);

    /// Returns `true` if the last link succeeded.
    fn program_link_status(&self, program: GlHandle) -> bool;

    /// Returns the full info log of a program object.
    fn program_info_log(&self, program: GlHandle) -> String;

    /// Enumerates the active uniforms of a linked program.
    /// ## Returns
    /// One entry per active uniform; arrays appear once with their size.
    fn active_uniforms(&self, program: GlHandle) -> Vec<ActiveUniform>;

    /// Resolves the location of a named uniform.
    /// ## Arguments
    /// * `program` - A linked program.
    /// * `name` - A uniform name, array elements written as `name[i]`.
    /// ## Returns
    /// `None` if the name does not denote an active uniform.
    fn uniform_location(&self, program: GlHandle, name: &str) -> Option<UniformLocation>;

    /// Makes a program current, or unbinds with `None`.
    fn use_program(&self, program: Option<GlHandle>);

    /// Sets a uniform of the current program.
    fn set_uniform(&self, location: UniformLocation, value: &UniformValue);

    // --- Textures ---

    /// Selects the texture unit affected by subsequent texture binds.
    fn active_texture_unit(&self, unit: u32);

    /// Binds a 2D texture to the active unit.
    fn bind_texture(&self, texture: Option<GlHandle>);

    /// Specifies the image of the bound 2D texture (level 0).
    fn tex_image_2d(&self, upload: &TextureUpload<'_>);

    /// Sets min/mag filtering and clamp-to-edge wrapping on the bound 2D texture.
    fn set_texture_sampling(&self, filter: FilterMode);

    /// Reads back level 0 of a 2D texture as tightly packed RGBA8 rows.
    /// ## Arguments
    /// * `texture` - The texture to read; it is left bound to the active unit.
    /// * `width`, `height` - The dimensions of the texture's level 0.
    fn read_texture_rgba8(&self, texture: GlHandle, width: u32, height: u32) -> Vec<u8>;

    // --- Framebuffers ---

    /// Binds a framebuffer for drawing and reading.
    fn bind_framebuffer(&self, framebuffer: Option<GlHandle>);

    /// Attaches a 2D texture (level 0) of the bound framebuffer, or detaches with `None`.
    fn framebuffer_texture_2d(&self, attachment: FramebufferAttachment, texture: Option<GlHandle>);

    /// Declares the fragment outputs written by subsequent draws.
    fn draw_buffers(&self, attachments: &[FramebufferAttachment]);

    /// Queries completeness of the bound framebuffer.
    fn check_framebuffer_status(&self) -> FramebufferStatus;

    // --- Buffers and vertex arrays ---

    /// Binds a vertex array object.
    fn bind_vertex_array(&self, vertex_array: Option<GlHandle>);

    /// Binds a buffer object to a target.
    fn bind_buffer(&self, target: BufferTarget, buffer: Option<GlHandle>);

    /// Creates a new data store for the buffer bound to `target`.
    fn buffer_data(&self, target: BufferTarget, data: BufferData<'_>, usage: BufferUsage);

    /// Overwrites part of the data store of the buffer bound to `target`.
    fn buffer_sub_data(&self, target: BufferTarget, offset: usize, data: &[u8]);

    /// Binds a buffer to an indexed binding point of `target`.
    fn bind_buffer_base(&self, target: BufferTarget, index: u32, buffer: Option<GlHandle>);

    /// Describes a float vertex attribute of the bound vertex array,
    /// sourced from the buffer bound to [`BufferTarget::Array`].
    /// ## Arguments
    /// * `index` - Attribute index.
    /// * `components` - Number of floats per vertex (1 to 4).
    /// * `stride` - Bytes between consecutive vertices.
    /// * `offset` - Byte offset of the first component.
    fn vertex_attrib_pointer_f32(&self, index: u32, components: u32, stride: u32, offset: u32);

    /// Enables a vertex attribute of the bound vertex array.
    fn enable_vertex_attrib_array(&self, index: u32);

    // --- Fixed-function state ---

    /// Enables or disables a capability.
    fn set_capability(&self, capability: Capability, enabled: bool);

    /// Sets the color used by [`clear`](Self::clear).
    fn set_clear_color(&self, rgba: [f32; 4]);

    /// Clears buffers of the bound framebuffer.
    fn clear(&self, mask: ClearMask);

    /// Clears one draw buffer of the bound framebuffer to an explicit color.
    fn clear_color_buffer(&self, draw_buffer: u32, rgba: [f32; 4]);

    /// Clears the depth buffer of the bound framebuffer to an explicit value.
    fn clear_depth_buffer(&self, depth: f32);

    /// Sets the viewport rectangle.
    fn set_viewport(&self, x: i32, y: i32, width: i32, height: i32);

    // --- Draw and compute ---

    /// Draws `count` vertices from the bound vertex array.
    fn draw_arrays(&self, mode: PrimitiveMode, first: i32, count: i32);

    /// Launches compute work groups with the current program.
    fn dispatch_compute(&self, groups_x: u32, groups_y: u32, groups_z: u32);

    /// Orders memory transactions issued before and after the call.
    fn memory_barrier(&self, barrier: MemoryBarrier);
}

/// Creates one driver object of the given kind.
pub fn create_object(device: &dyn GlDevice, kind: ObjectKind) -> Result<GlHandle, DeviceError> {
    match kind {
        ObjectKind::VertexArray => device.create_vertex_array(),
        ObjectKind::Buffer => device.create_buffer(),
        ObjectKind::Texture => device.create_texture(),
        ObjectKind::Shader(stage) => device.create_shader(stage),
        ObjectKind::Program => device.create_program(),
        ObjectKind::Framebuffer => device.create_framebuffer(),
    }
}

/// Issues the kind-appropriate driver delete for one object.
pub fn destroy_object(device: &dyn GlDevice, kind: ObjectKind, handle: GlHandle) {
    match kind {
        ObjectKind::VertexArray => device.delete_vertex_array(handle),
        ObjectKind::Buffer => device.delete_buffer(handle),
        ObjectKind::Texture => device.delete_texture(handle),
        ObjectKind::Shader(_) => device.delete_shader(handle),
        ObjectKind::Program => device.delete_program(handle),
        ObjectKind::Framebuffer => device.delete_framebuffer(handle),
    }
}
