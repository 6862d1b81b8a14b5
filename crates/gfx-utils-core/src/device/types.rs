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

//! Plain data types exchanged with a [`GlDevice`](super::GlDevice).

use crate::math::{Mat2, Mat3, Mat4, Vec2, Vec3, Vec4};
use std::fmt;

/// An opaque driver object name.
///
/// `0` is the null name. For framebuffers it also names the window-system
/// framebuffer, which is never created or deleted through the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct GlHandle(pub u32);

impl GlHandle {
    /// The null name.
    pub const NULL: GlHandle = GlHandle(0);

    /// Returns `true` if this is the null name.
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for GlHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The pipeline stage a shader object is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex stage.
    Vertex,
    /// Fragment stage.
    Fragment,
    /// Geometry stage.
    Geometry,
    /// Tessellation control stage.
    TessControl,
    /// Tessellation evaluation stage.
    TessEvaluation,
    /// Compute stage.
    Compute,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
            ShaderStage::Geometry => "geometry",
            ShaderStage::TessControl => "tessellation control",
            ShaderStage::TessEvaluation => "tessellation evaluation",
            ShaderStage::Compute => "compute",
        };
        f.write_str(name)
    }
}

/// The object namespaces tracked by the registry, one list per class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectClass {
    /// Vertex array objects.
    VertexArray,
    /// Buffer objects of any target.
    Buffer,
    /// Texture objects.
    Texture,
    /// Shader objects of any stage.
    Shader,
    /// Program objects.
    Program,
    /// Framebuffer objects.
    Framebuffer,
}

impl ObjectClass {
    /// Every class, in a fixed order.
    pub const ALL: [ObjectClass; 6] = [
        ObjectClass::VertexArray,
        ObjectClass::Buffer,
        ObjectClass::Texture,
        ObjectClass::Shader,
        ObjectClass::Program,
        ObjectClass::Framebuffer,
    ];
}

/// What to create (and later delete) on the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// A vertex array object.
    VertexArray,
    /// A buffer object.
    Buffer,
    /// A texture object.
    Texture,
    /// A shader object for the given stage.
    Shader(ShaderStage),
    /// A program object.
    Program,
    /// A framebuffer object.
    Framebuffer,
}

impl ObjectKind {
    /// The registry list this kind is tracked in.
    pub fn class(self) -> ObjectClass {
        match self {
            ObjectKind::VertexArray => ObjectClass::VertexArray,
            ObjectKind::Buffer => ObjectClass::Buffer,
            ObjectKind::Texture => ObjectClass::Texture,
            ObjectKind::Shader(_) => ObjectClass::Shader,
            ObjectKind::Program => ObjectClass::Program,
            ObjectKind::Framebuffer => ObjectClass::Framebuffer,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::VertexArray => f.write_str("vertex array"),
            ObjectKind::Buffer => f.write_str("buffer"),
            ObjectKind::Texture => f.write_str("texture"),
            ObjectKind::Shader(stage) => write!(f, "{stage} shader"),
            ObjectKind::Program => f.write_str("program"),
            ObjectKind::Framebuffer => f.write_str("framebuffer"),
        }
    }
}

/// A resolved uniform location inside a linked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// One row of a program's active-uniform table, as reported by the driver.
///
/// Array uniforms are reported once, with `size` elements and a name that
/// usually ends in `[0]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveUniform {
    /// The reported name.
    pub name: String,
    /// Number of array elements (1 for non-arrays).
    pub size: i32,
    /// The GL type code, see [`gl_type`](super::gl_type).
    pub gl_type: u32,
}

/// A typed value submitted to a uniform location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// `bool`, submitted as an integer.
    Bool(bool),
    /// `int` or a sampler unit.
    Int(i32),
    /// `uint`.
    UInt(u32),
    /// `float`.
    Float(f32),
    /// `vec2`.
    Vec2(Vec2),
    /// `vec3`.
    Vec3(Vec3),
    /// `vec4`.
    Vec4(Vec4),
    /// `mat2`, column-major.
    Mat2(Mat2),
    /// `mat3`, column-major.
    Mat3(Mat3),
    /// `mat4`, column-major.
    Mat4(Mat4),
}

macro_rules! impl_uniform_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for UniformValue {
                fn from(value: $ty) -> Self {
                    UniformValue::$variant(value)
                }
            }
        )*
    };
}

impl_uniform_from! {
    bool => Bool,
    i32 => Int,
    u32 => UInt,
    f32 => Float,
    Vec2 => Vec2,
    Vec3 => Vec3,
    Vec4 => Vec4,
    Mat2 => Mat2,
    Mat3 => Mat3,
    Mat4 => Mat4,
}

/// Result of a framebuffer completeness query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramebufferStatus {
    /// The framebuffer can be rendered to.
    Complete,
    /// An attachment is not renderable with its format or has no storage.
    IncompleteAttachment,
    /// No image is attached at all.
    MissingAttachment,
    /// A declared draw buffer has no attachment.
    IncompleteDrawBuffer,
    /// The combination of formats is not supported by the implementation.
    Unsupported,
    /// Any other status code.
    Other(u32),
}

impl fmt::Display for FramebufferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FramebufferStatus::Complete => f.write_str("complete"),
            FramebufferStatus::IncompleteAttachment => f.write_str("incomplete attachment"),
            FramebufferStatus::MissingAttachment => f.write_str("missing attachment"),
            FramebufferStatus::IncompleteDrawBuffer => f.write_str("incomplete draw buffer"),
            FramebufferStatus::Unsupported => f.write_str("unsupported"),
            FramebufferStatus::Other(code) => write!(f, "status 0x{code:04X}"),
        }
    }
}

/// An attachment point of a framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FramebufferAttachment {
    /// Color attachment slot `i`.
    Color(u32),
    /// The depth slot.
    Depth,
}

/// Buffer binding targets used by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Vertex attribute data.
    Array,
    /// Shader storage.
    ShaderStorage,
}

/// Usage hint passed along with a buffer's data store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Written once, drawn many times.
    StaticDraw,
    /// Rewritten often, drawn many times.
    DynamicDraw,
    /// Rewritten often by the GPU, read by the GPU.
    DynamicCopy,
}

/// Contents of a newly (re)specified buffer data store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferData<'a> {
    /// Initialize from these bytes.
    Bytes(&'a [u8]),
    /// Reserve this many bytes with undefined contents.
    Uninitialized(usize),
}

impl BufferData<'_> {
    /// Size of the resulting data store in bytes.
    pub fn len(&self) -> usize {
        match self {
            BufferData::Bytes(bytes) => bytes.len(),
            BufferData::Uninitialized(size) => *size,
        }
    }

    /// Returns `true` if the data store would be empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Server-side capabilities toggled by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Depth testing.
    DepthTest,
    /// Linear to sRGB conversion on framebuffer writes.
    FramebufferSrgb,
}

/// Which buffers of the bound framebuffer a [`clear`](super::GlDevice::clear) touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClearMask {
    /// Clear the color buffers.
    pub color: bool,
    /// Clear the depth buffer.
    pub depth: bool,
}

impl ClearMask {
    /// Color only.
    pub const COLOR: ClearMask = ClearMask {
        color: true,
        depth: false,
    };
    /// Color and depth.
    pub const COLOR_DEPTH: ClearMask = ClearMask {
        color: true,
        depth: true,
    };
}

/// Primitive topology for [`draw_arrays`](super::GlDevice::draw_arrays).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveMode {
    /// Independent points.
    Points,
    /// Independent line segments.
    Lines,
    /// Connected line segments.
    LineStrip,
    /// Independent triangles.
    Triangles,
    /// Triangle strip.
    TriangleStrip,
    /// Triangle fan.
    TriangleFan,
}

/// Memory barrier bits, combinable with `|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryBarrier(pub u32);

impl MemoryBarrier {
    /// Vertex attribute fetches after the barrier see prior shader writes.
    pub const VERTEX_ATTRIB_ARRAY: MemoryBarrier = MemoryBarrier(0x0000_0001);
    /// Image load/store after the barrier sees prior shader writes.
    pub const SHADER_IMAGE_ACCESS: MemoryBarrier = MemoryBarrier(0x0000_0020);
    /// Texture fetches after the barrier see prior shader writes.
    pub const TEXTURE_FETCH: MemoryBarrier = MemoryBarrier(0x0000_0008);
    /// Shader storage accesses after the barrier see prior shader writes.
    pub const SHADER_STORAGE: MemoryBarrier = MemoryBarrier(0x0000_2000);
    /// Every barrier bit.
    pub const ALL: MemoryBarrier = MemoryBarrier(0xFFFF_FFFF);
}

impl std::ops::BitOr for MemoryBarrier {
    type Output = MemoryBarrier;

    fn bitor(self, rhs: Self) -> Self::Output {
        MemoryBarrier(self.0 | rhs.0)
    }
}

/// Parameters of a full 2D texture image specification.
#[derive(Debug, Clone, Copy)]
pub struct TextureUpload<'a> {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// GPU storage format.
    pub internal_format: super::InternalFormat,
    /// Layout of `data` on the CPU side.
    pub pixel_format: super::PixelFormat,
    /// Component type of `data`.
    pub component_type: super::ComponentType,
    /// Initial contents, or `None` for uninitialized storage.
    pub data: Option<&'a [u8]>,
}
