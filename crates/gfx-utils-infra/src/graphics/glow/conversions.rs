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

use gfx_utils_core::device::{
    BufferTarget, BufferUsage, Capability, ClearMask, ComponentType, FilterMode,
    FramebufferAttachment, FramebufferStatus, InternalFormat, MemoryBarrier, PixelFormat,
    PrimitiveMode, ShaderStage,
};

/// A local extension trait converting core types into GL enumerants.
/// This avoids Rust's orphan rules while keeping an idiomatic `.into_gl()` syntax.
pub trait IntoGl<T> {
    /// Consumes self and converts it into the GL value.
    fn into_gl(self) -> T;
}

// --- Objects ---

impl IntoGl<u32> for ShaderStage {
    fn into_gl(self) -> u32 {
        match self {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
            ShaderStage::Geometry => glow::GEOMETRY_SHADER,
            ShaderStage::TessControl => glow::TESS_CONTROL_SHADER,
            ShaderStage::TessEvaluation => glow::TESS_EVALUATION_SHADER,
            ShaderStage::Compute => glow::COMPUTE_SHADER,
        }
    }
}

impl IntoGl<u32> for BufferTarget {
    fn into_gl(self) -> u32 {
        match self {
            BufferTarget::Array => glow::ARRAY_BUFFER,
            BufferTarget::ShaderStorage => glow::SHADER_STORAGE_BUFFER,
        }
    }
}

impl IntoGl<u32> for BufferUsage {
    fn into_gl(self) -> u32 {
        match self {
            BufferUsage::StaticDraw => glow::STATIC_DRAW,
            BufferUsage::DynamicDraw => glow::DYNAMIC_DRAW,
            BufferUsage::DynamicCopy => glow::DYNAMIC_COPY,
        }
    }
}

// --- Textures ---

impl IntoGl<i32> for InternalFormat {
    fn into_gl(self) -> i32 {
        let format = match self {
            InternalFormat::R8 => glow::R8,
            InternalFormat::Rg8 => glow::RG8,
            InternalFormat::Rgb8 => glow::RGB8,
            InternalFormat::Rgba8 => glow::RGBA8,
            InternalFormat::Srgb8Alpha8 => glow::SRGB8_ALPHA8,
            InternalFormat::R16F => glow::R16F,
            InternalFormat::Rgba16F => glow::RGBA16F,
            InternalFormat::R32F => glow::R32F,
            InternalFormat::Rg32F => glow::RG32F,
            InternalFormat::Rgb32F => glow::RGB32F,
            InternalFormat::Rgba32F => glow::RGBA32F,
            InternalFormat::DepthComponent24 => glow::DEPTH_COMPONENT24,
            InternalFormat::DepthComponent32F => glow::DEPTH_COMPONENT32F,
            InternalFormat::Depth24Stencil8 => glow::DEPTH24_STENCIL8,
        };
        // glTexImage2D takes the internal format as a GLint.
        format as i32
    }
}

impl IntoGl<u32> for PixelFormat {
    fn into_gl(self) -> u32 {
        match self {
            PixelFormat::Red => glow::RED,
            PixelFormat::Rg => glow::RG,
            PixelFormat::Rgb => glow::RGB,
            PixelFormat::Rgba => glow::RGBA,
            PixelFormat::DepthComponent => glow::DEPTH_COMPONENT,
            PixelFormat::DepthStencil => glow::DEPTH_STENCIL,
        }
    }
}

impl IntoGl<u32> for ComponentType {
    fn into_gl(self) -> u32 {
        match self {
            ComponentType::UnsignedByte => glow::UNSIGNED_BYTE,
            ComponentType::Float => glow::FLOAT,
            ComponentType::UnsignedInt24_8 => glow::UNSIGNED_INT_24_8,
        }
    }
}

impl IntoGl<i32> for FilterMode {
    fn into_gl(self) -> i32 {
        match self {
            FilterMode::Nearest => glow::NEAREST as i32,
            FilterMode::Linear => glow::LINEAR as i32,
        }
    }
}

// --- Framebuffers ---

impl IntoGl<u32> for FramebufferAttachment {
    fn into_gl(self) -> u32 {
        match self {
            FramebufferAttachment::Color(slot) => glow::COLOR_ATTACHMENT0 + slot,
            FramebufferAttachment::Depth => glow::DEPTH_ATTACHMENT,
        }
    }
}

/// Maps a `glCheckFramebufferStatus` result back to the core enum.
pub fn framebuffer_status_from_gl(status: u32) -> FramebufferStatus {
    match status {
        glow::FRAMEBUFFER_COMPLETE => FramebufferStatus::Complete,
        glow::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => FramebufferStatus::IncompleteAttachment,
        glow::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => FramebufferStatus::MissingAttachment,
        glow::FRAMEBUFFER_INCOMPLETE_DRAW_BUFFER => FramebufferStatus::IncompleteDrawBuffer,
        glow::FRAMEBUFFER_UNSUPPORTED => FramebufferStatus::Unsupported,
        other => FramebufferStatus::Other(other),
    }
}

// --- Pipeline state ---

impl IntoGl<u32> for Capability {
    fn into_gl(self) -> u32 {
        match self {
            Capability::DepthTest => glow::DEPTH_TEST,
            Capability::FramebufferSrgb => glow::FRAMEBUFFER_SRGB,
        }
    }
}

impl IntoGl<u32> for ClearMask {
    fn into_gl(self) -> u32 {
        let mut bits = 0;
        if self.color {
            bits |= glow::COLOR_BUFFER_BIT;
        }
        if self.depth {
            bits |= glow::DEPTH_BUFFER_BIT;
        }
        bits
    }
}

impl IntoGl<u32> for PrimitiveMode {
    fn into_gl(self) -> u32 {
        match self {
            PrimitiveMode::Points => glow::POINTS,
            PrimitiveMode::Lines => glow::LINES,
            PrimitiveMode::LineStrip => glow::LINE_STRIP,
            PrimitiveMode::Triangles => glow::TRIANGLES,
            PrimitiveMode::TriangleStrip => glow::TRIANGLE_STRIP,
            PrimitiveMode::TriangleFan => glow::TRIANGLE_FAN,
        }
    }
}

impl IntoGl<u32> for MemoryBarrier {
    fn into_gl(self) -> u32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_attachments_are_consecutive() {
        let slots: Vec<u32> = (0..4)
            .map(|slot| FramebufferAttachment::Color(slot).into_gl())
            .collect();
        assert_eq!(
            slots,
            vec![
                glow::COLOR_ATTACHMENT0,
                glow::COLOR_ATTACHMENT1,
                glow::COLOR_ATTACHMENT2,
                glow::COLOR_ATTACHMENT3,
            ]
        );
    }

    #[test]
    fn test_clear_mask_bits() {
        let color: u32 = ClearMask::COLOR.into_gl();
        let both: u32 = ClearMask::COLOR_DEPTH.into_gl();
        assert_eq!(color, glow::COLOR_BUFFER_BIT);
        assert_eq!(both, glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
    }

    #[test]
    fn test_memory_barrier_bits_match_gl() {
        let storage: u32 = MemoryBarrier::SHADER_STORAGE.into_gl();
        let vertex: u32 = MemoryBarrier::VERTEX_ATTRIB_ARRAY.into_gl();
        let fetch: u32 = MemoryBarrier::TEXTURE_FETCH.into_gl();
        let image: u32 = MemoryBarrier::SHADER_IMAGE_ACCESS.into_gl();
        assert_eq!(storage, glow::SHADER_STORAGE_BARRIER_BIT);
        assert_eq!(vertex, glow::VERTEX_ATTRIB_ARRAY_BARRIER_BIT);
        assert_eq!(fetch, glow::TEXTURE_FETCH_BARRIER_BIT);
        assert_eq!(image, glow::SHADER_IMAGE_ACCESS_BARRIER_BIT);
    }

    #[test]
    fn test_framebuffer_status_round_trip() {
        assert_eq!(
            framebuffer_status_from_gl(glow::FRAMEBUFFER_COMPLETE),
            FramebufferStatus::Complete
        );
        assert_eq!(
            framebuffer_status_from_gl(glow::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT),
            FramebufferStatus::MissingAttachment
        );
        assert_eq!(framebuffer_status_from_gl(0x1234), FramebufferStatus::Other(0x1234));
    }

    #[test]
    fn test_depth_formats() {
        let depth: i32 = InternalFormat::DepthComponent24.into_gl();
        assert_eq!(depth, glow::DEPTH_COMPONENT24 as i32);
        let layout = InternalFormat::Depth24Stencil8.default_pixel_layout();
        let format: u32 = layout.0.into_gl();
        let component: u32 = layout.1.into_gl();
        assert_eq!(
            (format, component),
            (glow::DEPTH_STENCIL, glow::UNSIGNED_INT_24_8)
        );
    }
}
