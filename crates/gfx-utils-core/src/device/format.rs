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

//! Texture storage and pixel-transfer formats.

use serde::{Deserialize, Serialize};

/// GPU-side storage format of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InternalFormat {
    /// One 8-bit normalized channel.
    R8,
    /// Two 8-bit normalized channels.
    Rg8,
    /// Three 8-bit normalized channels.
    Rgb8,
    /// Four 8-bit normalized channels.
    Rgba8,
    /// Four 8-bit channels, color channels sRGB-encoded.
    Srgb8Alpha8,
    /// One 16-bit float channel.
    R16F,
    /// Four 16-bit float channels.
    Rgba16F,
    /// One 32-bit float channel.
    R32F,
    /// Two 32-bit float channels.
    Rg32F,
    /// Three 32-bit float channels.
    Rgb32F,
    /// Four 32-bit float channels.
    Rgba32F,
    /// 24-bit depth.
    DepthComponent24,
    /// 32-bit float depth.
    DepthComponent32F,
    /// 24-bit depth with 8-bit stencil.
    Depth24Stencil8,
}

impl InternalFormat {
    /// Returns `true` for formats that can only be attached at the depth slot.
    pub fn is_depth(self) -> bool {
        matches!(
            self,
            InternalFormat::DepthComponent24
                | InternalFormat::DepthComponent32F
                | InternalFormat::Depth24Stencil8
        )
    }

    /// The CPU layout used when none is given explicitly.
    ///
    /// Color formats default to RGBA floats. Depth formats need a matching
    /// depth transfer format even when no pixels are uploaded.
    pub fn default_pixel_layout(self) -> (PixelFormat, ComponentType) {
        match self {
            InternalFormat::DepthComponent24 | InternalFormat::DepthComponent32F => {
                (PixelFormat::DepthComponent, ComponentType::Float)
            }
            InternalFormat::Depth24Stencil8 => {
                (PixelFormat::DepthStencil, ComponentType::UnsignedInt24_8)
            }
            _ => (PixelFormat::Rgba, ComponentType::Float),
        }
    }
}

/// Channel layout of CPU-side pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    /// Red only.
    Red,
    /// Red and green.
    Rg,
    /// Red, green and blue.
    Rgb,
    /// Red, green, blue and alpha.
    Rgba,
    /// Depth values.
    DepthComponent,
    /// Packed depth and stencil values.
    DepthStencil,
}

impl PixelFormat {
    /// Number of channels per pixel.
    pub fn channels(self) -> u32 {
        match self {
            PixelFormat::Red | PixelFormat::DepthComponent => 1,
            PixelFormat::Rg | PixelFormat::DepthStencil => 2,
            PixelFormat::Rgb => 3,
            PixelFormat::Rgba => 4,
        }
    }
}

/// Per-channel data type of CPU-side pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentType {
    /// `u8` per channel.
    UnsignedByte,
    /// `f32` per channel.
    Float,
    /// 24-bit depth and 8-bit stencil packed in one `u32`.
    UnsignedInt24_8,
}

impl ComponentType {
    /// Size of one channel in bytes. Packed types report their full size.
    pub fn size_bytes(self) -> u32 {
        match self {
            ComponentType::UnsignedByte => 1,
            ComponentType::Float | ComponentType::UnsignedInt24_8 => 4,
        }
    }

    /// Returns `true` if one value holds every channel of a pixel.
    pub fn is_packed(self) -> bool {
        matches!(self, ComponentType::UnsignedInt24_8)
    }
}

/// Number of bytes one pixel occupies in CPU memory with the given layout.
pub fn bytes_per_pixel(format: PixelFormat, component: ComponentType) -> u32 {
    if component.is_packed() {
        component.size_bytes()
    } else {
        format.channels() * component.size_bytes()
    }
}

/// Bytes of a tightly packed `width` x `height` image, or `None` if the
/// size does not fit in `usize`.
pub fn pixel_buffer_len(width: u32, height: u32, bytes_per_pixel: u32) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(bytes_per_pixel as usize)
}

/// Minification and magnification filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FilterMode {
    /// Nearest texel.
    #[default]
    Nearest,
    /// Bilinear interpolation.
    Linear,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_formats_default_to_depth_layout() {
        assert_eq!(
            InternalFormat::DepthComponent32F.default_pixel_layout(),
            (PixelFormat::DepthComponent, ComponentType::Float)
        );
        assert_eq!(
            InternalFormat::Depth24Stencil8.default_pixel_layout(),
            (PixelFormat::DepthStencil, ComponentType::UnsignedInt24_8)
        );
        assert_eq!(
            InternalFormat::R32F.default_pixel_layout(),
            (PixelFormat::Rgba, ComponentType::Float)
        );
    }

    #[test]
    fn test_pixel_buffer_len_does_not_wrap() {
        assert_eq!(pixel_buffer_len(2, 3, 4), Some(24));
        assert_eq!(pixel_buffer_len(0, 4096, 16), Some(0));
        let rgba32f = bytes_per_pixel(PixelFormat::Rgba, ComponentType::Float);
        assert_eq!(
            pixel_buffer_len(16384, 16384, rgba32f),
            16384usize.checked_mul(16384 * 16)
        );
        assert_eq!(pixel_buffer_len(u32::MAX, u32::MAX, 16), None);
    }

    #[test]
    fn test_bytes_per_pixel() {
        assert_eq!(bytes_per_pixel(PixelFormat::Rgba, ComponentType::UnsignedByte), 4);
        assert_eq!(bytes_per_pixel(PixelFormat::Rgba, ComponentType::Float), 16);
        assert_eq!(bytes_per_pixel(PixelFormat::Red, ComponentType::Float), 4);
        assert_eq!(
            bytes_per_pixel(PixelFormat::DepthStencil, ComponentType::UnsignedInt24_8),
            4
        );
    }
}
