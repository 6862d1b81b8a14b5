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

//! 2D textures.

use crate::builder::{BuildState, BuildTarget, Builder};
use crate::context::GfxContext;
use crate::device::{
    bytes_per_pixel, pixel_buffer_len, ComponentType, FilterMode, GlHandle, InternalFormat,
    ObjectKind, PixelFormat, TextureUpload,
};
use crate::error::ResourceError;
use crate::handle::{HandleOwner, TextureObject};
use crate::io::{AssetIo, DecodedImage};
use std::path::{Path, PathBuf};

/// Parameters of a built texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// GPU storage format.
    pub internal_format: InternalFormat,
    /// CPU-side channel layout used for the upload.
    pub pixel_format: PixelFormat,
    /// CPU-side component type used for the upload.
    pub component_type: ComponentType,
    /// Min/mag filter.
    pub filter: FilterMode,
}

impl TextureInfo {
    /// Bytes of CPU data matching the size and pixel layout, or `None` if
    /// that does not fit in `usize`.
    pub fn byte_len(&self) -> Option<usize> {
        pixel_buffer_len(
            self.width,
            self.height,
            bytes_per_pixel(self.pixel_format, self.component_type),
        )
    }
}

/// A resource that can be written to an image file.
pub trait Exportable {
    /// Writes the resource's contents as a PNG file.
    fn export_to_file(&self, io: &dyn AssetIo, path: &Path) -> Result<(), ResourceError>;
}

#[derive(Debug, Clone)]
enum TextureData {
    Bytes(Vec<u8>),
    File(PathBuf),
}

/// Configures and uploads a [`Texture`].
#[derive(Debug, Clone)]
pub struct TextureBuilder {
    name: String,
    size: Option<(u32, u32)>,
    internal_format: Option<InternalFormat>,
    pixel_layout: Option<(PixelFormat, ComponentType)>,
    filter: FilterMode,
    data: Option<TextureData>,
}

impl TextureBuilder {
    /// Starts a texture configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: None,
            internal_format: None,
            pixel_layout: None,
            filter: FilterMode::Nearest,
            data: None,
        }
    }

    /// Sets the dimensions. Required unless the data comes from a file.
    pub fn set_size(&mut self, width: u32, height: u32) -> &mut Self {
        self.size = Some((width, height));
        self
    }

    /// Sets the storage format. Required.
    pub fn set_format(&mut self, internal_format: InternalFormat) -> &mut Self {
        self.internal_format = Some(internal_format);
        self
    }

    /// Sets the layout of data passed to [`set_data`](Self::set_data).
    ///
    /// Defaults to the storage format's
    /// [`default_pixel_layout`](InternalFormat::default_pixel_layout).
    pub fn set_pixel_layout(&mut self, format: PixelFormat, component: ComponentType) -> &mut Self {
        self.pixel_layout = Some((format, component));
        self
    }

    /// Sets the min/mag filter. Defaults to nearest.
    pub fn set_filter(&mut self, filter: FilterMode) -> &mut Self {
        self.filter = filter;
        self
    }

    /// Uses `data` as the initial contents.
    ///
    /// The size must already be set; data whose length does not match is
    /// dropped with a warning.
    pub fn set_data(&mut self, data: Vec<u8>) -> &mut Self {
        match self.expected_len() {
            Ok(expected) if expected == data.len() => self.data = Some(TextureData::Bytes(data)),
            Ok(expected) => log::warn!(
                "texture '{}': got {} bytes of data, expected {expected}",
                self.name,
                data.len()
            ),
            Err(reason) => log::warn!("texture '{}': {reason}", self.name),
        }
        self
    }

    /// Loads the initial contents from an image file when the texture is built.
    ///
    /// The image is decoded to RGBA8 and its dimensions replace any size set
    /// on the builder.
    pub fn set_data_from_file(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.data = Some(TextureData::File(path.into()));
        self
    }

    fn pixel_layout(&self, internal_format: InternalFormat) -> (PixelFormat, ComponentType) {
        self.pixel_layout
            .unwrap_or_else(|| internal_format.default_pixel_layout())
    }

    fn expected_len(&self) -> Result<usize, &'static str> {
        let (width, height) = self.size.ok_or("set the size before the data")?;
        let (format, component) = self
            .internal_format
            .map(|internal| self.pixel_layout(internal))
            .or(self.pixel_layout)
            .unwrap_or((PixelFormat::Rgba, ComponentType::Float));
        pixel_buffer_len(width, height, bytes_per_pixel(format, component))
            .ok_or("size does not fit in memory")
    }
}

impl Builder for TextureBuilder {
    type Target = Texture;

    fn name(&self) -> &str {
        &self.name
    }

    fn build_target(&self, ctx: &GfxContext) -> Texture {
        let mut texture = Texture {
            state: BuildState::new(&self.name),
            owner: None,
            info: None,
        };

        let image = match &self.data {
            Some(TextureData::File(path)) => match ctx.io().decode_image(path) {
                Ok(image) => {
                    log::info!(
                        "texture '{}': loaded {}x{} image from {}",
                        self.name,
                        image.width(),
                        image.height(),
                        path.display()
                    );
                    Some(image)
                }
                Err(err) => {
                    log::warn!("texture '{}': {err}", self.name);
                    return texture;
                }
            },
            _ => None,
        };

        let size = image
            .as_ref()
            .map(|image| (image.width(), image.height()))
            .or(self.size);
        let Some((width, height)) = size else {
            log::warn!("texture '{}': size is not set, not building", self.name);
            return texture;
        };
        let Some(internal_format) = self.internal_format else {
            log::warn!("texture '{}': format is not set, not building", self.name);
            return texture;
        };
        let (pixel_format, component_type) = if image.is_some() {
            (PixelFormat::Rgba, ComponentType::UnsignedByte)
        } else {
            self.pixel_layout(internal_format)
        };
        let info = TextureInfo {
            width,
            height,
            internal_format,
            pixel_format,
            component_type,
            filter: self.filter,
        };
        let data: Option<&[u8]> = match (&image, &self.data) {
            (Some(image), _) => Some(image.pixels()),
            (None, Some(TextureData::Bytes(bytes))) => Some(bytes.as_slice()),
            _ => None,
        };
        let Some(byte_len) = info.byte_len() else {
            log::warn!(
                "texture '{}': {width}x{height} {pixel_format:?}/{component_type:?} does not fit in memory",
                self.name
            );
            return texture;
        };
        if let Some(data) = data {
            if data.len() != byte_len {
                log::warn!(
                    "texture '{}': {} bytes of data do not match {}x{} {:?}/{:?}",
                    self.name,
                    data.len(),
                    width,
                    height,
                    pixel_format,
                    component_type
                );
                return texture;
            }
        }

        let owner = match HandleOwner::allocate(ctx.registry(), ObjectKind::Texture, None) {
            Ok(owner) => owner,
            Err(err) => {
                log::warn!("texture '{}': {err}", self.name);
                return texture;
            }
        };
        let device = owner.device();
        device.bind_texture(Some(owner.raw()));
        device.tex_image_2d(&TextureUpload {
            width,
            height,
            internal_format,
            pixel_format,
            component_type,
            data,
        });
        device.set_texture_sampling(self.filter);
        log::info!(
            "texture '{}': built {width}x{height} {internal_format:?}",
            self.name
        );

        texture.owner = Some(owner);
        texture.info = Some(info);
        texture.state.mark_complete();
        texture
    }
}

/// A 2D texture. Cloning shares the driver object.
#[derive(Debug, Clone)]
pub struct Texture {
    state: BuildState,
    owner: Option<HandleOwner<TextureObject>>,
    info: Option<TextureInfo>,
}

impl Texture {
    /// The driver name, if one was allocated.
    pub fn handle(&self) -> Option<GlHandle> {
        self.owner.as_ref().map(HandleOwner::raw)
    }

    /// Size and formats, if the texture was built.
    pub fn info(&self) -> Option<&TextureInfo> {
        self.info.as_ref()
    }

    /// Binds the texture to texture unit `unit`.
    pub fn bind(&self, unit: u32) {
        if let Some(owner) = &self.owner {
            let device = owner.device();
            device.active_texture_unit(unit);
            device.bind_texture(Some(owner.raw()));
        }
    }

    /// Returns `true` if both values share one driver object.
    pub fn shares_handle_with(&self, other: &Texture) -> bool {
        match (&self.owner, &other.owner) {
            (Some(a), Some(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl BuildTarget for Texture {
    fn build_state(&self) -> &BuildState {
        &self.state
    }
}

impl Exportable for Texture {
    fn export_to_file(&self, io: &dyn AssetIo, path: &Path) -> Result<(), ResourceError> {
        let (Some(owner), Some(info), true) = (&self.owner, &self.info, self.is_complete()) else {
            return Err(ResourceError::Incomplete {
                name: self.name().to_owned(),
            });
        };
        let pixels = owner
            .device()
            .read_texture_rgba8(owner.raw(), info.width, info.height);
        let image = DecodedImage::new(info.width, info.height, pixels)?;
        io.encode_png(path, &image)?;
        log::info!("texture '{}': saved to {}", self.name(), path.display());
        Ok(())
    }
}
