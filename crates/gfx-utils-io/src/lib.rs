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

//! [`AssetIo`] over the local filesystem.
//!
//! Images are decoded with the `image` crate and flipped so the first row in
//! memory is the bottom row, as OpenGL expects. Exports flip back before
//! writing.

#![warn(missing_docs)]

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use gfx_utils_core::device::pixel_buffer_len;
use gfx_utils_core::error::AssetError;
use gfx_utils_core::io::{AssetIo, DecodedImage};
use image::{ImageFormat, RgbaImage};

/// Reads and writes assets on disk, relative to an optional root directory.
#[derive(Debug, Clone, Default)]
pub struct FsAssetIo {
    root: Option<PathBuf>,
}

impl FsAssetIo {
    /// Resolves paths against the working directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves relative paths against `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, AssetError> {
        let full = self.resolve(path);
        fs::read(&full).map_err(|source| io_error(full, source))
    }
}

fn io_error(path: PathBuf, source: io::Error) -> AssetError {
    if source.kind() == io::ErrorKind::NotFound {
        AssetError::NotFound { path }
    } else {
        AssetError::Io { path, source }
    }
}

impl AssetIo for FsAssetIo {
    fn read_text(&self, path: &Path) -> Result<String, AssetError> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|err| AssetError::Decode {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })
    }

    fn decode_image(&self, path: &Path) -> Result<DecodedImage, AssetError> {
        let bytes = self.read(path)?;
        let decoded = image::load_from_memory(&bytes).map_err(|err| AssetError::Decode {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        let rgba = decoded.flipv().into_rgba8();
        let (width, height) = rgba.dimensions();
        log::debug!("decoded {}x{} image from {}", width, height, path.display());
        DecodedImage::new(width, height, rgba.into_raw())
    }

    fn encode_png(&self, path: &Path, image: &DecodedImage) -> Result<(), AssetError> {
        let expected = pixel_buffer_len(image.width(), image.height(), DecodedImage::CHANNELS)
            .ok_or(AssetError::ImageTooLarge {
                width: image.width(),
                height: image.height(),
            })?;
        let buffer = RgbaImage::from_raw(image.width(), image.height(), image.pixels().to_vec())
            .ok_or(AssetError::InvalidPixelBuffer {
                expected,
                actual: image.pixels().len(),
            })?;
        let full = self.resolve(path);
        image::imageops::flip_vertical(&buffer)
            .save_with_format(&full, ImageFormat::Png)
            .map_err(|err| AssetError::Encode {
                path: full.clone(),
                reason: err.to_string(),
            })?;
        log::debug!("wrote {}", full.display());
        Ok(())
    }
}
