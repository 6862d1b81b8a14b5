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

//! The asset I/O seam: text sources and images in, PNG files out.
//!
//! Images cross this boundary as tightly packed RGBA8 rows ordered bottom to
//! top, which is the row order GL uses for texture uploads and readback.
//! Implementations flip rows when decoding and flip them back when encoding.

use crate::device::pixel_buffer_len;
use crate::error::AssetError;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// Tightly packed RGBA8 pixels, bottom row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl DecodedImage {
    /// Bytes per pixel; always RGBA8.
    pub const CHANNELS: u32 = 4;

    /// Wraps a pixel buffer after checking it matches the dimensions.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, AssetError> {
        let expected = pixel_buffer_len(width, height, Self::CHANNELS)
            .ok_or(AssetError::ImageTooLarge { width, height })?;
        if pixels.len() != expected {
            return Err(AssetError::InvalidPixelBuffer {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The pixel bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Consumes the image, returning its pixel bytes.
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }
}

/// Synchronous access to shader sources and image files.
pub trait AssetIo: Debug {
    /// Reads a whole text file.
    fn read_text(&self, path: &Path) -> Result<String, AssetError>;

    /// Decodes an image file into RGBA8, bottom row first.
    fn decode_image(&self, path: &Path) -> Result<DecodedImage, AssetError>;

    /// Encodes RGBA8 pixels (bottom row first) into a PNG file.
    fn encode_png(&self, path: &Path, image: &DecodedImage) -> Result<(), AssetError>;
}

#[derive(Debug, Clone)]
enum MemoryAsset {
    Text(String),
    Image(DecodedImage),
}

/// An [`AssetIo`] over an in-memory path map.
///
/// Useful for embedded assets and tests. PNG "files" written through it are
/// stored as images and can be read back with [`image`](Self::image).
#[derive(Debug, Default)]
pub struct MemoryAssetIo {
    assets: RefCell<HashMap<PathBuf, MemoryAsset>>,
}

impl MemoryAssetIo {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a text asset.
    pub fn insert_text(&self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.assets
            .borrow_mut()
            .insert(path.into(), MemoryAsset::Text(text.into()));
    }

    /// Stores an image asset.
    pub fn insert_image(&self, path: impl Into<PathBuf>, image: DecodedImage) {
        self.assets
            .borrow_mut()
            .insert(path.into(), MemoryAsset::Image(image));
    }

    /// The image stored at a path, if any.
    pub fn image(&self, path: impl AsRef<Path>) -> Option<DecodedImage> {
        match self.assets.borrow().get(path.as_ref()) {
            Some(MemoryAsset::Image(image)) => Some(image.clone()),
            _ => None,
        }
    }
}

impl AssetIo for MemoryAssetIo {
    fn read_text(&self, path: &Path) -> Result<String, AssetError> {
        match self.assets.borrow().get(path) {
            Some(MemoryAsset::Text(text)) => Ok(text.clone()),
            Some(MemoryAsset::Image(_)) => Err(AssetError::Decode {
                path: path.to_path_buf(),
                reason: "not a text asset".to_owned(),
            }),
            None => Err(AssetError::NotFound {
                path: path.to_path_buf(),
            }),
        }
    }

    fn decode_image(&self, path: &Path) -> Result<DecodedImage, AssetError> {
        match self.assets.borrow().get(path) {
            Some(MemoryAsset::Image(image)) => Ok(image.clone()),
            Some(MemoryAsset::Text(_)) => Err(AssetError::Decode {
                path: path.to_path_buf(),
                reason: "not an image asset".to_owned(),
            }),
            None => Err(AssetError::NotFound {
                path: path.to_path_buf(),
            }),
        }
    }

    fn encode_png(&self, path: &Path, image: &DecodedImage) -> Result<(), AssetError> {
        self.insert_image(path, image.clone());
        Ok(())
    }
}
