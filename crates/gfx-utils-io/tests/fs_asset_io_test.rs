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

use std::fs;
use std::path::Path;

use anyhow::Result;
use gfx_utils_core::error::AssetError;
use gfx_utils_core::io::{AssetIo, DecodedImage};
use gfx_utils_io::FsAssetIo;
use tempfile::tempdir;

#[test]
fn test_read_shader_source() -> Result<()> {
    let dir = tempdir()?;
    fs::create_dir(dir.path().join("shaders"))?;
    fs::write(dir.path().join("shaders/flat.frag"), "void main() {}\n")?;

    let io = FsAssetIo::with_root(dir.path());
    assert_eq!(io.read_text(Path::new("shaders/flat.frag"))?, "void main() {}\n");
    Ok(())
}

#[test]
fn test_png_round_trip_keeps_row_order() -> Result<()> {
    let dir = tempdir()?;
    let io = FsAssetIo::with_root(dir.path());
    // Bottom row red, top row blue.
    let pixels = vec![
        255, 0, 0, 255, 255, 0, 0, 255, //
        0, 0, 255, 255, 0, 0, 255, 255,
    ];
    let image = DecodedImage::new(2, 2, pixels.clone())?;

    io.encode_png(Path::new("out.png"), &image)?;
    let decoded = io.decode_image(Path::new("out.png"))?;
    assert_eq!((decoded.width(), decoded.height()), (2, 2));
    assert_eq!(decoded.pixels(), pixels.as_slice());
    Ok(())
}

#[test]
fn test_png_on_disk_is_top_row_first() -> Result<()> {
    let dir = tempdir()?;
    let io = FsAssetIo::with_root(dir.path());
    let pixels = vec![
        255, 0, 0, 255, // bottom
        0, 0, 255, 255, // top
    ];
    io.encode_png(Path::new("column.png"), &DecodedImage::new(1, 2, pixels)?)?;

    let on_disk = image::open(dir.path().join("column.png"))?.into_rgba8();
    assert_eq!(on_disk.get_pixel(0, 0).0, [0, 0, 255, 255]);
    assert_eq!(on_disk.get_pixel(0, 1).0, [255, 0, 0, 255]);
    Ok(())
}

#[test]
fn test_garbage_is_a_decode_error() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("broken.png"), b"not a png")?;
    let io = FsAssetIo::with_root(dir.path());
    assert!(matches!(
        io.decode_image(Path::new("broken.png")),
        Err(AssetError::Decode { .. })
    ));
    Ok(())
}
