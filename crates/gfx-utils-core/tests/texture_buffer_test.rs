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

use std::path::Path;
use std::rc::Rc;

use gfx_utils_core::device::{
    BufferTarget, ComponentType, DeviceCall, HeadlessDevice, InternalFormat, MemoryBarrier,
    PixelFormat, PrimitiveMode,
};
use gfx_utils_core::io::{DecodedImage, MemoryAssetIo};
use gfx_utils_core::prelude::*;

fn context() -> (Rc<HeadlessDevice>, Rc<MemoryAssetIo>, GfxContext) {
    let device = Rc::new(HeadlessDevice::new());
    let io = Rc::new(MemoryAssetIo::new());
    let ctx = GfxContext::new(device.clone(), io.clone(), GfxSettings::default());
    (device, io, ctx)
}

#[test]
fn test_texture_round_trips_through_export() {
    let (_, io, ctx) = context();
    let pixels: Vec<u8> = (0..2 * 2 * 4).collect();
    let texture = TextureBuilder::new("checker")
        .set_size(2, 2)
        .set_format(InternalFormat::Rgba8)
        .set_pixel_layout(PixelFormat::Rgba, ComponentType::UnsignedByte)
        .set_data(pixels.clone())
        .build(&ctx);
    assert!(texture.is_complete());

    texture
        .export_to_file(ctx.io(), Path::new("out/checker.png"))
        .unwrap();
    let exported = io.image("out/checker.png").unwrap();
    assert_eq!((exported.width(), exported.height()), (2, 2));
    assert_eq!(exported.pixels(), pixels.as_slice());
}

#[test]
fn test_texture_from_file_takes_image_size() {
    let (device, io, ctx) = context();
    let image = DecodedImage::new(3, 1, vec![255; 3 * 4]).unwrap();
    io.insert_image("textures/strip.png", image);

    let texture = TextureBuilder::new("strip")
        .set_size(64, 64)
        .set_format(InternalFormat::Srgb8Alpha8)
        .set_data_from_file("textures/strip.png")
        .build(&ctx);
    assert!(texture.is_complete());
    let info = texture.info().unwrap();
    assert_eq!((info.width, info.height), (3, 1));
    assert_eq!(
        device.texture_pixels(texture.handle().unwrap()),
        Some(vec![255; 12])
    );

    let missing = TextureBuilder::new("missing")
        .set_format(InternalFormat::Rgba8)
        .set_data_from_file("textures/missing.png")
        .build(&ctx);
    assert!(!missing.is_complete());
}

#[test]
fn test_vertex_layout_offsets() {
    let (device, _, ctx) = context();
    let vertices = [0.0f32; 7 * 3];
    let buffer = VertexBufferBuilder::new("mesh", &vertices)
        .add_attribute(2)
        .add_attribute(2)
        .add_attribute(3)
        .build(&ctx);
    assert!(buffer.is_complete());
    assert_eq!(buffer.layout().stride(), 28);

    let records = device.vertex_attributes(buffer.vertex_array().unwrap());
    let described: Vec<(u32, u32, u32)> = records
        .iter()
        .map(|record| (record.index, record.offset, record.stride))
        .collect();
    assert_eq!(described, vec![(0, 0, 28), (1, 8, 28), (2, 16, 28)]);
    assert_eq!(buffer.vertex_count(), 3);
}

#[test]
fn test_compute_pass_with_storage_buffer() {
    let (device, _, ctx) = context();
    let particles = StorageBufferBuilder::new("particles").set_size(16).build(&ctx);
    particles
        .set_data(bytemuck::cast_slice(&[1.0f32, 2.0, 3.0, 4.0]))
        .unwrap();
    device.take_calls();

    particles.bind(0);
    ctx.dispatch_compute(4, 1, 1);
    ctx.memory_barrier(MemoryBarrier::SHADER_STORAGE | MemoryBarrier::VERTEX_ATTRIB_ARRAY);
    ctx.draw_arrays(PrimitiveMode::Points, 0, 4);

    assert_eq!(
        device.take_calls(),
        vec![
            DeviceCall::BindBufferBase {
                target: BufferTarget::ShaderStorage,
                index: 0,
                buffer: particles.handle(),
            },
            DeviceCall::DispatchCompute(4, 1, 1),
            DeviceCall::MemoryBarrier(MemoryBarrier(0x2001)),
            DeviceCall::DrawArrays {
                mode: PrimitiveMode::Points,
                first: 0,
                count: 4,
            },
        ]
    );
    let contents = device.buffer_contents(particles.handle().unwrap()).unwrap();
    let expected: &[u8] = bytemuck::cast_slice(&[1.0f32, 2.0, 3.0, 4.0]);
    assert_eq!(contents, expected);
}
