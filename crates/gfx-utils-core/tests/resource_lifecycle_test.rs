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

use std::rc::Rc;

use gfx_utils_core::device::{HeadlessDevice, InternalFormat, ObjectClass};
use gfx_utils_core::io::MemoryAssetIo;
use gfx_utils_core::prelude::*;

fn context() -> (Rc<HeadlessDevice>, GfxContext) {
    let device = Rc::new(HeadlessDevice::new());
    let ctx = GfxContext::new(
        device.clone(),
        Rc::new(MemoryAssetIo::new()),
        GfxSettings::default(),
    );
    (device, ctx)
}

#[test]
fn test_configured_builders_complete() {
    let (_, ctx) = context();
    let shader = ShaderBuilder::new("vs")
        .set_stage(ShaderStage::Vertex)
        .set_source("#version 460 core\nvoid main() {}")
        .build(&ctx);
    let program = ShaderProgramBuilder::new("program")
        .add_shader(&shader)
        .build(&ctx);
    let texture = TextureBuilder::new("color")
        .set_size(2, 2)
        .set_format(InternalFormat::Rgba8)
        .build(&ctx);
    let pass = RenderPassBuilder::new("offscreen")
        .add_color_attachment(&texture, true, gfx_utils_core::math::Vec4::ONE)
        .build(&ctx);
    let vertices = [0.0f32, 0.0, 1.0, 0.0, 0.0, 1.0];
    let vertex_buffer = VertexBufferBuilder::new("triangle", &vertices)
        .add_attribute(2)
        .build(&ctx);
    let storage = StorageBufferBuilder::new("ssbo").set_size(32).build(&ctx);

    assert!(shader.is_complete());
    assert!(program.is_complete());
    assert!(texture.is_complete());
    assert!(pass.is_complete());
    assert!(vertex_buffer.is_complete());
    assert!(storage.is_complete());
    assert_eq!(ctx.registry().live_count_of(ObjectClass::Framebuffer), 1);
}

#[test]
fn test_unconfigured_builders_allocate_nothing() {
    let (device, ctx) = context();
    let targets = [
        ShaderBuilder::new("no-stage").set_source("void main() {}").build(&ctx).is_complete(),
        ShaderBuilder::new("no-source")
            .set_stage(ShaderStage::Fragment)
            .build(&ctx)
            .is_complete(),
        ShaderProgramBuilder::new("empty").build(&ctx).is_complete(),
        TextureBuilder::new("no-size")
            .set_format(InternalFormat::Rgba8)
            .build(&ctx)
            .is_complete(),
        VertexBufferBuilder::new("no-data", &[]).add_attribute(3).build(&ctx).is_complete(),
        StorageBufferBuilder::new("no-size").build(&ctx).is_complete(),
    ];
    assert!(targets.iter().all(|complete| !complete));
    assert_eq!(device.allocation_count(), 0);
    assert_eq!(ctx.registry().live_count(), 0);
}

#[test]
fn test_clones_share_one_delete() {
    let (device, ctx) = context();
    let texture = TextureBuilder::new("shared")
        .set_size(1, 1)
        .set_format(InternalFormat::R8)
        .build(&ctx);
    let handle = texture.handle().unwrap();
    let mut clones: Vec<Texture> = (0..4).map(|_| texture.clone()).collect();
    assert!(clones.iter().all(|clone| clone.shares_handle_with(&texture)));

    drop(texture);
    clones.truncate(1);
    assert!(device.is_live(handle));
    assert_eq!(device.delete_count(handle), 0);

    drop(clones);
    assert!(!device.is_live(handle));
    assert_eq!(device.delete_count(handle), 1);
}

#[test]
fn test_shutdown_then_drop_deletes_once() {
    let (device, ctx) = context();
    let storage = StorageBufferBuilder::new("late").set_size(8).build(&ctx);
    let handle = storage.handle().unwrap();

    assert_eq!(ctx.shutdown(), 1);
    assert_eq!(ctx.shutdown(), 0);
    drop(storage);
    assert_eq!(device.delete_count(handle), 1);

    let stats = ctx.registry().stats();
    assert_eq!((stats.allocated, stats.released), (1, 1));
    assert_eq!(stats.live.values().sum::<usize>(), 0);
}

#[test]
fn test_context_reused_after_shutdown_keeps_new_objects() {
    let device = Rc::new(HeadlessDevice::new().with_name_reuse());
    let ctx = GfxContext::new(
        device.clone(),
        Rc::new(MemoryAssetIo::new()),
        GfxSettings::default(),
    );
    let before = TextureBuilder::new("before")
        .set_size(1, 1)
        .set_format(InternalFormat::Rgba8)
        .build(&ctx);
    ctx.shutdown();

    let after = TextureBuilder::new("after")
        .set_size(1, 1)
        .set_format(InternalFormat::Rgba8)
        .build(&ctx);
    assert_eq!(before.handle(), after.handle());

    drop(before);
    let name = after.handle().unwrap();
    assert!(device.is_live(name));
    assert_eq!(device.delete_count(name), 1);
    assert_eq!(ctx.registry().live_count_of(ObjectClass::Texture), 1);
}
