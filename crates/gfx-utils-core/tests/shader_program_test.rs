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

use gfx_utils_core::device::{HeadlessDevice, UniformValue};
use gfx_utils_core::io::MemoryAssetIo;
use gfx_utils_core::math::{Mat4, Vec3};
use gfx_utils_core::prelude::*;
use gfx_utils_core::resource::ShaderDataType;
use gfx_utils_core::settings::GlVersion;

const VERTEX: &str = "#version 460 core
layout(location = 0) in vec3 a_position;
uniform mat4 u_mvp;
void main() {
    gl_Position = u_mvp * vec4(a_position, 1.0);
}
";

const FRAGMENT: &str = "#version 460 core
uniform float u_x;
uniform vec3 u_lights[2];
uniform sampler2D u_albedo;
out vec4 color;
void main() {
    color = vec4(u_lights[0] * u_x, 1.0);
}
";

fn context_with(
    device: HeadlessDevice,
    settings: GfxSettings,
) -> (Rc<HeadlessDevice>, Rc<MemoryAssetIo>, GfxContext) {
    let device = Rc::new(device);
    let io = Rc::new(MemoryAssetIo::new());
    let ctx = GfxContext::new(device.clone(), io.clone(), settings);
    (device, io, ctx)
}

fn shader(ctx: &GfxContext, stage: ShaderStage, source: &str) -> Shader {
    ShaderBuilder::new(format!("{stage}"))
        .set_stage(stage)
        .set_source(source)
        .build(ctx)
}

#[test]
fn test_uniforms_are_reflected_at_link() {
    let (_, _, ctx) = context_with(HeadlessDevice::new(), GfxSettings::default());
    let program = ShaderProgramBuilder::new("lit")
        .add_shader(&shader(&ctx, ShaderStage::Vertex, VERTEX))
        .add_shader(&shader(&ctx, ShaderStage::Fragment, FRAGMENT))
        .build(&ctx);
    assert!(program.is_complete());

    let mut reflected: Vec<(&str, ShaderDataType)> = program
        .uniform_info()
        .iter()
        .map(|info| (info.name.as_str(), info.data_type))
        .collect();
    reflected.sort_by(|a, b| a.0.cmp(b.0));
    assert_eq!(
        reflected,
        vec![
            ("u_albedo", ShaderDataType::Sampler2D),
            ("u_lights[0]", ShaderDataType::Vec3),
            ("u_lights[1]", ShaderDataType::Vec3),
            ("u_mvp", ShaderDataType::Mat4),
            ("u_x", ShaderDataType::Float),
        ]
    );
}

#[test]
fn test_set_uniform_round_trips() {
    let (device, _, ctx) = context_with(HeadlessDevice::new(), GfxSettings::default());
    let program = ShaderProgramBuilder::new("lit")
        .add_shader(&shader(&ctx, ShaderStage::Vertex, VERTEX))
        .add_shader(&shader(&ctx, ShaderStage::Fragment, FRAGMENT))
        .build(&ctx);
    let handle = program.handle().unwrap();

    program.set_uniform("u_x", 0.5f32);
    program.set_uniform("u_lights[1]", Vec3::new(1.0, 2.0, 3.0));
    program.set_uniform("u_mvp", Mat4::IDENTITY);

    assert_eq!(device.uniform_value(handle, "u_x"), Some(UniformValue::Float(0.5)));
    assert_eq!(
        device.uniform_value(handle, "u_lights[1]"),
        Some(UniformValue::Vec3(Vec3::new(1.0, 2.0, 3.0)))
    );
    assert_eq!(
        device.uniform_value(handle, "u_mvp"),
        Some(UniformValue::Mat4(Mat4::IDENTITY))
    );
    assert_eq!(device.current_program(), Some(handle));
}

#[test]
fn test_unknown_uniform_is_ignored() {
    let (device, _, ctx) = context_with(HeadlessDevice::new(), GfxSettings::default());
    let program = ShaderProgramBuilder::new("lit")
        .add_shader(&shader(&ctx, ShaderStage::Vertex, VERTEX))
        .build(&ctx);
    let before = program.uniform_info().len();
    device.take_calls();

    program.set_uniform("u_typo", 1.0f32);
    assert_eq!(program.uniform_location("u_typo"), None);
    assert_eq!(program.uniform_info().len(), before);
    assert!(device.take_calls().is_empty());
}

#[test]
fn test_version_is_lowered_to_context() {
    let settings = GfxSettings {
        gl_version: GlVersion { major: 4, minor: 5 },
        ..GfxSettings::default()
    };
    let (device, _, ctx) =
        context_with(HeadlessDevice::new().with_max_glsl_version(450), settings);
    let fragment = shader(&ctx, ShaderStage::Fragment, FRAGMENT);
    assert!(fragment.is_complete());

    let uploaded = device.shader_source_of(fragment.handle().unwrap()).unwrap();
    assert_eq!(uploaded.matches("#version").count(), 1);
    assert!(uploaded.starts_with("#version 450 core\n"));
    assert_eq!(uploaded.replacen("450", "460", 1), FRAGMENT);
}

#[test]
fn test_source_from_asset_io() {
    let (device, io, ctx) = context_with(HeadlessDevice::new(), GfxSettings::default());
    io.insert_text("shaders/lit.vert", VERTEX);
    let vertex = ShaderBuilder::new("lit.vert")
        .set_stage(ShaderStage::Vertex)
        .set_source_from_file("shaders/lit.vert")
        .build(&ctx);
    assert!(vertex.is_complete());
    assert_eq!(
        device.shader_source_of(vertex.handle().unwrap()).as_deref(),
        Some(VERTEX)
    );

    let missing = ShaderBuilder::new("missing.vert")
        .set_stage(ShaderStage::Vertex)
        .set_source_from_file("shaders/missing.vert")
        .build(&ctx);
    assert!(!missing.is_complete());
    assert_eq!(missing.handle(), None);
}

#[test]
fn test_compile_failure_keeps_handle() {
    let (device, _, ctx) = context_with(HeadlessDevice::new(), GfxSettings::default());
    let broken = shader(&ctx, ShaderStage::Fragment, "#version 460 core\nint x;");
    assert!(!broken.is_complete());
    let handle = broken.handle().unwrap();
    assert!(device.is_live(handle));

    let program = ShaderProgramBuilder::new("broken")
        .add_shader(&broken)
        .build(&ctx);
    assert!(!program.is_complete());
}

#[test]
fn test_unsupported_uniform_types_are_skipped() {
    let (_, _, ctx) = context_with(HeadlessDevice::new(), GfxSettings::default());
    let fragment = "#version 460 core
uniform sampler3D u_vol;
uniform float u_x;
out vec4 color;
void main() {
    color = vec4(u_x);
}
";
    let program = ShaderProgramBuilder::new("volume")
        .add_shader(&shader(&ctx, ShaderStage::Vertex, VERTEX))
        .add_shader(&shader(&ctx, ShaderStage::Fragment, fragment))
        .build(&ctx);
    assert!(program.is_complete());

    let names: Vec<&str> = program
        .uniform_info()
        .iter()
        .map(|info| info.name.as_str())
        .collect();
    assert!(names.contains(&"u_x"));
    assert!(!names.contains(&"u_vol"));
    assert!(program.uniform_location("u_x").is_some());
    assert_eq!(program.uniform_location("u_vol"), None);
}
