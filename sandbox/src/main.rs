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

//! Renders a few frames of a lit triangle into an off-screen target against
//! the headless device, then exports the target to `sandbox.png`.
//!
//! Usage: `sandbox [settings.json]`

use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result, bail};
use gfx_utils_core::app::{App, FlyCamera, FrameSurface, InputState, Key};
use gfx_utils_core::device::{
    ComponentType, HeadlessDevice, InternalFormat, PixelFormat, PrimitiveMode,
};
use gfx_utils_core::io::AssetIo;
use gfx_utils_core::math::{Mat4, Vec3, Vec4};
use gfx_utils_core::prelude::*;
use gfx_utils_io::FsAssetIo;
use gfx_utils_telemetry::{LogConfig, init_logging};

const VERTEX_SHADER: &str = "#version 460 core
layout(location = 0) in vec2 a_position;
layout(location = 1) in vec3 a_color;
uniform mat4 u_view_projection;
out vec3 v_color;
void main() {
    v_color = a_color;
    gl_Position = u_view_projection * vec4(a_position, 0.0, 1.0);
}
";

const FRAGMENT_SHADER: &str = "#version 460 core
in vec3 v_color;
uniform float u_time;
out vec4 color;
void main() {
    color = vec4(v_color * (0.5 + 0.5 * sin(u_time)), 1.0);
}
";

#[rustfmt::skip]
const TRIANGLE: [f32; 15] = [
    -0.5, -0.5, 1.0, 0.0, 0.0,
     0.5, -0.5, 0.0, 1.0, 0.0,
     0.0,  0.5, 0.0, 0.0, 1.0,
];

const FRAMES: u32 = 120;

/// A window stand-in that closes after a fixed number of frames and holds W.
struct ScriptedSurface {
    size: (u32, u32),
    frames_left: u32,
}

impl InputState for ScriptedSurface {
    fn is_key_pressed(&self, key: Key) -> bool {
        key == Key::W
    }
}

impl FrameSurface for ScriptedSurface {
    fn should_close(&self) -> bool {
        self.frames_left == 0
    }

    fn poll_events(&mut self) {}

    fn swap_buffers(&mut self) {
        self.frames_left = self.frames_left.saturating_sub(1);
    }

    fn set_title(&mut self, title: &str) {
        log::debug!("title: {title}");
    }

    fn set_vsync(&mut self, enabled: bool) {
        log::debug!("vsync: {enabled}");
    }

    fn inner_size(&self) -> (u32, u32) {
        self.size
    }
}

fn load_settings(io: &dyn AssetIo, path: Option<&Path>) -> Result<GfxSettings> {
    let Some(path) = path else {
        return Ok(GfxSettings::default());
    };
    let json = io
        .read_text(path)
        .with_context(|| format!("reading settings from {}", path.display()))?;
    Ok(GfxSettings::from_json_str(&json)?)
}

fn gradient(width: u32, height: u32) -> Vec<u8> {
    (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .flat_map(|(x, y)| {
            [
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                128,
                255,
            ]
        })
        .collect()
}

fn main() -> Result<()> {
    init_logging(&LogConfig::default())?;

    let io = Rc::new(FsAssetIo::new());
    let settings_path = std::env::args().nth(1).map(PathBuf::from);
    let settings = load_settings(io.as_ref(), settings_path.as_deref())?;
    let (width, height) = (settings.window.width, settings.window.height);

    let device = Rc::new(HeadlessDevice::new());
    let ctx = GfxContext::new(device, io, settings);

    let program = ShaderProgramBuilder::new("triangle")
        .add_shader(
            &ShaderBuilder::new("triangle.vert")
                .set_stage(ShaderStage::Vertex)
                .set_source(VERTEX_SHADER)
                .build(&ctx),
        )
        .add_shader(
            &ShaderBuilder::new("triangle.frag")
                .set_stage(ShaderStage::Fragment)
                .set_source(FRAGMENT_SHADER)
                .build(&ctx),
        )
        .build(&ctx);
    let triangle = VertexBufferBuilder::new("triangle", &TRIANGLE)
        .add_attribute(2)
        .add_attribute(3)
        .build(&ctx);
    let target = TextureBuilder::new("target")
        .set_size(width, height)
        .set_format(InternalFormat::Rgba8)
        .set_pixel_layout(PixelFormat::Rgba, ComponentType::UnsignedByte)
        .set_data(gradient(width, height))
        .build(&ctx);
    let depth = TextureBuilder::new("depth")
        .set_size(width, height)
        .set_format(InternalFormat::DepthComponent24)
        .build(&ctx);
    let offscreen = RenderPassBuilder::new("offscreen")
        .add_color_attachment(&target, true, Vec4::new(0.1, 0.1, 0.12, 1.0))
        .set_depth_attachment(&depth)
        .build(&ctx);
    let screen = RenderPassBuilder::new("screen").build(&ctx);

    if !(program.is_complete() && triangle.is_complete() && offscreen.is_complete()) {
        bail!("sandbox resources failed to build, see the log for details");
    }

    let mut app = App::new(
        ctx.clone(),
        ScriptedSurface {
            size: (width, height),
            frames_left: FRAMES,
        },
    );
    app.set_clear_color(Vec3::new(0.05, 0.05, 0.08));
    let aspect_ratio = app.aspect_ratio();
    let mut camera = FlyCamera::default();
    let mut time = 0.0;
    let config = RenderPassConfig::default();

    app.run(|dt, input| {
        time += dt;
        camera.update(dt, input);
        let view_projection: Mat4 = camera.projection(aspect_ratio) * camera.view();

        offscreen.execute(&config, || {
            program.set_uniform("u_view_projection", view_projection);
            program.set_uniform("u_time", time);
            triangle.draw(PrimitiveMode::Triangles);
        });
        screen.execute(&config, || ());
    });

    target
        .export_to_file(ctx.io(), Path::new("sandbox.png"))
        .context("exporting the off-screen target")?;
    log::info!("camera ended at {}", camera.position);
    app.shutdown();
    Ok(())
}
