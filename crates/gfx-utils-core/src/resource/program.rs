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

//! Linked shader programs and their uniform cache.

use super::bounded_info_log;
use super::shader::Shader;
use super::uniform::{reflect_uniforms, UniformCache, UniformInfo};
use crate::builder::{BuildState, BuildTarget, Builder};
use crate::context::GfxContext;
use crate::device::{GlHandle, ObjectKind, UniformLocation, UniformValue};
use crate::handle::{HandleOwner, ProgramObject};

/// Configures and links a [`ShaderProgram`].
#[derive(Debug, Clone)]
pub struct ShaderProgramBuilder {
    name: String,
    shaders: Vec<Shader>,
}

impl ShaderProgramBuilder {
    /// Starts a program configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shaders: Vec::new(),
        }
    }

    /// Adds a shader to link. Incomplete shaders are skipped at build time.
    pub fn add_shader(&mut self, shader: &Shader) -> &mut Self {
        self.shaders.push(shader.clone());
        self
    }
}

impl Builder for ShaderProgramBuilder {
    type Target = ShaderProgram;

    fn name(&self) -> &str {
        &self.name
    }

    fn build_target(&self, ctx: &GfxContext) -> ShaderProgram {
        let mut program = ShaderProgram {
            state: BuildState::new(&self.name),
            owner: None,
            cache: UniformCache::new(),
            uniforms: Vec::new(),
        };
        if self.shaders.is_empty() {
            log::warn!("program '{}' has no shaders", self.name);
            return program;
        }

        let owner = match HandleOwner::allocate(ctx.registry(), ObjectKind::Program, None) {
            Ok(owner) => owner,
            Err(err) => {
                log::warn!("program '{}': {err}", self.name);
                return program;
            }
        };
        let device = owner.device().clone();
        let handle = owner.raw();
        program.owner = Some(owner);

        for shader in &self.shaders {
            match shader.owner() {
                Some(shader_owner) if shader.is_complete() => {
                    device.attach_shader(handle, shader_owner.raw());
                }
                _ => log::debug!(
                    "program '{}': skipping incomplete shader '{}'",
                    self.name,
                    shader.name()
                ),
            }
        }
        device.link_program(handle);
        if !device.program_link_status(handle) {
            let log = bounded_info_log(device.program_info_log(handle));
            log::warn!("failed to link program '{}':\n{log}", self.name);
            return program;
        }

        let (cache, uniforms) = reflect_uniforms(device.as_ref(), handle);
        log::info!(
            "linked program '{}' with {} uniform(s)",
            self.name,
            uniforms.len()
        );
        program.cache = cache;
        program.uniforms = uniforms;
        program.state.mark_complete();
        program
    }
}

/// A linked program with every active uniform resolved at build time.
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    state: BuildState,
    owner: Option<HandleOwner<ProgramObject>>,
    cache: UniformCache,
    uniforms: Vec<UniformInfo>,
}

impl ShaderProgram {
    /// The driver name, if one was allocated.
    pub fn handle(&self) -> Option<GlHandle> {
        self.owner.as_ref().map(HandleOwner::raw)
    }

    /// Makes this program current.
    pub fn bind(&self) {
        if let Some(owner) = &self.owner {
            owner.device().use_program(Some(owner.raw()));
        }
    }

    /// The cached location of a uniform, `None` if the program has no such
    /// active uniform. Never queries the driver.
    pub fn uniform_location(&self, name: &str) -> Option<UniformLocation> {
        self.cache.get(name).copied()
    }

    /// Every reflected uniform, array elements listed individually.
    pub fn uniform_info(&self) -> &[UniformInfo] {
        &self.uniforms
    }

    /// Binds the program and sets a uniform.
    ///
    /// Names without a cached location are ignored, matching GL's handling
    /// of location -1. Such calls are traced at `trace` level so typos can
    /// be found with `RUST_LOG=trace`.
    pub fn set_uniform(&self, name: &str, value: impl Into<UniformValue>) {
        let Some(location) = self.uniform_location(name) else {
            log::trace!("program '{}' has no uniform '{name}'", self.state.name());
            return;
        };
        let Some(owner) = &self.owner else {
            return;
        };
        let device = owner.device();
        device.use_program(Some(owner.raw()));
        device.set_uniform(location, &value.into());
    }
}

impl BuildTarget for ShaderProgram {
    fn build_state(&self) -> &BuildState {
        &self.state
    }
}
