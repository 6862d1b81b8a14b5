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

//! Shader objects.

use super::bounded_info_log;
use crate::builder::{BuildState, BuildTarget, Builder};
use crate::context::GfxContext;
use crate::device::{GlHandle, ObjectKind, ShaderStage};
use crate::handle::{HandleOwner, ShaderObject};
use regex::Regex;
use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::OnceLock;

fn version_directive() -> Option<&'static Regex> {
    static DIRECTIVE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    DIRECTIVE
        .get_or_init(|| Regex::new(r"#version\s+(\d+)\s+core"))
        .as_ref()
        .ok()
}

/// Lowers the first `#version N core` directive to `target` if `N` is newer.
///
/// Only that one directive is ever rewritten, and never upwards. Sources
/// without a core-profile directive are returned untouched.
pub fn lower_version_directive(source: &str, target: u32) -> Cow<'_, str> {
    let Some(captures) = version_directive().and_then(|directive| directive.captures(source)) else {
        return Cow::Borrowed(source);
    };
    let (Some(directive), Some(number)) = (captures.get(0), captures.get(1)) else {
        return Cow::Borrowed(source);
    };
    let Ok(requested) = number.as_str().parse::<u32>() else {
        return Cow::Borrowed(source);
    };
    if requested <= target {
        return Cow::Borrowed(source);
    }
    log::warn!("shader requests GLSL {requested} but the context targets {target}, lowering");
    Cow::Owned(format!(
        "{}#version {target} core{}",
        &source[..directive.start()],
        &source[directive.end()..]
    ))
}

#[derive(Debug, Clone)]
enum ShaderSource {
    Inline(String),
    File(PathBuf),
}

/// Configures and compiles a [`Shader`].
#[derive(Debug, Clone)]
pub struct ShaderBuilder {
    name: String,
    stage: Option<ShaderStage>,
    source: Option<ShaderSource>,
}

impl ShaderBuilder {
    /// Starts a shader configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stage: None,
            source: None,
        }
    }

    /// Sets the pipeline stage. Required.
    pub fn set_stage(&mut self, stage: ShaderStage) -> &mut Self {
        self.stage = Some(stage);
        self
    }

    /// Uses `source` as the GLSL text. Required, unless a file is given.
    pub fn set_source(&mut self, source: impl Into<String>) -> &mut Self {
        self.source = Some(ShaderSource::Inline(source.into()));
        self
    }

    /// Reads the GLSL text from `path` when the shader is built.
    pub fn set_source_from_file(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.source = Some(ShaderSource::File(path.into()));
        self
    }

    fn load_source(&self, ctx: &GfxContext) -> Option<String> {
        match self.source.as_ref()? {
            ShaderSource::Inline(source) => Some(source.clone()),
            ShaderSource::File(path) => match ctx.io().read_text(path) {
                Ok(source) => Some(source),
                Err(err) => {
                    log::warn!("shader '{}': {err}", self.name);
                    None
                }
            },
        }
    }
}

impl Builder for ShaderBuilder {
    type Target = Shader;

    fn name(&self) -> &str {
        &self.name
    }

    fn build_target(&self, ctx: &GfxContext) -> Shader {
        let mut shader = Shader {
            state: BuildState::new(&self.name),
            stage: self.stage,
            owner: None,
        };
        let Some(stage) = self.stage else {
            log::warn!("shader '{}' has no stage", self.name);
            return shader;
        };
        let Some(source) = self.load_source(ctx) else {
            return shader;
        };
        if source.trim().is_empty() {
            log::warn!("shader '{}' has no source", self.name);
            return shader;
        }

        let owner = match HandleOwner::allocate(ctx.registry(), ObjectKind::Shader(stage), None) {
            Ok(owner) => owner,
            Err(err) => {
                log::warn!("shader '{}': {err}", self.name);
                return shader;
            }
        };
        let device = owner.device().clone();
        let source = lower_version_directive(&source, ctx.target_glsl_version());
        device.shader_source(owner.raw(), &source);
        device.compile_shader(owner.raw());
        let compiled = device.shader_compile_status(owner.raw());
        shader.owner = Some(owner);

        if !compiled {
            let log = shader
                .owner
                .as_ref()
                .map(|owner| bounded_info_log(device.shader_info_log(owner.raw())))
                .unwrap_or_default();
            log::warn!("failed to compile {stage} shader '{}':\n{log}", self.name);
            return shader;
        }
        log::info!("compiled {stage} shader '{}'", self.name);
        shader.state.mark_complete();
        shader
    }
}

/// A compiled shader object. Cloning shares the driver object.
#[derive(Debug, Clone)]
pub struct Shader {
    state: BuildState,
    stage: Option<ShaderStage>,
    owner: Option<HandleOwner<ShaderObject>>,
}

impl Shader {
    /// The configured stage.
    pub fn stage(&self) -> Option<ShaderStage> {
        self.stage
    }

    /// The driver name, if one was allocated.
    pub fn handle(&self) -> Option<GlHandle> {
        self.owner.as_ref().map(HandleOwner::raw)
    }

    pub(crate) fn owner(&self) -> Option<&HandleOwner<ShaderObject>> {
        self.owner.as_ref()
    }
}

impl BuildTarget for Shader {
    fn build_state(&self) -> &BuildState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::test_support::headless_context;

    #[test]
    fn test_lowering_rewrites_first_directive_only() {
        let source = "#version 460 core\n// #version 460 core\nvoid main() {}\n";
        let lowered = lower_version_directive(source, 450);
        assert_eq!(
            lowered,
            "#version 450 core\n// #version 460 core\nvoid main() {}\n"
        );
    }

    #[test]
    fn test_lowering_never_raises() {
        let source = "#version 330 core\nvoid main() {}";
        assert!(matches!(lower_version_directive(source, 460), Cow::Borrowed(_)));
        let source = "#version 460\nvoid main() {}";
        assert!(matches!(lower_version_directive(source, 450), Cow::Borrowed(_)));
    }

    #[test]
    fn test_missing_stage_or_source_allocates_nothing() {
        let (device, _, ctx) = headless_context();
        let shader = ShaderBuilder::new("no-stage").set_source("void main() {}").build(&ctx);
        assert!(!shader.is_complete());
        let shader = ShaderBuilder::new("no-source")
            .set_stage(ShaderStage::Vertex)
            .build(&ctx);
        assert!(!shader.is_complete());
        let shader = ShaderBuilder::new("blank")
            .set_stage(ShaderStage::Vertex)
            .set_source("  \n")
            .build(&ctx);
        assert!(!shader.is_complete());
        assert_eq!(device.allocation_count(), 0);
    }

    #[test]
    fn test_compile_failure_keeps_handle_but_is_incomplete() {
        let (device, _, ctx) = headless_context();
        let shader = ShaderBuilder::new("broken")
            .set_stage(ShaderStage::Fragment)
            .set_source("#version 460 core\nvoid mian() {}")
            .build(&ctx);
        assert!(!shader.is_complete());
        let handle = shader.handle().unwrap();
        assert!(device.is_live(handle));
        drop(shader);
        assert_eq!(device.delete_count(handle), 1);
    }
}
