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

//! Render passes: a framebuffer plus the clear/bind state to draw into it.
//!
//! A pass with no attachments targets the window-system framebuffer. Any
//! attachment makes it an off-screen pass backed by its own framebuffer
//! object. Completeness is reported through [`BuildTarget::is_complete`]
//! but [`RenderPass::execute`] never refuses an incomplete pass, so passes
//! stay inspectable (and exportable through their attachments) after a
//! failed check.

use super::texture::Texture;
use crate::builder::{BuildState, BuildTarget, Builder};
use crate::context::GfxContext;
use crate::device::{
    Capability, ClearMask, FramebufferAttachment, FramebufferStatus, GlHandle, ObjectKind,
};
use crate::handle::{FramebufferObject, HandleOwner};
use crate::math::Vec4;

/// Per-call state applied by [`RenderPass::execute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderPassConfig {
    /// Clear depth and enable depth testing on the window-system framebuffer.
    /// Off-screen passes test depth exactly when they have a depth attachment.
    pub depth_test: bool,
    /// Convert linear output to sRGB on write.
    pub srgb: bool,
}

impl Default for RenderPassConfig {
    fn default() -> Self {
        Self {
            depth_test: true,
            srgb: false,
        }
    }
}

/// A color attachment with its clear behavior.
#[derive(Debug, Clone)]
pub struct ColorAttachment {
    /// The target texture.
    pub texture: Texture,
    /// Whether `execute` clears this slot first.
    pub clear: bool,
    /// RGBA clear value. Formats with fewer channels use the leading components.
    pub clear_value: Vec4,
}

/// Configures a [`RenderPass`].
#[derive(Debug, Clone)]
pub struct RenderPassBuilder {
    name: String,
    color_attachments: Vec<ColorAttachment>,
    depth_attachment: Option<Texture>,
}

impl RenderPassBuilder {
    /// Starts a pass configuration. Without attachments it builds the default pass.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color_attachments: Vec::new(),
            depth_attachment: None,
        }
    }

    /// Appends a color attachment; the `i`-th call targets slot `i`.
    pub fn add_color_attachment(
        &mut self,
        texture: &Texture,
        clear: bool,
        clear_value: Vec4,
    ) -> &mut Self {
        self.color_attachments.push(ColorAttachment {
            texture: texture.clone(),
            clear,
            clear_value,
        });
        self
    }

    /// Sets the depth attachment. It is cleared to 1.0 on every `execute`.
    pub fn set_depth_attachment(&mut self, texture: &Texture) -> &mut Self {
        self.depth_attachment = Some(texture.clone());
        self
    }
}

impl Builder for RenderPassBuilder {
    type Target = RenderPass;

    fn name(&self) -> &str {
        &self.name
    }

    fn build_target(&self, ctx: &GfxContext) -> RenderPass {
        let is_default = self.color_attachments.is_empty() && self.depth_attachment.is_none();
        let mut pass = RenderPass {
            state: BuildState::new(&self.name),
            framebuffer: HandleOwner::detached(
                ctx.device().clone(),
                ObjectKind::Framebuffer,
                GlHandle::NULL,
            ),
            is_default,
            color_attachments: self.color_attachments.clone(),
            depth_attachment: self.depth_attachment.clone(),
        };
        if is_default {
            pass.state.mark_complete();
            return pass;
        }

        let framebuffer =
            match HandleOwner::allocate(ctx.registry(), ObjectKind::Framebuffer, None) {
                Ok(owner) => owner,
                Err(err) => {
                    log::warn!("render pass '{}': {err}", self.name);
                    return pass;
                }
            };
        let device = framebuffer.device().clone();
        device.bind_framebuffer(Some(framebuffer.raw()));
        pass.framebuffer = framebuffer;

        for (slot, attachment) in self.color_attachments.iter().enumerate() {
            match attachment.texture.handle() {
                Some(texture) if attachment.texture.is_complete() => device.framebuffer_texture_2d(
                    FramebufferAttachment::Color(slot as u32),
                    Some(texture),
                ),
                _ => log::warn!(
                    "render pass '{}': color attachment {slot} ('{}') is incomplete, slot left empty",
                    self.name,
                    attachment.texture.name()
                ),
            }
        }
        if let Some(depth) = &self.depth_attachment {
            match depth.handle() {
                Some(texture) if depth.is_complete() => {
                    device.framebuffer_texture_2d(FramebufferAttachment::Depth, Some(texture))
                }
                _ => log::warn!(
                    "render pass '{}': depth attachment '{}' is incomplete",
                    self.name,
                    depth.name()
                ),
            }
        }
        let draw_buffers: Vec<FramebufferAttachment> = (0..self.color_attachments.len())
            .map(|slot| FramebufferAttachment::Color(slot as u32))
            .collect();
        device.draw_buffers(&draw_buffers);

        let status = device.check_framebuffer_status();
        device.bind_framebuffer(None);
        if status != FramebufferStatus::Complete {
            log::warn!("render pass '{}': framebuffer is {status}", self.name);
            return pass;
        }
        log::info!(
            "render pass '{}': built with {} color attachment(s){}",
            self.name,
            self.color_attachments.len(),
            if self.depth_attachment.is_some() {
                " and depth"
            } else {
                ""
            }
        );
        pass.state.mark_complete();
        pass
    }
}

/// A render target and its per-use clear state.
#[derive(Debug, Clone)]
pub struct RenderPass {
    state: BuildState,
    framebuffer: HandleOwner<FramebufferObject>,
    is_default: bool,
    color_attachments: Vec<ColorAttachment>,
    depth_attachment: Option<Texture>,
}

impl RenderPass {
    /// Returns `true` for the pass that targets the window-system framebuffer.
    pub fn is_default(&self) -> bool {
        self.is_default
    }

    /// The framebuffer name; [`GlHandle::NULL`] for the default pass.
    pub fn framebuffer(&self) -> GlHandle {
        self.framebuffer.raw()
    }

    /// Color attachments in slot order.
    pub fn color_attachments(&self) -> &[ColorAttachment] {
        &self.color_attachments
    }

    /// The depth attachment, if any.
    pub fn depth_attachment(&self) -> Option<&Texture> {
        self.depth_attachment.as_ref()
    }

    /// Binds the pass, applies `config` and clears, then runs `render`.
    ///
    /// The window-system framebuffer is cleared to the context's clear color
    /// (plus depth when `config.depth_test` is set). Off-screen passes clear
    /// depth when they have a depth attachment and each color slot whose
    /// clear flag is set. Nothing is unbound afterwards.
    pub fn execute<R>(&self, config: &RenderPassConfig, render: impl FnOnce() -> R) -> R {
        let device = self.framebuffer.device();
        if self.is_default {
            device.bind_framebuffer(None);
        } else {
            device.bind_framebuffer(Some(self.framebuffer.raw()));
        }
        device.set_capability(Capability::FramebufferSrgb, config.srgb);

        if self.is_default {
            device.set_capability(Capability::DepthTest, config.depth_test);
            device.clear(ClearMask {
                color: true,
                depth: config.depth_test,
            });
        } else {
            let has_depth = self.depth_attachment.is_some();
            device.set_capability(Capability::DepthTest, has_depth);
            if has_depth {
                device.clear_depth_buffer(1.0);
            }
            for (slot, attachment) in self.color_attachments.iter().enumerate() {
                if attachment.clear {
                    device.clear_color_buffer(slot as u32, attachment.clear_value.to_array());
                }
            }
        }
        render()
    }
}

impl BuildTarget for RenderPass {
    fn build_state(&self) -> &BuildState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceCall, FramebufferStatus, InternalFormat};
    use crate::resource::test_support::headless_context;
    use crate::resource::TextureBuilder;

    #[test]
    fn test_default_pass_issues_no_driver_calls() {
        let (device, _, ctx) = headless_context();
        device.take_calls();
        let pass = RenderPassBuilder::new("screen").build(&ctx);
        assert!(pass.is_default());
        assert!(pass.is_complete());
        assert_eq!(pass.framebuffer(), GlHandle::NULL);
        assert!(device.calls().is_empty());
        assert_eq!(device.allocation_count(), 0);
    }

    #[test]
    fn test_forced_incomplete_status_is_reported() {
        let (device, _, ctx) = headless_context();
        let color = TextureBuilder::new("color")
            .set_size(4, 4)
            .set_format(InternalFormat::Rgba8)
            .build(&ctx);
        device.force_framebuffer_status(Some(FramebufferStatus::Unsupported));
        let pass = RenderPassBuilder::new("offscreen")
            .add_color_attachment(&color, true, Vec4::ZERO)
            .build(&ctx);
        assert!(!pass.is_complete());
        assert!(!pass.is_default());
        assert!(device.is_live(pass.framebuffer()));
        assert_eq!(device.bound_framebuffer(), None);
    }

    #[test]
    fn test_execute_returns_callback_value() {
        let (device, _, ctx) = headless_context();
        let pass = RenderPassBuilder::new("screen").build(&ctx);
        device.take_calls();
        let value = pass.execute(&RenderPassConfig::default(), || 7);
        assert_eq!(value, 7);
        assert_eq!(
            device.calls(),
            vec![
                DeviceCall::BindFramebuffer(None),
                DeviceCall::SetCapability(Capability::FramebufferSrgb, false),
                DeviceCall::SetCapability(Capability::DepthTest, true),
                DeviceCall::Clear(ClearMask::COLOR_DEPTH),
            ]
        );
    }
}
