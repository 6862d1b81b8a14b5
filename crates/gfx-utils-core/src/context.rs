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

//! The graphics context passed to every builder and to the frame loop.

use crate::device::{GlDevice, MemoryBarrier, PrimitiveMode};
use crate::io::AssetIo;
use crate::math::Vec3;
use crate::registry::ResourceRegistry;
use crate::settings::GfxSettings;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Device, registry, asset I/O and settings for one GL context.
///
/// Cloning is cheap and yields another view of the same context. The entry
/// point creates one context per GL context and hands it to builders and
/// [`App`](crate::app::App); nothing is reached through globals.
#[derive(Clone)]
pub struct GfxContext {
    device: Rc<dyn GlDevice>,
    registry: Rc<ResourceRegistry>,
    io: Rc<dyn AssetIo>,
    settings: Rc<GfxSettings>,
    clear_color: Rc<Cell<Vec3>>,
}

impl fmt::Debug for GfxContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GfxContext")
            .field("device", &self.device)
            .field("registry", &self.registry)
            .field("io", &self.io)
            .field("settings", &self.settings)
            .finish()
    }
}

impl GfxContext {
    /// Creates a context and applies the configured clear color.
    pub fn new(device: Rc<dyn GlDevice>, io: Rc<dyn AssetIo>, settings: GfxSettings) -> Self {
        let registry = Rc::new(ResourceRegistry::new(device.clone()));
        device.set_clear_color(settings.clear_rgba());
        log::info!(
            "graphics context ready (GL {}.{}, GLSL {})",
            settings.gl_version.major,
            settings.gl_version.minor,
            settings.gl_version.glsl_version()
        );
        Self {
            device,
            registry,
            io,
            clear_color: Rc::new(Cell::new(settings.clear_color)),
            settings: Rc::new(settings),
        }
    }

    /// The driver.
    pub fn device(&self) -> &Rc<dyn GlDevice> {
        &self.device
    }

    /// The registry every builder allocates through.
    pub fn registry(&self) -> &Rc<ResourceRegistry> {
        &self.registry
    }

    /// Shader and image loading.
    pub fn io(&self) -> &dyn AssetIo {
        self.io.as_ref()
    }

    /// The settings the context was created with.
    pub fn settings(&self) -> &GfxSettings {
        &self.settings
    }

    /// The GLSL version shaders are lowered to.
    pub fn target_glsl_version(&self) -> u32 {
        self.settings.gl_version.glsl_version()
    }

    /// The color used to clear the window-system framebuffer.
    pub fn clear_color(&self) -> Vec3 {
        self.clear_color.get()
    }

    /// Changes the window clear color. Alpha is always 1.
    pub fn set_clear_color(&self, color: Vec3) {
        self.clear_color.set(color);
        self.device.set_clear_color(color.extend(1.0).to_array());
    }

    /// Sets the viewport to cover `width` x `height` from the origin.
    pub fn set_viewport(&self, width: u32, height: u32) {
        self.device.set_viewport(0, 0, width as i32, height as i32);
    }

    /// Draws `count` vertices from the bound vertex array.
    pub fn draw_arrays(&self, mode: PrimitiveMode, first: i32, count: i32) {
        self.device.draw_arrays(mode, first, count);
    }

    /// Launches compute work with the bound program.
    pub fn dispatch_compute(&self, groups_x: u32, groups_y: u32, groups_z: u32) {
        self.device.dispatch_compute(groups_x, groups_y, groups_z);
    }

    /// Makes prior shader writes visible to the given kinds of access.
    pub fn memory_barrier(&self, barrier: MemoryBarrier) {
        self.device.memory_barrier(barrier);
    }

    /// Releases every object still tracked by the registry.
    ///
    /// Resources dropped afterwards no longer issue deletes.
    pub fn shutdown(&self) -> usize {
        self.registry.release_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceCall, HeadlessDevice};
    use crate::io::MemoryAssetIo;

    #[test]
    fn test_new_applies_clear_color() {
        let device = Rc::new(HeadlessDevice::new());
        let mut settings = GfxSettings::default();
        settings.clear_color = Vec3::new(0.1, 0.2, 0.3);
        let ctx = GfxContext::new(device.clone(), Rc::new(MemoryAssetIo::new()), settings);

        assert_eq!(device.clear_color(), [0.1, 0.2, 0.3, 1.0]);
        ctx.set_clear_color(Vec3::ZERO);
        assert_eq!(device.clear_color(), [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(ctx.clear_color(), Vec3::ZERO);
    }

    #[test]
    fn test_clones_share_registry() {
        let device = Rc::new(HeadlessDevice::new());
        let ctx = GfxContext::new(device.clone(), Rc::new(MemoryAssetIo::new()), GfxSettings::default());
        let other = ctx.clone();
        assert!(Rc::ptr_eq(ctx.registry(), other.registry()));

        other.set_viewport(640, 480);
        assert!(device.calls().contains(&DeviceCall::Viewport {
            x: 0,
            y: 0,
            width: 640,
            height: 480
        }));
    }
}
