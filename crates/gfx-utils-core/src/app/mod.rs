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

//! The windowed frame loop.
//!
//! Windowing and input live behind [`FrameSurface`] so the loop can be driven
//! by any host that owns a GL context, or by a scripted surface in tests.

mod camera;

pub use camera::FlyCamera;

use std::time::Instant;

use glam::Vec3;

use crate::context::GfxContext;

/// Keys the library reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Forward.
    W,
    /// Strafe left.
    A,
    /// Backward.
    S,
    /// Strafe right.
    D,
    /// Moves a [`FlyCamera`] up.
    Space,
    /// Moves a [`FlyCamera`] down.
    LeftShift,
    /// Escape. Not read by [`FlyCamera`].
    Escape,
}

/// Polled keyboard state.
pub trait InputState {
    /// Whether `key` is held down right now.
    fn is_key_pressed(&self, key: Key) -> bool;
}

/// A window with a current GL context.
pub trait FrameSurface: InputState {
    /// Whether the user asked to close the window.
    fn should_close(&self) -> bool;

    /// Processes pending window-system events.
    fn poll_events(&mut self);

    /// Presents the back buffer.
    fn swap_buffers(&mut self);

    /// Replaces the window title.
    fn set_title(&mut self, title: &str);

    /// Turns vertical sync on or off.
    fn set_vsync(&mut self, enabled: bool);

    /// Framebuffer size in pixels.
    fn inner_size(&self) -> (u32, u32);
}

/// Smoothed frames-per-second estimate.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    interval: f32,
    smoothing: f32,
    elapsed: f32,
    frames: u32,
    fps: Option<f32>,
}

impl FpsCounter {
    /// Seconds between two estimates.
    pub const INTERVAL: f32 = 0.5;
    /// Weight of the newest sample.
    pub const SMOOTHING: f32 = 0.5;

    /// Creates a counter with no estimate yet.
    pub fn new() -> Self {
        Self {
            interval: Self::INTERVAL,
            smoothing: Self::SMOOTHING,
            elapsed: 0.0,
            frames: 0,
            fps: None,
        }
    }

    /// Accounts for one frame that took `dt` seconds.
    ///
    /// ## Returns
    /// The new estimate once a full interval has elapsed, `None` otherwise.
    pub fn tick(&mut self, dt: f32) -> Option<f32> {
        self.elapsed += dt;
        self.frames += 1;
        if self.elapsed < self.interval {
            return None;
        }
        let sample = self.frames as f32 / self.elapsed;
        let fps = match self.fps {
            Some(previous) => previous + (sample - previous) * self.smoothing,
            None => sample,
        };
        self.fps = Some(fps);
        self.elapsed = 0.0;
        self.frames = 0;
        Some(fps)
    }

    /// The latest estimate.
    pub fn fps(&self) -> Option<f32> {
        self.fps
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs frames on a [`FrameSurface`] until it asks to close.
#[derive(Debug)]
pub struct App<S: FrameSurface> {
    ctx: GfxContext,
    surface: S,
    title: String,
    size: (u32, u32),
    fps: FpsCounter,
}

impl<S: FrameSurface> App<S> {
    /// Wraps `surface`, applying the window settings held by `ctx`.
    pub fn new(ctx: GfxContext, mut surface: S) -> Self {
        let window = &ctx.settings().window;
        let title = window.title.clone();
        surface.set_title(&title);
        surface.set_vsync(window.vsync);
        let size = surface.inner_size();
        ctx.set_viewport(size.0, size.1);
        log::info!("window '{title}' ready at {}x{}", size.0, size.1);
        Self {
            ctx,
            surface,
            title,
            size,
            fps: FpsCounter::new(),
        }
    }

    /// The context resources should be built with.
    pub fn context(&self) -> &GfxContext {
        &self.ctx
    }

    /// The wrapped surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Mutable access to the wrapped surface.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Runs the frame loop.
    ///
    /// Each frame polls events, follows window resizes with the viewport,
    /// calls `frame` with the previous frame's duration in seconds and the
    /// current input, then presents. Returns when the surface should close.
    pub fn run<F>(&mut self, mut frame: F)
    where
        F: FnMut(f32, &S),
    {
        let mut dt = 0.0;
        while !self.surface.should_close() {
            let start = Instant::now();
            self.surface.poll_events();
            self.track_size();
            frame(dt, &self.surface);
            self.surface.swap_buffers();
            dt = start.elapsed().as_secs_f32();
            if let Some(fps) = self.fps.tick(dt) {
                let title = format!("{} - fps: {}", self.title, fps.round());
                self.surface.set_title(&title);
            }
        }
        log::info!("window '{}' closed", self.title);
    }

    fn track_size(&mut self) {
        let size = self.surface.inner_size();
        if size != self.size {
            log::debug!("resized to {}x{}", size.0, size.1);
            self.size = size;
            self.ctx.set_viewport(size.0, size.1);
        }
    }

    /// Turns vertical sync on or off.
    pub fn set_vsync(&mut self, enabled: bool) {
        self.surface.set_vsync(enabled);
    }

    /// Changes the window clear color. Alpha is always 1.
    pub fn set_clear_color(&self, color: Vec3) {
        self.ctx.set_clear_color(color);
    }

    /// Current framebuffer size in pixels.
    pub fn window_size(&self) -> (u32, u32) {
        self.surface.inner_size()
    }

    /// Width over height of the framebuffer, or 1 while it is minimized.
    pub fn aspect_ratio(&self) -> f32 {
        match self.window_size() {
            (_, 0) => 1.0,
            (width, height) => width as f32 / height as f32,
        }
    }

    /// Releases every GPU object still alive, before the GL context goes away.
    pub fn shutdown(&self) -> usize {
        let released = self.ctx.shutdown();
        log::info!("released {released} GPU object(s) at shutdown");
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;
    use crate::device::DeviceCall;
    use crate::resource::test_support::headless_context;
    use crate::resource::StorageBufferBuilder;
    use std::collections::HashSet;

    #[derive(Debug, Default)]
    struct ScriptedSurface {
        frames_left: u32,
        sizes: Vec<(u32, u32)>,
        size: (u32, u32),
        titles: Vec<String>,
        vsync: Option<bool>,
        presented: u32,
        keys: HashSet<Key>,
    }

    impl ScriptedSurface {
        fn new(frames: u32, size: (u32, u32)) -> Self {
            Self {
                frames_left: frames,
                size,
                ..Default::default()
            }
        }
    }

    impl InputState for ScriptedSurface {
        fn is_key_pressed(&self, key: Key) -> bool {
            self.keys.contains(&key)
        }
    }

    impl FrameSurface for ScriptedSurface {
        fn should_close(&self) -> bool {
            self.frames_left == 0
        }

        fn poll_events(&mut self) {
            if !self.sizes.is_empty() {
                self.size = self.sizes.remove(0);
            }
        }

        fn swap_buffers(&mut self) {
            self.presented += 1;
            self.frames_left -= 1;
        }

        fn set_title(&mut self, title: &str) {
            self.titles.push(title.to_owned());
        }

        fn set_vsync(&mut self, enabled: bool) {
            self.vsync = Some(enabled);
        }

        fn inner_size(&self) -> (u32, u32) {
            self.size
        }
    }

    #[test]
    fn test_new_applies_window_settings() {
        let (device, _, ctx) = headless_context();
        let app = App::new(ctx, ScriptedSurface::new(0, (640, 480)));
        assert_eq!(app.surface().titles, vec!["gfx-utils".to_owned()]);
        assert_eq!(app.surface().vsync, Some(true));
        assert!(device.calls().contains(&DeviceCall::Viewport {
            x: 0,
            y: 0,
            width: 640,
            height: 480
        }));
    }

    #[test]
    fn test_run_calls_frame_until_close() {
        let (_, _, ctx) = headless_context();
        let mut app = App::new(ctx, ScriptedSurface::new(3, (8, 8)));
        let mut frames = 0;
        let mut first_dt = None;
        app.run(|dt, _| {
            first_dt.get_or_insert(dt);
            frames += 1;
        });
        assert_eq!(frames, 3);
        assert_eq!(first_dt, Some(0.0));
        assert_eq!(app.surface().presented, 3);
    }

    #[test]
    fn test_resize_updates_viewport() {
        let (device, _, ctx) = headless_context();
        let mut surface = ScriptedSurface::new(2, (8, 8));
        surface.sizes = vec![(8, 8), (32, 16)];
        let mut app = App::new(ctx, surface);
        device.take_calls();
        app.run(|_, _| {});
        assert_eq!(
            device.calls(),
            vec![DeviceCall::Viewport {
                x: 0,
                y: 0,
                width: 32,
                height: 16
            }]
        );
        assert_eq!(app.window_size(), (32, 16));
        approx::assert_relative_eq!(app.aspect_ratio(), 2.0);
    }

    #[test]
    fn test_frame_sees_input() {
        let (_, _, ctx) = headless_context();
        let mut surface = ScriptedSurface::new(1, (8, 8));
        surface.keys.insert(Key::W);
        let mut app = App::new(ctx, surface);
        let mut pressed = false;
        app.run(|_, input| pressed = input.is_key_pressed(Key::W));
        assert!(pressed);
    }

    #[test]
    fn test_aspect_ratio_of_minimized_window() {
        let (_, _, ctx) = headless_context();
        let app = App::new(ctx, ScriptedSurface::new(0, (800, 0)));
        assert_eq!(app.aspect_ratio(), 1.0);
    }

    #[test]
    fn test_fps_counter_smooths_samples() {
        let mut counter = FpsCounter::new();
        assert_eq!(counter.tick(0.25), None);
        // 2 frames over 0.5s.
        assert_eq!(counter.tick(0.25), Some(4.0));
        // 1 frame over 0.5s, halfway from 4 to 2.
        assert_eq!(counter.tick(0.5), Some(3.0));
        assert_eq!(counter.fps(), Some(3.0));
    }

    #[test]
    fn test_shutdown_drains_registry() {
        let (device, _, ctx) = headless_context();
        let app = App::new(ctx, ScriptedSurface::new(0, (8, 8)));
        let buffer = StorageBufferBuilder::new("leftover")
            .set_size(4)
            .build(app.context());
        assert_eq!(app.shutdown(), 1);
        assert_eq!(device.live_object_count(), 0);
        drop(buffer);
        assert_eq!(device.live_object_count(), 0);
    }

    #[test]
    fn test_set_clear_color_forces_opaque() {
        let (device, _, ctx) = headless_context();
        let app = App::new(ctx, ScriptedSurface::new(0, (8, 8)));
        app.set_clear_color(Vec3::new(0.1, 0.2, 0.3));
        assert_eq!(device.clear_color(), [0.1, 0.2, 0.3, 1.0]);
    }
}
