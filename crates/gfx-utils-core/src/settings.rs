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

//! Application-level settings consumed by the context and the frame loop.

use crate::error::SettingsError;
use crate::math::Vec3;
use serde::{Deserialize, Serialize};

/// Window parameters handed to the host's windowing layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    /// Base window title; the frame loop appends the smoothed FPS.
    pub title: String,
    /// Initial client width in pixels.
    pub width: u32,
    /// Initial client height in pixels.
    pub height: u32,
    /// Whether buffer swaps wait for vertical sync.
    pub vsync: bool,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "gfx-utils".to_owned(),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

/// A requested OpenGL context version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlVersion {
    /// Major version.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
}

impl GlVersion {
    /// The GLSL version number matching this context version, e.g. `460` for 4.6.
    pub fn glsl_version(self) -> u32 {
        self.major * 100 + self.minor * 10
    }
}

impl Default for GlVersion {
    fn default() -> Self {
        Self { major: 4, minor: 6 }
    }
}

/// A collection of settings shared by every resource built from one context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GfxSettings {
    /// Window parameters.
    pub window: WindowSettings,
    /// Target GL version. Shaders requesting a newer `#version` are lowered to it.
    pub gl_version: GlVersion,
    /// Color used when clearing the window-system framebuffer. Alpha is always 1.
    pub clear_color: Vec3,
    /// Multisample count requested for the window surface.
    pub msaa_samples: u32,
}

impl Default for GfxSettings {
    fn default() -> Self {
        Self {
            window: WindowSettings::default(),
            gl_version: GlVersion::default(),
            clear_color: Vec3::ONE,
            msaa_samples: 4,
        }
    }
}

impl GfxSettings {
    /// Parses settings from JSON. Missing fields take their default values.
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The clear color as RGBA.
    pub fn clear_rgba(&self) -> [f32; 4] {
        self.clear_color.extend(1.0).to_array()
    }

    /// Width over height of the initial window, or 1 for a degenerate size.
    pub fn aspect_ratio(&self) -> f32 {
        if self.window.height == 0 {
            1.0
        } else {
            self.window.width as f32 / self.window.height as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = GfxSettings::default();
        assert_eq!(settings.gl_version.glsl_version(), 460);
        assert_eq!(settings.clear_rgba(), [1.0, 1.0, 1.0, 1.0]);
        assert!(settings.window.vsync);
        assert_eq!(settings.msaa_samples, 4);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = GfxSettings::from_json_str(
            r#"{ "window": { "width": 800, "height": 600 }, "gl_version": { "major": 4, "minor": 5 } }"#,
        )
        .unwrap();
        assert_eq!(settings.window.width, 800);
        assert_eq!(settings.window.title, "gfx-utils");
        assert_eq!(settings.gl_version.glsl_version(), 450);
        assert!((settings.aspect_ratio() - 4.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(GfxSettings::from_json_str("{ \"msaa_samples\": \"four\" }").is_err());
    }
}
