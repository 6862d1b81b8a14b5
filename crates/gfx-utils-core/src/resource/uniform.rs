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

//! Uniform reflection.

use crate::device::{gl_type, GlDevice, GlHandle, UniformLocation};
use std::collections::HashMap;
use std::fmt;

/// The uniform types a program can reflect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderDataType {
    /// `bool`
    Bool,
    /// `int`
    Int,
    /// `uint`
    UInt,
    /// `float`
    Float,
    /// `vec2`
    Vec2,
    /// `vec3`
    Vec3,
    /// `vec4`
    Vec4,
    /// `ivec2`
    IVec2,
    /// `ivec3`
    IVec3,
    /// `ivec4`
    IVec4,
    /// `mat2`
    Mat2,
    /// `mat3`
    Mat3,
    /// `mat4`
    Mat4,
    /// `sampler2D`
    Sampler2D,
    /// `samplerCube`
    SamplerCube,
    /// `image2D`
    Image2D,
}

impl ShaderDataType {
    /// Classifies a GL type code, `None` for types this crate does not handle.
    pub fn from_gl(code: u32) -> Option<Self> {
        let data_type = match code {
            gl_type::BOOL => ShaderDataType::Bool,
            gl_type::INT => ShaderDataType::Int,
            gl_type::UNSIGNED_INT => ShaderDataType::UInt,
            gl_type::FLOAT => ShaderDataType::Float,
            gl_type::FLOAT_VEC2 => ShaderDataType::Vec2,
            gl_type::FLOAT_VEC3 => ShaderDataType::Vec3,
            gl_type::FLOAT_VEC4 => ShaderDataType::Vec4,
            gl_type::INT_VEC2 => ShaderDataType::IVec2,
            gl_type::INT_VEC3 => ShaderDataType::IVec3,
            gl_type::INT_VEC4 => ShaderDataType::IVec4,
            gl_type::FLOAT_MAT2 => ShaderDataType::Mat2,
            gl_type::FLOAT_MAT3 => ShaderDataType::Mat3,
            gl_type::FLOAT_MAT4 => ShaderDataType::Mat4,
            gl_type::SAMPLER_2D => ShaderDataType::Sampler2D,
            gl_type::SAMPLER_CUBE => ShaderDataType::SamplerCube,
            gl_type::IMAGE_2D => ShaderDataType::Image2D,
            _ => return None,
        };
        Some(data_type)
    }

    /// The GLSL spelling of the type.
    pub fn glsl_name(self) -> &'static str {
        match self {
            ShaderDataType::Bool => "bool",
            ShaderDataType::Int => "int",
            ShaderDataType::UInt => "uint",
            ShaderDataType::Float => "float",
            ShaderDataType::Vec2 => "vec2",
            ShaderDataType::Vec3 => "vec3",
            ShaderDataType::Vec4 => "vec4",
            ShaderDataType::IVec2 => "ivec2",
            ShaderDataType::IVec3 => "ivec3",
            ShaderDataType::IVec4 => "ivec4",
            ShaderDataType::Mat2 => "mat2",
            ShaderDataType::Mat3 => "mat3",
            ShaderDataType::Mat4 => "mat4",
            ShaderDataType::Sampler2D => "sampler2D",
            ShaderDataType::SamplerCube => "samplerCube",
            ShaderDataType::Image2D => "image2D",
        }
    }

    /// Returns `true` for opaque types set through a texture or image unit.
    pub fn is_opaque(self) -> bool {
        matches!(
            self,
            ShaderDataType::Sampler2D | ShaderDataType::SamplerCube | ShaderDataType::Image2D
        )
    }
}

impl fmt::Display for ShaderDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.glsl_name())
    }
}

/// One reflected uniform. Array elements get one entry each, named `name[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformInfo {
    /// The name to pass to `set_uniform`.
    pub name: String,
    /// The classified type.
    pub data_type: ShaderDataType,
    /// The resolved location.
    pub location: UniformLocation,
}

/// Uniform locations of a linked program, keyed by name.
pub(crate) type UniformCache = HashMap<String, UniformLocation>;

/// Walks the active-uniform table of a linked program.
pub(crate) fn reflect_uniforms(
    device: &dyn GlDevice,
    program: GlHandle,
) -> (UniformCache, Vec<UniformInfo>) {
    let mut cache = UniformCache::new();
    let mut infos = Vec::new();
    for active in device.active_uniforms(program) {
        let Some(data_type) = ShaderDataType::from_gl(active.gl_type) else {
            log::warn!(
                "uniform '{}' has unsupported type 0x{:04X}, skipping",
                active.name,
                active.gl_type
            );
            continue;
        };
        let base = active.name.strip_suffix("[0]").unwrap_or(&active.name);
        let names: Vec<String> = if active.size > 1 {
            (0..active.size).map(|i| format!("{base}[{i}]")).collect()
        } else {
            vec![base.to_owned()]
        };
        for name in names {
            let Some(location) = device.uniform_location(program, &name) else {
                log::debug!("uniform '{name}' has no location");
                continue;
            };
            cache.insert(name.clone(), location);
            infos.push(UniformInfo {
                name,
                data_type,
                location,
            });
        }
    }
    (cache, infos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_codes_are_not_classified() {
        assert_eq!(ShaderDataType::from_gl(gl_type::SAMPLER_3D), None);
        assert_eq!(ShaderDataType::from_gl(gl_type::DOUBLE_MAT4), None);
        assert_eq!(
            ShaderDataType::from_gl(gl_type::FLOAT_MAT3),
            Some(ShaderDataType::Mat3)
        );
    }

    #[test]
    fn test_opaque_types() {
        assert!(ShaderDataType::Sampler2D.is_opaque());
        assert!(!ShaderDataType::Mat4.is_opaque());
        assert_eq!(ShaderDataType::Vec3.to_string(), "vec3");
    }
}
