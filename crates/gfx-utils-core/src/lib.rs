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

//! # gfx-utils core
//!
//! GPU resource lifetime management and render-pass orchestration for
//! OpenGL 4.6 core.
//!
//! Resources are produced by builders (see [`builder`]) that allocate driver
//! objects through a [`registry::ResourceRegistry`] and hand them to a
//! reference-counted [`handle::HandleOwner`]. The driver itself is reached
//! through the [`device::GlDevice`] trait, so the whole crate runs against
//! [`device::HeadlessDevice`] in tests.
//!
//! Everything here is single-threaded: the context, the registry and every
//! resource are `!Send` because dropping the last owner of a handle issues a
//! driver call on the thread that owns the GL context.

#![warn(missing_docs)]

pub mod app;
pub mod builder;
pub mod context;
pub mod device;
pub mod error;
pub mod handle;
pub mod io;
pub mod registry;
pub mod resource;
pub mod settings;

/// Math types used across the public API.
pub mod math {
    pub use glam::{Mat2, Mat3, Mat4, Vec2, Vec3, Vec4};
}

/// Commonly used types, for glob import.
pub mod prelude {
    pub use crate::builder::{BuildTarget, Builder};
    pub use crate::context::GfxContext;
    pub use crate::error::{AssetError, ResourceError};
    pub use crate::resource::{
        Exportable, RenderPass, RenderPassBuilder, RenderPassConfig, Shader, ShaderBuilder,
        ShaderProgram, ShaderProgramBuilder, ShaderStage, StorageBuffer, StorageBufferBuilder,
        Texture, TextureBuilder, VertexBuffer, VertexBufferBuilder,
    };
    pub use crate::settings::GfxSettings;
}
