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

//! GPU-backed resources and their builders.

mod program;
mod render_pass;
mod shader;
mod storage_buffer;
mod texture;
mod uniform;
mod vertex_buffer;

pub use self::program::{ShaderProgram, ShaderProgramBuilder};
pub use self::render_pass::{ColorAttachment, RenderPass, RenderPassBuilder, RenderPassConfig};
pub use self::shader::{lower_version_directive, Shader, ShaderBuilder};
pub use self::storage_buffer::{StorageBuffer, StorageBufferBuilder};
pub use self::texture::{Exportable, Texture, TextureBuilder, TextureInfo};
pub use self::uniform::{ShaderDataType, UniformInfo};
pub use self::vertex_buffer::{VertexAttribute, VertexBuffer, VertexBufferBuilder, VertexLayout};
pub use crate::device::ShaderStage;

/// Driver info logs are cut to this many bytes before logging.
pub const INFO_LOG_LIMIT: usize = 1024;

/// Cuts a driver info log to [`INFO_LOG_LIMIT`] bytes on a char boundary.
pub(crate) fn bounded_info_log(mut log: String) -> String {
    if log.len() > INFO_LOG_LIMIT {
        let mut end = INFO_LOG_LIMIT;
        while !log.is_char_boundary(end) {
            end -= 1;
        }
        log.truncate(end);
    }
    let trimmed = log.trim_end().len();
    log.truncate(trimmed);
    log
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::context::GfxContext;
    use crate::device::HeadlessDevice;
    use crate::io::MemoryAssetIo;
    use crate::settings::GfxSettings;
    use std::rc::Rc;

    pub(crate) fn headless_context() -> (Rc<HeadlessDevice>, Rc<MemoryAssetIo>, GfxContext) {
        let device = Rc::new(HeadlessDevice::new());
        let io = Rc::new(MemoryAssetIo::new());
        let ctx = GfxContext::new(device.clone(), io.clone(), GfxSettings::default());
        (device, io, ctx)
    }
}
