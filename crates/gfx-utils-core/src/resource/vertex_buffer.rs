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

//! Interleaved float vertex buffers.

use crate::builder::{BuildState, BuildTarget, Builder};
use crate::context::GfxContext;
use crate::device::{BufferData, BufferTarget, BufferUsage, GlHandle, ObjectKind, PrimitiveMode};
use crate::handle::{BufferObject, HandleOwner, VertexArrayObject};

const FLOAT_SIZE: u32 = std::mem::size_of::<f32>() as u32;

/// One float attribute inside an interleaved vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Attribute index, assigned in declaration order from 0.
    pub index: u32,
    /// Floats per vertex.
    pub components: u32,
    /// Byte offset inside a vertex.
    pub offset: u32,
}

/// Stride and offsets of an interleaved float layout.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VertexLayout {
    stride: u32,
    attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    /// Lays out attributes back to back in declaration order.
    pub fn interleaved(components: &[u32]) -> Self {
        let mut offset = 0;
        let attributes = components
            .iter()
            .enumerate()
            .map(|(index, &components)| {
                let attribute = VertexAttribute {
                    index: index as u32,
                    components,
                    offset,
                };
                offset += components * FLOAT_SIZE;
                attribute
            })
            .collect();
        Self {
            stride: offset,
            attributes,
        }
    }

    /// Bytes per vertex.
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// Attributes in index order.
    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    /// Floats per vertex.
    pub fn floats_per_vertex(&self) -> usize {
        (self.stride / FLOAT_SIZE) as usize
    }
}

/// Configures a [`VertexBuffer`] over borrowed vertex data.
#[derive(Debug, Clone)]
pub struct VertexBufferBuilder<'a> {
    name: String,
    data: &'a [f32],
    components: Vec<u32>,
}

impl<'a> VertexBufferBuilder<'a> {
    /// Starts a configuration uploading `data` once at build time.
    ///
    /// `data` must hold a whole number of vertices for the declared
    /// attributes; otherwise the build allocates nothing.
    pub fn new(name: impl Into<String>, data: &'a [f32]) -> Self {
        Self {
            name: name.into(),
            data,
            components: Vec::new(),
        }
    }

    /// Appends an attribute of `components` floats (1 to 4).
    pub fn add_attribute(&mut self, components: u32) -> &mut Self {
        self.components.push(components);
        self
    }
}

impl Builder for VertexBufferBuilder<'_> {
    type Target = VertexBuffer;

    fn name(&self) -> &str {
        &self.name
    }

    fn build_target(&self, ctx: &GfxContext) -> VertexBuffer {
        let layout = VertexLayout::interleaved(&self.components);
        let mut buffer = VertexBuffer {
            state: BuildState::new(&self.name),
            vertex_array: None,
            buffer: None,
            vertex_count: 0,
            layout,
        };
        if self.data.is_empty() {
            log::warn!("vertex buffer '{}' has no data", self.name);
            return buffer;
        }
        if self.components.is_empty() {
            log::warn!("vertex buffer '{}' has no attributes", self.name);
            return buffer;
        }
        if let Some(bad) = self.components.iter().find(|c| !(1..=4).contains(*c)) {
            log::warn!(
                "vertex buffer '{}': attributes take 1 to 4 components, got {bad}",
                self.name
            );
            return buffer;
        }
        let floats_per_vertex = buffer.layout.floats_per_vertex();
        if self.data.len() % floats_per_vertex != 0 {
            log::warn!(
                "vertex buffer '{}': {} floats is not a whole number of {floats_per_vertex}-float vertices",
                self.name,
                self.data.len()
            );
            return buffer;
        }

        let registry = ctx.registry();
        let vertex_array = match HandleOwner::allocate(registry, ObjectKind::VertexArray, None) {
            Ok(owner) => owner,
            Err(err) => {
                log::warn!("vertex buffer '{}': {err}", self.name);
                return buffer;
            }
        };
        let data_buffer = match HandleOwner::allocate(registry, ObjectKind::Buffer, None) {
            Ok(owner) => owner,
            Err(err) => {
                log::warn!("vertex buffer '{}': {err}", self.name);
                return buffer;
            }
        };

        let device = vertex_array.device().clone();
        device.bind_vertex_array(Some(vertex_array.raw()));
        device.bind_buffer(BufferTarget::Array, Some(data_buffer.raw()));
        device.buffer_data(
            BufferTarget::Array,
            BufferData::Bytes(bytemuck::cast_slice(self.data)),
            BufferUsage::StaticDraw,
        );
        let stride = buffer.layout.stride();
        for attribute in buffer.layout.attributes() {
            device.vertex_attrib_pointer_f32(
                attribute.index,
                attribute.components,
                stride,
                attribute.offset,
            );
            device.enable_vertex_attrib_array(attribute.index);
            log::debug!(
                "vertex buffer '{}': attribute {} with {} component(s) at offset {}",
                self.name,
                attribute.index,
                attribute.components,
                attribute.offset
            );
        }
        device.bind_vertex_array(None);
        log::info!(
            "vertex buffer '{}': built with {} attribute(s)",
            self.name,
            self.components.len()
        );

        buffer.vertex_count = self.data.len() / floats_per_vertex;
        buffer.vertex_array = Some(vertex_array);
        buffer.buffer = Some(data_buffer);
        buffer.state.mark_complete();
        buffer
    }
}

/// A vertex array with its interleaved data buffer.
#[derive(Debug, Clone)]
pub struct VertexBuffer {
    state: BuildState,
    vertex_array: Option<HandleOwner<VertexArrayObject>>,
    buffer: Option<HandleOwner<BufferObject>>,
    vertex_count: usize,
    layout: VertexLayout,
}

impl VertexBuffer {
    /// The vertex array name, if one was allocated.
    pub fn vertex_array(&self) -> Option<GlHandle> {
        self.vertex_array.as_ref().map(HandleOwner::raw)
    }

    /// The data buffer name, if one was allocated.
    pub fn buffer(&self) -> Option<GlHandle> {
        self.buffer.as_ref().map(HandleOwner::raw)
    }

    /// The attribute layout.
    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    /// Number of vertices uploaded.
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Binds the vertex array.
    pub fn bind(&self) {
        if let Some(vertex_array) = &self.vertex_array {
            vertex_array.device().bind_vertex_array(Some(vertex_array.raw()));
        }
    }

    /// Binds the vertex array and draws every vertex.
    pub fn draw(&self, mode: PrimitiveMode) {
        if let Some(vertex_array) = &self.vertex_array {
            let device = vertex_array.device();
            device.bind_vertex_array(Some(vertex_array.raw()));
            device.draw_arrays(mode, 0, self.vertex_count as i32);
        }
    }
}

impl BuildTarget for VertexBuffer {
    fn build_state(&self) -> &BuildState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceCall;
    use crate::resource::test_support::headless_context;

    #[test]
    fn test_interleaved_layout() {
        let layout = VertexLayout::interleaved(&[3, 3, 2]);
        assert_eq!(layout.stride(), 32);
        let offsets: Vec<u32> = layout.attributes().iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 12, 24]);
        assert_eq!(layout.floats_per_vertex(), 8);
    }

    #[test]
    fn test_invalid_configuration_allocates_nothing() {
        let (device, _, ctx) = headless_context();
        let data = [0.0f32; 6];
        assert!(!VertexBufferBuilder::new("empty", &[]).add_attribute(2).build(&ctx).is_complete());
        assert!(!VertexBufferBuilder::new("no-attrs", &data).build(&ctx).is_complete());
        assert!(!VertexBufferBuilder::new("wide", &data)
            .add_attribute(6)
            .build(&ctx)
            .is_complete());
        assert!(!VertexBufferBuilder::new("ragged", &data[..5])
            .add_attribute(2)
            .build(&ctx)
            .is_complete());
        assert_eq!(device.allocation_count(), 0);
    }

    #[test]
    fn test_second_allocation_failure_releases_vertex_array() {
        let (device, _, ctx) = headless_context();
        let data = [0.0f32; 4];
        device.fail_allocations_after(1, 1);
        let buffer = VertexBufferBuilder::new("half", &data)
            .add_attribute(2)
            .build(&ctx);
        assert!(!buffer.is_complete());
        assert_eq!(device.allocation_count(), 1);
        assert_eq!(device.live_object_count(), 0);
        assert_eq!(ctx.registry().live_count(), 0);
    }

    #[test]
    fn test_draw_covers_every_vertex() {
        let (device, _, ctx) = headless_context();
        let data = [0.0f32; 12];
        let buffer = VertexBufferBuilder::new("quad", &data)
            .add_attribute(3)
            .build(&ctx);
        assert_eq!(buffer.vertex_count(), 4);
        device.take_calls();
        buffer.draw(PrimitiveMode::TriangleStrip);
        assert_eq!(
            device.calls(),
            vec![
                DeviceCall::BindVertexArray(buffer.vertex_array()),
                DeviceCall::DrawArrays {
                    mode: PrimitiveMode::TriangleStrip,
                    first: 0,
                    count: 4
                },
            ]
        );
    }
}
