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

//! Shader storage buffers.

use crate::builder::{BuildState, BuildTarget, Builder};
use crate::context::GfxContext;
use crate::device::{BufferData, BufferTarget, BufferUsage, GlHandle, ObjectKind};
use crate::error::ResourceError;
use crate::handle::{BufferObject, HandleOwner};

/// Configures a [`StorageBuffer`].
#[derive(Debug, Clone)]
pub struct StorageBufferBuilder {
    name: String,
    size: Option<usize>,
}

impl StorageBufferBuilder {
    /// Starts a storage buffer configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: None,
        }
    }

    /// Sets the capacity in bytes. Required and non-zero.
    pub fn set_size(&mut self, bytes: usize) -> &mut Self {
        self.size = Some(bytes);
        self
    }
}

impl Builder for StorageBufferBuilder {
    type Target = StorageBuffer;

    fn name(&self) -> &str {
        &self.name
    }

    fn build_target(&self, ctx: &GfxContext) -> StorageBuffer {
        let mut buffer = StorageBuffer {
            state: BuildState::new(&self.name),
            owner: None,
            capacity: self.size.unwrap_or(0),
        };
        let Some(size) = self.size.filter(|size| *size > 0) else {
            log::warn!("storage buffer '{}': size is not set, not building", self.name);
            return buffer;
        };

        let owner = match HandleOwner::allocate(ctx.registry(), ObjectKind::Buffer, None) {
            Ok(owner) => owner,
            Err(err) => {
                log::warn!("storage buffer '{}': {err}", self.name);
                return buffer;
            }
        };
        let device = owner.device();
        device.bind_buffer(BufferTarget::ShaderStorage, Some(owner.raw()));
        device.buffer_data(
            BufferTarget::ShaderStorage,
            BufferData::Uninitialized(size),
            BufferUsage::DynamicCopy,
        );
        log::info!("storage buffer '{}': reserved {size} bytes", self.name);

        buffer.owner = Some(owner);
        buffer.state.mark_complete();
        buffer
    }
}

/// A fixed-capacity buffer bound at indexed shader-storage binding points.
#[derive(Debug, Clone)]
pub struct StorageBuffer {
    state: BuildState,
    owner: Option<HandleOwner<BufferObject>>,
    capacity: usize,
}

impl StorageBuffer {
    /// The driver name, if one was allocated.
    pub fn handle(&self) -> Option<GlHandle> {
        self.owner.as_ref().map(HandleOwner::raw)
    }

    /// Reserved bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Binds the buffer to shader-storage binding point `slot`.
    pub fn bind(&self, slot: u32) {
        if let Some(owner) = &self.owner {
            owner
                .device()
                .bind_buffer_base(BufferTarget::ShaderStorage, slot, Some(owner.raw()));
        }
    }

    /// Overwrites the start of the buffer with `data`.
    ///
    /// ## Errors
    /// [`ResourceError::Incomplete`] if the buffer was never built and
    /// [`ResourceError::CapacityExceeded`] if `data` is longer than the
    /// reserved size. GL itself leaves both undefined, so they are checked
    /// here instead of reaching the driver.
    pub fn set_data(&self, data: &[u8]) -> Result<(), ResourceError> {
        let Some(owner) = self.owner.as_ref().filter(|_| self.is_complete()) else {
            return Err(ResourceError::Incomplete {
                name: self.name().to_owned(),
            });
        };
        if data.len() > self.capacity {
            return Err(ResourceError::CapacityExceeded {
                name: self.name().to_owned(),
                requested: data.len(),
                capacity: self.capacity,
            });
        }
        let device = owner.device();
        device.bind_buffer(BufferTarget::ShaderStorage, Some(owner.raw()));
        device.buffer_sub_data(BufferTarget::ShaderStorage, 0, data);
        Ok(())
    }
}

impl BuildTarget for StorageBuffer {
    fn build_state(&self) -> &BuildState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::test_support::headless_context;

    #[test]
    fn test_missing_or_zero_size_allocates_nothing() {
        let (device, _, ctx) = headless_context();
        assert!(!StorageBufferBuilder::new("unsized").build(&ctx).is_complete());
        assert!(!StorageBufferBuilder::new("zero").set_size(0).build(&ctx).is_complete());
        assert_eq!(device.allocation_count(), 0);
    }

    #[test]
    fn test_reserve_uses_dynamic_copy() {
        let (device, _, ctx) = headless_context();
        let buffer = StorageBufferBuilder::new("particles").set_size(64).build(&ctx);
        let handle = buffer.handle().unwrap();
        assert_eq!(device.buffer_contents(handle).map(|data| data.len()), Some(64));
        assert_eq!(device.buffer_usage(handle), Some(BufferUsage::DynamicCopy));
    }

    #[test]
    fn test_set_data_rejects_overflow_and_incomplete() {
        let (device, _, ctx) = headless_context();
        let buffer = StorageBufferBuilder::new("small").set_size(4).build(&ctx);
        assert!(matches!(
            buffer.set_data(&[0; 5]),
            Err(ResourceError::CapacityExceeded {
                requested: 5,
                capacity: 4,
                ..
            })
        ));
        buffer.set_data(&[9, 8]).unwrap();
        assert_eq!(
            device.buffer_contents(buffer.handle().unwrap()),
            Some(vec![9, 8, 0, 0])
        );

        let unbuilt = StorageBufferBuilder::new("unbuilt").build(&ctx);
        assert!(matches!(
            unbuilt.set_data(&[1]),
            Err(ResourceError::Incomplete { .. })
        ));
    }

    #[test]
    fn test_bind_uses_indexed_binding() {
        let (device, _, ctx) = headless_context();
        let buffer = StorageBufferBuilder::new("ssbo").set_size(16).build(&ctx);
        buffer.bind(2);
        assert_eq!(
            device.indexed_binding(BufferTarget::ShaderStorage, 2),
            buffer.handle()
        );
    }
}
