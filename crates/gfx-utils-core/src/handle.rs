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

//! Shared ownership of driver handles.
//!
//! A [`HandleOwner<K>`] owns exactly one driver object of class `K`. Cloning
//! it is cheap and shares the object; the object is released through the
//! [`ResourceRegistry`] when the last clone is dropped. The delete itself is
//! [`destroy_object`](crate::device::destroy_object), dispatched on the
//! object's [`ObjectKind`], so no per-instance closure is involved.
//!
//! Owners are `!Send` and `!Sync`: the delete they trigger is a driver call
//! that must run on the context's thread.

use crate::device::{GlDevice, GlHandle, ObjectClass, ObjectKind};
use crate::error::ResourceError;
use crate::registry::{ReleaseCallback, ResourceRegistry, Ticket};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

/// Type-level marker naming the object class an owner holds.
pub trait HandleKind: 'static {
    /// The class of objects this marker stands for.
    const CLASS: ObjectClass;
}

macro_rules! handle_kinds {
    ($($(#[$meta:meta])* $marker:ident => $class:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug)]
            pub enum $marker {}

            impl HandleKind for $marker {
                const CLASS: ObjectClass = ObjectClass::$class;
            }
        )*
    };
}

handle_kinds! {
    /// Marks a vertex array owner.
    VertexArrayObject => VertexArray,
    /// Marks a buffer owner.
    BufferObject => Buffer,
    /// Marks a texture owner.
    TextureObject => Texture,
    /// Marks a shader owner.
    ShaderObject => Shader,
    /// Marks a program owner.
    ProgramObject => Program,
    /// Marks a framebuffer owner.
    FramebufferObject => Framebuffer,
}

enum ReleasePolicy {
    Registry(Rc<ResourceRegistry>, Ticket),
    // Owned elsewhere (the window-system framebuffer): never deleted here.
    Detached(Rc<dyn GlDevice>),
}

struct OwnedHandle {
    handle: GlHandle,
    kind: ObjectKind,
    policy: ReleasePolicy,
}

impl Drop for OwnedHandle {
    fn drop(&mut self) {
        if let ReleasePolicy::Registry(registry, ticket) = &self.policy {
            registry.release(*ticket);
        }
    }
}

/// Reference-counted ownership of one driver object.
pub struct HandleOwner<K: HandleKind> {
    inner: Rc<OwnedHandle>,
    _kind: PhantomData<K>,
}

impl<K: HandleKind> HandleOwner<K> {
    /// Allocates a new object through the registry and takes ownership of it.
    ///
    /// ## Arguments
    /// * `registry` - The registry that allocates and later releases the object.
    /// * `kind` - What to create; its class must be `K::CLASS`.
    /// * `on_release` - Runs right before the object is deleted.
    pub fn allocate(
        registry: &Rc<ResourceRegistry>,
        kind: ObjectKind,
        on_release: Option<ReleaseCallback>,
    ) -> Result<Self, ResourceError> {
        debug_assert_eq!(kind.class(), K::CLASS, "object kind does not match owner class");
        let allocation = registry.allocate(kind, on_release)?;
        Ok(Self::from_inner(OwnedHandle {
            handle: allocation.handle,
            kind,
            policy: ReleasePolicy::Registry(registry.clone(), allocation.ticket),
        }))
    }

    /// Wraps a handle this crate must never delete.
    pub fn detached(device: Rc<dyn GlDevice>, kind: ObjectKind, handle: GlHandle) -> Self {
        debug_assert_eq!(kind.class(), K::CLASS, "object kind does not match owner class");
        Self::from_inner(OwnedHandle {
            handle,
            kind,
            policy: ReleasePolicy::Detached(device),
        })
    }

    fn from_inner(inner: OwnedHandle) -> Self {
        Self {
            inner: Rc::new(inner),
            _kind: PhantomData,
        }
    }

    /// The driver name.
    pub fn raw(&self) -> GlHandle {
        self.inner.handle
    }

    /// The kind the object was created as.
    pub fn kind(&self) -> ObjectKind {
        self.inner.kind
    }

    /// The device the object lives on.
    pub fn device(&self) -> &Rc<dyn GlDevice> {
        match &self.inner.policy {
            ReleasePolicy::Registry(registry, _) => registry.device(),
            ReleasePolicy::Detached(device) => device,
        }
    }

    /// The registry ticket, or `None` for a detached owner.
    pub fn ticket(&self) -> Option<Ticket> {
        match &self.inner.policy {
            ReleasePolicy::Registry(_, ticket) => Some(*ticket),
            ReleasePolicy::Detached(_) => None,
        }
    }

    /// Returns `true` if dropping the last owner never deletes the object.
    pub fn is_detached(&self) -> bool {
        matches!(self.inner.policy, ReleasePolicy::Detached(_))
    }

    /// Number of live owners sharing the object.
    pub fn owner_count(&self) -> usize {
        Rc::strong_count(&self.inner)
    }

    /// Returns `true` if both owners share the same object.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<K: HandleKind> Clone for HandleOwner<K> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K: HandleKind> fmt::Debug for HandleOwner<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleOwner")
            .field("kind", &self.inner.kind)
            .field("handle", &self.inner.handle)
            .field("detached", &self.is_detached())
            .field("owners", &self.owner_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HeadlessDevice;

    fn registry() -> (Rc<HeadlessDevice>, Rc<ResourceRegistry>) {
        let device = Rc::new(HeadlessDevice::new());
        let registry = Rc::new(ResourceRegistry::new(device.clone()));
        (device, registry)
    }

    #[test]
    fn test_last_clone_deletes_once() {
        let (device, registry) = registry();
        let owner =
            HandleOwner::<TextureObject>::allocate(&registry, ObjectKind::Texture, None).unwrap();
        let handle = owner.raw();
        let ticket = owner.ticket().unwrap();
        let clones: Vec<_> = (0..4).map(|_| owner.clone()).collect();
        assert_eq!(owner.owner_count(), 5);

        drop(owner);
        for clone in clones.iter().skip(1) {
            assert!(clone.ptr_eq(&clones[0]));
        }
        let mut clones = clones;
        while clones.len() > 1 {
            clones.pop();
            assert_eq!(device.delete_count(handle), 0);
        }
        clones.pop();
        assert_eq!(device.delete_count(handle), 1);
        assert!(!registry.is_tracked(ticket));
    }

    #[test]
    fn test_detached_owner_never_deletes() {
        let (device, _registry) = registry();
        let owner = HandleOwner::<FramebufferObject>::detached(
            device.clone(),
            ObjectKind::Framebuffer,
            GlHandle::NULL,
        );
        assert!(owner.is_detached());
        drop(owner);
        assert_eq!(device.delete_count(GlHandle::NULL), 0);
    }

    #[test]
    fn test_drop_after_release_all_is_noop() {
        let (device, registry) = registry();
        let owner =
            HandleOwner::<BufferObject>::allocate(&registry, ObjectKind::Buffer, None).unwrap();
        let handle = owner.raw();
        registry.release_all();
        drop(owner);
        assert_eq!(device.delete_count(handle), 1);
    }

    #[test]
    fn test_late_drop_spares_object_with_reused_name() {
        let device = Rc::new(HeadlessDevice::new().with_name_reuse());
        let registry = Rc::new(ResourceRegistry::new(device.clone()));
        let stale =
            HandleOwner::<TextureObject>::allocate(&registry, ObjectKind::Texture, None).unwrap();
        registry.release_all();

        let fresh =
            HandleOwner::<TextureObject>::allocate(&registry, ObjectKind::Texture, None).unwrap();
        let name = fresh.raw();
        assert_eq!(stale.raw(), name);

        drop(stale);
        assert!(device.is_live(name));
        assert_eq!(registry.live_count(), 1);
        drop(fresh);
        assert_eq!(registry.live_count(), 0);
        assert_eq!(device.delete_count(name), 2);
    }
}
