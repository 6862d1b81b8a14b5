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

//! The resource registry: the one authority that allocates and deletes
//! driver objects for a context.
//!
//! Every allocation is appended to a per-class list together with an
//! optional release callback. A handle leaves its list either when its last
//! [`HandleOwner`](crate::handle::HandleOwner) drops or when the whole
//! registry is drained at shutdown, whichever comes first. Either way the
//! callback runs immediately before the driver delete, and the delete is
//! issued once.
//!
//! Entries are keyed by a [`Ticket`], not by driver name: once a name is
//! deleted the driver may hand it out again, and a stale owner must not
//! reach the new object.

use crate::device::{create_object, destroy_object, GlDevice, GlHandle, ObjectClass, ObjectKind};
use crate::error::ResourceError;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Runs immediately before a handle is deleted on the driver.
pub type ReleaseCallback = Box<dyn FnOnce()>;

/// Identifies one allocation. Tickets are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    id: u64,
    class: ObjectClass,
}

impl Ticket {
    /// The class of the allocation.
    pub fn class(&self) -> ObjectClass {
        self.class
    }
}

/// A freshly allocated driver object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    /// The driver name.
    pub handle: GlHandle,
    /// Releases exactly this allocation.
    pub ticket: Ticket,
}

struct TrackedHandle {
    ticket: Ticket,
    handle: GlHandle,
    kind: ObjectKind,
    on_release: Option<ReleaseCallback>,
}

/// Allocation counters, for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Objects allocated over the registry's lifetime.
    pub allocated: usize,
    /// Objects deleted over the registry's lifetime.
    pub released: usize,
    /// Objects currently tracked, per class.
    pub live: HashMap<ObjectClass, usize>,
}

/// Allocates driver objects and tracks them until they are released.
pub struct ResourceRegistry {
    device: Rc<dyn GlDevice>,
    tracked: RefCell<HashMap<ObjectClass, Vec<TrackedHandle>>>,
    next_ticket: Cell<u64>,
    allocated: Cell<usize>,
    released: Cell<usize>,
}

impl fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceRegistry")
            .field("live", &self.live_count())
            .field("allocated", &self.allocated.get())
            .field("released", &self.released.get())
            .finish()
    }
}

impl ResourceRegistry {
    /// Creates an empty registry over a device.
    pub fn new(device: Rc<dyn GlDevice>) -> Self {
        Self {
            device,
            tracked: RefCell::new(HashMap::new()),
            next_ticket: Cell::new(0),
            allocated: Cell::new(0),
            released: Cell::new(0),
        }
    }

    /// The device objects are allocated on.
    pub fn device(&self) -> &Rc<dyn GlDevice> {
        &self.device
    }

    /// Allocates one driver object and starts tracking it.
    ///
    /// ## Arguments
    /// * `kind` - What to create.
    /// * `on_release` - Runs right before the object is deleted.
    ///
    /// ## Errors
    /// Returns the driver's error, or [`ResourceError::NullHandle`] if it
    /// handed back name 0. Nothing is tracked in either case.
    pub fn allocate(
        &self,
        kind: ObjectKind,
        on_release: Option<ReleaseCallback>,
    ) -> Result<Allocation, ResourceError> {
        let handle = create_object(self.device.as_ref(), kind)?;
        if handle.is_null() {
            return Err(ResourceError::NullHandle { kind });
        }
        log::info!("created {kind} {handle}");
        let ticket = Ticket {
            id: self.next_ticket.get(),
            class: kind.class(),
        };
        self.next_ticket.set(ticket.id + 1);
        self.tracked
            .borrow_mut()
            .entry(kind.class())
            .or_default()
            .push(TrackedHandle {
                ticket,
                handle,
                kind,
                on_release,
            });
        self.allocated.set(self.allocated.get() + 1);
        Ok(Allocation { handle, ticket })
    }

    /// Releases one tracked handle: runs its callback, then deletes it.
    ///
    /// Returns `false` without touching the driver if the ticket is not
    /// tracked, which is the case after [`release_all`](Self::release_all)
    /// even when the driver has since reused the name.
    pub fn release(&self, ticket: Ticket) -> bool {
        let entry = {
            let mut tracked = self.tracked.borrow_mut();
            let Some(list) = tracked.get_mut(&ticket.class) else {
                return false;
            };
            let Some(position) = list.iter().position(|entry| entry.ticket == ticket) else {
                return false;
            };
            list.swap_remove(position)
        };
        self.retire(entry);
        true
    }

    /// Releases every tracked handle. Returns how many were released.
    ///
    /// Owners that outlive this call no longer delete anything when dropped.
    pub fn release_all(&self) -> usize {
        let drained: Vec<TrackedHandle> = self
            .tracked
            .borrow_mut()
            .drain()
            .flat_map(|(_, list)| list)
            .collect();
        let count = drained.len();
        for entry in drained {
            self.retire(entry);
        }
        if count > 0 {
            log::info!("released {count} GPU objects");
        }
        count
    }

    /// Returns `true` if the allocation is still tracked.
    pub fn is_tracked(&self, ticket: Ticket) -> bool {
        self.tracked
            .borrow()
            .get(&ticket.class)
            .is_some_and(|list| list.iter().any(|entry| entry.ticket == ticket))
    }

    /// Number of tracked handles across every class.
    pub fn live_count(&self) -> usize {
        self.tracked.borrow().values().map(Vec::len).sum()
    }

    /// Number of tracked handles of one class.
    pub fn live_count_of(&self, class: ObjectClass) -> usize {
        self.tracked.borrow().get(&class).map_or(0, Vec::len)
    }

    /// A snapshot of the allocation counters.
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            allocated: self.allocated.get(),
            released: self.released.get(),
            live: ObjectClass::ALL
                .iter()
                .map(|class| (*class, self.live_count_of(*class)))
                .filter(|(_, count)| *count > 0)
                .collect(),
        }
    }

    // The entry is already out of the tracked lists, so callbacks may
    // allocate or release through this registry.
    fn retire(&self, entry: TrackedHandle) {
        if let Some(on_release) = entry.on_release {
            on_release();
        }
        destroy_object(self.device.as_ref(), entry.kind, entry.handle);
        self.released.set(self.released.get() + 1);
        log::debug!("deleted {} {}", entry.kind, entry.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{HeadlessDevice, ShaderStage};

    fn registry() -> (Rc<HeadlessDevice>, ResourceRegistry) {
        let device = Rc::new(HeadlessDevice::new());
        let registry = ResourceRegistry::new(device.clone());
        (device, registry)
    }

    #[test]
    fn test_allocate_tracks_per_class() {
        let (_, registry) = registry();
        registry.allocate(ObjectKind::Texture, None).unwrap();
        registry.allocate(ObjectKind::Texture, None).unwrap();
        registry
            .allocate(ObjectKind::Shader(ShaderStage::Vertex), None)
            .unwrap();
        assert_eq!(registry.live_count(), 3);
        assert_eq!(registry.live_count_of(ObjectClass::Texture), 2);
        assert_eq!(registry.live_count_of(ObjectClass::Shader), 1);
        assert_eq!(registry.stats().allocated, 3);
    }

    #[test]
    fn test_failed_allocation_is_not_tracked() {
        let (device, registry) = registry();
        device.fail_next_allocations(1);
        let result = registry.allocate(ObjectKind::Buffer, None);
        assert!(matches!(result, Err(ResourceError::Device(_))));
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_callback_runs_before_delete() {
        let (device, registry) = registry();
        let seen_live = Rc::new(Cell::new(None));
        let handle = Rc::new(Cell::new(GlHandle::NULL));
        let callback = {
            let device = device.clone();
            let seen_live = seen_live.clone();
            let handle = handle.clone();
            Box::new(move || seen_live.set(Some(device.is_live(handle.get()))))
        };
        let program = registry.allocate(ObjectKind::Program, Some(callback)).unwrap();
        handle.set(program.handle);

        assert!(registry.release(program.ticket));
        assert_eq!(seen_live.get(), Some(true));
        assert_eq!(device.delete_count(handle.get()), 1);
    }

    #[test]
    fn test_release_all_then_release_is_noop() {
        let (device, registry) = registry();
        let texture = registry.allocate(ObjectKind::Texture, None).unwrap();
        let buffer = registry.allocate(ObjectKind::Buffer, None).unwrap();

        assert_eq!(registry.release_all(), 2);
        assert_eq!(registry.release_all(), 0);
        assert!(!registry.release(texture.ticket));

        assert_eq!(device.delete_count(texture.handle), 1);
        assert_eq!(device.delete_count(buffer.handle), 1);
        assert_eq!(registry.stats().released, 2);
    }

    #[test]
    fn test_callback_may_reenter_registry() {
        let device = Rc::new(HeadlessDevice::new());
        let registry = Rc::new(ResourceRegistry::new(device.clone()));
        let inner = {
            let registry = registry.clone();
            Box::new(move || {
                registry.allocate(ObjectKind::Buffer, None).ok();
            })
        };
        let texture = registry.allocate(ObjectKind::Texture, Some(inner)).unwrap();
        registry.release(texture.ticket);
        assert_eq!(registry.live_count_of(ObjectClass::Buffer), 1);
    }

    #[test]
    fn test_stale_ticket_spares_reused_name() {
        let device = Rc::new(HeadlessDevice::new().with_name_reuse());
        let registry = ResourceRegistry::new(device.clone());
        let old = registry.allocate(ObjectKind::Texture, None).unwrap();
        registry.release_all();

        let new = registry.allocate(ObjectKind::Texture, None).unwrap();
        assert_eq!(old.handle, new.handle);
        assert_ne!(old.ticket, new.ticket);

        assert!(!registry.release(old.ticket));
        assert!(device.is_live(new.handle));
        assert!(registry.is_tracked(new.ticket));
        assert_eq!(device.delete_count(new.handle), 1);
    }
}
