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

//! The two-phase construction protocol shared by every resource.
//!
//! A builder is a plain configuration value: setters take `&mut self` and
//! return `&mut Self` so calls chain, and nothing touches the driver until
//! [`Builder::build`]. A build never fails hard. Missing settings, unreadable
//! files and driver diagnostics are logged, and the returned resource
//! reports `is_complete() == false`. Callers check that flag before
//! attaching, binding or drawing with a resource.

use crate::context::GfxContext;

/// Name and completion flag embedded in every built resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildState {
    name: String,
    complete: bool,
}

impl BuildState {
    /// A fresh, incomplete state.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            complete: false,
        }
    }

    /// The human-readable name given to the builder.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the build succeeded.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Flags the build as successful. Called once, at the end of a build.
    pub(crate) fn mark_complete(&mut self) {
        debug_assert!(!self.complete, "'{}' marked complete twice", self.name);
        self.complete = true;
    }
}

/// A value produced by a [`Builder`].
pub trait BuildTarget {
    /// The embedded build state.
    fn build_state(&self) -> &BuildState;

    /// Whether the build succeeded. Check before using the resource.
    fn is_complete(&self) -> bool {
        self.build_state().is_complete()
    }

    /// The name given to the builder.
    fn name(&self) -> &str {
        self.build_state().name()
    }
}

/// A configuration value that produces a [`BuildTarget`].
pub trait Builder {
    /// What this builder produces.
    type Target: BuildTarget;

    /// The name the target will carry.
    fn name(&self) -> &str;

    /// Kind-specific construction: allocate, upload, validate.
    ///
    /// Implementations mark the target complete only on full success and
    /// must not reach the driver when a mandatory setting is missing.
    fn build_target(&self, ctx: &GfxContext) -> Self::Target;

    /// Builds the target and logs the outcome.
    fn build(&self, ctx: &GfxContext) -> Self::Target {
        let target = self.build_target(ctx);
        if target.is_complete() {
            log::debug!("built '{}'", target.name());
        } else {
            log::warn!("'{}' is incomplete after build", target.name());
        }
        target
    }
}
