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

//! Error types.
//!
//! Builders never return these: a build that fails logs a warning and yields
//! an incomplete resource. The errors below cover the operations that act on
//! an already-built resource or talk to the outside world.

use crate::device::ObjectKind;
use std::path::PathBuf;
use thiserror::Error;

/// The driver refused a request.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Object creation failed.
    #[error("failed to create {kind}: {reason}")]
    ObjectCreation {
        /// What was being created.
        kind: ObjectKind,
        /// The driver's message.
        reason: String,
    },
}

/// An error raised by an operation on a GPU resource.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The driver failed to create an object.
    #[error(transparent)]
    Device(#[from] DeviceError),
    /// The driver returned the null name.
    #[error("driver returned a null handle for {kind}")]
    NullHandle {
        /// What was being created.
        kind: ObjectKind,
    },
    /// The resource did not finish building.
    #[error("resource '{name}' is incomplete")]
    Incomplete {
        /// Name of the resource.
        name: String,
    },
    /// A write does not fit the reserved storage.
    #[error("write of {requested} bytes exceeds the {capacity}-byte capacity of '{name}'")]
    CapacityExceeded {
        /// Name of the resource.
        name: String,
        /// Bytes written.
        requested: usize,
        /// Bytes reserved.
        capacity: usize,
    },
    /// Reading or writing an asset failed.
    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// An error raised by an [`AssetIo`](crate::io::AssetIo) implementation.
#[derive(Debug, Error)]
pub enum AssetError {
    /// Nothing exists at the path.
    #[error("asset not found: {}", path.display())]
    NotFound {
        /// The requested path.
        path: PathBuf,
    },
    /// The file exists but could not be read or written.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The path involved.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not a decodable image.
    #[error("failed to decode {}: {reason}", path.display())]
    Decode {
        /// The path involved.
        path: PathBuf,
        /// The codec's message.
        reason: String,
    },
    /// The pixels could not be encoded.
    #[error("failed to encode {}: {reason}", path.display())]
    Encode {
        /// The path involved.
        path: PathBuf,
        /// The codec's message.
        reason: String,
    },
    /// Image dimensions whose byte size does not fit in memory.
    #[error("a {width}x{height} image is too large to address")]
    ImageTooLarge {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
    /// A pixel buffer does not match its dimensions.
    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    InvalidPixelBuffer {
        /// Bytes required by the dimensions.
        expected: usize,
        /// Bytes supplied.
        actual: usize,
    },
}

/// Settings could not be parsed.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The JSON document is malformed or has wrongly typed fields.
    #[error("invalid settings: {0}")]
    Parse(#[from] serde_json::Error),
}
