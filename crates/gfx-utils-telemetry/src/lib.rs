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

//! Logging setup.
//!
//! Installs `env_logger` as the `log` backend, writing every record to the
//! console and, optionally, to a log file. `RUST_LOG` takes precedence over
//! the configured level.

#![warn(missing_docs)]

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use env_logger::{Builder, Env, Target};
use log::LevelFilter;
use thiserror::Error;

/// Where and how much to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Level used when `RUST_LOG` is not set.
    pub level: LevelFilter,
    /// File that receives a copy of the console output. Truncated on start.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            file: Some(PathBuf::from("log.txt")),
        }
    }
}

/// Logging could not be set up.
#[derive(Debug, Error)]
pub enum LogInitError {
    /// The log file could not be created.
    #[error("cannot create log file {}: {source}", path.display())]
    File {
        /// The configured path.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
    /// Another logger is already installed.
    #[error(transparent)]
    AlreadyInitialized(#[from] log::SetLoggerError),
}

/// Copies every write to stderr and an optional file.
struct TeeWriter {
    file: Option<File>,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        if let Some(file) = &mut self.file {
            file.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        if let Some(file) = &mut self.file {
            file.flush()?;
        }
        Ok(())
    }
}

fn builder(config: &LogConfig) -> Result<Builder, LogInitError> {
    let file = config
        .file
        .as_ref()
        .map(|path| {
            File::create(path).map_err(|source| LogInitError::File {
                path: path.clone(),
                source,
            })
        })
        .transpose()?;

    let env = Env::default().default_filter_or(config.level.to_string());
    let mut builder = Builder::from_env(env);
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] {}",
                buf.timestamp(),
                record.level(),
                record.args()
            )
        })
        .target(Target::Pipe(Box::new(TeeWriter { file })));
    Ok(builder)
}

/// Installs the global logger.
///
/// ## Errors
/// Fails if the log file cannot be created or a logger is already set.
pub fn init_logging(config: &LogConfig) -> Result<(), LogInitError> {
    builder(config)?.try_init()?;
    if let Some(path) = &config.file {
        log::debug!("logging to console and {}", path.display());
    }
    Ok(())
}
