// Copyright 2025 Crrow
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::PathBuf;
use std::time::Duration;

use crate::{DriverConfig, FlatFileDriver, Result};

/// Builder for [`FlatFileDriver`].
pub struct DriverBuilder {
    config: DriverConfig,
}

impl DriverBuilder {
    pub fn new<P: Into<PathBuf>>(base_path: P) -> Self {
        Self {
            config: DriverConfig {
                base_path: base_path.into(),
                ..Default::default()
            },
        }
    }

    /// Permission bits for newly created message files (default `0o740`).
    #[must_use]
    pub const fn file_mode(mut self, mode: u32) -> Self {
        self.config.file_mode = mode;
        self
    }

    /// Re-scan interval for blocking pops (default 50 ms).
    #[must_use]
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Pop timeout used when the caller passes `None` (default zero).
    #[must_use]
    pub const fn default_timeout(mut self, timeout: Duration) -> Self {
        self.config.default_timeout = timeout;
        self
    }

    /// Build the driver, creating the base directory if needed.
    pub fn build(self) -> Result<FlatFileDriver> { FlatFileDriver::new(self.config) }
}
