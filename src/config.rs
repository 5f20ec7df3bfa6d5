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

/// Configuration for the flat-file driver.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Root directory holding one subdirectory per queue.
    pub base_path: PathBuf,

    /// Unix permission bits applied to newly created message files.
    /// Ignored on non-unix platforms.
    pub file_mode: u32,

    /// How often a blocking `pop` re-scans the queue directory while waiting
    /// for a message.
    pub poll_interval: Duration,

    /// Timeout used by `pop` when the caller does not pass one explicitly.
    /// Zero means "return immediately if nothing is pending".
    pub default_timeout: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            base_path:       PathBuf::from("./queue_data"),
            file_mode:       0o740,
            poll_interval:   Duration::from_millis(50),
            default_timeout: Duration::ZERO,
        }
    }
}
