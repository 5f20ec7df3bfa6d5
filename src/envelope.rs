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

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An immutable unit of work: a name plus a bag of keyed arguments.
///
/// The envelope enforces no schema on its arguments, so be careful when
/// relying on a key being present. Immutability is structural: fields are
/// private and no mutating method exists, so a constructed envelope can never
/// change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    name:      String,
    arguments: BTreeMap<String, Value>,
}

impl Envelope {
    /// Create an envelope with no arguments.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name:      name.into(),
            arguments: BTreeMap::new(),
        }
    }

    /// Create an envelope with a full argument mapping.
    pub fn with_arguments(name: impl Into<String>, arguments: BTreeMap<String, Value>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// Add an argument during construction, consuming the envelope.
    #[must_use]
    pub fn arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    /// The envelope's name.
    #[must_use]
    pub fn name(&self) -> &str { &self.name }

    /// The full argument mapping.
    #[must_use]
    pub const fn all(&self) -> &BTreeMap<String, Value> { &self.arguments }

    /// The argument for `key`, or `None` if absent.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> { self.arguments.get(key) }

    /// Whether the arguments contain `key`.
    #[must_use]
    pub fn has(&self, key: &str) -> bool { self.arguments.contains_key(key) }
}
