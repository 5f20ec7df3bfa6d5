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

use bytes::Bytes;
use snafu::ResultExt;

use crate::Envelope;
use crate::error::{CodecSnafu, Result};

/// Boundary between envelopes and the opaque bytes the driver stores.
///
/// The driver is agnostic to the wire format; queues serialize on push and
/// deserialize on pop/peek through this trait.
pub trait Serializer: Send + Sync {
    fn serialize(&self, envelope: &Envelope) -> Result<Bytes>;

    fn deserialize(&self, raw: &[u8]) -> Result<Envelope>;
}

/// JSON serializer, the default wire format.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn serialize(&self, envelope: &Envelope) -> Result<Bytes> {
        let raw = serde_json::to_vec(envelope).context(CodecSnafu)?;
        Ok(Bytes::from(raw))
    }

    fn deserialize(&self, raw: &[u8]) -> Result<Envelope> {
        serde_json::from_slice(raw).context(CodecSnafu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_round_trip() {
        let serializer = JsonSerializer;
        let envelope = Envelope::new("send-newsletter").arg("to", "jane@example.com");

        let raw = serializer.serialize(&envelope).unwrap();
        let decoded = serializer.deserialize(&raw).unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn test_garbage_input_is_a_codec_error() {
        let serializer = JsonSerializer;
        assert!(serializer.deserialize(b"not json").is_err());
    }
}
