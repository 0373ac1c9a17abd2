//! Codec configuration.
//!
//! The codec reads no files or environment variables. [`CodecConfig`] derives
//! `Deserialize` so a host application can embed it in its own configuration
//! and hand it over, e.g.:
//!
//! ```toml
//! [kafka]
//! client_id = "billing-consumer"
//! broker_version = "2.3.0"
//! max_frame_size = 1048576
//! ```

use serde::Deserialize;

use crate::constants::{DEFAULT_MAX_FRAME_SIZE, FRAME_LENGTH_SIZE, MAX_STRING_SIZE};
use crate::version::{DEFAULT_KAFKA_VERSION, KafkaVersion, MAX_KAFKA_VERSION, MIN_KAFKA_VERSION};

/// Settings shared by every encode and decode call of one client.
///
/// Decoding also enforces a fixed limit that is not configurable: every array
/// may hold at most
/// [`MAX_PROTOCOL_ARRAY_SIZE`](crate::constants::MAX_PROTOCOL_ARRAY_SIZE)
/// elements. The limit is per array, so nested arrays multiply. A longer
/// array fails to decode even when `max_frame_size` would admit the frame.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Client id written into request headers (v1+).
    ///
    /// Default: None
    pub client_id: Option<String>,

    /// Largest frame, length prefix excluded, that will be decoded.
    ///
    /// Default: 100 MiB
    pub max_frame_size: usize,

    /// Broker release used to pick wire versions.
    ///
    /// Default: 2.1.0
    pub broker_version: KafkaVersion,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            broker_version: DEFAULT_KAFKA_VERSION,
        }
    }
}

impl CodecConfig {
    /// Default settings with the given client id.
    pub fn with_client_id(client_id: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            ..Self::default()
        }
    }

    /// Check the configuration for values the codec cannot honour.
    ///
    /// Returns every problem found, not only the first.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.max_frame_size <= FRAME_LENGTH_SIZE {
            errors.push(format!(
                "max_frame_size ({}) must be larger than {} bytes",
                self.max_frame_size, FRAME_LENGTH_SIZE
            ));
        }

        if self.max_frame_size > i32::MAX as usize {
            errors.push(format!(
                "max_frame_size ({}) must fit in an int32 length prefix",
                self.max_frame_size
            ));
        }

        if let Some(client_id) = &self.client_id {
            if client_id.len() > MAX_STRING_SIZE {
                errors.push(format!(
                    "client_id ({} bytes) exceeds the {} byte string limit",
                    client_id.len(),
                    MAX_STRING_SIZE
                ));
            }
        }

        if self.broker_version < MIN_KAFKA_VERSION || self.broker_version > MAX_KAFKA_VERSION {
            errors.push(format!(
                "broker_version ({}) must be between {} and {}",
                self.broker_version, MIN_KAFKA_VERSION, MAX_KAFKA_VERSION
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
