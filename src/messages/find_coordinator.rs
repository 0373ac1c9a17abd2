//! FindCoordinator (API key 10).
//!
//! # Supported Versions
//!
//! - v0: Kafka 0.8.2, group coordinators only
//! - v1: Kafka 0.11, adds the key type, throttle time and error message
//! - v2: Kafka 2.0
//! - v3: Kafka 2.4, first flexible version

use std::time::Duration;

use bytes::BufMut;
use nom::number::complete::be_i32;
use nombytes::NomBytes;

use super::throttle_duration;
use crate::diagnostics::Diagnostics;
use crate::encode::{ToByte, encode_nullable_string, encode_string};
use crate::error::{ErrorCode, Result};
use crate::parser::{ParseResult, nullable_string, parse_error_code, parse_i8, string};
use crate::protocol::{ApiKey, ProtocolBody, request_header_version, response_header_version};
use crate::tagged::{TaggedFields, parse_tagged_fields_if};
use crate::version::KafkaVersion;

const FLEXIBLE_VERSION: i16 = 3;

fn required_version(version: i16) -> KafkaVersion {
    match version {
        3 => KafkaVersion::V2_4_0_0,
        2 => KafkaVersion::V2_0_0_0,
        1 => KafkaVersion::V0_11_0_0,
        _ => KafkaVersion::V0_8_2_0,
    }
}

/// What the coordinator key names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CoordinatorType {
    #[default]
    Group,
    Transaction,
    Other(i8),
}

impl From<i8> for CoordinatorType {
    fn from(value: i8) -> Self {
        match value {
            0 => CoordinatorType::Group,
            1 => CoordinatorType::Transaction,
            n => CoordinatorType::Other(n),
        }
    }
}

impl From<CoordinatorType> for i8 {
    fn from(value: CoordinatorType) -> Self {
        match value {
            CoordinatorType::Group => 0,
            CoordinatorType::Transaction => 1,
            CoordinatorType::Other(n) => n,
        }
    }
}

// ============================================================================
// Request
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindCoordinatorRequest {
    pub version: i16,
    /// Group id or transactional id, depending on `key_type`.
    pub coordinator_key: String,
    /// v1+.
    pub key_type: CoordinatorType,
    pub tagged_fields: TaggedFields,
}

impl ProtocolBody for FindCoordinatorRequest {
    const API_KEY: ApiKey = ApiKey::FindCoordinator;
    const MAX_VERSION: i16 = 3;

    fn version(&self) -> i16 {
        self.version
    }

    fn set_version(&mut self, version: i16) {
        self.version = version;
    }

    fn header_version(&self) -> i16 {
        request_header_version(self.version >= FLEXIBLE_VERSION)
    }

    fn required_version_for(version: i16) -> KafkaVersion {
        required_version(version)
    }

    fn encode_body<W: BufMut>(&self, buffer: &mut W, diagnostics: &mut Diagnostics) -> Result<()> {
        let version = self.version;
        let flexible = version >= FLEXIBLE_VERSION;

        encode_string(buffer, &self.coordinator_key, flexible)?;
        if version >= 1 {
            i8::from(self.key_type).encode(buffer)?;
        } else {
            diagnostics.check(
                self.key_type != CoordinatorType::Group,
                Self::API_KEY,
                version,
                "key_type",
                "only group coordinators before v1",
            );
        }

        self.tagged_fields
            .encode_if(buffer, flexible, diagnostics, Self::API_KEY, version)
    }

    fn parse_body(s: NomBytes, version: i16) -> ParseResult<Self> {
        let flexible = version >= FLEXIBLE_VERSION;

        let (s, coordinator_key) = string(flexible)(s)?;
        let (s, key_type) = if version >= 1 {
            let (s, key_type) = parse_i8(s)?;
            (s, CoordinatorType::from(key_type))
        } else {
            (s, CoordinatorType::Group)
        };
        let (s, tagged_fields) = parse_tagged_fields_if(flexible, s)?;

        Ok((
            s,
            FindCoordinatorRequest {
                version,
                coordinator_key,
                key_type,
                tagged_fields,
            },
        ))
    }
}

// ============================================================================
// Response
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindCoordinatorResponse {
    pub version: i16,
    /// v1+.
    pub throttle_time_ms: i32,
    pub error_code: ErrorCode,
    /// v1+.
    pub error_message: Option<String>,
    pub node_id: i32,
    pub host: String,
    pub port: i32,
    pub tagged_fields: TaggedFields,
}

impl ProtocolBody for FindCoordinatorResponse {
    const API_KEY: ApiKey = ApiKey::FindCoordinator;
    const MAX_VERSION: i16 = 3;

    fn version(&self) -> i16 {
        self.version
    }

    fn set_version(&mut self, version: i16) {
        self.version = version;
    }

    fn header_version(&self) -> i16 {
        response_header_version(self.version >= FLEXIBLE_VERSION)
    }

    fn throttle_time(&self) -> Duration {
        throttle_duration(self.throttle_time_ms)
    }

    fn required_version_for(version: i16) -> KafkaVersion {
        required_version(version)
    }

    fn encode_body<W: BufMut>(&self, buffer: &mut W, diagnostics: &mut Diagnostics) -> Result<()> {
        let version = self.version;
        let flexible = version >= FLEXIBLE_VERSION;

        if version >= 1 {
            self.throttle_time_ms.encode(buffer)?;
        } else {
            diagnostics.check(
                self.throttle_time_ms != 0,
                Self::API_KEY,
                version,
                "throttle_time_ms",
                "requires v1+",
            );
        }

        self.error_code.encode(buffer)?;

        if version >= 1 {
            encode_nullable_string(buffer, self.error_message.as_deref(), flexible)?;
        } else {
            diagnostics.check(
                self.error_message.is_some(),
                Self::API_KEY,
                version,
                "error_message",
                "requires v1+",
            );
        }

        self.node_id.encode(buffer)?;
        encode_string(buffer, &self.host, flexible)?;
        self.port.encode(buffer)?;

        self.tagged_fields
            .encode_if(buffer, flexible, diagnostics, Self::API_KEY, version)
    }

    fn parse_body(s: NomBytes, version: i16) -> ParseResult<Self> {
        let flexible = version >= FLEXIBLE_VERSION;

        let (s, throttle_time_ms) = if version >= 1 { be_i32(s)? } else { (s, 0) };
        let (s, error_code) = parse_error_code(s)?;
        let (s, error_message) = if version >= 1 {
            nullable_string(flexible)(s)?
        } else {
            (s, None)
        };
        let (s, node_id) = be_i32(s)?;
        let (s, host) = string(flexible)(s)?;
        let (s, port) = be_i32(s)?;
        let (s, tagged_fields) = parse_tagged_fields_if(flexible, s)?;

        Ok((
            s,
            FindCoordinatorResponse {
                version,
                throttle_time_ms,
                error_code,
                error_message,
                node_id,
                host,
                port,
                tagged_fields,
            },
        ))
    }
}
