//! Heartbeat (API key 12).
//!
//! # Supported Versions
//!
//! - v0: Kafka 0.9
//! - v1: Kafka 0.11, adds throttle time
//! - v2: Kafka 2.0
//! - v3: Kafka 2.3, adds the group instance id
//! - v4: Kafka 2.4, first flexible version

use std::time::Duration;

use bytes::BufMut;
use nom::number::complete::be_i32;
use nombytes::NomBytes;

use super::throttle_duration;
use crate::diagnostics::Diagnostics;
use crate::encode::{ToByte, encode_nullable_string, encode_string};
use crate::error::{ErrorCode, Result};
use crate::parser::{ParseResult, nullable_string, parse_error_code, string};
use crate::protocol::{ApiKey, ProtocolBody, request_header_version, response_header_version};
use crate::tagged::{TaggedFields, parse_tagged_fields_if};
use crate::version::KafkaVersion;

const FLEXIBLE_VERSION: i16 = 4;

fn required_version(version: i16) -> KafkaVersion {
    match version {
        4 => KafkaVersion::V2_4_0_0,
        3 => KafkaVersion::V2_3_0_0,
        2 => KafkaVersion::V2_0_0_0,
        1 => KafkaVersion::V0_11_0_0,
        _ => KafkaVersion::V0_9_0_0,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeartbeatRequest {
    pub version: i16,
    pub group_id: String,
    pub generation_id: i32,
    pub member_id: String,
    /// v3+.
    pub group_instance_id: Option<String>,
    pub tagged_fields: TaggedFields,
}

impl ProtocolBody for HeartbeatRequest {
    const API_KEY: ApiKey = ApiKey::Heartbeat;
    const MAX_VERSION: i16 = 4;

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

        encode_string(buffer, &self.group_id, flexible)?;
        self.generation_id.encode(buffer)?;
        encode_string(buffer, &self.member_id, flexible)?;

        if version >= 3 {
            encode_nullable_string(buffer, self.group_instance_id.as_deref(), flexible)?;
        } else {
            diagnostics.check(
                self.group_instance_id.is_some(),
                Self::API_KEY,
                version,
                "group_instance_id",
                "requires v3+",
            );
        }

        self.tagged_fields
            .encode_if(buffer, flexible, diagnostics, Self::API_KEY, version)
    }

    fn parse_body(s: NomBytes, version: i16) -> ParseResult<Self> {
        let flexible = version >= FLEXIBLE_VERSION;

        let (s, group_id) = string(flexible)(s)?;
        let (s, generation_id) = be_i32(s)?;
        let (s, member_id) = string(flexible)(s)?;
        let (s, group_instance_id) = if version >= 3 {
            nullable_string(flexible)(s)?
        } else {
            (s, None)
        };
        let (s, tagged_fields) = parse_tagged_fields_if(flexible, s)?;

        Ok((
            s,
            HeartbeatRequest {
                version,
                group_id,
                generation_id,
                member_id,
                group_instance_id,
                tagged_fields,
            },
        ))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeartbeatResponse {
    pub version: i16,
    /// v1+.
    pub throttle_time_ms: i32,
    pub error_code: ErrorCode,
    pub tagged_fields: TaggedFields,
}

impl ProtocolBody for HeartbeatResponse {
    const API_KEY: ApiKey = ApiKey::Heartbeat;
    const MAX_VERSION: i16 = 4;

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
        self.tagged_fields.encode_if(
            buffer,
            version >= FLEXIBLE_VERSION,
            diagnostics,
            Self::API_KEY,
            version,
        )
    }

    fn parse_body(s: NomBytes, version: i16) -> ParseResult<Self> {
        let (s, throttle_time_ms) = if version >= 1 { be_i32(s)? } else { (s, 0) };
        let (s, error_code) = parse_error_code(s)?;
        let (s, tagged_fields) = parse_tagged_fields_if(version >= FLEXIBLE_VERSION, s)?;

        Ok((
            s,
            HeartbeatResponse {
                version,
                throttle_time_ms,
                error_code,
                tagged_fields,
            },
        ))
    }
}
