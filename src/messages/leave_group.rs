//! LeaveGroup (API key 13).
//!
//! # Supported Versions
//!
//! - v0: Kafka 0.9
//! - v1: Kafka 0.11, adds throttle time to the response
//! - v2: Kafka 2.0
//! - v3: Kafka 2.4, batch leave (KIP-345): one request carries many members

use std::time::Duration;

use bytes::BufMut;
use nom::number::complete::be_i32;
use nombytes::NomBytes;

use super::throttle_duration;
use crate::diagnostics::Diagnostics;
use crate::encode::{ToByte, encode_as_array};
use crate::error::{ErrorCode, Result};
use crate::parser::{ParseResult, nullable_string, parse_array, parse_error_code, string};
use crate::protocol::{ApiKey, ProtocolBody};
use crate::version::KafkaVersion;

fn required_version(version: i16) -> KafkaVersion {
    match version {
        3 => KafkaVersion::V2_4_0_0,
        2 => KafkaVersion::V2_0_0_0,
        1 => KafkaVersion::V0_11_0_0,
        _ => KafkaVersion::V0_9_0_0,
    }
}

// ============================================================================
// Request
// ============================================================================

/// A member leaving the group (v3+).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberIdentity {
    pub member_id: String,
    pub group_instance_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaveGroupRequest {
    pub version: i16,
    pub group_id: String,
    /// v0-2 only.
    pub member_id: String,
    /// v3+ only.
    pub members: Vec<MemberIdentity>,
}

impl ProtocolBody for LeaveGroupRequest {
    const API_KEY: ApiKey = ApiKey::LeaveGroup;
    const MAX_VERSION: i16 = 3;

    fn version(&self) -> i16 {
        self.version
    }

    fn set_version(&mut self, version: i16) {
        self.version = version;
    }

    fn header_version(&self) -> i16 {
        1
    }

    fn required_version_for(version: i16) -> KafkaVersion {
        required_version(version)
    }

    fn encode_body<W: BufMut>(&self, buffer: &mut W, diagnostics: &mut Diagnostics) -> Result<()> {
        let version = self.version;
        self.group_id.encode(buffer)?;

        if version < 3 {
            self.member_id.encode(buffer)?;
            diagnostics.check(
                !self.members.is_empty(),
                Self::API_KEY,
                version,
                "members",
                "batch leave requires v3+",
            );
        } else {
            diagnostics.check(
                !self.member_id.is_empty(),
                Self::API_KEY,
                version,
                "member_id",
                "replaced by members at v3+",
            );
            encode_as_array(buffer, &self.members, |buffer, member| {
                member.member_id.encode(buffer)?;
                member.group_instance_id.as_deref().encode(buffer)
            })?;
        }
        Ok(())
    }

    fn parse_body(s: NomBytes, version: i16) -> ParseResult<Self> {
        let (s, group_id) = string(false)(s)?;
        let (s, member_id) = if version < 3 {
            string(false)(s)?
        } else {
            (s, String::new())
        };
        let (s, members) = if version >= 3 {
            parse_array(parse_member_identity)(s)?
        } else {
            (s, Vec::new())
        };

        Ok((
            s,
            LeaveGroupRequest {
                version,
                group_id,
                member_id,
                members,
            },
        ))
    }
}

fn parse_member_identity(s: NomBytes) -> ParseResult<MemberIdentity> {
    let (s, member_id) = string(false)(s)?;
    let (s, group_instance_id) = nullable_string(false)(s)?;
    Ok((
        s,
        MemberIdentity {
            member_id,
            group_instance_id,
        },
    ))
}

// ============================================================================
// Response
// ============================================================================

/// Per-member outcome of a batch leave (v3+).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberResponse {
    pub member_id: String,
    pub group_instance_id: Option<String>,
    pub error_code: ErrorCode,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaveGroupResponse {
    pub version: i16,
    pub throttle_time_ms: i32,
    pub error_code: ErrorCode,
    pub members: Vec<MemberResponse>,
}

impl ProtocolBody for LeaveGroupResponse {
    const API_KEY: ApiKey = ApiKey::LeaveGroup;
    const MAX_VERSION: i16 = 3;

    fn version(&self) -> i16 {
        self.version
    }

    fn set_version(&mut self, version: i16) {
        self.version = version;
    }

    fn header_version(&self) -> i16 {
        0
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

        if version >= 3 {
            encode_as_array(buffer, &self.members, |buffer, member| {
                member.member_id.encode(buffer)?;
                member.group_instance_id.as_deref().encode(buffer)?;
                member.error_code.encode(buffer)
            })?;
        } else {
            diagnostics.check(
                !self.members.is_empty(),
                Self::API_KEY,
                version,
                "members",
                "requires v3+",
            );
        }
        Ok(())
    }

    fn parse_body(s: NomBytes, version: i16) -> ParseResult<Self> {
        let (s, throttle_time_ms) = if version >= 1 { be_i32(s)? } else { (s, 0) };
        let (s, error_code) = parse_error_code(s)?;
        let (s, members) = if version >= 3 {
            parse_array(parse_member_response)(s)?
        } else {
            (s, Vec::new())
        };

        Ok((
            s,
            LeaveGroupResponse {
                version,
                throttle_time_ms,
                error_code,
                members,
            },
        ))
    }
}

fn parse_member_response(s: NomBytes) -> ParseResult<MemberResponse> {
    let (s, member_id) = string(false)(s)?;
    let (s, group_instance_id) = nullable_string(false)(s)?;
    let (s, error_code) = parse_error_code(s)?;
    Ok((
        s,
        MemberResponse {
            member_id,
            group_instance_id,
            error_code,
        },
    ))
}
