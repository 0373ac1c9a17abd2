//! DescribeAcls (API key 29).
//!
//! # Supported Versions
//!
//! - v0: Kafka 0.11
//! - v1: Kafka 2.0, adds the resource pattern type

use std::time::Duration;

use bytes::BufMut;
use nom::number::complete::be_i32;
use nombytes::NomBytes;

use super::acl::{
    AclFilter, ResourceAcls, acl_required_version, parse_acl_filter, parse_error_and_message,
    parse_resource_acls,
};
use super::throttle_duration;
use crate::diagnostics::Diagnostics;
use crate::encode::{ToByte, encode_array_len, encode_nullable_string};
use crate::error::{ErrorCode, Result};
use crate::parser::{ParseResult, parse_array};
use crate::protocol::{ApiKey, ProtocolBody};
use crate::version::KafkaVersion;

// ============================================================================
// Request
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescribeAclsRequest {
    pub version: i16,
    pub filter: AclFilter,
}

impl ProtocolBody for DescribeAclsRequest {
    const API_KEY: ApiKey = ApiKey::DescribeAcls;
    const MAX_VERSION: i16 = 1;

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
        acl_required_version(version)
    }

    fn encode_body<W: BufMut>(&self, buffer: &mut W, diagnostics: &mut Diagnostics) -> Result<()> {
        self.filter
            .encode_versioned(buffer, Self::API_KEY, self.version, diagnostics)
    }

    fn parse_body(s: NomBytes, version: i16) -> ParseResult<Self> {
        let (s, filter) = parse_acl_filter(s, version)?;
        Ok((s, DescribeAclsRequest { version, filter }))
    }
}

// ============================================================================
// Response
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescribeAclsResponse {
    pub version: i16,
    pub throttle_time_ms: i32,
    pub error_code: ErrorCode,
    pub error_message: Option<String>,
    pub resource_acls: Vec<ResourceAcls>,
}

impl ProtocolBody for DescribeAclsResponse {
    const API_KEY: ApiKey = ApiKey::DescribeAcls;
    const MAX_VERSION: i16 = 1;

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
        acl_required_version(version)
    }

    fn encode_body<W: BufMut>(&self, buffer: &mut W, diagnostics: &mut Diagnostics) -> Result<()> {
        self.throttle_time_ms.encode(buffer)?;
        self.error_code.encode(buffer)?;
        encode_nullable_string(buffer, self.error_message.as_deref(), false)?;
        encode_array_len(buffer, self.resource_acls.len(), false)?;
        for resource_acls in &self.resource_acls {
            resource_acls.encode_versioned(buffer, Self::API_KEY, self.version, diagnostics)?;
        }
        Ok(())
    }

    fn parse_body(s: NomBytes, version: i16) -> ParseResult<Self> {
        let (s, throttle_time_ms) = be_i32(s)?;
        let (s, (error_code, error_message)) = parse_error_and_message(s)?;
        let (s, resource_acls) = parse_array(|s| parse_resource_acls(s, version))(s)?;

        Ok((
            s,
            DescribeAclsResponse {
                version,
                throttle_time_ms,
                error_code,
                error_message,
                resource_acls,
            },
        ))
    }
}
