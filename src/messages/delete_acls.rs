//! DeleteAcls (API key 31).
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
    Acl, AclFilter, Resource, acl_required_version, parse_acl, parse_acl_filter,
    parse_error_and_message, parse_resource,
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
pub struct DeleteAclsRequest {
    pub version: i16,
    pub filters: Vec<AclFilter>,
}

impl ProtocolBody for DeleteAclsRequest {
    const API_KEY: ApiKey = ApiKey::DeleteAcls;
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
        encode_array_len(buffer, self.filters.len(), false)?;
        for filter in &self.filters {
            filter.encode_versioned(buffer, Self::API_KEY, self.version, diagnostics)?;
        }
        Ok(())
    }

    fn parse_body(s: NomBytes, version: i16) -> ParseResult<Self> {
        let (s, filters) = parse_array(|s| parse_acl_filter(s, version))(s)?;
        Ok((s, DeleteAclsRequest { version, filters }))
    }
}

// ============================================================================
// Response
// ============================================================================

/// One ACL removed by a filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchingAcl {
    pub error_code: ErrorCode,
    pub error_message: Option<String>,
    pub resource: Resource,
    pub acl: Acl,
}

/// Result of one [`AclFilter`], in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterResponse {
    pub error_code: ErrorCode,
    pub error_message: Option<String>,
    pub matching_acls: Vec<MatchingAcl>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteAclsResponse {
    pub version: i16,
    pub throttle_time_ms: i32,
    pub filter_responses: Vec<FilterResponse>,
}

impl ProtocolBody for DeleteAclsResponse {
    const API_KEY: ApiKey = ApiKey::DeleteAcls;
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
        encode_array_len(buffer, self.filter_responses.len(), false)?;
        for response in &self.filter_responses {
            response.error_code.encode(buffer)?;
            encode_nullable_string(buffer, response.error_message.as_deref(), false)?;
            encode_array_len(buffer, response.matching_acls.len(), false)?;
            for matching in &response.matching_acls {
                matching.error_code.encode(buffer)?;
                encode_nullable_string(buffer, matching.error_message.as_deref(), false)?;
                matching
                    .resource
                    .encode_versioned(buffer, Self::API_KEY, self.version, diagnostics)?;
                matching.acl.encode(buffer)?;
            }
        }
        Ok(())
    }

    fn parse_body(s: NomBytes, version: i16) -> ParseResult<Self> {
        let (s, throttle_time_ms) = be_i32(s)?;
        let (s, filter_responses) = parse_array(|s| parse_filter_response(s, version))(s)?;

        Ok((
            s,
            DeleteAclsResponse {
                version,
                throttle_time_ms,
                filter_responses,
            },
        ))
    }
}

fn parse_filter_response(s: NomBytes, version: i16) -> ParseResult<FilterResponse> {
    let (s, (error_code, error_message)) = parse_error_and_message(s)?;
    let (s, matching_acls) = parse_array(|s| parse_matching_acl(s, version))(s)?;
    Ok((
        s,
        FilterResponse {
            error_code,
            error_message,
            matching_acls,
        },
    ))
}

fn parse_matching_acl(s: NomBytes, version: i16) -> ParseResult<MatchingAcl> {
    let (s, (error_code, error_message)) = parse_error_and_message(s)?;
    let (s, resource) = parse_resource(s, version)?;
    let (s, acl) = parse_acl(s)?;
    Ok((
        s,
        MatchingAcl {
            error_code,
            error_message,
            resource,
            acl,
        },
    ))
}
