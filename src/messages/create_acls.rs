//! CreateAcls (API key 30).
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
    Acl, Resource, acl_required_version, parse_acl, parse_error_and_message, parse_resource,
};
use super::throttle_duration;
use crate::diagnostics::Diagnostics;
use crate::encode::{ToByte, encode_array_len, encode_as_array, encode_nullable_string};
use crate::error::{ErrorCode, Result};
use crate::parser::{ParseResult, parse_array};
use crate::protocol::{ApiKey, ProtocolBody};
use crate::version::KafkaVersion;

// ============================================================================
// Request
// ============================================================================

/// One ACL to create, bound to its resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AclCreation {
    pub resource: Resource,
    pub acl: Acl,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateAclsRequest {
    pub version: i16,
    pub creations: Vec<AclCreation>,
}

impl CreateAclsRequest {
    pub fn add_creation(&mut self, resource: Resource, acl: Acl) {
        self.creations.push(AclCreation { resource, acl });
    }
}

impl ProtocolBody for CreateAclsRequest {
    const API_KEY: ApiKey = ApiKey::CreateAcls;
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
        encode_array_len(buffer, self.creations.len(), false)?;
        for creation in &self.creations {
            creation
                .resource
                .encode_versioned(buffer, Self::API_KEY, self.version, diagnostics)?;
            creation.acl.encode(buffer)?;
        }
        Ok(())
    }

    fn parse_body(s: NomBytes, version: i16) -> ParseResult<Self> {
        let (s, creations) = parse_array(|s| parse_acl_creation(s, version))(s)?;

        Ok((s, CreateAclsRequest { version, creations }))
    }
}

fn parse_acl_creation(s: NomBytes, version: i16) -> ParseResult<AclCreation> {
    let (s, resource) = parse_resource(s, version)?;
    let (s, acl) = parse_acl(s)?;
    Ok((s, AclCreation { resource, acl }))
}

// ============================================================================
// Response
// ============================================================================

/// Outcome of one [`AclCreation`], in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AclCreationResult {
    pub error_code: ErrorCode,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateAclsResponse {
    pub version: i16,
    pub throttle_time_ms: i32,
    pub results: Vec<AclCreationResult>,
}

impl ProtocolBody for CreateAclsResponse {
    const API_KEY: ApiKey = ApiKey::CreateAcls;
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

    fn encode_body<W: BufMut>(&self, buffer: &mut W, _diagnostics: &mut Diagnostics) -> Result<()> {
        self.throttle_time_ms.encode(buffer)?;
        encode_as_array(buffer, &self.results, |buffer, result| {
            result.error_code.encode(buffer)?;
            encode_nullable_string(buffer, result.error_message.as_deref(), false)
        })
    }

    fn parse_body(s: NomBytes, version: i16) -> ParseResult<Self> {
        let (s, throttle_time_ms) = be_i32(s)?;
        let (s, results) = parse_array(parse_acl_creation_result)(s)?;

        Ok((
            s,
            CreateAclsResponse {
                version,
                throttle_time_ms,
                results,
            },
        ))
    }
}

fn parse_acl_creation_result(s: NomBytes) -> ParseResult<AclCreationResult> {
    let (s, (error_code, error_message)) = parse_error_and_message(s)?;
    Ok((
        s,
        AclCreationResult {
            error_code,
            error_message,
        },
    ))
}
