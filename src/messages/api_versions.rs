//! ApiVersions (API key 18).
//!
//! # Supported Versions
//!
//! - v0: Kafka 0.10.0
//! - v1: Kafka 0.11, adds throttle time
//! - v2: Kafka 2.0
//! - v3: Kafka 2.4, first flexible version; the client reports its software
//!   name and version (KIP-511)
//!
//! The response header stays at v0 for every version so that a client can
//! always read the broker's answer, even to a version it does not speak.

use std::time::Duration;

use bytes::BufMut;
use nom::number::complete::{be_i16, be_i32};
use nombytes::NomBytes;

use super::throttle_duration;
use crate::diagnostics::Diagnostics;
use crate::encode::{ToByte, encode_array_with, encode_compact_string, encode_empty_tagged_fields};
use crate::error::{ErrorCode, Result};
use crate::parser::{ParseResult, array, parse_error_code, skip_tagged_fields_if, string};
use crate::protocol::{ApiKey, ProtocolBody, request_header_version};
use crate::tagged::{TaggedFields, parse_tagged_fields_if};
use crate::version::KafkaVersion;

const FLEXIBLE_VERSION: i16 = 3;

fn required_version(version: i16) -> KafkaVersion {
    match version {
        3 => KafkaVersion::V2_4_0_0,
        2 => KafkaVersion::V2_0_0_0,
        1 => KafkaVersion::V0_11_0_0,
        _ => KafkaVersion::V0_10_0_0,
    }
}

// ============================================================================
// Request
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiVersionsRequest {
    pub version: i16,
    /// v3+.
    pub client_software_name: String,
    /// v3+.
    pub client_software_version: String,
    pub tagged_fields: TaggedFields,
}

impl ApiVersionsRequest {
    /// A request that names this crate as the client software at v3+.
    pub fn new(version: i16) -> Self {
        let mut request = Self {
            version,
            ..Default::default()
        };
        if version >= FLEXIBLE_VERSION {
            request.client_software_name = env!("CARGO_PKG_NAME").to_string();
            request.client_software_version = env!("CARGO_PKG_VERSION").to_string();
        }
        request
    }
}

impl ProtocolBody for ApiVersionsRequest {
    const API_KEY: ApiKey = ApiKey::ApiVersions;
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

        if version >= FLEXIBLE_VERSION {
            encode_compact_string(buffer, &self.client_software_name)?;
            encode_compact_string(buffer, &self.client_software_version)?;
        } else {
            diagnostics.check(
                !self.client_software_name.is_empty(),
                Self::API_KEY,
                version,
                "client_software_name",
                "requires v3+",
            );
            diagnostics.check(
                !self.client_software_version.is_empty(),
                Self::API_KEY,
                version,
                "client_software_version",
                "requires v3+",
            );
        }

        self.tagged_fields.encode_if(
            buffer,
            version >= FLEXIBLE_VERSION,
            diagnostics,
            Self::API_KEY,
            version,
        )
    }

    fn parse_body(s: NomBytes, version: i16) -> ParseResult<Self> {
        if version < FLEXIBLE_VERSION {
            return Ok((
                s,
                ApiVersionsRequest {
                    version,
                    ..Default::default()
                },
            ));
        }

        let (s, client_software_name) = string(true)(s)?;
        let (s, client_software_version) = string(true)(s)?;
        let (s, tagged_fields) = parse_tagged_fields_if(true, s)?;

        Ok((
            s,
            ApiVersionsRequest {
                version,
                client_software_name,
                client_software_version,
                tagged_fields,
            },
        ))
    }
}

// ============================================================================
// Response
// ============================================================================

/// Version range the broker supports for one API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApiVersionsResponseKey {
    pub api_key: i16,
    pub min_version: i16,
    pub max_version: i16,
}

impl ApiVersionsResponseKey {
    pub fn key(&self) -> ApiKey {
        ApiKey::from(self.api_key)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiVersionsResponse {
    pub version: i16,
    pub error_code: ErrorCode,
    pub api_keys: Vec<ApiVersionsResponseKey>,
    /// v1+.
    pub throttle_time_ms: i32,
    pub tagged_fields: TaggedFields,
}

impl ApiVersionsResponse {
    /// The broker's entry for `api_key`, if it advertised one.
    pub fn find(&self, api_key: ApiKey) -> Option<&ApiVersionsResponseKey> {
        let raw = i16::from(api_key);
        self.api_keys.iter().find(|k| k.api_key == raw)
    }
}

impl ProtocolBody for ApiVersionsResponse {
    const API_KEY: ApiKey = ApiKey::ApiVersions;
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
        let flexible = version >= FLEXIBLE_VERSION;

        self.error_code.encode(buffer)?;
        encode_array_with(buffer, &self.api_keys, flexible, |buffer, key| {
            key.api_key.encode(buffer)?;
            key.min_version.encode(buffer)?;
            key.max_version.encode(buffer)?;
            if flexible {
                encode_empty_tagged_fields(buffer);
            }
            Ok(())
        })?;

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

        self.tagged_fields
            .encode_if(buffer, flexible, diagnostics, Self::API_KEY, version)
    }

    fn parse_body(s: NomBytes, version: i16) -> ParseResult<Self> {
        let flexible = version >= FLEXIBLE_VERSION;

        let (s, error_code) = parse_error_code(s)?;
        let (s, api_keys) = array(flexible, |s| parse_api_versions_key(s, flexible))(s)?;
        let (s, throttle_time_ms) = if version >= 1 { be_i32(s)? } else { (s, 0) };
        let (s, tagged_fields) = parse_tagged_fields_if(flexible, s)?;

        Ok((
            s,
            ApiVersionsResponse {
                version,
                error_code,
                api_keys,
                throttle_time_ms,
                tagged_fields,
            },
        ))
    }
}

fn parse_api_versions_key(s: NomBytes, flexible: bool) -> ParseResult<ApiVersionsResponseKey> {
    let (s, api_key) = be_i16(s)?;
    let (s, min_version) = be_i16(s)?;
    let (s, max_version) = be_i16(s)?;
    let (s, _) = skip_tagged_fields_if(flexible, s)?;
    Ok((
        s,
        ApiVersionsResponseKey {
            api_key,
            min_version,
            max_version,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KafkaCode;
    use crate::protocol::{decode_from_bytes, encode_to_bytes};
    use bytes::Bytes;

    #[test]
    fn test_api_versions_request_v0_is_empty() {
        let encoded = encode_to_bytes(&ApiVersionsRequest::new(0)).unwrap();
        assert!(encoded.bytes.is_empty());
        assert!(encoded.diagnostics.is_empty());
        assert_eq!(ApiVersionsRequest::new(0).header_version(), 1);
    }

    #[test]
    fn test_api_versions_request_v3() {
        let request = ApiVersionsRequest {
            version: 3,
            client_software_name: "franz".to_string(),
            client_software_version: "1.2.0".to_string(),
            tagged_fields: TaggedFields::default(),
        };
        let encoded = encode_to_bytes(&request).unwrap();
        let mut expected = vec![6];
        expected.extend_from_slice(b"franz");
        expected.push(6);
        expected.extend_from_slice(b"1.2.0");
        expected.push(0);
        assert_eq!(encoded.bytes.as_ref(), expected.as_slice());

        let decoded: ApiVersionsRequest = decode_from_bytes(encoded.bytes, 3).unwrap();
        assert_eq!(decoded, request);
        assert_eq!(decoded.header_version(), 2);
    }

    #[test]
    fn test_api_versions_request_new_names_crate() {
        let request = ApiVersionsRequest::new(3);
        assert_eq!(request.client_software_name, "kafka-codec");
        assert!(!request.client_software_version.is_empty());

        let mut request = request;
        request.version = 2;
        let encoded = encode_to_bytes(&request).unwrap();
        assert_eq!(encoded.diagnostics.len(), 2);
    }

    #[test]
    fn test_api_versions_response_v0() {
        let data: &[u8] = &[
            0, 0, // error
            0, 0, 0, 1, // 1 key
            0, 3, 0, 2, 0, 1, // Metadata, min 2, max 1
        ];
        let response: ApiVersionsResponse =
            decode_from_bytes(Bytes::copy_from_slice(data), 0).unwrap();
        let key = response.find(ApiKey::Metadata).unwrap();
        assert_eq!(key.key(), ApiKey::Metadata);
        assert_eq!((key.min_version, key.max_version), (2, 1));
        assert!(response.find(ApiKey::Fetch).is_none());
        assert_eq!(encode_to_bytes(&response).unwrap().bytes.as_ref(), data);
    }

    #[test]
    fn test_api_versions_response_v3() {
        let data: &[u8] = &[
            0, 0, // error
            2, // 1 key (compact)
            0, 3, 0, 2, 0, 1, 0, // key + tags
            0, 0, 0, 0, // throttle
            0, // tags
        ];
        let response: ApiVersionsResponse =
            decode_from_bytes(Bytes::copy_from_slice(data), 3).unwrap();
        assert_eq!(response.api_keys.len(), 1);
        assert_eq!(response.header_version(), 0);
        assert_eq!(encode_to_bytes(&response).unwrap().bytes.as_ref(), data);
    }

    #[test]
    fn test_api_versions_response_unsupported_version_error() {
        let response: ApiVersionsResponse =
            decode_from_bytes(Bytes::from_static(&[0, 35, 0, 0, 0, 0, 0, 0, 0, 0]), 1).unwrap();
        assert_eq!(response.error_code, KafkaCode::UnsupportedVersion);
        assert!(response.api_keys.is_empty());
    }
}
