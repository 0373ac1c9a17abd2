//! AddPartitionsToTxn (API key 24).
//!
//! # Supported Versions
//!
//! - v0: Kafka 0.11
//! - v1: Kafka 2.0
//! - v2: Kafka 2.7
//!
//! The layout is the same at every version; later versions only change how
//! the broker reports some errors.

use std::collections::BTreeMap;
use std::time::Duration;

use bytes::BufMut;
use nom::number::complete::{be_i16, be_i32, be_i64};
use nombytes::NomBytes;

use super::throttle_duration;
use crate::diagnostics::Diagnostics;
use crate::encode::{ToByte, encode_array, encode_array_len, encode_as_array};
use crate::error::{ErrorCode, Result};
use crate::parser::{ParseResult, parse_array, parse_error_code, string};
use crate::protocol::{ApiKey, ProtocolBody};
use crate::version::KafkaVersion;

fn required_version(version: i16) -> KafkaVersion {
    match version {
        2 => KafkaVersion::V2_7_0_0,
        1 => KafkaVersion::V2_0_0_0,
        _ => KafkaVersion::V0_11_0_0,
    }
}

// ============================================================================
// Request
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddPartitionsToTxnRequest {
    pub version: i16,
    pub transactional_id: String,
    pub producer_id: i64,
    pub producer_epoch: i16,
    pub topic_partitions: BTreeMap<String, Vec<i32>>,
}

impl AddPartitionsToTxnRequest {
    pub fn add_partition(&mut self, topic: impl Into<String>, partition: i32) {
        self.topic_partitions
            .entry(topic.into())
            .or_default()
            .push(partition);
    }
}

impl ProtocolBody for AddPartitionsToTxnRequest {
    const API_KEY: ApiKey = ApiKey::AddPartitionsToTxn;
    const MAX_VERSION: i16 = 2;

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

    fn encode_body<W: BufMut>(&self, buffer: &mut W, _diagnostics: &mut Diagnostics) -> Result<()> {
        self.transactional_id.encode(buffer)?;
        self.producer_id.encode(buffer)?;
        self.producer_epoch.encode(buffer)?;

        encode_array_len(buffer, self.topic_partitions.len(), false)?;
        for (topic, partitions) in &self.topic_partitions {
            topic.encode(buffer)?;
            encode_array(buffer, partitions)?;
        }
        Ok(())
    }

    fn parse_body(s: NomBytes, version: i16) -> ParseResult<Self> {
        let (s, transactional_id) = string(false)(s)?;
        let (s, producer_id) = be_i64(s)?;
        let (s, producer_epoch) = be_i16(s)?;
        let (s, topics) = parse_array(parse_txn_topic)(s)?;

        Ok((
            s,
            AddPartitionsToTxnRequest {
                version,
                transactional_id,
                producer_id,
                producer_epoch,
                topic_partitions: topics.into_iter().collect(),
            },
        ))
    }
}

fn parse_txn_topic(s: NomBytes) -> ParseResult<(String, Vec<i32>)> {
    let (s, topic) = string(false)(s)?;
    let (s, partitions) = parse_array(be_i32)(s)?;
    Ok((s, (topic, partitions)))
}

// ============================================================================
// Response
// ============================================================================

/// Error for one partition of the transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartitionError {
    pub partition: i32,
    pub error_code: ErrorCode,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddPartitionsToTxnResponse {
    pub version: i16,
    pub throttle_time_ms: i32,
    pub errors: BTreeMap<String, Vec<PartitionError>>,
}

impl AddPartitionsToTxnResponse {
    pub fn add_error(&mut self, topic: impl Into<String>, partition: i32, error_code: ErrorCode) {
        self.errors
            .entry(topic.into())
            .or_default()
            .push(PartitionError {
                partition,
                error_code,
            });
    }
}

impl ProtocolBody for AddPartitionsToTxnResponse {
    const API_KEY: ApiKey = ApiKey::AddPartitionsToTxn;
    const MAX_VERSION: i16 = 2;

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

    fn encode_body<W: BufMut>(&self, buffer: &mut W, _diagnostics: &mut Diagnostics) -> Result<()> {
        self.throttle_time_ms.encode(buffer)?;

        encode_array_len(buffer, self.errors.len(), false)?;
        for (topic, errors) in &self.errors {
            topic.encode(buffer)?;
            encode_as_array(buffer, errors, |buffer, error| {
                error.partition.encode(buffer)?;
                error.error_code.encode(buffer)
            })?;
        }
        Ok(())
    }

    fn parse_body(s: NomBytes, version: i16) -> ParseResult<Self> {
        let (s, throttle_time_ms) = be_i32(s)?;
        let (s, topics) = parse_array(parse_txn_topic_errors)(s)?;

        Ok((
            s,
            AddPartitionsToTxnResponse {
                version,
                throttle_time_ms,
                errors: topics.into_iter().collect(),
            },
        ))
    }
}

fn parse_txn_topic_errors(s: NomBytes) -> ParseResult<(String, Vec<PartitionError>)> {
    let (s, topic) = string(false)(s)?;
    let (s, errors) = parse_array(parse_partition_error)(s)?;
    Ok((s, (topic, errors)))
}

fn parse_partition_error(s: NomBytes) -> ParseResult<PartitionError> {
    let (s, partition) = be_i32(s)?;
    let (s, error_code) = parse_error_code(s)?;
    Ok((
        s,
        PartitionError {
            partition,
            error_code,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KafkaCode;
    use crate::protocol::{decode_from_bytes, encode_to_bytes};
    use bytes::Bytes;

    fn request(version: i16) -> AddPartitionsToTxnRequest {
        let mut request = AddPartitionsToTxnRequest {
            version,
            transactional_id: "txn".to_string(),
            producer_id: 8000,
            producer_epoch: 0,
            ..Default::default()
        };
        request.add_partition("one", 1);
        request
    }

    #[test]
    fn test_add_partitions_to_txn_request_bytes() {
        let encoded = encode_to_bytes(&request(0)).unwrap();
        let expected: &[u8] = &[
            0, 3, b't', b'x', b'n', // transactional id
            0, 0, 0, 0, 0, 0, 0x1F, 0x40, // producer id
            0, 0, // producer epoch
            0, 0, 0, 1, // 1 topic
            0, 3, b'o', b'n', b'e', // topic
            0, 0, 0, 1, // 1 partition
            0, 0, 0, 1, // partition 1
        ];
        assert_eq!(encoded.bytes.as_ref(), expected);

        for version in 0..=2 {
            let encoded = encode_to_bytes(&request(version)).unwrap();
            let decoded: AddPartitionsToTxnRequest =
                decode_from_bytes(encoded.bytes, version).unwrap();
            assert_eq!(decoded, request(version));
        }
    }

    #[test]
    fn test_add_partitions_to_txn_response_decode() {
        let data: &[u8] = &[
            0, 0, 0, 100, // throttle
            0, 0, 0, 1, // 1 topic
            0, 3, b'f', b'o', b'o', // topic
            0, 0, 0, 1, // 1 partition
            0, 0, 0, 2, // partition 2
            0, 48, // InvalidTxnState
        ];
        let response: AddPartitionsToTxnResponse =
            decode_from_bytes(Bytes::copy_from_slice(data), 0).unwrap();
        assert_eq!(response.throttle_time(), Duration::from_millis(100));
        assert_eq!(
            response.errors["foo"],
            vec![PartitionError {
                partition: 2,
                error_code: KafkaCode::InvalidTxnState.into(),
            }]
        );

        let mut expected = AddPartitionsToTxnResponse {
            throttle_time_ms: 100,
            ..Default::default()
        };
        expected.add_error("foo", 2, KafkaCode::InvalidTxnState.into());
        assert_eq!(encode_to_bytes(&expected).unwrap().bytes.as_ref(), data);
    }

    #[test]
    fn test_add_partitions_to_txn_required_versions() {
        assert_eq!(
            AddPartitionsToTxnRequest::version_for_broker(KafkaVersion::V2_6_0_0),
            1
        );
        assert_eq!(
            AddPartitionsToTxnRequest::version_for_broker(KafkaVersion::V3_0_0_0),
            2
        );
        assert_eq!(request(2).required_version(), KafkaVersion::V2_7_0_0);
    }
}
