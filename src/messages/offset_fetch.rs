//! OffsetFetch (API key 9).
//!
//! # Supported Versions
//!
//! - v0: Kafka 0.8.2, offsets read from ZooKeeper
//! - v1: Kafka 0.8.2, offsets read from `__consumer_offsets`
//! - v2: Kafka 0.10.2, null topic list fetches every topic; group-level error
//! - v3: Kafka 0.11, adds throttle time
//! - v4: Kafka 2.0
//! - v5: Kafka 2.1, adds the committed leader epoch
//! - v6: Kafka 2.4, first flexible version
//! - v7: Kafka 2.5, adds `require_stable` (KIP-447)

use std::collections::BTreeMap;
use std::time::Duration;

use bytes::BufMut;
use nom::number::complete::{be_i32, be_i64};
use nombytes::NomBytes;

use super::throttle_duration;
use crate::constants::{INVALID_OFFSET, NO_LEADER_EPOCH};
use crate::diagnostics::Diagnostics;
use crate::encode::{
    ToByte, encode_array_len, encode_array_with, encode_empty_tagged_fields,
    encode_nullable_array_len, encode_nullable_string, encode_string,
};
use crate::error::{Error, ErrorCode, Result};
use crate::parser::{
    ParseResult, array, nullable_array, nullable_string, parse_bool, parse_error_code,
    skip_tagged_fields_if, string,
};
use crate::protocol::{ApiKey, ProtocolBody, request_header_version, response_header_version};
use crate::tagged::{TaggedFields, parse_tagged_fields_if};
use crate::version::KafkaVersion;

const FLEXIBLE_VERSION: i16 = 6;

fn required_version(version: i16) -> KafkaVersion {
    match version {
        7 => KafkaVersion::V2_5_0_0,
        6 => KafkaVersion::V2_4_0_0,
        5 => KafkaVersion::V2_1_0_0,
        4 => KafkaVersion::V2_0_0_0,
        3 => KafkaVersion::V0_11_0_0,
        2 => KafkaVersion::V0_10_2_0,
        _ => KafkaVersion::V0_8_2_0,
    }
}

// ============================================================================
// Request
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetFetchRequest {
    pub version: i16,
    pub group_id: String,
    /// `None` asks for every topic the group has committed (v2+).
    pub partitions: Option<BTreeMap<String, Vec<i32>>>,
    /// v7+.
    pub require_stable: bool,
    pub tagged_fields: TaggedFields,
}

impl OffsetFetchRequest {
    /// A request at the highest version `broker` understands.
    pub fn new(
        broker: KafkaVersion,
        group_id: impl Into<String>,
        partitions: Option<BTreeMap<String, Vec<i32>>>,
    ) -> Self {
        Self {
            version: Self::version_for_broker(broker),
            group_id: group_id.into(),
            partitions,
            ..Default::default()
        }
    }

    pub fn add_partition(&mut self, topic: impl Into<String>, partition: i32) {
        self.partitions
            .get_or_insert_with(BTreeMap::new)
            .entry(topic.into())
            .or_default()
            .push(partition);
    }

    /// Ask for no topics at all instead of every topic (v2+ only).
    pub fn zero_partitions(&mut self) {
        if self.partitions.is_none() && self.version >= 2 {
            self.partitions = Some(BTreeMap::new());
        }
    }

    fn is_flexible(&self) -> bool {
        self.version >= FLEXIBLE_VERSION
    }
}

impl ProtocolBody for OffsetFetchRequest {
    const API_KEY: ApiKey = ApiKey::OffsetFetch;
    const MAX_VERSION: i16 = 7;

    fn version(&self) -> i16 {
        self.version
    }

    fn set_version(&mut self, version: i16) {
        self.version = version;
    }

    fn header_version(&self) -> i16 {
        request_header_version(self.is_flexible())
    }

    fn required_version_for(version: i16) -> KafkaVersion {
        required_version(version)
    }

    fn encode_body<W: BufMut>(&self, buffer: &mut W, diagnostics: &mut Diagnostics) -> Result<()> {
        let version = self.version;
        let flexible = self.is_flexible();

        if self.require_stable && version < 7 {
            return Err(Error::Encoding(format!(
                "require_stable needs OffsetFetch v7+, got v{}",
                version
            )));
        }

        encode_string(buffer, &self.group_id, flexible)?;

        match &self.partitions {
            None if version < 2 => {
                diagnostics.field_dropped(
                    Self::API_KEY,
                    version,
                    "partitions",
                    "fetching all topics requires v2+",
                );
                encode_array_len(buffer, 0, flexible)?;
            }
            partitions => {
                encode_nullable_array_len(buffer, partitions.as_ref().map(|p| p.len()), flexible)?;
            }
        }

        for (topic, partitions) in self.partitions.iter().flatten() {
            encode_string(buffer, topic, flexible)?;
            encode_array_with(buffer, partitions, flexible, |buffer, partition| {
                partition.encode(buffer)
            })?;
            if flexible {
                encode_empty_tagged_fields(buffer);
            }
        }

        if version >= 7 {
            self.require_stable.encode(buffer)?;
        }

        self.tagged_fields
            .encode_if(buffer, flexible, diagnostics, Self::API_KEY, version)
    }

    fn parse_body(s: NomBytes, version: i16) -> ParseResult<Self> {
        let flexible = version >= FLEXIBLE_VERSION;

        let (s, group_id) = string(flexible)(s)?;
        let (s, topics) = nullable_array(flexible, |s| parse_fetch_topic(s, flexible))(s)?;
        let partitions = match topics {
            // Before v2 an empty list is how "no topics" reads.
            Some(topics) if topics.is_empty() && version < 2 => None,
            Some(topics) => Some(topics.into_iter().collect()),
            None => None,
        };
        let (s, require_stable) = if version >= 7 {
            parse_bool(s)?
        } else {
            (s, false)
        };
        let (s, tagged_fields) = parse_tagged_fields_if(flexible, s)?;

        Ok((
            s,
            OffsetFetchRequest {
                version,
                group_id,
                partitions,
                require_stable,
                tagged_fields,
            },
        ))
    }
}

fn parse_fetch_topic(s: NomBytes, flexible: bool) -> ParseResult<(String, Vec<i32>)> {
    let (s, topic) = string(flexible)(s)?;
    let (s, partitions) = array(flexible, be_i32)(s)?;
    let (s, _) = skip_tagged_fields_if(flexible, s)?;
    Ok((s, (topic, partitions)))
}

// ============================================================================
// Response
// ============================================================================

/// Committed offset of one partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetFetchResponseBlock {
    pub offset: i64,
    /// v5+.
    pub leader_epoch: i32,
    pub metadata: Option<String>,
    pub error_code: ErrorCode,
}

impl Default for OffsetFetchResponseBlock {
    fn default() -> Self {
        Self {
            offset: INVALID_OFFSET,
            leader_epoch: NO_LEADER_EPOCH,
            metadata: None,
            error_code: ErrorCode::NONE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetFetchResponse {
    pub version: i16,
    /// v3+.
    pub throttle_time_ms: i32,
    pub blocks: BTreeMap<String, BTreeMap<i32, OffsetFetchResponseBlock>>,
    /// Group-level error, v2+.
    pub error_code: ErrorCode,
    pub tagged_fields: TaggedFields,
}

impl OffsetFetchResponse {
    pub fn add_block(
        &mut self,
        topic: impl Into<String>,
        partition: i32,
        block: OffsetFetchResponseBlock,
    ) {
        self.blocks
            .entry(topic.into())
            .or_default()
            .insert(partition, block);
    }

    pub fn get_block(&self, topic: &str, partition: i32) -> Option<&OffsetFetchResponseBlock> {
        self.blocks
            .get(topic)
            .and_then(|partitions| partitions.get(&partition))
    }

    fn is_flexible(&self) -> bool {
        self.version >= FLEXIBLE_VERSION
    }

    fn encode_block<W: BufMut>(
        &self,
        buffer: &mut W,
        partition: i32,
        block: &OffsetFetchResponseBlock,
        diagnostics: &mut Diagnostics,
    ) -> Result<()> {
        let version = self.version;
        let flexible = self.is_flexible();

        partition.encode(buffer)?;
        block.offset.encode(buffer)?;
        if version >= 5 {
            block.leader_epoch.encode(buffer)?;
        } else {
            diagnostics.check(
                block.leader_epoch != NO_LEADER_EPOCH,
                Self::API_KEY,
                version,
                "leader_epoch",
                "requires v5+",
            );
        }
        encode_nullable_string(buffer, block.metadata.as_deref(), flexible)?;
        block.error_code.encode(buffer)?;
        if flexible {
            encode_empty_tagged_fields(buffer);
        }
        Ok(())
    }
}

impl ProtocolBody for OffsetFetchResponse {
    const API_KEY: ApiKey = ApiKey::OffsetFetch;
    const MAX_VERSION: i16 = 7;

    fn version(&self) -> i16 {
        self.version
    }

    fn set_version(&mut self, version: i16) {
        self.version = version;
    }

    fn header_version(&self) -> i16 {
        response_header_version(self.is_flexible())
    }

    fn throttle_time(&self) -> Duration {
        throttle_duration(self.throttle_time_ms)
    }

    fn required_version_for(version: i16) -> KafkaVersion {
        required_version(version)
    }

    fn encode_body<W: BufMut>(&self, buffer: &mut W, diagnostics: &mut Diagnostics) -> Result<()> {
        let version = self.version;
        let flexible = self.is_flexible();

        if version >= 3 {
            self.throttle_time_ms.encode(buffer)?;
        } else {
            diagnostics.check(
                self.throttle_time_ms != 0,
                Self::API_KEY,
                version,
                "throttle_time_ms",
                "requires v3+",
            );
        }

        encode_array_len(buffer, self.blocks.len(), flexible)?;
        for (topic, partitions) in &self.blocks {
            encode_string(buffer, topic, flexible)?;
            encode_array_len(buffer, partitions.len(), flexible)?;
            for (partition, block) in partitions {
                self.encode_block(buffer, *partition, block, diagnostics)?;
            }
            if flexible {
                encode_empty_tagged_fields(buffer);
            }
        }

        if version >= 2 {
            self.error_code.encode(buffer)?;
        } else {
            diagnostics.check(
                !self.error_code.is_ok(),
                Self::API_KEY,
                version,
                "error_code",
                "requires v2+",
            );
        }

        self.tagged_fields
            .encode_if(buffer, flexible, diagnostics, Self::API_KEY, version)
    }

    fn parse_body(s: NomBytes, version: i16) -> ParseResult<Self> {
        let flexible = version >= FLEXIBLE_VERSION;

        let (s, throttle_time_ms) = if version >= 3 { be_i32(s)? } else { (s, 0) };
        let (s, topics) = array(flexible, |s| parse_fetch_response_topic(s, version))(s)?;
        let (s, error_code) = if version >= 2 {
            parse_error_code(s)?
        } else {
            (s, ErrorCode::NONE)
        };
        let (s, tagged_fields) = parse_tagged_fields_if(flexible, s)?;

        Ok((
            s,
            OffsetFetchResponse {
                version,
                throttle_time_ms,
                blocks: topics.into_iter().collect(),
                error_code,
                tagged_fields,
            },
        ))
    }
}

fn parse_fetch_response_topic(
    s: NomBytes,
    version: i16,
) -> ParseResult<(String, BTreeMap<i32, OffsetFetchResponseBlock>)> {
    let flexible = version >= FLEXIBLE_VERSION;
    let (s, topic) = string(flexible)(s)?;
    let (s, partitions) = array(flexible, |s| parse_fetch_response_block(s, version))(s)?;
    let (s, _) = skip_tagged_fields_if(flexible, s)?;
    Ok((s, (topic, partitions.into_iter().collect())))
}

fn parse_fetch_response_block(
    s: NomBytes,
    version: i16,
) -> ParseResult<(i32, OffsetFetchResponseBlock)> {
    let flexible = version >= FLEXIBLE_VERSION;
    let (s, partition) = be_i32(s)?;
    let (s, offset) = be_i64(s)?;
    let (s, leader_epoch) = if version >= 5 {
        be_i32(s)?
    } else {
        (s, NO_LEADER_EPOCH)
    };
    let (s, metadata) = nullable_string(flexible)(s)?;
    let (s, error_code) = parse_error_code(s)?;
    let (s, _) = skip_tagged_fields_if(flexible, s)?;

    Ok((
        s,
        (
            partition,
            OffsetFetchResponseBlock {
                offset,
                leader_epoch,
                metadata,
                error_code,
            },
        ),
    ))
}
