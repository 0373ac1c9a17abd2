//! OffsetCommit (API key 8).
//!
//! # Supported Versions
//!
//! - v0: Kafka 0.8.2, offsets stored in ZooKeeper
//! - v1: Kafka 0.8.2, adds generation, member id and a per-partition timestamp
//! - v2: Kafka 0.9, replaces the timestamp with a group-wide retention time
//! - v3: Kafka 0.11, adds throttle time to the response
//! - v4: Kafka 2.0
//! - v5: Kafka 2.1, drops the retention time
//! - v6: Kafka 2.1, adds the committed leader epoch
//! - v7: Kafka 2.3, adds the group instance id (KIP-345)
//!
//! Fields the active version cannot carry are left out and reported through
//! [`Diagnostics`].

use std::collections::BTreeMap;
use std::time::Duration;

use bytes::BufMut;
use nom::number::complete::{be_i32, be_i64};
use nombytes::NomBytes;

use super::throttle_duration;
use crate::constants::{
    DEFAULT_RETENTION_TIME, GROUP_GENERATION_UNDEFINED, NO_LEADER_EPOCH, RECEIVE_TIME,
};
use crate::diagnostics::Diagnostics;
use crate::encode::{ToByte, encode_array_len};
use crate::error::{ErrorCode, KafkaCode, Result};
use crate::parser::{ParseResult, nullable_string, parse_array, parse_error_code, string};
use crate::protocol::{ApiKey, ProtocolBody};
use crate::version::KafkaVersion;

fn required_version(version: i16) -> KafkaVersion {
    match version {
        7 => KafkaVersion::V2_3_0_0,
        5 | 6 => KafkaVersion::V2_1_0_0,
        4 => KafkaVersion::V2_0_0_0,
        3 => KafkaVersion::V0_11_0_0,
        2 => KafkaVersion::V0_9_0_0,
        _ => KafkaVersion::V0_8_2_0,
    }
}

// ============================================================================
// Request
// ============================================================================

/// Offset to commit for one partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetCommitBlock {
    pub offset: i64,
    /// v1 only. [`RECEIVE_TIME`] lets the broker stamp the commit.
    pub timestamp: i64,
    /// v6+.
    pub committed_leader_epoch: i32,
    pub metadata: String,
}

impl Default for OffsetCommitBlock {
    fn default() -> Self {
        Self {
            offset: 0,
            timestamp: RECEIVE_TIME,
            committed_leader_epoch: NO_LEADER_EPOCH,
            metadata: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetCommitRequest {
    pub version: i16,
    pub group_id: String,
    /// v1+.
    pub generation_id: i32,
    /// v1+.
    pub member_id: String,
    /// v7+.
    pub group_instance_id: Option<String>,
    /// v2 to v4. [`DEFAULT_RETENTION_TIME`] keeps the broker's setting.
    pub retention_time_ms: i64,
    pub blocks: BTreeMap<String, BTreeMap<i32, OffsetCommitBlock>>,
}

impl Default for OffsetCommitRequest {
    fn default() -> Self {
        Self {
            version: 0,
            group_id: String::new(),
            generation_id: GROUP_GENERATION_UNDEFINED,
            member_id: String::new(),
            group_instance_id: None,
            retention_time_ms: DEFAULT_RETENTION_TIME,
            blocks: BTreeMap::new(),
        }
    }
}

impl OffsetCommitRequest {
    pub fn add_block(
        &mut self,
        topic: impl Into<String>,
        partition: i32,
        offset: i64,
        timestamp: i64,
        metadata: impl Into<String>,
    ) {
        self.add_block_with_leader_epoch(
            topic,
            partition,
            offset,
            NO_LEADER_EPOCH,
            timestamp,
            metadata,
        );
    }

    pub fn add_block_with_leader_epoch(
        &mut self,
        topic: impl Into<String>,
        partition: i32,
        offset: i64,
        leader_epoch: i32,
        timestamp: i64,
        metadata: impl Into<String>,
    ) {
        self.blocks.entry(topic.into()).or_default().insert(
            partition,
            OffsetCommitBlock {
                offset,
                timestamp,
                committed_leader_epoch: leader_epoch,
                metadata: metadata.into(),
            },
        );
    }

    /// Offset and metadata staged for `topic`/`partition`.
    pub fn offset(&self, topic: &str, partition: i32) -> Option<(i64, &str)> {
        self.blocks
            .get(topic)
            .and_then(|partitions| partitions.get(&partition))
            .map(|block| (block.offset, block.metadata.as_str()))
    }

    fn encode_block<W: BufMut>(
        &self,
        buffer: &mut W,
        partition: i32,
        block: &OffsetCommitBlock,
        diagnostics: &mut Diagnostics,
    ) -> Result<()> {
        let version = self.version;
        partition.encode(buffer)?;
        block.offset.encode(buffer)?;

        if version == 1 {
            block.timestamp.encode(buffer)?;
        } else {
            diagnostics.check(
                block.timestamp != RECEIVE_TIME,
                Self::API_KEY,
                version,
                "timestamp",
                "only carried by v1",
            );
        }

        if version >= 6 {
            block.committed_leader_epoch.encode(buffer)?;
        } else {
            diagnostics.check(
                block.committed_leader_epoch != NO_LEADER_EPOCH,
                Self::API_KEY,
                version,
                "committed_leader_epoch",
                "requires v6+",
            );
        }

        block.metadata.encode(buffer)
    }
}

impl ProtocolBody for OffsetCommitRequest {
    const API_KEY: ApiKey = ApiKey::OffsetCommit;
    const MAX_VERSION: i16 = 7;

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

        if version >= 1 {
            self.generation_id.encode(buffer)?;
            self.member_id.encode(buffer)?;
        } else {
            diagnostics.check(
                self.generation_id != GROUP_GENERATION_UNDEFINED,
                Self::API_KEY,
                version,
                "generation_id",
                "requires v1+",
            );
            diagnostics.check(
                !self.member_id.is_empty(),
                Self::API_KEY,
                version,
                "member_id",
                "requires v1+",
            );
        }

        if (2..=4).contains(&version) {
            self.retention_time_ms.encode(buffer)?;
        } else {
            diagnostics.check(
                self.retention_time_ms != DEFAULT_RETENTION_TIME,
                Self::API_KEY,
                version,
                "retention_time_ms",
                "only carried by v2 to v4",
            );
        }

        if version >= 7 {
            self.group_instance_id.as_deref().encode(buffer)?;
        } else {
            diagnostics.check(
                self.group_instance_id.is_some(),
                Self::API_KEY,
                version,
                "group_instance_id",
                "requires v7+",
            );
        }

        encode_array_len(buffer, self.blocks.len(), false)?;
        for (topic, partitions) in &self.blocks {
            topic.encode(buffer)?;
            encode_array_len(buffer, partitions.len(), false)?;
            for (partition, block) in partitions {
                self.encode_block(buffer, *partition, block, diagnostics)?;
            }
        }
        Ok(())
    }

    fn parse_body(s: NomBytes, version: i16) -> ParseResult<Self> {
        let (s, group_id) = string(false)(s)?;
        let (s, (generation_id, member_id)) = if version >= 1 {
            let (s, generation_id) = be_i32(s)?;
            let (s, member_id) = string(false)(s)?;
            (s, (generation_id, member_id))
        } else {
            (s, (GROUP_GENERATION_UNDEFINED, String::new()))
        };
        let (s, retention_time_ms) = if (2..=4).contains(&version) {
            be_i64(s)?
        } else {
            (s, DEFAULT_RETENTION_TIME)
        };
        let (s, group_instance_id) = if version >= 7 {
            nullable_string(false)(s)?
        } else {
            (s, None)
        };
        let (s, topics) = parse_array(|s| parse_commit_topic(s, version))(s)?;

        Ok((
            s,
            OffsetCommitRequest {
                version,
                group_id,
                generation_id,
                member_id,
                group_instance_id,
                retention_time_ms,
                blocks: topics.into_iter().collect(),
            },
        ))
    }
}

fn parse_commit_topic(
    s: NomBytes,
    version: i16,
) -> ParseResult<(String, BTreeMap<i32, OffsetCommitBlock>)> {
    let (s, topic) = string(false)(s)?;
    let (s, partitions) = parse_array(|s| parse_commit_block(s, version))(s)?;
    Ok((s, (topic, partitions.into_iter().collect())))
}

fn parse_commit_block(s: NomBytes, version: i16) -> ParseResult<(i32, OffsetCommitBlock)> {
    let (s, partition) = be_i32(s)?;
    let (s, offset) = be_i64(s)?;
    let (s, timestamp) = if version == 1 {
        be_i64(s)?
    } else {
        (s, RECEIVE_TIME)
    };
    let (s, committed_leader_epoch) = if version >= 6 {
        be_i32(s)?
    } else {
        (s, NO_LEADER_EPOCH)
    };
    let (s, metadata) = string(false)(s)?;

    Ok((
        s,
        (
            partition,
            OffsetCommitBlock {
                offset,
                timestamp,
                committed_leader_epoch,
                metadata,
            },
        ),
    ))
}

// ============================================================================
// Response
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetCommitResponse {
    pub version: i16,
    /// v3+.
    pub throttle_time_ms: i32,
    pub errors: BTreeMap<String, BTreeMap<i32, ErrorCode>>,
}

impl OffsetCommitResponse {
    pub fn add_error(&mut self, topic: impl Into<String>, partition: i32, error: KafkaCode) {
        self.errors
            .entry(topic.into())
            .or_default()
            .insert(partition, error.into());
    }
}

impl ProtocolBody for OffsetCommitResponse {
    const API_KEY: ApiKey = ApiKey::OffsetCommit;
    const MAX_VERSION: i16 = 7;

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
        if self.version >= 3 {
            self.throttle_time_ms.encode(buffer)?;
        } else {
            diagnostics.check(
                self.throttle_time_ms != 0,
                Self::API_KEY,
                self.version,
                "throttle_time_ms",
                "requires v3+",
            );
        }

        encode_array_len(buffer, self.errors.len(), false)?;
        for (topic, partitions) in &self.errors {
            topic.encode(buffer)?;
            encode_array_len(buffer, partitions.len(), false)?;
            for (partition, error) in partitions {
                partition.encode(buffer)?;
                error.encode(buffer)?;
            }
        }
        Ok(())
    }

    fn parse_body(s: NomBytes, version: i16) -> ParseResult<Self> {
        let (s, throttle_time_ms) = if version >= 3 { be_i32(s)? } else { (s, 0) };
        let (s, topics) = parse_array(parse_commit_topic_errors)(s)?;

        Ok((
            s,
            OffsetCommitResponse {
                version,
                throttle_time_ms,
                errors: topics.into_iter().collect(),
            },
        ))
    }
}

fn parse_commit_topic_errors(s: NomBytes) -> ParseResult<(String, BTreeMap<i32, ErrorCode>)> {
    let (s, topic) = string(false)(s)?;
    let (s, partitions) = parse_array(parse_commit_partition_error)(s)?;
    Ok((s, (topic, partitions.into_iter().collect())))
}

fn parse_commit_partition_error(s: NomBytes) -> ParseResult<(i32, ErrorCode)> {
    let (s, partition) = be_i32(s)?;
    let (s, error) = parse_error_code(s)?;
    Ok((s, (partition, error)))
}
