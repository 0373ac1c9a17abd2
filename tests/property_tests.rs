//! Property-based tests for the codec.
//!
//! Random field values must survive an encode/decode cycle, and random or
//! truncated input must produce an error rather than a panic.
//!
//! # Running Tests
//!
//! ```sh
//! cargo test --test property_tests
//! ```

use bytes::{Bytes, BytesMut};
use kafka_codec::encode::{encode_unsigned_varint, encode_varint};
use kafka_codec::parser::{parse_unsigned_varint, parse_varint};
use kafka_codec::prelude::*;
use nombytes::NomBytes;
use proptest::prelude::*;

const CATALOG: [ApiKey; 10] = [
    ApiKey::OffsetCommit,
    ApiKey::OffsetFetch,
    ApiKey::FindCoordinator,
    ApiKey::Heartbeat,
    ApiKey::LeaveGroup,
    ApiKey::ApiVersions,
    ApiKey::AddPartitionsToTxn,
    ApiKey::DescribeAcls,
    ApiKey::CreateAcls,
    ApiKey::DeleteAcls,
];

fn topic_name() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9._-]{1,24}"
}

fn offset_block(version: i16) -> impl Strategy<Value = OffsetFetchResponseBlock> {
    (
        any::<i64>(),
        any::<i32>(),
        proptest::option::of("\\PC{0,16}"),
        any::<i16>(),
    )
        .prop_map(move |(offset, epoch, metadata, code)| OffsetFetchResponseBlock {
            offset,
            leader_epoch: if version >= 5 { epoch } else { NO_LEADER_EPOCH },
            metadata,
            error_code: ErrorCode::from_wire(code),
        })
}

proptest! {
    #[test]
    fn test_varint_roundtrip(value: i64) {
        let mut buffer = BytesMut::new();
        encode_varint(&mut buffer, value);
        let (rest, decoded) = parse_varint(NomBytes::new(buffer.freeze())).unwrap();
        prop_assert_eq!(decoded, value);
        prop_assert!(rest.into_bytes().is_empty());
    }

    #[test]
    fn test_unsigned_varint_roundtrip(value: u32) {
        let mut buffer = BytesMut::new();
        encode_unsigned_varint(&mut buffer, value);
        prop_assert!(buffer.len() <= 5);
        let (_, decoded) = parse_unsigned_varint(NomBytes::new(buffer.freeze())).unwrap();
        prop_assert_eq!(decoded, value);
    }

    #[test]
    fn test_heartbeat_roundtrip(
        version in 0i16..=4,
        group_id in "\\PC{0,32}",
        generation_id: i32,
        member_id in "\\PC{0,32}",
        group_instance_id in proptest::option::of("\\PC{0,32}"),
    ) {
        let request = HeartbeatRequest {
            version,
            group_id,
            generation_id,
            member_id,
            group_instance_id: if version >= 3 { group_instance_id } else { None },
            ..Default::default()
        };
        let encoded = encode_to_bytes(&request).unwrap();
        let decoded: HeartbeatRequest = decode_from_bytes(encoded.bytes, version).unwrap();
        prop_assert_eq!(decoded, request);
    }

    #[test]
    fn test_offset_commit_response_roundtrip(
        version in 0i16..=7,
        throttle_time_ms: i32,
        errors in proptest::collection::btree_map(
            topic_name(),
            proptest::collection::btree_map(any::<i32>(), any::<i16>(), 0..4),
            0..4,
        ),
    ) {
        let response = OffsetCommitResponse {
            version,
            throttle_time_ms: if version >= 3 { throttle_time_ms } else { 0 },
            errors: errors
                .into_iter()
                .map(|(topic, partitions)| {
                    let partitions = partitions
                        .into_iter()
                        .map(|(p, code)| (p, ErrorCode::from_wire(code)))
                        .collect();
                    (topic, partitions)
                })
                .collect(),
        };
        let encoded = encode_to_bytes(&response).unwrap();
        prop_assert!(encoded.diagnostics.is_empty());
        let decoded: OffsetCommitResponse = decode_from_bytes(encoded.bytes, version).unwrap();
        prop_assert_eq!(decoded, response);
    }

    #[test]
    fn test_offset_fetch_response_truncation(
        (version, blocks) in (0i16..=7).prop_flat_map(|version| {
            (
                Just(version),
                proptest::collection::vec((topic_name(), any::<i32>(), offset_block(version)), 1..4),
            )
        }),
        cut_seed: usize,
    ) {
        let mut response = OffsetFetchResponse {
            version,
            ..Default::default()
        };
        for (topic, partition, block) in blocks {
            response.add_block(topic, partition, block);
        }
        let encoded = encode_to_bytes(&response).unwrap();
        let decoded: OffsetFetchResponse =
            decode_from_bytes(encoded.bytes.clone(), version).unwrap();
        prop_assert_eq!(&decoded, &response);

        let cut = cut_seed % encoded.bytes.len();
        let result = decode_from_bytes::<OffsetFetchResponse>(encoded.bytes.slice(..cut), version);
        prop_assert!(result.is_err());
    }

    #[test]
    fn test_random_bytes_never_panic(
        data in proptest::collection::vec(any::<u8>(), 0..256),
        key_index in 0usize..CATALOG.len(),
        version in 0i16..=7,
    ) {
        let key = CATALOG[key_index];
        let bytes = Bytes::from(data);
        let _ = Request::decode(key, version, bytes.clone());
        let _ = Response::decode(key, version, bytes);
    }

    #[test]
    fn test_random_frames_never_panic(data in proptest::collection::vec(any::<u8>(), 0..128)) {
        let config = CodecConfig {
            max_frame_size: 1024,
            ..Default::default()
        };
        let mut buffer = BytesMut::from(&data[..]);
        while let Ok(Some(payload)) = split_frame(&mut buffer, &config) {
            let _ = decode_request(payload, &config);
        }
        let _ = decode_response_frame::<ApiVersionsResponse>(Bytes::from(data), 3, &config);
    }

    #[test]
    fn test_encoding_ignores_insertion_order(
        topics in proptest::collection::btree_set(topic_name(), 1..6),
    ) {
        let mut forward = AddPartitionsToTxnRequest::default();
        let mut backward = AddPartitionsToTxnRequest::default();
        for topic in topics.iter() {
            forward.add_partition(topic.clone(), 0);
        }
        for topic in topics.iter().rev() {
            backward.add_partition(topic.clone(), 0);
        }
        prop_assert_eq!(
            encode_to_bytes(&forward).unwrap().bytes,
            encode_to_bytes(&backward).unwrap().bytes
        );
    }
}
