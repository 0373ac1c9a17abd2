//! Frame-level integration tests.
//!
//! A frame is what travels on the socket:
//! ```text
//! [size: i32] [header] [body]
//! ```
//!
//! Request header v1 carries `api_key, api_version, correlation_id,
//! client_id`; v2 adds an empty tagged-field section. Response header v0 is
//! the correlation id alone; v1 adds the tagged-field section.
//!
//! # Running Tests
//!
//! ```sh
//! cargo test --test frame_tests
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use kafka_codec::frame::strip_length_prefix;
use kafka_codec::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn config() -> CodecConfig {
    CodecConfig::with_client_id("orders-service")
}

/// Feed `frames` through `split_frame` a few bytes at a time.
fn split_all(frames: &[Bytes], chunk: usize) -> Vec<Bytes> {
    let stream: Vec<u8> = frames.iter().flat_map(|f| f.iter().copied()).collect();
    let mut buffer = BytesMut::new();
    let mut out = Vec::new();
    for piece in stream.chunks(chunk) {
        buffer.extend_from_slice(piece);
        while let Some(frame) = split_frame(&mut buffer, &config()).unwrap() {
            out.push(frame);
        }
    }
    assert!(buffer.is_empty());
    out
}

// ============================================================================
// Requests
// ============================================================================

#[test]
fn test_request_header_v1_layout() {
    let request = LeaveGroupRequest {
        version: 1,
        group_id: "g".to_string(),
        member_id: "m".to_string(),
        ..Default::default()
    };
    let encoded = encode_request(&request, 0x0102_0304, &config()).unwrap();

    let mut expected = BytesMut::new();
    expected.put_i32(0); // patched below
    expected.put_i16(13);
    expected.put_i16(1);
    expected.put_i32(0x0102_0304);
    expected.put_i16(14);
    expected.put_slice(b"orders-service");
    expected.put_slice(&[0, 1, b'g', 0, 1, b'm']);
    let size = (expected.len() - 4) as i32;
    expected[..4].copy_from_slice(&size.to_be_bytes());

    assert_eq!(encoded.bytes, expected.freeze());
}

#[test]
fn test_request_header_v2_keeps_legacy_client_id() {
    let request = FindCoordinatorRequest {
        version: 3,
        coordinator_key: "g".to_string(),
        ..Default::default()
    };
    let encoded = encode_request(&request, 1, &config()).unwrap();
    let bytes = &encoded.bytes[..];

    // size, key, version, correlation id
    assert_eq!(&bytes[4..12], &[0, 10, 0, 3, 0, 0, 0, 1]);
    // int16 client id length, not a varint
    assert_eq!(&bytes[12..14], &[0, 14]);
    // header tags, then the compact body
    assert_eq!(&bytes[28..], &[0, 2, b'g', 0, 0]);
}

#[test]
fn test_request_without_client_id() {
    let encoded =
        encode_request(&HeartbeatRequest::default(), 3, &CodecConfig::default()).unwrap();
    assert_eq!(&encoded.bytes[12..14], &[0xFF, 0xFF]);

    let payload = strip_length_prefix(encoded.bytes, &CodecConfig::default()).unwrap();
    let (header, _) = decode_request(payload, &CodecConfig::default()).unwrap();
    assert_eq!(header.client_id, None);
}

#[test]
fn test_request_frames_round_trip_through_stream() {
    let mut commit = OffsetCommitRequest {
        version: 7,
        group_id: "g".to_string(),
        ..Default::default()
    };
    commit.add_block_with_leader_epoch("t", 0, 42, 3, RECEIVE_TIME, "");

    let mut fetch = OffsetFetchRequest {
        version: 7,
        group_id: "g".to_string(),
        require_stable: true,
        ..Default::default()
    };
    fetch.add_partition("t", 0);

    let requests: Vec<Request> = vec![
        commit.clone().into(),
        fetch.clone().into(),
        ApiVersionsRequest::new(3).into(),
        HeartbeatRequest {
            version: 4,
            group_id: "g".to_string(),
            ..Default::default()
        }
        .into(),
    ];

    let frames: Vec<Bytes> = vec![
        encode_request(&commit, 1, &config()).unwrap().bytes,
        encode_request(&fetch, 2, &config()).unwrap().bytes,
        encode_request(&ApiVersionsRequest::new(3), 3, &config())
            .unwrap()
            .bytes,
        encode_request(
            &HeartbeatRequest {
                version: 4,
                group_id: "g".to_string(),
                ..Default::default()
            },
            4,
            &config(),
        )
        .unwrap()
        .bytes,
    ];

    for chunk in [1, 3, 7, 1024] {
        let payloads = split_all(&frames, chunk);
        assert_eq!(payloads.len(), requests.len());
        for (i, payload) in payloads.into_iter().enumerate() {
            let (header, request) = decode_request(payload, &config()).unwrap();
            assert_eq!(header.correlation_id, i as i32 + 1);
            assert_eq!(header.client_id.as_deref(), Some("orders-service"));
            assert_eq!(header.api_key, request.api_key());
            assert_eq!(request, requests[i]);
        }
    }
}

// ============================================================================
// Responses
// ============================================================================

#[test]
fn test_api_versions_response_header_is_always_v0() {
    let response = ApiVersionsResponse {
        version: 3,
        api_keys: vec![ApiVersionsResponseKey {
            api_key: 18,
            min_version: 0,
            max_version: 3,
        }],
        ..Default::default()
    };
    let encoded = encode_response(&response, 9, &CodecConfig::default()).unwrap();
    // correlation id then straight into the body: no header tag byte
    assert_eq!(&encoded.bytes[4..10], &[0, 0, 0, 9, 0, 0]);

    let (header, decoded): (ResponseHeader, ApiVersionsResponse) =
        decode_response_frame(encoded.bytes, 3, &CodecConfig::default()).unwrap();
    assert_eq!(header.correlation_id, 9);
    assert_eq!(decoded, response);
}

#[test]
fn test_flexible_response_header_skips_tags() {
    let payload = Bytes::from_static(&[
        0, 0, 0, 42, // correlation id
        1, 0, 1, 0xFF, // header tags with one unknown entry
        0, 0, 0, 0, // throttle
        0, 0, // error
        0, // body tags
    ]);
    let (header, response): (ResponseHeader, HeartbeatResponse) =
        decode_response(payload, 4, &CodecConfig::default()).unwrap();
    assert_eq!(header.correlation_id, 42);
    assert!(response.error_code.is_ok());
}

#[test]
fn test_response_frame_with_bad_prefix() {
    let config = CodecConfig::default();
    let frame = Bytes::from_static(&[0, 0, 0, 9, 0, 0, 0, 1, 0, 0]);
    assert_eq!(
        decode_response_frame::<HeartbeatResponse>(frame, 0, &config).unwrap_err(),
        Error::InsufficientData
    );

    let frame = Bytes::from_static(&[0, 0, 0, 6, 0, 0, 0, 1, 0, 0, 0]);
    assert_eq!(
        decode_response_frame::<HeartbeatResponse>(frame, 0, &config).unwrap_err(),
        Error::TrailingData(1)
    );
}

#[test]
fn test_response_payload_respects_limit() {
    let config = CodecConfig {
        max_frame_size: 8,
        ..Default::default()
    };
    let payload = Bytes::from(vec![0u8; 9]);
    assert_eq!(
        decode_response::<HeartbeatResponse>(payload, 0, &config).unwrap_err(),
        Error::FrameTooLarge { size: 9, max: 8 }
    );
}

#[test]
fn test_encode_response_reports_diagnostics() {
    let response = HeartbeatResponse {
        throttle_time_ms: 10,
        ..Default::default()
    };
    let encoded = encode_response(&response, 1, &CodecConfig::default()).unwrap();
    assert_eq!(encoded.bytes.as_ref(), &[0, 0, 0, 6, 0, 0, 0, 1, 0, 0]);
    assert!(encoded.diagnostics.contains("throttle_time_ms"));
}
