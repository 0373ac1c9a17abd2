//! Whole frames: `size | header | body`.
//!
//! Every request and response travels as a big-endian `int32` size followed
//! by that many bytes of header and body. The transport reads and writes the
//! frames; this module turns them into typed messages and back.
//!
//! ```text
//! +----------+-------------------------+------------------------+
//! | size i32 | header (version 0/1/2)  | body (wire version v)  |
//! +----------+-------------------------+------------------------+
//! ```
//!
//! Frames larger than [`CodecConfig::max_frame_size`] are refused in both
//! directions.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use nom::number::complete::be_i16;
use nombytes::NomBytes;
use tracing::{debug, trace};

use crate::config::CodecConfig;
use crate::constants::FRAME_LENGTH_SIZE;
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::parser::ParseResult;
use crate::protocol::{
    ApiKey, Encoded, ProtocolBody, Request, RequestHeader, ResponseHeader, parse_request_header,
    parse_response_header,
};

fn max_frame_size(config: &CodecConfig) -> usize {
    config.max_frame_size.min(i32::MAX as usize)
}

fn check_frame_size(size: usize, config: &CodecConfig) -> Result<()> {
    let max = max_frame_size(config);
    if size > max {
        return Err(Error::FrameTooLarge { size, max });
    }
    Ok(())
}

/// Start a frame with a size placeholder.
fn begin_frame() -> BytesMut {
    let mut buffer = BytesMut::with_capacity(64);
    buffer.put_i32(0);
    buffer
}

/// Patch the size prefix and freeze the frame.
fn finish_frame(mut buffer: BytesMut, config: &CodecConfig) -> Result<Bytes> {
    let size = buffer.len() - FRAME_LENGTH_SIZE;
    check_frame_size(size, config)?;
    buffer[..FRAME_LENGTH_SIZE].copy_from_slice(&(size as i32).to_be_bytes());
    Ok(buffer.freeze())
}

// ============================================================================
// Encoding
// ============================================================================

/// Frame `message` as a request with the configured client id.
pub fn encode_request<M: ProtocolBody>(
    message: &M,
    correlation_id: i32,
    config: &CodecConfig,
) -> Result<Encoded> {
    let mut buffer = begin_frame();
    let mut diagnostics = Diagnostics::new();

    let header = RequestHeader {
        api_key: M::API_KEY,
        api_version: message.version(),
        correlation_id,
        client_id: config.client_id.clone(),
    };
    header.encode(&mut buffer, message.header_version())?;
    message.encode(&mut buffer, &mut diagnostics)?;

    let bytes = finish_frame(buffer, config)?;
    trace!(
        api_key = M::API_KEY.as_str(),
        version = message.version(),
        correlation_id,
        size = bytes.len(),
        "encoded request frame"
    );
    Ok(Encoded { bytes, diagnostics })
}

/// Frame `message` as the response to `correlation_id`.
pub fn encode_response<M: ProtocolBody>(
    message: &M,
    correlation_id: i32,
    config: &CodecConfig,
) -> Result<Encoded> {
    let mut buffer = begin_frame();
    let mut diagnostics = Diagnostics::new();

    ResponseHeader::new(correlation_id).encode(&mut buffer, message.header_version())?;
    message.encode(&mut buffer, &mut diagnostics)?;

    let bytes = finish_frame(buffer, config)?;
    trace!(
        api_key = M::API_KEY.as_str(),
        version = message.version(),
        correlation_id,
        size = bytes.len(),
        "encoded response frame"
    );
    Ok(Encoded { bytes, diagnostics })
}

// ============================================================================
// Decoding
// ============================================================================

/// Take one complete frame off the front of `buffer`.
///
/// Returns `Ok(None)` until the size prefix and the whole payload have
/// arrived. The returned bytes exclude the size prefix.
pub fn split_frame(buffer: &mut BytesMut, config: &CodecConfig) -> Result<Option<Bytes>> {
    if buffer.len() < FRAME_LENGTH_SIZE {
        return Ok(None);
    }

    let size = i32::from_be_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]);
    if size < 0 {
        debug!(size, "negative frame size");
        return Err(Error::InvalidLength);
    }
    let size = size as usize;
    check_frame_size(size, config)?;

    if buffer.len() < FRAME_LENGTH_SIZE + size {
        buffer.reserve(FRAME_LENGTH_SIZE + size - buffer.len());
        return Ok(None);
    }

    buffer.advance(FRAME_LENGTH_SIZE);
    Ok(Some(buffer.split_to(size).freeze()))
}

/// Strip and check the size prefix of one complete frame.
pub fn strip_length_prefix(mut frame: Bytes, config: &CodecConfig) -> Result<Bytes> {
    if frame.len() < FRAME_LENGTH_SIZE {
        return Err(Error::InsufficientData);
    }
    let size = frame.get_i32();
    if size < 0 {
        return Err(Error::InvalidLength);
    }
    let size = size as usize;
    check_frame_size(size, config)?;

    match frame.len() {
        n if n < size => Err(Error::InsufficientData),
        n if n > size => Err(Error::TrailingData(n - size)),
        _ => Ok(frame),
    }
}

/// Decode a response payload (size prefix already removed) for a `M` at
/// `version`.
pub fn decode_response<M: ProtocolBody>(
    payload: Bytes,
    version: i16,
    config: &CodecConfig,
) -> Result<(ResponseHeader, M)> {
    check_frame_size(payload.len(), config)?;

    let mut message = M::default();
    message.set_version(version);
    if !message.is_valid_version() {
        return Err(Error::UnsupportedVersion {
            api_key: M::API_KEY.into(),
            version,
        });
    }

    let (body, header) = parse_response_header(NomBytes::new(payload), message.header_version())
        .map_err(Error::from)?;
    message.decode(body.into_bytes(), version)?;
    Ok((header, message))
}

/// Decode a full response frame, size prefix included.
pub fn decode_response_frame<M: ProtocolBody>(
    frame: Bytes,
    version: i16,
    config: &CodecConfig,
) -> Result<(ResponseHeader, M)> {
    let payload = strip_length_prefix(frame, config)?;
    decode_response(payload, version, config)
}

fn peek_api(s: NomBytes) -> ParseResult<(i16, i16)> {
    let (s, api_key) = be_i16(s)?;
    let (s, api_version) = be_i16(s)?;
    Ok((s, (api_key, api_version)))
}

/// Decode a request payload (size prefix already removed) of any catalog API.
///
/// The api key and version at the front of the header select the body type
/// and the header version.
pub fn decode_request(payload: Bytes, config: &CodecConfig) -> Result<(RequestHeader, Request)> {
    check_frame_size(payload.len(), config)?;

    let (_, (api_key, api_version)) =
        peek_api(NomBytes::new(payload.clone())).map_err(Error::from)?;
    let api_key = ApiKey::from(api_key);
    let header_version = Request::empty(api_key, api_version)?.header_version();

    let (body, header) =
        parse_request_header(NomBytes::new(payload), header_version).map_err(Error::from)?;
    let request = Request::decode(api_key, api_version, body.into_bytes()).map_err(|e| {
        debug!(
            api_key = api_key.as_str(),
            api_version,
            correlation_id = header.correlation_id,
            error = %e,
            "failed to decode request"
        );
        e
    })?;
    Ok((header, request))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KafkaCode;
    use crate::messages::{HeartbeatRequest, HeartbeatResponse, LeaveGroupResponse};

    fn heartbeat(version: i16) -> HeartbeatRequest {
        HeartbeatRequest {
            version,
            group_id: "g".to_string(),
            generation_id: 1,
            member_id: "m".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_encode_request_frame() {
        let config = CodecConfig::with_client_id("c");
        let encoded = encode_request(&heartbeat(0), 7, &config).unwrap();
        let expected: &[u8] = &[
            0, 0, 0, 21, // size
            0, 12, 0, 0, // api key, version
            0, 0, 0, 7, // correlation id
            0, 1, b'c', // client id
            0, 1, b'g', 0, 0, 0, 1, 0, 1, b'm', // body
        ];
        assert_eq!(encoded.bytes.as_ref(), expected);
    }

    #[test]
    fn test_request_frame_round_trip_flexible() {
        let config = CodecConfig::with_client_id("client");
        let encoded = encode_request(&heartbeat(4), 99, &config).unwrap();

        let mut buffer = BytesMut::from(&encoded.bytes[..]);
        let payload = split_frame(&mut buffer, &config).unwrap().unwrap();
        assert!(buffer.is_empty());

        let (header, request) = decode_request(payload, &config).unwrap();
        assert_eq!(header.api_key, ApiKey::Heartbeat);
        assert_eq!(header.api_version, 4);
        assert_eq!(header.correlation_id, 99);
        assert_eq!(header.client_id.as_deref(), Some("client"));
        assert_eq!(request, Request::Heartbeat(heartbeat(4)));
    }

    #[test]
    fn test_response_frame_round_trip() {
        let config = CodecConfig::default();
        let response = HeartbeatResponse {
            version: 4,
            error_code: KafkaCode::RebalanceInProgress.into(),
            ..Default::default()
        };
        let encoded = encode_response(&response, 5, &config).unwrap();
        // size + correlation id + header tags + throttle + error + body tags
        assert_eq!(encoded.bytes.len(), 4 + 4 + 1 + 4 + 2 + 1);

        let (header, decoded): (ResponseHeader, HeartbeatResponse) =
            decode_response_frame(encoded.bytes, 4, &config).unwrap();
        assert_eq!(header.correlation_id, 5);
        assert_eq!(decoded, response);
    }

    #[test]
    fn test_split_frame_waits_for_data() {
        let config = CodecConfig::default();
        let mut buffer = BytesMut::from(&[0u8, 0, 0][..]);
        assert_eq!(split_frame(&mut buffer, &config).unwrap(), None);

        buffer.extend_from_slice(&[6, 0, 0, 0, 1]);
        assert_eq!(split_frame(&mut buffer, &config).unwrap(), None);

        buffer.extend_from_slice(&[0, 0, 0xAA]);
        let frame = split_frame(&mut buffer, &config).unwrap().unwrap();
        assert_eq!(frame.as_ref(), &[0, 0, 0, 1, 0, 0]);
        assert_eq!(buffer.as_ref(), &[0xAA]);
    }

    #[test]
    fn test_split_frame_rejects_bad_sizes() {
        let config = CodecConfig {
            max_frame_size: 16,
            ..Default::default()
        };
        let mut negative = BytesMut::from(&[0xFFu8, 0xFF, 0xFF, 0xFE][..]);
        assert_eq!(
            split_frame(&mut negative, &config).unwrap_err(),
            Error::InvalidLength
        );

        let mut large = BytesMut::from(&[0u8, 0, 0, 17][..]);
        assert_eq!(
            split_frame(&mut large, &config).unwrap_err(),
            Error::FrameTooLarge { size: 17, max: 16 }
        );
    }

    #[test]
    fn test_encode_refuses_oversized_frame() {
        let config = CodecConfig {
            max_frame_size: 10,
            ..Default::default()
        };
        let err = encode_request(&heartbeat(0), 1, &config).unwrap_err();
        assert!(matches!(err, Error::FrameTooLarge { max: 10, .. }));
    }

    #[test]
    fn test_strip_length_prefix() {
        let config = CodecConfig::default();
        let frame = Bytes::from_static(&[0, 0, 0, 2, 0, 0]);
        assert_eq!(
            strip_length_prefix(frame, &config).unwrap().as_ref(),
            &[0, 0]
        );
        assert_eq!(
            strip_length_prefix(Bytes::from_static(&[0, 0, 0, 2, 0]), &config).unwrap_err(),
            Error::InsufficientData
        );
        assert_eq!(
            strip_length_prefix(Bytes::from_static(&[0, 0, 0, 0, 1]), &config).unwrap_err(),
            Error::TrailingData(1)
        );
    }

    #[test]
    fn test_decode_response_checks_version() {
        let config = CodecConfig::default();
        let err = decode_response::<LeaveGroupResponse>(
            Bytes::from_static(&[0, 0, 0, 1, 0, 0]),
            9,
            &config,
        )
        .unwrap_err();
        assert_eq!(
            err,
            Error::UnsupportedVersion {
                api_key: 13,
                version: 9
            }
        );
    }

    #[test]
    fn test_decode_request_unknown_api() {
        let config = CodecConfig::default();
        let payload = Bytes::from_static(&[0, 0, 0, 9, 0, 0, 0, 1]);
        assert!(matches!(
            decode_request(payload, &config).unwrap_err(),
            Error::UnsupportedVersion { api_key: 0, .. }
        ));
    }
}
