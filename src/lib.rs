//! # kafka-codec
//! Encoding and decoding of Kafka wire-protocol messages.
//!
//! This crate turns typed Kafka requests and responses into the exact bytes a
//! broker expects, and back, for every wire version each message supports.
//! It does no I/O: the caller owns the socket, the retries and the
//! coordination logic, and hands frames to and from the codec.
//!
//! # Goals
//! - Byte-exact output for every supported version
//! - Never panic on malformed input; every failure is an [`Error`](error::Error)
//! - Report fields a version cannot carry instead of dropping them silently
//!
//! ## Getting started
//! ```toml
//! kafka-codec = "0.1"
//! ```
//!
//! ### Encoding a request
//! ```rust
//! use kafka_codec::prelude::*;
//!
//! let config = CodecConfig::with_client_id("billing");
//! let mut request = OffsetCommitRequest {
//!     version: 2,
//!     group_id: "billing".to_string(),
//!     ..Default::default()
//! };
//! request.add_block("invoices", 0, 42, RECEIVE_TIME, "");
//!
//! let encoded = encode_request(&request, 1, &config).unwrap();
//! assert!(encoded.diagnostics.is_empty());
//! ```
//!
//! ### Decoding a response
//! ```rust
//! use kafka_codec::prelude::*;
//!
//! // size, correlation id, error code
//! let frame = bytes::Bytes::from_static(&[0, 0, 0, 6, 0, 0, 0, 1, 0, 0]);
//! let (header, response): (ResponseHeader, HeartbeatResponse) =
//!     decode_response_frame(frame, 0, &CodecConfig::default()).unwrap();
//! assert_eq!(header.correlation_id, 1);
//! assert!(response.error_code.is_ok());
//! ```
//!
//! ## Resources
//! - [Kafka Protocol Guide](https://kafka.apache.org/protocol.html)
//! - [Flexible versions (KIP-482)](https://cwiki.apache.org/confluence/display/KAFKA/KIP-482)

#![forbid(unsafe_code)]

pub mod config;
pub mod constants;
pub mod diagnostics;
pub mod encode;
pub mod error;
pub mod frame;
pub mod messages;
pub mod parser;
pub mod protocol;
pub mod tagged;
pub mod version;

pub mod prelude {
    //! Main export of the codec.
    //!
    //! ```rust
    //! use kafka_codec::prelude::*;
    //!
    //! let request = HeartbeatRequest::default();
    //! assert_eq!(request.api_key(), ApiKey::Heartbeat);
    //! ```
    pub use crate::config::CodecConfig;
    pub use crate::constants::{
        GROUP_GENERATION_UNDEFINED, INVALID_OFFSET, NO_LEADER_EPOCH, RECEIVE_TIME,
    };
    pub use crate::diagnostics::{Diagnostics, DroppedField};
    pub use crate::error::{Error, ErrorCode, KafkaCode, Result};
    pub use crate::frame::{
        decode_request, decode_response, decode_response_frame, encode_request, encode_response,
        split_frame,
    };
    pub use crate::messages::*;
    pub use crate::protocol::{
        ApiKey, Encoded, ProtocolBody, Request, RequestHeader, Response, ResponseHeader,
        decode_from_bytes, encode_to_bytes,
    };
    pub use crate::tagged::{TaggedField, TaggedFields};
    pub use crate::version::KafkaVersion;

    pub use bytes;
}
