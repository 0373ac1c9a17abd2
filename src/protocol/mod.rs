//! The message contract shared by every request and response.
//!
//! Each catalog type implements [`ProtocolBody`]: it knows its API key, its
//! supported wire versions, which header wraps it, which broker release
//! understands each wire version, and how to write and parse its body for a
//! given version. The provided methods layer the common rules on top:
//!
//! - `encode` refuses versions outside the supported range.
//! - `decode` refuses versions outside the supported range, refuses trailing
//!   bytes, and leaves `self` untouched when anything fails.
//!
//! [`Request`] and [`Response`] wrap the catalog in tagged variants for callers
//! that dispatch on an API key at runtime.

mod api_key;
mod header;

use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use nom::InputLength;
use nombytes::NomBytes;
use tracing::debug;

use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::messages::*;
use crate::parser::ParseResult;
use crate::version::KafkaVersion;

pub use api_key::ApiKey;
pub use header::{RequestHeader, ResponseHeader, parse_request_header, parse_response_header};

/// Uniform interface of every request and response body.
pub trait ProtocolBody: Sized + Default {
    /// Broker API this body belongs to.
    const API_KEY: ApiKey;

    /// Newest wire version this build can encode and decode.
    const MAX_VERSION: i16;

    /// Oldest wire version this build can encode and decode.
    const MIN_VERSION: i16 = 0;

    /// Wire version currently selected.
    fn version(&self) -> i16;

    fn set_version(&mut self, version: i16);

    /// Version of the header framing this body at its current version.
    fn header_version(&self) -> i16;

    /// Server-imposed throttle, zero where the message carries none.
    fn throttle_time(&self) -> Duration {
        Duration::ZERO
    }

    /// Oldest broker release that understands `version`.
    fn required_version_for(version: i16) -> KafkaVersion;

    /// Write the body for the current version. The version is already known
    /// to be in range when this is called.
    fn encode_body<W: BufMut>(&self, buffer: &mut W, diagnostics: &mut Diagnostics) -> Result<()>;

    /// Parse a body laid out for `version`.
    fn parse_body(s: NomBytes, version: i16) -> ParseResult<Self>;

    fn api_key(&self) -> ApiKey {
        Self::API_KEY
    }

    fn is_valid_version(&self) -> bool {
        Self::supports_version(self.version())
    }

    fn supports_version(version: i16) -> bool {
        (Self::MIN_VERSION..=Self::MAX_VERSION).contains(&version)
    }

    /// Oldest broker release that understands the current version.
    fn required_version(&self) -> KafkaVersion {
        Self::required_version_for(self.version())
    }

    /// Highest wire version a `broker` release understands.
    fn version_for_broker(broker: KafkaVersion) -> i16 {
        (Self::MIN_VERSION..=Self::MAX_VERSION)
            .rev()
            .find(|v| broker.is_at_least(Self::required_version_for(*v)))
            .unwrap_or(Self::MIN_VERSION)
    }

    /// Write the body, refusing an out-of-range version.
    fn encode<W: BufMut>(&self, buffer: &mut W, diagnostics: &mut Diagnostics) -> Result<()> {
        check_version::<Self>(self.version())?;
        self.encode_body(buffer, diagnostics)
    }

    /// Replace `self` with the body parsed from `bytes` at `version`.
    ///
    /// On error `self` is left as it was.
    fn decode(&mut self, bytes: Bytes, version: i16) -> Result<()> {
        check_version::<Self>(version)?;

        let (rest, mut parsed) = Self::parse_body(NomBytes::new(bytes), version).map_err(|e| {
            let err = Error::from(e);
            debug!(
                api_key = Self::API_KEY.as_str(),
                version,
                error = %err,
                "failed to decode message body"
            );
            err
        })?;

        let trailing = rest.input_len();
        if trailing > 0 {
            debug!(
                api_key = Self::API_KEY.as_str(),
                version, trailing, "trailing bytes after message body"
            );
            return Err(Error::TrailingData(trailing));
        }

        parsed.set_version(version);
        *self = parsed;
        Ok(())
    }
}

fn check_version<M: ProtocolBody>(version: i16) -> Result<()> {
    if M::supports_version(version) {
        Ok(())
    } else {
        Err(Error::UnsupportedVersion {
            api_key: M::API_KEY.into(),
            version,
        })
    }
}

/// Header version of a request body, from whether the body is flexible.
#[inline]
pub(crate) fn request_header_version(flexible: bool) -> i16 {
    if flexible { 2 } else { 1 }
}

/// Header version of a response body, from whether the body is flexible.
#[inline]
pub(crate) fn response_header_version(flexible: bool) -> i16 {
    if flexible { 1 } else { 0 }
}

/// An encoded body together with the diagnostics raised while encoding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub bytes: Bytes,
    pub diagnostics: Diagnostics,
}

/// Encode `message` at its current version into a fresh buffer.
pub fn encode_to_bytes<M: ProtocolBody>(message: &M) -> Result<Encoded> {
    let mut buffer = BytesMut::new();
    let mut diagnostics = Diagnostics::new();
    message.encode(&mut buffer, &mut diagnostics)?;
    Ok(Encoded {
        bytes: buffer.freeze(),
        diagnostics,
    })
}

/// Decode a `M` laid out for `version`.
pub fn decode_from_bytes<M: ProtocolBody>(bytes: Bytes, version: i16) -> Result<M> {
    let mut message = M::default();
    message.decode(bytes, version)?;
    Ok(message)
}

// =============================================================================
// Runtime dispatch
// =============================================================================

macro_rules! dispatch_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident($ty:ty)),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub enum $name {
            $($variant($ty),)*
        }

        $(
            impl From<$ty> for $name {
                fn from(body: $ty) -> Self {
                    $name::$variant(body)
                }
            }
        )*

        impl $name {
            /// A default body for `api_key`, set to `version`.
            pub fn empty(api_key: ApiKey, version: i16) -> Result<Self> {
                match api_key {
                    $(
                        ApiKey::$variant if <$ty>::supports_version(version) => {
                            let mut body = <$ty>::default();
                            body.set_version(version);
                            Ok($name::$variant(body))
                        }
                    )*
                    _ => Err(Error::UnsupportedVersion {
                        api_key: api_key.into(),
                        version,
                    }),
                }
            }

            /// Decode the body for `api_key` at `version`.
            pub fn decode(api_key: ApiKey, version: i16, bytes: Bytes) -> Result<Self> {
                let mut body = Self::empty(api_key, version)?;
                match &mut body {
                    $($name::$variant(inner) => inner.decode(bytes, version)?,)*
                }
                Ok(body)
            }

            pub fn api_key(&self) -> ApiKey {
                match self {
                    $($name::$variant(inner) => inner.api_key(),)*
                }
            }

            pub fn version(&self) -> i16 {
                match self {
                    $($name::$variant(inner) => inner.version(),)*
                }
            }

            pub fn header_version(&self) -> i16 {
                match self {
                    $($name::$variant(inner) => inner.header_version(),)*
                }
            }

            pub fn required_version(&self) -> KafkaVersion {
                match self {
                    $($name::$variant(inner) => inner.required_version(),)*
                }
            }

            pub fn throttle_time(&self) -> Duration {
                match self {
                    $($name::$variant(inner) => inner.throttle_time(),)*
                }
            }

            pub fn encode<W: BufMut>(
                &self,
                buffer: &mut W,
                diagnostics: &mut Diagnostics,
            ) -> Result<()> {
                match self {
                    $($name::$variant(inner) => inner.encode(buffer, diagnostics),)*
                }
            }
        }
    };
}

dispatch_enum! {
    /// Any request in the catalog.
    Request {
        OffsetCommit(OffsetCommitRequest),
        OffsetFetch(OffsetFetchRequest),
        FindCoordinator(FindCoordinatorRequest),
        Heartbeat(HeartbeatRequest),
        LeaveGroup(LeaveGroupRequest),
        ApiVersions(ApiVersionsRequest),
        AddPartitionsToTxn(AddPartitionsToTxnRequest),
        DescribeAcls(DescribeAclsRequest),
        CreateAcls(CreateAclsRequest),
        DeleteAcls(DeleteAclsRequest),
    }
}

dispatch_enum! {
    /// Any response in the catalog.
    Response {
        OffsetCommit(OffsetCommitResponse),
        OffsetFetch(OffsetFetchResponse),
        FindCoordinator(FindCoordinatorResponse),
        Heartbeat(HeartbeatResponse),
        LeaveGroup(LeaveGroupResponse),
        ApiVersions(ApiVersionsResponse),
        AddPartitionsToTxn(AddPartitionsToTxnResponse),
        DescribeAcls(DescribeAclsResponse),
        CreateAcls(CreateAclsResponse),
        DeleteAcls(DeleteAclsResponse),
    }
}
