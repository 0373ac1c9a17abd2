//! Request and response headers.
//!
//! | version | request header | response header |
//! |---|---|---|
//! | 0 | api key, api version, correlation id | correlation id |
//! | 1 | + client id (nullable string) | + tagged fields |
//! | 2 | + tagged fields | n/a |
//!
//! The client id stays a legacy nullable string even in header v2, so a
//! broker can always read it before it knows whether the body is flexible.

use bytes::BufMut;
use nom::number::complete::{be_i16, be_i32};
use nombytes::NomBytes;

use super::ApiKey;
use crate::encode::{ToByte, encode_empty_tagged_fields};
use crate::error::{Error, Result};
use crate::parser::{ParseResult, bytes_to_string_opt, parse_nullable_string, skip_tagged_fields};

/// Header in front of every request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHeader {
    pub api_key: ApiKey,
    pub api_version: i16,
    pub correlation_id: i32,
    pub client_id: Option<String>,
}

impl RequestHeader {
    pub fn new(api_key: ApiKey, api_version: i16, correlation_id: i32) -> Self {
        Self {
            api_key,
            api_version,
            correlation_id,
            client_id: None,
        }
    }

    /// Write the header in the given header version (0, 1 or 2).
    pub fn encode<W: BufMut>(&self, buffer: &mut W, header_version: i16) -> Result<()> {
        check_header_version(header_version, 2)?;

        i16::from(self.api_key).encode(buffer)?;
        self.api_version.encode(buffer)?;
        self.correlation_id.encode(buffer)?;
        if header_version >= 1 {
            self.client_id.as_deref().encode(buffer)?;
        }
        if header_version >= 2 {
            encode_empty_tagged_fields(buffer);
        }
        Ok(())
    }
}

/// Parse a request header of the given header version.
pub fn parse_request_header(s: NomBytes, header_version: i16) -> ParseResult<RequestHeader> {
    let (s, api_key) = be_i16(s)?;
    let (s, api_version) = be_i16(s)?;
    let (s, correlation_id) = be_i32(s)?;

    let (s, client_id) = if header_version >= 1 {
        let (s, raw) = parse_nullable_string(s)?;
        (s, bytes_to_string_opt(raw)?)
    } else {
        (s, None)
    };

    let s = if header_version >= 2 {
        skip_tagged_fields(s)?.0
    } else {
        s
    };

    Ok((
        s,
        RequestHeader {
            api_key: ApiKey::from(api_key),
            api_version,
            correlation_id,
            client_id,
        },
    ))
}

/// Header in front of every response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResponseHeader {
    pub correlation_id: i32,
}

impl ResponseHeader {
    pub fn new(correlation_id: i32) -> Self {
        Self { correlation_id }
    }

    /// Write the header in the given header version (0 or 1).
    pub fn encode<W: BufMut>(&self, buffer: &mut W, header_version: i16) -> Result<()> {
        check_header_version(header_version, 1)?;

        self.correlation_id.encode(buffer)?;
        if header_version >= 1 {
            encode_empty_tagged_fields(buffer);
        }
        Ok(())
    }
}

/// Parse a response header of the given header version.
/// Tagged fields in a v1 header are skipped.
pub fn parse_response_header(s: NomBytes, header_version: i16) -> ParseResult<ResponseHeader> {
    let (s, correlation_id) = be_i32(s)?;
    let s = if header_version >= 1 {
        skip_tagged_fields(s)?.0
    } else {
        s
    };
    Ok((s, ResponseHeader { correlation_id }))
}

fn check_header_version(header_version: i16, max: i16) -> Result<()> {
    if (0..=max).contains(&header_version) {
        Ok(())
    } else {
        Err(Error::Encoding(format!(
            "header version {} is outside 0..={}",
            header_version, max
        )))
    }
}
