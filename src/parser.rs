//! Deserialize data from the bytecode protocol.
//!
//! Every parser here works on [`NomBytes`] and fails instead of reading past
//! the end of its input: integers come from `nom::number::complete`, and every
//! length or count prefix is validated against the remaining input before
//! anything is taken or allocated.
//!
//! Failure kinds follow a fixed convention that [`crate::error::Error`]
//! relies on when classifying a parse failure:
//!
//! | kind | meaning |
//! |---|---|
//! | `Eof` | input ended early |
//! | `LengthValue` | illegal length or count prefix |
//! | `TooLarge` | varint overflow |
//! | `Verify` | invalid UTF-8 |
use bytes::Bytes;
use nom::{
    IResult, InputLength, Parser,
    bytes::complete::take,
    error::ErrorKind,
    number::complete::{be_i8, be_i16, be_i32, be_u8},
};
use nombytes::NomBytes;

use crate::constants::{MAX_PROTOCOL_ARRAY_SIZE, MAX_UNSIGNED_VARINT_LEN, MAX_VARINT_LEN};
use crate::error::ErrorCode;

pub type ParseError = nom::error::Error<NomBytes>;
pub type ParseResult<T> = IResult<NomBytes, T>;

fn fail<T>(s: NomBytes, kind: ErrorKind) -> ParseResult<T> {
    Err(nom::Err::Failure(ParseError::new(s, kind)))
}

/// Convert bytes to a validated UTF-8 string.
/// Returns an error if the bytes are not valid UTF-8.
pub fn bytes_to_string(bytes: &Bytes) -> Result<String, nom::Err<ParseError>> {
    std::str::from_utf8(bytes)
        .map(|s| s.to_string())
        .map_err(|_| {
            nom::Err::Failure(ParseError::new(
                NomBytes::from(bytes.as_ref()),
                ErrorKind::Verify,
            ))
        })
}

/// Convert optional bytes to a validated UTF-8 string.
/// Returns None for None input, error for invalid UTF-8.
pub fn bytes_to_string_opt(bytes: Option<Bytes>) -> Result<Option<String>, nom::Err<ParseError>> {
    match bytes {
        Some(b) => bytes_to_string(&b).map(Some),
        None => Ok(None),
    }
}

/// BOOLEAN: one byte, anything nonzero is `true`.
pub fn parse_bool(s: NomBytes) -> ParseResult<bool> {
    let (s, b) = be_u8(s)?;
    Ok((s, b != 0))
}

/// Broker error code; unknown values are kept, never rejected.
pub fn parse_error_code(s: NomBytes) -> ParseResult<ErrorCode> {
    let (s, code) = be_i16(s)?;
    Ok((s, ErrorCode::from_wire(code)))
}

// =============================================================================
// Varints
// =============================================================================

/// Parse an unsigned varint (variable-length integer) used in flexible encoding.
/// At most five bytes are read and the value must fit in 32 bits.
pub fn parse_unsigned_varint(s: NomBytes) -> ParseResult<u32> {
    let mut result: u32 = 0;
    let mut remaining = s;

    for i in 0..MAX_UNSIGNED_VARINT_LEN {
        let (s, b) = be_u8(remaining)?;
        remaining = s;

        // Fifth byte only has room for the top four bits.
        if i == MAX_UNSIGNED_VARINT_LEN - 1 && b > 0x0F {
            return fail(remaining, ErrorKind::TooLarge);
        }

        result |= ((b & 0x7F) as u32) << (7 * i);
        if b & 0x80 == 0 {
            return Ok((remaining, result));
        }
    }

    fail(remaining, ErrorKind::TooLarge)
}

/// Parse a protobuf-style zigzag varint into an `i64`.
pub fn parse_varint(s: NomBytes) -> ParseResult<i64> {
    let mut raw: u64 = 0;
    let mut remaining = s;

    for i in 0..MAX_VARINT_LEN {
        let (s, b) = be_u8(remaining)?;
        remaining = s;

        if i == MAX_VARINT_LEN - 1 && b > 0x01 {
            return fail(remaining, ErrorKind::TooLarge);
        }

        raw |= ((b & 0x7F) as u64) << (7 * i);
        if b & 0x80 == 0 {
            let value = ((raw >> 1) as i64) ^ -((raw & 1) as i64);
            return Ok((remaining, value));
        }
    }

    fail(remaining, ErrorKind::TooLarge)
}

// =============================================================================
// Strings and byte arrays
// =============================================================================

fn take_bytes(s: NomBytes, length: usize) -> ParseResult<Bytes> {
    let (s, bytes) = take(length)(s)?;
    Ok((s, bytes.into_bytes()))
}

/// STRING: int16 length followed by that many bytes.
///
/// A `-1` length is read as the empty string; any other negative length
/// is rejected.
pub fn parse_string(s: NomBytes) -> ParseResult<Bytes> {
    let (s, length) = be_i16(s)?;
    match length {
        -1 => Ok((s, Bytes::new())),
        n if n < 0 => fail(s, ErrorKind::LengthValue),
        n => take_bytes(s, n as usize),
    }
}

/// NULLABLE_STRING: int16 length where `-1` is null.
pub fn parse_nullable_string(s: NomBytes) -> ParseResult<Option<Bytes>> {
    let (s, length) = be_i16(s)?;

    // Null string
    if length == -1 {
        return Ok((s, None));
    }

    if length < 0 {
        return fail(s, ErrorKind::LengthValue);
    }

    let (s, string) = take_bytes(s, length as usize)?;
    Ok((s, Some(string)))
}

/// COMPACT_STRING: unsigned varint of length + 1. Null (`0`) is rejected.
pub fn parse_compact_string(s: NomBytes) -> ParseResult<Bytes> {
    let (s, length) = parse_unsigned_varint(s)?;
    if length == 0 {
        return fail(s, ErrorKind::LengthValue);
    }
    take_bytes(s, (length - 1) as usize)
}

/// Parse a COMPACT_NULLABLE_STRING used in flexible encoding.
/// Format: unsigned varint length where:
/// - 0 = null
/// - 1 = empty string ""
/// - n+1 = string of length n
pub fn parse_compact_nullable_string(s: NomBytes) -> ParseResult<Option<Bytes>> {
    let (s, length) = parse_unsigned_varint(s)?;

    // 0 means null
    if length == 0 {
        return Ok((s, None));
    }

    let (s, string) = take_bytes(s, (length - 1) as usize)?;
    Ok((s, Some(string)))
}

/// BYTES: int32 length followed by raw bytes.
pub fn parse_bytes(s: NomBytes) -> ParseResult<Bytes> {
    let (s, length) = be_i32(s)?;
    match length {
        -1 => Ok((s, Bytes::new())),
        n if n < 0 => fail(s, ErrorKind::LengthValue),
        n => take_bytes(s, n as usize),
    }
}

/// NULLABLE_BYTES: int32 length where `-1` is null.
pub fn parse_nullable_bytes(s: NomBytes) -> ParseResult<Option<Bytes>> {
    let (s, length) = be_i32(s)?;
    match length {
        -1 => Ok((s, None)),
        n if n < 0 => fail(s, ErrorKind::LengthValue),
        n => {
            let (s, bytes) = take_bytes(s, n as usize)?;
            Ok((s, Some(bytes)))
        }
    }
}

/// COMPACT_BYTES: same prefix rules as [`parse_compact_string`], no UTF-8 check.
pub fn parse_compact_bytes(s: NomBytes) -> ParseResult<Bytes> {
    parse_compact_string(s)
}

/// COMPACT_NULLABLE_BYTES.
pub fn parse_compact_nullable_bytes(s: NomBytes) -> ParseResult<Option<Bytes>> {
    parse_compact_nullable_string(s)
}

/// Parse a UTF-8 string in the selected regime.
pub fn string(compact: bool) -> impl Fn(NomBytes) -> ParseResult<String> {
    move |s| {
        let (s, raw) = if compact {
            parse_compact_string(s)?
        } else {
            parse_string(s)?
        };
        Ok((s, bytes_to_string(&raw)?))
    }
}

/// Parse a nullable UTF-8 string in the selected regime.
pub fn nullable_string(compact: bool) -> impl Fn(NomBytes) -> ParseResult<Option<String>> {
    move |s| {
        let (s, raw) = if compact {
            parse_compact_nullable_string(s)?
        } else {
            parse_nullable_string(s)?
        };
        Ok((s, bytes_to_string_opt(raw)?))
    }
}

/// Parse a nullable byte array in the selected regime.
pub fn nullable_bytes(compact: bool) -> impl Fn(NomBytes) -> ParseResult<Option<Bytes>> {
    move |s| {
        if compact {
            parse_compact_nullable_bytes(s)
        } else {
            parse_nullable_bytes(s)
        }
    }
}

// =============================================================================
// Arrays
// =============================================================================

/// Validate a decoded element count against the protocol limit and the
/// bytes that are actually left. Every element occupies at least one byte.
fn check_count(s: NomBytes, count: usize) -> ParseResult<Option<usize>> {
    if count > MAX_PROTOCOL_ARRAY_SIZE as usize {
        return fail(s, ErrorKind::LengthValue);
    }
    if count > s.input_len() {
        return Err(nom::Err::Error(ParseError::new(s, ErrorKind::Eof)));
    }
    Ok((s, Some(count)))
}

/// Legacy int32 array count; `None` for the `-1` null marker.
pub fn parse_array_len(s: NomBytes) -> ParseResult<Option<usize>> {
    let (s, length) = be_i32(s)?;
    match length {
        -1 => Ok((s, None)),
        n if n < 0 => fail(s, ErrorKind::LengthValue),
        n => check_count(s, n as usize),
    }
}

/// Compact unsigned varint count (N = count + 1); `None` for `0`.
pub fn parse_compact_array_len(s: NomBytes) -> ParseResult<Option<usize>> {
    let (s, length) = parse_unsigned_varint(s)?;
    match length {
        0 => Ok((s, None)),
        n => check_count(s, (n - 1) as usize),
    }
}

fn collect<O, F>(mut s: NomBytes, count: usize, f: &mut F) -> ParseResult<Vec<O>>
where
    F: Parser<NomBytes, O, ParseError>,
{
    let mut items = Vec::with_capacity(count);
    for _ in 0..count {
        let (rest, item) = f.parse(s)?;
        items.push(item);
        s = rest;
    }
    Ok((s, items))
}

/// Parse an array in the selected regime. A null array reads as empty.
pub fn array<O, F>(compact: bool, mut f: F) -> impl FnMut(NomBytes) -> ParseResult<Vec<O>>
where
    F: Parser<NomBytes, O, ParseError>,
{
    move |s: NomBytes| {
        let (s, count) = if compact {
            parse_compact_array_len(s)?
        } else {
            parse_array_len(s)?
        };
        match count {
            Some(count) => collect(s, count, &mut f),
            None => Ok((s, Vec::new())),
        }
    }
}

/// Parse a nullable array in the selected regime.
pub fn nullable_array<O, F>(
    compact: bool,
    mut f: F,
) -> impl FnMut(NomBytes) -> ParseResult<Option<Vec<O>>>
where
    F: Parser<NomBytes, O, ParseError>,
{
    move |s: NomBytes| {
        let (s, count) = if compact {
            parse_compact_array_len(s)?
        } else {
            parse_array_len(s)?
        };
        match count {
            Some(count) => {
                let (s, items) = collect(s, count, &mut f)?;
                Ok((s, Some(items)))
            }
            None => Ok((s, None)),
        }
    }
}

/// Legacy int32-prefixed array.
pub fn parse_array<O, F>(f: F) -> impl FnMut(NomBytes) -> ParseResult<Vec<O>>
where
    F: Parser<NomBytes, O, ParseError>,
{
    array(false, f)
}

/// Compact varint-prefixed array.
pub fn parse_compact_array<O, F>(f: F) -> impl FnMut(NomBytes) -> ParseResult<Vec<O>>
where
    F: Parser<NomBytes, O, ParseError>,
{
    array(true, f)
}

// =============================================================================
// Misc
// =============================================================================

/// Skip tagged fields in flexible encoding.
/// Format: unsigned varint count, then for each: varint tag, varint size, bytes
pub fn skip_tagged_fields(s: NomBytes) -> ParseResult<()> {
    let (mut s, count) = parse_unsigned_varint(s)?;

    for _ in 0..count {
        let (remaining, _tag) = parse_unsigned_varint(s)?;
        let (remaining, size) = parse_unsigned_varint(remaining)?;
        let (remaining, _) = take(size as usize)(remaining)?;
        s = remaining;
    }

    Ok((s, ()))
}

/// Skip the tagged-field section only when the message is flexible.
pub fn skip_tagged_fields_if(flexible: bool, s: NomBytes) -> ParseResult<()> {
    if flexible {
        skip_tagged_fields(s)
    } else {
        Ok((s, ()))
    }
}

/// Signed byte, exposed so callers need not import nom.
pub fn parse_i8(s: NomBytes) -> ParseResult<i8> {
    be_i8(s)
}
