//! Serialize data into the bytecode protocol.
//!
//! Two length-prefix regimes coexist on the wire:
//!
//! - **Legacy**: strings carry an `i16` length (`-1` = null), byte arrays and
//!   arrays carry an `i32` length (`-1` = null).
//! - **Compact** (flexible versions, KIP-482): every length is an unsigned
//!   varint of `len + 1`, with `0` reserved for null.
//!
//! The [`ToByte`] impls write the legacy form. The `compact` flag taken by
//! [`encode_string`], [`encode_nullable_string`], [`encode_array_len`] and
//! friends selects between the two so that message bodies can stay
//! version-agnostic.
use bytes::{BufMut, Bytes};

use crate::constants::MAX_STRING_SIZE;
use crate::error::{Error, ErrorCode, Result};

pub trait ToByte {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()>;
}

impl<'a, T: ToByte + 'a + ?Sized> ToByte for &'a T {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        (*self).encode(buffer)
    }
}

impl ToByte for bool {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        buffer.put_i8(*self as i8);
        Ok(())
    }
}

impl ToByte for i8 {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        buffer.put_i8(*self);
        Ok(())
    }
}

impl ToByte for i16 {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        buffer.put_i16(*self);
        Ok(())
    }
}

impl ToByte for i32 {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        buffer.put_i32(*self);
        Ok(())
    }
}

impl ToByte for u32 {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        buffer.put_u32(*self);
        Ok(())
    }
}

impl ToByte for i64 {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        buffer.put_i64(*self);
        Ok(())
    }
}

impl ToByte for ErrorCode {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        buffer.put_i16(self.to_wire());
        Ok(())
    }
}

impl ToByte for str {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        if self.len() > MAX_STRING_SIZE {
            return Err(Error::Encoding(format!(
                "string of {} bytes exceeds the {} byte limit",
                self.len(),
                MAX_STRING_SIZE
            )));
        }
        buffer.put_i16(self.len() as i16);
        buffer.put(self.as_bytes());
        Ok(())
    }
}

impl ToByte for String {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        self.as_str().encode(buffer)
    }
}

impl ToByte for [u8] {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        buffer.put_i32(checked_i32_len(self.len())?);
        buffer.put(self);
        Ok(())
    }
}

impl ToByte for Bytes {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self[..].encode(buffer)
    }
}

impl ToByte for Option<&[u8]> {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        match *self {
            Some(xs) => xs.encode(buffer),
            None => (-1i32).encode(buffer),
        }
    }
}

impl ToByte for Option<Bytes> {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        match self {
            Some(xs) => xs.encode(buffer),
            None => (-1i32).encode(buffer),
        }
    }
}

impl ToByte for Option<&str> {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        match *self {
            Some(xs) => xs.encode(buffer),
            None => (-1i16).encode(buffer), // NULLABLE_STRING uses i16 length prefix
        }
    }
}

impl ToByte for Option<String> {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.as_deref().encode(buffer)
    }
}

fn checked_i32_len(len: usize) -> Result<i32> {
    i32::try_from(len)
        .map_err(|_| Error::Encoding(format!("length {} does not fit an int32 prefix", len)))
}

fn checked_compact_len(len: usize) -> Result<u32> {
    u32::try_from(len)
        .ok()
        .and_then(|len| len.checked_add(1))
        .ok_or_else(|| Error::Encoding(format!("length {} does not fit a compact prefix", len)))
}

/// Renders the length of `xs` to `buffer` as the start of a
/// protocol array and then for each element of `xs` invokes `f`
/// assuming that function will render the element to the buffer.
pub fn encode_as_array<T, F, W>(buffer: &mut W, xs: &[T], mut f: F) -> Result<()>
where
    F: FnMut(&mut W, &T) -> Result<()>,
    W: BufMut,
{
    buffer.put_i32(checked_i32_len(xs.len())?);
    for x in xs {
        f(buffer, x)?;
    }
    Ok(())
}

/// Encode a slice of ToByte items as a Kafka protocol array.
/// This is a convenience wrapper around `encode_as_array` for the common case.
pub fn encode_array<T: ToByte, W: BufMut>(buffer: &mut W, items: &[T]) -> Result<()> {
    encode_as_array(buffer, items, |buffer, item| item.encode(buffer))
}

/// Encode a compact array (used in flexible encoding).
/// Compact arrays encode length as unsigned varint of (length + 1).
/// A length of 0 means null array.
pub fn encode_compact_array<T, F, W>(buffer: &mut W, items: &[T], mut f: F) -> Result<()>
where
    F: FnMut(&mut W, &T) -> Result<()>,
    W: BufMut,
{
    encode_unsigned_varint(buffer, checked_compact_len(items.len())?);
    for item in items {
        f(buffer, item)?;
    }
    Ok(())
}

/// Write an array length prefix in either regime.
///
/// Used when the elements come from something other than a slice,
/// e.g. the entries of a topic map.
pub fn encode_array_len<W: BufMut>(buffer: &mut W, len: usize, compact: bool) -> Result<()> {
    if compact {
        encode_unsigned_varint(buffer, checked_compact_len(len)?);
    } else {
        buffer.put_i32(checked_i32_len(len)?);
    }
    Ok(())
}

/// Write a nullable array length prefix: `None` is `-1` (legacy) or `0` (compact).
pub fn encode_nullable_array_len<W: BufMut>(
    buffer: &mut W,
    len: Option<usize>,
    compact: bool,
) -> Result<()> {
    match len {
        Some(len) => encode_array_len(buffer, len, compact),
        None if compact => {
            encode_unsigned_varint(buffer, 0);
            Ok(())
        }
        None => {
            buffer.put_i32(-1);
            Ok(())
        }
    }
}

/// Encode a slice as an array in either regime.
pub fn encode_array_with<T, F, W>(buffer: &mut W, items: &[T], compact: bool, mut f: F) -> Result<()>
where
    F: FnMut(&mut W, &T) -> Result<()>,
    W: BufMut,
{
    encode_array_len(buffer, items.len(), compact)?;
    for item in items {
        f(buffer, item)?;
    }
    Ok(())
}

/// Encode an unsigned varint (variable-length integer) to the buffer.
/// Used by flexible encoding formats (KIP-482).
pub fn encode_unsigned_varint<W: BufMut>(buffer: &mut W, mut value: u32) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buffer.put_u8(byte);
        if value == 0 {
            break;
        }
    }
}

/// Encode a signed integer as a protobuf-style zigzag varint.
pub fn encode_varint<W: BufMut>(buffer: &mut W, value: i64) {
    let mut value = ((value << 1) ^ (value >> 63)) as u64;
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buffer.put_u8(byte);
        if value == 0 {
            break;
        }
    }
}

/// Number of bytes `value` occupies as an unsigned varint.
pub fn unsigned_varint_len(value: u32) -> usize {
    match value {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        0x4000..=0x1F_FFFF => 3,
        0x20_0000..=0xFFF_FFFF => 4,
        _ => 5,
    }
}

/// COMPACT_STRING: varint(len + 1) followed by the UTF-8 bytes.
pub fn encode_compact_string<W: BufMut>(buffer: &mut W, s: &str) -> Result<()> {
    encode_unsigned_varint(buffer, checked_compact_len(s.len())?);
    buffer.put_slice(s.as_bytes());
    Ok(())
}

/// COMPACT_NULLABLE_STRING: `0` for null, otherwise as [`encode_compact_string`].
pub fn encode_compact_nullable_string<W: BufMut>(buffer: &mut W, s: Option<&str>) -> Result<()> {
    match s {
        Some(s) => encode_compact_string(buffer, s),
        None => {
            encode_unsigned_varint(buffer, 0);
            Ok(())
        }
    }
}

/// COMPACT_BYTES: varint(len + 1) followed by the raw bytes.
pub fn encode_compact_bytes<W: BufMut>(buffer: &mut W, b: &[u8]) -> Result<()> {
    encode_unsigned_varint(buffer, checked_compact_len(b.len())?);
    buffer.put_slice(b);
    Ok(())
}

/// COMPACT_NULLABLE_BYTES: `0` for null.
pub fn encode_compact_nullable_bytes<W: BufMut>(buffer: &mut W, b: Option<&[u8]>) -> Result<()> {
    match b {
        Some(b) => encode_compact_bytes(buffer, b),
        None => {
            encode_unsigned_varint(buffer, 0);
            Ok(())
        }
    }
}

/// Write a non-nullable string in the selected regime.
pub fn encode_string<W: BufMut>(buffer: &mut W, s: &str, compact: bool) -> Result<()> {
    if compact {
        encode_compact_string(buffer, s)
    } else {
        s.encode(buffer)
    }
}

/// Write a nullable string in the selected regime.
pub fn encode_nullable_string<W: BufMut>(
    buffer: &mut W,
    s: Option<&str>,
    compact: bool,
) -> Result<()> {
    if compact {
        encode_compact_nullable_string(buffer, s)
    } else {
        s.encode(buffer)
    }
}

/// Write a non-nullable byte array in the selected regime.
pub fn encode_bytes<W: BufMut>(buffer: &mut W, b: &[u8], compact: bool) -> Result<()> {
    if compact {
        encode_compact_bytes(buffer, b)
    } else {
        b.encode(buffer)
    }
}

/// Write a nullable byte array in the selected regime.
pub fn encode_nullable_bytes<W: BufMut>(
    buffer: &mut W,
    b: Option<&[u8]>,
    compact: bool,
) -> Result<()> {
    if compact {
        encode_compact_nullable_bytes(buffer, b)
    } else {
        b.encode(buffer)
    }
}

/// Encode empty tagged fields (used at end of flexible-format messages).
/// An empty tagged field section is just a single 0 byte (varint for 0 fields).
pub fn encode_empty_tagged_fields<W: BufMut>(buffer: &mut W) {
    buffer.put_u8(0);
}
