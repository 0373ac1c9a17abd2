//! Tagged fields for flexible protocol versions (KIP-482).
//!
//! A tagged-field section is an unsigned varint count followed by that many
//! `(tag: uvarint, size: uvarint, payload)` entries. The section is written
//! after the fixed fields of every flexible message, header and nested record.
//!
//! The catalog models no tagged fields of its own, so top-level messages carry
//! whatever the peer sent in a [`TaggedFields`] and write it back unchanged;
//! nested records skip theirs with [`crate::parser::skip_tagged_fields`].
use bytes::{BufMut, Bytes};
use nom::{InputLength, bytes::complete::take, error::ErrorKind};
use nombytes::NomBytes;

use crate::constants::MAX_PROTOCOL_ARRAY_SIZE;
use crate::diagnostics::Diagnostics;
use crate::encode::{ToByte, encode_unsigned_varint};
use crate::error::{Error, Result};
use crate::parser::{ParseError, ParseResult, parse_unsigned_varint};
use crate::protocol::ApiKey;

/// One `(tag, payload)` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedField {
    pub tag: u32,
    pub data: Bytes,
}

/// The tagged-field section of a flexible message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaggedFields {
    fields: Vec<TaggedField>,
}

impl TaggedFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Add or replace the payload stored under `tag`.
    pub fn insert(&mut self, tag: u32, data: impl Into<Bytes>) {
        let data = data.into();
        match self.fields.iter_mut().find(|f| f.tag == tag) {
            Some(field) => field.data = data,
            None => self.fields.push(TaggedField { tag, data }),
        }
    }

    pub fn get(&self, tag: u32) -> Option<&Bytes> {
        self.fields.iter().find(|f| f.tag == tag).map(|f| &f.data)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaggedField> {
        self.fields.iter()
    }

    /// Write the section when `flexible`. Otherwise any stored entries are
    /// recorded as dropped in `diagnostics`.
    pub fn encode_if<W: BufMut>(
        &self,
        buffer: &mut W,
        flexible: bool,
        diagnostics: &mut Diagnostics,
        api_key: ApiKey,
        version: i16,
    ) -> Result<()> {
        if flexible {
            return self.encode(buffer);
        }
        diagnostics.check(
            !self.is_empty(),
            api_key,
            version,
            "tagged_fields",
            "requires a flexible version",
        );
        Ok(())
    }
}

impl From<Vec<TaggedField>> for TaggedFields {
    fn from(fields: Vec<TaggedField>) -> Self {
        Self { fields }
    }
}

impl ToByte for TaggedFields {
    /// Entries are written in ascending tag order; duplicate tags are an error.
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        let mut sorted: Vec<&TaggedField> = self.fields.iter().collect();
        sorted.sort_by_key(|f| f.tag);
        if let Some(pair) = sorted.windows(2).find(|w| w[0].tag == w[1].tag) {
            return Err(Error::Encoding(format!(
                "duplicate tagged field {}",
                pair[0].tag
            )));
        }

        let count = u32::try_from(sorted.len())
            .map_err(|_| Error::Encoding("too many tagged fields".to_string()))?;
        encode_unsigned_varint(buffer, count);
        for field in sorted {
            let size = u32::try_from(field.data.len()).map_err(|_| {
                Error::Encoding(format!("tagged field {} payload too large", field.tag))
            })?;
            encode_unsigned_varint(buffer, field.tag);
            encode_unsigned_varint(buffer, size);
            buffer.put_slice(&field.data);
        }
        Ok(())
    }
}

/// Parse a tagged-field section, keeping every entry.
///
/// Each payload is bounded by its declared size, so unknown tags never
/// leak into the fields that follow.
pub fn parse_tagged_fields(s: NomBytes) -> ParseResult<TaggedFields> {
    let (mut s, count) = parse_unsigned_varint(s)?;

    // An entry is at least two bytes: tag and size.
    if count > MAX_PROTOCOL_ARRAY_SIZE as u32 {
        return Err(nom::Err::Failure(ParseError::new(s, ErrorKind::LengthValue)));
    }
    if count as usize > s.input_len() / 2 {
        return Err(nom::Err::Error(ParseError::new(s, ErrorKind::Eof)));
    }

    let mut fields = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let (remaining, tag) = parse_unsigned_varint(s)?;
        let (remaining, size) = parse_unsigned_varint(remaining)?;
        let (remaining, data) = take(size as usize)(remaining)?;
        fields.push(TaggedField {
            tag,
            data: data.into_bytes(),
        });
        s = remaining;
    }

    Ok((s, TaggedFields { fields }))
}

/// Parse the section when `flexible`, yield an empty one otherwise.
pub fn parse_tagged_fields_if(flexible: bool, s: NomBytes) -> ParseResult<TaggedFields> {
    if flexible {
        parse_tagged_fields(s)
    } else {
        Ok((s, TaggedFields::default()))
    }
}
