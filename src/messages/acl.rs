//! Types shared by the ACL APIs (CreateAcls, DescribeAcls, DeleteAcls).
//!
//! Version 1 of all three APIs added the resource pattern type (KIP-290).
//! At version 0 only literal resource names exist, so a non-literal pattern
//! cannot be sent and is reported as dropped.

use bytes::BufMut;
use nom::number::complete::be_i8;
use nombytes::NomBytes;

use crate::diagnostics::Diagnostics;
use crate::encode::{ToByte, encode_as_array};
use crate::error::{ErrorCode, Result};
use crate::parser::{
    ParseResult, bytes_to_string, nullable_string, parse_array, parse_error_code, parse_string,
};
use crate::protocol::ApiKey;
use crate::version::KafkaVersion;

/// Oldest broker for each ACL API wire version.
pub(crate) fn acl_required_version(version: i16) -> KafkaVersion {
    match version {
        1 => KafkaVersion::V2_0_0_0,
        _ => KafkaVersion::V0_11_0_0,
    }
}

macro_rules! acl_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident = $value:literal),* $(,)? }
    ) => {
        $(#[$meta])*
        ///
        /// Values this build does not know are kept in `Other`.
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)*
            Other(i8),
        }

        impl From<i8> for $name {
            fn from(value: i8) -> Self {
                match value {
                    $($value => $name::$variant,)*
                    n => $name::Other(n),
                }
            }
        }

        impl From<$name> for i8 {
            fn from(value: $name) -> Self {
                match value {
                    $($name::$variant => $value,)*
                    $name::Other(n) => n,
                }
            }
        }

        impl ToByte for $name {
            fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
                buffer.put_i8((*self).into());
                Ok(())
            }
        }
    };
}

acl_enum! {
    /// Operation an ACL grants or denies.
    AclOperation {
        #[default]
        Unknown = 0,
        Any = 1,
        All = 2,
        Read = 3,
        Write = 4,
        Create = 5,
        Delete = 6,
        Alter = 7,
        Describe = 8,
        ClusterAction = 9,
        DescribeConfigs = 10,
        AlterConfigs = 11,
        IdempotentWrite = 12,
        CreateTokens = 13,
        DescribeTokens = 14,
    }
}

acl_enum! {
    /// Whether an ACL allows or denies.
    AclPermissionType {
        #[default]
        Unknown = 0,
        Any = 1,
        Deny = 2,
        Allow = 3,
    }
}

acl_enum! {
    /// Kind of resource an ACL applies to.
    AclResourceType {
        #[default]
        Unknown = 0,
        Any = 1,
        Topic = 2,
        Group = 3,
        Cluster = 4,
        TransactionalId = 5,
        DelegationToken = 6,
        User = 7,
    }
}

acl_enum! {
    /// How a resource name is matched.
    AclResourcePatternType {
        Unknown = 0,
        Any = 1,
        Match = 2,
        // Version 0 can only express literal names.
        #[default]
        Literal = 3,
        Prefixed = 4,
    }
}

fn parse_acl_enum<T: From<i8>>(s: NomBytes) -> ParseResult<T> {
    let (s, value) = be_i8(s)?;
    Ok((s, T::from(value)))
}

fn encode_pattern_type<W: BufMut>(
    buffer: &mut W,
    pattern_type: AclResourcePatternType,
    api_key: ApiKey,
    version: i16,
    diagnostics: &mut Diagnostics,
) -> Result<()> {
    if version >= 1 {
        pattern_type.encode(buffer)?;
    } else {
        diagnostics.check(
            pattern_type != AclResourcePatternType::Literal,
            api_key,
            version,
            "resource_pattern_type",
            "only literal patterns before v1",
        );
    }
    Ok(())
}

fn parse_pattern_type(s: NomBytes, version: i16) -> ParseResult<AclResourcePatternType> {
    if version >= 1 {
        parse_acl_enum(s)
    } else {
        Ok((s, AclResourcePatternType::Literal))
    }
}

// ============================================================================
// Resource / Acl
// ============================================================================

/// A resource an ACL is attached to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resource {
    pub resource_type: AclResourceType,
    pub resource_name: String,
    pub pattern_type: AclResourcePatternType,
}

impl Resource {
    pub fn new(resource_type: AclResourceType, resource_name: impl Into<String>) -> Self {
        Self {
            resource_type,
            resource_name: resource_name.into(),
            pattern_type: AclResourcePatternType::Literal,
        }
    }

    pub(crate) fn encode_versioned<W: BufMut>(
        &self,
        buffer: &mut W,
        api_key: ApiKey,
        version: i16,
        diagnostics: &mut Diagnostics,
    ) -> Result<()> {
        self.resource_type.encode(buffer)?;
        self.resource_name.encode(buffer)?;
        encode_pattern_type(buffer, self.pattern_type, api_key, version, diagnostics)
    }
}

pub(crate) fn parse_resource(s: NomBytes, version: i16) -> ParseResult<Resource> {
    let (s, resource_type) = parse_acl_enum(s)?;
    let (s, resource_name) = parse_string(s)?;
    let (s, pattern_type) = parse_pattern_type(s, version)?;

    Ok((
        s,
        Resource {
            resource_type,
            resource_name: bytes_to_string(&resource_name)?,
            pattern_type,
        },
    ))
}

/// One access control entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Acl {
    pub principal: String,
    pub host: String,
    pub operation: AclOperation,
    pub permission_type: AclPermissionType,
}

impl ToByte for Acl {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.principal.encode(buffer)?;
        self.host.encode(buffer)?;
        self.operation.encode(buffer)?;
        self.permission_type.encode(buffer)?;
        Ok(())
    }
}

pub(crate) fn parse_acl(s: NomBytes) -> ParseResult<Acl> {
    let (s, principal) = parse_string(s)?;
    let (s, host) = parse_string(s)?;
    let (s, operation) = parse_acl_enum(s)?;
    let (s, permission_type) = parse_acl_enum(s)?;

    Ok((
        s,
        Acl {
            principal: bytes_to_string(&principal)?,
            host: bytes_to_string(&host)?,
            operation,
            permission_type,
        },
    ))
}

/// A resource together with every ACL bound to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceAcls {
    pub resource: Resource,
    pub acls: Vec<Acl>,
}

impl ResourceAcls {
    pub(crate) fn encode_versioned<W: BufMut>(
        &self,
        buffer: &mut W,
        api_key: ApiKey,
        version: i16,
        diagnostics: &mut Diagnostics,
    ) -> Result<()> {
        self.resource
            .encode_versioned(buffer, api_key, version, diagnostics)?;
        encode_as_array(buffer, &self.acls, |buffer, acl| acl.encode(buffer))
    }
}

pub(crate) fn parse_resource_acls(s: NomBytes, version: i16) -> ParseResult<ResourceAcls> {
    let (s, resource) = parse_resource(s, version)?;
    let (s, acls) = parse_array(parse_acl)(s)?;
    Ok((s, ResourceAcls { resource, acls }))
}

// ============================================================================
// AclFilter
// ============================================================================

/// Selects ACLs to describe or delete. `None` fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AclFilter {
    pub resource_type: AclResourceType,
    pub resource_name: Option<String>,
    pub pattern_type_filter: AclResourcePatternType,
    pub principal: Option<String>,
    pub host: Option<String>,
    pub operation: AclOperation,
    pub permission_type: AclPermissionType,
}

impl AclFilter {
    pub(crate) fn encode_versioned<W: BufMut>(
        &self,
        buffer: &mut W,
        api_key: ApiKey,
        version: i16,
        diagnostics: &mut Diagnostics,
    ) -> Result<()> {
        self.resource_type.encode(buffer)?;
        self.resource_name.as_deref().encode(buffer)?;
        encode_pattern_type(
            buffer,
            self.pattern_type_filter,
            api_key,
            version,
            diagnostics,
        )?;
        self.principal.as_deref().encode(buffer)?;
        self.host.as_deref().encode(buffer)?;
        self.operation.encode(buffer)?;
        self.permission_type.encode(buffer)?;
        Ok(())
    }
}

pub(crate) fn parse_acl_filter(s: NomBytes, version: i16) -> ParseResult<AclFilter> {
    let (s, resource_type) = parse_acl_enum(s)?;
    let (s, resource_name) = nullable_string(false)(s)?;
    let (s, pattern_type_filter) = parse_pattern_type(s, version)?;
    let (s, principal) = nullable_string(false)(s)?;
    let (s, host) = nullable_string(false)(s)?;
    let (s, operation) = parse_acl_enum(s)?;
    let (s, permission_type) = parse_acl_enum(s)?;

    Ok((
        s,
        AclFilter {
            resource_type,
            resource_name,
            pattern_type_filter,
            principal,
            host,
            operation,
            permission_type,
        },
    ))
}

/// Error code and optional message, the per-item result of ACL responses.
pub(crate) fn parse_error_and_message(s: NomBytes) -> ParseResult<(ErrorCode, Option<String>)> {
    let (s, error_code) = parse_error_code(s)?;
    let (s, error_message) = nullable_string(false)(s)?;
    Ok((s, (error_code, error_message)))
}
