//! Centralized protocol constants.
//!
//! # Categories
//!
//! - **Protocol Constants**: wire sizes and limits enforced while decoding
//! - **Sentinel Values**: magic values with a protocol meaning

// =============================================================================
// Protocol Constants (Kafka Wire Protocol)
// =============================================================================

/// Maximum number of elements accepted for any protocol array.
///
/// A count above this is rejected before any element is read, so a hostile
/// length prefix cannot make the decoder pre-allocate unbounded memory.
/// The limit applies to each array on its own: an OffsetFetch response may
/// carry up to this many topics, each with up to this many partitions.
/// Arrays longer than this fail with [`crate::error::Error::InvalidLength`].
pub const MAX_PROTOCOL_ARRAY_SIZE: i32 = 100_000;

/// Default upper bound on a single frame, in bytes (100 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 100 * 1024 * 1024;

/// Size of the length prefix in front of every frame.
pub const FRAME_LENGTH_SIZE: usize = 4;

/// Longest legacy (i16-prefixed) string.
pub const MAX_STRING_SIZE: usize = i16::MAX as usize;

/// Longest unsigned varint, in bytes, for a 32-bit value.
pub const MAX_UNSIGNED_VARINT_LEN: usize = 5;

/// Longest zigzag varint, in bytes, for a 64-bit value.
pub const MAX_VARINT_LEN: usize = 10;

// =============================================================================
// Sentinel Values
// =============================================================================

/// Offset commit timestamp meaning "use the broker's receive time".
pub const RECEIVE_TIME: i64 = -1;

/// Generation id sent by clients that are not part of an active generation.
pub const GROUP_GENERATION_UNDEFINED: i32 = -1;

/// Leader epoch meaning "unknown".
pub const NO_LEADER_EPOCH: i32 = -1;

/// Offset meaning "no committed offset".
pub const INVALID_OFFSET: i64 = -1;

/// Retention time meaning "use the broker default".
pub const DEFAULT_RETENTION_TIME: i64 = -1;
