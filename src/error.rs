//! Crate & protocol level errors.
//!
//! This module provides the two error vocabularies of the codec.
//!
//! # Structural errors
//!
//! [`Error`] is returned when bytes cannot be turned into a message (decode)
//! or a message cannot be turned into bytes (encode). These are never
//! retried by the codec; the caller discards the frame or fixes the message.
//!
//! # Broker error codes
//!
//! [`KafkaCode`] is the closed table of error codes a broker may put inside a
//! successfully decoded response. [`ErrorCode`] wraps it so that codes newer
//! than this build decode to [`ErrorCode::Unrecognized`] instead of failing.

use nom::error::ErrorKind;
use nombytes::NomBytes;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use std::{fmt, result};
use thiserror::Error as ThisError;

pub type Result<T> = result::Result<T, Error>;

/// Structural encode and decode errors.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum Error {
    /// The input ended before a complete value could be read.
    #[error("insufficient data to decode packet, more bytes expected")]
    InsufficientData,

    /// A length or count prefix is negative where only non-negative values
    /// are legal, or exceeds the protocol limits.
    #[error("invalid length prefix")]
    InvalidLength,

    /// A varint ran past the width of its target integer.
    #[error("varint overflows its target width")]
    VarintOverflow,

    /// A string field did not hold valid UTF-8.
    #[error("string field is not valid UTF-8")]
    InvalidUtf8,

    /// Any other parser failure.
    #[error("Parsing error: {0:?}")]
    ParsingError(ErrorKind),

    /// The body parsed cleanly but bytes were left over.
    #[error("invalid length: {0} trailing bytes after message body")]
    TrailingData(usize),

    /// The message's wire version is outside the range its type supports.
    #[error("unsupported version {version} for api key {api_key}")]
    UnsupportedVersion { api_key: i16, version: i16 },

    /// The message cannot be represented at its active version.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// A frame's declared size is larger than the configured limit.
    #[error("frame of {size} bytes exceeds the {max} byte limit")]
    FrameTooLarge { size: usize, max: usize },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether the error was raised while reading bytes.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            Error::InsufficientData
                | Error::InvalidLength
                | Error::VarintOverflow
                | Error::InvalidUtf8
                | Error::ParsingError(_)
                | Error::TrailingData(_)
                | Error::FrameTooLarge { .. }
        )
    }
}

impl From<nom::Err<nom::error::Error<NomBytes>>> for Error {
    fn from(e: nom::Err<nom::error::Error<NomBytes>>) -> Self {
        match e {
            nom::Err::Incomplete(_) => Error::InsufficientData,
            nom::Err::Error(e) | nom::Err::Failure(e) => match e.code {
                ErrorKind::Eof => Error::InsufficientData,
                ErrorKind::LengthValue => Error::InvalidLength,
                ErrorKind::TooLarge => Error::VarintOverflow,
                ErrorKind::Verify => Error::InvalidUtf8,
                other => Error::ParsingError(other),
            },
        }
    }
}

/// Error codes reported by a Kafka broker.
/// See also [Kafka Errors](https://kafka.apache.org/protocol.html#protocol_error_codes)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, FromPrimitive, Default)]
pub enum KafkaCode {
    /// An unexpected server error
    Unknown = -1,
    #[default]
    None = 0,
    OffsetOutOfRange = 1,
    CorruptMessage = 2,
    UnknownTopicOrPartition = 3,
    InvalidFetchSize = 4,
    LeaderNotAvailable = 5,
    NotLeaderForPartition = 6,
    RequestTimedOut = 7,
    BrokerNotAvailable = 8,
    ReplicaNotAvailable = 9,
    MessageSizeTooLarge = 10,
    StaleControllerEpoch = 11,
    OffsetMetadataTooLarge = 12,
    NetworkException = 13,
    GroupLoadInProgress = 14,
    GroupCoordinatorNotAvailable = 15,
    NotCoordinatorForGroup = 16,
    InvalidTopic = 17,
    RecordListTooLarge = 18,
    NotEnoughReplicas = 19,
    NotEnoughReplicasAfterAppend = 20,
    InvalidRequiredAcks = 21,
    IllegalGeneration = 22,
    InconsistentGroupProtocol = 23,
    InvalidGroupId = 24,
    UnknownMemberId = 25,
    InvalidSessionTimeout = 26,
    RebalanceInProgress = 27,
    InvalidCommitOffsetSize = 28,
    TopicAuthorizationFailed = 29,
    GroupAuthorizationFailed = 30,
    ClusterAuthorizationFailed = 31,
    InvalidTimestamp = 32,
    UnsupportedSaslMechanism = 33,
    IllegalSaslState = 34,
    UnsupportedVersion = 35,
    TopicAlreadyExists = 36,
    InvalidPartitions = 37,
    InvalidReplicationFactor = 38,
    InvalidReplicaAssignment = 39,
    InvalidConfig = 40,
    NotController = 41,
    InvalidRequest = 42,
    UnsupportedForMessageFormat = 43,
    PolicyViolation = 44,
    OutOfOrderSequenceNumber = 45,
    DuplicateSequenceNumber = 46,
    InvalidProducerEpoch = 47,
    InvalidTxnState = 48,
    InvalidProducerIdMapping = 49,
    InvalidTransactionTimeout = 50,
    ConcurrentTransactions = 51,
    TransactionCoordinatorFenced = 52,
    TransactionalIdAuthorizationFailed = 53,
    SecurityDisabled = 54,
    OperationNotAttempted = 55,
    KafkaStorageError = 56,
    LogDirNotFound = 57,
    SaslAuthenticationFailed = 58,
    UnknownProducerId = 59,
    ReassignmentInProgress = 60,
    DelegationTokenAuthDisabled = 61,
    DelegationTokenNotFound = 62,
    DelegationTokenOwnerMismatch = 63,
    DelegationTokenRequestNotAllowed = 64,
    DelegationTokenAuthorizationFailed = 65,
    DelegationTokenExpired = 66,
    InvalidPrincipalType = 67,
    NonEmptyGroup = 68,
    GroupIdNotFound = 69,
    FetchSessionIdNotFound = 70,
    InvalidFetchSessionEpoch = 71,
    ListenerNotFound = 72,
    TopicDeletionDisabled = 73,
    FencedLeaderEpoch = 74,
    UnknownLeaderEpoch = 75,
    UnsupportedCompressionType = 76,
    StaleBrokerEpoch = 77,
    OffsetNotAvailable = 78,
    MemberIdRequired = 79,
    PreferredLeaderNotAvailable = 80,
    GroupMaxSizeReached = 81,
    FencedInstanceId = 82,
    EligibleLeadersNotAvailable = 83,
    ElectionNotNeeded = 84,
    NoReassignmentInProgress = 85,
    GroupSubscribedToTopic = 86,
    InvalidRecord = 87,
    UnstableOffsetCommit = 88,
    ThrottlingQuotaExceeded = 89,
    ProducerFenced = 90,
    ResourceNotFound = 91,
    DuplicateResource = 92,
    UnacceptableCredential = 93,
    InconsistentVoterSet = 94,
    InvalidUpdateVersion = 95,
    FeatureUpdateFailed = 96,
    PrincipalDeserializationFailure = 97,
    SnapshotNotFound = 98,
    PositionOutOfRange = 99,
    UnknownTopicId = 100,
    DuplicateBrokerRegistration = 101,
    BrokerIdNotRegistered = 102,
    InconsistentTopicId = 103,
    InconsistentClusterId = 104,
    TransactionalIdNotFound = 105,
    FetchSessionTopicIdError = 106,
    IneligibleReplica = 107,
    NewLeaderElected = 108,
    OffsetMovedToTieredStorage = 109,
    FencedMemberEpoch = 110,
    UnreleasedInstanceId = 111,
    UnsupportedAssignor = 112,
    StaleMemberEpoch = 113,
    MismatchedEndpointType = 114,
    UnsupportedEndpointType = 115,
    UnknownControllerId = 116,
    UnknownSubscriptionId = 117,
    TelemetryTooLarge = 118,
    InvalidRegistration = 119,
}

impl KafkaCode {
    /// Human readable text for the code, as a broker operator would word it.
    pub fn description(self) -> &'static str {
        use KafkaCode::*;
        match self {
            Unknown => "The server experienced an unexpected error when processing the request",
            None => "No error",
            OffsetOutOfRange => "The requested offset is outside the range of offsets maintained by the server",
            CorruptMessage => "The message contents does not match its CRC",
            UnknownTopicOrPartition => "This server does not host this topic-partition",
            InvalidFetchSize => "The requested fetch size is invalid",
            LeaderNotAvailable => "There is no leader for this topic-partition as we are in the middle of a leadership election",
            NotLeaderForPartition => "This server is not the leader for that topic-partition",
            RequestTimedOut => "The request timed out",
            BrokerNotAvailable => "The broker is not available",
            ReplicaNotAvailable => "The replica is not available for the requested topic-partition",
            MessageSizeTooLarge => "The request included a message larger than the max message size the server will accept",
            StaleControllerEpoch => "The controller moved to another broker",
            OffsetMetadataTooLarge => "The metadata field of the offset request was too large",
            NetworkException => "The server disconnected before a response was received",
            GroupLoadInProgress => "The coordinator is loading and hence can't process requests",
            GroupCoordinatorNotAvailable => "The coordinator is not available",
            NotCoordinatorForGroup => "This is not the correct coordinator",
            InvalidTopic => "The request attempted to perform an operation on an invalid topic",
            RecordListTooLarge => "The request included message batch larger than the configured segment size on the server",
            NotEnoughReplicas => "Messages are rejected since there are fewer in-sync replicas than required",
            NotEnoughReplicasAfterAppend => "Messages are written to the log, but to fewer in-sync replicas than required",
            InvalidRequiredAcks => "Produce request specified an invalid value for required acks",
            IllegalGeneration => "Specified group generation id is not valid",
            InconsistentGroupProtocol => "The group member's supported protocols are incompatible with those of existing members",
            InvalidGroupId => "The configured groupId is invalid",
            UnknownMemberId => "The coordinator is not aware of this member",
            InvalidSessionTimeout => "The session timeout is not within the range allowed by the broker",
            RebalanceInProgress => "The group is rebalancing, so a rejoin is needed",
            InvalidCommitOffsetSize => "The committing offset data size is not valid",
            TopicAuthorizationFailed => "Topic authorization failed",
            GroupAuthorizationFailed => "Group authorization failed",
            ClusterAuthorizationFailed => "Cluster authorization failed",
            InvalidTimestamp => "The timestamp of the message is out of acceptable range",
            UnsupportedSaslMechanism => "The broker does not support the requested SASL mechanism",
            IllegalSaslState => "Request is not valid given the current SASL state",
            UnsupportedVersion => "The version of API is not supported",
            TopicAlreadyExists => "Topic with this name already exists",
            InvalidPartitions => "Number of partitions is below 1",
            InvalidReplicationFactor => "Replication factor is below 1 or larger than the number of available brokers",
            InvalidReplicaAssignment => "Replica assignment is invalid",
            InvalidConfig => "Configuration is invalid",
            NotController => "This is not the correct controller for this cluster",
            InvalidRequest => "This most likely occurs because of a request being malformed by the client library or the message was sent to an incompatible broker",
            UnsupportedForMessageFormat => "The message format version on the broker does not support the request",
            PolicyViolation => "Request parameters do not satisfy the configured policy",
            OutOfOrderSequenceNumber => "The broker received an out of order sequence number",
            DuplicateSequenceNumber => "The broker received a duplicate sequence number",
            InvalidProducerEpoch => "Producer attempted to produce with an old epoch",
            InvalidTxnState => "The producer attempted a transactional operation in an invalid state",
            InvalidProducerIdMapping => "The producer attempted to use a producer id which is not currently assigned to its transactional id",
            InvalidTransactionTimeout => "The transaction timeout is larger than the maximum value allowed by the broker",
            ConcurrentTransactions => "The producer attempted to update a transaction while another concurrent operation on the same transaction was ongoing",
            TransactionCoordinatorFenced => "Indicates that the transaction coordinator sending a WriteTxnMarker is no longer the current coordinator for a given producer",
            TransactionalIdAuthorizationFailed => "Transactional Id authorization failed",
            SecurityDisabled => "Security features are disabled",
            OperationNotAttempted => "The broker did not attempt to execute this operation",
            KafkaStorageError => "Disk error when trying to access log file on the disk",
            LogDirNotFound => "The user-specified log directory is not found in the broker config",
            SaslAuthenticationFailed => "SASL Authentication failed",
            UnknownProducerId => "This exception is raised by the broker if it could not locate the producer metadata associated with the producerId in question",
            ReassignmentInProgress => "A partition reassignment is in progress",
            DelegationTokenAuthDisabled => "Delegation Token feature is not enabled",
            DelegationTokenNotFound => "Delegation Token is not found on server",
            DelegationTokenOwnerMismatch => "Specified Principal is not valid Owner/Renewer",
            DelegationTokenRequestNotAllowed => "Delegation Token requests are not allowed on PLAINTEXT/1-way SSL channels and on delegation token authenticated channels",
            DelegationTokenAuthorizationFailed => "Delegation Token authorization failed",
            DelegationTokenExpired => "Delegation Token is expired",
            InvalidPrincipalType => "Supplied principalType is not supported",
            NonEmptyGroup => "The group is not empty",
            GroupIdNotFound => "The group id does not exist",
            FetchSessionIdNotFound => "The fetch session ID was not found",
            InvalidFetchSessionEpoch => "The fetch session epoch is invalid",
            ListenerNotFound => "There is no listener on the leader broker that matches the listener on which metadata request was processed",
            TopicDeletionDisabled => "Topic deletion is disabled",
            FencedLeaderEpoch => "The leader epoch in the request is older than the epoch on the broker",
            UnknownLeaderEpoch => "The leader epoch in the request is newer than the epoch on the broker",
            UnsupportedCompressionType => "The requesting client does not support the compression type of given partition",
            StaleBrokerEpoch => "Broker epoch has changed",
            OffsetNotAvailable => "The leader high watermark has not caught up from a recent leader election so the offsets cannot be guaranteed to be monotonically increasing",
            MemberIdRequired => "The group member needs to have a valid member id before actually entering a consumer group",
            PreferredLeaderNotAvailable => "The preferred leader was not available",
            GroupMaxSizeReached => "The consumer group has reached its max size",
            FencedInstanceId => "The broker rejected this static consumer since another consumer with the same group.instance.id has registered with a different member.id",
            EligibleLeadersNotAvailable => "Eligible topic partition leaders are not available",
            ElectionNotNeeded => "Leader election not needed for topic partition",
            NoReassignmentInProgress => "No partition reassignment is in progress",
            GroupSubscribedToTopic => "Deleting offsets of a topic is forbidden while the consumer group is actively subscribed to it",
            InvalidRecord => "This record has failed the validation on broker and hence will be rejected",
            UnstableOffsetCommit => "There are unstable offsets that need to be cleared",
            ThrottlingQuotaExceeded => "The throttling quota has been exceeded",
            ProducerFenced => "There is a newer producer with the same transactionalId which fences the current one",
            ResourceNotFound => "A request illegally referred to a resource that does not exist",
            DuplicateResource => "A request illegally referred to the same resource twice",
            UnacceptableCredential => "Requested credential would not meet criteria for acceptability",
            InconsistentVoterSet => "Indicates that the either the sender or recipient of a voter-only request is not one of the expected voters",
            InvalidUpdateVersion => "The given update version was invalid",
            FeatureUpdateFailed => "Unable to update finalized features due to an unexpected server error",
            PrincipalDeserializationFailure => "Request principal deserialization failed during forwarding",
            SnapshotNotFound => "Requested snapshot was not found",
            PositionOutOfRange => "Requested position is not greater than or equal to zero, and less than the size of the snapshot",
            UnknownTopicId => "This server does not host this topic ID",
            DuplicateBrokerRegistration => "This broker ID is already in use",
            BrokerIdNotRegistered => "The given broker ID was not registered",
            InconsistentTopicId => "The log's topic ID did not match the topic ID in the request",
            InconsistentClusterId => "The clusterId in the request does not match that found on the server",
            TransactionalIdNotFound => "The transactionalId could not be found",
            FetchSessionTopicIdError => "The fetch session encountered inconsistent topic ID usage",
            IneligibleReplica => "The new ISR contains at least one ineligible replica",
            NewLeaderElected => "The AlterPartition request successfully updated the partition state but the leader has changed",
            OffsetMovedToTieredStorage => "The requested offset is moved to tiered storage",
            FencedMemberEpoch => "The member epoch is fenced by the group coordinator",
            UnreleasedInstanceId => "The instance ID is still used by another member in the consumer group",
            UnsupportedAssignor => "The assignor or its version range is not supported by the consumer group",
            StaleMemberEpoch => "The member epoch is stale",
            MismatchedEndpointType => "The request was sent to an endpoint of the wrong type",
            UnsupportedEndpointType => "This endpoint type is not supported yet",
            UnknownControllerId => "This controller ID is not known",
            UnknownSubscriptionId => "Client sent a push telemetry request with an invalid or outdated subscription ID",
            TelemetryTooLarge => "Client sent a push telemetry request larger than the maximum size the broker will accept",
            InvalidRegistration => "The controller has considered the broker registration to be invalid",
        }
    }
}

impl fmt::Display for KafkaCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "kafka server: {}", self.description())
    }
}

/// A broker error code as carried on the wire.
///
/// Decoding never fails on an error code: values this build does not know
/// are kept verbatim in [`ErrorCode::Unrecognized`] and written back unchanged.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Known(KafkaCode),
    Unrecognized(i16),
}

impl ErrorCode {
    /// The "no error" code.
    pub const NONE: ErrorCode = ErrorCode::Known(KafkaCode::None);

    /// Map a raw wire value onto the table.
    pub fn from_wire(code: i16) -> Self {
        match KafkaCode::from_i16(code) {
            Some(known) => ErrorCode::Known(known),
            None => ErrorCode::Unrecognized(code),
        }
    }

    /// The raw wire value.
    pub fn to_wire(self) -> i16 {
        match self {
            ErrorCode::Known(code) => code as i16,
            ErrorCode::Unrecognized(code) => code,
        }
    }

    /// `true` for [`KafkaCode::None`].
    pub fn is_ok(self) -> bool {
        self == Self::NONE
    }

    /// The known kind, if any.
    pub fn kind(self) -> Option<KafkaCode> {
        match self {
            ErrorCode::Known(code) => Some(code),
            ErrorCode::Unrecognized(_) => None,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ErrorCode::Known(code) => code.description(),
            ErrorCode::Unrecognized(_) => "Unrecognized error code",
        }
    }
}

impl Default for ErrorCode {
    fn default() -> Self {
        Self::NONE
    }
}

impl From<KafkaCode> for ErrorCode {
    fn from(code: KafkaCode) -> Self {
        ErrorCode::Known(code)
    }
}

impl From<i16> for ErrorCode {
    fn from(code: i16) -> Self {
        ErrorCode::from_wire(code)
    }
}

impl From<ErrorCode> for i16 {
    fn from(code: ErrorCode) -> Self {
        code.to_wire()
    }
}

impl PartialEq<KafkaCode> for ErrorCode {
    fn eq(&self, other: &KafkaCode) -> bool {
        *self == ErrorCode::Known(*other)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Known(code) => code.fmt(f),
            ErrorCode::Unrecognized(code) => write!(f, "kafka server: unrecognized error code {code}"),
        }
    }
}
