//! Broker API keys.

use std::fmt;

macro_rules! api_keys {
    ($($name:ident = $value:literal),* $(,)?) => {
        /// API keys for Kafka protocol
        ///
        /// Keys this build does not know are kept as [`ApiKey::Unknown`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ApiKey {
            $($name,)*
            Unknown(i16),
        }

        impl From<i16> for ApiKey {
            fn from(value: i16) -> Self {
                match value {
                    $($value => ApiKey::$name,)*
                    n => ApiKey::Unknown(n),
                }
            }
        }

        impl From<ApiKey> for i16 {
            fn from(key: ApiKey) -> Self {
                match key {
                    $(ApiKey::$name => $value,)*
                    ApiKey::Unknown(n) => n,
                }
            }
        }

        impl ApiKey {
            /// Returns a static string name for this API key.
            ///
            /// For Unknown variants, returns "Unknown" (not the numeric value).
            #[inline]
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(ApiKey::$name => stringify!($name),)*
                    ApiKey::Unknown(_) => "Unknown",
                }
            }

            /// Every key this build knows, in key order.
            pub const ALL: &'static [ApiKey] = &[$(ApiKey::$name),*];
        }
    };
}

api_keys! {
    Produce = 0,
    Fetch = 1,
    ListOffsets = 2,
    Metadata = 3,
    LeaderAndIsr = 4,
    StopReplica = 5,
    UpdateMetadata = 6,
    ControlledShutdown = 7,
    OffsetCommit = 8,
    OffsetFetch = 9,
    FindCoordinator = 10,
    JoinGroup = 11,
    Heartbeat = 12,
    LeaveGroup = 13,
    SyncGroup = 14,
    DescribeGroups = 15,
    ListGroups = 16,
    SaslHandshake = 17,
    ApiVersions = 18,
    CreateTopics = 19,
    DeleteTopics = 20,
    DeleteRecords = 21,
    InitProducerId = 22,
    OffsetForLeaderEpoch = 23,
    AddPartitionsToTxn = 24,
    AddOffsetsToTxn = 25,
    EndTxn = 26,
    WriteTxnMarkers = 27,
    TxnOffsetCommit = 28,
    DescribeAcls = 29,
    CreateAcls = 30,
    DeleteAcls = 31,
    DescribeConfigs = 32,
    AlterConfigs = 33,
    AlterReplicaLogDirs = 34,
    DescribeLogDirs = 35,
    SaslAuthenticate = 36,
    CreatePartitions = 37,
    CreateDelegationToken = 38,
    RenewDelegationToken = 39,
    ExpireDelegationToken = 40,
    DescribeDelegationToken = 41,
    DeleteGroups = 42,
    ElectLeaders = 43,
    IncrementalAlterConfigs = 44,
    AlterPartitionReassignments = 45,
    ListPartitionReassignments = 46,
    OffsetDelete = 47,
    DescribeClientQuotas = 48,
    AlterClientQuotas = 49,
    DescribeUserScramCredentials = 50,
    AlterUserScramCredentials = 51,
    Vote = 52,
    BeginQuorumEpoch = 53,
    EndQuorumEpoch = 54,
    DescribeQuorum = 55,
    AlterPartition = 56,
    UpdateFeatures = 57,
    Envelope = 58,
    FetchSnapshot = 59,
    DescribeCluster = 60,
    DescribeProducers = 61,
    BrokerRegistration = 62,
    BrokerHeartbeat = 63,
    UnregisterBroker = 64,
    DescribeTransactions = 65,
    ListTransactions = 66,
    AllocateProducerIds = 67,
    ConsumerGroupHeartbeat = 68,
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiKey::Unknown(n) => write!(f, "Unknown({})", n),
            key => f.write_str(key.as_str()),
        }
    }
}
