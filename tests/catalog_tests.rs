//! Catalog-wide encode/decode tests.
//!
//! Every request and response type is built with values for each field its
//! wire version carries, encoded, and decoded again at that version. The
//! decoded value must equal the original, the encode must raise no
//! diagnostics, and every strict prefix of the encoding must fail to decode.
//!
//! # Running Tests
//!
//! ```sh
//! cargo test --test catalog_tests
//! ```

use std::fmt::Debug;

use kafka_codec::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

/// Encode, decode, and check every truncation of `message`.
fn check_round_trip<M>(message: M)
where
    M: ProtocolBody + PartialEq + Debug,
{
    let version = message.version();
    let encoded = encode_to_bytes(&message).unwrap();
    assert!(
        encoded.diagnostics.is_empty(),
        "{:?} v{} raised {:?}",
        M::API_KEY,
        version,
        encoded.diagnostics
    );

    let decoded: M = decode_from_bytes(encoded.bytes.clone(), version).unwrap();
    assert_eq!(decoded, message, "{:?} v{}", M::API_KEY, version);

    for cut in 0..encoded.bytes.len() {
        let result = decode_from_bytes::<M>(encoded.bytes.slice(..cut), version);
        assert!(
            result.is_err(),
            "{:?} v{} decoded from {} of {} bytes",
            M::API_KEY,
            version,
            cut,
            encoded.bytes.len()
        );
    }
}

fn all_versions<M: ProtocolBody>() -> impl Iterator<Item = i16> {
    M::MIN_VERSION..=M::MAX_VERSION
}

fn tagged(version: i16, flexible_from: i16) -> TaggedFields {
    let mut fields = TaggedFields::new();
    if version >= flexible_from {
        fields.insert(7, vec![0xCA, 0xFE]);
    }
    fields
}

// ============================================================================
// Group APIs
// ============================================================================

fn offset_commit_request(version: i16) -> OffsetCommitRequest {
    let mut request = OffsetCommitRequest {
        version,
        group_id: "payments".to_string(),
        ..Default::default()
    };
    if version >= 1 {
        request.generation_id = 12;
        request.member_id = "consumer-1".to_string();
    }
    if (2..=4).contains(&version) {
        request.retention_time_ms = 86_400_000;
    }
    if version >= 7 {
        request.group_instance_id = Some("instance-a".to_string());
    }

    let timestamp = if version == 1 { 1_700_000_000_000 } else { RECEIVE_TIME };
    let epoch = if version >= 6 { 4 } else { NO_LEADER_EPOCH };
    request.add_block_with_leader_epoch("orders", 0, 100, epoch, timestamp, "m0");
    request.add_block_with_leader_epoch("orders", 3, 130, epoch, timestamp, "");
    request.add_block_with_leader_epoch("audit", 1, 7, epoch, timestamp, "m1");
    request
}

#[test]
fn test_offset_commit_round_trip() {
    for version in all_versions::<OffsetCommitRequest>() {
        check_round_trip(offset_commit_request(version));

        let mut response = OffsetCommitResponse {
            version,
            throttle_time_ms: if version >= 3 { 20 } else { 0 },
            ..Default::default()
        };
        response.add_error("orders", 0, KafkaCode::None);
        response.add_error("orders", 3, KafkaCode::OffsetMetadataTooLarge);
        response.add_error("audit", 1, KafkaCode::IllegalGeneration);
        check_round_trip(response);
    }
}

fn offset_fetch_request(version: i16) -> OffsetFetchRequest {
    let mut request = OffsetFetchRequest {
        version,
        group_id: "payments".to_string(),
        require_stable: version >= 7,
        tagged_fields: tagged(version, 6),
        ..Default::default()
    };
    request.add_partition("orders", 0);
    request.add_partition("orders", 1);
    request.add_partition("audit", 5);
    request
}

#[test]
fn test_offset_fetch_round_trip() {
    for version in all_versions::<OffsetFetchRequest>() {
        check_round_trip(offset_fetch_request(version));

        if version >= 2 {
            // every topic of the group
            check_round_trip(OffsetFetchRequest {
                version,
                group_id: "payments".to_string(),
                ..Default::default()
            });
        }

        let mut response = OffsetFetchResponse {
            version,
            throttle_time_ms: if version >= 3 { 5 } else { 0 },
            error_code: if version >= 2 {
                KafkaCode::GroupLoadInProgress.into()
            } else {
                ErrorCode::NONE
            },
            tagged_fields: tagged(version, 6),
            ..Default::default()
        };
        response.add_block(
            "orders",
            0,
            OffsetFetchResponseBlock {
                offset: 100,
                leader_epoch: if version >= 5 { 2 } else { NO_LEADER_EPOCH },
                metadata: Some("m0".to_string()),
                error_code: ErrorCode::NONE,
            },
        );
        response.add_block(
            "orders",
            1,
            OffsetFetchResponseBlock {
                metadata: None,
                error_code: KafkaCode::UnknownTopicOrPartition.into(),
                ..Default::default()
            },
        );
        check_round_trip(response);
    }
}

#[test]
fn test_find_coordinator_round_trip() {
    for version in all_versions::<FindCoordinatorRequest>() {
        check_round_trip(FindCoordinatorRequest {
            version,
            coordinator_key: "txn-1".to_string(),
            key_type: if version >= 1 {
                CoordinatorType::Transaction
            } else {
                CoordinatorType::Group
            },
            tagged_fields: tagged(version, 3),
        });

        check_round_trip(FindCoordinatorResponse {
            version,
            throttle_time_ms: if version >= 1 { 3 } else { 0 },
            error_code: ErrorCode::NONE,
            error_message: (version >= 1).then(|| "ok".to_string()),
            node_id: 2,
            host: "broker-2.internal".to_string(),
            port: 9093,
            tagged_fields: tagged(version, 3),
        });
    }
}

#[test]
fn test_heartbeat_round_trip() {
    for version in all_versions::<HeartbeatRequest>() {
        check_round_trip(HeartbeatRequest {
            version,
            group_id: "payments".to_string(),
            generation_id: 9,
            member_id: "consumer-1".to_string(),
            group_instance_id: (version >= 3).then(|| "instance-a".to_string()),
            tagged_fields: tagged(version, 4),
        });

        check_round_trip(HeartbeatResponse {
            version,
            throttle_time_ms: if version >= 1 { 1 } else { 0 },
            error_code: KafkaCode::RebalanceInProgress.into(),
            tagged_fields: tagged(version, 4),
        });
    }
}

#[test]
fn test_leave_group_round_trip() {
    for version in all_versions::<LeaveGroupRequest>() {
        let request = if version >= 3 {
            LeaveGroupRequest {
                version,
                group_id: "payments".to_string(),
                members: vec![
                    MemberIdentity {
                        member_id: "consumer-1".to_string(),
                        group_instance_id: None,
                    },
                    MemberIdentity {
                        member_id: "consumer-2".to_string(),
                        group_instance_id: Some("instance-b".to_string()),
                    },
                ],
                ..Default::default()
            }
        } else {
            LeaveGroupRequest {
                version,
                group_id: "payments".to_string(),
                member_id: "consumer-1".to_string(),
                ..Default::default()
            }
        };
        check_round_trip(request);

        check_round_trip(LeaveGroupResponse {
            version,
            throttle_time_ms: if version >= 1 { 11 } else { 0 },
            error_code: ErrorCode::NONE,
            members: if version >= 3 {
                vec![MemberResponse {
                    member_id: "consumer-2".to_string(),
                    group_instance_id: Some("instance-b".to_string()),
                    error_code: KafkaCode::UnknownMemberId.into(),
                }]
            } else {
                Vec::new()
            },
        });
    }
}

// ============================================================================
// ApiVersions / transactions
// ============================================================================

#[test]
fn test_api_versions_round_trip() {
    for version in all_versions::<ApiVersionsRequest>() {
        let mut request = ApiVersionsRequest::new(version);
        request.tagged_fields = tagged(version, 3);
        check_round_trip(request);

        check_round_trip(ApiVersionsResponse {
            version,
            error_code: ErrorCode::NONE,
            api_keys: vec![
                ApiVersionsResponseKey {
                    api_key: ApiKey::OffsetCommit.into(),
                    min_version: 0,
                    max_version: 8,
                },
                ApiVersionsResponseKey {
                    api_key: ApiKey::Heartbeat.into(),
                    min_version: 0,
                    max_version: 4,
                },
            ],
            throttle_time_ms: if version >= 1 { 2 } else { 0 },
            tagged_fields: tagged(version, 3),
        });
    }
}

#[test]
fn test_add_partitions_to_txn_round_trip() {
    for version in all_versions::<AddPartitionsToTxnRequest>() {
        let mut request = AddPartitionsToTxnRequest {
            version,
            transactional_id: "txn-1".to_string(),
            producer_id: 4_000_000_001,
            producer_epoch: 3,
            ..Default::default()
        };
        request.add_partition("orders", 0);
        request.add_partition("orders", 2);
        request.add_partition("audit", 1);
        check_round_trip(request);

        let mut response = AddPartitionsToTxnResponse {
            version,
            throttle_time_ms: 40,
            ..Default::default()
        };
        response.add_error("orders", 0, ErrorCode::NONE);
        response.add_error("orders", 2, KafkaCode::ConcurrentTransactions.into());
        response.add_error("audit", 1, ErrorCode::NONE);
        check_round_trip(response);
    }
}

// ============================================================================
// ACL APIs
// ============================================================================

fn resource(version: i16) -> Resource {
    Resource {
        resource_type: AclResourceType::Topic,
        resource_name: "orders".to_string(),
        pattern_type: if version >= 1 {
            AclResourcePatternType::Prefixed
        } else {
            AclResourcePatternType::Literal
        },
    }
}

fn acl() -> Acl {
    Acl {
        principal: "User:alice".to_string(),
        host: "*".to_string(),
        operation: AclOperation::Write,
        permission_type: AclPermissionType::Allow,
    }
}

fn filter(version: i16) -> AclFilter {
    AclFilter {
        resource_type: AclResourceType::Topic,
        resource_name: Some("orders".to_string()),
        pattern_type_filter: if version >= 1 {
            AclResourcePatternType::Match
        } else {
            AclResourcePatternType::Literal
        },
        principal: None,
        host: Some("*".to_string()),
        operation: AclOperation::Any,
        permission_type: AclPermissionType::Any,
    }
}

#[test]
fn test_create_acls_round_trip() {
    for version in all_versions::<CreateAclsRequest>() {
        let mut request = CreateAclsRequest {
            version,
            ..Default::default()
        };
        request.add_creation(resource(version), acl());
        request.add_creation(
            Resource::new(AclResourceType::Group, "payments"),
            Acl {
                operation: AclOperation::Read,
                ..acl()
            },
        );
        check_round_trip(request);

        check_round_trip(CreateAclsResponse {
            version,
            throttle_time_ms: 8,
            results: vec![
                AclCreationResult::default(),
                AclCreationResult {
                    error_code: KafkaCode::SecurityDisabled.into(),
                    error_message: Some("no authorizer".to_string()),
                },
            ],
        });
    }
}

#[test]
fn test_describe_acls_round_trip() {
    for version in all_versions::<DescribeAclsRequest>() {
        check_round_trip(DescribeAclsRequest {
            version,
            filter: filter(version),
        });

        check_round_trip(DescribeAclsResponse {
            version,
            throttle_time_ms: 0,
            error_code: ErrorCode::NONE,
            error_message: None,
            resource_acls: vec![ResourceAcls {
                resource: resource(version),
                acls: vec![acl()],
            }],
        });
    }
}

#[test]
fn test_delete_acls_round_trip() {
    for version in all_versions::<DeleteAclsRequest>() {
        check_round_trip(DeleteAclsRequest {
            version,
            filters: vec![filter(version), AclFilter::default()],
        });

        check_round_trip(DeleteAclsResponse {
            version,
            throttle_time_ms: 1,
            filter_responses: vec![
                FilterResponse {
                    error_code: ErrorCode::NONE,
                    error_message: None,
                    matching_acls: vec![MatchingAcl {
                        error_code: ErrorCode::NONE,
                        error_message: None,
                        resource: resource(version),
                        acl: acl(),
                    }],
                },
                FilterResponse {
                    error_code: KafkaCode::ClusterAuthorizationFailed.into(),
                    error_message: Some("denied".to_string()),
                    matching_acls: Vec::new(),
                },
            ],
        });
    }
}

// ============================================================================
// Runtime dispatch
// ============================================================================

#[test]
fn test_request_dispatch_matches_typed_decode() {
    for version in all_versions::<OffsetCommitRequest>() {
        let typed = offset_commit_request(version);
        let encoded = encode_to_bytes(&typed).unwrap();

        let dispatched = Request::decode(ApiKey::OffsetCommit, version, encoded.bytes).unwrap();
        assert_eq!(dispatched.api_key(), ApiKey::OffsetCommit);
        assert_eq!(dispatched.version(), version);
        assert_eq!(dispatched, Request::from(typed));
    }
}

#[test]
fn test_every_catalog_key_dispatches() {
    let keys = [
        ApiKey::OffsetCommit,
        ApiKey::OffsetFetch,
        ApiKey::FindCoordinator,
        ApiKey::Heartbeat,
        ApiKey::LeaveGroup,
        ApiKey::ApiVersions,
        ApiKey::AddPartitionsToTxn,
        ApiKey::DescribeAcls,
        ApiKey::CreateAcls,
        ApiKey::DeleteAcls,
    ];
    for key in keys {
        let request = Request::empty(key, 0).unwrap();
        let response = Response::empty(key, 0).unwrap();
        assert_eq!(request.api_key(), key);
        assert_eq!(response.api_key(), key);
    }
    assert!(Request::empty(ApiKey::Fetch, 0).is_err());
}
