//! The message catalog.
//!
//! One module per broker API, each holding the request and the response
//! type. Every type implements [`crate::protocol::ProtocolBody`].
//!
//! | API (key) | versions | flexible from |
//! |---|---|---|
//! | OffsetCommit (8) | 0-7 | never |
//! | OffsetFetch (9) | 0-7 | 6 |
//! | FindCoordinator (10) | 0-3 | 3 |
//! | Heartbeat (12) | 0-4 | 4 |
//! | LeaveGroup (13) | 0-3 | never |
//! | ApiVersions (18) | 0-3 | 3 |
//! | AddPartitionsToTxn (24) | 0-2 | never |
//! | DescribeAcls (29) | 0-1 | never |
//! | CreateAcls (30) | 0-1 | never |
//! | DeleteAcls (31) | 0-1 | never |

mod acl;
mod add_partitions_to_txn;
mod api_versions;
mod create_acls;
mod delete_acls;
mod describe_acls;
mod find_coordinator;
mod heartbeat;
mod leave_group;
mod offset_commit;
mod offset_fetch;

use std::time::Duration;

pub use acl::*;
pub use add_partitions_to_txn::*;
pub use api_versions::*;
pub use create_acls::*;
pub use delete_acls::*;
pub use describe_acls::*;
pub use find_coordinator::*;
pub use heartbeat::*;
pub use leave_group::*;
pub use offset_commit::*;
pub use offset_fetch::*;

/// Throttle field as a duration; negative values read as zero.
#[inline]
pub(crate) fn throttle_duration(throttle_time_ms: i32) -> Duration {
    Duration::from_millis(throttle_time_ms.max(0) as u64)
}
