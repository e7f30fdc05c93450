//! Label keys and selectors shared by dispatch and target resolution.
//!
//! Routing between callers and the background controller happens entirely
//! through these labels, so every component must spell them identically.

use crate::crd::TaskKind;

/// Marks a deployment as a replica, i.e. failover-eligible.
pub const REPLICA: &str = "replica";

/// Names the cluster a deployment belongs to.
pub const CLUSTER: &str = "db-cluster";

/// Carries an explicitly requested failover target on a task. Empty when the
/// controller is free to pick any candidate.
pub const TARGET: &str = "target";

/// Names the operation kind on a task, letting the background controller
/// select the tasks it handles.
pub const TASK_TYPE: &str = "task-type";

/// Value of the [`REPLICA`] label on eligible deployments.
pub const REPLICA_TRUE: &str = "true";

/// Selector matching the failover-eligible deployments of one cluster.
pub fn candidate_selector(cluster: &str) -> String {
    format!("{}={},{}={}", REPLICA, REPLICA_TRUE, CLUSTER, cluster)
}

/// Selector matching all tasks of one operation kind, as consumed by the
/// background controller.
pub fn task_kind_selector(kind: TaskKind) -> String {
    format!("{}={}", TASK_TYPE, kind)
}
