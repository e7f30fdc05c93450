//! Custom resource definitions for the DBQ task queue.
//!
//! - [`DbCluster`]: a managed database cluster, the unit a task is scoped to
//! - [`DbTask`]: a durable request for an asynchronous operation against a
//!   cluster, consumed by the background controller

mod cluster;
mod task;

pub use cluster::{DbCluster, DbClusterSpec};
pub use task::{DbTask, DbTaskSpec, DbTaskStatus, TaskKind, TaskState};

/// API group for all DBQ custom resources.
pub const API_GROUP: &str = "dbq.io";
