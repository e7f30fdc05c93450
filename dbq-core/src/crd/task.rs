//! DbTask custom resource definition.

use std::fmt;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// DbTask is the schema for the dbtasks API.
///
/// A DbTask is an immutable intent: "perform this operation against that
/// cluster". The submitting caller creates it and never touches it again;
/// the background controller is the only writer of the status field and
/// marks the task `Processed` once the operation has been carried out.
///
/// Task names are deterministic (`<cluster>-<kind>`, see
/// [`DbTask::intent_name`]), so a second submission for the same cluster and
/// operation collides at the API server and surfaces as an already-exists
/// conflict rather than a duplicate task.
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "dbq.io",
    version = "v1",
    kind = "DbTask",
    plural = "dbtasks",
    namespaced,
    status = "DbTaskStatus",
    printcolumn = r#"{"name":"Type", "type":"string", "jsonPath":".spec.taskType"}"#,
    printcolumn = r#"{"name":"State", "type":"string", "jsonPath":".status.state"}"#,
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct DbTaskSpec {
    /// Which operation is being requested.
    pub task_type: TaskKind,

    /// Operation-specific payload. For failover and backup this is the
    /// target cluster name.
    #[serde(default)]
    pub parameters: String,
}

/// Status written back by the background controller.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DbTaskStatus {
    /// Current state of the task.
    pub state: TaskState,
}

/// Operations a DbTask can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Promote a replica to primary.
    Failover,
    /// Take a backup of the cluster.
    Backup,
}

impl TaskKind {
    /// Lowercase form used in task names and selectors.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Failover => "failover",
            TaskKind::Backup => "backup",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a task.
///
/// Monotonic: a task that has reached `Processed` never goes back to
/// `Submitted`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum TaskState {
    /// Created by a caller, not yet acted on.
    #[default]
    Submitted,
    /// The background controller has completed the operation.
    Processed,
}

impl DbTask {
    /// Deterministic task name for a cluster and operation kind.
    ///
    /// At most one task per cluster and kind can be pending at a time; the
    /// API server's create-uniqueness enforces it through this name.
    pub fn intent_name(cluster: &str, kind: TaskKind) -> String {
        format!("{}-{}", cluster, kind)
    }

    /// Whether the background controller has marked this task processed.
    pub fn is_processed(&self) -> bool {
        self.status
            .as_ref()
            .map(|s| s.state == TaskState::Processed)
            .unwrap_or(false)
    }
}
