//! DbCluster custom resource definition.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// DbCluster is the schema for the dbclusters API.
///
/// A DbCluster represents a managed database cluster: one primary plus zero
/// or more replica deployments. This core only ever reads DbCluster objects,
/// to confirm a task's target cluster exists before the task is admitted;
/// the cluster lifecycle itself is driven elsewhere.
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "dbq.io",
    version = "v1",
    kind = "DbCluster",
    plural = "dbclusters",
    shortname = "dbc",
    namespaced,
    printcolumn = r#"{"name":"Replicas", "type":"integer", "jsonPath":".spec.replicas"}"#,
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct DbClusterSpec {
    /// Number of replica deployments backing the cluster.
    #[serde(default = "default_replicas")]
    pub replicas: i32,

    /// Database image to run.
    #[serde(default = "default_image")]
    pub image: String,
}

fn default_replicas() -> i32 {
    1
}

fn default_image() -> String {
    "dbq/postgres:latest".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::CustomResourceExt;

    #[test]
    fn definition_name_includes_group() {
        let crd = DbCluster::crd();
        assert_eq!(crd.metadata.name.as_deref(), Some("dbclusters.dbq.io"));
        assert_eq!(crd.spec.names.kind, "DbCluster");
    }

    #[test]
    fn spec_defaults() {
        let spec: DbClusterSpec = serde_json::from_str("{}").unwrap();
        assert_eq!(spec.replicas, 1);
        assert_eq!(spec.image, "dbq/postgres:latest");
    }
}
