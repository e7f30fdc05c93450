//! Validation and discovery of the resources a task refers to.
//!
//! A task must never be submitted against a cluster or target that was not
//! confirmed to exist at submission time, and failover candidates are always
//! discovered fresh via label selectors rather than cached.

use k8s_openapi::api::apps::v1::Deployment;
use kube::ResourceExt;

use crate::crd::DbCluster;
use crate::error::{Error, Result};
use crate::labels;
use crate::store::ResourceStore;

/// Resolves cluster and target names against the store.
pub struct TargetResolver<C, D> {
    clusters: C,
    deployments: D,
}

impl<C, D> TargetResolver<C, D>
where
    C: ResourceStore<DbCluster>,
    D: ResourceStore<Deployment>,
{
    /// Resolver over a cluster store and a deployment store, both bound to
    /// the same namespace.
    pub fn new(clusters: C, deployments: D) -> Self {
        Self {
            clusters,
            deployments,
        }
    }

    /// Confirm a cluster exists. Absence is the user-facing
    /// [`Error::ClusterNotFound`]; other failures propagate verbatim.
    pub async fn validate_cluster(&self, name: &str) -> Result<DbCluster> {
        self.clusters
            .get(name)
            .await?
            .ok_or_else(|| Error::ClusterNotFound(name.to_string()))
    }

    /// Confirm an explicitly named failover target exists.
    pub async fn validate_target(&self, name: &str) -> Result<Deployment> {
        self.deployments
            .get(name)
            .await?
            .ok_or_else(|| Error::TargetNotFound(name.to_string()))
    }

    /// Names of the failover-eligible deployments of one cluster: those
    /// labeled as replicas and as members of the cluster. Zero candidates is
    /// a successful, empty answer; the caller decides whether that is
    /// actionable.
    pub async fn failover_candidates(&self, cluster: &str) -> Result<Vec<String>> {
        let selector = labels::candidate_selector(cluster);
        let deployments = self.deployments.list(&selector).await?;
        tracing::debug!(
            cluster = %cluster,
            candidates = deployments.len(),
            "queried failover candidates"
        );
        Ok(deployments.iter().map(ResourceExt::name_any).collect())
    }
}
