//! Typed access to the Kubernetes object store.
//!
//! [`ResourceStore`] is the seam between this core and the API server: a
//! minimal get/create/delete/list surface where absence is a value, not an
//! error, and a create-time name collision is a distinguishable outcome.
//! Production code uses [`KubeStore`]; tests use [`memory::MemoryStore`].
//!
//! Handles are always constructed from an explicit client and namespace.
//! Nothing here caches store state: every call goes back to the API server,
//! because staleness is the main correctness risk in this design.

use std::fmt::Debug;

use async_trait::async_trait;
use kube::api::{Api, DeleteParams, ListParams, PostParams};
use kube::core::{ClusterResourceScope, NamespaceResourceScope};
use kube::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

pub mod memory;

/// Minimal typed object-store surface.
#[async_trait]
pub trait ResourceStore<K>: Send + Sync {
    /// Fetch an object by name. `Ok(None)` means the object does not exist;
    /// every other failure is an error.
    async fn get(&self, name: &str) -> Result<Option<K>>;

    /// Create an object. Fails with [`Error::AlreadyExists`] if an object of
    /// the same name exists; there is no upsert.
    async fn create(&self, resource: &K) -> Result<()>;

    /// Delete an object by name.
    async fn delete(&self, name: &str) -> Result<()>;

    /// List objects matching a label selector. An empty result is success.
    async fn list(&self, label_selector: &str) -> Result<Vec<K>>;
}

/// [`ResourceStore`] backed by the Kubernetes API server.
#[derive(Clone)]
pub struct KubeStore<K>
where
    K: kube::Resource,
{
    api: Api<K>,
}

impl<K> KubeStore<K>
where
    K: kube::Resource,
    K::DynamicType: Default,
{
    /// Store handle bound to one namespace.
    pub fn namespaced(client: Client, namespace: &str) -> Self
    where
        K: kube::Resource<Scope = NamespaceResourceScope>,
    {
        Self {
            api: Api::namespaced(client, namespace),
        }
    }

    /// Store handle for cluster-scoped resources, e.g. resource definitions.
    pub fn cluster_scoped(client: Client) -> Self
    where
        K: kube::Resource<Scope = ClusterResourceScope>,
    {
        Self {
            api: Api::all(client),
        }
    }

    fn kind() -> String {
        K::kind(&K::DynamicType::default()).into_owned()
    }
}

#[async_trait]
impl<K> ResourceStore<K> for KubeStore<K>
where
    K: kube::Resource + Clone + Serialize + DeserializeOwned + Debug + Send + Sync,
    K::DynamicType: Default,
{
    async fn get(&self, name: &str) -> Result<Option<K>> {
        Ok(self.api.get_opt(name).await?)
    }

    async fn create(&self, resource: &K) -> Result<()> {
        match self.api.create(&PostParams::default(), resource).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(ae)) if ae.code == 409 => Err(Error::AlreadyExists {
                kind: Self::kind(),
                name: resource
                    .meta()
                    .name
                    .clone()
                    .unwrap_or_default(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    async fn delete(&self, name: &str) -> Result<()> {
        self.api.delete(name, &DeleteParams::default()).await?;
        Ok(())
    }

    async fn list(&self, label_selector: &str) -> Result<Vec<K>> {
        let params = ListParams::default().labels(label_selector);
        Ok(self.api.list(&params).await?.items)
    }
}
