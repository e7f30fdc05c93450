//! Task submission.
//!
//! Dispatch is fire-and-forget: validate the referenced resources, create
//! one immutable [`DbTask`], and return as soon as the API server
//! acknowledges the create. Nothing here waits for the background controller
//! to act; completion is observed separately through
//! [`crate::watch::CompletionWatcher`].

use k8s_openapi::api::apps::v1::Deployment;
use kube::ResourceExt;

use crate::crd::{DbCluster, DbTask, DbTaskSpec, TaskKind};
use crate::error::Result;
use crate::labels;
use crate::resolver::TargetResolver;
use crate::store::ResourceStore;

/// Builds and submits task intents.
pub struct TaskDispatcher<T, C, D> {
    tasks: T,
    resolver: TargetResolver<C, D>,
}

impl<T, C, D> TaskDispatcher<T, C, D>
where
    T: ResourceStore<DbTask>,
    C: ResourceStore<DbCluster>,
    D: ResourceStore<Deployment>,
{
    /// Dispatcher over a task store and a resolver bound to the same
    /// namespace.
    pub fn new(tasks: T, resolver: TargetResolver<C, D>) -> Self {
        Self { tasks, resolver }
    }

    /// Submit a task for a cluster, optionally naming an explicit target.
    ///
    /// The cluster, and the target if one is given, must exist; validation
    /// failures abort the submission with no object created. On success
    /// exactly one task named `<cluster>-<kind>` exists afterwards and its
    /// name is returned. A second submission for the same cluster and kind
    /// before the first completes fails with [`crate::Error::AlreadyExists`];
    /// callers treat that as "a task is already pending", not as a hard
    /// failure. There is no retry here; resubmission is the caller's call.
    ///
    /// The existence checks and the create are not atomic: a target can
    /// disappear between validation and submission. The background
    /// controller re-checks its inputs, so the gap is accepted rather than
    /// closed here.
    pub async fn submit(
        &self,
        kind: TaskKind,
        cluster: &str,
        target: Option<&str>,
    ) -> Result<String> {
        if let Some(target) = target {
            self.resolver.validate_target(target).await?;
        }
        self.resolver.validate_cluster(cluster).await?;

        tracing::debug!(cluster = %cluster, kind = %kind, target = target.unwrap_or(""), "dispatching task");

        let name = DbTask::intent_name(cluster, kind);
        let mut task = DbTask::new(
            &name,
            DbTaskSpec {
                task_type: kind,
                parameters: cluster.to_string(),
            },
        );
        task.labels_mut()
            .insert(labels::TASK_TYPE.to_string(), kind.as_str().to_string());
        task.labels_mut().insert(
            labels::TARGET.to_string(),
            target.unwrap_or_default().to_string(),
        );

        self.tasks.create(&task).await?;
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::DbClusterSpec;
    use crate::error::Error;
    use crate::store::memory::MemoryStore;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    struct Fixture {
        clusters: MemoryStore<DbCluster>,
        deployments: MemoryStore<Deployment>,
        tasks: MemoryStore<DbTask>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                clusters: MemoryStore::new(),
                deployments: MemoryStore::new(),
                tasks: MemoryStore::new(),
            }
        }

        fn with_cluster(self, name: &str) -> Self {
            self.clusters.upsert(DbCluster::new(
                name,
                DbClusterSpec {
                    replicas: 2,
                    image: "dbq/postgres:latest".to_string(),
                },
            ));
            self
        }

        fn with_target(self, name: &str) -> Self {
            self.deployments.upsert(Deployment {
                metadata: ObjectMeta {
                    name: Some(name.to_string()),
                    ..Default::default()
                },
                ..Default::default()
            });
            self
        }

        fn dispatcher(
            &self,
        ) -> TaskDispatcher<MemoryStore<DbTask>, MemoryStore<DbCluster>, MemoryStore<Deployment>>
        {
            TaskDispatcher::new(
                self.tasks.clone(),
                TargetResolver::new(self.clusters.clone(), self.deployments.clone()),
            )
        }
    }

    #[tokio::test]
    async fn submit_creates_deterministically_named_task() {
        let fixture = Fixture::new().with_cluster("mycluster");

        let name = fixture
            .dispatcher()
            .submit(TaskKind::Failover, "mycluster", None)
            .await
            .unwrap();

        assert_eq!(name, "mycluster-failover");
        let task = fixture.tasks.get("mycluster-failover").await.unwrap().unwrap();
        assert_eq!(task.spec.task_type, TaskKind::Failover);
        assert_eq!(task.spec.parameters, "mycluster");
        assert_eq!(task.labels().get(labels::TARGET).map(String::as_str), Some(""));
        assert_eq!(
            task.labels().get(labels::TASK_TYPE).map(String::as_str),
            Some("failover")
        );
    }

    #[tokio::test]
    async fn explicit_target_is_carried_on_the_task() {
        let fixture = Fixture::new().with_cluster("mycluster").with_target("dep-good");

        fixture
            .dispatcher()
            .submit(TaskKind::Failover, "mycluster", Some("dep-good"))
            .await
            .unwrap();

        let task = fixture.tasks.get("mycluster-failover").await.unwrap().unwrap();
        assert_eq!(
            task.labels().get(labels::TARGET).map(String::as_str),
            Some("dep-good")
        );
    }

    #[tokio::test]
    async fn unknown_cluster_aborts_with_no_side_effect() {
        let fixture = Fixture::new();

        let err = fixture
            .dispatcher()
            .submit(TaskKind::Failover, "mycluster", None)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ClusterNotFound(_)), "got {err}");
        assert!(fixture.tasks.is_empty());
    }

    #[tokio::test]
    async fn unknown_explicit_target_aborts_with_no_side_effect() {
        let fixture = Fixture::new().with_cluster("mycluster");

        let err = fixture
            .dispatcher()
            .submit(TaskKind::Failover, "mycluster", Some("dep-bad"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::TargetNotFound(_)), "got {err}");
        assert!(fixture.tasks.is_empty());
    }

    #[tokio::test]
    async fn second_submission_is_a_conflict_not_a_duplicate() {
        let fixture = Fixture::new().with_cluster("mycluster");
        let dispatcher = fixture.dispatcher();

        dispatcher
            .submit(TaskKind::Failover, "mycluster", None)
            .await
            .unwrap();
        let err = dispatcher
            .submit(TaskKind::Failover, "mycluster", None)
            .await
            .unwrap_err();

        assert!(err.is_conflict(), "got {err}");
        assert_eq!(fixture.tasks.len(), 1);
    }

    #[tokio::test]
    async fn different_kinds_do_not_collide() {
        let fixture = Fixture::new().with_cluster("mycluster");
        let dispatcher = fixture.dispatcher();

        dispatcher
            .submit(TaskKind::Failover, "mycluster", None)
            .await
            .unwrap();
        dispatcher
            .submit(TaskKind::Backup, "mycluster", None)
            .await
            .unwrap();

        assert!(fixture.tasks.contains("mycluster-failover"));
        assert!(fixture.tasks.contains("mycluster-backup"));
    }
}
