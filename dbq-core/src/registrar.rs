//! Registration of DBQ custom resource definitions.
//!
//! Registering a schema is not a single create: the API server establishes a
//! new definition asynchronously, and a definition that never becomes
//! established must not be left behind. [`SchemaRegistrar::register`] runs
//! the whole protocol: declare, await the `Established` condition, and roll
//! the definition back if the deadline elapses first.

use std::time::Duration;

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::{CustomResourceExt, ResourceExt};
use tokio::time::{sleep, Instant};

use crate::crd::{DbCluster, DbTask};
use crate::error::{Error, Result};
use crate::store::ResourceStore;

/// Default interval between readiness polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Default overall deadline for a definition to become established.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(60);

/// Registers custom resource definitions and waits for them to be usable.
pub struct SchemaRegistrar<S> {
    definitions: S,
    poll_interval: Duration,
    deadline: Duration,
}

impl<S> SchemaRegistrar<S>
where
    S: ResourceStore<CustomResourceDefinition>,
{
    /// Registrar with the default 500 ms poll interval and 60 s deadline.
    pub fn new(definitions: S) -> Self {
        Self {
            definitions,
            poll_interval: DEFAULT_POLL_INTERVAL,
            deadline: DEFAULT_DEADLINE,
        }
    }

    /// Override poll interval and deadline.
    #[must_use]
    pub fn with_timing(mut self, poll_interval: Duration, deadline: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.deadline = deadline;
        self
    }

    /// Register all definitions this crate ships. Called once at bootstrap,
    /// before any DbCluster or DbTask instance is created.
    pub async fn register_builtins(&self) -> Result<()> {
        self.register(&DbCluster::crd()).await?;
        self.register(&DbTask::crd()).await
    }

    /// Register one definition and wait for it to become established.
    ///
    /// A pre-existing definition with the same name is accepted only when its
    /// group and names match the submitted one; anything else is surfaced as
    /// [`Error::SchemaConflict`]. If the deadline elapses without the
    /// `Established` condition, a definition this call created is deleted
    /// again; a rollback failure is reported together with the timeout as
    /// [`Error::Aggregate`]. A pre-existing definition is never deleted, only
    /// the timeout is returned.
    pub async fn register(&self, definition: &CustomResourceDefinition) -> Result<()> {
        let name = definition.name_any();
        let mut created = false;

        match self.definitions.create(definition).await {
            Ok(()) => {
                created = true;
                tracing::debug!(definition = %name, "declared resource definition");
            }
            Err(err) if err.is_conflict() => match self.definitions.get(&name).await? {
                Some(existing) if compatible(&existing, definition) => {
                    tracing::debug!(definition = %name, "resource definition already declared");
                }
                Some(_) => {
                    return Err(Error::SchemaConflict {
                        name,
                        reason: "an existing definition has a different group or names"
                            .to_string(),
                    });
                }
                None => {
                    return Err(Error::SchemaConflict {
                        name,
                        reason: "definition disappeared while checking an existing declaration"
                            .to_string(),
                    });
                }
            },
            Err(err) => return Err(err),
        }

        match self.await_established(&name).await {
            Ok(()) => {
                tracing::info!(definition = %name, "resource definition established");
                Ok(())
            }
            Err(timeout) => {
                // Rollback only covers a definition this call created.
                if !created {
                    return Err(timeout);
                }
                tracing::error!(definition = %name, error = %timeout, "rolling back resource definition");
                match self.definitions.delete(&name).await {
                    Ok(()) => Err(timeout),
                    Err(rollback) => Err(Error::Aggregate {
                        primary: Box::new(timeout),
                        rollback: Box::new(rollback),
                    }),
                }
            }
        }
    }

    /// Poll the definition's conditions until `Established=True` or the
    /// deadline. Transient fetch failures consume budget, never abort; a
    /// `NamesAccepted=False` condition is a name conflict that sometimes
    /// self-resolves, so it is logged and polling continues.
    async fn await_established(&self, name: &str) -> Result<()> {
        let deadline = Instant::now() + self.deadline;
        loop {
            match self.definitions.get(name).await {
                Ok(Some(definition)) => {
                    if check_conditions(&definition) {
                        return Ok(());
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::debug!(definition = %name, error = %err, "transient error polling definition");
                }
            }

            if Instant::now() >= deadline {
                return Err(Error::Timeout {
                    what: format!("resource definition {} to become established", name),
                    after: self.deadline,
                });
            }
            sleep(self.poll_interval).await;
        }
    }
}

/// True once the definition carries `Established=True`.
fn check_conditions(definition: &CustomResourceDefinition) -> bool {
    let conditions = definition
        .status
        .as_ref()
        .and_then(|s| s.conditions.as_ref());
    for condition in conditions.into_iter().flatten() {
        match condition.type_.as_str() {
            "Established" if condition.status == "True" => return true,
            "NamesAccepted" if condition.status == "False" => {
                tracing::warn!(
                    definition = %definition.name_any(),
                    reason = condition.reason.as_deref().unwrap_or(""),
                    "definition name conflict"
                );
            }
            _ => {}
        }
    }
    false
}

/// An existing definition is compatible when it describes the same type:
/// same group, same kind, same plural.
fn compatible(existing: &CustomResourceDefinition, wanted: &CustomResourceDefinition) -> bool {
    existing.spec.group == wanted.spec.group
        && existing.spec.names.kind == wanted.spec.names.kind
        && existing.spec.names.plural == wanted.spec.names.plural
}
