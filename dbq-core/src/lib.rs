//! DBQ task queue core.
//!
//! This crate is the client-side core of the DBQ database operator: a
//! declarative task queue over the Kubernetes API server. Long-running
//! operations (failover, backup) are requested by creating an immutable
//! [`DbTask`] custom resource; an out-of-process background controller picks
//! the task up, performs the operation, and writes `Processed` back into its
//! status. Nothing here pushes notifications: completion, like schema
//! readiness, is observed by bounded polling.
//!
//! # Components
//!
//! - [`store`]: typed get/create/delete/list over the API server, with
//!   absence and name collisions as first-class outcomes
//! - [`SchemaRegistrar`]: creates the custom resource definitions and waits
//!   for them to be established, rolling back on timeout
//! - [`TargetResolver`]: confirms clusters and targets exist, discovers
//!   failover candidates by label selector
//! - [`TaskDispatcher`]: validates, then submits one task, fire-and-forget
//! - [`CompletionWatcher`]: polls a task until it is processed or a deadline
//!   elapses
//!
//! # Example
//!
//! ```no_run
//! use dbq_core::{
//!     CompletionWatcher, KubeStore, SchemaRegistrar, TargetResolver, TaskDispatcher, TaskKind,
//! };
//!
//! # async fn example() -> dbq_core::Result<()> {
//! let client = kube::Client::try_default().await?;
//! let namespace = "default";
//!
//! // Once, at bootstrap.
//! SchemaRegistrar::new(KubeStore::cluster_scoped(client.clone()))
//!     .register_builtins()
//!     .await?;
//!
//! let resolver = TargetResolver::new(
//!     KubeStore::namespaced(client.clone(), namespace),
//!     KubeStore::namespaced(client.clone(), namespace),
//! );
//! let dispatcher = TaskDispatcher::new(KubeStore::namespaced(client.clone(), namespace), resolver);
//!
//! let name = dispatcher.submit(TaskKind::Failover, "mycluster", None).await?;
//!
//! CompletionWatcher::new(KubeStore::namespaced(client, namespace))
//!     .await_processed(&name)
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod crd;
pub mod dispatch;
pub mod error;
pub mod labels;
pub mod registrar;
pub mod resolver;
pub mod store;
pub mod watch;

pub use crd::{DbCluster, DbClusterSpec, DbTask, DbTaskSpec, DbTaskStatus, TaskKind, TaskState};
pub use dispatch::TaskDispatcher;
pub use error::{Error, Result};
pub use registrar::SchemaRegistrar;
pub use resolver::TargetResolver;
pub use store::{KubeStore, ResourceStore};
pub use watch::CompletionWatcher;
