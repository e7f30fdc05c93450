//! Error types for the DBQ task queue core.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while registering schemas, dispatching tasks,
/// resolving targets, or awaiting completion.
#[derive(Debug, Error)]
pub enum Error {
    /// Kubernetes API error (transport failures and any API response that is
    /// not a 404 or a create-time 409).
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// No cluster resource exists with the requested name.
    ///
    /// The message is user-facing; callers surface it verbatim.
    #[error("no cluster found named {0}")]
    ClusterNotFound(String),

    /// No failover target exists with the requested name.
    #[error("no target found named {0}")]
    TargetNotFound(String),

    /// An object with the same name already exists.
    ///
    /// For task dispatch this is the "a task is already pending" signal, not
    /// a hard failure; callers decide whether to propagate it.
    #[error("{kind} {name} already exists")]
    AlreadyExists {
        /// Resource kind.
        kind: String,
        /// Resource name.
        name: String,
    },

    /// A resource definition with the same name exists but is not compatible
    /// with the one being registered.
    #[error("schema conflict for {name}: {reason}")]
    SchemaConflict {
        /// Definition name.
        name: String,
        /// Why the existing definition was rejected.
        reason: String,
    },

    /// A bounded wait elapsed without reaching its terminal state.
    #[error("timed out after {after:?} waiting for {what}")]
    Timeout {
        /// What was being waited for.
        what: String,
        /// The deadline that elapsed.
        after: Duration,
    },

    /// A failure whose cleanup also failed. Both causes are preserved.
    #[error("{primary}; rollback also failed: {rollback}")]
    Aggregate {
        /// The original failure.
        primary: Box<Error>,
        /// The failure encountered while rolling back.
        rollback: Box<Error>,
    },
}

/// Result type for DBQ core operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this is a create-time name collision.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::AlreadyExists { .. })
    }
}
