//! Error Types
//!
//! Every fallible operation in the crate returns [`Result`]. Errors are typed
//! so the presentation layer can decide how to surface them; the engine never
//! reports them itself.

use crate::graph::NodeId;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the dependency graph engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A node with this id is already present in the graph.
    #[error("a dependency with id `{0}` already exists")]
    DuplicateId(NodeId),

    /// An edge or lock operation referenced an id that is not in the graph.
    #[error("unknown dependency `{0}`")]
    UnknownNode(NodeId),

    /// A version string could not be parsed as `major.minor.patch`.
    #[error("invalid version `{input}`: {reason}")]
    Format { input: String, reason: String },

    /// A session document was malformed, oversized, or unsafe.
    #[error("invalid session: {0}")]
    Validation(String),

    /// Wiring `from` upstream of `to` would close a dependency cycle.
    #[error("`{to}` cannot depend on `{from}`: that would create a dependency cycle")]
    CycleDetected { from: NodeId, to: NodeId },

    /// A release link that is not a well-formed http or https URL.
    #[error("invalid release link `{0}`: only http and https URLs are accepted")]
    InvalidLink(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("failed to encode session: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
}

impl Error {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
