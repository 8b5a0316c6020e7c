//! Session Codec
//!
//! Converts between a [`GraphStore`] and its persisted session document.
//!
//! # Loading
//!
//! Decoding is a pipeline that stops at the first failure:
//!
//! 1. Parse the input (JSON text or MessagePack) into a raw value
//! 2. Check shape and bounds against [`SessionLimits`]
//! 3. Decode into typed records
//! 4. Check graph-level rules: unique ids and an acyclic edge set
//!
//! Edges that point at unknown ids are kept; read-side queries tolerate
//! them.

mod document;
mod limits;
mod validate;

pub use document::SessionDocument;
pub use limits::SessionLimits;
pub use validate::is_safe_link;
pub(crate) use validate::{check_history, check_len};

use serde_json::Value;
use tracing::warn;

use crate::error::{Error, Result};
use crate::graph::{AdjacencyIndex, GraphStore};

/// Decode and validate a raw session value.
pub fn decode(document: Value, limits: &SessionLimits) -> Result<SessionDocument> {
    let result = decode_inner(document, limits);
    if let Err(err) = &result {
        warn!(error = %err, "rejected session document");
    }
    result
}

fn decode_inner(document: Value, limits: &SessionLimits) -> Result<SessionDocument> {
    validate::validate_structure(&document, limits)?;

    let mut session: SessionDocument = serde_json::from_value(document)
        .map_err(|e| Error::validation(format!("malformed session: {e}")))?;

    for node in &mut session.nodes {
        node.clear_empty_links();
    }

    validate::ensure_unique(session.nodes.iter().map(|n| n.id.as_str()))?;

    let adjacency = AdjacencyIndex::build(&session.edges);
    if let Err(on_cycle) = adjacency.topological_order(session.nodes.iter().map(|n| &n.id)) {
        return Err(Error::validation(format!(
            "edges form a dependency cycle through `{on_cycle}`"
        )));
    }

    Ok(session)
}

/// Decode and validate a JSON session.
pub fn decode_str(json: &str, limits: &SessionLimits) -> Result<SessionDocument> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| Error::validation(format!("session is not valid JSON: {e}")))?;
    decode(value, limits)
}

/// Decode and validate a MessagePack session.
pub fn decode_msgpack(bytes: &[u8], limits: &SessionLimits) -> Result<SessionDocument> {
    let value: Value = rmp_serde::from_slice(bytes)
        .map_err(|e| Error::validation(format!("session is not valid MessagePack: {e}")))?;
    decode(value, limits)
}

/// Snapshot a store.
pub fn encode(store: &GraphStore) -> SessionDocument {
    SessionDocument::from_store(store)
}
