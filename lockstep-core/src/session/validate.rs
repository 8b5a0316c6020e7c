//! Session Validation
//!
//! Externally supplied documents are checked structurally on the raw JSON
//! value before any typed decoding, so every rejection carries a message
//! that points at the offending field.

use std::collections::HashSet;

use serde_json::{Map, Value};
use url::Url;

use super::limits::SessionLimits;
use crate::error::{Error, Result};
use crate::graph::Release;

/// Check whether `link` is safe to render as a navigable link.
///
/// Only absolute `http` and `https` URLs pass; `javascript:`, `data:`, and
/// anything that does not parse are refused.
pub fn is_safe_link(link: &str) -> bool {
    Url::parse(link)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

pub(crate) fn check_len(value: &str, limit: usize, what: &str) -> Result<()> {
    let len = value.chars().count();
    if len > limit {
        return Err(Error::validation(format!(
            "{what} is {len} characters long (limit {limit})"
        )));
    }
    Ok(())
}

fn required_str<'v>(
    object: &'v Map<String, Value>,
    key: &str,
    what: &str,
    limit: usize,
) -> Result<&'v str> {
    match object.get(key) {
        Some(Value::String(s)) => {
            check_len(s, limit, &format!("{what} `{key}`"))?;
            Ok(s.as_str())
        }
        _ => Err(Error::validation(format!("{what} is missing a string `{key}`"))),
    }
}

/// Null and absent are treated alike.
fn optional_str<'v>(
    object: &'v Map<String, Value>,
    key: &str,
    what: &str,
    limit: usize,
) -> Result<Option<&'v str>> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            check_len(s, limit, &format!("{what} `{key}`"))?;
            Ok(Some(s.as_str()))
        }
        Some(_) => Err(Error::validation(format!("{what} `{key}` must be a string"))),
    }
}

fn validate_release(release: &Value, what: &str, limits: &SessionLimits) -> Result<()> {
    let release = release
        .as_object()
        .ok_or_else(|| Error::validation(format!("{what} must be an object")))?;

    required_str(release, "version", what, limits.max_field_len)?;
    required_str(release, "date", what, limits.max_field_len)?;
    optional_str(release, "changelog", what, limits.max_changelog_len)?;

    if let Some(link) = optional_str(release, "prLink", what, limits.max_field_len)? {
        if !link.is_empty() && !is_safe_link(link) {
            return Err(Error::validation(format!(
                "{what} has an unsafe or malformed `prLink` (only http and https URLs are accepted)"
            )));
        }
    }
    Ok(())
}

fn validate_node(node: &Value, index: usize, limits: &SessionLimits) -> Result<()> {
    let what = format!("node {index}");
    let node = node
        .as_object()
        .ok_or_else(|| Error::validation(format!("{what} must be an object")))?;

    required_str(node, "id", &what, limits.max_field_len)?;
    for key in ["label", "org", "artifactId", "type", "version", "category"] {
        optional_str(node, key, &what, limits.max_field_len)?;
    }

    match node.get("history") {
        None | Some(Value::Null) => {}
        Some(Value::Array(history)) => {
            if history.len() > limits.max_history {
                return Err(Error::validation(format!(
                    "{what} has {} history entries (limit {})",
                    history.len(),
                    limits.max_history
                )));
            }
            for (i, release) in history.iter().enumerate() {
                validate_release(release, &format!("{what} history entry {i}"), limits)?;
            }
        }
        Some(_) => return Err(Error::validation(format!("{what} `history` must be an array"))),
    }
    Ok(())
}

fn validate_edge(edge: &Value, index: usize, limits: &SessionLimits) -> Result<()> {
    let what = format!("edge {index}");
    let edge = edge
        .as_object()
        .ok_or_else(|| Error::validation(format!("{what} must be an object")))?;
    required_str(edge, "source", &what, limits.max_field_len)?;
    required_str(edge, "target", &what, limits.max_field_len)?;
    Ok(())
}

fn validate_locks(locks: &Map<String, Value>, limits: &SessionLimits) -> Result<()> {
    for (consumer, entries) in locks {
        check_len(consumer, limits.max_field_len, "lock consumer id")?;
        let entries = entries.as_object().ok_or_else(|| {
            Error::validation(format!("locks for `{consumer}` must be an object"))
        })?;
        for (dependency, version) in entries {
            check_len(dependency, limits.max_field_len, "lock dependency id")?;
            let version = version.as_str().ok_or_else(|| {
                Error::validation(format!(
                    "lock of `{consumer}` on `{dependency}` must be a version string"
                ))
            })?;
            check_len(version, limits.max_field_len, "locked version")?;
        }
    }
    Ok(())
}

/// Check the shape and bounds of a raw session document.
pub(crate) fn validate_structure(document: &Value, limits: &SessionLimits) -> Result<()> {
    let root = document
        .as_object()
        .ok_or_else(|| Error::validation("session must be a JSON object"))?;

    let nodes = root
        .get("nodes")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::validation("`nodes` must be an array"))?;
    let edges = root
        .get("edges")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::validation("`edges` must be an array"))?;
    let locks = root
        .get("dependencyLocks")
        .and_then(Value::as_object)
        .ok_or_else(|| Error::validation("`dependencyLocks` must be an object"))?;

    if nodes.len() > limits.max_nodes {
        return Err(Error::validation(format!(
            "session has {} nodes (limit {})",
            nodes.len(),
            limits.max_nodes
        )));
    }
    if edges.len() > limits.max_edges {
        return Err(Error::validation(format!(
            "session has {} edges (limit {})",
            edges.len(),
            limits.max_edges
        )));
    }

    for (i, node) in nodes.iter().enumerate() {
        validate_node(node, i, limits)?;
    }
    for (i, edge) in edges.iter().enumerate() {
        validate_edge(edge, i, limits)?;
    }
    validate_locks(locks, limits)
}

/// Check typed release records against the bounds a loaded session must
/// meet.
pub(crate) fn check_history(history: &[Release], what: &str, limits: &SessionLimits) -> Result<()> {
    if history.len() > limits.max_history {
        return Err(Error::validation(format!(
            "{what} has {} history entries (limit {})",
            history.len(),
            limits.max_history
        )));
    }
    for (i, release) in history.iter().enumerate() {
        let what = format!("{what} history entry {i}");
        check_len(&release.changelog, limits.max_changelog_len, &format!("{what} `changelog`"))?;
        if let Some(link) = release.pr_link.as_deref().filter(|link| !link.is_empty()) {
            check_len(link, limits.max_field_len, &format!("{what} `prLink`"))?;
            if !is_safe_link(link) {
                return Err(Error::InvalidLink(link.to_string()));
            }
        }
    }
    Ok(())
}

/// Fail on the first id that appears twice.
pub(crate) fn ensure_unique<'a, I>(ids: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(Error::validation(format!("duplicate node id `{id}`")));
        }
    }
    Ok(())
}
