use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{AuditError, Result};
use crate::types::State;

/// Reads a state previously written by [`dump`].
///
/// # Errors
/// Returns [`AuditError::Format`] if the file is missing, unreadable, or not a valid state.
pub fn load(path: &Path) -> Result<State> {
    debug!(path = %path.display(), "loading state snapshot");
    let raw = fs::read_to_string(path)
        .map_err(|e| AuditError::Format(format!("read {}: {e}", path.display())))?;
    let state: State = serde_json::from_str(&raw)
        .map_err(|e| AuditError::Format(format!("parse {}: {e}", path.display())))?;
    info!(
        path = %path.display(),
        repositories = state.repositories.len(),
        members = state.organization.members.len(),
        "loaded state snapshot"
    );
    Ok(state)
}

/// Writes the full state to `path`, replacing whatever is there.
///
/// # Errors
/// Returns [`AuditError::Io`] if the file cannot be written.
pub fn dump(state: &State, path: &Path) -> Result<()> {
    let body = serde_json::to_string_pretty(state)
        .map_err(|e| AuditError::Format(format!("serialize state: {e}")))?;
    fs::write(path, body).map_err(|source| AuditError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "wrote state snapshot");
    Ok(())
}
