//! JSON artifacts and atomic persistence.
//!
//! Analysis results are keyed subject → session → marker name. Subject
//! workers may run concurrently, so every artifact is written to a
//! temporary file in the target directory and renamed into place; a
//! crashed worker never leaves a half-written artifact behind.

use std::collections::BTreeMap;
use std::path::Path;

use gazecal_core::{FixationError, MarkerErrors, SessionAverage};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact path {0} has no parent directory")]
    NoParent(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Raw error results of one session, keyed by marker name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionErrorArtifact {
    pub gaze_error: BTreeMap<String, MarkerErrors>,
    pub fixation_error: BTreeMap<String, Vec<FixationError>>,
}

/// Raw error results of one subject, keyed by session name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubjectErrorArtifact {
    pub sessions: BTreeMap<String, SessionErrorArtifact>,
}

/// Session averages of one subject, keyed session → marker name.
///
/// Missing averages stay in the map as `null` so downstream consumers can
/// distinguish "no data" from "zero error".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubjectAveragesArtifact {
    pub sessions: BTreeMap<String, BTreeMap<String, SessionAverage>>,
}

/// Write a JSON artifact atomically: temp file in the same directory,
/// then rename over the destination.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| ArtifactError::NoParent(path.display().to_string()))?;
    std::fs::create_dir_all(parent)?;

    let file = NamedTempFile::new_in(parent)?;
    serde_json::to_writer_pretty(&file, value)?;
    file.persist(path).map_err(|e| ArtifactError::Io(e.error))?;

    debug!(path = %path.display(), "artifact written");
    Ok(())
}

/// Read a JSON artifact.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}
