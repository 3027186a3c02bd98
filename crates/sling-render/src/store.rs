use std::path::{Path, PathBuf};

use sling_core::{Artifact, StoredArtifact};

/// Writes rendered artifacts into `out_dir`, creating it if needed.
///
/// Existing files with the same names are overwritten. Every artifact is on
/// disk when this returns `Ok`.
pub fn write_all(out_dir: &Path, artifacts: &[Artifact]) -> Result<Vec<StoredArtifact>, StoreError> {
    std::fs::create_dir_all(out_dir).map_err(|e| StoreError::CreateDir {
        path: out_dir.to_path_buf(),
        source: e,
    })?;

    let mut stored = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let path = out_dir.join(&artifact.file_name);
        std::fs::write(&path, &artifact.contents).map_err(|e| StoreError::Write {
            artifact: artifact.kind.name(),
            path: path.clone(),
            source: e,
        })?;
        tracing::debug!(artifact = %artifact.kind, path = %path.display(), "artifact written");
        stored.push(StoredArtifact {
            kind: artifact.kind,
            path,
        });
    }

    Ok(stored)
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to create output directory {path}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {artifact} to {path}")]
    Write {
        artifact: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
}
