//! Per-run snapshot directory for policy documents.
//!
//! Every policy is written here before it is applied remotely, so a failed
//! remote write leaves a document an operator can apply by hand.

use crate::error::PolicyError;
use crate::policy::PolicyDocument;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// Default root for run directories, relative to the working directory.
pub const LOG_ROOT: &str = "log";

/// Directory name for a run started at `started`.
pub fn run_dir_name(started: DateTime<Local>) -> String {
    format!("run_{}", started.format("%Y%m%d_%H%M"))
}

#[derive(Debug, Clone)]
pub struct RunLog {
    dir: PathBuf,
}

impl RunLog {
    /// Create a fresh `<root>/run_<timestamp>/`. When another run already
    /// holds that name, `_2`, `_3`, ... are appended until one is free.
    pub fn create(root: &Path, started: DateTime<Local>) -> Result<Self, PolicyError> {
        let snapshot_error = |path: &Path, err: std::io::Error| PolicyError::Snapshot {
            path: path.display().to_string(),
            reason: err.to_string(),
        };
        std::fs::create_dir_all(root).map_err(|e| snapshot_error(root, e))?;

        let base = run_dir_name(started);
        let mut attempt = 1u32;
        loop {
            let name = if attempt == 1 {
                base.clone()
            } else {
                format!("{base}_{attempt}")
            };
            let dir = root.join(name);
            match std::fs::create_dir(&dir) {
                Ok(()) => return Ok(Self { dir }),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(snapshot_error(&dir, e)),
            }
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a snapshot named `name` is written to.
    pub fn snapshot_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Write `document` as pretty JSON and return its path.
    pub fn snapshot(&self, name: &str, document: &PolicyDocument) -> Result<PathBuf, PolicyError> {
        let path = self.snapshot_path(name);
        let snapshot_error = |reason: String| PolicyError::Snapshot {
            path: path.display().to_string(),
            reason,
        };
        let contents = document
            .to_json_pretty()
            .map_err(|e| snapshot_error(e.to_string()))?;
        std::fs::write(&path, contents).map_err(|e| snapshot_error(e.to_string()))?;
        tracing::info!(path = %path.display(), "Policy saved");
        Ok(path)
    }
}
