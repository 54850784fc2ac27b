//! Deterministic run identifiers and artifact directory layout.

use crate::error::SweepError;
use crate::grid::TrainingConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the per-run manifest inside an artifact directory.
pub const MANIFEST_FILE: &str = "run.json";

/// Identifier of one run, used both as result key and directory name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RunId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Filesystem locations owned by one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunArtifacts {
    pub dir: PathBuf,
    pub model_path: PathBuf,
    pub manifest_path: PathBuf,
}

/// Maps configurations to identifiers and artifact directories.
#[derive(Debug, Clone)]
pub struct RunNamer {
    prefix: String,
    root: PathBuf,
}

impl RunNamer {
    pub fn new(prefix: impl Into<String>, root: impl Into<PathBuf>) -> Result<Self, SweepError> {
        let prefix = prefix.into();
        if prefix.is_empty() || prefix.contains(['/', '\\']) || prefix.starts_with('.') {
            return Err(SweepError::config(format!(
                "run prefix '{prefix}' is not a valid directory name"
            )));
        }
        Ok(Self {
            prefix,
            root: root.into(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<prefix>_dim_<d>_epochs_<e>_ngrams_<n>_l_<lr>`.
    pub fn run_id(&self, config: &TrainingConfig) -> RunId {
        let mut name = self.prefix.clone();
        for (axis, value) in config.axes() {
            name.push_str(&format!("_{axis}_{value}"));
        }
        RunId(name)
    }

    pub fn artifacts(&self, id: &RunId) -> RunArtifacts {
        let dir = self.root.join(id.as_str());
        RunArtifacts {
            model_path: dir.join(format!("{id}.bin")),
            manifest_path: dir.join(MANIFEST_FILE),
            dir,
        }
    }

    /// Resolve the identifier and create the artifact directory if it is absent.
    ///
    /// An existing directory is reused as-is; the run is still retrained.
    pub fn ensure_dir(&self, config: &TrainingConfig) -> Result<(RunId, RunArtifacts), SweepError> {
        let id = self.run_id(config);
        let artifacts = self.artifacts(&id);
        if artifacts.dir.is_dir() {
            debug!(run_id = %id, "Reusing existing artifact directory");
        } else {
            std::fs::create_dir_all(&artifacts.dir)?;
            debug!(run_id = %id, dir = %artifacts.dir.display(), "Created artifact directory");
        }
        Ok((id, artifacts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(ngrams: u32, lr: f64) -> TrainingConfig {
        TrainingConfig {
            dim: 20,
            epochs: 100,
            ngrams,
            lr,
        }
    }

    #[test]
    fn test_run_id_format() {
        let namer = RunNamer::new("fasttext", "/data").unwrap();
        assert_eq!(
            namer.run_id(&config(1, 0.1)).as_str(),
            "fasttext_dim_20_epochs_100_ngrams_1_l_0.1"
        );
    }

    #[test]
    fn test_run_id_deterministic_and_distinct() {
        let namer = RunNamer::new("fasttext", "/data").unwrap();
        assert_eq!(namer.run_id(&config(1, 0.1)), namer.run_id(&config(1, 0.1)));
        assert_ne!(namer.run_id(&config(1, 0.1)), namer.run_id(&config(2, 0.1)));
        assert_ne!(namer.run_id(&config(1, 0.1)), namer.run_id(&config(1, 0.01)));
    }

    #[test]
    fn test_artifact_layout() {
        let namer = RunNamer::new("fasttext", "/data").unwrap();
        let id = namer.run_id(&config(3, 0.2));
        let artifacts = namer.artifacts(&id);
        assert_eq!(artifacts.dir, PathBuf::from("/data").join(id.as_str()));
        assert_eq!(
            artifacts.model_path,
            artifacts.dir.join(format!("{}.bin", id.as_str()))
        );
        assert_eq!(artifacts.manifest_path, artifacts.dir.join(MANIFEST_FILE));
    }

    #[test]
    fn test_ensure_dir_is_idempotent() {
        let root = TempDir::new().unwrap();
        let namer = RunNamer::new("fasttext", root.path()).unwrap();
        let (id, first) = namer.ensure_dir(&config(1, 0.1)).unwrap();
        assert!(first.dir.is_dir());
        let (again, second) = namer.ensure_dir(&config(1, 0.1)).unwrap();
        assert_eq!(id, again);
        assert_eq!(first, second);
    }

    #[test]
    fn test_rejects_bad_prefix() {
        assert!(RunNamer::new("", "/data").is_err());
        assert!(RunNamer::new("a/b", "/data").is_err());
        assert!(RunNamer::new("..", "/data").is_err());
    }
}
