//! Model persistence.
//!
//! Flat directory of bincode blobs, one file per classifier name. Writes
//! land in a temp file and are renamed into place, so a concurrent reader
//! sees either the previous blob or the new one, never a torn write.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{DiabevalError, Result};
use crate::training::TrainedClassifier;

pub const DEFAULT_MODELS_DIR: &str = "models";

/// Name-keyed classifier storage with overwrite semantics.
#[derive(Debug)]
pub struct ModelStore {
    root: PathBuf,
    /// Serializes writers so saves of the same name cannot interleave.
    write_lock: Mutex<()>,
}

impl ModelStore {
    /// Open a store rooted at `path`, creating the directory if needed.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        if !root.exists() {
            fs::create_dir_all(&root)?;
        }
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Save a classifier under `name`, replacing any previous blob.
    pub fn save(&self, name: &str, model: &TrainedClassifier) -> Result<()> {
        let final_path = self.model_path(name)?;
        let tmp_path = final_path.with_extension("bin.tmp");
        let bytes = bincode::serialize(model)?;

        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut file = File::create(&tmp_path)?;
        file.write_all(&bytes)?;
        fs::rename(&tmp_path, &final_path)?;
        Ok(())
    }

    /// Load the classifier saved under `name`.
    ///
    /// Returns `Ok(None)` when nothing has been saved under that name;
    /// a blob that exists but does not decode is `ModelLoadFailed`.
    pub fn load(&self, name: &str) -> Result<Option<TrainedClassifier>> {
        let path = self.model_path(name)?;

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(DiabevalError::ModelLoadFailed {
                    name: name.to_string(),
                    reason: e.to_string(),
                })
            }
        };

        bincode::deserialize(&bytes)
            .map(Some)
            .map_err(|e| DiabevalError::ModelLoadFailed {
                name: name.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn exists(&self, name: &str) -> bool {
        self.model_path(name).map(|p| p.exists()).unwrap_or(false)
    }

    fn model_path(&self, name: &str) -> Result<PathBuf> {
        if name.trim().is_empty() {
            return Err(DiabevalError::DataError(
                "Model name cannot be empty".to_string(),
            ));
        }
        let sanitized: String = name
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        Ok(self.root.join(format!("{}.bin", sanitized)))
    }
}
