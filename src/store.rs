//! Persisted scheme document (`scheme.json`).

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Result, SchemeError};
use crate::schema::SchemeDocument;

/// JSON file holding the last generated schema.
///
/// Saves replace the file atomically (write to a sibling temp file, then
/// rename), so a reader never sees a half-written document.
#[derive(Debug, Clone)]
pub struct SchemeStore {
    path: PathBuf,
}

impl SchemeStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "scheme.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Overwrite the persisted document.
    pub fn save(&self, document: &SchemeDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(document)?;
        let tmp = self.temp_path();
        fs::write(&tmp, json)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        log::info!(
            "Schema saved to {} ({} vertices, {} relationships)",
            self.path.display(),
            document.vertices.len(),
            document.relationships.len()
        );
        Ok(())
    }

    /// Read the persisted document, failing on a missing or malformed file.
    pub fn read(&self) -> Result<SchemeDocument> {
        let raw = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Load the persisted document.
    ///
    /// `Ok(None)` means there is nothing usable on disk: the file is missing or
    /// does not parse. Either way the caller should regenerate.
    pub fn load(&self) -> Result<Option<SchemeDocument>> {
        match self.read() {
            Ok(document) => {
                log::info!("Schema loaded from {}", self.path.display());
                Ok(Some(document))
            }
            Err(SchemeError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                log::info!("{} not found", self.path.display());
                Ok(None)
            }
            Err(SchemeError::Json(e)) => {
                log::warn!("Ignoring malformed {}: {}", self.path.display(), e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
