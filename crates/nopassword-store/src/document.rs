//! JSON persistence for [`Salts`].
//!
//! The document is `{"services": [...], "saltMap": {name: [record...]}}`,
//! pretty-printed. Saving goes through a sibling `.tmp` file and a rename so
//! a crash never leaves a half-written store behind.

use crate::error::StoreError;
use crate::salts::Salts;
use std::fs;
use std::path::{Path, PathBuf};

impl Salts {
    /// Parse a store from its JSON document.
    ///
    /// No consistency checks run here; see [`Salts::data`].
    ///
    /// # Errors
    ///
    /// [`StoreError::Document`] if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Render the store as a pretty-printed JSON document.
    ///
    /// # Errors
    ///
    /// [`StoreError::Document`] if serialization fails.
    pub fn to_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a store from `path`.
    ///
    /// # Errors
    ///
    /// [`StoreError::Io`] if the file cannot be read, [`StoreError::Document`]
    /// if it is not a valid document.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let contents = fs::read_to_string(path)?;
        let salts = Self::from_json(&contents)?;
        tracing::info!(
            path = %path.display(),
            services = salts.services().len(),
            "salt store loaded"
        );
        Ok(salts)
    }

    /// Write the store to `path` atomically.
    ///
    /// # Errors
    ///
    /// [`StoreError::Io`] if the parent directory does not exist or the file
    /// system rejects the write or rename.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let json = self.to_json()?;
        let tmp = tmp_path(path);

        fs::write(&tmp, json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600))?;
        }

        fs::rename(&tmp, path)?;
        tracing::info!(path = %path.display(), "salt store saved");
        Ok(())
    }
}

/// `dir/name.json` becomes `dir/.name.json.tmp`.
fn tmp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| "salts".into(), |n| n.to_string_lossy().into_owned());
    path.with_file_name(format!(".{name}.tmp"))
}
