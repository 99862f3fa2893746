//! JSON file backend for the store document.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use tracing::{debug, instrument};

use crate::base::types::{Res, Void};

use super::{GenericStore, StoreClient, StoreDocument};

impl StoreClient {
    /// Creates a store backed by a JSON file at `path`.
    pub fn json(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(JsonFileStore::new(path)))
    }
}

/// Keeps the store document in a single JSON file.
///
/// Writes go to a sibling temporary file which then replaces the target, so a crash
/// mid-write never leaves a truncated document behind.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl GenericStore for JsonFileStore {
    #[instrument(name = "JsonFileStore::load", skip_all, fields(path = %self.path.display()))]
    fn load(&self) -> Res<Option<StoreDocument>> {
        if !self.path.exists() {
            debug!("Store file does not exist yet.");
            return Ok(None);
        }

        let raw = std::fs::read_to_string(&self.path).with_context(|| format!("failed to read store file {}", self.path.display()))?;
        let document = serde_json::from_str(&raw).with_context(|| format!("failed to parse store file {}", self.path.display()))?;

        Ok(Some(document))
    }

    #[instrument(name = "JsonFileStore::save", skip_all, fields(path = %self.path.display()))]
    fn save(&self, document: &StoreDocument) -> Void {
        let payload = serde_json::to_vec(document).context("failed to serialize store document")?;
        let temp = self.temp_path();

        std::fs::write(&temp, payload).with_context(|| format!("failed to write {}", temp.display()))?;
        restrict_permissions(&temp)?;
        std::fs::rename(&temp, &self.path).with_context(|| format!("failed to replace store file {}", self.path.display()))?;

        debug!("Store document written.");

        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Void {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).with_context(|| format!("failed to set permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Void {
    Ok(())
}
