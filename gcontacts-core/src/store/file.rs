//! JSON file credential storage.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{CredentialRecord, CredentialStore, StoreError};

/// Credential store backed by a small JSON file.
///
/// The file is read on every [`load`](CredentialStore::load) and rewritten in
/// full on every [`save`](CredentialStore::save). On Unix the file is written
/// with mode `0600`.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Create a store for the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location of the credential file.
    ///
    /// `~/.config/gcontacts/auth.json` on Linux, the platform equivalent elsewhere.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "gcontacts", "gcontacts")
            .map(|dirs| dirs.config_dir().join("auth.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        if source.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound {
                location: self.location(),
            }
        } else {
            StoreError::Io {
                location: self.location(),
                source,
            }
        }
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<CredentialRecord, StoreError> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        Ok(serde_json::from_str(&contents)?)
    }

    async fn save(&self, record: &CredentialRecord) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let contents = serde_json::to_string_pretty(record)?;
        tokio::fs::write(&self.path, contents)
            .await
            .map_err(|e| self.io_error(e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|e| self.io_error(e))?;
        }

        tracing::debug!("Saved credential record to {}", self.location());
        Ok(())
    }
}
