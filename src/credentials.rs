//! File-backed admin credentials and the provider API key.
//!
//! One JSON record lives on disk:
//!
//! ```json
//! { "admin_username": "admin", "admin_password": "…", "openai_api_key": "sk-…" }
//! ```
//!
//! Every read and write goes through a single async mutex, so a key update
//! (read, modify, write) can never interleave with another request's read.
//! Writes go to a sibling temp file that is then renamed over the original,
//! so a crash mid-write never leaves a truncated record behind.

use crate::error::ReportError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// The single admin record.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminCredentials {
    pub admin_username: String,
    pub admin_password: String,
    /// Empty until an administrator sets it.
    #[serde(default)]
    pub openai_api_key: String,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("admin_username", &self.admin_username)
            .field("admin_password", &"<redacted>")
            .field("openai_api_key", &key_preview(&self.openai_api_key))
            .finish()
    }
}

/// First 8 characters followed by `...`, or `Not set`.
pub fn key_preview(key: &str) -> String {
    if key.is_empty() {
        "Not set".to_string()
    } else {
        let head: String = key.chars().take(8).collect();
        format!("{head}...")
    }
}

/// Read access to the provider API key, as the pipeline sees it.
#[async_trait]
pub trait ApiKeySource: Send + Sync {
    /// `Ok(None)` when no key has been configured.
    async fn api_key(&self) -> Result<Option<String>, ReportError>;
}

/// A fixed key, e.g. from the environment for one-off CLI runs.
#[derive(Clone, Default)]
pub struct StaticApiKey(Option<String>);

impl StaticApiKey {
    pub fn new(key: Option<String>) -> Self {
        Self(key.filter(|k| !k.trim().is_empty()))
    }
}

#[async_trait]
impl ApiKeySource for StaticApiKey {
    async fn api_key(&self) -> Result<Option<String>, ReportError> {
        Ok(self.0.clone())
    }
}

/// Lock-guarded JSON file holding [`AdminCredentials`].
#[derive(Debug)]
pub struct CredentialStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file with `initial` unless it already exists.
    ///
    /// Returns `true` if the file was created.
    pub async fn ensure_exists(&self, initial: &AdminCredentials) -> Result<bool, ReportError> {
        let _guard = self.lock.lock().await;
        if tokio::fs::try_exists(&self.path)
            .await
            .map_err(|e| self.store_error(e))?
        {
            return Ok(false);
        }
        self.write_unlocked(initial).await?;
        info!("Created credential store at {}", self.path.display());
        Ok(true)
    }

    pub async fn read(&self) -> Result<AdminCredentials, ReportError> {
        let _guard = self.lock.lock().await;
        self.read_unlocked().await
    }

    pub async fn write(&self, credentials: &AdminCredentials) -> Result<(), ReportError> {
        let _guard = self.lock.lock().await;
        self.write_unlocked(credentials).await
    }

    /// Replace the stored API key, keeping the rest of the record.
    pub async fn set_api_key(&self, new_key: &str) -> Result<(), ReportError> {
        let _guard = self.lock.lock().await;
        let mut credentials = self.read_unlocked().await?;
        credentials.openai_api_key = new_key.to_string();
        self.write_unlocked(&credentials).await?;
        info!("Provider API key updated ({})", key_preview(new_key));
        Ok(())
    }

    async fn read_unlocked(&self) -> Result<AdminCredentials, ReportError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| self.store_error(e))?;
        serde_json::from_slice(&bytes).map_err(|e| self.store_error(e))
    }

    async fn write_unlocked(&self, credentials: &AdminCredentials) -> Result<(), ReportError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.store_error(e))?;
        }

        let json = serde_json::to_vec_pretty(credentials).map_err(|e| self.store_error(e))?;

        // Atomic write: write to temp, then rename
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &json)
            .await
            .map_err(|e| self.store_error(e))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| self.store_error(e))?;

        debug!("Wrote credential store {}", self.path.display());
        Ok(())
    }

    fn store_error(&self, e: impl std::fmt::Display) -> ReportError {
        ReportError::CredentialStore {
            path: self.path.clone(),
            detail: e.to_string(),
        }
    }
}

#[async_trait]
impl ApiKeySource for CredentialStore {
    async fn api_key(&self) -> Result<Option<String>, ReportError> {
        let credentials = self.read().await?;
        Ok(Some(credentials.openai_api_key).filter(|k| !k.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AdminCredentials {
        AdminCredentials {
            admin_username: "admin".into(),
            admin_password: "hunter2".into(),
            openai_api_key: String::new(),
        }
    }

    #[test]
    fn preview_shows_prefix_only() {
        assert_eq!(key_preview(""), "Not set");
        assert_eq!(key_preview("sk-abcdefghijkl"), "sk-abcde...");
        assert_eq!(key_preview("sk-1"), "sk-1...");
    }

    #[test]
    fn debug_redacts_secrets() {
        let mut creds = sample();
        creds.openai_api_key = "sk-verysecretkey".into();
        let out = format!("{creds:?}");
        assert!(!out.contains("hunter2"));
        assert!(!out.contains("verysecretkey"));
    }

    #[tokio::test]
    async fn missing_file_is_a_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("admin_data.json"));
        let err = store.read().await.unwrap_err();
        assert!(matches!(err, ReportError::CredentialStore { .. }));
    }

    #[tokio::test]
    async fn ensure_exists_creates_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("config/admin_data.json"));

        assert!(store.ensure_exists(&sample()).await.unwrap());
        let mut other = sample();
        other.admin_password = "changed".into();
        assert!(!store.ensure_exists(&other).await.unwrap());

        assert_eq!(store.read().await.unwrap(), sample());
    }

    #[tokio::test]
    async fn set_api_key_keeps_other_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("admin_data.json"));
        store.write(&sample()).await.unwrap();

        assert_eq!(store.api_key().await.unwrap(), None);
        store.set_api_key("sk-new-key").await.unwrap();

        let creds = store.read().await.unwrap();
        assert_eq!(creds.admin_username, "admin");
        assert_eq!(creds.admin_password, "hunter2");
        assert_eq!(store.api_key().await.unwrap().as_deref(), Some("sk-new-key"));
        assert!(!dir.path().join("admin_data.json.tmp").exists());
    }

    #[tokio::test]
    async fn reads_file_without_key_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("admin_data.json");
        std::fs::write(&path, r#"{"admin_username":"admin","admin_password":"pw"}"#).unwrap();

        let store = CredentialStore::new(&path);
        assert_eq!(store.api_key().await.unwrap(), None);
    }

    #[tokio::test]
    async fn static_key_ignores_blank() {
        assert_eq!(StaticApiKey::new(Some("  ".into())).api_key().await.unwrap(), None);
        assert_eq!(
            StaticApiKey::new(Some("sk-x".into())).api_key().await.unwrap().as_deref(),
            Some("sk-x")
        );
    }
}
