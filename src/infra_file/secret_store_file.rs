use crate::domain_port::{SecretStore, SecretStoreError};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Secrets kept as a flat JSON object in a single file.
///
/// Every write rewrites the whole file through a sibling temp file and a
/// rename, so a crash never leaves a half-written document behind.
pub struct FileSecretStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSecretStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>, SecretStoreError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(SecretStoreError::Io(e.to_string())),
        };
        if raw.is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_slice(&raw).map_err(|e| {
            SecretStoreError::Corrupt(format!("{}: {}", self.path.display(), e))
        })
    }

    async fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), SecretStoreError> {
        let body = serde_json::to_vec_pretty(entries)
            .map_err(|e| SecretStoreError::Corrupt(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SecretStoreError::Io(e.to_string()))?;
        }

        let tmp_path = self.path.with_extension("tmp");
        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options
            .open(&tmp_path)
            .await
            .map_err(|e| SecretStoreError::Io(e.to_string()))?;
        file.write_all(&body)
            .await
            .map_err(|e| SecretStoreError::Io(e.to_string()))?;
        file.sync_all()
            .await
            .map_err(|e| SecretStoreError::Io(e.to_string()))?;
        drop(file);

        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| SecretStoreError::Io(e.to_string()))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl SecretStore for FileSecretStore {
    async fn get(&self, key: &str) -> Result<Option<String>, SecretStoreError> {
        let entries = self.read_all().await?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), SecretStoreError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_all().await?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<(), SecretStoreError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_all().await?;
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.write_all(&entries).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSecretStore::new(dir.path().join("tokens.json"));
        assert_eq!(store.get("auth_access_token").await.unwrap(), None);
        store.remove("auth_access_token").await.unwrap();
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn values_survive_a_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tokens.json");

        let store = FileSecretStore::new(&path);
        store.set("auth_access_token", "A").await.unwrap();
        store.set("auth_refresh_token", "R").await.unwrap();
        store.remove("auth_access_token").await.unwrap();

        let reopened = FileSecretStore::new(&path);
        assert_eq!(reopened.get("auth_access_token").await.unwrap(), None);
        assert_eq!(
            reopened.get("auth_refresh_token").await.unwrap(),
            Some("R".to_string())
        );
    }

    #[tokio::test]
    async fn garbage_file_is_reported_as_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        std::fs::write(&path, b"not json").unwrap();

        let store = FileSecretStore::new(&path);
        let err = store.get("auth_access_token").await.unwrap_err();
        assert!(matches!(err, SecretStoreError::Corrupt(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        let store = FileSecretStore::new(&path);
        store.set("auth_access_token", "A").await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
