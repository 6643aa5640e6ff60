use std::path::{Path, PathBuf};

use serde::{Serialize, de::DeserializeOwned};

use crate::{
    config::Config,
    error::StoreError,
    types::{PlaylistRecord, TokenRecord},
};

/// On-disk cache for the OAuth token pair and the resolved playlist id.
///
/// Reads never fail: a missing, unreadable or malformed file is a cache miss.
/// Writes go to a sibling temporary file first and are renamed into place.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    token_path: PathBuf,
    playlist_path: PathBuf,
}

impl CredentialStore {
    pub fn new(token_path: PathBuf, playlist_path: PathBuf) -> Self {
        Self {
            token_path,
            playlist_path,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.token_cache_path(), config.playlist_cache_path())
    }

    pub fn token_path(&self) -> &Path {
        &self.token_path
    }

    pub fn playlist_path(&self) -> &Path {
        &self.playlist_path
    }

    pub async fn load_token(&self) -> Option<TokenRecord> {
        let token: TokenRecord = read_json(&self.token_path).await?;
        if token.access_token.is_empty() {
            return None;
        }
        Some(token)
    }

    /// Persists the token record, readable and writable by the owner only.
    pub async fn save_token(&self, token: &TokenRecord) -> Result<(), StoreError> {
        write_json(&self.token_path, token, true).await
    }

    /// Returns the cached playlist id if it was cached under `expected_name`.
    pub async fn load_playlist(&self, expected_name: &str) -> Option<String> {
        let record: PlaylistRecord = read_json(&self.playlist_path).await?;
        if record.name != expected_name || record.id.is_empty() {
            return None;
        }
        Some(record.id)
    }

    pub async fn save_playlist(&self, name: &str, id: &str) -> Result<(), StoreError> {
        let record = PlaylistRecord {
            name: name.to_string(),
            id: id.to_string(),
        };
        write_json(&self.playlist_path, &record, false).await
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let content = async_fs::read_to_string(path).await.ok()?;
    serde_json::from_str(&content).ok()
}

async fn write_json<T: Serialize>(path: &Path, value: &T, private: bool) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let json = serde_json::to_string_pretty(value)?;
    let tmp_path = temp_path(path);
    async_fs::write(&tmp_path, json).await.map_err(io_err)?;

    if private {
        restrict_permissions(&tmp_path).await.map_err(io_err)?;
    }

    if let Err(e) = async_fs::rename(&tmp_path, path).await {
        let _ = async_fs::remove_file(&tmp_path).await;
        return Err(io_err(e));
    }

    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    async_fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
