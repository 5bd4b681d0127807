//! Refresh-token store
//!
//! DeviantArt rotates the refresh token on every grant, so losing the
//! newest one strands the installation. Persists the token at
//! `~/.config/featured-sync/refresh_token` with atomic writes (tempfile +
//! rename) serialized under an `fs2` advisory lock on a sibling `.lock`
//! file; concurrent runs cannot clobber each other's rotation.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::config::user_config_dir;
use crate::error::{SyncError, SyncResult};

const TOKEN_FILE: &str = "refresh_token";

#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Store at the default user-config location.
    pub fn new() -> SyncResult<Self> {
        let dir = user_config_dir().ok_or_else(|| SyncError::TokenStore {
            message: "no user config directory on this platform".to_string(),
        })?;
        Ok(Self {
            path: dir.join(TOKEN_FILE),
        })
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn acquire_lock(&self) -> SyncResult<File> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| SyncError::TokenStore {
                message: format!("creating {}: {e}", parent.display()),
            })?;
        }
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())
            .map_err(|e| SyncError::TokenStore {
                message: format!("opening lock file: {e}"),
            })?;
        lock.lock_exclusive().map_err(|e| SyncError::TokenStore {
            message: format!("locking token store: {e}"),
        })?;
        Ok(lock)
    }

    /// Read the stored token. Missing file and blank content read as `None`.
    pub fn load(&self) -> SyncResult<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).map_err(|e| SyncError::TokenStore {
            message: format!("reading {}: {e}", self.path.display()),
        })?;
        let token = content.trim();
        if token.is_empty() {
            Ok(None)
        } else {
            Ok(Some(token.to_string()))
        }
    }

    /// Persist a rotated token. The write is atomic; readers never observe
    /// a partial token.
    pub fn save(&self, token: &str) -> SyncResult<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(SyncError::TokenStore {
                message: "refusing to store an empty refresh token".to_string(),
            });
        }

        let lock = self.acquire_lock()?;
        let result = self.write_atomic(token);
        let _ = lock.unlock();
        result
    }

    fn write_atomic(&self, token: &str) -> SyncResult<()> {
        let parent = self.path.parent().ok_or_else(|| SyncError::TokenStore {
            message: format!("token path {} has no parent", self.path.display()),
        })?;
        let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(|e| {
            SyncError::TokenStore {
                message: format!("creating temp file: {e}"),
            }
        })?;
        writeln!(tmp, "{token}").map_err(|e| SyncError::TokenStore {
            message: format!("writing token: {e}"),
        })?;
        tmp.persist(&self.path).map_err(|e| SyncError::TokenStore {
            message: format!("persisting {}: {e}", self.path.display()),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_file_is_none() {
        let dir = tempdir().unwrap();
        let store = TokenStore::with_path(dir.path().join("refresh_token"));

        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let store = TokenStore::with_path(dir.path().join("refresh_token"));

        store.save("tok-123").unwrap();

        assert_eq!(store.load().unwrap(), Some("tok-123".to_string()));
    }

    #[test]
    fn test_save_trims_whitespace() {
        let dir = tempdir().unwrap();
        let store = TokenStore::with_path(dir.path().join("refresh_token"));

        store.save("  tok-456\n").unwrap();

        assert_eq!(store.load().unwrap(), Some("tok-456".to_string()));
    }

    #[test]
    fn test_save_overwrites_previous_token() {
        let dir = tempdir().unwrap();
        let store = TokenStore::with_path(dir.path().join("refresh_token"));

        store.save("old").unwrap();
        store.save("new").unwrap();

        assert_eq!(store.load().unwrap(), Some("new".to_string()));
    }

    #[test]
    fn test_save_empty_token_is_rejected() {
        let dir = tempdir().unwrap();
        let store = TokenStore::with_path(dir.path().join("refresh_token"));

        assert!(store.save("   ").is_err());
    }

    #[test]
    fn test_save_creates_missing_directories() {
        let dir = tempdir().unwrap();
        let store = TokenStore::with_path(dir.path().join("nested/config/refresh_token"));

        store.save("tok-789").unwrap();

        assert_eq!(store.load().unwrap(), Some("tok-789".to_string()));
    }

    #[test]
    fn test_blank_file_reads_as_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("refresh_token");
        std::fs::write(&path, "\n  \n").unwrap();
        let store = TokenStore::with_path(path);

        assert_eq!(store.load().unwrap(), None);
    }
}
