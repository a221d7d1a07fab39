use std::fmt;
use std::fs;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::config::AppPaths;
use crate::error::AppResult;

use super::session::AuthSession;

/// Locally cached auth data. The backend session lives in a cookie; the
/// bearer token is only kept for older backends that still issue one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredCredentials {
    #[serde(default)]
    pub session_cookie: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub user: Option<AuthSession>,
}

impl StoredCredentials {
    pub fn is_empty(&self) -> bool {
        self.session_cookie.is_none() && self.access_token.is_none() && self.user.is_none()
    }
}

pub trait CredentialStore: fmt::Debug + Send + Sync {
    fn load(&self) -> AppResult<Option<StoredCredentials>>;
    fn save(&self, credentials: &StoredCredentials) -> AppResult<()>;
    fn clear(&self) -> AppResult<()>;
}

#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    paths: AppPaths,
    profile: String,
}

impl FileCredentialStore {
    pub fn new(paths: AppPaths, profile: &str) -> Self {
        Self {
            paths,
            profile: profile.to_string(),
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> AppResult<Option<StoredCredentials>> {
        let path = self.paths.credentials_file(&self.profile);
        if !path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(path)?;
        let credentials = serde_json::from_str(&raw)?;
        Ok(Some(credentials))
    }

    fn save(&self, credentials: &StoredCredentials) -> AppResult<()> {
        let path = self.paths.credentials_file(&self.profile);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let payload = serde_json::to_string_pretty(credentials)?;
        fs::write(&path, payload)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let mut perms = fs::metadata(&path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&path, perms)?;
        }

        Ok(())
    }

    fn clear(&self) -> AppResult<()> {
        let path = self.paths.credentials_file(&self.profile);
        if path.exists() {
            fs::remove_file(path)?;
        }

        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: Mutex<Option<StoredCredentials>>,
}

impl MemoryCredentialStore {
    pub fn with(credentials: StoredCredentials) -> Self {
        Self {
            inner: Mutex::new(Some(credentials)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> AppResult<Option<StoredCredentials>> {
        Ok(self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, credentials: &StoredCredentials) -> AppResult<()> {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = Some(credentials.clone());
        Ok(())
    }

    fn clear(&self) -> AppResult<()> {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trips_and_clears() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = AppPaths::rooted(dir.path()).expect("paths");
        let store = FileCredentialStore::new(paths, "work");

        assert_eq!(store.load().expect("load"), None);

        let credentials = StoredCredentials {
            session_cookie: Some("session=abc".to_string()),
            access_token: None,
            user: None,
        };
        store.save(&credentials).expect("save");
        assert_eq!(store.load().expect("load"), Some(credentials));

        store.clear().expect("clear");
        assert_eq!(store.load().expect("load"), None);
    }
}
