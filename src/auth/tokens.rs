//! Token storage and management

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::AuthError;

/// Persisted client credentials and current tokens.
///
/// Stored as a flat TOML record. Every field is optional so a freshly created
/// store (or a hand-written one holding only the client credentials) loads
/// cleanly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenStore {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds, as last reported by Launchpad
    pub expires_in: Option<u64>,
}

/// Body of a successful token exchange or refresh.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
}

impl TokenStore {
    /// Load the store from `path`, or start empty if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self, AuthError> {
        if !path.exists() {
            tracing::debug!("No token store at {}, starting empty", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| AuthError::StoreIo {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| AuthError::StoreParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overwrite `path` with the current contents of the store.
    pub fn save(&self, path: &Path) -> Result<(), AuthError> {
        let io_err = |source: std::io::Error| AuthError::StoreIo {
            path: path.to_path_buf(),
            source,
        };

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(io_err)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(io_err)?;

        // Restrict permissions, the file holds the client secret and tokens
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(io_err)?;
        }

        tracing::debug!("Token store written to {}", path.display());
        Ok(())
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Fold a token response into the store. Fields the response omits keep
    /// their stored values.
    pub fn merge(&mut self, response: &TokenResponse) {
        self.access_token = Some(response.access_token.clone());
        if let Some(ref rt) = response.refresh_token {
            self.refresh_token = Some(rt.clone());
        }
        if let Some(secs) = response.expires_in {
            self.expires_in = Some(secs);
        }
    }

    /// Replace the client credentials, keeping any cached tokens.
    pub fn set_client_credentials(&mut self, client_id: String, client_secret: String) {
        self.client_id = Some(client_id);
        self.client_secret = Some(client_secret);
    }

    /// Drop the cached tokens; the client credentials stay.
    pub fn clear_tokens(&mut self) {
        self.access_token = None;
        self.refresh_token = None;
        self.expires_in = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> TokenStore {
        TokenStore {
            client_id: Some("client-1".to_string()),
            client_secret: Some("secret-1".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::load(&dir.path().join("tokens.toml")).unwrap();
        assert_eq!(store, TokenStore::default());
        assert!(!store.has_access_token());
    }

    #[test]
    fn test_merge_full_response() {
        let mut store = credentials();
        store.merge(&TokenResponse {
            access_token: "T1".to_string(),
            refresh_token: Some("R1".to_string()),
            expires_in: Some(1_209_600),
        });

        assert_eq!(
            store,
            TokenStore {
                client_id: Some("client-1".to_string()),
                client_secret: Some("secret-1".to_string()),
                access_token: Some("T1".to_string()),
                refresh_token: Some("R1".to_string()),
                expires_in: Some(1_209_600),
            }
        );
    }

    #[test]
    fn test_merge_keeps_omitted_fields() {
        let mut store = credentials();
        store.access_token = Some("T1".to_string());
        store.refresh_token = Some("R1".to_string());
        store.expires_in = Some(1_209_600);

        let response: TokenResponse = serde_json::from_str(r#"{"access_token":"T2"}"#).unwrap();
        store.merge(&response);

        assert_eq!(store.access_token.as_deref(), Some("T2"));
        assert_eq!(store.refresh_token.as_deref(), Some("R1"));
        assert_eq!(store.expires_in, Some(1_209_600));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tokens.toml");

        let mut store = credentials();
        store.access_token = Some("T1".to_string());
        store.save(&path).unwrap();

        assert_eq!(TokenStore::load(&path).unwrap(), store);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.toml");
        fs::write(&path, "access_token = [").unwrap();
        assert!(matches!(
            TokenStore::load(&path),
            Err(AuthError::StoreParse { .. })
        ));
    }

    #[test]
    fn test_clear_tokens_keeps_credentials() {
        let mut store = credentials();
        store.access_token = Some("T1".to_string());
        store.refresh_token = Some("R1".to_string());
        store.expires_in = Some(10);
        store.clear_tokens();
        assert_eq!(store, credentials());
    }
}
