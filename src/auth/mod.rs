//! Authentication module for Basecamp
//!
//! Implements the Launchpad OAuth2 "web_server" flow: a loopback redirect
//! listener captures the authorization code, which is exchanged for an
//! access/refresh token pair. Later runs use the refresh grant instead.

pub mod browser;
pub mod listener;
pub mod oauth;
pub mod tokens;

use std::path::PathBuf;

pub use browser::{Browser, SystemBrowser};
pub use oauth::{login, logout, status};
pub use tokens::{TokenResponse, TokenStore};

const LAUNCHPAD_AUTHORIZE_URL: &str = "https://launchpad.37signals.com/authorization/new";
const LAUNCHPAD_TOKEN_URL: &str = "https://launchpad.37signals.com/authorization/token";

/// Launchpad endpoint configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Consent page opened in the browser
    pub authorize_url: String,
    /// Token exchange / refresh endpoint
    pub token_url: String,
    /// Loopback port the redirect listener binds
    pub redirect_port: u16,
}

impl AuthConfig {
    pub fn launchpad(redirect_port: u16) -> Self {
        Self {
            authorize_url: LAUNCHPAD_AUTHORIZE_URL.to_string(),
            token_url: LAUNCHPAD_TOKEN_URL.to_string(),
            redirect_port,
        }
    }

    /// Redirect URI registered with the Launchpad application.
    pub fn redirect_uri(&self) -> String {
        format!("http://127.0.0.1:{}/", self.redirect_port)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token store has no client_id/client_secret; pass --client-id and --client-secret to login")]
    MissingClientCredentials,

    #[error("no refresh token stored")]
    MissingRefreshToken,

    #[error("invalid OAuth endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("redirect listener on port {port} failed")]
    Listener {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("token request failed")]
    Transport(#[from] reqwest::Error),

    #[error("token endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("token endpoint returned an unexpected body")]
    InvalidResponse(#[from] serde_json::Error),

    #[error("failed to access token store {}", .path.display())]
    StoreIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse token store {}", .path.display())]
    StoreParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize token store")]
    StoreSerialize(#[from] toml::ser::Error),

    #[error("token refresh failed; run 'basecamp-cli login --force' to sign in again")]
    Refresh(#[source] Box<AuthError>),
}
