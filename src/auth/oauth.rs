//! Launchpad OAuth2 "web_server" flow: interactive authorization, code
//! exchange and refresh

use std::path::Path;

use anyhow::{Context, Result};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, RedirectUrl, RefreshToken, TokenUrl,
};
use url::Url;

use super::listener::RedirectListener;
use super::{AuthConfig, AuthError, Browser, SystemBrowser, TokenResponse, TokenStore};
use crate::config::Settings;

/// Drives token acquisition against Launchpad.
pub struct Authenticator<B = SystemBrowser> {
    http: reqwest::Client,
    config: AuthConfig,
    browser: B,
}

impl Authenticator<SystemBrowser> {
    pub fn new(config: AuthConfig) -> Self {
        Self::with_browser(config, SystemBrowser)
    }
}

impl<B: Browser> Authenticator<B> {
    pub fn with_browser(config: AuthConfig, browser: B) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            browser,
        }
    }

    fn redirect_url(&self) -> Result<RedirectUrl, AuthError> {
        Ok(RedirectUrl::new(self.config.redirect_uri())?)
    }

    /// Consent page URL carrying our client id and redirect URI.
    pub fn authorization_url(&self, client_id: &ClientId) -> Result<Url, AuthError> {
        let auth_url = AuthUrl::new(self.config.authorize_url.clone())?;
        let redirect_url = self.redirect_url()?;

        let mut url = auth_url.url().clone();
        url.query_pairs_mut()
            .append_pair("type", "web_server")
            .append_pair("client_id", client_id.as_str())
            .append_pair("redirect_uri", redirect_url.url().as_str());
        Ok(url)
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(
        &self,
        client_id: &ClientId,
        client_secret: &ClientSecret,
        code: &AuthorizationCode,
    ) -> Result<TokenResponse, AuthError> {
        let redirect_url = self.redirect_url()?;
        self.request_token(&[
            ("type", "web_server"),
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.secret().as_str()),
            ("redirect_uri", redirect_url.url().as_str()),
            ("code", code.secret().as_str()),
        ])
        .await
    }

    /// Trade a refresh token for a new access token.
    pub async fn refresh(
        &self,
        client_id: &ClientId,
        client_secret: &ClientSecret,
        refresh_token: &RefreshToken,
    ) -> Result<TokenResponse, AuthError> {
        let redirect_url = self.redirect_url()?;
        self.request_token(&[
            ("type", "refresh"),
            ("refresh_token", refresh_token.secret().as_str()),
            ("client_id", client_id.as_str()),
            ("redirect_uri", redirect_url.url().as_str()),
            ("client_secret", client_secret.secret().as_str()),
        ])
        .await
    }

    /// POST to the token endpoint. Launchpad takes every parameter in the
    /// query string and an empty body.
    async fn request_token(&self, params: &[(&str, &str)]) -> Result<TokenResponse, AuthError> {
        let token_url = TokenUrl::new(self.config.token_url.clone())?;
        let mut url = token_url.url().clone();
        url.query_pairs_mut().extend_pairs(params);

        tracing::debug!("POST {}", token_url.url());

        let resp = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_LENGTH, "0")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Bind the redirect listener, send the user to the consent page and
    /// wait for the code to come back.
    async fn authorize(&self, client_id: &ClientId) -> Result<AuthorizationCode, AuthError> {
        // Bind first so the redirect can't beat the socket
        let listener = RedirectListener::bind(self.config.redirect_port).await?;
        let url = self.authorization_url(client_id)?;

        match self.browser.open(&url) {
            Ok(()) => println!("Opened your browser to authorize basecamp-cli."),
            Err(e) => {
                tracing::warn!("Could not open browser: {}", e);
                println!();
                println!("To sign in, visit: {}", url);
                println!();
            }
        }

        tracing::info!(
            "Waiting for the authorization redirect on port {}...",
            listener.port()
        );
        listener.wait_for_code().await
    }

    /// Produce an access token for `store`, refreshing when one is already
    /// cached and running the interactive flow otherwise. The store is
    /// rewritten to `path` on success and left untouched on failure.
    pub async fn get_access_token(
        &self,
        store: &mut TokenStore,
        path: &Path,
    ) -> Result<String, AuthError> {
        let (client_id, client_secret) = client_credentials(store)?;

        let response = if store.has_access_token() {
            tracing::info!("Cached access token found, refreshing...");
            let refresh_token = store
                .refresh_token
                .clone()
                .filter(|t| !t.is_empty())
                .map(RefreshToken::new)
                .ok_or_else(|| AuthError::Refresh(Box::new(AuthError::MissingRefreshToken)))?;
            self.refresh(&client_id, &client_secret, &refresh_token)
                .await
                .map_err(|e| AuthError::Refresh(Box::new(e)))?
        } else {
            let code = self.authorize(&client_id).await?;
            tracing::info!("Exchanging authorization code for tokens...");
            self.exchange_code(&client_id, &client_secret, &code).await?
        };

        store.merge(&response);
        store.save(path)?;
        Ok(response.access_token)
    }
}

fn client_credentials(store: &TokenStore) -> Result<(ClientId, ClientSecret), AuthError> {
    match (store.client_id.as_deref(), store.client_secret.as_deref()) {
        (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => Ok((
            ClientId::new(id.to_string()),
            ClientSecret::new(secret.to_string()),
        )),
        _ => Err(AuthError::MissingClientCredentials),
    }
}

/// Acquire a token with the settings' store and endpoints and return it.
pub async fn acquire(settings: &Settings) -> Result<String> {
    let path = settings.token_store_path()?;
    let mut store = TokenStore::load(&path)?;
    let authenticator = Authenticator::new(settings.auth_config());
    Ok(authenticator.get_access_token(&mut store, &path).await?)
}

/// Perform the login flow
pub async fn login(
    settings: &Settings,
    force: bool,
    client_id: Option<String>,
    client_secret: Option<String>,
) -> Result<()> {
    let path = settings.token_store_path()?;
    let mut store = TokenStore::load(&path)?;

    match (client_id, client_secret) {
        (Some(id), Some(secret)) => store.set_client_credentials(id, secret),
        (None, None) => {}
        _ => anyhow::bail!("--client-id and --client-secret must be given together"),
    }

    if force && store.has_access_token() {
        tracing::info!("Discarding cached access token (--force)");
        store.access_token = None;
    }

    let refreshing = store.has_access_token();
    let authenticator = Authenticator::new(settings.auth_config());
    authenticator
        .get_access_token(&mut store, &path)
        .await
        .context("Login failed")?;

    if refreshing {
        println!("Token refreshed successfully.");
    } else {
        println!("Login successful.");
    }
    Ok(())
}

/// Clear stored tokens, keeping the client credentials
pub async fn logout(settings: &Settings) -> Result<()> {
    let path = settings.token_store_path()?;
    let mut store = TokenStore::load(&path)?;
    store.clear_tokens();
    store.save(&path)?;
    println!("Logged out.");
    Ok(())
}

/// Display current auth status
pub async fn status(settings: &Settings) -> Result<()> {
    let path = settings.token_store_path()?;
    let store = TokenStore::load(&path)?;

    println!("Token store: {}", path.display());

    match store.client_id {
        Some(ref id) => println!("Client ID:   {}", id),
        None => println!("Client ID:   none"),
    }
    match store.client_secret {
        Some(_) => println!("Client sec:  present"),
        None => println!("Client sec:  none"),
    }

    if store.has_access_token() {
        println!("Access tok:  present");
        if let Some(secs) = store.expires_in {
            println!("  expires_in: {}s (at issue)", secs);
        }
    } else {
        println!("Access tok:  none");
    }

    match store.refresh_token {
        Some(_) => println!("Refresh tok: present"),
        None => println!("Refresh tok: none"),
    }

    match settings.account_id {
        Some(ref account) => println!("Account:     {}", account),
        None => println!("Account:     not configured"),
    }

    if !store.has_access_token() {
        println!("\nRun 'basecamp-cli login' to authenticate.");
    }

    Ok(())
}
