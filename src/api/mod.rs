//! API client module for Basecamp

pub mod client;
mod me;
mod projects;

use anyhow::{Context, Result};

pub use client::BasecampClient;

use crate::config::Settings;

/// Build a client for the configured account and hand it a fresh token.
pub async fn connect(settings: &Settings) -> Result<BasecampClient> {
    let mut client = BasecampClient::new(settings.account_id.as_deref(), &settings.user_agent)?;
    let token = crate::auth::oauth::acquire(settings)
        .await
        .context("Could not obtain an access token")?;
    client.set_access_token(token);
    Ok(client)
}

/// GET a path or URL and print the body (pretty-printed when it is JSON)
pub async fn get(settings: &Settings, path_or_url: &str) -> Result<()> {
    let client = connect(settings).await?;
    let resp = client.get(path_or_url).await?;
    let body = resp.text().await.context("Failed to read response body")?;
    println!("{}", pretty_body(&body));
    Ok(())
}

/// Show the signed-in identity and its accounts
pub async fn whoami(settings: &Settings) -> Result<()> {
    let client = connect(settings).await?;
    me::whoami(&client).await
}

/// List projects in the configured account
pub async fn list_projects(settings: &Settings) -> Result<()> {
    settings.account_id()?;
    let client = connect(settings).await?;
    projects::list_projects(&client).await
}

fn pretty_body(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| serde_json::to_string_pretty(&v).ok())
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pretty_body() {
        assert_eq!(pretty_body(r#"{"a":1}"#), "{\n  \"a\": 1\n}");
        assert_eq!(pretty_body("plain text"), "plain text");
    }
}
