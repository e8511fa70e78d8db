//! Authenticated HTTP client for the Basecamp API
//!
//! Wraps reqwest::Client with bearer token injection. The client owns its
//! token; nothing is shared through globals.

use url::Url;

const API_BASE: &str = "https://3.basecampapi.com";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("no access token has been acquired; run 'basecamp-cli login'")]
    NotAuthenticated,

    #[error("relative path {0:?} needs a Basecamp account; pass --account")]
    NoAccount(String),

    #[error("invalid API URL")]
    InvalidUrl(#[from] url::ParseError),

    #[error("GET {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("401 Unauthorized for {0}. Token may be invalid -- run 'basecamp-cli login'.")]
    Unauthorized(String),

    #[error("HTTP {status} for {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },
}

/// Authenticated GET access to one Basecamp account.
pub struct BasecampClient {
    http: reqwest::Client,
    /// `https://3.basecampapi.com/<account>/`, absent when no account is set
    base_url: Option<Url>,
    user_agent: String,
    access_token: Option<String>,
}

impl BasecampClient {
    pub fn new(account_id: Option<&str>, user_agent: &str) -> Result<Self, ApiError> {
        let base_url = account_id
            .map(|account| Url::parse(&format!("{}/{}/", API_BASE, account)))
            .transpose()?;
        Ok(Self::with_base_url(base_url, user_agent))
    }

    /// Client rooted at an arbitrary base URL (which should end in `/`).
    pub fn with_base_url(base_url: Option<Url>, user_agent: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            user_agent: user_agent.to_string(),
            access_token: None,
        }
    }

    pub fn set_access_token(&mut self, token: String) {
        self.access_token = Some(token);
    }

    /// Absolute http(s) URLs pass through, anything else is taken relative
    /// to the account base.
    pub fn resolve(&self, path_or_url: &str) -> Result<Url, ApiError> {
        if let Ok(url) = Url::parse(path_or_url) {
            if matches!(url.scheme(), "http" | "https") {
                return Ok(url);
            }
        }

        let base = self
            .base_url
            .as_ref()
            .ok_or_else(|| ApiError::NoAccount(path_or_url.to_string()))?;
        Ok(base.join(path_or_url.trim_start_matches('/'))?)
    }

    /// GET a path under the account (e.g. `projects.json`) or a full URL.
    pub async fn get(&self, path_or_url: &str) -> Result<reqwest::Response, ApiError> {
        let token = self.access_token.as_deref().ok_or(ApiError::NotAuthenticated)?;
        let url = self.resolve(path_or_url)?;
        tracing::debug!("GET {}", url);

        let resp = self
            .http
            .get(url.clone())
            .bearer_auth(token)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.to_string(),
                source,
            })?;

        let resp = check_response(resp, url.as_str()).await?;

        // Pagination isn't followed; just note that more is available.
        if let Some(next) = next_page(resp.headers()) {
            tracing::debug!("More results available at {}", next);
        }

        Ok(resp)
    }
}

/// Target of a `Link: <...>; rel="next"` header, if present.
pub fn next_page(headers: &reqwest::header::HeaderMap) -> Option<String> {
    headers
        .get_all(reqwest::header::LINK)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .find_map(|link| {
            let (target, params) = link.split_once(';')?;
            let is_next = params
                .split(';')
                .any(|p| matches!(p.trim(), "rel=\"next\"" | "rel=next"));
            if !is_next {
                return None;
            }
            let target = target.trim().strip_prefix('<')?.strip_suffix('>')?;
            Some(target.to_string())
        })
}

/// Check HTTP response status code and return a clear error on failure.
async fn check_response(resp: reqwest::Response, url: &str) -> Result<reqwest::Response, ApiError> {
    let status = resp.status();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized(url.to_string()));
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ApiError::Status {
            status: status.as_u16(),
            url: url.to_string(),
            body,
        });
    }
    Ok(resp)
}
