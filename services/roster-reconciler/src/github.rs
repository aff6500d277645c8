use crate::auth::{AppAssertion, InstallationToken};
use crate::config::GithubConfig;
use crate::errors::{Result, SyncError};
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::{header, Client, Response};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error};

const GITHUB_JSON: &str = "application/vnd.github+json";

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    token: String,
    #[serde(default)]
    expires_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

/// Client for the two hosting-service calls the sync needs
pub struct GithubClient {
    api_url: String,
    client: Client,
}

impl GithubClient {
    pub fn new(api_url: impl Into<String>, user_agent: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(GithubClient {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &GithubConfig) -> Result<Self> {
        Self::new(config.api_url.clone(), &config.user_agent, config.timeout_secs)
    }

    /// Exchange an app assertion for an installation access token
    pub async fn exchange_installation_token(
        &self,
        installation_id: &str,
        assertion: &AppAssertion,
    ) -> Result<InstallationToken> {
        let url = format!(
            "{}/app/installations/{}/access_tokens",
            self.api_url, installation_id
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(assertion.expose())
            .header(header::ACCEPT, GITHUB_JSON)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to request installation token: {}", e);
                SyncError::TokenExchange(format!("Token request failed: {}", e))
            })?;

        let response = ensure_success(response)
            .await
            .map_err(SyncError::TokenExchange)?;

        let body = response.json::<AccessTokenResponse>().await.map_err(|e| {
            SyncError::TokenExchange(format!("Failed to parse token response: {}", e))
        })?;

        if let Some(expires_at) = &body.expires_at {
            debug!("Installation token expires at {}", expires_at);
        }

        Ok(InstallationToken::new(body.token))
    }

    /// Fetch a repository file and return it as UTF-8 text
    pub async fn fetch_file_contents(
        &self,
        token: &InstallationToken,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<String> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_url,
            owner,
            repo,
            path.trim_start_matches('/')
        );

        let fetch_error = |message: String| SyncError::Fetch {
            path: format!("{}/{}/{}", owner, repo, path),
            message,
        };

        let response = self
            .client
            .get(&url)
            .header(header::AUTHORIZATION, format!("token {}", token.expose()))
            .header(header::ACCEPT, GITHUB_JSON)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to fetch {}: {}", url, e);
                fetch_error(format!("Request failed: {}", e))
            })?;

        let response = ensure_success(response).await.map_err(fetch_error)?;

        let body = response
            .json::<ContentResponse>()
            .await
            .map_err(|e| fetch_error(format!("Failed to parse contents response: {}", e)))?;

        match body.encoding.as_deref() {
            None | Some("base64") => decode_content(&body.content),
            Some(other) => Err(SyncError::Decode(format!(
                "unsupported content encoding '{}'",
                other
            ))),
        }
    }
}

/// Turn a non-2xx response into an error message carrying status and body
async fn ensure_success(response: Response) -> std::result::Result<Response, String> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let error_text = response.text().await.unwrap_or_default();
    Err(format!("status {}: {}", status, error_text))
}

/// Decode the base64 `content` field of a contents response.
///
/// The service wraps the payload at 60 columns, so whitespace is dropped
/// before decoding.
pub fn decode_content(encoded: &str) -> Result<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();

    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| SyncError::Decode(format!("invalid base64: {}", e)))?;

    String::from_utf8(bytes).map_err(|e| SyncError::Decode(format!("invalid UTF-8: {}", e)))
}
