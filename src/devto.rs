//! DEV (Forem) HTTP client, the real [`ArticleApi`] behind the CLI.
//!
//! Only the three endpoints the sync needs are wrapped. Every non-2xx answer
//! becomes [`ApiError::Status`] with the platform's own message, so the core
//! can tell a rate limit from a missing article.

use anyhow::{Context, Result};
use async_trait::async_trait;
use blogsync_core::contract::{ArticleApi, RemoteArticle, Visibility};
use blogsync_core::error::ApiError;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

pub struct DevtoClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

/// `{"error": "not found", "status": 404}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl DevtoClient {
    pub fn new(base_url: &str, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent(concat!("blogsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;
        tracing::debug!(base_url, api_key_set = !api_key.is_empty(), "Initialized DevtoClient");

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, ApiError> {
        let url = format!("{}{path}", self.base_url);
        let payload = body.as_ref().map(|b| b.to_string());
        tracing::debug!(curl = %curl_command(method.as_str(), &url, payload.as_deref()), "HTTP request");

        let mut request = self
            .client
            .request(method, &url)
            .header("Api-Key", &self.api_key)
            .header("Accept", "application/json");
        if let Some(payload) = payload {
            request = request
                .header("Content-Type", "application/json")
                .body(payload);
        }

        let response = request.send().await.map_err(|e| ApiError::Transport {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        let status = response.status();
        let text = response.text().await.map_err(|e| ApiError::Transport {
            path: path.to_string(),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            let err = error_from_body(status.as_u16(), &text);
            tracing::debug!(path, status = status.as_u16(), error = %err, "HTTP error");
            return Err(err);
        }

        serde_json::from_str(&text).map_err(|e| ApiError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl ArticleApi for DevtoClient {
    async fn list_my_articles(
        &self,
        visibility: Visibility,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<RemoteArticle>, ApiError> {
        let path = format!(
            "/api/articles/me/{}?page={page}&per_page={per_page}",
            visibility.as_str()
        );
        self.send(Method::GET, &path, None).await
    }

    async fn get_article(&self, id: i64) -> Result<RemoteArticle, ApiError> {
        self.send(Method::GET, &format!("/api/articles/{id}"), None).await
    }

    async fn update_article(&self, id: i64, body_markdown: &str) -> Result<RemoteArticle, ApiError> {
        let body = json!({ "article": { "body_markdown": body_markdown } });
        self.send(Method::PUT, &format!("/api/articles/{id}"), Some(body))
            .await
    }
}

/// Turn a non-2xx response into an [`ApiError::Status`], preferring the
/// `error` field of a JSON body over the raw text.
pub fn error_from_body(status: u16, body: &str) -> ApiError {
    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("unknown error")
            .to_string(),
    };
    ApiError::Status { status, message }
}

/// The request as a `curl` command line, API key redacted.
pub fn curl_command(method: &str, url: &str, body: Option<&str>) -> String {
    let mut cmd = format!(
        "curl -X {method} {} -H 'Api-Key: <redacted>' -H 'Accept: application/json'",
        shell_quote(url)
    );
    if let Some(body) = body {
        cmd.push_str(" -H 'Content-Type: application/json' -d ");
        cmd.push_str(&shell_quote(body));
    }
    cmd
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
