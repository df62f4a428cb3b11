// HTTP layer for the upstream endpoints.
// Builds the authenticated client and retries transient failures without backoff.

use std::future::Future;

use reqwest::{
    Client, Response, StatusCode,
    header::{ACCEPT, AUTHORIZATION, COOKIE, HeaderMap, HeaderValue, USER_AGENT},
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{GlossError, Result};
use crate::options::EngineOptions;

const GITHUB_API_VERSION: &str = "2022-11-28";

/// Per-request knobs layered over the client defaults.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Accept header override (stargazer media type, traffic JSON).
    pub accept: Option<&'static str>,
    /// Attach the embedder's session cookie to the request.
    pub credentials: bool,
}

/// HTTP client wrapper that classifies failures and retries the transient ones.
///
/// Redirects are not followed: an authentication redirect must surface as its
/// status so it can be reported as a login-required condition instead of being
/// retried.
pub struct RetryingFetcher {
    client: Client,
    session_cookie: Option<String>,
    max_attempts: u32,
}

impl RetryingFetcher {
    /// Build a client with the standard API headers and optional bearer token.
    pub fn new(options: &EngineOptions) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("gloss"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );
        if let Some(token) = &options.api_token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| GlossError::Config(e.to_string()))?,
            );
        }

        let client = Client::builder()
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            session_cookie: options.session_cookie.clone(),
            max_attempts: options.max_attempts,
        })
    }

    /// Make a GET request, retrying per the configured attempt budget.
    pub async fn get(&self, url: &str, opts: &FetchOptions) -> Result<Response> {
        retry(self.max_attempts, move || self.send_once(url, opts)).await
    }

    /// Make a GET request and decode the accepted response body.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, opts: &FetchOptions) -> Result<T> {
        let response = self.get(url, opts).await?;
        Ok(response.json().await?)
    }

    async fn send_once(&self, url: &str, opts: &FetchOptions) -> Result<Response> {
        let mut request = self.client.get(url);
        if let Some(accept) = opts.accept {
            request = request.header(ACCEPT, accept);
        }
        if opts.credentials {
            if let Some(cookie) = &self.session_cookie {
                request = request.header(COOKIE, cookie.as_str());
            }
        }

        let response = request.send().await?;
        check_response(response)
    }
}

/// Run `op` up to `max_attempts` times, returning the first success.
/// Non-retryable errors fail immediately; the final attempt's error
/// propagates as-is. At least one attempt is always made.
pub async fn retry<T, F, Fut>(max_attempts: u32, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = max_attempts.max(1);
    for attempt in 1..attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) => debug!(attempt, error = %err, "request failed, retrying"),
        }
    }
    op().await
}

/// Map a non-success status to its failure class, or pass the response through.
fn check_response(response: Response) -> Result<Response> {
    match status_error(response.status(), response.url().as_str()) {
        None => Ok(response),
        Some(err) => Err(err),
    }
}

fn status_error(status: StatusCode, url: &str) -> Option<GlossError> {
    if status.is_success() {
        return None;
    }
    if status == StatusCode::UNAUTHORIZED || status.is_redirection() {
        return Some(GlossError::LoginRequired {
            url: url.to_string(),
        });
    }
    Some(GlossError::UpstreamStatus {
        status,
        url: url.to_string(),
    })
}
