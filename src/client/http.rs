use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::client::{
    error::{ClientError, ClientResult},
    tokens::{MemoryTokenStore, TokenStore},
};

/// Uniform timeout for every call, the refresh call included. A timeout is a
/// transport failure and maps to `ClientError::Network`.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const REFRESH_PATH: &str = "/auth/refresh-token";

/// HTTP client for the goaltrack REST API.
///
/// Every request runs through the same pipeline: attach the stored access
/// token as a bearer credential, send, and on a 401 attempt exactly one
/// refresh followed by one replay of the original request. The replay does
/// not re-enter the refresh path, so a rejected replay terminates with
/// `SessionExpired` rather than looping.
pub struct ApiClient {
    base_url: String,
    http: ReqwestClient,
    tokens: Arc<dyn TokenStore>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_token_store(base_url, Arc::new(MemoryTokenStore::default()))
    }

    pub fn with_token_store(base_url: &str, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: ReqwestClient::new(),
            tokens,
        }
    }

    pub fn set_tokens(&self, access_token: &str, refresh_token: &str) {
        self.tokens.set_tokens(access_token, refresh_token);
    }

    pub fn clear_tokens(&self) {
        self.tokens.clear();
    }

    pub fn is_authenticated(&self) -> bool {
        stored(self.tokens.access_token()).is_some()
    }

    // --- verbs ---

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let resp = self.run(Method::GET, path, None).await?;
        resp.json().await.map_err(ClientError::Decode)
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let body = serde_json::to_value(body)?;
        let resp = self.run(Method::POST, path, Some(body)).await?;
        resp.json().await.map_err(ClientError::Decode)
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let body = serde_json::to_value(body)?;
        let resp = self.run(Method::PUT, path, Some(body)).await?;
        resp.json().await.map_err(ClientError::Decode)
    }

    pub async fn patch<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let body = serde_json::to_value(body)?;
        let resp = self.run(Method::PATCH, path, Some(body)).await?;
        resp.json().await.map_err(ClientError::Decode)
    }

    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        self.run(Method::DELETE, path, None).await?;
        Ok(())
    }

    /// Post discarding the response body.
    pub async fn post_empty(&self, path: &str) -> ClientResult<()> {
        self.run(Method::POST, path, None).await?;
        Ok(())
    }

    // --- interceptor pipeline ---

    async fn run(&self, method: Method, path: &str, body: Option<Value>) -> ClientResult<Response> {
        let token = stored(self.tokens.access_token());
        let resp = self
            .dispatch(&method, path, body.as_ref(), token.as_deref())
            .await?;

        if resp.status() != StatusCode::UNAUTHORIZED {
            return check(resp).await;
        }

        // 401: at most one refresh-then-replay
        let Some(refresh_token) = stored(self.tokens.refresh_token()) else {
            self.tokens.clear();
            return Err(ClientError::Unauthorized);
        };

        debug!(%method, path, "access token rejected, refreshing session");
        let pair = match self.refresh_session(&refresh_token).await {
            Ok(pair) => pair,
            Err(e) => {
                debug!(error = %e, "refresh failed");
                self.tokens.clear();
                return Err(ClientError::SessionExpired);
            }
        };
        self.tokens
            .set_tokens(&pair.access_token, &pair.refresh_token);

        let replay = self
            .dispatch(&method, path, body.as_ref(), Some(&pair.access_token))
            .await?;
        if replay.status() == StatusCode::UNAUTHORIZED {
            // New token rejected too; do not refresh again
            self.tokens.clear();
            return Err(ClientError::SessionExpired);
        }
        check(replay).await
    }

    async fn refresh_session(&self, refresh_token: &str) -> ClientResult<TokenPair> {
        let body = serde_json::json!({ "refresh_token": refresh_token });
        let resp = self
            .dispatch(&Method::POST, REFRESH_PATH, Some(&body), None)
            .await?;
        let resp = check(resp).await?;
        resp.json().await.map_err(ClientError::Decode)
    }

    fn build(
        &self,
        method: &Method,
        path: &str,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self
            .http
            .request(method.clone(), &url)
            .timeout(REQUEST_TIMEOUT);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        req
    }

    async fn dispatch(
        &self,
        method: &Method,
        path: &str,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> ClientResult<Response> {
        self.build(method, path, body, token)
            .send()
            .await
            .map_err(ClientError::Network)
    }
}

/// Minimal view of a refresh response; only the rotated pair matters here.
#[derive(Debug, serde::Deserialize)]
struct TokenPair {
    access_token: String,
    refresh_token: String,
}

/// Empty strings count as no token at all.
fn stored(token: Option<String>) -> Option<String> {
    token.filter(|t| !t.is_empty())
}

/// Map a non-success response to a typed error carrying the server's message.
async fn check(resp: Response) -> ClientResult<Response> {
    let status = resp.status();
    if status.is_success() || status.is_redirection() {
        return Ok(resp);
    }
    let body: Option<Value> = resp.json().await.ok();
    let message = body
        .as_ref()
        .and_then(|b| b.get("message"))
        .and_then(|m| m.as_str())
        .unwrap_or("An unexpected error occurred")
        .to_string();
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_token_counts_as_absent() {
        assert_eq!(stored(Some(String::new())), None);
        assert_eq!(stored(Some("tok".into())).as_deref(), Some("tok"));
        assert_eq!(stored(None), None);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::new("http://localhost:8000/api/");
        assert_eq!(client.base_url, "http://localhost:8000/api");
    }
}
