//! HTTP transport and account resolution

use std::collections::BTreeMap;
use std::sync::OnceLock;

use reqwest::header::{HeaderMap, USER_AGENT};
use reqwest::Method;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::response::{ApiError, ApiResponse};

pub const API_BASE: &str = "https://3.basecampapi.com";
pub const DEFAULT_USER_AGENT: &str = "camp-bridge (https://github.com/camp-bridge/camp-bridge)";

/// Authenticated Basecamp client.
///
/// The account id is resolved at most once per client and then reused for
/// every account-scoped endpoint.
#[derive(Debug)]
pub struct BasecampClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
    user_agent: String,
    account_id: OnceLock<String>,
}

impl BasecampClient {
    pub fn new(access_token: impl Into<String>, account_id: Option<String>) -> Self {
        let account = OnceLock::new();
        if let Some(id) = account_id.filter(|id| !id.is_empty()) {
            let _ = account.set(id);
        }
        Self {
            http: reqwest::Client::new(),
            base_url: API_BASE.to_string(),
            access_token: access_token.into(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            account_id: account,
        }
    }

    /// Point the client at another host (local fakes, proxies)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Account id if already known, without touching the network
    pub fn account_id(&self) -> Option<&str> {
        self.account_id.get().map(String::as_str)
    }

    /// Return the configured account id, or look it up via `/authorization.json`
    pub async fn ensure_account_id(&self) -> Result<String, ApiError> {
        if let Some(id) = self.account_id.get() {
            return Ok(id.clone());
        }

        let auth = self.request(Method::GET, "/authorization.json", None, &[]).await;
        let data = auth.into_result()?;
        let id = first_account_id(&data).ok_or(ApiError::NoAccount)?;

        debug!("Resolved Basecamp account id {}", id);
        let _ = self.account_id.set(id.clone());
        Ok(id)
    }

    /// Issue a request against an absolute API path (e.g. `/authorization.json`)
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
        query: &[(&str, String)],
    ) -> ApiResponse {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("{} {}", method, url);

        let mut builder = self
            .http
            .request(method, &url)
            .bearer_auth(&self.access_token)
            .header(USER_AGENT, &self.user_agent);

        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Request to {} failed: {}", url, e);
                return ApiResponse::transport_failure(e.to_string());
            }
        };

        let code = response.status().as_u16();
        let headers = flatten_headers(response.headers());
        let data = match response.bytes().await {
            Ok(bytes) => parse_body(&bytes),
            Err(e) => {
                debug!("Failed to read body from {}: {}", url, e);
                empty_object()
            }
        };

        ApiResponse {
            code,
            data,
            headers,
            error: false,
            message: None,
        }
    }

    /// Issue a request under `/{account_id}`, resolving the account first
    pub async fn account_request(
        &self,
        method: Method,
        suffix: &str,
        body: Option<&Value>,
        query: &[(&str, String)],
    ) -> ApiResponse {
        let account = match self.ensure_account_id().await {
            Ok(account) => account,
            Err(e) => return e.into(),
        };
        let endpoint = format!("/{}{}", account, suffix);
        self.request(method, &endpoint, body, query).await
    }

    pub(crate) async fn get(&self, suffix: &str, query: &[(&str, String)]) -> ApiResponse {
        self.account_request(Method::GET, suffix, None, query).await
    }

    pub(crate) async fn post(&self, suffix: &str, body: Option<&Value>) -> ApiResponse {
        self.account_request(Method::POST, suffix, body, &[]).await
    }

    pub(crate) async fn put(&self, suffix: &str, body: &Value) -> ApiResponse {
        self.account_request(Method::PUT, suffix, Some(body), &[]).await
    }

    pub(crate) async fn delete(&self, suffix: &str) -> ApiResponse {
        self.account_request(Method::DELETE, suffix, None, &[]).await
    }
}

fn first_account_id(authorization: &Value) -> Option<String> {
    let id = authorization.get("accounts")?.get(0)?.get("id")?;
    match id {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn flatten_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// Bodies that are empty or not JSON normalize to `{}`
fn parse_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap_or_else(|_| empty_object())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_body_falls_back_to_empty_object() {
        assert_eq!(parse_body(b""), json!({}));
        assert_eq!(parse_body(b"<html>"), json!({}));
        assert_eq!(parse_body(br#"[{"id":1}]"#), json!([{ "id": 1 }]));
    }

    #[test]
    fn test_first_account_id_accepts_numbers_and_strings() {
        let numeric = json!({ "accounts": [{ "id": 5798509 }, { "id": 1 }] });
        assert_eq!(first_account_id(&numeric).as_deref(), Some("5798509"));

        let text = json!({ "accounts": [{ "id": "42" }] });
        assert_eq!(first_account_id(&text).as_deref(), Some("42"));

        assert_eq!(first_account_id(&json!({ "accounts": [] })), None);
        assert_eq!(first_account_id(&json!({})), None);
    }

    #[test]
    fn test_configured_account_skips_lookup() {
        let client = BasecampClient::new("token", Some("99".to_string()));
        assert_eq!(client.account_id(), Some("99"));

        let blank = BasecampClient::new("token", Some(String::new()));
        assert_eq!(blank.account_id(), None);
    }

    #[tokio::test]
    async fn test_ensure_account_id_uses_configured_value() {
        let client = BasecampClient::new("token", Some("99".to_string()))
            .with_base_url("http://127.0.0.1:9");
        assert_eq!(client.ensure_account_id().await.unwrap(), "99");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_failure() {
        let client = BasecampClient::new("token", Some("1".to_string()))
            .with_base_url("http://127.0.0.1:9");
        let resp = client.get("/projects.json", &[]).await;
        assert!(resp.error);
        assert_eq!(resp.code, 0);
        assert!(resp.message.is_some());
    }
}
