//! HTTP utilities for OneView REST API calls

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// API version sent when none is configured
pub const DEFAULT_API_VERSION: u32 = 300;

/// Header carrying the session token
pub const AUTH_HEADER: &str = "Auth";

/// Header selecting the REST API version
pub const API_VERSION_HEADER: &str = "X-API-Version";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = (0..=MAX_LOG_BODY_LENGTH)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Pull `errorCode` and `message` out of an appliance error document
fn error_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let code = value.get("errorCode").and_then(|v| v.as_str());
    let message = value.get("message").and_then(|v| v.as_str());

    match (code, message) {
        (Some(code), Some(message)) => Some(format!("{}: {}", code, message)),
        (Some(code), None) => Some(code.to_string()),
        (None, Some(message)) => Some(message.to_string()),
        (None, None) => None,
    }
}

/// HTTP client wrapper for OneView API calls
#[derive(Clone)]
pub struct OneViewHttpClient {
    client: Client,
    base_url: Url,
    api_version: u32,
}

impl OneViewHttpClient {
    /// Create a new HTTP client for the appliance at `base_url`
    pub fn new(base_url: &str, api_version: u32, insecure: bool) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid appliance address: {}", base_url))?;

        if insecure {
            tracing::warn!("TLS certificate verification disabled for {}", base_url);
        }

        let client = Client::builder()
            .user_agent(concat!("ovindex/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(insecure)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url,
            api_version,
        })
    }

    pub fn api_version(&self) -> u32 {
        self.api_version
    }

    pub fn set_api_version(&mut self, api_version: u32) {
        self.api_version = api_version;
    }

    /// Resolve an appliance path such as `/rest/index/resources?category=x`
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }

    fn prepare(&self, request: RequestBuilder, session: Option<&str>) -> RequestBuilder {
        let request = request
            .header(API_VERSION_HEADER, self.api_version.to_string())
            .header(reqwest::header::ACCEPT_LANGUAGE, "en_US");

        match session {
            Some(token) => request.header(AUTH_HEADER, token),
            None => request,
        }
    }

    /// Make a GET request to a OneView API
    pub async fn get(&self, path: &str, session: Option<&str>) -> Result<Value> {
        let url = self.url(path);
        tracing::debug!("GET {}", url);

        let request = self.prepare(self.client.get(&url), session);
        self.send(request).await
    }

    /// Make a POST request to a OneView API
    pub async fn post(&self, path: &str, session: Option<&str>, body: Option<&Value>) -> Result<Value> {
        let url = self.url(path);
        tracing::debug!("POST {}", url);

        let mut request = self.prepare(self.client.post(&url), session);

        if let Some(body) = body {
            request = request.json(body);
        }

        self.send(request).await
    }

    /// Make a DELETE request to a OneView API
    pub async fn delete(&self, path: &str, session: Option<&str>) -> Result<Value> {
        let url = self.url(path);
        tracing::debug!("DELETE {}", url);

        let request = self.prepare(self.client.delete(&url), session);
        self.send(request).await
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.send().await.context("Failed to send request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(match error_detail(&body) {
                Some(detail) => anyhow::anyhow!("API request failed: {} ({})", status, detail),
                None => anyhow::anyhow!("API request failed: {}", status),
            });
        }

        if body.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).context("Failed to parse response JSON")
    }
}

/// Format a OneView API error for display
/// Security: Sanitizes error messages to avoid leaking sensitive API details
pub fn format_api_error(error: &anyhow::Error) -> String {
    let error_str = error.to_string();

    if error_str.contains("401") {
        return "Authentication failed. Check the user name, password and login domain.".to_string();
    }
    if error_str.contains("403") {
        return "Permission denied. Check the user's OneView role and scopes.".to_string();
    }
    if error_str.contains("404") {
        return "Resource not found.".to_string();
    }
    if error_str.contains("409") {
        return "Resource conflict. The resource may be locked by another task.".to_string();
    }
    if error_str.contains("429") {
        return "Rate limit exceeded. Please try again later.".to_string();
    }
    if error_str.contains("400") {
        return "Invalid request. Check the filter and query syntax.".to_string();
    }
    if error_str.contains("500") || error_str.contains("503") {
        return "Appliance temporarily unavailable. Please try again.".to_string();
    }

    if error_str.contains("API request failed") {
        return "Request failed. Check your network connection and try again.".to_string();
    }

    let sanitized = error_str
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(80)
        .collect::<String>();

    if sanitized.len() < error_str.len() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_paths() {
        let client = OneViewHttpClient::new("https://oneview.example.com", 300, false).unwrap();
        assert_eq!(
            client.url("/rest/index/resources?category=server-hardware"),
            "https://oneview.example.com/rest/index/resources?category=server-hardware"
        );
        assert_eq!(
            client.url("rest/version"),
            "https://oneview.example.com/rest/version"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(OneViewHttpClient::new("not a url", 300, false).is_err());
    }

    #[test]
    fn test_error_detail() {
        let body = r#"{"errorCode":"RESOURCE_NOT_FOUND","message":"The resource was not found."}"#;
        assert_eq!(
            error_detail(body).as_deref(),
            Some("RESOURCE_NOT_FOUND: The resource was not found.")
        );
        assert_eq!(error_detail("<html>"), None);
        assert_eq!(error_detail("{}"), None);
    }

    #[test]
    fn test_sanitize_for_log_truncates() {
        let body = "x".repeat(500);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.starts_with(&"x".repeat(MAX_LOG_BODY_LENGTH)));
        assert!(sanitized.contains("500 bytes total"));
        assert_eq!(sanitize_for_log("a\nb"), "ab");
    }

    #[test]
    fn test_format_api_error() {
        let err = anyhow::anyhow!("API request failed: 404 Not Found");
        assert_eq!(format_api_error(&err), "Resource not found.");

        let err = anyhow::anyhow!("API request failed: 401 Unauthorized");
        assert!(format_api_error(&err).starts_with("Authentication failed"));

        let err = anyhow::anyhow!("something odd");
        assert_eq!(format_api_error(&err), "something odd");
    }
}
