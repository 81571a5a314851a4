//! OneView Client
//!
//! Main client for interacting with the appliance, combining session
//! authentication and HTTP functionality.

use super::auth::{Credentials, SessionManager};
use super::http::OneViewHttpClient;
use anyhow::{Context, Result};
use serde_json::Value;

/// Version endpoint, readable without a session
pub const VERSION_URI: &str = "/rest/version";

/// Main OneView client
#[derive(Clone)]
pub struct OneViewClient {
    pub session: SessionManager,
    pub http: OneViewHttpClient,
}

impl OneViewClient {
    /// Create a new client; no request is made until the first call
    pub fn new(base_url: &str, credentials: Credentials, api_version: u32, insecure: bool) -> Result<Self> {
        let http = OneViewHttpClient::new(base_url, api_version, insecure)
            .context("Failed to initialize OneView HTTP client")?;

        Ok(Self {
            session: SessionManager::new(credentials),
            http,
        })
    }

    /// Get the current session token
    pub async fn get_token(&self) -> Result<String> {
        self.session.get_token(&self.http).await
    }

    /// Make a GET request to a OneView API
    pub async fn get(&self, uri: &str) -> Result<Value> {
        let token = self.get_token().await?;
        self.http.get(uri, Some(&token)).await
    }

    /// Read the appliance's current API version
    pub async fn api_version(&self) -> Result<u32> {
        let response = self.http.get(VERSION_URI, None).await?;
        response
            .get("currentVersion")
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok())
            .context("Version response did not contain currentVersion")
    }

    /// Use the appliance's current API version for later requests
    pub async fn negotiate_api_version(&mut self) -> Result<u32> {
        let version = self.api_version().await?;
        tracing::info!("Appliance API version: {}", version);
        self.http.set_api_version(version);
        Ok(version)
    }

    pub async fn logout(&self) -> Result<()> {
        self.session.logout(&self.http).await
    }
}

/// Format a OneView API error for display
pub fn format_api_error(error: &anyhow::Error) -> String {
    super::http::format_api_error(error)
}
