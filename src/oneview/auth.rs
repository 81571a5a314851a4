//! OneView Authentication
//!
//! Handles login sessions: credentials are exchanged for a session ID at
//! `/rest/login-sessions`, and the ID is cached and sent as the `Auth`
//! header on every later request.

use super::http::OneViewHttpClient;
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Login sessions endpoint
pub const LOGIN_SESSIONS_URI: &str = "/rest/login-sessions";

/// Login credentials for the appliance
#[derive(Clone, Serialize)]
pub struct Credentials {
    #[serde(rename = "userName")]
    pub user_name: String,
    pub password: String,
    #[serde(rename = "authLoginDomain", skip_serializing_if = "Option::is_none")]
    pub auth_login_domain: Option<String>,
}

impl Credentials {
    pub fn new(user_name: &str, password: &str) -> Self {
        Self {
            user_name: user_name.to_string(),
            password: password.to_string(),
            auth_login_domain: None,
        }
    }

    pub fn with_domain(mut self, domain: Option<&str>) -> Self {
        self.auth_login_domain = domain.filter(|d| !d.is_empty()).map(str::to_string);
        self
    }
}

// Security: never print the password
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_name", &self.user_name)
            .field("password", &"***")
            .field("auth_login_domain", &self.auth_login_domain)
            .finish()
    }
}

/// Session holder with token caching
#[derive(Clone)]
pub struct SessionManager {
    credentials: Credentials,
    session: Arc<RwLock<Option<String>>>,
}

impl SessionManager {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            session: Arc::new(RwLock::new(None)),
        }
    }

    /// Get a session token, logging in if none is cached
    pub async fn get_token(&self, http: &OneViewHttpClient) -> Result<String> {
        {
            let cache = self.session.read().await;
            if let Some(token) = cache.as_ref() {
                return Ok(token.clone());
            }
        }

        // Login runs under the write lock so concurrent callers share one session
        let mut cache = self.session.write().await;
        if let Some(token) = cache.as_ref() {
            return Ok(token.clone());
        }

        let token = self.login(http).await?;
        *cache = Some(token.clone());

        Ok(token)
    }

    async fn login(&self, http: &OneViewHttpClient) -> Result<String> {
        tracing::info!("Logging in to {} as {}", http.url(""), self.credentials.user_name);

        let body = serde_json::to_value(&self.credentials).context("Failed to encode credentials")?;
        let response = http
            .post(LOGIN_SESSIONS_URI, None, Some(&body))
            .await
            .context("Failed to create login session")?;

        session_id(&response)
    }

    /// Force a fresh login
    pub async fn refresh_token(&self, http: &OneViewHttpClient) -> Result<String> {
        {
            let mut cache = self.session.write().await;
            *cache = None;
        }

        self.get_token(http).await
    }

    /// Drop the session on the appliance and locally
    pub async fn logout(&self, http: &OneViewHttpClient) -> Result<()> {
        let token = {
            let mut cache = self.session.write().await;
            cache.take()
        };

        let Some(token) = token else {
            return Ok(());
        };

        http.delete(LOGIN_SESSIONS_URI, Some(&token))
            .await
            .context("Failed to delete login session")?;
        tracing::info!("Logged out of {}", http.url(""));

        Ok(())
    }

    pub async fn is_logged_in(&self) -> bool {
        self.session.read().await.is_some()
    }
}

fn session_id(response: &Value) -> Result<String> {
    response
        .get("sessionID")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .context("Login response did not contain a sessionID")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_credentials_serialize() {
        let credentials = Credentials::new("administrator", "secret").with_domain(Some("LOCAL"));
        let value = serde_json::to_value(&credentials).unwrap();
        assert_eq!(
            value,
            json!({
                "userName": "administrator",
                "password": "secret",
                "authLoginDomain": "LOCAL"
            })
        );

        let credentials = Credentials::new("administrator", "secret").with_domain(Some(""));
        let value = serde_json::to_value(&credentials).unwrap();
        assert!(value.get("authLoginDomain").is_none());
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let credentials = Credentials::new("administrator", "secret");
        let debug = format!("{:?}", credentials);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("administrator"));
    }

    #[test]
    fn test_session_id() {
        assert_eq!(session_id(&json!({"sessionID": "abc"})).unwrap(), "abc");
        assert!(session_id(&json!({"sessionID": ""})).is_err());
        assert!(session_id(&json!({})).is_err());
    }

    #[tokio::test]
    async fn test_logout_without_session_is_noop() {
        let http = OneViewHttpClient::new("http://127.0.0.1:9", 300, false).unwrap();
        let manager = SessionManager::new(Credentials::new("a", "b"));
        tokio_test::assert_ok!(manager.logout(&http).await);
        assert!(!manager.is_logged_in().await);
    }
}
