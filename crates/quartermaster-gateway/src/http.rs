//! `reqwest` implementation of both gateways.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    AccountStatus, AccountStatusGateway, AuthGateway, GatewayError,
    RefreshError, StatusCheckError,
};

/// Where the backend lives and how long to wait for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Base URL of the inventory API, without a trailing slash.
    pub base_url: String,
    /// Path of the token refresh endpoint (POST).
    pub refresh_path: String,
    /// Path of the account status endpoint (GET).
    pub status_path: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            refresh_path: "/auth/refresh-token".to_string(),
            status_path: "/auth/check-status".to_string(),
            timeout_secs: 10,
        }
    }
}

impl GatewayConfig {
    /// Config for `base_url` with default paths and timeout.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Deserialize)]
struct RefreshResponse {
    token: String,
}

/// Talks to the inventory REST backend with bearer authentication.
///
/// Cheap to clone: `reqwest::Client` is reference-counted internally.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl HttpGateway {
    /// Builds a gateway with its own connection pool.
    ///
    /// # Errors
    /// Returns [`GatewayError::Client`] if the HTTP client can't be built.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::Client(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// The configuration this gateway was built with.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

impl AuthGateway for HttpGateway {
    async fn refresh(&self, token: &str) -> Result<String, RefreshError> {
        let url = self.config.url(&self.config.refresh_path);
        tracing::debug!(%url, "requesting token refresh");

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| RefreshError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RefreshError::Rejected {
                status: status.as_u16(),
            });
        }

        let body: RefreshResponse = response
            .json()
            .await
            .map_err(|e| RefreshError::InvalidResponse(e.to_string()))?;
        Ok(body.token)
    }
}

impl AccountStatusGateway for HttpGateway {
    async fn check_status(
        &self,
        token: &str,
    ) -> Result<AccountStatus, StatusCheckError> {
        let url = self.config.url(&self.config.status_path);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| StatusCheckError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StatusCheckError::Rejected {
                status: status.as_u16(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| StatusCheckError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let config = GatewayConfig::with_base_url("https://inv.example.com/api/");
        assert_eq!(
            config.url(&config.refresh_path),
            "https://inv.example.com/api/auth/refresh-token"
        );
    }

    #[test]
    fn test_gateway_config_partial_json_keeps_defaults() {
        let config: GatewayConfig =
            serde_json::from_str(r#"{"base_url":"http://10.0.0.5/api"}"#).unwrap();
        assert_eq!(config.base_url, "http://10.0.0.5/api");
        assert_eq!(config.status_path, "/auth/check-status");
        assert_eq!(config.timeout_secs, 10);
    }
}
