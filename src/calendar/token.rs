use super::models::CalendarConfig;
use crate::error::{auth_error, CalResult};
use chrono::Utc;
use reqwest::Client;
use serde_json::Value;
use tokio::sync::Mutex;

/// Google OAuth token endpoint
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// A cached token is reused only while it has at least this long to live
const TOKEN_EXPIRY_BUFFER_MS: i64 = 60_000;

/// Assumed token lifetime; the service's actual `expires_in` is deliberately
/// not parsed
const TOKEN_LIFETIME_MS: i64 = 3_600_000;

struct CachedToken {
    access_token: String,
    expires_at_ms: i64,
}

/// Owns the access-token cache for one calendar service connection.
///
/// The cache lives behind a mutex held across the refresh request, so at
/// most one refresh is in flight and dependent requests wait for it.
pub struct TokenManager {
    config: CalendarConfig,
    token_url: String,
    client: Client,
    cache: Mutex<Option<CachedToken>>,
}

impl TokenManager {
    pub fn new(config: CalendarConfig) -> Self {
        Self::with_token_url(config, GOOGLE_TOKEN_URL)
    }

    pub fn with_token_url(config: CalendarConfig, token_url: impl Into<String>) -> Self {
        Self {
            config,
            token_url: token_url.into(),
            client: Client::new(),
            cache: Mutex::new(None),
        }
    }

    /// Get a bearer token, refreshing through the token endpoint on expiry
    pub async fn get_access_token(&self) -> CalResult<String> {
        let mut cache = self.cache.lock().await;
        let now_ms = Utc::now().timestamp_millis();

        if let Some(cached) = cache.as_ref() {
            if now_ms < cached.expires_at_ms - TOKEN_EXPIRY_BUFFER_MS {
                return Ok(cached.access_token.clone());
            }
        }

        let access_token = self.refresh_access_token().await?;
        *cache = Some(CachedToken {
            access_token: access_token.clone(),
            expires_at_ms: now_ms + TOKEN_LIFETIME_MS,
        });

        Ok(access_token)
    }

    /// Exchange the refresh token for a fresh access token
    async fn refresh_access_token(&self) -> CalResult<String> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("refresh_token", self.config.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| auth_error(&format!("Failed to refresh token: {}", e)))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| auth_error(&format!("Failed to parse token response: {}", e)))?;

        if !status.is_success() {
            let description = body
                .get("error_description")
                .and_then(|d| d.as_str())
                .unwrap_or("Failed to refresh token");
            return Err(auth_error(description));
        }

        body.get("access_token")
            .and_then(|t| t.as_str())
            .map(|t| t.to_string())
            .ok_or_else(|| auth_error("Token response missing 'access_token' field"))
    }
}
