//! OAuth2 grants and refresh-token rotation
//!
//! DeviantArt invalidates the presented refresh token on every grant and
//! issues a replacement. The provider persists the replacement through the
//! `TokenStore` before the old one is forgotten, and re-reads the store
//! ahead of each refresh in case another process rotated first.

use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::error::{SyncError, SyncResult};
use crate::token::TokenStore;

pub const OAUTH_TOKEN_URL: &str = "https://www.deviantart.com/oauth2/token";
pub const AUTHORIZE_URL: &str = "https://www.deviantart.com/oauth2/authorize";

/// Access tokens are renewed this long before their stated expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

/// A successful token grant.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: u64,
}

/// Caches the access token and drives refresh-token grants.
pub struct TokenProvider {
    client_id: String,
    client_secret: String,
    refresh_token: String,
    store: Option<TokenStore>,
    access_token: Option<String>,
    expires_at: Option<Instant>,
}

impl TokenProvider {
    pub fn new(
        client_id: String,
        client_secret: String,
        refresh_token: String,
        store: Option<TokenStore>,
    ) -> Self {
        Self {
            client_id,
            client_secret,
            refresh_token,
            store,
            access_token: None,
            expires_at: None,
        }
    }

    /// The cached access token, refreshed when absent or near expiry.
    pub fn access_token(&mut self, http: &Client) -> SyncResult<String> {
        if let (Some(token), Some(expires_at)) = (&self.access_token, self.expires_at) {
            if Instant::now() < expires_at {
                return Ok(token.clone());
            }
        }
        self.force_refresh(http)
    }

    /// Unconditionally run a refresh-token grant, persisting any rotation.
    pub fn force_refresh(&mut self, http: &Client) -> SyncResult<String> {
        // Another process may have rotated the token since this one started.
        if let Some(store) = &self.store {
            if let Some(stored) = store.load()? {
                self.refresh_token = stored;
            }
        }

        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", self.refresh_token.as_str()),
        ];
        let grant = request_grant(http, &params)?;

        if let Some(rotated) = grant.refresh_token.as_deref() {
            let rotated = rotated.trim();
            if !rotated.is_empty() && rotated != self.refresh_token {
                if let Some(store) = &self.store {
                    store.save(rotated)?;
                }
                self.refresh_token = rotated.to_string();
            }
        }

        let lifetime = Duration::from_secs(grant.expires_in).saturating_sub(EXPIRY_MARGIN);
        self.access_token = Some(grant.access_token.clone());
        self.expires_at = Some(Instant::now() + lifetime);
        Ok(grant.access_token)
    }

    /// One-time authorization-code exchange, used by the `authorize` flow.
    pub fn exchange_code(
        http: &Client,
        client_id: &str,
        client_secret: &str,
        code: &str,
        redirect_uri: &str,
    ) -> SyncResult<TokenGrant> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];
        request_grant(http, &params)
    }
}

/// Build the browser URL for the one-time authorization-code flow.
pub fn build_authorize_url(client_id: &str, redirect_uri: &str, scopes: &str) -> SyncResult<String> {
    let url = reqwest::Url::parse_with_params(
        AUTHORIZE_URL,
        &[
            ("response_type", "code"),
            ("client_id", client_id),
            ("redirect_uri", redirect_uri),
            ("scope", scopes),
        ],
    )
    .map_err(|e| SyncError::Config {
        message: format!("building authorize URL: {e}"),
    })?;
    Ok(url.into())
}

fn request_grant(http: &Client, params: &[(&str, &str)]) -> SyncResult<TokenGrant> {
    let response = http.post(OAUTH_TOKEN_URL).form(params).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(SyncError::TokenRefresh {
            status: status.as_u16(),
            message: response.text().unwrap_or_default(),
        });
    }

    let body: TokenResponse = response.json()?;
    let access_token = body
        .access_token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| SyncError::TokenRefresh {
            status: status.as_u16(),
            message: "response missing access_token".to_string(),
        })?;

    Ok(TokenGrant {
        access_token,
        refresh_token: body.refresh_token,
        expires_in: body.expires_in,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_parses_full_grant() {
        let json = r#"{
            "access_token": "at-1",
            "refresh_token": "rt-2",
            "expires_in": 7200,
            "token_type": "Bearer"
        }"#;
        let body: TokenResponse = serde_json::from_str(json).unwrap();

        assert_eq!(body.access_token.as_deref(), Some("at-1"));
        assert_eq!(body.refresh_token.as_deref(), Some("rt-2"));
        assert_eq!(body.expires_in, 7200);
    }

    #[test]
    fn test_token_response_defaults_expiry() {
        let json = r#"{"access_token": "at-1"}"#;
        let body: TokenResponse = serde_json::from_str(json).unwrap();

        assert_eq!(body.expires_in, 3600);
        assert!(body.refresh_token.is_none());
    }

    #[test]
    fn test_build_authorize_url_encodes_params() {
        let url = build_authorize_url("id 1", "http://127.0.0.1:8123/callback", "browse gallery")
            .unwrap();

        assert!(url.starts_with(AUTHORIZE_URL));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=id+1") || url.contains("client_id=id%201"));
        assert!(url.contains("scope=browse+gallery") || url.contains("scope=browse%20gallery"));
    }
}
