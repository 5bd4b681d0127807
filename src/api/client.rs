//! Blocking HTTP client for the DeviantArt OAuth2 API
//!
//! One client per run: paces requests, refreshes the access token once on
//! 401, and retries rate-limit/server statuses with exponential backoff.

use std::thread;
use std::time::{Duration, Instant};

use reqwest::blocking::{Client, Response};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::Config;
use crate::error::{SyncError, SyncResult};
use crate::models::{DeviationId, Folder, RawDeviation};
use crate::token::TokenStore;

use super::token::TokenProvider;

pub const API_BASE: &str = "https://www.deviantart.com/api/v1/oauth2";

/// The copy/remove endpoints accept at most this many ids per request.
pub const MAX_DEVIATIONIDS_PER_MUTATION: usize = 24;

const USER_AGENT: &str = concat!("featured-sync/", env!("CARGO_PKG_VERSION"));

/// Transport tuning knobs.
#[derive(Debug, Clone)]
pub struct DaClientOptions {
    pub timeout: Duration,
    /// Minimum spacing between consecutive requests
    pub min_delay: Duration,
    pub max_retries: u32,
}

impl Default for DaClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            min_delay: Duration::from_millis(350),
            max_retries: 6,
        }
    }
}

/// One page of a paginated listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub results: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_offset: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct MutationResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Authenticated client over the gallery endpoints.
pub struct DaClient {
    http: Client,
    tokens: TokenProvider,
    opts: DaClientOptions,
    last_request: Option<Instant>,
}

impl DaClient {
    pub fn new(
        config: &Config,
        refresh_token: String,
        store: Option<TokenStore>,
    ) -> SyncResult<Self> {
        Self::with_options(config, refresh_token, store, DaClientOptions::default())
    }

    pub fn with_options(
        config: &Config,
        refresh_token: String,
        store: Option<TokenStore>,
        opts: DaClientOptions,
    ) -> SyncResult<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(opts.timeout)
            .build()?;
        let tokens = TokenProvider::new(
            config.client_id.clone(),
            config.client_secret.clone(),
            refresh_token,
            store,
        );
        Ok(Self {
            http,
            tokens,
            opts,
            last_request: None,
        })
    }

    // GET /gallery/folders
    pub fn list_folders(&mut self, offset: u64, limit: u64) -> SyncResult<Page<Folder>> {
        self.request(
            Method::GET,
            "/gallery/folders",
            &[
                ("calculate_size", "1".to_string()),
                ("offset", offset.to_string()),
                ("limit", limit.to_string()),
            ],
            None,
        )
    }

    // GET /gallery/{folderid}
    pub fn folder_contents(
        &mut self,
        folderid: &str,
        offset: u64,
        limit: u64,
    ) -> SyncResult<Page<RawDeviation>> {
        self.request(
            Method::GET,
            &format!("/gallery/{folderid}"),
            &[
                ("offset", offset.to_string()),
                ("limit", limit.to_string()),
                ("mature_content", "1".to_string()),
            ],
            None,
        )
    }

    // POST /gallery/folders/copy_deviations
    pub fn copy_deviations(
        &mut self,
        target_folderid: &str,
        ids: &[DeviationId],
    ) -> SyncResult<()> {
        for chunk in ids.chunks(MAX_DEVIATIONIDS_PER_MUTATION) {
            let mut form: Vec<(&str, String)> =
                vec![("target_folderid", target_folderid.to_string())];
            form.extend(chunk.iter().map(|id| ("deviationids[]", id.to_string())));
            let body: MutationResponse = self.request(
                Method::POST,
                "/gallery/folders/copy_deviations",
                &[],
                Some(&form),
            )?;
            ensure_success(body, "copy_deviations")?;
        }
        Ok(())
    }

    // POST /gallery/folders/remove_deviations
    pub fn remove_deviations(&mut self, folderid: &str, ids: &[DeviationId]) -> SyncResult<()> {
        for chunk in ids.chunks(MAX_DEVIATIONIDS_PER_MUTATION) {
            let mut form: Vec<(&str, String)> = vec![("folderid", folderid.to_string())];
            form.extend(chunk.iter().map(|id| ("deviationids[]", id.to_string())));
            let body: MutationResponse = self.request(
                Method::POST,
                "/gallery/folders/remove_deviations",
                &[],
                Some(&form),
            )?;
            ensure_success(body, "remove_deviations")?;
        }
        Ok(())
    }

    fn pace(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.opts.min_delay {
                thread::sleep(self.opts.min_delay - elapsed);
            }
        }
        self.last_request = Some(Instant::now());
    }

    fn send(
        &mut self,
        method: &Method,
        path: &str,
        query: &[(&str, String)],
        form: Option<&[(&str, String)]>,
    ) -> SyncResult<Response> {
        self.pace();
        let token = self.tokens.access_token(&self.http)?;
        let url = format!("{API_BASE}{path}");
        let mut request = self
            .http
            .request(method.clone(), &url)
            .query(query)
            .query(&[("access_token", token)]);
        if let Some(form) = form {
            request = request.form(form);
        }
        Ok(request.send()?)
    }

    /// One logical request: paced, expired-token recovery, bounded backoff
    /// on transient statuses and transport faults.
    fn request<T: DeserializeOwned>(
        &mut self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        form: Option<&[(&str, String)]>,
    ) -> SyncResult<T> {
        let mut backoff = Duration::from_secs(1);
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let response = match self.send(&method, path, query, form) {
                Ok(response) => response,
                Err(SyncError::Http(_)) if attempt < self.opts.max_retries => {
                    thread::sleep(backoff);
                    backoff *= 2;
                    continue;
                }
                Err(err) => return Err(err),
            };

            // Token expired mid-run: refresh once and replay the request.
            let response = if response.status() == StatusCode::UNAUTHORIZED {
                self.tokens.force_refresh(&self.http)?;
                let replay = self.send(&method, path, query, form)?;
                if replay.status() == StatusCode::UNAUTHORIZED {
                    return Err(SyncError::Unauthorized);
                }
                replay
            } else {
                response
            };

            let status = response.status();
            if is_transient(status) && attempt < self.opts.max_retries {
                thread::sleep(backoff);
                backoff *= 2;
                continue;
            }
            if !status.is_success() {
                return Err(SyncError::Api {
                    status: status.as_u16(),
                    endpoint: path.to_string(),
                    message: response.text().unwrap_or_default(),
                });
            }
            return Ok(response.json()?);
        }
    }
}

fn is_transient(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
}

fn ensure_success(body: MutationResponse, operation: &str) -> SyncResult<()> {
    if body.success {
        return Ok(());
    }
    Err(SyncError::ApiRejected {
        operation: operation.to_string(),
        message: body
            .error_description
            .or(body.error)
            .unwrap_or_else(|| "unspecified error".to_string()),
    })
}
