//! Configuration module for featured-sync
//!
//! Resolution hierarchy:
//! 1. CLI flags (highest priority)
//! 2. Environment variables (DA_*), with `.env` loaded first
//! 3. User config (~/.config/featured-sync/config.toml)
//! 4. Built-in defaults (lowest priority)
//!
//! Credentials are accepted from the environment or the user config file;
//! the refresh token additionally falls back to the token store (handled by
//! the caller, see `token::TokenStore`).

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{SyncError, SyncResult};
use crate::sync::SourceSelection;

pub const DEFAULT_DEST_GALLERY: &str = "Top 20 Favorites";
pub const DEFAULT_TOP_N: usize = 20;
pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8123/callback";
pub const DEFAULT_SCOPES: &str = "browse gallery";

/// Serde model of the user config file. Every field is optional; resolution
/// fills the gaps from the layers above and below.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub source_gallery: Option<String>,
    pub dest_gallery: Option<String>,
    pub top_n: Option<usize>,
    pub per_folder_cap: Option<usize>,
    pub published_within_days: Option<i64>,
    pub redirect_uri: Option<String>,
    pub scopes: Option<String>,
}

impl FileConfig {
    /// Load from `path`; a missing file is an empty config.
    pub fn load(path: &Path) -> SyncResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| SyncError::Config {
            message: format!("{}: {e}", path.display()),
        })
    }

    /// Load the user-level config file, if the platform has a config dir.
    pub fn load_user_config() -> SyncResult<Self> {
        match user_config_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }
}

/// Directory holding the user config file and the token store.
pub fn user_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("featured-sync"))
}

pub fn user_config_path() -> Option<PathBuf> {
    user_config_dir().map(|d| d.join("config.toml"))
}

/// Values taken from CLI flags; highest priority layer.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub source_gallery: Option<String>,
    pub dest_gallery: Option<String>,
    pub top_n: Option<usize>,
}

/// Fully resolved configuration for one invocation.
#[derive(Debug, Clone)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    /// Refresh token from the environment; `None` defers to the token store
    pub refresh_token: Option<String>,
    /// Named source folder; `None` scans every folder
    pub source_gallery: Option<String>,
    pub dest_gallery: String,
    pub top_n: usize,
    /// Bound on deviations scanned per folder
    pub per_folder_cap: Option<usize>,
    /// Only rank deviations published within this window
    pub published_within_days: Option<i64>,
    pub redirect_uri: String,
    pub scopes: String,
}

impl Config {
    /// Resolve configuration from the process environment, the user config
    /// file, and CLI overrides. Loads `.env` from the working directory
    /// first, matching the original tooling around this API.
    pub fn resolve(overrides: &ConfigOverrides) -> SyncResult<Self> {
        let _ = dotenv::dotenv();
        let file = FileConfig::load_user_config()?;
        Self::resolve_from(file, |key| std::env::var(key).ok(), overrides)
    }

    /// Resolution against an injected environment, for tests and callers
    /// that already captured one.
    pub fn resolve_from<E>(
        file: FileConfig,
        env: E,
        overrides: &ConfigOverrides,
    ) -> SyncResult<Self>
    where
        E: Fn(&str) -> Option<String>,
    {
        let env_str = |key: &str| {
            env(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let trimmed = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        let client_id = env_str("DA_CLIENT_ID")
            .or(trimmed(file.client_id))
            .ok_or(SyncError::MissingCredential {
                name: "DA_CLIENT_ID",
            })?;
        let client_secret = env_str("DA_CLIENT_SECRET")
            .or(trimmed(file.client_secret))
            .ok_or(SyncError::MissingCredential {
                name: "DA_CLIENT_SECRET",
            })?;
        let refresh_token = env_str("DA_REFRESH_TOKEN");

        let source_gallery = overrides
            .source_gallery
            .clone()
            .or_else(|| env_str("DA_SOURCE_GALLERY"))
            .or(trimmed(file.source_gallery));
        let dest_gallery = overrides
            .dest_gallery
            .clone()
            .or_else(|| env_str("DA_DEST_GALLERY"))
            .or(trimmed(file.dest_gallery))
            .unwrap_or_else(|| DEFAULT_DEST_GALLERY.to_string());

        let top_n = match overrides.top_n {
            Some(n) => n,
            None => parse_env("DA_TOP_N", env_str("DA_TOP_N"))?
                .or(file.top_n)
                .unwrap_or(DEFAULT_TOP_N),
        };
        if top_n == 0 {
            return Err(SyncError::TopNOutOfRange { n: 0 });
        }

        let per_folder_cap =
            parse_env("DA_PER_FOLDER_CAP", env_str("DA_PER_FOLDER_CAP"))?.or(file.per_folder_cap);

        let published_within_days = parse_env(
            "DA_PUBLISHED_WITHIN_DAYS",
            env_str("DA_PUBLISHED_WITHIN_DAYS"),
        )?
        .or(file.published_within_days);
        if let Some(days) = published_within_days {
            if days <= 0 {
                return Err(SyncError::Config {
                    message: format!("published_within_days must be positive (got {days})"),
                });
            }
        }

        let redirect_uri = env_str("DA_REDIRECT_URI")
            .or(trimmed(file.redirect_uri))
            .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string());
        let scopes = env_str("DA_SCOPES")
            .or(trimmed(file.scopes))
            .unwrap_or_else(|| DEFAULT_SCOPES.to_string());

        Ok(Self {
            client_id,
            client_secret,
            refresh_token,
            source_gallery,
            dest_gallery,
            top_n,
            per_folder_cap,
            published_within_days,
            redirect_uri,
            scopes,
        })
    }

    /// The ranking scan implied by this configuration.
    pub fn source_selection(&self) -> SourceSelection {
        match &self.source_gallery {
            Some(name) => SourceSelection::Folder(name.clone()),
            None => SourceSelection::AllFolders,
        }
    }
}

fn parse_env<T: FromStr>(key: &str, value: Option<String>) -> SyncResult<Option<T>> {
    match value {
        None => Ok(None),
        Some(raw) => raw.parse::<T>().map(Some).map_err(|_| SyncError::Config {
            message: format!("{key} must be an integer (got '{raw}')"),
        }),
    }
}
