//! Error types for featured-sync
//!
//! Uses `thiserror` for library errors; the binary wraps them with `anyhow`.

use thiserror::Error;

/// Result type alias for featured-sync operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Main error type for featured-sync operations
#[derive(Error, Debug)]
pub enum SyncError {
    /// Requested ranking size is not a positive integer
    #[error("top-n must be at least 1 (got {n})")]
    TopNOutOfRange { n: usize },

    /// The source snapshot contained the same deviation id twice
    #[error("duplicate deviation id '{id}' in source snapshot")]
    DuplicateDeviation { id: String },

    /// Named gallery folder does not exist on the account
    #[error("gallery folder '{name}' not found - run 'featured-sync folders' to list folder names")]
    FolderNotFound { name: String },

    /// The API rejected the session even after a token refresh
    #[error("session rejected by the API - run 'featured-sync authorize' or check DA_REFRESH_TOKEN")]
    Unauthorized,

    /// OAuth token endpoint returned a failure
    #[error("token refresh failed ({status}): {message}")]
    TokenRefresh { status: u16, message: String },

    /// API request failed with a non-success status after retries
    #[error("API error ({status}) on {endpoint}: {message}")]
    Api {
        status: u16,
        endpoint: String,
        message: String,
    },

    /// Mutation endpoint answered 200 but reported `success: false`
    #[error("API rejected {operation}: {message}")]
    ApiRejected { operation: String, message: String },

    /// Required credential is absent from every configuration layer
    #[error("missing credential {name} - set it in the environment, a .env file, or the user config")]
    MissingCredential { name: &'static str },

    /// Invalid configuration value
    #[error("invalid configuration: {message}")]
    Config { message: String },

    /// Refresh-token store could not be read or written
    #[error("token store error: {message}")]
    TokenStore { message: String },

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
