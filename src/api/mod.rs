//! DeviantArt OAuth2 API layer
//!
//! `token` handles grants and refresh-token rotation, `client` is the
//! paced/retrying HTTP transport with typed endpoint wrappers, and
//! `gallery` turns paginated listings into run snapshots and implements
//! the sync engine's reader/writer ports.

pub mod client;
pub mod gallery;
pub mod token;

pub use client::{DaClient, DaClientOptions, Page, API_BASE, MAX_DEVIATIONIDS_PER_MUTATION};
pub use gallery::{find_folder, GalleryService};
pub use token::{build_authorize_url, TokenGrant, TokenProvider, AUTHORIZE_URL, OAUTH_TOKEN_URL};
