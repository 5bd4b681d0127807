//! featured-sync - mirror a DeviantArt account's most-favourited work
//!
//! featured-sync scans an account's gallery folders, ranks deviations by
//! favourite count, and converges a destination folder (by default
//! "Top 20 Favorites") to the top-N ranking with the minimal set of
//! add/remove calls. The ranking and reconciliation steps are pure and
//! deterministic; all I/O goes through injected reader/writer ports.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod reconcile;
pub mod select;
pub mod sync;
pub mod token;

// Re-exports for convenience
pub use api::{DaClient, GalleryService};
pub use config::{Config, ConfigOverrides};
pub use error::{SyncError, SyncResult};
pub use models::{Deviation, DeviationId, Folder};
pub use reconcile::{reconcile, ApplyOutcome, Operation, OperationPlan};
pub use select::select_top;
pub use sync::{
    GalleryReader, GalleryWriter, SourceSelection, SyncEngine, SyncReport, SyncSettings,
};
pub use token::TokenStore;
