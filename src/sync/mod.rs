//! Sync engine wiring
//!
//! The engine orchestrates one run against two narrow ports: a
//! `GalleryReader` that delivers snapshots and a `GalleryWriter` that
//! applies mutations. The HTTP-backed implementation lives in
//! `api::gallery`; tests run the engine against `MockGallery`.

mod engine;

#[cfg(test)]
mod tests;

pub use engine::{ApplyStats, SyncEngine, SyncReport, SyncSettings};

use crate::error::SyncResult;
use crate::models::{Deviation, DeviationId};
use crate::reconcile::{ApplyOutcome, Operation};

/// Which galleries feed the ranking scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSelection {
    /// Scan every folder on the account (destination excluded)
    AllFolders,
    /// Scan a single named folder
    Folder(String),
}

impl std::fmt::Display for SourceSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceSelection::AllFolders => f.write_str("all folders"),
            SourceSelection::Folder(name) => write!(f, "folder '{name}'"),
        }
    }
}

/// Read access to gallery snapshots.
///
/// Implementations fail with `FolderNotFound` for unknown gallery names and
/// `Unauthorized` for rejected sessions; the engine never catches either.
pub trait GalleryReader {
    /// One consistent snapshot of the ranking candidates.
    fn read_source(&mut self, source: &SourceSelection) -> SyncResult<Vec<Deviation>>;

    /// Current member ids of a named gallery, in listing order.
    fn read_members(&mut self, gallery: &str) -> SyncResult<Vec<DeviationId>>;
}

/// Write access to a destination gallery.
pub trait GalleryWriter {
    /// Apply one mutation. Operations already satisfied at the destination
    /// report `NoOp` rather than failing.
    fn apply(&mut self, gallery: &str, op: &Operation) -> SyncResult<ApplyOutcome>;
}

/// In-memory gallery double for engine tests.
#[cfg(test)]
pub struct MockGallery {
    pub source: Vec<Deviation>,
    pub dest_name: String,
    pub members: Vec<DeviationId>,
    /// Every apply call, rendered as `Operation::to_string`
    pub applied: Vec<String>,
}

#[cfg(test)]
impl MockGallery {
    pub fn new(dest_name: &str) -> Self {
        Self {
            source: Vec::new(),
            dest_name: dest_name.to_string(),
            members: Vec::new(),
            applied: Vec::new(),
        }
    }
}

#[cfg(test)]
impl GalleryReader for MockGallery {
    fn read_source(&mut self, _source: &SourceSelection) -> SyncResult<Vec<Deviation>> {
        Ok(self.source.clone())
    }

    fn read_members(&mut self, gallery: &str) -> SyncResult<Vec<DeviationId>> {
        if gallery != self.dest_name {
            return Err(crate::error::SyncError::FolderNotFound {
                name: gallery.to_string(),
            });
        }
        Ok(self.members.clone())
    }
}

#[cfg(test)]
impl GalleryWriter for MockGallery {
    fn apply(&mut self, gallery: &str, op: &Operation) -> SyncResult<ApplyOutcome> {
        if gallery != self.dest_name {
            return Err(crate::error::SyncError::FolderNotFound {
                name: gallery.to_string(),
            });
        }
        self.applied.push(op.to_string());
        match op {
            Operation::Add(id) => {
                if self.members.contains(id) {
                    Ok(ApplyOutcome::NoOp)
                } else {
                    self.members.push(id.clone());
                    Ok(ApplyOutcome::Applied)
                }
            }
            Operation::Remove(id) => {
                let before = self.members.len();
                self.members.retain(|m| m != id);
                if self.members.len() == before {
                    Ok(ApplyOutcome::NoOp)
                } else {
                    Ok(ApplyOutcome::Applied)
                }
            }
        }
    }
}
