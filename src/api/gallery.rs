//! Gallery snapshots over the API client
//!
//! Turns paginated listings into one consistent snapshot per run and
//! implements the sync engine's `GalleryReader`/`GalleryWriter` ports.
//! The folder list is fetched once and memoized; destination membership
//! observed by `read_members` is tracked so repeated operations can be
//! classified as no-ops without extra calls.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};

use crate::config::Config;
use crate::error::{SyncError, SyncResult};
use crate::models::{Deviation, DeviationId, Folder};
use crate::reconcile::{ApplyOutcome, Operation};
use crate::sync::{GalleryReader, GalleryWriter, SourceSelection};

use super::client::DaClient;

const FOLDER_PAGE_LIMIT: u64 = 50;
const CONTENT_PAGE_LIMIT: u64 = 24;

/// HTTP-backed gallery collaborator.
pub struct GalleryService {
    client: DaClient,
    dest_gallery: String,
    per_folder_cap: Option<usize>,
    published_after: Option<DateTime<Utc>>,
    folders: Option<Vec<Folder>>,
    members: HashMap<String, HashSet<DeviationId>>,
}

impl GalleryService {
    pub fn new(client: DaClient, config: &Config) -> Self {
        let published_after = config
            .published_within_days
            .map(|days| Utc::now() - Duration::days(days));
        Self {
            client,
            dest_gallery: config.dest_gallery.clone(),
            per_folder_cap: config.per_folder_cap,
            published_after,
            folders: None,
            members: HashMap::new(),
        }
    }

    /// Every folder on the account, fetched once per run.
    pub fn folders(&mut self) -> SyncResult<&[Folder]> {
        if self.folders.is_none() {
            self.folders = Some(self.fetch_all_folders()?);
        }
        Ok(self.folders.as_deref().unwrap_or(&[]))
    }

    fn fetch_all_folders(&mut self) -> SyncResult<Vec<Folder>> {
        let mut all = Vec::new();
        let mut offset = 0u64;
        loop {
            let page = self.client.list_folders(offset, FOLDER_PAGE_LIMIT)?;
            all.extend(page.results);
            if !page.has_more {
                break;
            }
            match page.next_offset {
                Some(next) => offset = next,
                None => break,
            }
        }
        Ok(all)
    }

    fn resolve_folderid(&mut self, name: &str) -> SyncResult<String> {
        let folders = self.folders()?;
        find_folder(folders, name)
            .map(|f| f.folderid.clone())
            .ok_or_else(|| SyncError::FolderNotFound {
                name: name.to_string(),
            })
    }

    /// Ranked candidates from one folder, recency window applied.
    fn folder_items(&mut self, folderid: &str) -> SyncResult<Vec<Deviation>> {
        let mut items = Vec::new();
        let mut offset = 0u64;
        let mut fetched = 0usize;
        loop {
            let page = self.client.folder_contents(folderid, offset, CONTENT_PAGE_LIMIT)?;
            fetched += page.results.len();
            items.extend(page.results.into_iter().filter_map(|raw| raw.into_deviation()));

            if let Some(cap) = self.per_folder_cap {
                if fetched >= cap {
                    break;
                }
            }
            if !page.has_more {
                break;
            }
            match page.next_offset {
                Some(next) => offset = next,
                None => break,
            }
        }
        Ok(items)
    }

    /// Current member ids of a folder, in listing order. No cap: the
    /// destination must be read completely for reconciliation to hold.
    fn member_ids(&mut self, folderid: &str) -> SyncResult<Vec<DeviationId>> {
        let mut ids = Vec::new();
        let mut offset = 0u64;
        loop {
            let page = self.client.folder_contents(folderid, offset, CONTENT_PAGE_LIMIT)?;
            ids.extend(
                page.results
                    .into_iter()
                    .filter_map(|raw| raw.deviationid.map(DeviationId::new)),
            );
            if !page.has_more {
                break;
            }
            match page.next_offset {
                Some(next) => offset = next,
                None => break,
            }
        }
        Ok(ids)
    }
}

impl GalleryReader for GalleryService {
    fn read_source(&mut self, source: &SourceSelection) -> SyncResult<Vec<Deviation>> {
        let scanned = match source {
            SourceSelection::Folder(name) => {
                let folderid = self.resolve_folderid(name)?;
                self.folder_items(&folderid)?
            }
            SourceSelection::AllFolders => {
                // The mirror folder itself never feeds the ranking.
                let dest_name = self.dest_gallery.clone();
                let folderids: Vec<String> = {
                    let folders = self.folders()?;
                    let dest_id = find_folder(folders, &dest_name).map(|f| f.folderid.clone());
                    folders
                        .iter()
                        .filter(|f| Some(&f.folderid) != dest_id.as_ref())
                        .map(|f| f.folderid.clone())
                        .collect()
                };
                let mut all = Vec::new();
                for folderid in &folderids {
                    all.extend(self.folder_items(folderid)?);
                }
                all
            }
        };
        Ok(aggregate_candidates(scanned, self.published_after))
    }

    fn read_members(&mut self, gallery: &str) -> SyncResult<Vec<DeviationId>> {
        let folderid = self.resolve_folderid(gallery)?;
        let ids = self.member_ids(&folderid)?;
        self.members
            .insert(folderid, ids.iter().cloned().collect());
        Ok(ids)
    }
}

impl GalleryWriter for GalleryService {
    fn apply(&mut self, gallery: &str, op: &Operation) -> SyncResult<ApplyOutcome> {
        let folderid = self.resolve_folderid(gallery)?;

        // Already satisfied against the observed membership: no call.
        let satisfied = self.members.get(&folderid).map(|known| match op {
            Operation::Add(id) => known.contains(id),
            Operation::Remove(id) => !known.contains(id),
        });
        if satisfied == Some(true) {
            return Ok(ApplyOutcome::NoOp);
        }

        match op {
            Operation::Add(id) => {
                self.client
                    .copy_deviations(&folderid, std::slice::from_ref(id))?;
            }
            Operation::Remove(id) => {
                self.client
                    .remove_deviations(&folderid, std::slice::from_ref(id))?;
            }
        }

        if let Some(known) = self.members.get_mut(&folderid) {
            match op {
                Operation::Add(id) => {
                    known.insert(id.clone());
                }
                Operation::Remove(id) => {
                    known.remove(id);
                }
            }
        }
        Ok(ApplyOutcome::Applied)
    }
}

/// Case-insensitive, whitespace-trimmed folder lookup. Root folders win
/// over nested namesakes (the service nests sub-folders under parents).
pub fn find_folder<'a>(folders: &'a [Folder], name: &str) -> Option<&'a Folder> {
    let wanted = name.trim().to_lowercase();
    let name_matches = |f: &&Folder| f.name.trim().to_lowercase() == wanted;
    folders
        .iter()
        .filter(name_matches)
        .find(|f| f.parent.is_none())
        .or_else(|| folders.iter().find(name_matches))
}

/// Collapse duplicate ids across folders keeping the maximum favourite
/// count, and drop items published before `cutoff`. First-appearance order
/// is preserved; the Selector re-sorts anyway.
pub fn aggregate_candidates(
    items: Vec<Deviation>,
    cutoff: Option<DateTime<Utc>>,
) -> Vec<Deviation> {
    let mut order: Vec<DeviationId> = Vec::new();
    let mut best: HashMap<DeviationId, Deviation> = HashMap::new();

    for item in items {
        if let Some(cutoff) = cutoff {
            if item.published < cutoff {
                continue;
            }
        }
        match best.get_mut(&item.id) {
            None => {
                order.push(item.id.clone());
                best.insert(item.id.clone(), item);
            }
            Some(existing) => {
                if item.favourites > existing.favourites {
                    *existing = item;
                }
            }
        }
    }

    order.into_iter().filter_map(|id| best.remove(&id)).collect()
}
