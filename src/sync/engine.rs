//! Two-stage sync engine: plan (pure, no writes) then apply.

use crate::error::SyncResult;
use crate::models::{Deviation, DeviationId};
use crate::reconcile::{reconcile, ApplyOutcome, Operation, OperationPlan};
use crate::select::select_top;
use crate::sync::{GalleryReader, GalleryWriter, SourceSelection};

/// Settings for one sync run.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Which galleries feed the ranking
    pub source: SourceSelection,
    /// Destination gallery name
    pub dest_gallery: String,
    /// Ranking size
    pub top_n: usize,
}

/// Mutation tallies from the apply stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyStats {
    pub added: usize,
    pub removed: usize,
    pub noops: usize,
}

/// Result of planning (and optionally applying) one run.
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Candidate deviations considered by the ranking
    pub scanned: usize,
    /// The selected top-N, in rank order
    pub selection: Vec<Deviation>,
    /// Planned mutations
    pub plan: OperationPlan,
    /// Apply tallies; all zero for a plan-only run
    pub stats: ApplyStats,
}

impl SyncReport {
    pub fn is_converged(&self) -> bool {
        self.plan.is_converged()
    }
}

/// Orchestrates read -> select -> reconcile -> apply for one run.
pub struct SyncEngine {
    settings: SyncSettings,
}

impl SyncEngine {
    pub fn new(settings: SyncSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Stage 1: compute the selection and the operation plan. No writes.
    pub fn plan<R: GalleryReader>(&self, reader: &mut R) -> SyncResult<SyncReport> {
        let candidates = reader.read_source(&self.settings.source)?;
        let selection = select_top(&candidates, self.settings.top_n)?;
        let desired: Vec<DeviationId> = selection.iter().map(|d| d.id.clone()).collect();

        let current = reader.read_members(&self.settings.dest_gallery)?;
        let plan = reconcile(&desired, &current);

        Ok(SyncReport {
            scanned: candidates.len(),
            selection,
            plan,
            stats: ApplyStats::default(),
        })
    }

    /// Stage 2: apply a previously computed plan, one call per operation.
    pub fn apply<W: GalleryWriter>(
        &self,
        writer: &mut W,
        plan: &OperationPlan,
    ) -> SyncResult<ApplyStats> {
        let mut stats = ApplyStats::default();
        for op in plan.operations() {
            match writer.apply(&self.settings.dest_gallery, &op)? {
                ApplyOutcome::Applied => match op {
                    Operation::Add(_) => stats.added += 1,
                    Operation::Remove(_) => stats.removed += 1,
                },
                ApplyOutcome::NoOp => stats.noops += 1,
            }
        }
        Ok(stats)
    }

    /// Plan and apply in one call.
    pub fn run<G: GalleryReader + GalleryWriter>(&self, gallery: &mut G) -> SyncResult<SyncReport> {
        let mut report = self.plan(gallery)?;
        report.stats = self.apply(gallery, &report.plan)?;
        Ok(report)
    }
}
