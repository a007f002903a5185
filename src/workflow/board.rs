use std::sync::{Mutex, MutexGuard};

use crate::batch::orchestrator::{BatchOptions, BatchProgress, BatchReport};
use crate::batch::request::PosterSource;
use crate::compose::grade::ColorGrade;
use crate::engine::MockupEngine;
use crate::foundation::error::{MockupError, MockupResult};
use crate::resample::fill::FillMode;
use crate::store::pack::PackId;
use crate::store::template::TemplateId;
use crate::workflow::item::{PosterId, WorkflowItem, WorkflowStatus};
use crate::workflow::marketplace::{ListingId, MarketplaceSink};

/// Outcome of an approve-all pass.
#[derive(Debug, Default)]
pub struct ApproveAllReport {
    pub approved: Vec<(PosterId, ListingId)>,
    pub failed: Vec<(PosterId, MockupError)>,
    /// Pending posters whose compositions were not ready.
    pub skipped: Vec<PosterId>,
}

/// Every poster under review, in enqueue order.
///
/// The lock is never held across composition or publishing, so other items stay usable while a
/// long run is in progress.
#[derive(Debug, Default)]
pub struct Workflow {
    items: Mutex<Vec<WorkflowItem>>,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(
        &self,
        poster_id: PosterId,
        poster: PosterSource,
        fill_mode: FillMode,
        color_grade: Option<ColorGrade>,
    ) -> MockupResult<()> {
        let mut items = self.lock()?;
        if items.iter().any(|i| i.poster_id == poster_id) {
            return Err(MockupError::validation(format!(
                "poster '{poster_id}' is already queued"
            )));
        }
        let mut item = WorkflowItem::new(poster_id, poster, fill_mode);
        item.color_grade = color_grade;
        tracing::info!(poster = %item.poster_id, "poster queued for review");
        items.push(item);
        Ok(())
    }

    /// Snapshot of one item.
    pub fn item(&self, poster_id: &PosterId) -> MockupResult<WorkflowItem> {
        self.with_item(poster_id, |item| Ok(item.clone()))
    }

    pub fn items(&self) -> MockupResult<Vec<WorkflowItem>> {
        Ok(self.lock()?.clone())
    }

    pub fn pending_ids(&self) -> MockupResult<Vec<PosterId>> {
        Ok(self
            .lock()?
            .iter()
            .filter(|i| i.status == WorkflowStatus::Pending)
            .map(|i| i.poster_id.clone())
            .collect())
    }

    pub fn exclude(&self, poster_id: &PosterId, template: TemplateId) -> MockupResult<bool> {
        self.with_item(poster_id, |item| item.exclude(template))
    }

    pub fn include(&self, poster_id: &PosterId, template: &TemplateId) -> MockupResult<bool> {
        self.with_item(poster_id, |item| item.include(template))
    }

    pub fn select_pack(&self, poster_id: &PosterId, pack: Option<PackId>) -> MockupResult<()> {
        self.with_item(poster_id, |item| item.select_pack(pack))
    }

    pub fn decline(&self, poster_id: &PosterId) -> MockupResult<()> {
        self.with_item(poster_id, |item| {
            item.decline()?;
            tracing::info!(poster = %poster_id, "poster declined");
            Ok(())
        })
    }

    pub fn retry(&self, poster_id: &PosterId) -> MockupResult<()> {
        self.with_item(poster_id, |item| {
            item.retry()?;
            tracing::info!(poster = %poster_id, "poster back in review");
            Ok(())
        })
    }

    /// Compose the poster against its pack (or every active template) and record the
    /// candidates, unless the item left `pending` while the run was in flight.
    pub fn run_composition(
        &self,
        engine: &MockupEngine,
        poster_id: &PosterId,
    ) -> MockupResult<BatchReport> {
        let active: Vec<TemplateId> = engine
            .store()?
            .list_active()
            .iter()
            .map(|t| t.id.clone())
            .collect();
        let (generation, cancel, poster, targets, fill_mode, grade) =
            self.with_item(poster_id, |item| {
                let (generation, cancel) = item.begin_composition()?;
                Ok((
                    generation,
                    cancel,
                    item.poster.clone(),
                    item.targets(|| active),
                    item.fill_mode,
                    item.color_grade,
                ))
            })?;

        let options = BatchOptions {
            cancel: Some(cancel),
            ..BatchOptions::default()
        };
        let report = match engine.compose_many(&poster, &targets, fill_mode, grade, &options) {
            Ok(report) => report,
            Err(e) => {
                self.with_item(poster_id, |item| {
                    item.abort_composition(generation);
                    Ok(())
                })?;
                return Err(e);
            }
        };

        let recorded =
            self.with_item(poster_id, |item| Ok(item.finish_composition(generation, &report)))?;
        tracing::debug!(poster = %poster_id, recorded, "composition run finished");
        Ok(report)
    }

    /// Publish the item's image set; on failure the item stays pending and the failing step is
    /// reported as [`MockupError::Commit`].
    ///
    /// The item is claimed under the lock before publishing, so a concurrent approve, decline or
    /// approve-all sees it as busy instead of committing it twice.
    pub fn approve(
        &self,
        sink: &dyn MarketplaceSink,
        poster_id: &PosterId,
    ) -> MockupResult<ListingId> {
        let request = self.with_item(poster_id, |item| item.begin_publish())?;
        match sink.publish(&request) {
            Ok(listing) => {
                self.with_item(poster_id, |item| {
                    item.mark_approved(listing.clone());
                    Ok(())
                })?;
                tracing::info!(
                    poster = %poster_id,
                    listing = %listing,
                    images = request.images.len(),
                    "poster approved"
                );
                Ok(listing)
            }
            Err(failure) => {
                self.with_item(poster_id, |item| {
                    item.abort_publish();
                    Ok(())
                })?;
                tracing::warn!(
                    poster = %poster_id,
                    step = %failure.step,
                    message = %failure.message,
                    "marketplace commit failed"
                );
                Err(failure.into())
            }
        }
    }

    /// Approve every ready pending item, one at a time. Items still composing, never composed
    /// or already being published are skipped; one failure does not stop the pass.
    pub fn approve_all(
        &self,
        sink: &dyn MarketplaceSink,
        on_progress: Option<&dyn Fn(BatchProgress)>,
    ) -> MockupResult<ApproveAllReport> {
        let (ready, skipped): (Vec<_>, Vec<_>) = {
            let items = self.lock()?;
            items
                .iter()
                .filter(|i| i.status == WorkflowStatus::Pending)
                .map(|i| (i.poster_id.clone(), i.is_ready()))
                .partition(|(_, ready)| *ready)
        };
        let mut report = ApproveAllReport {
            skipped: skipped.into_iter().map(|(id, _)| id).collect(),
            ..ApproveAllReport::default()
        };
        let total = ready.len();
        for (done, (poster_id, _)) in ready.into_iter().enumerate() {
            match self.approve(sink, &poster_id) {
                Ok(listing) => report.approved.push((poster_id, listing)),
                Err(e) => report.failed.push((poster_id, e)),
            }
            if let Some(cb) = on_progress {
                cb(BatchProgress { done: done + 1, total });
            }
        }
        tracing::info!(
            approved = report.approved.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            "approve-all finished"
        );
        Ok(report)
    }

    /// Re-run composition for every pending item ("reapply to all").
    pub fn recompose_all_pending(
        &self,
        engine: &MockupEngine,
        on_progress: Option<&dyn Fn(BatchProgress)>,
    ) -> MockupResult<Vec<(PosterId, MockupResult<BatchReport>)>> {
        let ids = self.pending_ids()?;
        let total = ids.len();
        let mut out = Vec::with_capacity(total);
        for (done, poster_id) in ids.into_iter().enumerate() {
            let result = self.run_composition(engine, &poster_id);
            if let Err(e) = &result {
                tracing::warn!(poster = %poster_id, error = %e, "recomposition failed");
            }
            out.push((poster_id, result));
            if let Some(cb) = on_progress {
                cb(BatchProgress { done: done + 1, total });
            }
        }
        Ok(out)
    }

    fn with_item<R>(
        &self,
        poster_id: &PosterId,
        f: impl FnOnce(&mut WorkflowItem) -> MockupResult<R>,
    ) -> MockupResult<R> {
        let mut items = self.lock()?;
        let item = items
            .iter_mut()
            .find(|i| &i.poster_id == poster_id)
            .ok_or_else(|| MockupError::not_found(format!("poster '{poster_id}'")))?;
        f(item)
    }

    fn lock(&self) -> MockupResult<MutexGuard<'_, Vec<WorkflowItem>>> {
        self.items
            .lock()
            .map_err(|_| MockupError::Other(anyhow::anyhow!("workflow lock poisoned")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/workflow/board.rs"]
mod tests;
