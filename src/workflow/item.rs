//! Approval state of one poster.
//!
//! ```text
//! pending --approve--> publishing --ok--> approved
//!                                  --err--> pending
//! pending --decline--> declined --retry--> pending
//! ```
//!
//! Composition runs are tagged with a generation; results of a run that was overtaken by a
//! decline, retry or pack change are dropped instead of recorded.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::batch::cache::CompositionResult;
use crate::batch::orchestrator::{BatchReport, CancelToken, Targets};
use crate::batch::request::PosterSource;
use crate::compose::grade::ColorGrade;
use crate::foundation::error::{MockupError, MockupResult};
use crate::resample::fill::FillMode;
use crate::store::pack::PackId;
use crate::store::template::TemplateId;
use crate::workflow::marketplace::{ImagePayload, ListingId, PublishImage, PublishRequest};

string_id!(
    /// Caller-chosen identifier of a poster under review.
    PosterId
);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Pending,
    Approved,
    Declined,
}

impl WorkflowStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Declined => "declined",
        }
    }
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the candidate set is usable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompositionState {
    /// Nothing composed for the current inputs yet.
    Idle,
    /// A run with this generation is in flight.
    Loading { generation: u64 },
    /// Candidates reflect the current inputs.
    Ready,
}

/// A poster awaiting approval of its composed mockup set.
#[derive(Clone, Debug)]
pub struct WorkflowItem {
    pub poster_id: PosterId,
    pub poster: PosterSource,
    pub status: WorkflowStatus,
    pub fill_mode: FillMode,
    /// Overrides the pack's grade when set.
    pub color_grade: Option<ColorGrade>,
    pub selected_pack_id: Option<PackId>,
    pub excluded_template_ids: BTreeSet<TemplateId>,
    /// Composition order of the last recorded run.
    pub template_order: Vec<TemplateId>,
    pub candidate_results: HashMap<TemplateId, Arc<CompositionResult>>,
    /// Per-template failures of the last recorded run.
    pub failures: HashMap<TemplateId, String>,
    pub composition: CompositionState,
    pub listing_id: Option<ListingId>,
    generation: u64,
    cancel: CancelToken,
    publishing: bool,
}

impl WorkflowItem {
    pub fn new(poster_id: PosterId, poster: PosterSource, fill_mode: FillMode) -> Self {
        Self {
            poster_id,
            poster,
            status: WorkflowStatus::Pending,
            fill_mode,
            color_grade: None,
            selected_pack_id: None,
            excluded_template_ids: BTreeSet::new(),
            template_order: Vec::new(),
            candidate_results: HashMap::new(),
            failures: HashMap::new(),
            composition: CompositionState::Idle,
            listing_id: None,
            generation: 0,
            cancel: CancelToken::new(),
            publishing: false,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == WorkflowStatus::Pending
            && self.composition == CompositionState::Ready
            && !self.publishing
    }

    /// A marketplace commit for this poster is in flight.
    pub fn is_publishing(&self) -> bool {
        self.publishing
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.composition, CompositionState::Loading { .. })
    }

    /// What the next composition run should target.
    pub fn targets(&self, all_active: impl FnOnce() -> Vec<TemplateId>) -> Targets {
        match &self.selected_pack_id {
            Some(pack) => Targets::Pack(pack.clone()),
            None => Targets::Templates(all_active()),
        }
    }

    /// Start a composition run; returns its generation and the token that cancels it.
    pub fn begin_composition(&mut self) -> MockupResult<(u64, CancelToken)> {
        self.require(WorkflowStatus::Pending, "compose")?;
        self.require_not_publishing("compose")?;
        self.generation += 1;
        self.composition = CompositionState::Loading {
            generation: self.generation,
        };
        Ok((self.generation, self.cancel.clone()))
    }

    /// Record a finished run. Returns `false` (and records nothing) when the run is stale.
    pub fn finish_composition(&mut self, generation: u64, report: &BatchReport) -> bool {
        let current = CompositionState::Loading { generation };
        if self.status != WorkflowStatus::Pending || self.composition != current {
            tracing::debug!(poster = %self.poster_id, generation, "dropping stale composition run");
            return false;
        }
        self.template_order.clear();
        self.candidate_results.clear();
        self.failures.clear();
        for item in &report.items {
            self.template_order.push(item.template_id.clone());
            match &item.result {
                Ok(r) => {
                    self.candidate_results.insert(item.template_id.clone(), r.clone());
                }
                Err(e) => {
                    self.failures.insert(item.template_id.clone(), e.to_string());
                }
            }
        }
        self.composition = CompositionState::Ready;
        true
    }

    /// A failed run leaves the previous candidates untouched but no longer loading.
    pub fn abort_composition(&mut self, generation: u64) {
        if self.composition == (CompositionState::Loading { generation }) {
            self.composition = if self.template_order.is_empty() {
                CompositionState::Idle
            } else {
                CompositionState::Ready
            };
        }
    }

    pub fn exclude(&mut self, template: TemplateId) -> MockupResult<bool> {
        self.require(WorkflowStatus::Pending, "exclude")?;
        Ok(self.excluded_template_ids.insert(template))
    }

    pub fn include(&mut self, template: &TemplateId) -> MockupResult<bool> {
        self.require(WorkflowStatus::Pending, "include")?;
        Ok(self.excluded_template_ids.remove(template))
    }

    /// Change the pack; candidates of the previous selection are discarded.
    pub fn select_pack(&mut self, pack: Option<PackId>) -> MockupResult<()> {
        self.require(WorkflowStatus::Pending, "select a pack for")?;
        self.require_not_publishing("select a pack for")?;
        if self.selected_pack_id != pack {
            self.selected_pack_id = pack;
            self.reset_candidates();
        }
        Ok(())
    }

    /// The image set to commit: included mockups in template order, then the poster.
    pub fn publish_request(&self) -> MockupResult<PublishRequest> {
        self.require(WorkflowStatus::Pending, "approve")?;
        if self.is_loading() {
            return Err(MockupError::validation(format!(
                "poster '{}' is still composing",
                self.poster_id
            )));
        }
        let mut images = Vec::new();
        for tid in &self.template_order {
            if self.excluded_template_ids.contains(tid) {
                continue;
            }
            if let Some(result) = self.candidate_results.get(tid) {
                images.push(PublishImage {
                    rank: images.len() as u32 + 1,
                    template_id: Some(tid.clone()),
                    payload: ImagePayload::Png(result.image_png.clone()),
                });
            }
        }
        images.push(PublishImage {
            rank: images.len() as u32 + 1,
            template_id: None,
            payload: ImagePayload::Original(self.poster.clone()),
        });
        Ok(PublishRequest {
            poster_id: self.poster_id.clone(),
            images,
        })
    }

    /// Claim the poster for a commit and build its image set. Until [`Self::mark_approved`] or
    /// [`Self::abort_publish`], a second claim, a decline and new composition runs are refused.
    pub fn begin_publish(&mut self) -> MockupResult<PublishRequest> {
        self.require_not_publishing("approve")?;
        let request = self.publish_request()?;
        self.publishing = true;
        Ok(request)
    }

    /// The commit failed; the poster stays pending and can be approved again.
    pub fn abort_publish(&mut self) {
        self.publishing = false;
    }

    pub fn mark_approved(&mut self, listing: ListingId) {
        self.publishing = false;
        self.status = WorkflowStatus::Approved;
        self.listing_id = Some(listing);
    }

    /// Park the poster; an in-flight run finishes but is not recorded.
    pub fn decline(&mut self) -> MockupResult<()> {
        self.require(WorkflowStatus::Pending, "decline")?;
        self.require_not_publishing("decline")?;
        self.cancel.cancel();
        self.status = WorkflowStatus::Declined;
        Ok(())
    }

    /// Back to pending with no candidates; composition must be re-run.
    pub fn retry(&mut self) -> MockupResult<()> {
        self.require(WorkflowStatus::Declined, "retry")?;
        self.status = WorkflowStatus::Pending;
        self.cancel = CancelToken::new();
        self.reset_candidates();
        Ok(())
    }

    fn reset_candidates(&mut self) {
        self.generation += 1;
        self.template_order.clear();
        self.candidate_results.clear();
        self.failures.clear();
        self.composition = CompositionState::Idle;
    }

    fn require_not_publishing(&self, action: &str) -> MockupResult<()> {
        if self.publishing {
            return Err(MockupError::validation(format!(
                "cannot {action} poster '{}' while it is being published",
                self.poster_id
            )));
        }
        Ok(())
    }

    fn require(&self, status: WorkflowStatus, action: &str) -> MockupResult<()> {
        if self.status != status {
            return Err(MockupError::validation(format!(
                "cannot {action} poster '{}' while it is {}",
                self.poster_id, self.status
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/workflow/item.rs"]
mod tests;
