use std::sync::Arc;

use crate::batch::request::PosterSource;
use crate::foundation::error::MockupError;
use crate::store::template::TemplateId;
use crate::workflow::item::PosterId;

string_id!(
    /// Identifier the marketplace assigns to a published listing.
    ListingId
);

/// One image of a listing with its display rank (1 is primary).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishImage {
    pub rank: u32,
    /// The template a mockup came from; `None` for the original poster.
    pub template_id: Option<TemplateId>,
    pub payload: ImagePayload,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImagePayload {
    /// A composed mockup.
    Png(Arc<Vec<u8>>),
    /// The poster exactly as it was submitted.
    Original(PosterSource),
}

/// The final, ordered image set of an approved poster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishRequest {
    pub poster_id: PosterId,
    /// Ranked 1..=N; mockups in template order, then the original poster.
    pub images: Vec<PublishImage>,
}

/// Step of the publish sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PublishStep {
    Upload { rank: u32 },
    SetPrimary,
    Finalize,
}

impl std::fmt::Display for PublishStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upload { rank } => write!(f, "upload#{rank}"),
            Self::SetPrimary => f.write_str("set_primary"),
            Self::Finalize => f.write_str("finalize"),
        }
    }
}

/// A failed publish, naming the step that failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishFailure {
    pub step: PublishStep,
    pub message: String,
}

impl PublishFailure {
    pub fn new(step: PublishStep, message: impl Into<String>) -> Self {
        Self {
            step,
            message: message.into(),
        }
    }
}

impl From<PublishFailure> for MockupError {
    fn from(f: PublishFailure) -> Self {
        MockupError::commit(f.step.to_string(), f.message)
    }
}

/// The external storefront. Treated as an opaque remote call that may fail.
pub trait MarketplaceSink: Send + Sync {
    fn publish(&self, request: &PublishRequest) -> Result<ListingId, PublishFailure>;
}
