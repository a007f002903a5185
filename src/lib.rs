//! Mockup is a poster-into-scene composition engine.
//!
//! Templates mark a quadrilateral in a scene photo; posters are warped onto it with a projective
//! transform, feathered and blended into the scene, then color graded. Around that core:
//!
//! - a [`TemplateStore`] of templates and packs, with a tolerant JSON config reader
//! - a [`MockupEngine`] composing one poster against many templates on a bounded worker pool,
//!   with a content-keyed cache
//! - a [`Workflow`] of posters awaiting approval before they are committed to a marketplace
//! - an [`EditorSession`] for placing corners over a zoomable scene view
#![forbid(unsafe_code)]

/// Newtype string identifier with serde, ordering and `Display`.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone,
            Debug,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }
    };
}

mod foundation;

pub(crate) mod geometry;
pub(crate) mod resample;

pub mod batch;
pub mod compose;
pub mod config;
pub mod editor;
pub mod engine;
pub mod store;
pub mod workflow;

pub use crate::foundation::core::{PixelSize, Point, Rect, Rgba8Premul, Vec2};
pub use crate::foundation::error::{MockupError, MockupResult};
pub use crate::geometry::projective::{ProjectiveTransform, solve_projective};
pub use crate::geometry::quad::Quadrilateral;
pub use crate::resample::fill::{FillMode, SourceSelection, select_source_rect};

pub use crate::batch::cache::{CacheStats, CompositionCache, CompositionResult};
pub use crate::batch::orchestrator::{
    BatchItem, BatchOptions, BatchProgress, BatchReport, CancelToken, Targets,
};
pub use crate::batch::request::{CompositionRequest, PosterHash, PosterSource, RequestKey};
pub use crate::batch::source::{FsImageSource, ImageSource, MemoryImageSource};
pub use crate::compose::blend::BlendMode;
pub use crate::compose::grade::ColorGrade;
pub use crate::compose::raster::{Raster, decode_image, encode_png};
pub use crate::compose::{CompositeSpec, RenderOpts, compose};
pub use crate::config::EngineConfig;
pub use crate::editor::session::{EditorSession, NudgeDirection};
pub use crate::engine::MockupEngine;
pub use crate::store::config_format::TemplateConfig;
pub use crate::store::pack::{MockupPack, PackDraft, PackId, PackPatch};
pub use crate::store::store::{ResolvedTargets, TemplateStore};
pub use crate::store::template::{
    MockupTemplate, SceneImage, TemplateDraft, TemplateId, TemplatePatch,
};
pub use crate::workflow::board::{ApproveAllReport, Workflow};
pub use crate::workflow::item::{CompositionState, PosterId, WorkflowItem, WorkflowStatus};
pub use crate::workflow::marketplace::{
    ImagePayload, ListingId, MarketplaceSink, PublishFailure, PublishImage, PublishRequest,
    PublishStep,
};
