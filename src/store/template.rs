use crate::compose::CompositeSpec;
use crate::compose::blend::BlendMode;
use crate::compose::grade::ColorGrade;
use crate::foundation::core::PixelSize;
use crate::foundation::error::{MockupError, MockupResult};
use crate::geometry::quad::Quadrilateral;
use crate::resample::fill::FillMode;

pub(crate) const DEFAULT_BLEND_ALPHA: f32 = 1.0;
pub(crate) const DEFAULT_FEATHER_RADIUS: u32 = 2;

string_id!(
    /// Store-assigned template identifier.
    TemplateId
);

/// The photographed scene a template places posters into.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SceneImage {
    /// Path or `file://` URL resolved by the engine's image source.
    pub url: String,
    pub width: u32,
    pub height: u32,
}

impl SceneImage {
    pub fn new(url: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            url: url.into(),
            width,
            height,
        }
    }

    pub fn size(&self) -> MockupResult<PixelSize> {
        PixelSize::new(self.width, self.height)
    }
}

/// A scene photo with a marked quadrilateral and the blend parameters used to place posters.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MockupTemplate {
    pub id: TemplateId,
    pub name: String,
    pub scene_image: SceneImage,
    pub corners: Quadrilateral,
    #[serde(default)]
    pub blend_mode: BlendMode,
    #[serde(default = "default_blend_alpha")]
    pub blend_alpha: f32,
    #[serde(default = "default_feather_radius")]
    pub feather_radius: u32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Bumped on every content edit; part of every cache key.
    #[serde(default)]
    pub revision: u64,
}

fn default_blend_alpha() -> f32 {
    DEFAULT_BLEND_ALPHA
}

fn default_feather_radius() -> u32 {
    DEFAULT_FEATHER_RADIUS
}

fn default_true() -> bool {
    true
}

impl MockupTemplate {
    /// Write-time checks: readable scene, non-degenerate corners, alpha in range.
    pub fn validate(&self) -> MockupResult<()> {
        validate_fields(
            &self.name,
            &self.scene_image,
            &self.corners,
            self.blend_alpha,
        )
    }

    /// Placement of a poster of `poster_size` into this template's quad.
    pub fn composite_spec(
        &self,
        poster_size: PixelSize,
        fill_mode: FillMode,
        color_grade: ColorGrade,
    ) -> MockupResult<CompositeSpec> {
        CompositeSpec::for_quad(
            &self.corners,
            poster_size,
            fill_mode,
            self.blend_mode,
            self.blend_alpha,
            self.feather_radius,
            color_grade,
        )
    }
}

/// Fields of a template before the store assigns it an id.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TemplateDraft {
    pub name: String,
    pub scene_image: SceneImage,
    pub corners: Quadrilateral,
    pub blend_mode: BlendMode,
    pub blend_alpha: f32,
    pub feather_radius: u32,
    pub is_active: bool,
}

impl TemplateDraft {
    /// A draft with default blend parameters, active.
    pub fn new(name: impl Into<String>, scene_image: SceneImage, corners: Quadrilateral) -> Self {
        Self {
            name: name.into(),
            scene_image,
            corners,
            blend_mode: BlendMode::default(),
            blend_alpha: DEFAULT_BLEND_ALPHA,
            feather_radius: DEFAULT_FEATHER_RADIUS,
            is_active: true,
        }
    }

    pub fn with_blend(mut self, mode: BlendMode, alpha: f32) -> Self {
        self.blend_mode = mode;
        self.blend_alpha = alpha;
        self
    }

    pub fn with_feather_radius(mut self, radius: u32) -> Self {
        self.feather_radius = radius;
        self
    }

    pub(crate) fn into_template(self, id: TemplateId) -> MockupTemplate {
        MockupTemplate {
            id,
            name: self.name,
            scene_image: self.scene_image,
            corners: self.corners,
            blend_mode: self.blend_mode,
            blend_alpha: self.blend_alpha,
            feather_radius: self.feather_radius,
            is_active: self.is_active,
            revision: 1,
        }
    }
}

/// Partial edit of a template; `None` fields are left unchanged.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TemplatePatch {
    pub name: Option<String>,
    pub scene_image: Option<SceneImage>,
    pub corners: Option<Quadrilateral>,
    pub blend_mode: Option<BlendMode>,
    pub blend_alpha: Option<f32>,
    pub feather_radius: Option<u32>,
}

impl TemplatePatch {
    pub fn corners(corners: Quadrilateral) -> Self {
        Self {
            corners: Some(corners),
            ..Self::default()
        }
    }

    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub(crate) fn apply_to(&self, t: &mut MockupTemplate) {
        if let Some(name) = &self.name {
            t.name.clone_from(name);
        }
        if let Some(scene) = &self.scene_image {
            t.scene_image.clone_from(scene);
        }
        if let Some(corners) = self.corners {
            t.corners = corners;
        }
        if let Some(mode) = self.blend_mode {
            t.blend_mode = mode;
        }
        if let Some(alpha) = self.blend_alpha {
            t.blend_alpha = alpha;
        }
        if let Some(radius) = self.feather_radius {
            t.feather_radius = radius;
        }
    }
}

pub(crate) fn validate_fields(
    name: &str,
    scene: &SceneImage,
    corners: &Quadrilateral,
    blend_alpha: f32,
) -> MockupResult<()> {
    if name.trim().is_empty() {
        return Err(MockupError::validation("template name must not be empty"));
    }
    if scene.url.trim().is_empty() {
        return Err(MockupError::validation("scene image url must not be empty"));
    }
    scene.size()?;
    corners.validate()?;
    if !(blend_alpha.is_finite() && (0.0..=1.0).contains(&blend_alpha)) {
        return Err(MockupError::validation(format!(
            "blend_alpha must be in [0, 1], got {blend_alpha}"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/store/template.rs"]
mod tests;
