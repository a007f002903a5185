//! The persisted template config the corner editor reads and writes.
//!
//! Two historical shapes exist for the scene size: an `image_size: [w, h]` array, or separate
//! `width` / `height` fields. Both are accepted on read; [`TemplateConfig`] always writes
//! `image_size`.

use crate::compose::blend::BlendMode;
use crate::foundation::core::PixelSize;
use crate::foundation::error::MockupResult;
use crate::geometry::quad::Quadrilateral;
use crate::store::template::{
    DEFAULT_BLEND_ALPHA, DEFAULT_FEATHER_RADIUS, MockupTemplate, SceneImage, TemplateDraft,
};

/// Canonical in-memory form of the persisted template config.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "RawTemplateConfig")]
pub struct TemplateConfig {
    pub corners: [[f64; 2]; 4],
    pub image_size: [u32; 2],
    pub blend_alpha: f32,
    pub feather_radius: u32,
    #[serde(skip_serializing_if = "is_normal")]
    pub blend_mode: BlendMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene_url: Option<String>,
}

fn is_normal(mode: &BlendMode) -> bool {
    *mode == BlendMode::Normal
}

/// Everything either shape may carry.
#[derive(serde::Deserialize)]
struct RawTemplateConfig {
    corners: [[f64; 2]; 4],
    #[serde(default)]
    image_size: Option<[u32; 2]>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    blend_alpha: Option<f32>,
    #[serde(default)]
    feather_radius: Option<u32>,
    #[serde(default)]
    blend_mode: BlendMode,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    scene_url: Option<String>,
}

impl TryFrom<RawTemplateConfig> for TemplateConfig {
    type Error = String;

    fn try_from(raw: RawTemplateConfig) -> Result<Self, Self::Error> {
        let image_size = match (raw.image_size, raw.width, raw.height) {
            (Some(size), None, None) => size,
            (Some(size), w, h) => {
                if w.is_some_and(|w| w != size[0]) || h.is_some_and(|h| h != size[1]) {
                    return Err(format!(
                        "image_size {size:?} disagrees with width/height {w:?}x{h:?}"
                    ));
                }
                size
            }
            (None, Some(w), Some(h)) => [w, h],
            (None, _, _) => {
                return Err("template config needs image_size or both width and height".to_owned());
            }
        };
        Ok(Self {
            corners: raw.corners,
            image_size,
            blend_alpha: raw.blend_alpha.unwrap_or(DEFAULT_BLEND_ALPHA),
            feather_radius: raw.feather_radius.unwrap_or(DEFAULT_FEATHER_RADIUS),
            blend_mode: raw.blend_mode,
            name: raw.name,
            scene_url: raw.scene_url,
        })
    }
}

impl TemplateConfig {
    pub fn from_json_str(s: &str) -> MockupResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Canonical pretty JSON (always `image_size`).
    pub fn to_json_string(&self) -> MockupResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_template(t: &MockupTemplate) -> Self {
        Self {
            corners: t.corners.into(),
            image_size: [t.scene_image.width, t.scene_image.height],
            blend_alpha: t.blend_alpha,
            feather_radius: t.feather_radius,
            blend_mode: t.blend_mode,
            name: Some(t.name.clone()),
            scene_url: Some(t.scene_image.url.clone()),
        }
    }

    pub fn quad(&self) -> Quadrilateral {
        Quadrilateral::from(self.corners)
    }

    pub fn scene_size(&self) -> MockupResult<PixelSize> {
        PixelSize::new(self.image_size[0], self.image_size[1])
    }

    /// Validate geometry and blend fields without touching any store.
    pub fn validate(&self) -> MockupResult<()> {
        let draft = self.to_draft("config", "config");
        crate::store::template::validate_fields(
            &draft.name,
            &draft.scene_image,
            &draft.corners,
            draft.blend_alpha,
        )
    }

    /// A store draft; `name` and `scene_url` fill in whatever the config itself lacks.
    pub fn to_draft(&self, fallback_name: &str, fallback_scene_url: &str) -> TemplateDraft {
        let scene = SceneImage::new(
            self.scene_url.as_deref().unwrap_or(fallback_scene_url),
            self.image_size[0],
            self.image_size[1],
        );
        let name = self.name.as_deref().unwrap_or(fallback_name);
        TemplateDraft::new(name, scene, self.quad())
            .with_blend(self.blend_mode, self.blend_alpha)
            .with_feather_radius(self.feather_radius)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/store/config_format.rs"]
mod tests;
