//! Viewport and corner state of one editing session.
//!
//! The viewport is the affine map `screen = natural * zoom + pan`. Pointer input arrives in
//! screen space and is mapped back through the inverse before it touches a corner, so every
//! stored corner is in natural (scene-pixel) coordinates.

use kurbo::{Affine, Size, Vec2};

use crate::compose::blend::BlendMode;
use crate::foundation::core::{Point, Rect};
use crate::foundation::error::{MockupError, MockupResult};
use crate::geometry::quad::{Quadrilateral, clamp_point};
use crate::store::config_format::TemplateConfig;
use crate::store::template::{
    DEFAULT_BLEND_ALPHA, DEFAULT_FEATHER_RADIUS, MockupTemplate, SceneImage, TemplateDraft,
    TemplatePatch,
};

pub const MIN_ZOOM: f64 = 0.05;
pub const MAX_ZOOM: f64 = 32.0;
/// Keyboard nudge distance in natural pixels.
pub const NUDGE_STEP: f64 = 1.0;
/// Nudge distance with the modifier held.
pub const NUDGE_STEP_FAST: f64 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NudgeDirection {
    Left,
    Right,
    Up,
    Down,
}

impl NudgeDirection {
    fn unit(self) -> Vec2 {
        match self {
            Self::Left => Vec2::new(-1.0, 0.0),
            Self::Right => Vec2::new(1.0, 0.0),
            Self::Up => Vec2::new(0.0, -1.0),
            Self::Down => Vec2::new(0.0, 1.0),
        }
    }
}

/// Everything the corner editor needs between two input events.
///
/// A plain value: interaction handlers take it by `&mut`, there is no hidden shared state.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EditorSession {
    name: String,
    scene: SceneImage,
    zoom: f64,
    pan: Vec2,
    corners: Vec<Point>,
    selected: Option<usize>,
    blend_mode: BlendMode,
    blend_alpha: f32,
    feather_radius: u32,
}

impl EditorSession {
    /// An empty session over `scene` at 1:1 zoom.
    pub fn new(name: impl Into<String>, scene: SceneImage) -> MockupResult<Self> {
        scene.size()?;
        Ok(Self {
            name: name.into(),
            scene,
            zoom: 1.0,
            pan: Vec2::ZERO,
            corners: Vec::with_capacity(4),
            selected: None,
            blend_mode: BlendMode::default(),
            blend_alpha: DEFAULT_BLEND_ALPHA,
            feather_radius: DEFAULT_FEATHER_RADIUS,
        })
    }

    /// Re-open a stored template for editing.
    pub fn from_template(t: &MockupTemplate) -> Self {
        Self {
            name: t.name.clone(),
            scene: t.scene_image.clone(),
            zoom: 1.0,
            pan: Vec2::ZERO,
            corners: t.corners.corners().to_vec(),
            selected: None,
            blend_mode: t.blend_mode,
            blend_alpha: t.blend_alpha,
            feather_radius: t.feather_radius,
        }
    }

    pub fn from_config(
        cfg: &TemplateConfig,
        fallback_name: &str,
        fallback_scene_url: &str,
    ) -> MockupResult<Self> {
        let draft = cfg.to_draft(fallback_name, fallback_scene_url);
        let mut session = Self::new(draft.name, draft.scene_image)?;
        session.corners = draft.corners.corners().to_vec();
        session.blend_mode = draft.blend_mode;
        session.blend_alpha = draft.blend_alpha;
        session.feather_radius = draft.feather_radius;
        Ok(session)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scene(&self) -> &SceneImage {
        &self.scene
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    /// Placed corners in natural coordinates, in placement order.
    pub fn corners(&self) -> &[Point] {
        &self.corners
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn blend(&self) -> (BlendMode, f32, u32) {
        (self.blend_mode, self.blend_alpha, self.feather_radius)
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_blend(&mut self, mode: BlendMode, alpha: f32) -> MockupResult<()> {
        if !(alpha.is_finite() && (0.0..=1.0).contains(&alpha)) {
            return Err(MockupError::validation(format!(
                "blend_alpha must be in [0, 1], got {alpha}"
            )));
        }
        self.blend_mode = mode;
        self.blend_alpha = alpha;
        Ok(())
    }

    pub fn set_feather_radius(&mut self, radius: u32) {
        self.feather_radius = radius;
    }

    fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.scene.width), f64::from(self.scene.height))
    }

    /// Natural to screen.
    pub fn view_transform(&self) -> Affine {
        Affine::translate(self.pan) * Affine::scale(self.zoom)
    }

    pub fn to_screen(&self, natural: Point) -> Point {
        self.view_transform() * natural
    }

    pub fn to_natural(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.pan.x) / self.zoom,
            (screen.y - self.pan.y) / self.zoom,
        )
    }

    /// Place the next corner under the pointer and select it. Fails once four are placed.
    pub fn place_corner(&mut self, screen: Point) -> MockupResult<usize> {
        if self.corners.len() >= 4 {
            return Err(MockupError::validation("all four corners are already placed"));
        }
        let p = clamp_point(self.to_natural(screen), self.bounds());
        self.corners.push(p);
        let idx = self.corners.len() - 1;
        self.selected = Some(idx);
        Ok(idx)
    }

    pub fn select(&mut self, index: Option<usize>) -> MockupResult<()> {
        if let Some(i) = index
            && i >= self.corners.len()
        {
            return Err(MockupError::validation(format!(
                "corner {i} is not placed ({} placed)",
                self.corners.len()
            )));
        }
        self.selected = index;
        Ok(())
    }

    /// Move a corner to the pointer, clamped to the scene.
    pub fn drag_corner(&mut self, index: usize, screen: Point) -> MockupResult<Point> {
        let bounds = self.bounds();
        let natural = self.to_natural(screen);
        let corner = self.corners.get_mut(index).ok_or_else(|| {
            MockupError::validation(format!("corner {index} is not placed"))
        })?;
        *corner = clamp_point(natural, bounds);
        self.selected = Some(index);
        Ok(*corner)
    }

    /// Move the selected corner one step (five with `fast`). No-op without a selection.
    pub fn nudge(&mut self, direction: NudgeDirection, fast: bool) -> Option<Point> {
        let step = if fast { NUDGE_STEP_FAST } else { NUDGE_STEP };
        let bounds = self.bounds();
        let corner = self.corners.get_mut(self.selected?)?;
        *corner = clamp_point(*corner + direction.unit() * step, bounds);
        Some(*corner)
    }

    /// Scale by `factor` keeping the natural point under `cursor` fixed on screen.
    pub fn zoom_at(&mut self, cursor: Point, factor: f64) -> MockupResult<f64> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(MockupError::validation(format!(
                "zoom factor must be positive, got {factor}"
            )));
        }
        let anchor = self.to_natural(cursor);
        let zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.zoom = zoom;
        self.pan = cursor.to_vec2() - anchor.to_vec2() * zoom;
        Ok(zoom)
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    /// Fit the whole scene into `viewport`, scaled by `margin` and centered.
    pub fn fit_view(&mut self, viewport: Size, margin: f64) -> MockupResult<()> {
        if !(viewport.width > 0.0 && viewport.height > 0.0) {
            return Err(MockupError::validation(format!(
                "viewport must be non-empty, got {}x{}",
                viewport.width, viewport.height
            )));
        }
        if !(margin.is_finite() && margin > 0.0 && margin <= 1.0) {
            return Err(MockupError::validation(format!(
                "fit margin must be in (0, 1], got {margin}"
            )));
        }
        let scene = self.bounds().size();
        let zoom = (viewport.width / scene.width).min(viewport.height / scene.height) * margin;
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        self.pan = Vec2::new(
            (viewport.width - scene.width * self.zoom) / 2.0,
            (viewport.height - scene.height * self.zoom) / 2.0,
        );
        Ok(())
    }

    /// Nearest corner within `radius` screen pixels of `screen`.
    pub fn hit_test(&self, screen: Point, radius: f64) -> Option<usize> {
        self.corners
            .iter()
            .enumerate()
            .map(|(i, &c)| (i, self.to_screen(c).distance(screen)))
            .filter(|&(_, d)| d <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    pub fn undo_corner(&mut self) -> Option<Point> {
        let removed = self.corners.pop();
        if self.selected.is_some_and(|i| i >= self.corners.len()) {
            self.selected = self.corners.len().checked_sub(1);
        }
        removed
    }

    pub fn clear_corners(&mut self) {
        self.corners.clear();
        self.selected = None;
    }

    /// The saveable quadrilateral: all four corners, non-degenerate.
    ///
    /// Corners that already form a valid TL, TR, BR, BL quad are kept as placed; only an
    /// unordered placement is reordered.
    pub fn quad(&self) -> MockupResult<Quadrilateral> {
        let corners: [Point; 4] = self.corners.as_slice().try_into().map_err(|_| {
            MockupError::validation(format!(
                "a template needs four corners, {} placed",
                self.corners.len()
            ))
        })?;
        let placed = Quadrilateral::new(corners);
        if placed.validate().is_ok() {
            return Ok(placed);
        }
        let quad = placed.normalized_order();
        quad.validate()?;
        Ok(quad)
    }

    pub fn to_template_config(&self) -> MockupResult<TemplateConfig> {
        Ok(TemplateConfig {
            corners: self.quad()?.into(),
            image_size: [self.scene.width, self.scene.height],
            blend_alpha: self.blend_alpha,
            feather_radius: self.feather_radius,
            blend_mode: self.blend_mode,
            name: Some(self.name.clone()),
            scene_url: Some(self.scene.url.clone()),
        })
    }

    pub fn to_draft(&self) -> MockupResult<TemplateDraft> {
        Ok(
            TemplateDraft::new(self.name.clone(), self.scene.clone(), self.quad()?)
                .with_blend(self.blend_mode, self.blend_alpha)
                .with_feather_radius(self.feather_radius),
        )
    }

    /// Every editable field as a patch for an existing template.
    pub fn to_patch(&self) -> MockupResult<TemplatePatch> {
        Ok(TemplatePatch {
            name: Some(self.name.clone()),
            scene_image: Some(self.scene.clone()),
            corners: Some(self.quad()?),
            blend_mode: Some(self.blend_mode),
            blend_alpha: Some(self.blend_alpha),
            feather_radius: Some(self.feather_radius),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/editor/session.rs"]
mod tests;
