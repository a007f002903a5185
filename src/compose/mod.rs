//! Poster-into-scene compositing: warp, feather, blend, grade.

pub mod blend;
pub mod grade;
pub(crate) mod mask;
pub mod raster;
pub(crate) mod warp;

use crate::compose::blend::{BlendMode, blend_masked_in_place};
use crate::compose::grade::ColorGrade;
use crate::compose::raster::Raster;
use crate::compose::warp::{PixelRegion, WarpSource, warp};
use crate::foundation::core::{PixelSize, Point, Rect, Rgba8Premul};
use crate::foundation::error::{MockupError, MockupResult};
use crate::geometry::projective::{ProjectiveTransform, solve_projective};
use crate::geometry::quad::Quadrilateral;
use crate::resample::fill::{FillMode, SourceSelection, select_source_rect};

/// Rendering knobs shared by every composition of an engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderOpts {
    /// Straight-alpha padding color used by [`FillMode::Fit`].
    pub matte_rgba: [u8; 4],
    /// Edge coverage grid per axis (1..=8).
    pub supersample: u32,
    /// Downscale large posters before warping them onto small quads.
    pub prefilter: bool,
}

impl Default for RenderOpts {
    fn default() -> Self {
        Self {
            matte_rgba: [255, 255, 255, 255],
            supersample: 4,
            prefilter: true,
        }
    }
}

/// Everything that places one poster into one scene.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositeSpec {
    /// Maps `selection.canvas` (poster space) onto the destination quad (scene space).
    pub transform: ProjectiveTransform,
    /// Poster area to show, plus fit padding.
    pub selection: SourceSelection,
    pub blend_mode: BlendMode,
    /// Overall poster opacity in `[0, 1]`.
    pub blend_alpha: f32,
    /// Edge softening in scene pixels.
    pub feather_radius: u32,
    /// Grade applied to the whole output.
    pub color_grade: ColorGrade,
}

impl CompositeSpec {
    /// Resolve the fill mode against `quad` and solve the projective mapping.
    pub fn for_quad(
        quad: &Quadrilateral,
        poster_size: PixelSize,
        fill_mode: FillMode,
        blend_mode: BlendMode,
        blend_alpha: f32,
        feather_radius: u32,
        color_grade: ColorGrade,
    ) -> MockupResult<Self> {
        quad.validate()?;
        let selection = select_source_rect(poster_size, quad.bbox_aspect(), fill_mode)?;
        let transform = solve_projective(selection.canvas, quad)?;
        Ok(Self {
            transform,
            selection,
            blend_mode,
            blend_alpha,
            feather_radius,
            color_grade,
        })
    }
}

/// Compose `poster` into `scene`; the output has the scene's pixel size.
#[tracing::instrument(skip_all, fields(
    scene_w = scene.width(),
    scene_h = scene.height(),
    blend = %spec.blend_mode,
    grade = %spec.color_grade,
))]
pub fn compose(
    scene: &Raster,
    poster: &Raster,
    spec: &CompositeSpec,
    opts: &RenderOpts,
) -> MockupResult<Raster> {
    if !(spec.blend_alpha.is_finite() && (0.0..=1.0).contains(&spec.blend_alpha)) {
        return Err(MockupError::validation(format!(
            "blend_alpha must be in [0, 1], got {}",
            spec.blend_alpha
        )));
    }

    let mut out = scene.clone();
    let dst_corners = spec.transform.forward_rect(spec.selection.canvas);
    let dst_bbox = corners_bbox(&dst_corners);
    let pad = spec.feather_radius.saturating_add(2);

    if let Some(region) = PixelRegion::around(dst_bbox, pad, scene.size()) {
        let prefiltered;
        let raster = match prefilter_factor(dst_bbox, spec.selection.canvas, opts.prefilter) {
            Some(factor) => {
                tracing::debug!(factor, "prefiltering poster");
                prefiltered = poster.downscaled(factor)?;
                &prefiltered
            }
            None => poster,
        };
        let [r, g, b, a] = opts.matte_rgba;
        let src = WarpSource {
            raster,
            poster_size: poster.size(),
            selection: spec.selection,
            matte: Rgba8Premul::from_straight_rgba(r, g, b, a).to_array(),
        };
        let layer = warp(&src, &spec.transform, region, opts.supersample)?;
        let mask = mask::feather_mask(
            &layer.coverage,
            region.width,
            region.height,
            spec.feather_radius,
        )?;
        blend_region(
            out.size(),
            out.data_mut(),
            region,
            &layer.rgba8_premul,
            &mask,
            spec.blend_mode,
            spec.blend_alpha,
        )?;
    } else {
        tracing::debug!("destination quad lies outside the scene");
    }

    spec.color_grade.apply_in_place(out.data_mut())?;
    Ok(out)
}

fn corners_bbox(corners: &[Point; 4]) -> Rect {
    let mut r = Rect::from_points(corners[0], corners[1]);
    r = r.union_pt(corners[2]);
    r.union_pt(corners[3])
}

/// Downscale factor that keeps roughly two poster texels per destination pixel.
fn prefilter_factor(dst_bbox: Rect, canvas: Rect, enabled: bool) -> Option<f64> {
    if !enabled || canvas.width() <= 0.0 || canvas.height() <= 0.0 {
        return None;
    }
    let s = (dst_bbox.width() / canvas.width()).max(dst_bbox.height() / canvas.height());
    (s.is_finite() && s > 0.0 && s < 0.5).then(|| (2.0 * s).min(1.0))
}

fn blend_region(
    size: PixelSize,
    dst: &mut [u8],
    region: PixelRegion,
    layer: &[u8],
    mask: &[u8],
    mode: BlendMode,
    opacity: f32,
) -> MockupResult<()> {
    let stride = size.width as usize * 4;
    let row_len = region.width as usize * 4;
    for row in 0..region.height as usize {
        let y = region.y as usize + row;
        let start = y * stride + region.x as usize * 4;
        let dst_row = dst
            .get_mut(start..start + row_len)
            .ok_or_else(|| MockupError::validation("blend region exceeds the scene"))?;
        let src_row = &layer[row * row_len..(row + 1) * row_len];
        let mask_row = &mask[row * region.width as usize..(row + 1) * region.width as usize];
        blend_masked_in_place(dst_row, src_row, mask_row, mode, opacity)?;
    }
    Ok(())
}
