use crate::compose::raster::Raster;
use crate::foundation::core::{PixelSize, Point, Rect};
use crate::foundation::error::{MockupError, MockupResult};
use crate::geometry::projective::ProjectiveTransform;
use crate::resample::fill::SourceSelection;

const EDGE_EPS: f64 = 1e-9;

/// Axis-aligned pixel window of the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PixelRegion {
    pub(crate) x: u32,
    pub(crate) y: u32,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl PixelRegion {
    /// `bbox` grown by `pad` pixels and clipped to the scene; `None` when nothing is left.
    pub(crate) fn around(bbox: Rect, pad: u32, scene: PixelSize) -> Option<Self> {
        let pad = f64::from(pad);
        let x0 = (bbox.x0 - pad).floor().max(0.0);
        let y0 = (bbox.y0 - pad).floor().max(0.0);
        let x1 = (bbox.x1 + pad).ceil().min(f64::from(scene.width));
        let y1 = (bbox.y1 + pad).ceil().min(f64::from(scene.height));
        if !(x1 > x0 && y1 > y0) {
            return None;
        }
        Some(Self {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }

    pub(crate) fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Poster pixels plus the poster-space geometry they are sampled through.
pub(crate) struct WarpSource<'a> {
    /// Possibly prefiltered poster raster.
    pub(crate) raster: &'a Raster,
    /// Size of the poster `selection` is expressed in (before any prefilter).
    pub(crate) poster_size: PixelSize,
    pub(crate) selection: SourceSelection,
    /// Premultiplied padding color for canvas area outside the poster.
    pub(crate) matte: [u8; 4],
}

/// Warped poster restricted to a scene region.
#[derive(Debug)]
pub(crate) struct WarpedLayer {
    /// Poster color per pixel, not weighted by coverage.
    pub(crate) rgba8_premul: Vec<u8>,
    /// Fraction of each pixel covered by the quad, 0..=255.
    pub(crate) coverage: Vec<u8>,
}

/// Inverse-map every pixel of `region` into poster space.
///
/// Pixels whose four corners all land inside the canvas are fully covered and take one bilinear
/// sample at their center. Every other pixel is resolved on a `supersample`² grid: coverage is
/// the fraction of grid points inside the canvas, color the mean of their samples.
pub(crate) fn warp(
    src: &WarpSource<'_>,
    transform: &ProjectiveTransform,
    region: PixelRegion,
    supersample: u32,
) -> MockupResult<WarpedLayer> {
    if !(1..=8).contains(&supersample) {
        return Err(MockupError::validation(format!(
            "supersample must be in 1..=8, got {supersample}"
        )));
    }
    let sampler = Sampler::new(src);
    let canvas = src.selection.canvas;
    let (w, h) = (region.width as usize, region.height as usize);
    let mut rgba = vec![0u8; region.pixel_count() * 4];
    let mut coverage = vec![0u8; region.pixel_count()];

    let map_corner_row = |y: u32| -> Vec<Option<Point>> {
        (0..=region.width)
            .map(|x| {
                let p = Point::new(f64::from(region.x + x), f64::from(y));
                transform.inverse_checked(p).filter(|q| inside(canvas, *q))
            })
            .collect()
    };

    let n = supersample as usize;
    let step = 1.0 / supersample as f64;
    let total = (n * n) as u32;

    let mut top = map_corner_row(region.y);
    for row in 0..h {
        let sy = region.y + row as u32;
        let bottom = map_corner_row(sy + 1);
        for col in 0..w {
            let sx = region.x + col as u32;
            let idx = row * w + col;
            let corners_in = top[col].is_some()
                && top[col + 1].is_some()
                && bottom[col].is_some()
                && bottom[col + 1].is_some();

            let (color, cov) = if corners_in {
                let center = Point::new(f64::from(sx) + 0.5, f64::from(sy) + 0.5);
                match transform.inverse_checked(center) {
                    Some(q) => (sampler.sample(q), 255u8),
                    None => ([0.0; 4], 0u8),
                }
            } else {
                let mut acc = [0.0f32; 4];
                let mut hits = 0u32;
                for j in 0..n {
                    for i in 0..n {
                        let p = Point::new(
                            f64::from(sx) + (i as f64 + 0.5) * step,
                            f64::from(sy) + (j as f64 + 0.5) * step,
                        );
                        let Some(q) = transform.inverse_checked(p) else {
                            continue;
                        };
                        if !inside(canvas, q) {
                            continue;
                        }
                        let c = sampler.sample(q);
                        for k in 0..4 {
                            acc[k] += c[k];
                        }
                        hits += 1;
                    }
                }
                if hits == 0 {
                    ([0.0; 4], 0u8)
                } else {
                    let inv = 1.0 / hits as f32;
                    let cov = ((hits * 255 + total / 2) / total) as u8;
                    (acc.map(|c| c * inv), cov)
                }
            };

            coverage[idx] = cov;
            if cov > 0 {
                let out = &mut rgba[idx * 4..idx * 4 + 4];
                for k in 0..4 {
                    out[k] = color[k].round().clamp(0.0, 255.0) as u8;
                }
            }
        }
        top = bottom;
    }

    Ok(WarpedLayer {
        rgba8_premul: rgba,
        coverage,
    })
}

struct Sampler<'a> {
    raster: &'a Raster,
    source: Rect,
    scale_x: f64,
    scale_y: f64,
    matte: [f32; 4],
}

impl<'a> Sampler<'a> {
    fn new(src: &WarpSource<'a>) -> Self {
        Self {
            raster: src.raster,
            source: src.selection.source,
            scale_x: f64::from(src.raster.width()) / f64::from(src.poster_size.width),
            scale_y: f64::from(src.raster.height()) / f64::from(src.poster_size.height),
            matte: src.matte.map(f32::from),
        }
    }

    /// Premultiplied color at poster-space point `p`.
    fn sample(&self, p: Point) -> [f32; 4] {
        if !inside(self.source, p) {
            return self.matte;
        }
        bilinear(self.raster, p.x * self.scale_x, p.y * self.scale_y)
    }
}

fn inside(r: Rect, p: Point) -> bool {
    p.x >= r.x0 - EDGE_EPS
        && p.x <= r.x1 + EDGE_EPS
        && p.y >= r.y0 - EDGE_EPS
        && p.y <= r.y1 + EDGE_EPS
}

/// Bilinear sample with pixel centers at half-integers and clamped borders.
fn bilinear(r: &Raster, x: f64, y: f64) -> [f32; 4] {
    let max_x = f64::from(r.width() - 1);
    let max_y = f64::from(r.height() - 1);
    let fx = (x - 0.5).clamp(0.0, max_x);
    let fy = (y - 0.5).clamp(0.0, max_y);
    let x0 = fx.floor() as u32;
    let y0 = fy.floor() as u32;
    let x1 = (x0 + 1).min(r.width() - 1);
    let y1 = (y0 + 1).min(r.height() - 1);
    let tx = (fx - f64::from(x0)) as f32;
    let ty = (fy - f64::from(y0)) as f32;

    let p00 = r.pixel(x0, y0);
    let p10 = r.pixel(x1, y0);
    let p01 = r.pixel(x0, y1);
    let p11 = r.pixel(x1, y1);

    let mut out = [0.0f32; 4];
    for k in 0..4 {
        let top = f32::from(p00[k]) + (f32::from(p10[k]) - f32::from(p00[k])) * tx;
        let bot = f32::from(p01[k]) + (f32::from(p11[k]) - f32::from(p01[k])) * tx;
        out[k] = top + (bot - top) * ty;
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/compose/warp.rs"]
mod tests;
