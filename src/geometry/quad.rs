use crate::foundation::core::{Point, Rect};
use crate::foundation::error::{MockupError, MockupResult};
use crate::foundation::math::cross3;

/// Relative tolerance for collinear/coincident corner detection, scaled by the squared extent.
const COLLINEAR_EPS: f64 = 1e-6;

/// Four scene-pixel corners ordered top-left, top-right, bottom-right, bottom-left.
///
/// Construction does not validate; call [`Quadrilateral::validate`] (or use
/// [`Quadrilateral::try_new`]) before persisting or composing.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "[[f64; 2]; 4]", into = "[[f64; 2]; 4]")]
pub struct Quadrilateral {
    corners: [Point; 4],
}

impl Quadrilateral {
    /// Wrap four corners without validating them.
    pub fn new(corners: [Point; 4]) -> Self {
        Self { corners }
    }

    /// Wrap and validate four corners.
    pub fn try_new(corners: [Point; 4]) -> MockupResult<Self> {
        let q = Self::new(corners);
        q.validate()?;
        Ok(q)
    }

    /// Corners in TL, TR, BR, BL order.
    pub fn corners(&self) -> [Point; 4] {
        self.corners
    }

    /// Corner `i` (0..4).
    pub fn corner(&self, i: usize) -> Point {
        self.corners[i % 4]
    }

    /// Check that the quadrilateral can carry a projective mapping from a rectangle.
    ///
    /// Rejects non-finite coordinates, coincident or collinear corner triples, zero area,
    /// self-intersection, concavity and counter-clockwise (mirrored) corner order.
    pub fn validate(&self) -> MockupResult<()> {
        let c = &self.corners;
        if c.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(MockupError::geometry("corner coordinates must be finite"));
        }

        let mut extent = 0.0f64;
        for i in 0..4 {
            for j in (i + 1)..4 {
                extent = extent.max(c[i].distance(c[j]));
            }
        }
        if extent <= 0.0 {
            return Err(MockupError::geometry("all corners are coincident"));
        }
        let tol = COLLINEAR_EPS * extent * extent;

        for (i, j, k) in [(0, 1, 2), (0, 1, 3), (0, 2, 3), (1, 2, 3)] {
            if cross3(c[i], c[j], c[k]).abs() <= tol {
                return Err(MockupError::geometry(format!(
                    "corners {i}, {j} and {k} are collinear or coincident"
                )));
            }
        }

        let turns = [0, 1, 2, 3].map(|i| cross3(c[i], c[(i + 1) % 4], c[(i + 2) % 4]));
        if turns.iter().all(|&t| t > 0.0) {
            return Ok(());
        }
        if turns.iter().all(|&t| t < 0.0) {
            return Err(MockupError::geometry(
                "corners are counter-clockwise; expected top-left, top-right, bottom-right, bottom-left",
            ));
        }
        if self.is_self_intersecting() {
            return Err(MockupError::geometry("quadrilateral is self-intersecting"));
        }
        Err(MockupError::geometry("quadrilateral is concave"))
    }

    fn is_self_intersecting(&self) -> bool {
        let c = &self.corners;
        segments_cross(c[0], c[1], c[2], c[3]) || segments_cross(c[1], c[2], c[3], c[0])
    }

    /// Unsigned shoelace area.
    pub fn area(&self) -> f64 {
        let c = &self.corners;
        let mut twice = 0.0;
        for i in 0..4 {
            let a = c[i];
            let b = c[(i + 1) % 4];
            twice += a.x * b.y - b.x * a.y;
        }
        (twice * 0.5).abs()
    }

    /// Axis-aligned bounding box.
    pub fn bounding_box(&self) -> Rect {
        let c = &self.corners;
        let mut r = Rect::from_points(c[0], c[1]);
        r = r.union_pt(c[2]);
        r.union_pt(c[3])
    }

    /// Width over height of the bounding box.
    pub fn bbox_aspect(&self) -> f64 {
        let bb = self.bounding_box();
        bb.width() / bb.height()
    }

    /// Point-in-quad test for a validated (convex, clockwise) quadrilateral. Edges count as inside.
    pub fn contains(&self, p: Point) -> bool {
        let c = &self.corners;
        (0..4).all(|i| cross3(c[i], c[(i + 1) % 4], p) >= 0.0)
    }

    /// Reorder four arbitrarily placed corners into TL, TR, BR, BL.
    ///
    /// Corners are sorted clockwise (screen space) around their centroid and rotated so the corner
    /// with the smallest `x + y` comes first. Already-ordered input is returned unchanged.
    pub fn normalized_order(&self) -> Self {
        let c = self.corners;
        let cx = c.iter().map(|p| p.x).sum::<f64>() / 4.0;
        let cy = c.iter().map(|p| p.y).sum::<f64>() / 4.0;

        let mut sorted = c;
        sorted.sort_by(|a, b| {
            let aa = (a.y - cy).atan2(a.x - cx);
            let ab = (b.y - cy).atan2(b.x - cx);
            aa.total_cmp(&ab)
        });

        let start = (0..4)
            .min_by(|&i, &j| {
                let si = sorted[i].x + sorted[i].y;
                let sj = sorted[j].x + sorted[j].y;
                si.total_cmp(&sj)
            })
            .unwrap_or(0);
        sorted.rotate_left(start);
        Self { corners: sorted }
    }

    /// Clamp every corner into `bounds`.
    pub fn clamped_to(&self, bounds: Rect) -> Self {
        Self {
            corners: self.corners.map(|p| clamp_point(p, bounds)),
        }
    }
}

impl From<[[f64; 2]; 4]> for Quadrilateral {
    fn from(v: [[f64; 2]; 4]) -> Self {
        Self::new(v.map(|[x, y]| Point::new(x, y)))
    }
}

impl From<Quadrilateral> for [[f64; 2]; 4] {
    fn from(q: Quadrilateral) -> Self {
        q.corners.map(|p| [p.x, p.y])
    }
}

/// Clamp a point into `bounds` (inclusive).
pub(crate) fn clamp_point(p: Point, bounds: Rect) -> Point {
    Point::new(p.x.clamp(bounds.x0, bounds.x1), p.y.clamp(bounds.y0, bounds.y1))
}

fn segments_cross(a: Point, b: Point, c: Point, d: Point) -> bool {
    let d1 = cross3(a, b, c);
    let d2 = cross3(a, b, d);
    let d3 = cross3(c, d, a);
    let d4 = cross3(c, d, b);
    (d1 > 0.0) != (d2 > 0.0) && (d3 > 0.0) != (d4 > 0.0)
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/quad.rs"]
mod tests;
