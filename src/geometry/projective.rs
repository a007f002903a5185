//! Closed-form rectangle-to-quadrilateral homography.
//!
//! The matrix is stored row-major:
//!
//! ```text
//! [ m0 m1 m2 ]
//! [ m3 m4 m5 ]
//! [ m6 m7 m8 ]
//! ```
//!
//! mapping `(x, y, 1)` to `(x', y', w')`, projected to `(x' / w', y' / w')`.

use crate::foundation::core::{Point, Rect};
use crate::foundation::error::{MockupError, MockupResult};
use crate::geometry::quad::Quadrilateral;

const PIVOT_EPS: f64 = 1e-12;
const W_EPS: f64 = 1e-12;

/// Projective mapping from a source rectangle onto a destination quadrilateral, with its exact
/// inverse.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectiveTransform {
    m: [f64; 9],
    inv: [f64; 9],
}

/// Solve the unique homography taking the corners of `src_rect` (TL, TR, BR, BL) onto
/// `dst_quad` in the same order.
///
/// The quadrilateral is validated first, so degenerate input yields [`MockupError::Geometry`].
pub fn solve_projective(
    src_rect: Rect,
    dst_quad: &Quadrilateral,
) -> MockupResult<ProjectiveTransform> {
    if !(src_rect.width().is_finite() && src_rect.height().is_finite())
        || src_rect.width() <= 0.0
        || src_rect.height() <= 0.0
    {
        return Err(MockupError::geometry(
            "source rectangle must have finite, positive width and height",
        ));
    }
    dst_quad.validate()?;

    // Condition the 8x8 system: unit square on the source side, centered and scaled
    // coordinates on the destination side.
    let bb = dst_quad.bounding_box();
    let cx = (bb.x0 + bb.x1) * 0.5;
    let cy = (bb.y0 + bb.y1) * 0.5;
    let s = bb.width().max(bb.height());

    let unit = [
        Point::new(0.0, 0.0),
        Point::new(1.0, 0.0),
        Point::new(1.0, 1.0),
        Point::new(0.0, 1.0),
    ];
    let dst = dst_quad
        .corners()
        .map(|p| Point::new((p.x - cx) / s, (p.y - cy) / s));

    let hn = solve_quad_to_quad(unit, dst)?;

    let ts = [
        1.0 / src_rect.width(),
        0.0,
        -src_rect.x0 / src_rect.width(),
        0.0,
        1.0 / src_rect.height(),
        -src_rect.y0 / src_rect.height(),
        0.0,
        0.0,
        1.0,
    ];
    let td_inv = [s, 0.0, cx, 0.0, s, cy, 0.0, 0.0, 1.0];

    let m = normalize(mul3(&mul3(&td_inv, &hn), &ts), src_rect.center())?;
    let det = det3(&m);
    if !det.is_finite() || det.abs() < PIVOT_EPS {
        return Err(MockupError::geometry("projective transform is singular"));
    }
    let mut inv = adjugate3(&m).map(|v| v / det);

    // Orient the inverse so that `w` is positive on the destination interior.
    let c = dst_quad.corners();
    let qx = c.iter().map(|p| p.x).sum::<f64>() / 4.0;
    let qy = c.iter().map(|p| p.y).sum::<f64>() / 4.0;
    if inv[6] * qx + inv[7] * qy + inv[8] < 0.0 {
        inv = inv.map(|v| -v);
    }

    if !m.iter().chain(inv.iter()).all(|v| v.is_finite()) {
        return Err(MockupError::geometry(
            "projective transform has non-finite coefficients",
        ));
    }
    Ok(ProjectiveTransform { m, inv })
}

impl ProjectiveTransform {
    /// Map a source-space point into scene space.
    ///
    /// Points on the source plane's vanishing line have no image and come back non-finite.
    pub fn forward(&self, p: Point) -> Point {
        apply(&self.m, p)
    }

    /// Map a scene-space point back into source space.
    ///
    /// Points on the scene plane's vanishing line have no preimage and come back non-finite.
    pub fn inverse(&self, p: Point) -> Point {
        apply(&self.inv, p)
    }

    /// Inverse mapping restricted to the half-plane in front of the camera; `None` behind it.
    pub fn inverse_checked(&self, p: Point) -> Option<Point> {
        let m = &self.inv;
        let w = m[6] * p.x + m[7] * p.y + m[8];
        if w <= W_EPS {
            return None;
        }
        Some(Point::new(
            (m[0] * p.x + m[1] * p.y + m[2]) / w,
            (m[3] * p.x + m[4] * p.y + m[5]) / w,
        ))
    }

    /// Row-major forward matrix, scaled so `w == 1` at the source rectangle's center.
    pub fn matrix(&self) -> [f64; 9] {
        self.m
    }

    /// Row-major inverse matrix (scale chosen so `w > 0` inside the destination quad).
    pub fn inverse_matrix(&self) -> [f64; 9] {
        self.inv
    }

    /// Image of `rect`'s corners (TL, TR, BR, BL) under the forward mapping.
    pub fn forward_rect(&self, rect: Rect) -> [Point; 4] {
        [
            Point::new(rect.x0, rect.y0),
            Point::new(rect.x1, rect.y0),
            Point::new(rect.x1, rect.y1),
            Point::new(rect.x0, rect.y1),
        ]
        .map(|p| self.forward(p))
    }
}

fn apply(m: &[f64; 9], p: Point) -> Point {
    let w = m[6] * p.x + m[7] * p.y + m[8];
    if w.abs() < W_EPS {
        return Point::new(f64::NAN, f64::NAN);
    }
    Point::new(
        (m[0] * p.x + m[1] * p.y + m[2]) / w,
        (m[3] * p.x + m[4] * p.y + m[5]) / w,
    )
}

/// Direct linear solve of the 8 unknowns `[a b c d e f g h]` (with `i = 1`):
///
/// ```text
/// [x y 1 0 0 0 -x*X -y*X] = X
/// [0 0 0 x y 1 -x*Y -y*Y] = Y
/// ```
fn solve_quad_to_quad(src: [Point; 4], dst: [Point; 4]) -> MockupResult<[f64; 9]> {
    let mut a = [[0.0f64; 8]; 8];
    let mut b = [0.0f64; 8];

    for i in 0..4 {
        let s = src[i];
        let d = dst[i];
        let r0 = 2 * i;
        let r1 = r0 + 1;

        a[r0][0] = s.x;
        a[r0][1] = s.y;
        a[r0][2] = 1.0;
        a[r0][6] = -d.x * s.x;
        a[r0][7] = -d.x * s.y;
        b[r0] = d.x;

        a[r1][3] = s.x;
        a[r1][4] = s.y;
        a[r1][5] = 1.0;
        a[r1][6] = -d.y * s.x;
        a[r1][7] = -d.y * s.y;
        b[r1] = d.y;
    }

    let h = solve_8x8(a, b)?;
    Ok([h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0])
}

/// Gaussian elimination with partial pivoting.
fn solve_8x8(mut a: [[f64; 8]; 8], mut b: [f64; 8]) -> MockupResult<[f64; 8]> {
    const N: usize = 8;

    for col in 0..N {
        let mut pivot_row = col;
        let mut pivot_abs = a[col][col].abs();
        for (row, r) in a.iter().enumerate().skip(col + 1) {
            if r[col].abs() > pivot_abs {
                pivot_abs = r[col].abs();
                pivot_row = row;
            }
        }
        if pivot_abs < PIVOT_EPS {
            return Err(MockupError::geometry(
                "homography system is singular (degenerate corners)",
            ));
        }
        if pivot_row != col {
            a.swap(col, pivot_row);
            b.swap(col, pivot_row);
        }

        let pivot = a[col][col];
        for row in (col + 1)..N {
            let factor = a[row][col] / pivot;
            if factor == 0.0 {
                continue;
            }
            for j in col..N {
                a[row][j] -= factor * a[col][j];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = [0.0f64; N];
    for i in (0..N).rev() {
        let mut sum = b[i];
        for j in (i + 1)..N {
            sum -= a[i][j] * x[j];
        }
        x[i] = sum / a[i][i];
    }
    Ok(x)
}

fn mul3(a: &[f64; 9], b: &[f64; 9]) -> [f64; 9] {
    let mut out = [0.0f64; 9];
    for row in 0..3 {
        for col in 0..3 {
            out[row * 3 + col] = a[row * 3] * b[col]
                + a[row * 3 + 1] * b[3 + col]
                + a[row * 3 + 2] * b[6 + col];
        }
    }
    out
}

/// Scale `m` so that `w == 1` at `anchor` (the source rectangle's center).
fn normalize(m: [f64; 9], anchor: Point) -> MockupResult<[f64; 9]> {
    let k = m[6] * anchor.x + m[7] * anchor.y + m[8];
    if !k.is_finite() || k.abs() < PIVOT_EPS {
        return Err(MockupError::geometry(
            "projective transform maps the source center to infinity",
        ));
    }
    Ok(m.map(|v| v / k))
}

fn det3(m: &[f64; 9]) -> f64 {
    let [a, b, c, d, e, f, g, h, i] = *m;
    a * (e * i - f * h) - b * (d * i - f * g) + c * (d * h - e * g)
}

fn adjugate3(m: &[f64; 9]) -> [f64; 9] {
    let [a, b, c, d, e, f, g, h, i] = *m;
    [
        e * i - f * h,
        c * h - b * i,
        b * f - c * e,
        f * g - d * i,
        a * i - c * g,
        c * d - a * f,
        d * h - e * g,
        b * g - a * h,
        a * e - b * d,
    ]
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/projective.rs"]
mod tests;
