use crate::foundation::core::{PixelSize, Rect};
use crate::foundation::error::{MockupError, MockupResult};

/// Policy for reconciling the poster's aspect ratio with the destination's.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FillMode {
    /// Map the whole poster, distorting proportions if needed.
    Stretch,
    /// Map the whole poster inside matte padding, preserving proportions.
    Fit,
    /// Map the centered sub-rectangle with the destination's aspect (CSS `cover`).
    #[default]
    Fill,
}

impl FillMode {
    /// Stable lower-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stretch => "stretch",
            Self::Fit => "fit",
            Self::Fill => "fill",
        }
    }
}

impl std::fmt::Display for FillMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FillMode {
    type Err = MockupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stretch" => Ok(Self::Stretch),
            "fit" => Ok(Self::Fit),
            "fill" | "cover" => Ok(Self::Fill),
            other => Err(MockupError::validation(format!("unknown fill mode '{other}'"))),
        }
    }
}

/// Which part of the poster is mapped onto the destination quadrilateral.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SourceSelection {
    /// Poster-space rectangle carrying poster pixels.
    pub source: Rect,
    /// Poster-space rectangle mapped onto the quad's corners. Equal to `source` except in
    /// [`FillMode::Fit`], where it extends past the poster and the excess is matte.
    pub canvas: Rect,
}

impl SourceSelection {
    /// Whether the canvas carries matte padding around the poster.
    pub fn is_padded(&self) -> bool {
        self.canvas != self.source
    }
}

/// Decide which poster sub-rectangle (and padding) maps onto a destination whose bounding box
/// has aspect `dst_bbox_aspect` (width over height).
///
/// Pure in `(poster_size, dst_bbox_aspect, mode)`: identical input gives bit-identical output.
pub fn select_source_rect(
    poster_size: PixelSize,
    dst_bbox_aspect: f64,
    mode: FillMode,
) -> MockupResult<SourceSelection> {
    if !dst_bbox_aspect.is_finite() || dst_bbox_aspect <= 0.0 {
        return Err(MockupError::validation(format!(
            "destination aspect must be finite and > 0, got {dst_bbox_aspect}"
        )));
    }

    let pw = f64::from(poster_size.width);
    let ph = f64::from(poster_size.height);
    let full = Rect::new(0.0, 0.0, pw, ph);
    let poster_aspect = pw / ph;

    let selection = match mode {
        FillMode::Stretch => SourceSelection {
            source: full,
            canvas: full,
        },
        FillMode::Fit => {
            let (cw, ch) = if poster_aspect > dst_bbox_aspect {
                (pw, pw / dst_bbox_aspect)
            } else {
                (ph * dst_bbox_aspect, ph)
            };
            let ox = (cw - pw) * 0.5;
            let oy = (ch - ph) * 0.5;
            SourceSelection {
                source: full,
                canvas: Rect::new(-ox, -oy, pw + ox, ph + oy),
            }
        }
        FillMode::Fill => {
            let crop = if poster_aspect > dst_bbox_aspect {
                let cw = ph * dst_bbox_aspect;
                let x0 = (pw - cw) * 0.5;
                Rect::new(x0, 0.0, x0 + cw, ph)
            } else {
                let ch = pw / dst_bbox_aspect;
                let y0 = (ph - ch) * 0.5;
                Rect::new(0.0, y0, pw, y0 + ch)
            };
            SourceSelection {
                source: crop,
                canvas: crop,
            }
        }
    };
    Ok(selection)
}

#[cfg(test)]
#[path = "../../tests/unit/resample/fill.rs"]
mod tests;
