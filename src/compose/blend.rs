use crate::foundation::error::{MockupError, MockupResult};
use crate::foundation::math::mul_div255_u8;

pub type PremulRgba8 = [u8; 4];

/// How the warped poster is combined with the scene underneath it.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Porter-Duff source-over.
    #[default]
    Normal,
    /// Scene times poster, keeping the photographed lighting and shadows.
    Multiply,
}

impl BlendMode {
    /// Stable lower-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Multiply => "multiply",
        }
    }
}

impl std::fmt::Display for BlendMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BlendMode {
    type Err = MockupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "multiply" => Ok(Self::Multiply),
            other => Err(MockupError::validation(format!("unknown blend mode '{other}'"))),
        }
    }
}

pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = add_sat_u8(sa, mul_div255(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255(u16::from(src[i]), op);
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = add_sat_u8(sc, dc);
    }
    out
}

/// Premultiplied multiply: `S*D + S*(1 - Da) + D*(1 - Sa)`, with `S` scaled by `opacity`.
pub fn multiply(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let s = src.map(|c| mul_div255(u16::from(c), op));
    if s[3] == 0 {
        return dst;
    }
    let inv_sa = 255u16 - u16::from(s[3]);
    let inv_da = 255u16 - u16::from(dst[3]);

    let mut out = [0u8; 4];
    for i in 0..3 {
        let sc = u16::from(s[i]);
        let dc = u16::from(dst[i]);
        let v = u16::from(mul_div255(sc, dc))
            + u16::from(mul_div255(sc, inv_da))
            + u16::from(mul_div255(dc, inv_sa));
        out[i] = v.min(255) as u8;
    }
    out[3] = add_sat_u8(s[3], mul_div255(u16::from(dst[3]), inv_sa));
    out
}

/// Blend `src` onto `dst` pixel by pixel, weighting each pixel by `mask * opacity`.
pub fn blend_masked_in_place(
    dst: &mut [u8],
    src: &[u8],
    mask: &[u8],
    mode: BlendMode,
    opacity: f32,
) -> MockupResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) || mask.len() * 4 != dst.len() {
        return Err(MockupError::validation(
            "blend_masked_in_place expects equal-length rgba8 buffers and a matching mask",
        ));
    }
    let opacity = opacity.clamp(0.0, 1.0);
    for ((d, s), &m) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)).zip(mask) {
        if m == 0 {
            continue;
        }
        let weight = opacity * (f32::from(m) / 255.0);
        let dp = [d[0], d[1], d[2], d[3]];
        let sp = [s[0], s[1], s[2], s[3]];
        let out = match mode {
            BlendMode::Normal => over(dp, sp, weight),
            BlendMode::Multiply => multiply(dp, sp, weight),
        };
        d.copy_from_slice(&out);
    }
    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u8 {
    mul_div255_u8(x, y)
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

#[cfg(test)]
#[path = "../../tests/unit/compose/blend.rs"]
mod tests;
