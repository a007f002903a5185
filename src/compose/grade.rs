//! Named color grades applied to the whole composed image.
//!
//! Each preset compiles to a per-channel 256-entry LUT (lift, gamma, gain, then an S-curve
//! contrast term) followed by a saturation step around Rec. 709 luma.

use crate::foundation::error::{MockupError, MockupResult};
use crate::foundation::math::{round_clamp_u8, unit_to_u8};

/// A shared "mood" preset so every mockup in a pack has a consistent look.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ColorGrade {
    /// No grading.
    #[default]
    None,
    /// Golden, slightly lifted shadows.
    Warm,
    /// Blue-leaning daylight.
    Cool,
    /// Dark, contrasty, desaturated.
    Moody,
    /// Airy, lifted exposure.
    Bright,
    /// Faded blacks, yellowed highlights.
    Vintage,
}

#[derive(Clone, Copy, Debug)]
struct GradeParams {
    lift: [f64; 3],
    gamma: [f64; 3],
    gain: [f64; 3],
    contrast: f64,
    saturation: f64,
}

impl ColorGrade {
    /// Every preset, in display order.
    pub const ALL: [ColorGrade; 6] = [
        Self::None,
        Self::Warm,
        Self::Cool,
        Self::Moody,
        Self::Bright,
        Self::Vintage,
    ];

    /// Stable lower-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Warm => "warm",
            Self::Cool => "cool",
            Self::Moody => "moody",
            Self::Bright => "bright",
            Self::Vintage => "vintage",
        }
    }

    fn params(self) -> Option<GradeParams> {
        let p = match self {
            Self::None => return None,
            Self::Warm => GradeParams {
                lift: [0.02, 0.01, 0.0],
                gamma: [1.0, 1.0, 0.97],
                gain: [1.06, 1.01, 0.90],
                contrast: 0.10,
                saturation: 1.05,
            },
            Self::Cool => GradeParams {
                lift: [0.0, 0.01, 0.02],
                gamma: [0.98, 1.0, 1.02],
                gain: [0.93, 0.99, 1.06],
                contrast: 0.05,
                saturation: 0.97,
            },
            Self::Moody => GradeParams {
                lift: [0.0, 0.0, 0.01],
                gamma: [0.88, 0.88, 0.90],
                gain: [0.92, 0.92, 0.96],
                contrast: 0.35,
                saturation: 0.80,
            },
            Self::Bright => GradeParams {
                lift: [0.03, 0.03, 0.03],
                gamma: [1.15, 1.15, 1.15],
                gain: [1.04, 1.04, 1.04],
                contrast: -0.10,
                saturation: 1.05,
            },
            Self::Vintage => GradeParams {
                lift: [0.07, 0.05, 0.03],
                gamma: [1.02, 1.0, 0.95],
                gain: [1.0, 0.96, 0.84],
                contrast: -0.15,
                saturation: 0.75,
            },
        };
        Some(p)
    }

    /// Apply the grade in place to a premultiplied RGBA8 buffer.
    pub fn apply_in_place(self, rgba8_premul: &mut [u8]) -> MockupResult<()> {
        if !rgba8_premul.len().is_multiple_of(4) {
            return Err(MockupError::validation(
                "color grade expects an rgba8 buffer",
            ));
        }
        let Some(params) = self.params() else {
            return Ok(());
        };
        let lut = build_lut(&params);
        let sat = params.saturation;

        for px in rgba8_premul.chunks_exact_mut(4) {
            let a = px[3];
            if a == 0 {
                continue;
            }
            let mut rgb = [px[0], px[1], px[2]];
            if a != 255 {
                let af = u32::from(a);
                rgb = rgb.map(|c| ((u32::from(c) * 255 + af / 2) / af).min(255) as u8);
            }

            let graded = [
                f64::from(lut[0][rgb[0] as usize]),
                f64::from(lut[1][rgb[1] as usize]),
                f64::from(lut[2][rgb[2] as usize]),
            ];
            let luma = 0.2126 * graded[0] + 0.7152 * graded[1] + 0.0722 * graded[2];
            let out = graded.map(|c| round_clamp_u8(luma + (c - luma) * sat));

            if a == 255 {
                px[..3].copy_from_slice(&out);
            } else {
                let af = u16::from(a);
                for i in 0..3 {
                    px[i] = ((u16::from(out[i]) * af + 127) / 255) as u8;
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for ColorGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ColorGrade {
    type Err = MockupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|g| g.as_str() == key)
            .ok_or_else(|| MockupError::validation(format!("unknown color grade '{s}'")))
    }
}

fn build_lut(p: &GradeParams) -> [[u8; 256]; 3] {
    let mut lut = [[0u8; 256]; 3];
    for (ch, table) in lut.iter_mut().enumerate() {
        for (i, slot) in table.iter_mut().enumerate() {
            let x = i as f64 / 255.0;
            let lifted = x + p.lift[ch] * (1.0 - x);
            let y = p.gain[ch] * lifted.clamp(0.0, 1.0).powf(1.0 / p.gamma[ch]);
            let y = y.clamp(0.0, 1.0);
            let s_curve = y * y * (3.0 - 2.0 * y);
            *slot = unit_to_u8(y + (s_curve - y) * p.contrast);
        }
    }
    lut
}

#[cfg(test)]
#[path = "../../tests/unit/compose/grade.rs"]
mod tests;
