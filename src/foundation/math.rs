pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

/// Quantize a unit-interval value to `0..=255`, clamping out-of-range input.
pub(crate) fn unit_to_u8(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Round a finite `f64` to the nearest `u8`, clamping into range.
pub(crate) fn round_clamp_u8(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Twice the signed area of triangle `(a, b, c)`; positive for clockwise order in y-down space.
pub(crate) fn cross3(a: kurbo::Point, b: kurbo::Point, c: kurbo::Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
