use crate::foundation::error::{MockupError, MockupResult};

/// Soften a coverage mask: erode by `radius` pixels, then Gaussian-blur with the same radius.
///
/// Erosion pulls the mask inside the quad first so the blur fades to zero at the photographed
/// edge instead of bleeding past it.
pub(crate) fn feather_mask(
    mask: &[u8],
    width: u32,
    height: u32,
    radius: u32,
) -> MockupResult<Vec<u8>> {
    check_len(mask, width, height)?;
    if radius == 0 {
        return Ok(mask.to_vec());
    }
    let eroded = erode_alpha8(mask, width, height, radius)?;
    let sigma = (radius as f32 * 0.5).max(0.5);
    blur_alpha8(&eroded, width, height, radius, sigma)
}

/// Separable square min-filter.
pub(crate) fn erode_alpha8(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
) -> MockupResult<Vec<u8>> {
    check_len(src, width, height)?;
    if radius == 0 {
        return Ok(src.to_vec());
    }
    let (w, h) = (width as usize, height as usize);
    let r = radius as usize;
    let mut tmp = vec![0u8; src.len()];
    let mut out = vec![0u8; src.len()];

    for y in 0..h {
        let row = &src[y * w..(y + 1) * w];
        for x in 0..w {
            let lo = x.saturating_sub(r);
            let hi = (x + r).min(w - 1);
            // Pixels beyond the buffer count as uncovered.
            let edge = x < r || x + r >= w;
            let m = row[lo..=hi].iter().copied().min().unwrap_or(0);
            tmp[y * w + x] = if edge { 0 } else { m };
        }
    }
    for x in 0..w {
        for y in 0..h {
            let lo = y.saturating_sub(r);
            let hi = (y + r).min(h - 1);
            let edge = y < r || y + r >= h;
            let mut m = 255u8;
            for yy in lo..=hi {
                m = m.min(tmp[yy * w + x]);
            }
            out[y * w + x] = if edge { 0 } else { m };
        }
    }
    Ok(out)
}

/// Gaussian blur of a single-channel mask with Q16 fixed-point weights and clamped edges.
pub(crate) fn blur_alpha8(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    sigma: f32,
) -> MockupResult<Vec<u8>> {
    check_len(src, width, height)?;
    if radius == 0 {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; src.len()];
    let mut out = vec![0u8; src.len()];

    horizontal_pass(src, &mut tmp, width, height, &kernel);
    vertical_pass(&tmp, &mut out, width, height, &kernel);
    Ok(out)
}

fn check_len(buf: &[u8], width: u32, height: u32) -> MockupResult<()> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| MockupError::validation("mask buffer size overflow"))?;
    if buf.len() != expected {
        return Err(MockupError::validation(
            "mask buffer must match width*height",
        ));
    }
    Ok(())
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> MockupResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(MockupError::validation("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let mut weights_f = Vec::<f64>::with_capacity((2 * r + 1) as usize);
    let mut sum = 0.0f64;
    let sigma = sigma as f64;
    let denom = 2.0 * sigma * sigma;
    for i in -r..=r {
        let x = i as f64;
        let w = (-x * x / denom).exp();
        weights_f.push(w);
        sum += w;
    }

    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = ((wf / sum) * 65536.0).round() as i64;
        let q = q.clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        let new_mid = (i64::from(weights[mid]) + delta).clamp(0, 65536);
        weights[mid] = new_mid as u32;
    }

    Ok(weights)
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    for y in 0..height as i32 {
        for x in 0..w {
            let mut acc = 0u64;
            for (ki, &kw) in k.iter().enumerate() {
                let sx = (x + ki as i32 - radius).clamp(0, w - 1);
                acc += u64::from(kw) * u64::from(src[(y * w + sx) as usize]);
            }
            dst[(y * w + x) as usize] = q16_to_u8(acc);
        }
    }
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0u64;
            for (ki, &kw) in k.iter().enumerate() {
                let sy = (y + ki as i32 - radius).clamp(0, h - 1);
                acc += u64::from(kw) * u64::from(src[(sy * w + x) as usize]);
            }
            dst[(y * w + x) as usize] = q16_to_u8(acc);
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    let v = (acc + 32768) >> 16;
    v.min(255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/compose/mask.rs"]
mod tests;
