use std::io::Cursor;
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::core::{PixelSize, Rgba8Premul};
use crate::foundation::error::{MockupError, MockupResult};

/// Decoded raster image in premultiplied RGBA8 form.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    size: PixelSize,
    rgba8_premul: Arc<Vec<u8>>,
}

impl Raster {
    /// Wrap a premultiplied RGBA8 buffer whose length must match `size`.
    pub fn from_premul(size: PixelSize, rgba8_premul: Vec<u8>) -> MockupResult<Self> {
        if rgba8_premul.len() != size.rgba8_len()? {
            return Err(MockupError::validation(
                "raster buffer must match width*height*4",
            ));
        }
        Ok(Self {
            size,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }

    /// A raster filled with one color.
    pub fn solid(size: PixelSize, color: Rgba8Premul) -> MockupResult<Self> {
        let px = color.to_array();
        let len = size.rgba8_len()?;
        Self::from_premul(size, px.repeat(len / 4))
    }

    /// Convert a straight-alpha `image` buffer.
    pub fn from_rgba_image(img: image::RgbaImage) -> MockupResult<Self> {
        let (width, height) = img.dimensions();
        let size = PixelSize::new(width, height)?;
        let mut data = img.into_raw();
        premultiply_rgba8_in_place(&mut data);
        Self::from_premul(size, data)
    }

    /// Pixel dimensions.
    pub fn size(&self) -> PixelSize {
        self.size
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.size.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.size.height
    }

    /// Row-major premultiplied RGBA8 bytes.
    pub fn data(&self) -> &[u8] {
        self.rgba8_premul.as_slice()
    }

    /// Mutable access, cloning the buffer if it is shared.
    pub fn data_mut(&mut self) -> &mut Vec<u8> {
        Arc::make_mut(&mut self.rgba8_premul)
    }

    /// Premultiplied pixel at `(x, y)`; out-of-bounds reads are transparent.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.size.width || y >= self.size.height {
            return [0; 4];
        }
        let idx = ((y as usize) * (self.size.width as usize) + (x as usize)) * 4;
        let d = self.data();
        [d[idx], d[idx + 1], d[idx + 2], d[idx + 3]]
    }

    /// Straight-alpha copy as an `image` buffer.
    pub fn to_rgba_image(&self) -> MockupResult<image::RgbaImage> {
        let mut data = self.data().to_vec();
        unpremultiply_rgba8_in_place(&mut data);
        image::RgbaImage::from_raw(self.size.width, self.size.height, data)
            .ok_or_else(|| MockupError::validation("raster buffer does not match its size"))
    }

    /// Downscale by `factor` (0 < factor < 1) with a triangle filter.
    ///
    /// Filtering runs on premultiplied data so transparent texels do not bleed color.
    pub fn downscaled(&self, factor: f64) -> MockupResult<Self> {
        if !(factor.is_finite() && factor > 0.0 && factor < 1.0) {
            return Ok(self.clone());
        }
        let w = ((f64::from(self.size.width) * factor).ceil() as u32).max(1);
        let h = ((f64::from(self.size.height) * factor).ceil() as u32).max(1);
        let src =
            image::RgbaImage::from_raw(self.size.width, self.size.height, self.data().to_vec())
                .ok_or_else(|| {
                    MockupError::validation("raster buffer does not match its size")
                })?;
        let out = image::imageops::resize(&src, w, h, image::imageops::FilterType::Triangle);
        Self::from_premul(PixelSize::new(w, h)?, out.into_raw())
    }
}

/// Decode PNG/JPEG/... bytes into a premultiplied raster.
///
/// Any codec failure is reported as [`MockupError::ImageDecode`].
pub fn decode_image(bytes: &[u8]) -> MockupResult<Raster> {
    let dyn_img = image::load_from_memory(bytes)
        .context("decode image from memory")
        .map_err(|e| MockupError::decode(format!("{e:#}")))?;
    Raster::from_rgba_image(dyn_img.to_rgba8()).map_err(|e| MockupError::decode(e.to_string()))
}

/// Encode a raster as PNG bytes (straight alpha).
pub fn encode_png(raster: &Raster) -> MockupResult<Vec<u8>> {
    let img = raster.to_rgba_image()?;
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(buf)
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 255 {
            continue;
        }
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        if a == 255 || a == 0 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}
