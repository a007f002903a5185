use std::sync::Arc;

use xxhash_rust::xxh3::{Xxh3, xxh3_128};

use crate::compose::RenderOpts;
use crate::compose::blend::BlendMode;
use crate::compose::grade::ColorGrade;
use crate::resample::fill::FillMode;
use crate::store::template::MockupTemplate;

const XXH3_SEED: u64 = 0x51f1_b0c3_9e27_6d4a;

/// Where a poster's bytes come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PosterSource {
    /// Resolved through the engine's image source.
    Url(String),
    /// Already in memory.
    Bytes(Arc<Vec<u8>>),
}

impl PosterSource {
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url(url.into())
    }

    pub fn bytes(bytes: Vec<u8>) -> Self {
        Self::Bytes(Arc::new(bytes))
    }
}

/// Content hash of poster bytes; URL churn on unchanged bytes keeps the same hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PosterHash(pub u128);

impl PosterHash {
    pub fn of(bytes: &[u8]) -> Self {
        Self(xxh3_128(bytes))
    }
}

/// Stable 128-bit cache key of one composition request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestKey {
    pub hi: u64,
    pub lo: u64,
}

impl std::fmt::Display for RequestKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}{:016x}", self.hi, self.lo)
    }
}

/// Everything that determines one composed output. Not persisted.
#[derive(Clone, Copy, Debug)]
pub struct CompositionRequest<'a> {
    pub poster: PosterHash,
    pub template: &'a MockupTemplate,
    pub fill_mode: FillMode,
    pub color_grade: ColorGrade,
    pub render: &'a RenderOpts,
}

impl CompositionRequest<'_> {
    pub fn key(&self) -> RequestKey {
        let mut h = StableHasher::new();
        h.write_u64((self.poster.0 >> 64) as u64);
        h.write_u64(self.poster.0 as u64);

        let t = self.template;
        h.write_str(t.id.as_str());
        h.write_u64(t.revision);
        h.write_str(&t.scene_image.url);
        h.write_u32(t.scene_image.width);
        h.write_u32(t.scene_image.height);
        for p in t.corners.corners() {
            h.write_f64(p.x);
            h.write_f64(p.y);
        }
        h.write_u8(match t.blend_mode {
            BlendMode::Normal => 0,
            BlendMode::Multiply => 1,
        });
        h.write_f32(t.blend_alpha);
        h.write_u32(t.feather_radius);

        h.write_str(self.fill_mode.as_str());
        h.write_str(self.color_grade.as_str());

        h.write_bytes(&self.render.matte_rgba);
        h.write_u32(self.render.supersample);
        h.write_bool(self.render.prefilter);
        h.finish()
    }
}

struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_f32(&mut self, v: f32) {
        self.write_u32(v.to_bits());
    }

    fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    fn write_str(&mut self, s: &str) {
        self.write_u64(s.len() as u64);
        self.write_bytes(s.as_bytes());
    }

    fn finish(self) -> RequestKey {
        let v = self.inner.digest128();
        RequestKey {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/batch/request.rs"]
mod tests;
