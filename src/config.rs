use std::path::Path;

use anyhow::Context as _;

use crate::compose::RenderOpts;
use crate::foundation::error::{MockupError, MockupResult};

/// Engine-wide settings, loadable from JSON. Every field has a default.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Composition worker threads; `None` uses one per available CPU.
    pub worker_threads: Option<usize>,
    /// Maximum number of cached compositions.
    pub cache_max_entries: usize,
    /// Maximum total size of cached PNG bytes.
    pub cache_max_bytes: usize,
    /// Straight-alpha matte color for fit padding.
    pub matte_rgba: [u8; 4],
    /// Edge coverage grid per axis.
    pub supersample: u32,
    /// Downscale large posters before warping.
    pub prefilter: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let render = RenderOpts::default();
        Self {
            worker_threads: None,
            cache_max_entries: 256,
            cache_max_bytes: 512 * 1024 * 1024,
            matte_rgba: render.matte_rgba,
            supersample: render.supersample,
            prefilter: render.prefilter,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(s: &str) -> MockupResult<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_path(path: &Path) -> MockupResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read engine config '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> MockupResult<()> {
        if let Some(n) = self.worker_threads
            && n == 0
        {
            return Err(MockupError::validation(
                "worker_threads must be >= 1 when set",
            ));
        }
        if self.cache_max_entries == 0 {
            return Err(MockupError::validation("cache_max_entries must be >= 1"));
        }
        if self.cache_max_bytes == 0 {
            return Err(MockupError::validation("cache_max_bytes must be >= 1"));
        }
        if !(1..=8).contains(&self.supersample) {
            return Err(MockupError::validation(format!(
                "supersample must be in 1..=8, got {}",
                self.supersample
            )));
        }
        Ok(())
    }

    /// The per-composition subset of the settings.
    pub fn render_opts(&self) -> RenderOpts {
        RenderOpts {
            matte_rgba: self.matte_rgba,
            supersample: self.supersample,
            prefilter: self.prefilter,
        }
    }
}
