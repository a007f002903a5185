use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::SystemTime;

use rayon::prelude::*;
use xxhash_rust::xxh3::xxh3_128;

use crate::batch::cache::{CompositionCache, CompositionResult};
use crate::batch::request::{CompositionRequest, PosterHash, PosterSource};
use crate::batch::source::ImageSource;
use crate::compose::grade::ColorGrade;
use crate::compose::raster::{Raster, decode_image, encode_png};
use crate::compose::{RenderOpts, compose};
use crate::foundation::error::{MockupError, MockupResult};
use crate::resample::fill::FillMode;
use crate::store::pack::PackId;
use crate::store::template::{MockupTemplate, TemplateId};

const SCENE_MEMO_CAPACITY: usize = 32;

/// What a batch composes against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Targets {
    /// Explicit ids, composed in the given order regardless of activation.
    Templates(Vec<TemplateId>),
    /// A pack's active templates in pack order.
    Pack(PackId),
}

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchProgress {
    pub done: usize,
    pub total: usize,
}

/// Outcome of one template in a batch.
#[derive(Debug)]
pub struct BatchItem {
    pub template_id: TemplateId,
    pub result: MockupResult<Arc<CompositionResult>>,
    pub cache_hit: bool,
}

impl BatchItem {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-item outcomes of a batch, in target order. A batch never fails as a whole.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
    /// Referenced template ids that no longer exist; skipped with a warning.
    pub dangling: Vec<TemplateId>,
    pub succeeded: usize,
    pub failed: usize,
    pub cache_hits: usize,
    pub cancelled: usize,
}

impl BatchReport {
    pub fn item(&self, id: &TemplateId) -> Option<&BatchItem> {
        self.items.iter().find(|i| &i.template_id == id)
    }

    pub fn all_failed(&self) -> bool {
        !self.items.is_empty() && self.succeeded == 0
    }
}

/// Hooks and cancellation for one batch run.
#[derive(Default)]
pub struct BatchOptions<'a> {
    pub cancel: Option<CancelToken>,
    /// Called from worker threads as each item finishes.
    pub on_item: Option<&'a (dyn Fn(&BatchItem) + Sync)>,
    /// Called from worker threads after each item with the running count.
    pub on_progress: Option<&'a (dyn Fn(BatchProgress) + Sync)>,
}

/// Decoded scenes keyed by the xxh3 hash of their encoded bytes, shared across batches.
///
/// Scenes are re-fetched on every cache miss, so a scene replaced at the same URL is decoded
/// afresh; only the decode is skipped for unchanged bytes.
#[derive(Debug, Default)]
pub(crate) struct SceneMemo {
    inner: Mutex<(HashMap<u128, Arc<Raster>>, VecDeque<u128>)>,
}

impl SceneMemo {
    fn get(&self, content: u128) -> Option<Arc<Raster>> {
        self.inner.lock().ok()?.0.get(&content).cloned()
    }

    fn put(&self, content: u128, raster: Arc<Raster>) {
        let Ok(mut guard) = self.inner.lock() else {
            return;
        };
        let (map, order) = &mut *guard;
        if map.insert(content, raster).is_none() {
            order.push_back(content);
        }
        while order.len() > SCENE_MEMO_CAPACITY {
            if let Some(old) = order.pop_front() {
                map.remove(&old);
            }
        }
    }
}

/// Shared services a batch runs against.
pub(crate) struct BatchContext<'a> {
    pub(crate) cache: &'a CompositionCache,
    pub(crate) source: &'a dyn ImageSource,
    pub(crate) scenes: &'a SceneMemo,
    pub(crate) render: RenderOpts,
    pub(crate) pool: &'a rayon::ThreadPool,
}

/// The poster, fetched once per batch and decoded on first cache miss.
pub(crate) struct PreparedPoster {
    bytes: Result<(Arc<Vec<u8>>, PosterHash), String>,
    decoded: OnceLock<Result<Arc<Raster>, String>>,
}

impl PreparedPoster {
    pub(crate) fn fetch(source: &dyn ImageSource, poster: &PosterSource) -> Self {
        let bytes = match poster {
            PosterSource::Bytes(b) => Ok(b.clone()),
            PosterSource::Url(url) => source.fetch(url),
        }
        .map(|b| {
            let hash = PosterHash::of(&b);
            (b, hash)
        })
        .map_err(|e| match e {
            MockupError::ImageDecode(msg) => msg,
            other => other.to_string(),
        });
        Self {
            bytes,
            decoded: OnceLock::new(),
        }
    }

    fn hash(&self) -> MockupResult<PosterHash> {
        match &self.bytes {
            Ok((_, hash)) => Ok(*hash),
            Err(msg) => Err(MockupError::decode(format!("poster: {msg}"))),
        }
    }

    fn raster(&self) -> MockupResult<Arc<Raster>> {
        let (bytes, _) = self
            .bytes
            .as_ref()
            .map_err(|msg| MockupError::decode(format!("poster: {msg}")))?;
        self.decoded
            .get_or_init(|| {
                decode_image(bytes).map(Arc::new).map_err(|e| match e {
                    MockupError::ImageDecode(msg) => msg,
                    other => other.to_string(),
                })
            })
            .clone()
            .map_err(|msg| MockupError::decode(format!("poster: {msg}")))
    }
}

/// Compose `poster` against every template, in parallel on the context's pool.
///
/// Item order follows `templates`. Per-item failures are recorded, never propagated.
#[tracing::instrument(
    skip_all,
    fields(items = templates.len(), fill = %fill_mode, grade = %color_grade)
)]
pub(crate) fn run_batch(
    ctx: &BatchContext<'_>,
    poster: &PreparedPoster,
    templates: &[MockupTemplate],
    fill_mode: FillMode,
    color_grade: ColorGrade,
    options: &BatchOptions<'_>,
) -> Vec<BatchItem> {
    let total = templates.len();
    let done = AtomicUsize::new(0);

    ctx.pool.install(|| {
        templates
            .par_iter()
            .map(|template| {
                let item = if options.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                    BatchItem {
                        template_id: template.id.clone(),
                        result: Err(MockupError::Cancelled),
                        cache_hit: false,
                    }
                } else {
                    compose_one(ctx, poster, template, fill_mode, color_grade)
                };
                if let Err(e) = &item.result
                    && !matches!(e, MockupError::Cancelled)
                {
                    tracing::warn!(template = %item.template_id, error = %e, "composition failed");
                }
                if let Some(cb) = options.on_item {
                    cb(&item);
                }
                let n = done.fetch_add(1, Ordering::SeqCst) + 1;
                if let Some(cb) = options.on_progress {
                    cb(BatchProgress { done: n, total });
                }
                item
            })
            .collect()
    })
}

fn compose_one(
    ctx: &BatchContext<'_>,
    poster: &PreparedPoster,
    template: &MockupTemplate,
    fill_mode: FillMode,
    color_grade: ColorGrade,
) -> BatchItem {
    let (result, cache_hit) = match try_compose(ctx, poster, template, fill_mode, color_grade) {
        Ok((result, hit)) => (Ok(result), hit),
        Err(e) => (Err(e), false),
    };
    BatchItem {
        template_id: template.id.clone(),
        result,
        cache_hit,
    }
}

fn try_compose(
    ctx: &BatchContext<'_>,
    poster: &PreparedPoster,
    template: &MockupTemplate,
    fill_mode: FillMode,
    color_grade: ColorGrade,
) -> MockupResult<(Arc<CompositionResult>, bool)> {
    let key = CompositionRequest {
        poster: poster.hash()?,
        template,
        fill_mode,
        color_grade,
        render: &ctx.render,
    }
    .key();

    match ctx.cache.get(&key) {
        Ok(hit) => {
            tracing::debug!(template = %template.id, %key, "cache hit");
            return Ok((hit, true));
        }
        Err(MockupError::CacheMiss) => {}
        Err(e) => return Err(e),
    }

    let scene = load_scene(ctx, template)?;
    let poster = poster.raster()?;
    let spec = template.composite_spec(poster.size(), fill_mode, color_grade)?;
    let out = compose(&scene, &poster, &spec, &ctx.render)?;
    let png = encode_png(&out)?;
    let stored = ctx.cache.insert(CompositionResult {
        template_id: template.id.clone(),
        image_png: Arc::new(png),
        size: out.size(),
        generated_at: SystemTime::now(),
        key,
    })?;
    tracing::debug!(template = %template.id, %key, "composed");
    Ok((stored, false))
}

fn load_scene(ctx: &BatchContext<'_>, template: &MockupTemplate) -> MockupResult<Arc<Raster>> {
    let url = &template.scene_image.url;
    let bytes = ctx.source.fetch(url)?;
    let content = xxh3_128(&bytes);
    let scene = match ctx.scenes.get(content) {
        Some(scene) => scene,
        None => {
            let scene = Arc::new(decode_image(&bytes).map_err(|e| match e {
                MockupError::ImageDecode(msg) => {
                    MockupError::decode(format!("scene '{url}': {msg}"))
                }
                other => other,
            })?);
            ctx.scenes.put(content, scene.clone());
            scene
        }
    };

    let expected = (template.scene_image.width, template.scene_image.height);
    let actual = (scene.width(), scene.height());
    if expected != actual {
        ctx.cache.invalidate_template(&template.id)?;
        return Err(MockupError::SceneMismatch {
            template_id: template.id.to_string(),
            expected_width: expected.0,
            expected_height: expected.1,
            actual_width: actual.0,
            actual_height: actual.1,
        });
    }
    Ok(scene)
}

/// Fold per-item outcomes into a report.
pub(crate) fn summarize(items: Vec<BatchItem>, dangling: Vec<TemplateId>) -> BatchReport {
    let mut report = BatchReport {
        dangling,
        ..BatchReport::default()
    };
    for item in &items {
        match &item.result {
            Ok(_) => report.succeeded += 1,
            Err(MockupError::Cancelled) => report.cancelled += 1,
            Err(_) => report.failed += 1,
        }
        if item.cache_hit {
            report.cache_hits += 1;
        }
    }
    report.items = items;
    report
}
