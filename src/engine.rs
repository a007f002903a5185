use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::batch::cache::{CompositionCache, CompositionResult};
use crate::batch::orchestrator::{
    BatchContext, BatchOptions, BatchReport, PreparedPoster, SceneMemo, Targets, run_batch,
    summarize,
};
use crate::batch::request::PosterSource;
use crate::batch::source::ImageSource;
use crate::compose::grade::ColorGrade;
use crate::config::EngineConfig;
use crate::foundation::error::{MockupError, MockupResult};
use crate::resample::fill::FillMode;
use crate::store::pack::{MockupPack, PackDraft, PackId, PackPatch};
use crate::store::store::{ResolvedTargets, TemplateStore};
use crate::store::template::{MockupTemplate, TemplateDraft, TemplateId, TemplatePatch};

/// Store, cache, image source and worker pool behind one handle.
///
/// Template writes go through the engine so cached compositions of an edited or deleted
/// template are dropped with it. Reads may run concurrently with batches.
pub struct MockupEngine {
    config: EngineConfig,
    store: RwLock<TemplateStore>,
    cache: CompositionCache,
    source: Arc<dyn ImageSource>,
    scenes: SceneMemo,
    pool: rayon::ThreadPool,
}

impl std::fmt::Debug for MockupEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockupEngine")
            .field("config", &self.config)
            .field("threads", &self.pool.current_num_threads())
            .field("cache", &self.cache.stats())
            .finish_non_exhaustive()
    }
}

impl MockupEngine {
    pub fn new(
        config: EngineConfig,
        store: TemplateStore,
        source: Arc<dyn ImageSource>,
    ) -> MockupResult<Self> {
        config.validate()?;
        let pool = build_thread_pool(config.worker_threads)?;
        tracing::debug!(threads = pool.current_num_threads(), "mockup engine ready");
        Ok(Self {
            cache: CompositionCache::new(config.cache_max_entries, config.cache_max_bytes),
            config,
            store: RwLock::new(store),
            source,
            scenes: SceneMemo::default(),
            pool,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &CompositionCache {
        &self.cache
    }

    pub fn image_source(&self) -> &Arc<dyn ImageSource> {
        &self.source
    }

    /// Read access to the store.
    pub fn store(&self) -> MockupResult<RwLockReadGuard<'_, TemplateStore>> {
        self.store
            .read()
            .map_err(|_| MockupError::Other(anyhow::anyhow!("template store lock poisoned")))
    }

    fn store_mut(&self) -> MockupResult<RwLockWriteGuard<'_, TemplateStore>> {
        self.store
            .write()
            .map_err(|_| MockupError::Other(anyhow::anyhow!("template store lock poisoned")))
    }

    /// Clone of the current store, for persisting.
    pub fn snapshot(&self) -> MockupResult<TemplateStore> {
        Ok(self.store()?.clone())
    }

    pub fn create_template(&self, draft: TemplateDraft) -> MockupResult<MockupTemplate> {
        self.store_mut()?.create_template(draft)
    }

    /// Edit a template; on success its cached compositions are dropped.
    pub fn update_template(
        &self,
        id: &TemplateId,
        patch: &TemplatePatch,
    ) -> MockupResult<MockupTemplate> {
        let (before, after) = {
            let mut store = self.store_mut()?;
            let before = store.template(id)?.clone();
            let after = store.update_template(id, patch)?;
            (before, after)
        };
        if after.revision != before.revision {
            self.cache.invalidate_template(id)?;
        }
        Ok(after)
    }

    pub fn set_template_active(&self, id: &TemplateId, active: bool) -> MockupResult<()> {
        self.store_mut()?.set_active(id, active)
    }

    pub fn delete_template(&self, id: &TemplateId) -> MockupResult<MockupTemplate> {
        let removed = self.store_mut()?.delete_template(id)?;
        self.cache.invalidate_template(id)?;
        Ok(removed)
    }

    pub fn create_pack(&self, draft: PackDraft) -> MockupResult<MockupPack> {
        self.store_mut()?.create_pack(draft)
    }

    pub fn update_pack(&self, id: &PackId, patch: &PackPatch) -> MockupResult<MockupPack> {
        self.store_mut()?.update_pack(id, patch)
    }

    pub fn delete_pack(&self, id: &PackId) -> MockupResult<MockupPack> {
        self.store_mut()?.delete_pack(id)
    }

    /// Compose one poster into one template.
    ///
    /// Unlike [`MockupEngine::compose_many`], a failure of the single item is returned as the
    /// error.
    pub fn compose(
        &self,
        template_id: &TemplateId,
        poster: &PosterSource,
        fill_mode: FillMode,
        color_grade: ColorGrade,
    ) -> MockupResult<Arc<CompositionResult>> {
        let template = self.store()?.template(template_id)?.clone();
        let prepared = PreparedPoster::fetch(self.source.as_ref(), poster);
        let mut items = run_batch(
            &self.context(),
            &prepared,
            std::slice::from_ref(&template),
            fill_mode,
            color_grade,
            &BatchOptions::default(),
        );
        items
            .pop()
            .ok_or_else(|| MockupError::Other(anyhow::anyhow!("batch of one returned no item")))?
            .result
    }

    /// Compose one poster against many templates with bounded parallelism.
    ///
    /// `color_grade` overrides the pack's grade when set. Only resolution errors (an unknown
    /// pack) fail the call; every per-template failure is reported in the returned
    /// [`BatchReport`].
    #[tracing::instrument(skip(self, poster, options))]
    pub fn compose_many(
        &self,
        poster: &PosterSource,
        targets: &Targets,
        fill_mode: FillMode,
        color_grade: Option<ColorGrade>,
        options: &BatchOptions<'_>,
    ) -> MockupResult<BatchReport> {
        let resolved = self.resolve(targets)?;
        let grade = color_grade
            .or(resolved.color_grade)
            .unwrap_or_default();
        let prepared = PreparedPoster::fetch(self.source.as_ref(), poster);
        let items = run_batch(
            &self.context(),
            &prepared,
            &resolved.templates,
            fill_mode,
            grade,
            options,
        );
        let report = summarize(items, resolved.dangling);
        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed,
            cancelled = report.cancelled,
            cache_hits = report.cache_hits,
            skipped = report.dangling.len(),
            "batch finished"
        );
        Ok(report)
    }

    /// Resolve targets against the current store without composing anything.
    pub fn resolve(&self, targets: &Targets) -> MockupResult<ResolvedTargets> {
        let store = self.store()?;
        match targets {
            Targets::Templates(ids) => Ok(store.resolve_templates(ids)),
            Targets::Pack(id) => store.resolve_pack(id),
        }
    }

    fn context(&self) -> BatchContext<'_> {
        BatchContext {
            cache: &self.cache,
            source: self.source.as_ref(),
            scenes: &self.scenes,
            render: self.config.render_opts(),
            pool: &self.pool,
        }
    }
}

fn build_thread_pool(threads: Option<usize>) -> MockupResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(MockupError::validation(
            "worker_threads must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("mockup-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| MockupError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}")))
}
