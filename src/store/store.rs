use std::path::Path;

use anyhow::Context as _;

use crate::compose::grade::ColorGrade;
use crate::foundation::error::{MockupError, MockupResult};
use crate::store::config_format::TemplateConfig;
use crate::store::pack::{MockupPack, PackDraft, PackId, PackPatch};
use crate::store::template::{MockupTemplate, TemplateDraft, TemplateId, TemplatePatch};

const SNAPSHOT_VERSION: u32 = 1;

/// In-memory template and pack store, validated on every write.
///
/// Lists keep creation order. Deleting a template leaves any pack references dangling; those are
/// reported by [`TemplateStore::resolve_pack`] and skipped at composition time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TemplateStore {
    templates: Vec<MockupTemplate>,
    packs: Vec<MockupPack>,
    next_template_seq: u64,
    next_pack_seq: u64,
}

/// Templates a request resolved to, in composition order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedTargets {
    pub templates: Vec<MockupTemplate>,
    /// Referenced ids with no template behind them.
    pub dangling: Vec<TemplateId>,
    /// Pack members skipped because they are deactivated.
    pub inactive: Vec<TemplateId>,
    /// The pack's grade, or `None` for an explicit id list.
    pub color_grade: Option<ColorGrade>,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct StoreSnapshot {
    version: u32,
    next_template_seq: u64,
    next_pack_seq: u64,
    templates: Vec<MockupTemplate>,
    packs: Vec<MockupPack>,
}

impl TemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_template(&mut self, draft: TemplateDraft) -> MockupResult<MockupTemplate> {
        self.next_template_seq += 1;
        let id = TemplateId::new(format!("tpl-{}", self.next_template_seq));
        let template = draft.into_template(id);
        if let Err(e) = template.validate() {
            self.next_template_seq -= 1;
            return Err(e);
        }
        tracing::debug!(id = %template.id, name = %template.name, "template created");
        self.templates.push(template.clone());
        Ok(template)
    }

    /// Create a template from the persisted editor config.
    pub fn import_config(
        &mut self,
        config: &TemplateConfig,
        fallback_name: &str,
        fallback_scene_url: &str,
    ) -> MockupResult<MockupTemplate> {
        self.create_template(config.to_draft(fallback_name, fallback_scene_url))
    }

    pub fn export_config(&self, id: &TemplateId) -> MockupResult<TemplateConfig> {
        Ok(TemplateConfig::from_template(self.template(id)?))
    }

    pub fn template(&self, id: &TemplateId) -> MockupResult<&MockupTemplate> {
        self.templates
            .iter()
            .find(|t| &t.id == id)
            .ok_or_else(|| MockupError::not_found(format!("template '{id}'")))
    }

    /// Apply `patch`; the stored template is untouched if the result fails validation.
    pub fn update_template(
        &mut self,
        id: &TemplateId,
        patch: &TemplatePatch,
    ) -> MockupResult<MockupTemplate> {
        let slot = self.template_slot(id)?;
        let mut next = self.templates[slot].clone();
        patch.apply_to(&mut next);
        next.validate()?;
        if next != self.templates[slot] {
            next.revision += 1;
        }
        tracing::debug!(id = %next.id, revision = next.revision, "template updated");
        self.templates[slot] = next.clone();
        Ok(next)
    }

    /// Activation does not change rendering, so the revision stays.
    pub fn set_active(&mut self, id: &TemplateId, active: bool) -> MockupResult<()> {
        let slot = self.template_slot(id)?;
        self.templates[slot].is_active = active;
        Ok(())
    }

    pub fn delete_template(&mut self, id: &TemplateId) -> MockupResult<MockupTemplate> {
        let slot = self.template_slot(id)?;
        let removed = self.templates.remove(slot);
        let referencing: Vec<&str> = self
            .packs
            .iter()
            .filter(|p| p.contains(id))
            .map(|p| p.id.as_str())
            .collect();
        if !referencing.is_empty() {
            tracing::warn!(
                template = %id,
                packs = ?referencing,
                "deleted template is still referenced by packs"
            );
        }
        Ok(removed)
    }

    pub fn list_templates(&self) -> &[MockupTemplate] {
        &self.templates
    }

    pub fn list_active(&self) -> Vec<&MockupTemplate> {
        self.templates.iter().filter(|t| t.is_active).collect()
    }

    pub fn create_pack(&mut self, draft: PackDraft) -> MockupResult<MockupPack> {
        self.next_pack_seq += 1;
        let pack = draft.into_pack(PackId::new(format!("pack-{}", self.next_pack_seq)));
        if let Err(e) = self.validate_pack(&pack) {
            self.next_pack_seq -= 1;
            return Err(e);
        }
        tracing::debug!(id = %pack.id, templates = pack.template_ids.len(), "pack created");
        self.packs.push(pack.clone());
        Ok(pack)
    }

    pub fn pack(&self, id: &PackId) -> MockupResult<&MockupPack> {
        self.packs
            .iter()
            .find(|p| &p.id == id)
            .ok_or_else(|| MockupError::not_found(format!("pack '{id}'")))
    }

    pub fn update_pack(&mut self, id: &PackId, patch: &PackPatch) -> MockupResult<MockupPack> {
        let slot = self
            .packs
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| MockupError::not_found(format!("pack '{id}'")))?;
        let mut next = self.packs[slot].clone();
        patch.apply_to(&mut next);
        if patch.template_ids.is_some() {
            self.validate_pack(&next)?;
        } else {
            next.validate_shape()?;
        }
        self.packs[slot] = next.clone();
        Ok(next)
    }

    /// Templates are not deleted with their pack.
    pub fn delete_pack(&mut self, id: &PackId) -> MockupResult<MockupPack> {
        let slot = self
            .packs
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| MockupError::not_found(format!("pack '{id}'")))?;
        Ok(self.packs.remove(slot))
    }

    pub fn list_packs(&self) -> &[MockupPack] {
        &self.packs
    }

    /// Expand a pack into its live, active templates in pack order.
    pub fn resolve_pack(&self, id: &PackId) -> MockupResult<ResolvedTargets> {
        let pack = self.pack(id)?;
        let mut out = ResolvedTargets {
            color_grade: Some(pack.color_grade),
            ..ResolvedTargets::default()
        };
        for tid in &pack.template_ids {
            match self.template(tid) {
                Ok(t) if t.is_active => out.templates.push(t.clone()),
                Ok(_) => out.inactive.push(tid.clone()),
                Err(_) => {
                    tracing::warn!(
                        pack = %id,
                        template = %tid,
                        "skipping dangling template reference"
                    );
                    out.dangling.push(tid.clone());
                }
            }
        }
        Ok(out)
    }

    /// Resolve an explicit id list; activation is not consulted.
    pub fn resolve_templates(&self, ids: &[TemplateId]) -> ResolvedTargets {
        let mut out = ResolvedTargets::default();
        for tid in ids {
            match self.template(tid) {
                Ok(t) => out.templates.push(t.clone()),
                Err(_) => {
                    tracing::warn!(template = %tid, "skipping unknown template id");
                    out.dangling.push(tid.clone());
                }
            }
        }
        out
    }

    pub fn to_json_string(&self) -> MockupResult<String> {
        let snapshot = StoreSnapshot {
            version: SNAPSHOT_VERSION,
            next_template_seq: self.next_template_seq,
            next_pack_seq: self.next_pack_seq,
            templates: self.templates.clone(),
            packs: self.packs.clone(),
        };
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    /// Load a snapshot, re-running every write-time check.
    ///
    /// Packs may reference missing templates (they dangle exactly as after a delete).
    pub fn from_json_str(s: &str) -> MockupResult<Self> {
        let snapshot: StoreSnapshot = serde_json::from_str(s)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(MockupError::validation(format!(
                "unsupported store snapshot version {}",
                snapshot.version
            )));
        }
        let mut store = Self {
            templates: Vec::with_capacity(snapshot.templates.len()),
            packs: Vec::with_capacity(snapshot.packs.len()),
            next_template_seq: snapshot.next_template_seq,
            next_pack_seq: snapshot.next_pack_seq,
        };
        for t in snapshot.templates {
            t.validate()
                .map_err(|e| MockupError::validation(format!("template '{}': {e}", t.id)))?;
            if store.template(&t.id).is_ok() {
                return Err(MockupError::validation(format!("duplicate template id '{}'", t.id)));
            }
            store.templates.push(t);
        }
        for p in snapshot.packs {
            p.validate_shape()?;
            if store.pack(&p.id).is_ok() {
                return Err(MockupError::validation(format!("duplicate pack id '{}'", p.id)));
            }
            store.packs.push(p);
        }
        // A hand-edited snapshot may lag behind its own ids; never reissue one.
        let template_floor = highest_seq("tpl-", store.templates.iter().map(|t| t.id.as_str()));
        let pack_floor = highest_seq("pack-", store.packs.iter().map(|p| p.id.as_str()));
        if store.next_template_seq < template_floor || store.next_pack_seq < pack_floor {
            tracing::warn!(
                next_template_seq = store.next_template_seq,
                next_pack_seq = store.next_pack_seq,
                template_floor,
                pack_floor,
                "snapshot sequence counters behind stored ids; raising them"
            );
        }
        store.next_template_seq = store.next_template_seq.max(template_floor);
        store.next_pack_seq = store.next_pack_seq.max(pack_floor);
        Ok(store)
    }

    pub fn save_json(&self, path: &Path) -> MockupResult<()> {
        let text = self.to_json_string()?;
        std::fs::write(path, text)
            .with_context(|| format!("write template store '{}'", path.display()))?;
        Ok(())
    }

    pub fn load_json(path: &Path) -> MockupResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read template store '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    fn template_slot(&self, id: &TemplateId) -> MockupResult<usize> {
        self.templates
            .iter()
            .position(|t| &t.id == id)
            .ok_or_else(|| MockupError::not_found(format!("template '{id}'")))
    }

    fn validate_pack(&self, pack: &MockupPack) -> MockupResult<()> {
        pack.validate_shape()?;
        if let Some(missing) = pack.template_ids.iter().find(|id| self.template(id).is_err()) {
            return Err(MockupError::validation(format!(
                "pack '{}' references unknown template '{missing}'",
                pack.name
            )));
        }
        Ok(())
    }
}

/// Largest numeric suffix among ids of the form `<prefix><n>`, or 0.
fn highest_seq<'a>(prefix: &str, ids: impl Iterator<Item = &'a str>) -> u64 {
    ids.filter_map(|id| id.strip_prefix(prefix)?.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "../../tests/unit/store/store.rs"]
mod tests;
