use std::collections::HashSet;

use crate::compose::grade::ColorGrade;
use crate::foundation::error::{MockupError, MockupResult};
use crate::store::template::TemplateId;

string_id!(
    /// Store-assigned pack identifier.
    PackId
);

/// A named, ordered group of templates sharing one color grade.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MockupPack {
    pub id: PackId,
    pub name: String,
    /// Composition order; ids are unique.
    pub template_ids: Vec<TemplateId>,
    #[serde(default)]
    pub color_grade: ColorGrade,
}

/// Fields of a pack before the store assigns it an id.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PackDraft {
    pub name: String,
    pub template_ids: Vec<TemplateId>,
    #[serde(default)]
    pub color_grade: ColorGrade,
}

impl PackDraft {
    pub fn new(
        name: impl Into<String>,
        template_ids: Vec<TemplateId>,
        color_grade: ColorGrade,
    ) -> Self {
        Self {
            name: name.into(),
            template_ids,
            color_grade,
        }
    }

    pub(crate) fn into_pack(self, id: PackId) -> MockupPack {
        MockupPack {
            id,
            name: self.name,
            template_ids: self.template_ids,
            color_grade: self.color_grade,
        }
    }
}

/// Partial edit of a pack; `None` fields are left unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PackPatch {
    pub name: Option<String>,
    pub template_ids: Option<Vec<TemplateId>>,
    pub color_grade: Option<ColorGrade>,
}

impl PackPatch {
    pub(crate) fn apply_to(&self, p: &mut MockupPack) {
        if let Some(name) = &self.name {
            p.name.clone_from(name);
        }
        if let Some(ids) = &self.template_ids {
            p.template_ids.clone_from(ids);
        }
        if let Some(grade) = self.color_grade {
            p.color_grade = grade;
        }
    }
}

impl MockupPack {
    /// Structural checks that do not need the store: name present, ids unique.
    pub fn validate_shape(&self) -> MockupResult<()> {
        if self.name.trim().is_empty() {
            return Err(MockupError::validation("pack name must not be empty"));
        }
        let mut seen = HashSet::with_capacity(self.template_ids.len());
        for id in &self.template_ids {
            if !seen.insert(id) {
                return Err(MockupError::validation(format!(
                    "pack '{}' lists template '{id}' more than once",
                    self.name
                )));
            }
        }
        Ok(())
    }

    pub fn contains(&self, id: &TemplateId) -> bool {
        self.template_ids.contains(id)
    }
}
