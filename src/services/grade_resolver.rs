use serde::Serialize;
use tracing::debug;

use crate::database::entities::custom_grades;
use crate::errors::FormulaResult;
use crate::formula_types::FormulaEntry;
use crate::services::formula_service::FormulaService;

/// Outcome of looking a grade up for a party
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GradeResolution {
    Base {
        entries: Vec<FormulaEntry>,
    },
    /// A custom grade; its entry list may be empty
    Custom {
        grade: custom_grades::Model,
        entries: Vec<FormulaEntry>,
    },
    Missing,
}

impl GradeResolution {
    pub fn entries(&self) -> &[FormulaEntry] {
        match self {
            GradeResolution::Base { entries } | GradeResolution::Custom { entries, .. } => entries,
            GradeResolution::Missing => &[],
        }
    }

    pub fn into_entries(self) -> Vec<FormulaEntry> {
        match self {
            GradeResolution::Base { entries } | GradeResolution::Custom { entries, .. } => entries,
            GradeResolution::Missing => Vec::new(),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, GradeResolution::Missing)
    }
}

/// Decides whether a grade name refers to a base or a custom grade.
/// Base rows take precedence when both exist under the same name.
#[derive(Clone)]
pub struct GradeResolver {
    formulas: FormulaService,
}

impl GradeResolver {
    pub fn new(formulas: FormulaService) -> Self {
        Self { formulas }
    }

    pub async fn resolve_grade(&self, party_id: i32, grade: &str) -> FormulaResult<GradeResolution> {
        let grade = grade.trim();

        let base = self.formulas.base_entries(party_id, grade).await?;
        if !base.is_empty() {
            debug!("Resolved '{}' for party {} as base grade", grade, party_id);
            return Ok(GradeResolution::Base { entries: base });
        }

        match self.formulas.find_custom_grade(party_id, grade).await? {
            Some(custom) => {
                let entries = self.formulas.custom_entries(custom.id).await?;
                debug!(
                    "Resolved '{}' for party {} as custom grade {}",
                    grade, party_id, custom.id
                );
                Ok(GradeResolution::Custom {
                    grade: custom,
                    entries,
                })
            }
            None => {
                debug!("No formula configured for '{}' of party {}", grade, party_id);
                Ok(GradeResolution::Missing)
            }
        }
    }

    /// Flat view of [`resolve_grade`](Self::resolve_grade): an empty list
    /// means no formula is configured.
    pub async fn resolve_formula(&self, party_id: i32, grade: &str) -> FormulaResult<Vec<FormulaEntry>> {
        Ok(self.resolve_grade(party_id, grade).await?.into_entries())
    }
}
