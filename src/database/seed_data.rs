use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::app_context::AppContext;
use crate::formula_types::{validate_entries, EntryDraft};
use crate::services::{AdminAction, AdminAuthorizer, AllowAll};

/// Seed file layout: one party and any number of base grades
#[derive(Debug, Clone, Deserialize)]
pub struct SeedFile {
    pub party: String,
    #[serde(default)]
    pub email: Option<String>,
    pub grades: Vec<SeedGrade>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedGrade {
    pub name: String,
    pub entries: Vec<EntryDraft>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub party_id: i32,
    pub party_created: bool,
    pub rows_written: usize,
}

/// Party ABC with its 250R grade
pub const SAMPLE_SEED: &str = r#"
party: ABC
grades:
  - name: 250R
    entries:
      - { compound: Resin China, quantity: 12.5, unit: kg }
      - { compound: Resin Shree Ram, quantity: 12.5, unit: kg }
      - { compound: Yamuna, quantity: 10, unit: kg }
      - { compound: CPW, quantity: 10, unit: kg }
      - { compound: DBP, quantity: 10, unit: kg }
      - { compound: DOP, quantity: 10, unit: kg }
      - { compound: FW, quantity: 500, unit: g }
      - { compound: DHRUV, quantity: 120, unit: g }
      - { compound: OBSH, quantity: 200, unit: g }
      - { compound: Stabilizer, quantity: 1050, unit: g }
      - { compound: Euamol, quantity: 200, unit: g }
      - { compound: G-3, quantity: 250, unit: g }
      - { compound: TT, quantity: 1800, unit: g }
      - { compound: OB, quantity: 10, unit: g }
      - { compound: Toner, quantity: 50, unit: g }
      - { compound: Steric Acid, quantity: 300, unit: g }
"#;

impl SeedFile {
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse seed file")
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed file {}", path.display()))?;
        Self::from_yaml(&content)
    }

    pub fn sample() -> Result<Self> {
        Self::from_yaml(SAMPLE_SEED)
    }
}

/// Write a seed file: the party is created only when no party of that name
/// exists, then every row is upserted so re-seeding is idempotent.
pub async fn apply_seed(
    ctx: &AppContext,
    authorizer: &dyn AdminAuthorizer,
    seed: &SeedFile,
) -> Result<SeedReport> {
    authorizer.authorize(AdminAction::SeedFormula)?;

    let (party, party_created) = match ctx.find_party_by_name(&seed.party).await? {
        Some(party) => {
            info!("Party '{}' already exists (id {}), reusing it", party.name, party.id);
            (party, false)
        }
        None => {
            // Seeding was authorised above
            let party = ctx
                .create_party(&AllowAll, &seed.party, seed.email.as_deref())
                .await?;
            (party, true)
        }
    };

    let mut rows_written = 0;
    for grade in &seed.grades {
        let entries = validate_entries(&grade.entries)
            .with_context(|| format!("Invalid entry in grade '{}'", grade.name))?;
        rows_written += ctx
            .formula_service()
            .save_base_formula(party.id, &grade.name, &entries)
            .await?;
    }

    info!(
        "Seeded party '{}' (id {}) with {} formula rows",
        party.name, party.id, rows_written
    );

    Ok(SeedReport {
        party_id: party.id,
        party_created,
        rows_written,
    })
}
