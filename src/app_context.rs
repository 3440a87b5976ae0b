use anyhow::Result;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::database::entities::{custom_grades, parties};
use crate::database::{establish_connection, get_database_url, migrations::Migrator};
use crate::errors::{FormulaError, FormulaResult};
use crate::formula_types::{apply_edits, revalidate, FormulaEntry};
use crate::services::{
    AdminAuthorizer, CascadeReport, FormulaService, GradeResolution, GradeResolver, PartyLocks,
    PartyService,
};
use crate::slip::{self, Slip, SlipLine};
use crate::units::MassUnit;

/// Explicit handle over the formula database and the services built on it.
/// Open it once at start-up and drop it at shutdown.
#[derive(Clone)]
pub struct AppContext {
    db: DatabaseConnection,
    party_service: PartyService,
    formula_service: FormulaService,
    grade_resolver: GradeResolver,
}

impl AppContext {
    pub fn new(db: DatabaseConnection) -> Self {
        let locks = PartyLocks::new();
        let party_service = PartyService::new(db.clone(), locks.clone());
        let formula_service = FormulaService::new(db.clone(), locks);
        let grade_resolver = GradeResolver::new(formula_service.clone());

        Self {
            db,
            party_service,
            formula_service,
            grade_resolver,
        }
    }

    /// Connect to the database at `database_path` and bring its schema up to date
    pub async fn open(database_path: &str) -> Result<Self> {
        let url = get_database_url(Some(database_path));
        let db = establish_connection(&url).await?;
        Migrator::up(&db, None).await?;
        info!("Opened formula database {}", database_path);
        Ok(Self::new(db))
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn party_service(&self) -> &PartyService {
        &self.party_service
    }

    pub fn formula_service(&self) -> &FormulaService {
        &self.formula_service
    }

    pub fn grade_resolver(&self) -> &GradeResolver {
        &self.grade_resolver
    }

    pub async fn list_parties(&self) -> FormulaResult<Vec<parties::Model>> {
        self.party_service.list_parties().await
    }

    pub async fn create_party(
        &self,
        authorizer: &dyn AdminAuthorizer,
        name: &str,
        email: Option<&str>,
    ) -> FormulaResult<parties::Model> {
        self.party_service.create_party(authorizer, name, email).await
    }

    pub async fn create_party_with_formula(
        &self,
        authorizer: &dyn AdminAuthorizer,
        name: &str,
        email: Option<&str>,
        grade: &str,
        entries: &[FormulaEntry],
    ) -> FormulaResult<parties::Model> {
        self.party_service
            .create_party_with_formula(authorizer, name, email, grade, entries)
            .await
    }

    pub async fn delete_party(
        &self,
        authorizer: &dyn AdminAuthorizer,
        party_id: i32,
    ) -> FormulaResult<CascadeReport> {
        self.party_service.delete_party(authorizer, party_id).await
    }

    pub async fn find_party_by_name(&self, name: &str) -> FormulaResult<Option<parties::Model>> {
        self.party_service.find_party_by_name(name).await
    }

    /// Like [`find_party_by_name`](Self::find_party_by_name) but a miss is an error
    pub async fn require_party_by_name(&self, name: &str) -> FormulaResult<parties::Model> {
        self.find_party_by_name(name)
            .await?
            .ok_or_else(|| FormulaError::party_not_found(name.trim()))
    }

    pub async fn list_grades(&self, party_id: i32) -> FormulaResult<Vec<String>> {
        self.formula_service.list_grades(party_id).await
    }

    pub async fn upsert_base_formula_row(
        &self,
        party_id: i32,
        grade: &str,
        entry: &FormulaEntry,
    ) -> FormulaResult<()> {
        self.formula_service
            .upsert_base_formula_row(party_id, grade, entry)
            .await
    }

    pub async fn resolve_formula(&self, party_id: i32, grade: &str) -> FormulaResult<Vec<FormulaEntry>> {
        self.grade_resolver.resolve_formula(party_id, grade).await
    }

    pub async fn resolve_grade(&self, party_id: i32, grade: &str) -> FormulaResult<GradeResolution> {
        self.grade_resolver.resolve_grade(party_id, grade).await
    }

    pub async fn save_custom_grade(
        &self,
        party_id: i32,
        base_grade: &str,
        new_grade_name: &str,
        entries: &[FormulaEntry],
    ) -> FormulaResult<custom_grades::Model> {
        self.formula_service
            .insert_custom_grade(party_id, base_grade, new_grade_name, entries)
            .await
    }

    pub fn scale(
        &self,
        formula: &[FormulaEntry],
        target_weight: f64,
        display_unit: MassUnit,
    ) -> FormulaResult<Vec<SlipLine>> {
        slip::scale(formula, target_weight, display_unit)
    }

    /// Resolve a grade, apply `edits` and scale it into a dated slip.
    /// Edits are validated before anything is resolved. A grade with no
    /// formula is reported as not found.
    pub async fn generate_slip(
        &self,
        party: &parties::Model,
        grade: &str,
        edits: &[FormulaEntry],
        target_weight: f64,
        display_unit: MassUnit,
    ) -> FormulaResult<Slip> {
        let edits = revalidate(edits)?;

        let formula = self.resolve_formula(party.id, grade).await?;
        if formula.is_empty() {
            return Err(FormulaError::grade_not_found(&party.name, grade));
        }

        let formula = apply_edits(&formula, &edits);
        Slip::new(&party.name, grade.trim(), &formula, target_weight, display_unit)
    }
}
