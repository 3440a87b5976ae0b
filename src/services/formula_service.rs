use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{debug, info};

use crate::database::entities::{custom_formula_entries, custom_grades, formulas, parties};
use crate::errors::{FormulaError, FormulaResult, StorageContext};
use crate::formula_types::{revalidate, EntryDraft, FormulaEntry};
use crate::services::party_locks::PartyLocks;
use crate::services::validation::ValidationService;

/// Durable storage of base formula rows and custom grades
#[derive(Clone)]
pub struct FormulaService {
    db: DatabaseConnection,
    locks: PartyLocks,
}

impl FormulaService {
    pub fn new(db: DatabaseConnection, locks: PartyLocks) -> Self {
        Self { db, locks }
    }

    /// Insert a base row, or replace quantity and unit when the
    /// `(party, grade, compound)` triple already exists.
    pub async fn upsert_base_formula_row(
        &self,
        party_id: i32,
        grade: &str,
        entry: &FormulaEntry,
    ) -> FormulaResult<()> {
        let grade = ValidationService::validate_grade_name(grade)?;
        let entry = EntryDraft::from(entry).validate()?;

        let _guard = self.locks.lock(party_id).await;
        self.require_party(&self.db, party_id).await?;
        Self::upsert_row_in(&self.db, party_id, &grade, &entry).await
    }

    /// Upsert a whole base grade in one transaction
    pub async fn save_base_formula(
        &self,
        party_id: i32,
        grade: &str,
        entries: &[FormulaEntry],
    ) -> FormulaResult<usize> {
        let grade = ValidationService::validate_grade_name(grade)?;
        if entries.is_empty() {
            return Err(FormulaError::EmptyFormula { grade });
        }
        let entries = revalidate(entries)?;

        let _guard = self.locks.lock(party_id).await;
        let txn = self
            .db
            .begin()
            .await
            .with_storage(|| format!("begin save of grade '{}'", grade))?;

        self.require_party(&txn, party_id).await?;
        for entry in &entries {
            Self::upsert_row_in(&txn, party_id, &grade, entry).await?;
        }

        txn.commit()
            .await
            .with_storage(|| format!("commit grade '{}' for party {}", grade, party_id))?;

        info!(
            "Saved base grade '{}' for party {} ({} compounds)",
            grade,
            party_id,
            entries.len()
        );
        Ok(entries.len())
    }

    pub(crate) async fn upsert_row_in<C: ConnectionTrait>(
        conn: &C,
        party_id: i32,
        grade: &str,
        entry: &FormulaEntry,
    ) -> FormulaResult<()> {
        let row = formulas::ActiveModel {
            party_id: Set(party_id),
            grade: Set(grade.to_string()),
            compound_name: Set(entry.compound.clone()),
            quantity: Set(entry.quantity),
            unit: Set(entry.unit.as_str().to_string()),
            ..Default::default()
        };

        formulas::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([
                    formulas::Column::PartyId,
                    formulas::Column::Grade,
                    formulas::Column::CompoundName,
                ])
                .update_columns([formulas::Column::Quantity, formulas::Column::Unit])
                .to_owned(),
            )
            .exec_without_returning(conn)
            .await
            .with_storage(|| {
                format!(
                    "upsert compound '{}' of grade '{}' for party {}",
                    entry.compound, grade, party_id
                )
            })?;

        Ok(())
    }

    /// Create a custom grade with its entries. Names are not checked for
    /// uniqueness against existing base or custom grades.
    pub async fn insert_custom_grade(
        &self,
        party_id: i32,
        base_grade: &str,
        new_grade_name: &str,
        entries: &[FormulaEntry],
    ) -> FormulaResult<custom_grades::Model> {
        let new_grade_name = ValidationService::validate_grade_name(new_grade_name)?;
        if entries.is_empty() {
            return Err(FormulaError::EmptyFormula {
                grade: new_grade_name,
            });
        }
        let entries = revalidate(entries)?;

        let _guard = self.locks.lock(party_id).await;
        let txn = self
            .db
            .begin()
            .await
            .with_storage(|| format!("begin save of custom grade '{}'", new_grade_name))?;

        self.require_party(&txn, party_id).await?;

        let grade = custom_grades::ActiveModel {
            party_id: Set(party_id),
            grade_name: Set(new_grade_name.clone()),
            based_on: Set(base_grade.trim().to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .with_storage(|| {
            format!(
                "create custom grade '{}' for party {}",
                new_grade_name, party_id
            )
        })?;

        let rows = entries
            .iter()
            .map(|entry| custom_formula_entries::ActiveModel {
                grade_id: Set(grade.id),
                compound_name: Set(entry.compound.clone()),
                quantity: Set(entry.quantity),
                unit: Set(entry.unit.as_str().to_string()),
                ..Default::default()
            })
            .collect::<Vec<_>>();

        custom_formula_entries::Entity::insert_many(rows)
            .exec_without_returning(&txn)
            .await
            .with_storage(|| format!("insert entries of custom grade {}", grade.id))?;

        txn.commit()
            .await
            .with_storage(|| format!("commit custom grade '{}'", new_grade_name))?;

        info!(
            "Saved custom grade '{}' (id {}) for party {} based on '{}'",
            grade.grade_name, grade.id, party_id, grade.based_on
        );
        Ok(grade)
    }

    /// Base grade names in first-seen order, followed by custom grade names
    /// in creation order. Names present in both namespaces appear twice.
    pub async fn list_grades(&self, party_id: i32) -> FormulaResult<Vec<String>> {
        let base_rows: Vec<String> = formulas::Entity::find()
            .select_only()
            .column(formulas::Column::Grade)
            .filter(formulas::Column::PartyId.eq(party_id))
            .order_by_asc(formulas::Column::Id)
            .into_tuple()
            .all(&self.db)
            .await
            .with_storage(|| format!("list base grades of party {}", party_id))?;

        let mut grades: Vec<String> = Vec::new();
        for grade in base_rows {
            if !grades.contains(&grade) {
                grades.push(grade);
            }
        }

        let custom: Vec<String> = custom_grades::Entity::find()
            .select_only()
            .column(custom_grades::Column::GradeName)
            .filter(custom_grades::Column::PartyId.eq(party_id))
            .order_by_asc(custom_grades::Column::Id)
            .into_tuple()
            .all(&self.db)
            .await
            .with_storage(|| format!("list custom grades of party {}", party_id))?;

        debug!(
            "Party {} has {} base and {} custom grades",
            party_id,
            grades.len(),
            custom.len()
        );
        grades.extend(custom);
        Ok(grades)
    }

    /// Rows of a base grade in insertion order
    pub async fn base_entries(&self, party_id: i32, grade: &str) -> FormulaResult<Vec<FormulaEntry>> {
        formulas::Entity::find()
            .filter(formulas::Column::PartyId.eq(party_id))
            .filter(formulas::Column::Grade.eq(grade))
            .order_by_asc(formulas::Column::Id)
            .all(&self.db)
            .await
            .with_storage(|| format!("load base grade '{}' of party {}", grade, party_id))?
            .into_iter()
            .map(|row| FormulaEntry::from_stored(row.compound_name, row.quantity, &row.unit))
            .collect()
    }

    /// First custom grade (lowest id) with the given name
    pub async fn find_custom_grade(
        &self,
        party_id: i32,
        grade: &str,
    ) -> FormulaResult<Option<custom_grades::Model>> {
        custom_grades::Entity::find()
            .filter(custom_grades::Column::PartyId.eq(party_id))
            .filter(custom_grades::Column::GradeName.eq(grade))
            .order_by_asc(custom_grades::Column::Id)
            .one(&self.db)
            .await
            .with_storage(|| format!("find custom grade '{}' of party {}", grade, party_id))
    }

    pub async fn custom_entries(&self, grade_id: i32) -> FormulaResult<Vec<FormulaEntry>> {
        custom_formula_entries::Entity::find()
            .filter(custom_formula_entries::Column::GradeId.eq(grade_id))
            .order_by_asc(custom_formula_entries::Column::Id)
            .all(&self.db)
            .await
            .with_storage(|| format!("load entries of custom grade {}", grade_id))?
            .into_iter()
            .map(|row| FormulaEntry::from_stored(row.compound_name, row.quantity, &row.unit))
            .collect()
    }

    async fn require_party<C: ConnectionTrait>(&self, conn: &C, party_id: i32) -> FormulaResult<()> {
        parties::Entity::find_by_id(party_id)
            .one(conn)
            .await
            .with_storage(|| format!("load party {}", party_id))?
            .map(|_| ())
            .ok_or_else(|| FormulaError::party_not_found(party_id.to_string()))
    }
}
