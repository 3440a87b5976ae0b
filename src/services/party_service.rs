use std::future::Future;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{debug, info, warn};

use crate::database::entities::{custom_formula_entries, custom_grades, formulas, parties};
use crate::errors::{FormulaError, FormulaResult, StorageContext};
use crate::formula_types::FormulaEntry;
use crate::services::authorization::{AdminAction, AdminAuthorizer};
use crate::services::formula_service::FormulaService;
use crate::services::party_locks::PartyLocks;
use crate::services::validation::ValidationService;

/// Steps of the party delete cascade, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeStep {
    CustomEntriesRemoved,
    CustomGradesRemoved,
    FormulaRowsRemoved,
    PartyRemoved,
}

/// Row counts removed by a party delete
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub custom_entries: u64,
    pub custom_grades: u64,
    pub formula_rows: u64,
}

#[derive(Clone)]
pub struct PartyService {
    db: DatabaseConnection,
    locks: PartyLocks,
}

impl PartyService {
    pub fn new(db: DatabaseConnection, locks: PartyLocks) -> Self {
        Self { db, locks }
    }

    /// Create a party. Duplicate names are accepted; each call gets a fresh id.
    pub async fn create_party(
        &self,
        authorizer: &dyn AdminAuthorizer,
        name: &str,
        email: Option<&str>,
    ) -> FormulaResult<parties::Model> {
        authorizer.authorize(AdminAction::CreateParty)?;

        let _guard = self.locks.lock_writer().await;
        let party = Self::insert_party(&self.db, name, email).await?;
        info!("Created party '{}' with id {}", party.name, party.id);
        Ok(party)
    }

    /// Create a party together with its initial base grade in one transaction
    pub async fn create_party_with_formula(
        &self,
        authorizer: &dyn AdminAuthorizer,
        name: &str,
        email: Option<&str>,
        grade: &str,
        entries: &[FormulaEntry],
    ) -> FormulaResult<parties::Model> {
        authorizer.authorize(AdminAction::CreateParty)?;

        let grade = ValidationService::validate_grade_name(grade)?;
        if entries.is_empty() {
            return Err(FormulaError::EmptyFormula { grade });
        }
        let entries = crate::formula_types::revalidate(entries)?;

        let _guard = self.locks.lock_writer().await;
        let txn = self
            .db
            .begin()
            .await
            .storage("begin create party transaction")?;

        let party = Self::insert_party(&txn, name, email).await?;
        for entry in &entries {
            FormulaService::upsert_row_in(&txn, party.id, &grade, entry).await?;
        }

        txn.commit()
            .await
            .with_storage(|| format!("commit party '{}' with grade '{}'", party.name, grade))?;

        info!(
            "Created party '{}' (id {}) with grade '{}' of {} compounds",
            party.name,
            party.id,
            grade,
            entries.len()
        );
        Ok(party)
    }

    async fn insert_party<C: ConnectionTrait>(
        conn: &C,
        name: &str,
        email: Option<&str>,
    ) -> FormulaResult<parties::Model> {
        let name = ValidationService::validate_party_name(name)?;
        let email = ValidationService::validate_email(email)?;

        parties::ActiveModel {
            name: Set(name.clone()),
            email: Set(email),
            ..Default::default()
        }
        .insert(conn)
        .await
        .with_storage(|| format!("create party '{}'", name))
    }

    pub async fn list_parties(&self) -> FormulaResult<Vec<parties::Model>> {
        parties::Entity::find()
            .order_by_asc(parties::Column::Id)
            .all(&self.db)
            .await
            .storage("list parties")
    }

    pub async fn get_party(&self, party_id: i32) -> FormulaResult<Option<parties::Model>> {
        parties::Entity::find_by_id(party_id)
            .one(&self.db)
            .await
            .with_storage(|| format!("load party {}", party_id))
    }

    /// Exact name match after trimming. Among parties sharing a name the
    /// lowest id wins.
    pub async fn find_party_by_name(&self, name: &str) -> FormulaResult<Option<parties::Model>> {
        let name = name.trim();
        let party = parties::Entity::find()
            .filter(parties::Column::Name.eq(name))
            .order_by_asc(parties::Column::Id)
            .limit(1)
            .one(&self.db)
            .await
            .with_storage(|| format!("find party '{}'", name))?;

        if party.is_none() {
            debug!("No party named '{}'", name);
        }
        Ok(party)
    }

    /// Delete a party and everything it owns atomically
    pub async fn delete_party(
        &self,
        authorizer: &dyn AdminAuthorizer,
        party_id: i32,
    ) -> FormulaResult<CascadeReport> {
        self.delete_party_with_hook(authorizer, party_id, |_| Ok(()))
            .await
    }

    /// Delete a party, calling `after_step` once each cascade step has run
    /// inside the transaction. An error from the hook rolls everything back.
    pub async fn delete_party_with_hook<F>(
        &self,
        authorizer: &dyn AdminAuthorizer,
        party_id: i32,
        mut after_step: F,
    ) -> FormulaResult<CascadeReport>
    where
        F: FnMut(CascadeStep) -> FormulaResult<()> + Send,
    {
        authorizer.authorize(AdminAction::DeleteParty)?;

        let _guard = self.locks.lock(party_id).await;

        let txn = self
            .db
            .begin()
            .await
            .with_storage(|| format!("begin delete of party {}", party_id))?;

        let party = parties::Entity::find_by_id(party_id)
            .one(&txn)
            .await
            .with_storage(|| format!("load party {} for delete", party_id))?
            .ok_or_else(|| FormulaError::party_not_found(party_id.to_string()))?;

        let report = match Self::cascade(&txn, party.id, &mut after_step).await {
            Ok(report) => report,
            Err(err) => return Err(Self::abandon_delete(txn.rollback(), party.id, err).await),
        };

        txn.commit()
            .await
            .with_storage(|| format!("commit delete of party {}", party.id))?;
        self.locks.forget(party.id);

        info!(
            "Deleted party '{}' (id {}): {} custom entries, {} custom grades, {} formula rows",
            party.name, party.id, report.custom_entries, report.custom_grades, report.formula_rows
        );
        Ok(report)
    }

    /// Roll back a failed delete. The cascade error is kept as the result;
    /// a rollback failure is only logged.
    async fn abandon_delete<R>(rollback: R, party_id: i32, err: FormulaError) -> FormulaError
    where
        R: Future<Output = Result<(), DbErr>>,
    {
        warn!("Rolling back delete of party {}: {}", party_id, err);
        if let Err(rollback_err) = rollback.await {
            warn!("Rollback of party {} delete failed: {}", party_id, rollback_err);
        }
        err
    }

    async fn cascade<C, F>(conn: &C, party_id: i32, after_step: &mut F) -> FormulaResult<CascadeReport>
    where
        C: ConnectionTrait,
        F: FnMut(CascadeStep) -> FormulaResult<()>,
    {
        let grade_ids: Vec<i32> = custom_grades::Entity::find()
            .select_only()
            .column(custom_grades::Column::Id)
            .filter(custom_grades::Column::PartyId.eq(party_id))
            .into_tuple()
            .all(conn)
            .await
            .with_storage(|| format!("list custom grades of party {}", party_id))?;

        let custom_entries = custom_formula_entries::Entity::delete_many()
            .filter(custom_formula_entries::Column::GradeId.is_in(grade_ids))
            .exec(conn)
            .await
            .with_storage(|| format!("delete custom formula entries of party {}", party_id))?
            .rows_affected;
        after_step(CascadeStep::CustomEntriesRemoved)?;

        let custom_grades = custom_grades::Entity::delete_many()
            .filter(custom_grades::Column::PartyId.eq(party_id))
            .exec(conn)
            .await
            .with_storage(|| format!("delete custom grades of party {}", party_id))?
            .rows_affected;
        after_step(CascadeStep::CustomGradesRemoved)?;

        let formula_rows = formulas::Entity::delete_many()
            .filter(formulas::Column::PartyId.eq(party_id))
            .exec(conn)
            .await
            .with_storage(|| format!("delete formula rows of party {}", party_id))?
            .rows_affected;
        after_step(CascadeStep::FormulaRowsRemoved)?;

        parties::Entity::delete_by_id(party_id)
            .exec(conn)
            .await
            .with_storage(|| format!("delete party {}", party_id))?;
        after_step(CascadeStep::PartyRemoved)?;

        Ok(CascadeReport {
            custom_entries,
            custom_grades,
            formula_rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::setup_test_db;
    use crate::services::authorization::{AllowAll, DenyAll};

    fn service(db: DatabaseConnection) -> PartyService {
        PartyService::new(db, PartyLocks::new())
    }

    #[tokio::test]
    async fn test_create_and_find_party() {
        let svc = service(setup_test_db().await);

        let party = svc
            .create_party(&AllowAll, "  ABC  ", Some("orders@abc.in"))
            .await
            .unwrap();
        assert_eq!(party.name, "ABC");
        assert_eq!(party.email.as_deref(), Some("orders@abc.in"));

        let found = svc.find_party_by_name(" ABC ").await.unwrap().unwrap();
        assert_eq!(found.id, party.id);
        assert!(svc.find_party_by_name("XYZ").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_names_pick_lowest_id() {
        let svc = service(setup_test_db().await);

        let first = svc.create_party(&AllowAll, "ABC", None).await.unwrap();
        let second = svc.create_party(&AllowAll, "ABC", None).await.unwrap();
        assert_ne!(first.id, second.id);

        let found = svc.find_party_by_name("ABC").await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
        assert_eq!(svc.list_parties().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_privileged_actions_are_gated() {
        let svc = service(setup_test_db().await);

        let err = svc.create_party(&DenyAll, "ABC", None).await.unwrap_err();
        assert!(matches!(err, FormulaError::Unauthorised(_)));
        assert!(svc.list_parties().await.unwrap().is_empty());

        let party = svc.create_party(&AllowAll, "ABC", None).await.unwrap();
        assert!(svc.delete_party(&DenyAll, party.id).await.is_err());
        assert!(svc.get_party(party.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failed_rollback_keeps_cascade_error() {
        let cause = FormulaError::invalid_entry("cascade", "step failed");
        let rollback = async { Err::<(), _>(DbErr::Custom("connection lost".to_string())) };

        let err = PartyService::abandon_delete(rollback, 7, cause).await;
        assert!(matches!(err, FormulaError::InvalidEntry { ref reason, .. } if reason == "step failed"));

        let committed = async { Ok::<(), DbErr>(()) };
        let err = PartyService::abandon_delete(committed, 7, FormulaError::party_not_found("7")).await;
        assert!(matches!(err, FormulaError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_missing_party() {
        let svc = service(setup_test_db().await);
        let err = svc.delete_party(&AllowAll, 99).await.unwrap_err();
        assert!(matches!(err, FormulaError::NotFound { entity: "Party", .. }));
    }
}
