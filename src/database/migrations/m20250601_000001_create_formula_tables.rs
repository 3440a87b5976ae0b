use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Parties::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Parties::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Parties::Name).string().not_null())
                    .col(ColumnDef::new(Parties::Email).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Formulas::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Formulas::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Formulas::PartyId).integer().not_null())
                    .col(ColumnDef::new(Formulas::Grade).string().not_null())
                    .col(ColumnDef::new(Formulas::CompoundName).string().not_null())
                    .col(ColumnDef::new(Formulas::Quantity).double().not_null())
                    .col(ColumnDef::new(Formulas::Unit).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_formulas_party")
                            .from(Formulas::Table, Formulas::PartyId)
                            .to(Parties::Table, Parties::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_formulas_party_grade_compound_unique")
                    .table(Formulas::Table)
                    .col(Formulas::PartyId)
                    .col(Formulas::Grade)
                    .col(Formulas::CompoundName)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CustomGrades::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CustomGrades::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CustomGrades::PartyId).integer().not_null())
                    .col(ColumnDef::new(CustomGrades::GradeName).string().not_null())
                    .col(ColumnDef::new(CustomGrades::BasedOn).string().not_null())
                    .col(
                        ColumnDef::new(CustomGrades::CreatedAt)
                            .date_time()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_custom_grades_party")
                            .from(CustomGrades::Table, CustomGrades::PartyId)
                            .to(Parties::Table, Parties::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_custom_grades_party_name")
                    .table(CustomGrades::Table)
                    .col(CustomGrades::PartyId)
                    .col(CustomGrades::GradeName)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CustomFormulaEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CustomFormulaEntries::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CustomFormulaEntries::GradeId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustomFormulaEntries::CompoundName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustomFormulaEntries::Quantity)
                            .double()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CustomFormulaEntries::Unit).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_custom_formula_entries_grade")
                            .from(CustomFormulaEntries::Table, CustomFormulaEntries::GradeId)
                            .to(CustomGrades::Table, CustomGrades::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_custom_formula_entries_grade")
                    .table(CustomFormulaEntries::Table)
                    .col(CustomFormulaEntries::GradeId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CustomFormulaEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CustomGrades::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Formulas::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Parties::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Parties {
    Table,
    Id,
    Name,
    Email,
}

#[derive(DeriveIden)]
enum Formulas {
    Table,
    Id,
    PartyId,
    Grade,
    CompoundName,
    Quantity,
    Unit,
}

#[derive(DeriveIden)]
enum CustomGrades {
    Table,
    Id,
    PartyId,
    GradeName,
    BasedOn,
    CreatedAt,
}

#[derive(DeriveIden)]
enum CustomFormulaEntries {
    Table,
    Id,
    GradeId,
    CompoundName,
    Quantity,
    Unit,
}
