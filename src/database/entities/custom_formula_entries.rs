use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "custom_formula_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub grade_id: i32,
    pub compound_name: String,
    #[sea_orm(column_type = "Double")]
    pub quantity: f64,
    pub unit: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::custom_grades::Entity",
        from = "Column::GradeId",
        to = "super::custom_grades::Column::Id"
    )]
    CustomGrades,
}

impl Related<super::custom_grades::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CustomGrades.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
