use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "parties")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub email: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::formulas::Entity")]
    Formulas,
    #[sea_orm(has_many = "super::custom_grades::Entity")]
    CustomGrades,
}

impl Related<super::formulas::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Formulas.def()
    }
}

impl Related<super::custom_grades::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CustomGrades.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
