use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Curriculum checkpoint of a bootcamp.
///
/// `percentage_weight` is stored and reported but progress is a plain
/// completed/total ratio; the weight does not enter the calculation.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "milestones")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub bootcamp_id: i64,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub order: i32,
    pub percentage_weight: i32,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bootcamp::Entity",
        from = "Column::BootcampId",
        to = "super::bootcamp::Column::Id",
        on_delete = "Cascade"
    )]
    Bootcamp,
}

impl Related<super::bootcamp::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bootcamp.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
