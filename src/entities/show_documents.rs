use sea_orm::entity::prelude::*;

/// One persisted show document, keyed by its exact title.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "show_documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub show_title: String,
    pub category: String,
    #[sea_orm(column_type = "Text")]
    pub document: String,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
