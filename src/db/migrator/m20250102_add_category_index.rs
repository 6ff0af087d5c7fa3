use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_show_documents_category")
                    .table(ShowDocuments::Table)
                    .col(ShowDocuments::Category)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_show_documents_category")
                    .table(ShowDocuments::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
enum ShowDocuments {
    Table,
    Category,
}
