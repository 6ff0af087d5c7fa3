use crate::entities::{prelude::*, show_documents};
use crate::models::ShowRecord;
use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

/// Title, category and save time of a stored show, for listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowSummary {
    pub show_title: String,
    pub category: String,
    pub created_at: String,
}

pub struct ShowRepository {
    conn: DatabaseConnection,
}

impl ShowRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Inserts or fully replaces the document stored under `record.show_title`.
    pub async fn upsert(&self, record: &ShowRecord) -> Result<()> {
        let document = serde_json::to_string(record).context("Failed to serialize show")?;
        let created_at = record.created_at.unwrap_or_else(chrono::Utc::now).to_rfc3339();

        let active_model = show_documents::ActiveModel {
            show_title: Set(record.show_title.clone()),
            category: Set(record.category_or_default().to_string()),
            document: Set(document),
            created_at: Set(created_at),
        };

        ShowDocuments::insert(active_model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(show_documents::Column::ShowTitle)
                    .update_columns([
                        show_documents::Column::Category,
                        show_documents::Column::Document,
                        show_documents::Column::CreatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.conn)
            .await?;

        Ok(())
    }

    pub async fn get(&self, show_title: &str) -> Result<Option<ShowRecord>> {
        let Some(row) = ShowDocuments::find_by_id(show_title.to_string())
            .one(&self.conn)
            .await?
        else {
            return Ok(None);
        };

        let record = serde_json::from_str(&row.document)
            .with_context(|| format!("Stored document for '{show_title}' is not valid JSON"))?;
        Ok(Some(record))
    }

    pub async fn list(&self) -> Result<Vec<ShowSummary>> {
        let rows: Vec<(String, String, String)> = ShowDocuments::find()
            .select_only()
            .column(show_documents::Column::ShowTitle)
            .column(show_documents::Column::Category)
            .column(show_documents::Column::CreatedAt)
            .order_by_asc(show_documents::Column::ShowTitle)
            .into_tuple()
            .all(&self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(show_title, category, created_at)| ShowSummary {
                show_title,
                category,
                created_at,
            })
            .collect())
    }

    pub async fn delete(&self, show_title: &str) -> Result<bool> {
        let result = ShowDocuments::delete_many()
            .filter(show_documents::Column::ShowTitle.eq(show_title))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }
}
