//! Language lookups (read-only seed data)

use crate::error::Result;
use crate::types::Language;
use crate::LexisDb;
use sqlx::Row;
use tracing::warn;

impl LexisDb {
    /// List all supported languages ordered by name.
    ///
    /// Degrades to an empty list when the backend fails; the error is logged.
    pub async fn list_languages(&self) -> Vec<Language> {
        match self.try_list_languages().await {
            Ok(languages) => languages,
            Err(err) => {
                warn!(error = %err, "Language listing unavailable; returning empty list");
                Vec::new()
            }
        }
    }

    async fn try_list_languages(&self) -> Result<Vec<Language>> {
        let rows = self
            .bounded(
                self.timeouts.list,
                "list languages",
                sqlx::query("SELECT id, name, code FROM languages ORDER BY name")
                    .fetch_all(&self.pool),
            )
            .await?;

        rows.iter().map(row_to_language).collect()
    }

    /// Get a language by id.
    pub async fn get_language(&self, id: &str) -> Result<Option<Language>> {
        let row = self
            .bounded(
                self.timeouts.lookup,
                "get language",
                sqlx::query("SELECT id, name, code FROM languages WHERE id = ?")
                    .bind(id)
                    .fetch_optional(&self.pool),
            )
            .await?;

        row.as_ref().map(row_to_language).transpose()
    }
}

fn row_to_language(row: &sqlx::sqlite::SqliteRow) -> Result<Language> {
    Ok(Language {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        code: row.try_get("code")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_languages_are_seeded_and_sorted() {
        let db = LexisDb::open_memory().await.unwrap();
        let names: Vec<String> = db
            .list_languages()
            .await
            .into_iter()
            .map(|l| l.name)
            .collect();
        assert_eq!(names, vec!["German", "Hindi"]);
    }

    #[tokio::test]
    async fn test_get_language_by_id() {
        let db = LexisDb::open_memory().await.unwrap();
        let hindi = db.get_language("1").await.unwrap().unwrap();
        assert_eq!(hindi.code, "hi");
        assert!(db.get_language("99").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_listing_degrades_to_empty_when_closed() {
        let db = LexisDb::open_memory().await.unwrap();
        db.pool().close().await;
        assert!(db.list_languages().await.is_empty());
    }
}
