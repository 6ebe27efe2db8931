//! Vocab operations
//!
//! Reads and writes of `translation` go through [`LexisDb::supports_translation`]
//! so the same code runs against databases with and without the column.

use crate::error::{DbError, Result};
use crate::keys::VocabKey;
use crate::types::{Vocab, VocabFilter};
use crate::LexisDb;
use lexis_ids::{PackId, VocabId};
use sqlx::{QueryBuilder, Row, Sqlite};
use tracing::{debug, info};

impl LexisDb {
    /// Report whether a vocab with this normalized key exists.
    ///
    /// An invalid key never exists.
    pub async fn vocab_exists(&self, key: &VocabKey) -> Result<bool> {
        let Some(key) = key.as_str() else {
            return Ok(false);
        };
        let row = self
            .bounded(
                self.timeouts.lookup,
                "vocab exists",
                sqlx::query("SELECT 1 FROM vocabs WHERE norm_key = ?")
                    .bind(key)
                    .fetch_optional(&self.pool),
            )
            .await?;
        Ok(row.is_some())
    }

    /// Insert a vocab.
    ///
    /// The translation is dropped when the schema has no column for it.
    pub async fn create_vocab(&self, vocab: &Vocab) -> Result<()> {
        let key = vocab.key();
        let Some(norm_key) = key.as_str() else {
            return Err(DbError::InvalidKey(format!(
                "vocab {:?} has an empty pack or name",
                vocab.name
            )));
        };

        let insert = if self.supports_translation().await {
            sqlx::query(
                r#"
                INSERT INTO vocabs (id, image, name, translation, pack_id, norm_key, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(vocab.id.as_str())
            .bind(&vocab.image)
            .bind(&vocab.name)
            .bind(vocab.translation.as_deref())
        } else {
            if vocab.translation.is_some() {
                debug!(vocab_id = %vocab.id, "Dropping translation; schema has no column for it");
            }
            sqlx::query(
                r#"
                INSERT INTO vocabs (id, image, name, pack_id, norm_key, created_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(vocab.id.as_str())
            .bind(&vocab.image)
            .bind(&vocab.name)
        };

        self.bounded(
            self.timeouts.write,
            "create vocab",
            insert
                .bind(vocab.pack_id.as_str())
                .bind(norm_key)
                .bind(Self::now_millis())
                .execute(&self.pool),
        )
        .await
        .map_err(|e| DbError::from_insert(e, &format!("vocab {}", key)))?;

        info!(vocab_id = %vocab.id, pack_id = %vocab.pack_id, "Vocab created");
        Ok(())
    }

    /// List the vocabs of one pack ordered by name
    pub async fn list_vocabs_by_pack(&self, pack_id: &PackId) -> Result<Vec<Vocab>> {
        let translation = self.translation_column("translation").await;
        let sql = format!(
            "SELECT id, image, name, {translation}, pack_id FROM vocabs WHERE pack_id = ? ORDER BY name, id"
        );
        let rows = self
            .bounded(
                self.timeouts.list,
                "list vocabs by pack",
                sqlx::query(&sql).bind(pack_id.as_str()).fetch_all(&self.pool),
            )
            .await?;

        rows.iter().map(row_to_vocab).collect()
    }

    /// List vocabs of packs owned by `filter.owner_id` in `filter.language_id`,
    /// optionally restricted to `filter.pack_ids`.
    pub async fn list_vocabs(&self, filter: &VocabFilter) -> Result<Vec<Vocab>> {
        let translation = self.translation_column("v.translation").await;
        let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(format!(
            "SELECT v.id, v.image, v.name, {translation}, v.pack_id \
             FROM vocabs v JOIN packs p ON p.id = v.pack_id \
             WHERE p.user_id = "
        ));
        builder.push_bind(filter.owner_id.clone());
        builder.push(" AND p.lang_id = ");
        builder.push_bind(filter.language_id.clone());

        if !filter.pack_ids.is_empty() {
            builder.push(" AND v.pack_id IN (");
            let mut ids = builder.separated(", ");
            for id in &filter.pack_ids {
                ids.push_bind(id.as_str().to_string());
            }
            ids.push_unseparated(")");
        }
        builder.push(" ORDER BY v.name, v.id");

        let rows = self
            .bounded(
                self.timeouts.list,
                "list vocabs",
                builder.build().fetch_all(&self.pool),
            )
            .await?;

        rows.iter().map(row_to_vocab).collect()
    }

    /// Select expression yielding the translation, or NULL on old schemas.
    async fn translation_column(&self, column: &str) -> String {
        if self.supports_translation().await {
            format!("{column} AS translation")
        } else {
            "NULL AS translation".to_string()
        }
    }
}

fn row_to_vocab(row: &sqlx::sqlite::SqliteRow) -> Result<Vocab> {
    let translation: Option<String> = row.try_get("translation")?;
    Ok(Vocab {
        id: VocabId::from_stored(row.try_get("id")?),
        image: row.try_get("image")?,
        name: row.try_get("name")?,
        translation: translation.filter(|t| !t.is_empty()),
        pack_id: PackId::from_stored(row.try_get("pack_id")?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Pack;

    async fn db_with_pack(name: &str) -> (LexisDb, Pack) {
        let db = LexisDb::open_memory().await.unwrap();
        let pack = Pack::new(name, "1", "u1");
        db.create_pack(&pack).await.unwrap();
        (db, pack)
    }

    fn vocab(pack: &Pack, name: &str) -> Vocab {
        Vocab::new(
            pack.id.clone(),
            name,
            format!("/files/images/{}.png", name.to_lowercase()),
            Some(format!("{name} (translated)")),
        )
    }

    #[tokio::test]
    async fn test_create_then_exists_case_insensitive() {
        let (db, pack) = db_with_pack("Kitchen").await;
        let knife = vocab(&pack, "Knife");
        db.create_vocab(&knife).await.unwrap();

        assert!(db
            .vocab_exists(&VocabKey::derive(pack.id.as_str(), " KNIFE "))
            .await
            .unwrap());
        assert!(!db
            .vocab_exists(&VocabKey::derive(pack.id.as_str(), "fork"))
            .await
            .unwrap());
        assert!(!db.vocab_exists(&VocabKey::derive("", "")).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_vocab_rejected_by_constraint() {
        let (db, pack) = db_with_pack("Kitchen").await;
        db.create_vocab(&vocab(&pack, "Knife")).await.unwrap();

        let err = db.create_vocab(&vocab(&pack, "knife")).await.unwrap_err();
        assert!(matches!(err, DbError::Duplicate(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_vocab_for_missing_pack_is_not_found() {
        let db = LexisDb::open_memory().await.unwrap();
        let orphan = Vocab::new(PackId::new(), "knife", "/files/images/knife.png", None);
        let err = db.create_vocab(&orphan).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_list_by_pack_is_sorted_and_keeps_translation() {
        let (db, pack) = db_with_pack("Kitchen").await;
        for name in ["spoon", "fork", "knife"] {
            db.create_vocab(&vocab(&pack, name)).await.unwrap();
        }

        let vocabs = db.list_vocabs_by_pack(&pack.id).await.unwrap();
        let names: Vec<&str> = vocabs.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["fork", "knife", "spoon"]);
        assert_eq!(vocabs[0].translation.as_deref(), Some("fork (translated)"));
    }

    #[tokio::test]
    async fn test_list_vocabs_filters_by_owner_language_and_packs() {
        let (db, kitchen) = db_with_pack("Kitchen").await;
        let garden = Pack::new("Garden", "1", "u1");
        let german = Pack::new("Küche", "2", "u1");
        let other_user = Pack::new("Kitchen", "1", "u2");
        for pack in [&garden, &german, &other_user] {
            db.create_pack(pack).await.unwrap();
        }
        db.create_vocab(&vocab(&kitchen, "knife")).await.unwrap();
        db.create_vocab(&vocab(&garden, "rake")).await.unwrap();
        db.create_vocab(&vocab(&german, "messer")).await.unwrap();
        db.create_vocab(&vocab(&other_user, "fork")).await.unwrap();

        let all = db.list_vocabs(&VocabFilter::new("u1", "1")).await.unwrap();
        let names: Vec<&str> = all.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["knife", "rake"]);

        let only_garden = db
            .list_vocabs(&VocabFilter::new("u1", "1").with_packs([garden.id.clone()]))
            .await
            .unwrap();
        assert_eq!(only_garden.len(), 1);
        assert_eq!(only_garden[0].name, "rake");

        let foreign_pack = db
            .list_vocabs(&VocabFilter::new("u1", "1").with_packs([other_user.id.clone()]))
            .await
            .unwrap();
        assert!(foreign_pack.is_empty());
    }
}
