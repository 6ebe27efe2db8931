//! Pack operations

use crate::error::{DbError, Result};
use crate::keys::PackKey;
use crate::types::Pack;
use crate::LexisDb;
use lexis_ids::PackId;
use sqlx::Row;
use tracing::info;

impl LexisDb {
    /// Report whether a pack with this normalized key exists.
    ///
    /// An invalid key never exists.
    pub async fn pack_exists(&self, key: &PackKey) -> Result<bool> {
        let Some(key) = key.as_str() else {
            return Ok(false);
        };
        let row = self
            .bounded(
                self.timeouts.lookup,
                "pack exists",
                sqlx::query("SELECT 1 FROM packs WHERE norm_key = ?")
                    .bind(key)
                    .fetch_optional(&self.pool),
            )
            .await?;
        Ok(row.is_some())
    }

    /// Insert a pack.
    ///
    /// Fails with [`DbError::Duplicate`] when another pack already holds the
    /// same normalized key, even if the caller's pre-check passed.
    pub async fn create_pack(&self, pack: &Pack) -> Result<()> {
        let key = pack.key();
        let Some(norm_key) = key.as_str() else {
            return Err(DbError::InvalidKey(format!(
                "pack {:?} has an empty owner, language or name",
                pack.name
            )));
        };

        self.bounded(
            self.timeouts.write,
            "create pack",
            sqlx::query(
                r#"
                INSERT INTO packs (id, name, lang_id, user_id, public, norm_key, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(pack.id.as_str())
            .bind(&pack.name)
            .bind(&pack.language_id)
            .bind(&pack.owner_id)
            .bind(pack.public)
            .bind(norm_key)
            .bind(Self::now_millis())
            .execute(&self.pool),
        )
        .await
        .map_err(|e| DbError::from_insert(e, &format!("pack {}", key)))?;

        info!(pack_id = %pack.id, key = %key, "Pack created");
        Ok(())
    }

    /// Get a pack by id
    pub async fn get_pack(&self, id: &PackId) -> Result<Option<Pack>> {
        let row = self
            .bounded(
                self.timeouts.lookup,
                "get pack",
                sqlx::query("SELECT id, name, lang_id, user_id, public FROM packs WHERE id = ?")
                    .bind(id.as_str())
                    .fetch_optional(&self.pool),
            )
            .await?;

        row.as_ref().map(row_to_pack).transpose()
    }

    /// List all packs ordered by name
    pub async fn list_packs(&self) -> Result<Vec<Pack>> {
        let rows = self
            .bounded(
                self.timeouts.list,
                "list packs",
                sqlx::query("SELECT id, name, lang_id, user_id, public FROM packs ORDER BY name, id")
                    .fetch_all(&self.pool),
            )
            .await?;

        rows.iter().map(row_to_pack).collect()
    }
}

fn row_to_pack(row: &sqlx::sqlite::SqliteRow) -> Result<Pack> {
    Ok(Pack {
        id: PackId::from_stored(row.try_get("id")?),
        name: row.try_get("name")?,
        language_id: row.try_get("lang_id")?,
        owner_id: row.try_get("user_id")?,
        public: row.try_get("public")?,
    })
}
