//! Table creation, language seeding and test reset.
//!
//! All CREATE TABLE statements live here.

use crate::error::Result;
use crate::LexisDb;
use tracing::info;

/// Table layout generation to create when the tables are missing.
///
/// Existing tables are never altered; a database created by an older release
/// keeps its layout and is handled through [`crate::TranslationSupport`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SchemaGeneration {
    /// `vocabs` has a nullable `translation` column
    #[default]
    Current,
    /// `vocabs` predates translations
    Legacy,
}

const SEED_LANGUAGES: &[(&str, &str, &str)] = &[("1", "Hindi", "hi"), ("2", "German", "de")];

fn vocabs_ddl(generation: SchemaGeneration) -> &'static str {
    match generation {
        SchemaGeneration::Current => {
            r#"CREATE TABLE IF NOT EXISTS vocabs (
                id TEXT PRIMARY KEY,
                image TEXT NOT NULL,
                name TEXT NOT NULL,
                translation TEXT,
                pack_id TEXT NOT NULL REFERENCES packs(id),
                norm_key TEXT NOT NULL UNIQUE,
                created_at INTEGER NOT NULL
            )"#
        }
        SchemaGeneration::Legacy => {
            r#"CREATE TABLE IF NOT EXISTS vocabs (
                id TEXT PRIMARY KEY,
                image TEXT NOT NULL,
                name TEXT NOT NULL,
                pack_id TEXT NOT NULL REFERENCES packs(id),
                norm_key TEXT NOT NULL UNIQUE,
                created_at INTEGER NOT NULL
            )"#
        }
    }
}

impl LexisDb {
    /// Ensure all tables exist and languages are seeded.
    pub(crate) async fn ensure_schema(&self, generation: SchemaGeneration) -> Result<()> {
        let create = async {
            sqlx::query(
                r#"CREATE TABLE IF NOT EXISTS languages (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    code TEXT NOT NULL UNIQUE
                )"#,
            )
            .execute(&self.pool)
            .await?;

            // norm_key holds the normalized (owner, language, name) key; its UNIQUE
            // constraint is the authority on duplicate packs.
            sqlx::query(
                r#"CREATE TABLE IF NOT EXISTS packs (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    lang_id TEXT NOT NULL REFERENCES languages(id),
                    user_id TEXT NOT NULL,
                    public INTEGER NOT NULL DEFAULT 0,
                    norm_key TEXT NOT NULL UNIQUE,
                    created_at INTEGER NOT NULL
                )"#,
            )
            .execute(&self.pool)
            .await?;

            sqlx::query(vocabs_ddl(generation))
                .execute(&self.pool)
                .await?;

            sqlx::query("CREATE INDEX IF NOT EXISTS idx_packs_owner_lang ON packs(user_id, lang_id)")
                .execute(&self.pool)
                .await?;
            sqlx::query("CREATE INDEX IF NOT EXISTS idx_vocabs_pack ON vocabs(pack_id)")
                .execute(&self.pool)
                .await?;
            Ok::<_, sqlx::Error>(())
        };
        self.bounded(self.timeouts.write, "create tables", create)
            .await?;

        let seed = async {
            for &(id, name, code) in SEED_LANGUAGES {
                sqlx::query("INSERT OR IGNORE INTO languages (id, name, code) VALUES (?, ?, ?)")
                    .bind(id)
                    .bind(name)
                    .bind(code)
                    .execute(&self.pool)
                    .await?;
            }
            Ok::<_, sqlx::Error>(())
        };
        self.bounded(self.timeouts.write, "seed languages", seed)
            .await?;

        info!("Database schema verified");
        Ok(())
    }

    /// Delete every vocab and pack, keeping the language seed data.
    ///
    /// Destructive; meant for test isolation.
    pub async fn reset(&self) -> Result<()> {
        let clear = async {
            let mut tx = self.pool.begin().await?;
            sqlx::query("DELETE FROM vocabs").execute(&mut *tx).await?;
            sqlx::query("DELETE FROM packs").execute(&mut *tx).await?;
            tx.commit().await
        };
        self.bounded(self.timeouts.write, "reset", clear).await?;

        info!("Packs and vocabs cleared");
        Ok(())
    }
}
