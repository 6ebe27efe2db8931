//! Persistence layer for Lexis languages, packs and vocabs.
//!
//! Every query runs under a bounded timeout; an expired query future is
//! dropped, which aborts the statement on its connection.
//!
//! # Usage
//!
//! ```rust,ignore
//! use lexis_db::{LexisDb, Pack, PackKey};
//!
//! let db = LexisDb::open("~/.lexis/lexis.sqlite3").await?;
//!
//! let pack = Pack::new("Kitchen", "1", "u1");
//! if !db.pack_exists(&pack.key()).await? {
//!     db.create_pack(&pack).await?;
//! }
//! ```

mod capability;
mod error;
mod keys;
mod schema;
mod types;

// Method implementations organized by entity
mod languages;
mod packs;
mod vocabs;

pub use capability::TranslationSupport;
pub use error::{DbError, Result};
pub use keys::{PackKey, VocabKey};
pub use lexis_ids::{IdParseError, PackId, VocabId};
pub use schema::SchemaGeneration;
pub use types::*;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::future::Future;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Per-class query budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTimeouts {
    /// Single-row reads and existence checks
    pub lookup: Duration,
    /// Inserts and deletes
    pub write: Duration,
    /// Multi-row listings
    pub list: Duration,
}

impl Default for QueryTimeouts {
    fn default() -> Self {
        Self {
            lookup: Duration::from_secs(3),
            write: Duration::from_secs(5),
            list: Duration::from_secs(10),
        }
    }
}

impl QueryTimeouts {
    /// The same budget for every query class.
    pub fn uniform(budget: Duration) -> Self {
        Self {
            lookup: budget,
            write: budget,
            list: budget,
        }
    }
}

/// Connection settings for [`LexisDb::connect`].
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite connection URL
    pub url: String,
    /// Maximum connections in the pool
    pub max_connections: u32,
    /// Whether the connection is to a private in-memory database
    pub in_memory: bool,
    /// Table layout to create when tables are missing
    pub schema: SchemaGeneration,
    /// How the optional translation column is discovered
    pub translation: TranslationSupport,
    pub timeouts: QueryTimeouts,
}

impl DbConfig {
    /// File-backed SQLite database, created if missing.
    pub fn sqlite(path: impl AsRef<Path>) -> Self {
        Self {
            url: format!("sqlite:{}", path.as_ref().display()),
            max_connections: 5,
            in_memory: false,
            schema: SchemaGeneration::Current,
            translation: TranslationSupport::detect(),
            timeouts: QueryTimeouts::default(),
        }
    }

    /// Private in-memory database (for testing).
    ///
    /// Limited to one connection that is never recycled, since every
    /// connection to `sqlite::memory:` sees its own empty database.
    pub fn sqlite_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            in_memory: true,
            schema: SchemaGeneration::Current,
            translation: TranslationSupport::detect(),
            timeouts: QueryTimeouts::default(),
        }
    }

    pub fn with_schema(mut self, schema: SchemaGeneration) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_translation(mut self, translation: TranslationSupport) -> Self {
        self.translation = translation;
        self
    }

    pub fn with_timeouts(mut self, timeouts: QueryTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }
}

/// Handle to the Lexis entity store.
///
/// Cheap to clone; clones share the pool and the translation capability flag.
#[derive(Clone)]
pub struct LexisDb {
    pool: SqlitePool,
    translation: TranslationSupport,
    timeouts: QueryTimeouts,
}

impl LexisDb {
    /// Open or create a database at the given path.
    ///
    /// Creates all tables and seeds languages if they don't exist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::connect(DbConfig::sqlite(path)).await
    }

    /// Open a fresh in-memory database.
    pub async fn open_memory() -> Result<Self> {
        Self::connect(DbConfig::sqlite_memory()).await
    }

    /// Connect using explicit settings.
    pub async fn connect(config: DbConfig) -> Result<Self> {
        let mut options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true);
        if !config.in_memory {
            options = options
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal);
        }

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.timeouts.lookup);
        if config.in_memory {
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }
        let pool = pool_options.connect_with(options).await?;

        let db = Self {
            pool,
            translation: config.translation,
            timeouts: config.timeouts,
        };
        db.ensure_schema(config.schema).await?;

        info!(url = %config.url, schema = ?config.schema, "Database opened");
        Ok(db)
    }

    /// Get the underlying connection pool (escape hatch for tests and tooling).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn timeouts(&self) -> QueryTimeouts {
        self.timeouts
    }

    /// Close the database connection.
    pub async fn close(self) {
        self.pool.close().await;
    }

    /// Run a query future under `budget`, converting expiry into
    /// [`DbError::Timeout`].
    pub(crate) async fn bounded<T, F>(
        &self,
        budget: Duration,
        operation: &'static str,
        query: F,
    ) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(budget, query).await {
            Ok(result) => result.map_err(DbError::from),
            Err(_) => Err(DbError::Timeout {
                operation,
                after: budget,
            }),
        }
    }

    /// Current time as milliseconds since Unix epoch.
    pub(crate) fn now_millis() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}
