//! Runtime configuration, from flags with environment fallbacks.

use clap::Args;
use lexis_blob::{BlobStore, MAX_UPLOAD_BYTES};
use lexis_db::{DbConfig, QueryTimeouts};
use std::path::PathBuf;
use std::time::Duration;

/// File name of the database under the Lexis home directory.
pub const DEFAULT_DATABASE_FILE: &str = "lexis.sqlite3";

/// Budget for streaming one image upload to disk.
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Args)]
pub struct LexisConfig {
    /// Upload root; images are stored under <dir>/images
    #[arg(long, env = "UPLOAD_DIR", global = true)]
    pub upload_dir: Option<PathBuf>,

    /// SQLite database file [default: <LEXIS_HOME>/lexis.sqlite3]
    #[arg(long, env = "LEXIS_DATABASE", global = true)]
    pub database: Option<PathBuf>,

    /// Largest accepted image upload, in bytes
    #[arg(long, env = "LEXIS_MAX_UPLOAD_BYTES", default_value_t = MAX_UPLOAD_BYTES, global = true)]
    pub max_upload_bytes: u64,

    /// Budget for lookups and listings, in milliseconds
    #[arg(long, env = "LEXIS_QUERY_TIMEOUT_MS", global = true)]
    pub query_timeout_ms: Option<u64>,

    /// Budget for inserts and deletes, in milliseconds
    #[arg(long, env = "LEXIS_WRITE_TIMEOUT_MS", global = true)]
    pub write_timeout_ms: Option<u64>,

    /// Budget for receiving and storing one image, in milliseconds [default: 60000]
    #[arg(long, env = "LEXIS_UPLOAD_TIMEOUT_MS", global = true)]
    pub upload_timeout_ms: Option<u64>,
}

impl LexisConfig {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: Some(upload_dir.into()),
            database: None,
            max_upload_bytes: MAX_UPLOAD_BYTES,
            query_timeout_ms: None,
            write_timeout_ms: None,
            upload_timeout_ms: None,
        }
    }

    pub fn with_database(mut self, path: impl Into<PathBuf>) -> Self {
        self.database = Some(path.into());
        self
    }

    pub fn database_path(&self) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(|| lexis_logging::lexis_home().join(DEFAULT_DATABASE_FILE))
    }

    pub fn query_timeouts(&self) -> QueryTimeouts {
        let mut timeouts = QueryTimeouts::default();
        if let Some(ms) = self.query_timeout_ms {
            timeouts.lookup = Duration::from_millis(ms);
            timeouts.list = Duration::from_millis(ms);
        }
        if let Some(ms) = self.write_timeout_ms {
            timeouts.write = Duration::from_millis(ms);
        }
        timeouts
    }

    pub fn upload_timeout(&self) -> Duration {
        self.upload_timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_UPLOAD_TIMEOUT)
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::sqlite(self.database_path()).with_timeouts(self.query_timeouts())
    }

    /// The blob store, or `None` when no upload root is configured.
    pub fn blob_store(&self) -> Option<BlobStore> {
        self.upload_dir
            .as_ref()
            .map(|dir| BlobStore::new(dir).with_max_bytes(self.max_upload_bytes))
    }
}
