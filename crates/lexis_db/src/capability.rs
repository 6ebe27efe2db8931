//! Detection of the optional `vocabs.translation` column.
//!
//! Older databases were created before translations existed. Instead of
//! letting queries fail against them, reads and writes of the column consult a
//! flag that is computed once per handle and shared by all of its clones.

use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::error::Result;
use crate::LexisDb;

/// Whether the backing `vocabs` table carries a translation column.
#[derive(Debug, Clone)]
pub struct TranslationSupport {
    flag: Arc<OnceCell<bool>>,
}

impl TranslationSupport {
    /// Probe the schema lazily, on first use.
    pub fn detect() -> Self {
        Self {
            flag: Arc::new(OnceCell::new()),
        }
    }

    /// Skip probing and assume the given answer.
    pub fn fixed(supported: bool) -> Self {
        Self {
            flag: Arc::new(OnceCell::new_with(Some(supported))),
        }
    }

    /// The settled answer, if one has been computed or injected.
    pub fn cached(&self) -> Option<bool> {
        self.flag.get().copied()
    }
}

impl Default for TranslationSupport {
    fn default() -> Self {
        Self::detect()
    }
}

impl LexisDb {
    /// Whether vocab translations can be stored and read.
    ///
    /// A failed probe is not cached: it reports `false` for this call and
    /// is retried on the next one.
    pub async fn supports_translation(&self) -> bool {
        let probed = self
            .translation
            .flag
            .get_or_try_init(|| self.probe_translation_column())
            .await;
        match probed {
            Ok(supported) => *supported,
            Err(err) => {
                warn!(error = %err, "Schema probe failed; treating vocab translation as unsupported");
                false
            }
        }
    }

    async fn probe_translation_column(&self) -> Result<bool> {
        let row = self
            .bounded(
                self.timeouts.lookup,
                "probe vocab schema",
                sqlx::query("SELECT 1 FROM pragma_table_info('vocabs') WHERE name = 'translation'")
                    .fetch_optional(&self.pool),
            )
            .await?;
        let supported = row.is_some();
        debug!(supported, "Probed vocabs.translation column");
        Ok(supported)
    }
}
