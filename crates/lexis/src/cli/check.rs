//! Startup self-check

use lexis::{Lexis, LexisConfig};
use serde::Serialize;

use super::output::print_data;

#[derive(Debug, Serialize)]
struct CheckReport {
    upload_dir: String,
    database: String,
    max_upload_bytes: u64,
    translation_supported: bool,
    languages: usize,
}

/// Report the resolved configuration. Reaching this point means the upload
/// root is writable and the database opened.
pub async fn run(lexis: &Lexis, config: &LexisConfig) -> anyhow::Result<()> {
    let report = CheckReport {
        upload_dir: lexis.blobs().root().display().to_string(),
        database: config.database_path().display().to_string(),
        max_upload_bytes: lexis.blobs().max_bytes(),
        translation_supported: lexis.db().supports_translation().await,
        languages: lexis.list_languages().await.len(),
    };
    print_data(&report)
}
