//! Vocab commands

use anyhow::Context;
use clap::Subcommand;
use lexis::{Lexis, NewVocab, Upload};
use std::fs::File;
use std::path::{Path, PathBuf};

use super::output::print_data;

#[derive(Subcommand, Debug, Clone)]
pub enum VocabAction {
    /// Add a vocab with its image to a pack
    Add {
        /// Image file to upload
        image: PathBuf,
        /// Term shown on the flashcard
        #[arg(long)]
        name: String,
        /// Pack id
        #[arg(long = "pack")]
        pack_id: String,
        #[arg(long)]
        translation: Option<String>,
        /// Declared MIME type (informational; content is sniffed)
        #[arg(long)]
        content_type: Option<String>,
    },
}

pub async fn run(lexis: &Lexis, action: VocabAction) -> anyhow::Result<()> {
    match action {
        VocabAction::Add {
            image,
            name,
            pack_id,
            translation,
            content_type,
        } => {
            let mut upload = open_upload(&image)?;
            if let Some(content_type) = content_type {
                upload = upload.with_content_type(content_type);
            }
            let vocab = lexis
                .create_vocab(NewVocab {
                    name,
                    translation,
                    pack_id,
                    image: Some(upload),
                })
                .await
                .context("Failed to add vocab")?;
            print_data(&vocab)
        }
    }
}

fn open_upload(path: &Path) -> anyhow::Result<Upload> {
    let file =
        File::open(path).with_context(|| format!("Failed to open image {}", path.display()))?;
    let size = file
        .metadata()
        .with_context(|| format!("Failed to stat image {}", path.display()))?
        .len();
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(Upload::new(filename, file).with_declared_size(size))
}
