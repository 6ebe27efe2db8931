//! Pack commands

use anyhow::Context;
use clap::Subcommand;
use lexis::{Lexis, NewPack};

use super::output::print_data;

/// Subcommands for pack management
#[derive(Subcommand, Debug, Clone)]
pub enum PackAction {
    /// List all packs
    List,
    /// Create a pack
    Create {
        /// Pack name, unique per user and language ignoring case
        name: String,
        /// Language id (see `lexis languages`)
        #[arg(long = "lang")]
        language_id: String,
        /// Owning user id
        #[arg(long = "user")]
        owner_id: String,
        /// Make the pack visible to other users
        #[arg(long)]
        public: bool,
    },
    /// Show a pack with its vocabs
    Show { id: String },
}

pub async fn run(lexis: &Lexis, action: PackAction) -> anyhow::Result<()> {
    match action {
        PackAction::List => print_data(&lexis.list_packs().await?),
        PackAction::Create {
            name,
            language_id,
            owner_id,
            public,
        } => {
            let pack = lexis
                .create_pack(NewPack {
                    name,
                    language_id,
                    owner_id,
                    public,
                })
                .await
                .context("Failed to create pack")?;
            print_data(&pack)
        }
        PackAction::Show { id } => {
            let details = lexis
                .pack_details(&id)
                .await
                .with_context(|| format!("Failed to load pack {}", id))?;
            print_data(&details)
        }
    }
}
